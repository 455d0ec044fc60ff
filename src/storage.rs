//! Persistence of clock state across process restarts.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Node;

/// The last timestamp and counter a time-based generator used for one node.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClockRecord {
    /// The last timestamp handed out.
    pub time: DateTime<Utc>,

    /// The counter value that accompanied it.
    pub counter: u32,
}

/// Failure of a [`ClockStorage`] operation other than "no record".
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store was closed.
    #[error("clock storage is closed")]
    Closed,

    /// Another process holds the clock file.
    #[error("clock file {} is locked by another process", .path.display())]
    Locked { path: PathBuf },

    /// The platform offers no way to lock the clock file exclusively.
    #[error("cannot lock clock file {} for exclusive access on this platform", .path.display())]
    LockUnsupported { path: PathBuf },

    /// An I/O call on the clock file failed.
    #[error("failed to {action} clock file {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The clock file holds something other than a clock record map.
    #[error("clock file {} is not valid JSON clock data", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads and stores [`ClockRecord`]s on behalf of time-based generators.
///
/// Implementations serialize concurrent access themselves; one store may be shared by many
/// generators.
pub trait ClockStorage: Send + Sync {
    /// Returns the record for `node`, or `None` if there is none. A generator treats `None` as
    /// permission to start from the current time and a random counter.
    fn load(&self, node: Node) -> Result<Option<ClockRecord>, StorageError>;

    /// Durably associates `record` with `node`.
    ///
    /// Records for other nodes may be discarded, but those for global unicast nodes are worth
    /// keeping since they outlive restarts.
    fn store(&self, node: Node, record: &ClockRecord) -> Result<(), StorageError>;
}

/// A store that remembers nothing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct UnavailableClockStorage;

impl ClockStorage for UnavailableClockStorage {
    fn load(&self, _node: Node) -> Result<Option<ClockRecord>, StorageError> {
        Ok(None)
    }

    fn store(&self, _node: Node, _record: &ClockRecord) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A store backed by one JSON file, exclusively locked for as long as it is open.
///
/// The file maps colon-hex node identifiers to records and is rewritten in full on every store,
/// so it is always a complete snapshot:
///
/// ```json
/// {
///   "00:1b:21:3c:4d:5e": {
///     "time": "2024-05-01T12:34:56.789012300Z",
///     "counter": 4711
///   }
/// }
/// ```
#[derive(Debug)]
pub struct FileClockStorage {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    file: Option<File>,
    records: BTreeMap<Node, ClockRecord>,
}

impl FileClockStorage {
    /// Opens or creates the clock file at `path` and locks it.
    ///
    /// Fails with [`StorageError::Locked`] if another open store holds the lock, whether in this
    /// process or another.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |action| {
            let path = path.clone();
            move |source| StorageError::Io {
                action,
                path,
                source,
            }
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err("open"))?;
        lock_exclusive(&file, &path)?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw).map_err(io_err("read"))?;
        let records = if raw.iter().all(u8::is_ascii_whitespace) {
            BTreeMap::new()
        } else {
            serde_json::from_slice(&raw).map_err(|source| StorageError::Format {
                path: path.clone(),
                source,
            })?
        };

        tracing::debug!(path = %path.display(), records = records.len(), "opened clock file");
        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file: Some(file),
                records,
            }),
        })
    }

    /// Returns the path this store was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the file and its lock. Later calls fail with [`StorageError::Closed`].
    pub fn close(&self) -> Result<(), StorageError> {
        let file = self.lock().file.take().ok_or(StorageError::Closed)?;
        drop(file);
        tracing::debug!(path = %self.path.display(), "closed clock file");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_snapshot(
        &self,
        file: &mut File,
        records: &BTreeMap<Node, ClockRecord>,
    ) -> Result<(), StorageError> {
        let io_err = |action| {
            move |source| StorageError::Io {
                action,
                path: self.path.clone(),
                source,
            }
        };

        let raw = serde_json::to_vec_pretty(records).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })?;
        file.seek(SeekFrom::Start(0)).map_err(io_err("seek"))?;
        file.set_len(0).map_err(io_err("truncate"))?;
        file.write_all(&raw).map_err(io_err("write"))?;
        file.sync_all().map_err(io_err("sync"))
    }
}

impl ClockStorage for FileClockStorage {
    fn load(&self, node: Node) -> Result<Option<ClockRecord>, StorageError> {
        let inner = self.lock();
        if inner.file.is_none() {
            return Err(StorageError::Closed);
        }
        Ok(inner.records.get(&node).copied())
    }

    fn store(&self, node: Node, record: &ClockRecord) -> Result<(), StorageError> {
        let mut guard = self.lock();
        let Inner { file, records } = &mut *guard;
        let file = file.as_mut().ok_or(StorageError::Closed)?;

        // staged on a copy so a failed write leaves memory matching the file
        let mut next = records.clone();
        next.insert(node, *record);
        next.retain(|&k, _| k == node || !(k.is_local() && k.is_multicast()));
        let evicted = records.keys().filter(|k| !next.contains_key(k)).count();

        self.write_snapshot(file, &next)?;
        if evicted > 0 {
            tracing::trace!(evicted, "evicted random node records");
        }
        *records = next;
        Ok(())
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File, path: &Path) -> Result<(), StorageError> {
    use std::os::unix::io::AsRawFd;

    // The lock belongs to the open file description and is released when `file` is closed.
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(());
    }
    let source = io::Error::last_os_error();
    if source.kind() == io::ErrorKind::WouldBlock {
        tracing::warn!(path = %path.display(), "clock file is locked by another owner");
        Err(StorageError::Locked {
            path: path.to_path_buf(),
        })
    } else {
        Err(StorageError::Io {
            action: "lock",
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File, path: &Path) -> Result<(), StorageError> {
    Err(StorageError::LockUnsupported {
        path: path.to_path_buf(),
    })
}
