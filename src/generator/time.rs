use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::{GeneratorOptions, StdSystemTime, TimeSource};
use crate::clock::ClockState;
use crate::layout::{put_clock14, put_clock32, put_uint48, put_v1_ticks, put_v6_ticks, stamp};
use crate::node::resolve_node;
use crate::ticks::{
    to_gregorian_ticks, to_unix_millis, GREGORIAN_RESOLUTION, UNIX_MILLI_RESOLUTION,
};
use crate::{
    ClockRecord, ClockStorage, Error, LeapSecondCalculator, NoLeapSeconds, Node, SystemInterfaces,
    UnavailableClockStorage, Uuid, Version,
};

/// Generates time-based UUIDs of version 1, 6, 7 or 8.
///
/// V1 and V6 carry 100 ns Gregorian ticks, the low 14 bits of the counter and the node. V7 and
/// V8 carry Unix milliseconds, the full 32-bit counter and five bytes of a BLAKE3 digest of the
/// timestamp, counter and node.
///
/// Every call persists its `(timestamp, counter)` pair through the clock storage before the UUID
/// is returned; the generator lock is held across both, so ticks and their durable record are
/// produced atomically with respect to other callers.
pub struct TimeGenerator {
    version: Version,
    leap_seconds: Arc<dyn LeapSecondCalculator + Send + Sync>,
    storage: Arc<dyn ClockStorage>,
    inner: Mutex<Inner>,
}

struct Inner {
    clock: ClockState,
    time_source: Box<dyn TimeSource + Send>,
}

impl TimeGenerator {
    /// Resolves the node, restores the clock state and creates a generator.
    pub fn new(version: Version, mut options: GeneratorOptions) -> Result<Self, Error> {
        let resolution = match version {
            Version::V1 | Version::V6 => GREGORIAN_RESOLUTION,
            Version::V7 | Version::V8 => UNIX_MILLI_RESOLUTION,
            _ => {
                return Err(Error::VersionMismatch {
                    requested: version,
                    expected: vec![Version::V1, Version::V6, Version::V7, Version::V8],
                })
            }
        };

        let mut rng = options.take_random_source()?;
        let node = match options.node.filter(|n| !n.is_zero()) {
            Some(node) => node,
            None => {
                let interfaces = options
                    .interfaces
                    .take()
                    .unwrap_or_else(|| Box::new(SystemInterfaces));
                resolve_node(options.force_random_node, &*interfaces, &mut *rng)
                    .map_err(|source| Error::NodeLookup { source })?
            }
        };

        let mut time_source = options
            .time_source
            .take()
            .unwrap_or_else(|| Box::new(StdSystemTime));
        let storage = options
            .clock_storage
            .take()
            .unwrap_or_else(|| Arc::new(UnavailableClockStorage));
        let leap_seconds = options
            .leap_seconds
            .take()
            .unwrap_or_else(|| Arc::new(NoLeapSeconds));

        let clock = ClockState::restore(
            &*storage,
            node,
            time_source.now(),
            resolution,
            &mut *rng,
        )?;
        tracing::debug!(%version, %node, "created time-based generator");

        Ok(Self {
            version,
            leap_seconds,
            storage,
            inner: Mutex::new(Inner { clock, time_source }),
        })
    }

    /// Returns the version this generator produces.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the node embedded in, or hashed into, every UUID.
    pub fn node(&self) -> Node {
        self.lock().clock.node()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generates a new UUID.
    pub fn generate(&self) -> Result<Uuid, Error> {
        let mut inner = self.lock();
        let now = inner.time_source.now();
        let record = inner.clock.tick(now, &*self.storage)?;
        Ok(self.pack(&record, inner.clock.node()))
    }

    fn pack(&self, record: &ClockRecord, node: Node) -> Uuid {
        let mut bytes = [0u8; 16];
        match self.version {
            Version::V1 | Version::V6 => {
                let ticks = to_gregorian_ticks(&*self.leap_seconds, &record.time);
                if self.version == Version::V1 {
                    put_v1_ticks(&mut bytes, ticks);
                } else {
                    put_v6_ticks(&mut bytes, ticks);
                }
                put_clock14(&mut bytes, record.counter);
                bytes[10..16].copy_from_slice(node.as_bytes());
            }
            _ => {
                let millis = to_unix_millis(&record.time);
                let mut hasher = blake3::Hasher::new();
                hasher.update(&millis.to_be_bytes());
                hasher.update(&record.counter.to_be_bytes());
                hasher.update(node.as_bytes());
                let digest = hasher.finalize();

                put_uint48(&mut bytes, millis);
                put_clock32(&mut bytes, record.counter);
                bytes[11..16].copy_from_slice(&digest.as_bytes()[..5]);
            }
        }
        stamp(&mut bytes, self.version);
        Uuid::from(bytes)
    }
}

impl fmt::Debug for TimeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeGenerator")
            .field("version", &self.version)
            .field("clock", &self.lock().clock)
            .finish_non_exhaustive()
    }
}
