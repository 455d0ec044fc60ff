//! Monotonic timestamp and counter state of one time-based generator.

use chrono::{DateTime, Utc};

use crate::error::StorageOperation;
use crate::generator::RandSource;
use crate::ticks::truncate;
use crate::{ClockRecord, ClockStorage, Error, Node};

/// The last `(timestamp, counter)` pair a generator handed out for its node.
///
/// Clock readings are truncated to the resolution of the UUID version being generated, so two
/// calls that land in the same 100 ns tick (V1, V6) or millisecond (V7, V8) are told apart by the
/// counter alone. A restored timestamp is kept as stored, even when it is finer than that
/// resolution, so the persisted pair never moves backwards.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ClockState {
    node: Node,
    resolution: u32,
    last: DateTime<Utc>,
    counter: u32,
}

impl ClockState {
    /// Restores the state for `node` from `storage`.
    ///
    /// Without a stored record the state starts at `now` with a random counter, which keeps
    /// identifiers unique by chance rather than by continuity.
    pub fn restore(
        storage: &dyn ClockStorage,
        node: Node,
        now: DateTime<Utc>,
        resolution: u32,
        rng: &mut dyn RandSource,
    ) -> Result<Self, Error> {
        let record = storage
            .load(node)
            .map_err(|source| Error::Storage {
                operation: StorageOperation::Load,
                source,
            })?;
        let (last, counter) = match record {
            Some(r) => (r.time, r.counter),
            None => {
                tracing::debug!(%node, "no stored clock state; seeding a random counter");
                (truncate(&now, resolution), rng.next_u32())
            }
        };
        Ok(Self {
            node,
            resolution,
            last,
            counter,
        })
    }

    /// Advances the state to `now` and persists it before returning the new pair.
    ///
    /// A fresh timestamp keeps the counter. A repeated or earlier timestamp keeps the previous
    /// timestamp and bumps the counter, wrapping at 32 bits. If the store fails the state is left
    /// untouched.
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        storage: &dyn ClockStorage,
    ) -> Result<ClockRecord, Error> {
        let now = truncate(&now, self.resolution);
        let record = if now > self.last {
            ClockRecord {
                time: now,
                counter: self.counter,
            }
        } else {
            if now < self.last {
                tracing::trace!(last = %self.last, %now, "clock went backwards");
            }
            ClockRecord {
                time: self.last,
                counter: self.counter.wrapping_add(1),
            }
        };

        storage
            .store(self.node, &record)
            .map_err(|source| Error::Storage {
                operation: StorageOperation::Store,
                source,
            })?;
        self.last = record.time;
        self.counter = record.counter;
        Ok(record)
    }

    /// Returns the node this state belongs to.
    pub fn node(&self) -> Node {
        self.node
    }

    /// Returns the last pair handed out, or the seed if none was.
    pub fn last(&self) -> ClockRecord {
        ClockRecord {
            time: self.last,
            counter: self.counter,
        }
    }
}
