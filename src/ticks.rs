//! Conversions between wall-clock instants and the tick counts embedded in time-based UUIDs.

use chrono::{DateTime, Utc};

use crate::layout::{sign_extend_millis, MILLI_MASK, TICK_MASK};
use crate::LeapSecondCalculator;

/// Days from 1582-10-15 (the Gregorian reform) to 1970-01-01.
const DAYS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH: i64 = 141_427;

/// Seconds from 1582-10-15 to 1970-01-01.
pub(crate) const SECONDS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH: i64 =
    DAYS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH * 86_400;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_TICK: i64 = 100;
const MILLIS_PER_SECOND: i64 = NANOS_PER_SECOND / NANOS_PER_MILLI;
const TICKS_PER_SECOND: i64 = NANOS_PER_SECOND / NANOS_PER_TICK;

/// Splits an instant into Unix seconds and a sub-second part below one second.
///
/// chrono encodes a leap second as a nanosecond field of one second or more; such instants are
/// pinned to the last representable nanosecond of the preceding second.
fn split(t: &DateTime<Utc>) -> (i64, i64) {
    let ns = (t.timestamp_subsec_nanos() as i64).min(NANOS_PER_SECOND - 1);
    (t.timestamp(), ns)
}

/// Rebuilds an instant from seconds and a possibly negative nanosecond remainder by borrowing a
/// second where needed.
fn join(s: i64, ns: i64) -> DateTime<Utc> {
    let s = s + ns.div_euclid(NANOS_PER_SECOND);
    let ns = ns.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::from_timestamp(s, ns).unwrap_or(if s < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Converts an instant to 100 ns ticks since 1582-10-15, counting leap seconds as reported by
/// `lsc`. Instants before the Gregorian epoch floor at 0; the result is truncated to 60 bits.
pub fn to_gregorian_ticks(lsc: &dyn LeapSecondCalculator, t: &DateTime<Utc>) -> u64 {
    let (mut s, ns) = split(t);
    s += lsc.leap_seconds_since_unix_epoch(s, false);
    s += SECONDS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH;
    if s < 0 {
        return 0;
    }
    let ticks = (s as u64)
        .wrapping_mul(TICKS_PER_SECOND as u64)
        .wrapping_add((ns / NANOS_PER_TICK) as u64);
    ticks & TICK_MASK
}

/// Converts 100 ns ticks since 1582-10-15 back into an instant, removing the leap seconds that
/// `lsc` reports for the leap-inclusive timeline.
pub fn from_gregorian_ticks(lsc: &dyn LeapSecondCalculator, ticks: u64) -> DateTime<Utc> {
    let ticks = ticks & TICK_MASK;
    let ns = (ticks % TICKS_PER_SECOND as u64) as i64 * NANOS_PER_TICK;
    let mut s = (ticks / TICKS_PER_SECOND as u64) as i64;
    s -= SECONDS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH;
    s -= lsc.leap_seconds_since_unix_epoch(s, true);
    join(s, ns)
}

/// Converts an instant to milliseconds since 1970-01-01, truncated to 48 bits.
pub fn to_unix_millis(t: &DateTime<Utc>) -> u64 {
    let (s, ns) = split(t);
    let millis = s.wrapping_mul(MILLIS_PER_SECOND) + ns / NANOS_PER_MILLI;
    (millis as u64) & MILLI_MASK
}

/// Converts a 48-bit millisecond count, sign-extended, back into an instant.
pub fn from_unix_millis(millis: u64) -> DateTime<Utc> {
    let millis = sign_extend_millis(millis);
    join(
        millis / MILLIS_PER_SECOND,
        (millis % MILLIS_PER_SECOND) * NANOS_PER_MILLI,
    )
}

/// Truncates an instant to the resolution of the given tick unit.
pub(crate) fn truncate(t: &DateTime<Utc>, nanos_per_unit: u32) -> DateTime<Utc> {
    let (s, ns) = split(t);
    join(s, ns - ns % nanos_per_unit as i64)
}

/// Nanoseconds per tick of V1 and V6.
pub(crate) const GREGORIAN_RESOLUTION: u32 = NANOS_PER_TICK as u32;

/// Nanoseconds per tick of V7 and time-based V8.
pub(crate) const UNIX_MILLI_RESOLUTION: u32 = NANOS_PER_MILLI as u32;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedLeapSeconds, NoLeapSeconds};

    fn at(s: i64, ns: u32) -> DateTime<Utc> {
        DateTime::from_timestamp(s, ns).unwrap()
    }

    /// Counts ticks from the Gregorian epoch
    #[test]
    fn counts_ticks_from_the_gregorian_epoch() {
        let unix_epoch = at(0, 0);
        assert_eq!(
            to_gregorian_ticks(&NoLeapSeconds, &unix_epoch),
            0x01b2_1dd2_1381_4000
        );
        assert_eq!(
            to_gregorian_ticks(&NoLeapSeconds, &at(0, 1_234)),
            0x01b2_1dd2_1381_4000 + 12
        );
        let gregorian_epoch = at(-SECONDS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH, 0);
        assert_eq!(to_gregorian_ticks(&NoLeapSeconds, &gregorian_epoch), 0);
        let before = at(-SECONDS_FROM_GREGORIAN_EPOCH_TO_UNIX_EPOCH - 10, 0);
        assert_eq!(to_gregorian_ticks(&NoLeapSeconds, &before), 0);
    }

    /// Matches a well-known V1 timestamp
    #[test]
    fn matches_a_well_known_v1_timestamp() {
        // "20616934-4ba2-11e7-8000-010203040506" encodes 1496854535.812946 s
        let t = at(1_496_854_535, 812_946_000);
        assert_eq!(to_gregorian_ticks(&NoLeapSeconds, &t), 0x1e7_4ba2_2061_6934);
    }

    /// Round-trips Gregorian ticks with and without leap seconds
    #[test]
    fn round_trips_gregorian_ticks_with_and_without_leap_seconds() {
        let cases = [
            at(0, 0),
            at(78_796_799, 999_999_900),
            at(78_796_800, 0),
            at(1_483_228_799, 500_000_000),
            at(1_483_228_800, 0),
            at(1_700_000_000, 123_456_700),
            at(-86_400, 100),
        ];
        for t in cases {
            let ticks = to_gregorian_ticks(&NoLeapSeconds, &t);
            assert_eq!(from_gregorian_ticks(&NoLeapSeconds, ticks), t);
            let ticks = to_gregorian_ticks(&FixedLeapSeconds, &t);
            assert_eq!(from_gregorian_ticks(&FixedLeapSeconds, ticks), t);
        }
    }

    /// Shifts ticks by the leap-second total
    #[test]
    fn shifts_ticks_by_the_leap_second_total() {
        let t = at(1_500_000_000, 0);
        let plain = to_gregorian_ticks(&NoLeapSeconds, &t);
        let leapy = to_gregorian_ticks(&FixedLeapSeconds, &t);
        assert_eq!(leapy - plain, 27 * TICKS_PER_SECOND as u64);
    }

    /// Round-trips Unix millis including negatives
    #[test]
    fn round_trips_unix_millis_including_negatives() {
        for t in [
            at(0, 0),
            at(1_700_000_000, 123_000_000),
            at(-1, 999_000_000),
            at(-5, 1_000_000),
        ] {
            assert_eq!(from_unix_millis(to_unix_millis(&t)), t);
        }
        assert_eq!(to_unix_millis(&at(-1, 999_000_000)), MILLI_MASK);
        assert_eq!(to_unix_millis(&at(1, 2_345_678)), 1_002);
    }

    /// Truncates to the unit resolution
    #[test]
    fn truncates_to_the_unit_resolution() {
        let t = at(10, 123_456_789);
        assert_eq!(truncate(&t, GREGORIAN_RESOLUTION), at(10, 123_456_700));
        assert_eq!(truncate(&t, UNIX_MILLI_RESOLUTION), at(10, 123_000_000));
    }
}
