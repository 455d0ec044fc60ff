//! Leap-second accounting for Gregorian-epoch timestamps.

/// Computes the number of leap seconds by which Unix time differs from the count of SI seconds
/// elapsed since 1970-01-01T00:00:00Z.
///
/// Leap seconds are announced only months in advance, so any compiled-in table goes stale; a
/// long-lived deployment that cares should source the data from the IERS or the host's timezone
/// database and implement this trait itself.
pub trait LeapSecondCalculator {
    /// Returns the cumulative leap-second total in effect at `seconds`.
    ///
    /// When `includes_leap_seconds` is false, `seconds` is plain Unix time. When true, `seconds`
    /// already counts the leap seconds that elapsed before it, as produced by adding this
    /// calculator's own answer to a Unix timestamp.
    fn leap_seconds_since_unix_epoch(&self, seconds: i64, includes_leap_seconds: bool) -> i64;
}

/// A calculator that claims there has never been a leap second.
///
/// This is not true, but it is what most V1 generators in the wild do, and it keeps timestamps
/// deterministic without any external data. It is the default wherever a calculator is optional.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NoLeapSeconds;

impl LeapSecondCalculator for NoLeapSeconds {
    fn leap_seconds_since_unix_epoch(&self, _seconds: i64, _includes_leap_seconds: bool) -> i64 {
        0
    }
}

/// A best-effort calculator backed by a table compiled into this library.
///
/// Historical entries never change, but newer releases may append rows, so computations near the
/// present can differ between library versions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct FixedLeapSeconds;

impl LeapSecondCalculator for FixedLeapSeconds {
    fn leap_seconds_since_unix_epoch(&self, seconds: i64, includes_leap_seconds: bool) -> i64 {
        // Around the positive leap second at the end of 2016:
        //
        //     UTC                   Unix seconds   SI seconds   total
        //     2016-12-31T23:59:59Z    1483228799   1483228825      26
        //     2016-12-31T23:59:60Z             -   1483228826      26
        //     2017-01-01T00:00:00Z    1483228800   1483228827      27
        //
        // so on the SI scale a row takes effect at `cutover + total`, which also holds for
        // negative leap seconds.
        LEAP_SECONDS
            .iter()
            .rev()
            .find(|&&(cutover, total)| {
                let effective = if includes_leap_seconds {
                    cutover + total
                } else {
                    cutover
                };
                effective <= seconds
            })
            .map_or(0, |&(_, total)| total)
    }
}

/// `(cutover in Unix seconds, cumulative total from then on)`, from the IETF `leap-seconds.list`.
const LEAP_SECONDS: [(i64, i64); 27] = [
    (78_796_800, 1),     // 1972-07-01
    (94_694_400, 2),     // 1973-01-01
    (126_230_400, 3),    // 1974-01-01
    (157_766_400, 4),    // 1975-01-01
    (189_302_400, 5),    // 1976-01-01
    (220_924_800, 6),    // 1977-01-01
    (252_460_800, 7),    // 1978-01-01
    (283_996_800, 8),    // 1979-01-01
    (315_532_800, 9),    // 1980-01-01
    (362_793_600, 10),   // 1981-07-01
    (394_329_600, 11),   // 1982-07-01
    (425_865_600, 12),   // 1983-07-01
    (489_024_000, 13),   // 1985-07-01
    (567_993_600, 14),   // 1988-01-01
    (631_152_000, 15),   // 1990-01-01
    (662_688_000, 16),   // 1991-01-01
    (709_948_800, 17),   // 1992-07-01
    (741_484_800, 18),   // 1993-07-01
    (773_020_800, 19),   // 1994-07-01
    (820_454_400, 20),   // 1996-01-01
    (867_715_200, 21),   // 1997-07-01
    (915_148_800, 22),   // 1999-01-01
    (1_136_073_600, 23), // 2006-01-01
    (1_230_768_000, 24), // 2009-01-01
    (1_341_100_800, 25), // 2012-07-01
    (1_435_708_800, 26), // 2015-07-01
    (1_483_228_800, 27), // 2017-01-01
];
