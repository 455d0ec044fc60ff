//! Bit-level packing of the version-specific fields.
//!
//! All helpers operate on the full 16-byte array and leave the version nibble (byte 6) and the
//! variant bits (byte 8) to [`stamp`], which must run after every pack.

use crate::Version;

/// Width mask of the 60-bit Gregorian tick count used by V1 and V6.
pub(crate) const TICK_MASK: u64 = (1 << 60) - 1;

/// Width mask of the 14-bit V1/V6 clock sequence.
pub(crate) const CLOCK14_MASK: u32 = (1 << 14) - 1;

/// Width mask of the 48-bit V7 millisecond count.
pub(crate) const MILLI_MASK: u64 = (1 << 48) - 1;

/// Sign bit of the 48-bit V7 millisecond count.
pub(crate) const MILLI_SIGN_BIT: u64 = 1 << 47;

/// Bits of byte 8 that separate the variant from the middle V7 sub-counter.
const CARRY_GUARD: u8 = 0x30;

/// Writes the version nibble and the `10` variant.
pub(crate) fn stamp(bytes: &mut [u8; 16], version: Version) {
    bytes[6] = (bytes[6] & 0x0f) | (version.number() << 4);
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
}

/// Clears the version nibble and the variant bits.
pub(crate) fn unstamp(bytes: &mut [u8; 16]) {
    bytes[6] &= 0x0f;
    bytes[8] &= 0x3f;
}

/// Packs 60-bit ticks as `time_low | time_mid | time_high` (V1 layout).
pub(crate) fn put_v1_ticks(bytes: &mut [u8; 16], ticks: u64) {
    let ticks = ticks & TICK_MASK;
    bytes[0..4].copy_from_slice(&(ticks as u32).to_be_bytes());
    bytes[4..6].copy_from_slice(&((ticks >> 32) as u16).to_be_bytes());
    bytes[6..8].copy_from_slice(&((ticks >> 48) as u16).to_be_bytes());
}

/// Unpacks 60-bit ticks from the V1 layout, ignoring the version nibble.
pub(crate) fn get_v1_ticks(bytes: &[u8; 16]) -> u64 {
    let low = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64;
    let mid = u16::from_be_bytes([bytes[4], bytes[5]]) as u64;
    let high = (u16::from_be_bytes([bytes[6], bytes[7]]) & 0x0fff) as u64;
    (high << 48) | (mid << 32) | low
}

/// Packs 60-bit ticks from most to least significant (V6 layout).
pub(crate) fn put_v6_ticks(bytes: &mut [u8; 16], ticks: u64) {
    let ticks = ticks & TICK_MASK;
    bytes[0..4].copy_from_slice(&((ticks >> 28) as u32).to_be_bytes());
    bytes[4..6].copy_from_slice(&((ticks >> 12) as u16).to_be_bytes());
    bytes[6..8].copy_from_slice(&((ticks & 0x0fff) as u16).to_be_bytes());
}

/// Unpacks 60-bit ticks from the V6 layout, ignoring the version nibble.
pub(crate) fn get_v6_ticks(bytes: &[u8; 16]) -> u64 {
    let high = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64;
    let mid = u16::from_be_bytes([bytes[4], bytes[5]]) as u64;
    let low = (u16::from_be_bytes([bytes[6], bytes[7]]) & 0x0fff) as u64;
    (high << 28) | (mid << 12) | low
}

/// Packs the low 48 bits of `millis` into bytes 0-5.
pub(crate) fn put_uint48(bytes: &mut [u8; 16], millis: u64) {
    bytes[0..6].copy_from_slice(&(millis & MILLI_MASK).to_be_bytes()[2..]);
}

/// Unpacks bytes 0-5 as an unsigned 48-bit integer.
pub(crate) fn get_uint48(bytes: &[u8; 16]) -> u64 {
    let mut buf = [0u8; 8];
    buf[2..].copy_from_slice(&bytes[0..6]);
    u64::from_be_bytes(buf)
}

/// Sign-extends a 48-bit millisecond count.
pub(crate) const fn sign_extend_millis(millis: u64) -> i64 {
    let millis = millis & MILLI_MASK;
    if millis & MILLI_SIGN_BIT != 0 {
        (millis | !MILLI_MASK) as i64
    } else {
        millis as i64
    }
}

/// Packs the 14-bit clock sequence into bytes 8-9.
pub(crate) fn put_clock14(bytes: &mut [u8; 16], counter: u32) {
    bytes[8..10].copy_from_slice(&((counter & CLOCK14_MASK) as u16).to_be_bytes());
}

/// Unpacks the 14-bit clock sequence from bytes 8-9.
pub(crate) fn get_clock14(bytes: &[u8; 16]) -> u32 {
    (u16::from_be_bytes([bytes[8], bytes[9]]) as u32) & CLOCK14_MASK
}

/// Packs a 32-bit counter into bytes 6-10 as 12 + 12 + 8 bits.
///
/// ```text
/// byte:   6         7         8          9         10
///       | ver | hi        | 10 00 | mid         | lo      |
/// ```
pub(crate) fn put_clock32(bytes: &mut [u8; 16], counter: u32) {
    let hi = (counter >> 20) as u16;
    let mid = ((counter >> 8) & 0x0fff) as u16;
    bytes[6] = (bytes[6] & 0xf0) | (hi >> 8) as u8;
    bytes[7] = hi as u8;
    bytes[8] = (bytes[8] & 0xc0) | (mid >> 8) as u8;
    bytes[9] = mid as u8;
    bytes[10] = counter as u8;
}

/// Unpacks a 32-bit counter from bytes 6-10, or returns `None` if the carry-guard bits of byte 8
/// are not clear.
///
/// Random payloads pass this check one time in four.
pub(crate) fn get_clock32(bytes: &[u8; 16], version: Version) -> Option<u32> {
    if bytes[6] >> 4 != version.number() || bytes[8] & CARRY_GUARD != 0 {
        return None;
    }
    let hi = (((bytes[6] & 0x0f) as u32) << 8) | bytes[7] as u32;
    let mid = (((bytes[8] & 0x0f) as u32) << 8) | bytes[9] as u32;
    Some((hi << 20) | (mid << 8) | bytes[10] as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKS: u64 = 0x0123_4567_89ab_cdef & TICK_MASK;

    /// Places the same ticks differently for V1 and V6
    #[test]
    fn places_the_same_ticks_differently_for_v1_and_v6() {
        let mut v1 = [0u8; 16];
        put_v1_ticks(&mut v1, TICKS);
        stamp(&mut v1, Version::V1);
        assert_eq!(v1[..8], [0x89, 0xab, 0xcd, 0xef, 0x45, 0x67, 0x11, 0x23]);
        assert_eq!(get_v1_ticks(&v1), TICKS);

        let mut v6 = [0u8; 16];
        put_v6_ticks(&mut v6, TICKS);
        stamp(&mut v6, Version::V6);
        assert_eq!(v6[..8], [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0x6d, 0xef]);
        assert_eq!(get_v6_ticks(&v6), TICKS);
    }

    /// Stamps version and variant without disturbing neighbors
    #[test]
    fn stamps_version_and_variant_without_disturbing_neighbors() {
        let mut bytes = [0xffu8; 16];
        stamp(&mut bytes, Version::V7);
        assert_eq!(bytes[6], 0x7f);
        assert_eq!(bytes[8], 0xbf);
        unstamp(&mut bytes);
        assert_eq!(bytes[6], 0x0f);
        assert_eq!(bytes[8], 0x3f);
    }

    /// Handles 48-bit millis with sign extension
    #[test]
    fn handles_48_bit_millis_with_sign_extension() {
        let mut bytes = [0u8; 16];
        put_uint48(&mut bytes, 0x0123_4567_89ab);
        assert_eq!(bytes[..6], [0x01, 0x23, 0x45, 0x67, 0x89, 0xab]);
        assert_eq!(get_uint48(&bytes), 0x0123_4567_89ab);
        assert_eq!(sign_extend_millis(0x0123_4567_89ab), 0x0123_4567_89ab);
        assert_eq!(sign_extend_millis(MILLI_MASK), -1);
        assert_eq!(sign_extend_millis((-1000i64) as u64), -1000);
    }

    /// Keeps 14-bit counters inside the variant byte
    #[test]
    fn keeps_14_bit_counters_inside_the_variant_byte() {
        let mut bytes = [0u8; 16];
        put_clock14(&mut bytes, 0xffff_ffff);
        stamp(&mut bytes, Version::V1);
        assert_eq!(bytes[8..10], [0xbf, 0xff]);
        assert_eq!(get_clock14(&bytes), CLOCK14_MASK);
    }

    /// Packs 32-bit counters with clear carry guard
    #[test]
    fn packs_32_bit_counters_with_clear_carry_guard() {
        for counter in [0, 1, 0xff, 0x100, 0x000f_ffff, 0x1234_5678, u32::MAX] {
            let mut bytes = [0u8; 16];
            put_clock32(&mut bytes, counter);
            stamp(&mut bytes, Version::V7);
            assert_eq!(bytes[6] >> 4, 7);
            assert_eq!(bytes[8] & 0xf0, 0x80);
            assert_eq!(get_clock32(&bytes, Version::V7), Some(counter));
        }
    }

    /// Orders 32-bit counters bytewise
    #[test]
    fn orders_32_bit_counters_bytewise() {
        let pack = |c: u32| {
            let mut bytes = [0u8; 16];
            put_clock32(&mut bytes, c);
            stamp(&mut bytes, Version::V7);
            bytes
        };
        let mut prev = pack(0);
        for c in (1..u32::MAX).step_by(0x0001_2345) {
            let curr = pack(c);
            assert!(prev < curr);
            prev = curr;
        }
    }

    /// Rejects counters when the carry guard is set
    #[test]
    fn rejects_counters_when_the_carry_guard_is_set() {
        let mut bytes = [0u8; 16];
        bytes[6] = 0x70;
        bytes[8] = 0x90;
        assert_eq!(get_clock32(&bytes, Version::V7), None);
        bytes[8] = 0xa0;
        assert_eq!(get_clock32(&bytes, Version::V7), None);
        bytes[8] = 0x8f;
        assert!(get_clock32(&bytes, Version::V7).is_some());
        assert_eq!(get_clock32(&bytes, Version::V8), None);
    }
}
