use std::{fmt, str};

use fstr::FStr;

use crate::{parse, ParseError, Version};

/// Represents a Universally Unique IDentifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

/// The layout family named by the top bits of byte 8.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// The all-zero sentinel.
    Nil,
    /// `0xxx`, reserved for NCS backward compatibility.
    Ncs,
    /// `10xx`, the layout described by RFC 4122 and RFC 9562.
    Rfc,
    /// `110x`, reserved for Microsoft backward compatibility.
    Microsoft,
    /// `111x`, reserved for future definition.
    Future,
    /// The all-one sentinel.
    Max,
}

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Creates an object from a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns true if this is the nil UUID.
    pub const fn is_nil(&self) -> bool {
        u128::from_be_bytes(self.0) == 0
    }

    /// Returns true if this is the max UUID.
    pub const fn is_max(&self) -> bool {
        u128::from_be_bytes(self.0) == u128::MAX
    }

    /// Returns the variant field, reporting the two sentinels separately.
    pub const fn variant(&self) -> Variant {
        if self.is_nil() {
            Variant::Nil
        } else if self.is_max() {
            Variant::Max
        } else {
            match self.0[8] >> 5 {
                0b000..=0b011 => Variant::Ncs,
                0b100 | 0b101 => Variant::Rfc,
                0b110 => Variant::Microsoft,
                _ => Variant::Future,
            }
        }
    }

    /// Returns true if the variant bits are `10`. The nil and max UUIDs are not valid.
    pub const fn is_valid(&self) -> bool {
        matches!(self.variant(), Variant::Rfc)
    }

    /// Returns the version field of a valid UUID.
    ///
    /// Returns `None` for invalid UUIDs and for version numbers outside 1 through 8.
    pub const fn version(&self) -> Option<Version> {
        if self.is_valid() {
            Version::from_nibble(self.0[6] >> 4)
        } else {
            None
        }
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// structure that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuidkit::Uuid;
    ///
    /// let x = "{01809424-3E59-7C05-9219-566F82FFF672}".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(y.as_str(), "01809424-3e59-7c05-9219-566f82fff672");
    /// assert_eq!(format!("{}", y), "01809424-3e59-7c05-9219-566f82fff672");
    /// # Ok::<(), uuidkit::ParseError>(())
    /// ```
    pub fn encode(&self) -> FStr<36> {
        let mut buffer = [0u8; 36];
        self.write_hyphenated(&mut buffer);
        debug_assert!(buffer.is_ascii());
        // SAFETY: every byte written is an ASCII hex digit or hyphen
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    /// Returns the `urn:uuid:` form.
    ///
    /// ```rust
    /// assert_eq!(uuidkit::Uuid::MAX.urn().as_str(), "urn:uuid:ffffffff-ffff-ffff-ffff-ffffffffffff");
    /// ```
    pub fn urn(&self) -> FStr<45> {
        let mut buffer = [0u8; 45];
        buffer[..9].copy_from_slice(b"urn:uuid:");
        let mut tail = [0u8; 36];
        self.write_hyphenated(&mut tail);
        buffer[9..].copy_from_slice(&tail);
        debug_assert!(buffer.is_ascii());
        // SAFETY: the prefix and the hyphenated form are both ASCII
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    fn write_hyphenated(&self, buffer: &mut [u8; 36]) {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buf_iter = buffer.iter_mut();
        let mut put = |c: u8| {
            if let Some(slot) = buf_iter.next() {
                *slot = c;
            }
        };
        for (i, &e) in self.0.iter().enumerate() {
            put(DIGITS[(e >> 4) as usize]);
            put(DIGITS[(e & 15) as usize]);
            if i == 3 || i == 5 || i == 7 || i == 9 {
                put(b'-');
            }
        }
    }

    /// Parses any accepted text form or the raw 16-byte form.
    pub fn parse_bytes(src: &[u8]) -> Result<Self, ParseError> {
        parse::parse(src, true)
    }
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = ParseError;

    /// Creates an object from any accepted text form: empty, `nil`, `null`, `max`, compact,
    /// hyphenated, braced or URN.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        parse::parse(src.as_bytes(), false)
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Uuid {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = ParseError;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        Self::parse_bytes(src)
    }
}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Uuid::parse_bytes(value).map_err(de::Error::custom)
        }
    }

}
