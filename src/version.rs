use std::fmt;

/// The version number carried in the high nibble of byte 6.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Version {
    /// Gregorian time, counter and node.
    V1 = 1,
    /// DCE security.
    V2 = 2,
    /// MD5 name-based.
    V3 = 3,
    /// Random.
    V4 = 4,
    /// SHA-1 name-based.
    V5 = 5,
    /// Gregorian time reordered for sorting.
    V6 = 6,
    /// Unix time in milliseconds.
    V7 = 7,
    /// Custom or opaque.
    V8 = 8,
}

impl Version {
    /// Returns the version that the nibble `n` names, if any.
    pub const fn from_nibble(n: u8) -> Option<Self> {
        Some(match n {
            1 => Self::V1,
            2 => Self::V2,
            3 => Self::V3,
            4 => Self::V4,
            5 => Self::V5,
            6 => Self::V6,
            7 => Self::V7,
            8 => Self::V8,
            _ => return None,
        })
    }

    /// Returns the numeric value of this version.
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Returns true if identifiers of this version embed a timestamp.
    pub const fn is_time_based(self) -> bool {
        matches!(self, Self::V1 | Self::V6 | Self::V7)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version {}", self.number())
    }
}

impl From<Version> for u8 {
    fn from(src: Version) -> Self {
        src.number()
    }
}

impl TryFrom<u8> for Version {
    type Error = u8;

    fn try_from(src: u8) -> Result<Self, Self::Error> {
        Self::from_nibble(src).ok_or(src)
    }
}

/// Formats a list of versions as "Version 1, Version 6, and Version 8".
pub(crate) struct VersionList<'a>(pub &'a [Version]);

impl fmt::Display for VersionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.0.len().saturating_sub(1);
        for (i, v) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(if i == last { ", and " } else { ", " })?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Version, VersionList};

    /// Maps nibbles to versions and back
    #[test]
    fn maps_nibbles_to_versions_and_back() {
        for n in 1..=8u8 {
            let v = Version::from_nibble(n).unwrap();
            assert_eq!(v.number(), n);
            assert_eq!(Version::try_from(n), Ok(v));
        }
        assert_eq!(Version::from_nibble(0), None);
        assert_eq!(Version::try_from(9), Err(9));
        assert_eq!(Version::from_nibble(15), None);
    }

    /// Marks only versions 1, 6 and 7 as time-based
    #[test]
    fn marks_only_versions_1_6_and_7_as_time_based() {
        let time_based = (1..=8u8)
            .filter_map(Version::from_nibble)
            .filter(|v| v.is_time_based())
            .collect::<Vec<_>>();
        assert_eq!(time_based, [Version::V1, Version::V6, Version::V7]);
    }

    /// Formats version lists in prose
    #[test]
    fn formats_version_lists_in_prose() {
        use Version::*;
        assert_eq!(VersionList(&[V7]).to_string(), "Version 7");
        assert_eq!(VersionList(&[V3, V8]).to_string(), "Version 3, and Version 8");
        assert_eq!(
            VersionList(&[V1, V6, V7, V8]).to_string(),
            "Version 1, Version 6, Version 7, and Version 8"
        );
    }
}
