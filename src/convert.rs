use crate::layout::{
    get_clock14, get_v1_ticks, get_v6_ticks, put_clock32, put_uint48, put_v1_ticks, put_v6_ticks,
    stamp,
};
use crate::ticks::{from_gregorian_ticks, to_unix_millis};
use crate::{Error, LeapSecondCalculator, NoLeapSeconds, Uuid, Version};

impl Uuid {
    /// Reinterprets this UUID under another version's layout, assuming no leap seconds.
    ///
    /// See [`convert_with`](Self::convert_with).
    pub fn convert(&self, version: Version) -> Result<Self, Error> {
        self.convert_with(version, &NoLeapSeconds)
    }

    /// Reinterprets this UUID under another version's layout.
    ///
    /// - The nil and max UUIDs are returned as is.
    /// - Converting to the current version is a no-op; converting to V8 only relabels.
    /// - V1 and V6 convert into each other losslessly.
    /// - V1 and V6 convert one way into V7: the ticks become milliseconds through `lsc`, the
    ///   clock sequence becomes the counter, and the last five bytes are taken from a BLAKE3
    ///   digest of the input, so the result depends on the input alone.
    ///
    /// Any other pair fails with [`Error::VersionMismatch`] listing the reachable versions.
    ///
    /// ```rust
    /// use uuidkit::{Uuid, Version};
    ///
    /// let v1: Uuid = "20616934-4ba2-11e7-8000-010203040506".parse()?;
    /// let v6 = v1.convert(Version::V6)?;
    /// assert_eq!(v6.to_string(), "1e74ba22-0616-6934-8000-010203040506");
    /// assert_eq!(v6.convert(Version::V1)?, v1);
    /// # Ok::<(), uuidkit::Error>(())
    /// ```
    pub fn convert_with(
        &self,
        version: Version,
        lsc: &dyn LeapSecondCalculator,
    ) -> Result<Self, Error> {
        if self.is_nil() || self.is_max() {
            return Ok(*self);
        }
        if !self.is_valid() {
            return Err(Error::InputNotValid { input: *self });
        }

        let current = self.version();
        if current == Some(version) {
            return Ok(*self);
        }

        let mut bytes = *self.as_bytes();
        match (current, version) {
            (_, Version::V8) => {}
            (Some(Version::V1), Version::V6) => {
                let ticks = get_v1_ticks(&bytes);
                put_v6_ticks(&mut bytes, ticks);
            }
            (Some(Version::V6), Version::V1) => {
                let ticks = get_v6_ticks(&bytes);
                put_v1_ticks(&mut bytes, ticks);
            }
            (Some(from @ (Version::V1 | Version::V6)), Version::V7) => {
                let ticks = if from == Version::V1 {
                    get_v1_ticks(&bytes)
                } else {
                    get_v6_ticks(&bytes)
                };
                let counter = get_clock14(&bytes);
                let digest = blake3::hash(self.as_bytes());

                put_uint48(&mut bytes, to_unix_millis(&from_gregorian_ticks(lsc, ticks)));
                put_clock32(&mut bytes, counter);
                bytes[11..16].copy_from_slice(&digest.as_bytes()[..5]);
            }
            (Some(Version::V1 | Version::V6), _) => {
                return Err(Error::VersionMismatch {
                    requested: version,
                    expected: vec![Version::V1, Version::V6, Version::V7, Version::V8],
                })
            }
            (from, _) => {
                return Err(Error::VersionMismatch {
                    requested: version,
                    expected: from.into_iter().chain([Version::V8]).collect(),
                })
            }
        }
        stamp(&mut bytes, version);
        Ok(Self::from(bytes))
    }
}
