use std::fmt;
use std::sync::{Mutex, PoisonError};

use super::{GeneratorOptions, RandSource};
use crate::layout::stamp;
use crate::{Error, Uuid, Version};

/// Generates random UUIDs of version 4 or 8.
pub struct RandomGenerator {
    version: Version,
    rng: Mutex<Box<dyn RandSource + Send>>,
}

impl RandomGenerator {
    /// Creates a generator drawing from the configured random source, or from a freshly seeded
    /// [`DefaultRandSource`](super::DefaultRandSource).
    pub fn new(version: Version, mut options: GeneratorOptions) -> Result<Self, Error> {
        if !matches!(version, Version::V4 | Version::V8) {
            return Err(Error::VersionMismatch {
                requested: version,
                expected: vec![Version::V4, Version::V8],
            });
        }
        Ok(Self {
            version,
            rng: Mutex::new(options.take_random_source()?),
        })
    }

    /// Returns the version this generator produces.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Generates a new UUID.
    pub fn generate(&self) -> Result<Uuid, Error> {
        let mut bytes = [0u8; 16];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut bytes);
        stamp(&mut bytes, self.version);
        Ok(Uuid::from(bytes))
    }
}

impl fmt::Debug for RandomGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomGenerator")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::RandomGenerator;
    use crate::{Error, GeneratorOptions, Version};

    const N_SAMPLES: usize = 100_000;

    fn samples(version: Version) -> Vec<String> {
        let g = RandomGenerator::new(version, GeneratorOptions::default()).unwrap();
        (0..N_SAMPLES)
            .map(|_| g.generate().unwrap().to_string())
            .collect()
    }

    fn count_bits(samples: &[String]) -> [u32; 128] {
        let mut bins = [0u32; 128];
        for e in samples {
            let mut it = bins.iter_mut().rev();
            for c in e.chars().rev() {
                if let Some(mut num) = c.to_digit(16) {
                    for _ in 0..4 {
                        *it.next().unwrap() += num & 1;
                        num >>= 1;
                    }
                }
            }
        }
        bins
    }

    fn assert_random_bits(bins: &[u32; 128]) {
        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for i in (0..48).chain(52..64).chain(66..128) {
            let p = bins[i] as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {}: {}", i, p);
        }
    }

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        for e in samples(Version::V4).iter().take(10_000) {
            assert!(re.is_match(e));
        }
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        let samples = samples(Version::V4);
        let s: HashSet<&String> = samples.iter().collect();
        assert_eq!(s.len(), N_SAMPLES);
    }

    /// Sets constant bits and random bits properly
    #[test]
    fn sets_constant_bits_and_random_bits_properly() {
        let n = N_SAMPLES as u32;

        let bins = count_bits(&samples(Version::V4));
        assert_eq!(bins[48], 0, "version bit 48");
        assert_eq!(bins[49], n, "version bit 49");
        assert_eq!(bins[50], 0, "version bit 50");
        assert_eq!(bins[51], 0, "version bit 51");
        assert_eq!(bins[64], n, "variant bit 64");
        assert_eq!(bins[65], 0, "variant bit 65");
        assert_random_bits(&bins);

        let bins = count_bits(&samples(Version::V8));
        assert_eq!(bins[48], n, "version bit 48");
        assert_eq!(bins[49], 0, "version bit 49");
        assert_eq!(bins[50], 0, "version bit 50");
        assert_eq!(bins[51], 0, "version bit 51");
        assert_eq!(bins[64], n, "variant bit 64");
        assert_eq!(bins[65], 0, "variant bit 65");
        assert_random_bits(&bins);
    }

    /// Is reproducible with a seeded random source
    #[test]
    fn is_reproducible_with_a_seeded_random_source() {
        use rand::{rngs::StdRng, SeedableRng};

        let make = || {
            let options = GeneratorOptions::default().with_rand08(StdRng::seed_from_u64(7));
            RandomGenerator::new(Version::V4, options).unwrap()
        };
        let (a, b) = (make(), make());
        for _ in 0..16 {
            assert_eq!(a.generate().unwrap(), b.generate().unwrap());
        }
    }

    /// Rejects versions other than 4 and 8
    #[test]
    fn rejects_versions_other_than_4_and_8() {
        for version in [Version::V1, Version::V3, Version::V7] {
            match RandomGenerator::new(version, GeneratorOptions::default()) {
                Err(Error::VersionMismatch {
                    requested,
                    expected,
                }) => {
                    assert_eq!(requested, version);
                    assert_eq!(expected, [Version::V4, Version::V8]);
                }
                other => panic!("unexpected result {other:?}"),
            }
        }
    }
}
