use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use digest::DynDigest;

use super::{GeneratorOptions, HashFactory};
use crate::layout::stamp;
use crate::{Error, Uuid, Version};

/// Idle hash contexts kept for reuse; beyond this, contexts are dropped after use.
const POOL_LIMIT: usize = 4;

/// Generates name-based UUIDs of version 3 (MD5), 5 (SHA-1) or 8 (caller-supplied digest).
///
/// The UUID is the first 16 bytes of `hash(namespace || data)` with the version and variant
/// stamped over them.
pub struct HashGenerator {
    version: Version,
    namespace: Uuid,
    factory: HashFactory,
    pool: Mutex<Vec<Box<dyn DynDigest + Send>>>,
}

impl HashGenerator {
    /// Creates a generator.
    ///
    /// Fails unless the namespace is a valid UUID, and for V8 unless a hash factory is given.
    pub fn new(version: Version, options: GeneratorOptions) -> Result<Self, Error> {
        let factory: HashFactory = match version {
            Version::V3 => Arc::new(boxed::<md5::Md5>),
            Version::V5 => Arc::new(boxed::<sha1::Sha1>),
            Version::V8 => options
                .hash_factory
                .ok_or(Error::MissingHashFactory { version })?,
            _ => {
                return Err(Error::VersionMismatch {
                    requested: version,
                    expected: vec![Version::V3, Version::V5, Version::V8],
                })
            }
        };

        let namespace = options.namespace;
        if !namespace.is_valid() {
            return Err(Error::InvalidNamespace { version, namespace });
        }

        Ok(Self {
            version,
            namespace,
            factory,
            pool: Mutex::new(Vec::new()),
        })
    }

    /// Returns the version this generator produces.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the namespace every name is hashed under.
    pub fn namespace(&self) -> Uuid {
        self.namespace
    }

    /// Generates the UUID for `data`.
    pub fn generate(&self, data: &[u8]) -> Uuid {
        let mut hasher = self.checkout();
        hasher.update(self.namespace.as_bytes());
        hasher.update(data);
        let sum = hasher.finalize_reset();
        self.checkin(hasher);

        let mut bytes = [0u8; 16];
        let n = sum.len().min(16);
        bytes[..n].copy_from_slice(&sum[..n]);
        stamp(&mut bytes, self.version);
        Uuid::from(bytes)
    }

    fn checkout(&self) -> Box<dyn DynDigest + Send> {
        let pooled = self.pool.lock().unwrap_or_else(PoisonError::into_inner).pop();
        pooled.unwrap_or_else(|| (self.factory)())
    }

    fn checkin(&self, hasher: Box<dyn DynDigest + Send>) {
        let mut pool = self.pool.lock().unwrap_or_else(PoisonError::into_inner);
        if pool.len() < POOL_LIMIT {
            pool.push(hasher);
        }
    }
}

fn boxed<D: DynDigest + Default + Send + 'static>() -> Box<dyn DynDigest + Send> {
    Box::<D>::default()
}

impl fmt::Debug for HashGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashGenerator")
            .field("version", &self.version)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::HashGenerator;
    use crate::{Error, GeneratorOptions, Uuid, Version};

    const DNS: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    fn options() -> GeneratorOptions {
        GeneratorOptions::default().with_namespace(DNS.parse().unwrap())
    }

    /// Reproduces well-known name-based UUIDs
    #[test]
    fn reproduces_well_known_name_based_uuids() {
        let v3 = HashGenerator::new(Version::V3, options()).unwrap();
        assert_eq!(
            v3.generate(b"python.org").to_string(),
            "6fa459ea-ee8a-3ca4-894e-db77e160355e"
        );

        let v5 = HashGenerator::new(Version::V5, options()).unwrap();
        assert_eq!(
            v5.generate(b"python.org").to_string(),
            "886313e1-3b8a-5372-9b90-0c9aee199e5d"
        );
    }

    /// Stamps V8 over a caller-supplied digest
    #[test]
    fn stamps_v8_over_a_caller_supplied_digest() {
        let g = HashGenerator::new(Version::V8, options().with_hash::<sha1::Sha1>()).unwrap();
        assert_eq!(
            g.generate(b"python.org").to_string(),
            "886313e1-3b8a-8372-9b90-0c9aee199e5d"
        );
    }

    /// Returns the same UUID for the same name
    #[test]
    fn returns_the_same_uuid_for_the_same_name() {
        let g = HashGenerator::new(Version::V5, options()).unwrap();
        let a = g.generate(b"example");
        assert_eq!(g.generate(b"other").version(), Some(Version::V5));
        assert_eq!(g.generate(b"example"), a);
        assert_ne!(g.generate(b"other"), a);
    }

    /// Shares reusable contexts across threads
    #[test]
    fn shares_reusable_contexts_across_threads() {
        use std::{sync::Arc, thread};

        let g = Arc::new(HashGenerator::new(Version::V3, options()).unwrap());
        let expected = g.generate(b"python.org");
        let handles = (0..8)
            .map(|_| {
                let g = Arc::clone(&g);
                thread::spawn(move || {
                    (0..1_000)
                        .map(|_| g.generate(b"python.org"))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert!(handle.join().unwrap().iter().all(|e| *e == expected));
        }
    }

    /// Requires a valid namespace and a V8 hash factory
    #[test]
    fn requires_a_valid_namespace_and_a_v8_hash_factory() {
        let invalid = Uuid::from([0x11; 16]);
        assert!(matches!(
            HashGenerator::new(Version::V5, GeneratorOptions::default().with_namespace(invalid)),
            Err(Error::InvalidNamespace { version: Version::V5, namespace }) if namespace == invalid
        ));
        assert!(matches!(
            HashGenerator::new(Version::V8, options()),
            Err(Error::MissingHashFactory { version: Version::V8 })
        ));
        assert!(matches!(
            HashGenerator::new(Version::V4, options()),
            Err(Error::VersionMismatch { requested: Version::V4, .. })
        ));
    }
}
