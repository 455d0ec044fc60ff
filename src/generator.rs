//! UUID generators and related types.

use std::collections::HashMap;
use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use digest::DynDigest;

use crate::{
    ClockStorage, Error, InterfaceSource, LeapSecondCalculator, Method, Node, Uuid, Version,
};

mod hash;
mod random;
mod time;
pub mod with_rand08;

pub use hash::HashGenerator;
pub use random::RandomGenerator;
pub use time::TimeGenerator;

/// A trait that defines the minimum random number generator interface for generators.
pub trait RandSource {
    /// Returns the next random `u32`.
    fn next_u32(&mut self) -> u32;

    /// Returns the next random `u64`.
    fn next_u64(&mut self) -> u64;

    /// Fills `dest` with random data.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// A trait that defines the minimum system clock interface for time-based generators.
pub trait TimeSource {
    /// Returns the current time.
    fn now(&mut self) -> DateTime<Utc>;
}

/// The default [`TimeSource`] that reads the system clock.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The default [`RandSource`].
///
/// Employs [`ChaCha12Core`](rand_chacha::ChaCha12Core) with a [`ReseedingRng`] wrapper drawing
/// from the operating system, emulating the strategy used by [`rand::rngs::ThreadRng`].
///
/// [`ReseedingRng`]: rand::rngs::adapter::ReseedingRng
#[derive(Debug)]
pub struct DefaultRandSource(
    rand::rngs::adapter::ReseedingRng<rand_chacha::ChaCha12Core, rand::rngs::OsRng>,
);

impl DefaultRandSource {
    /// Seeds a new instance from the operating system.
    pub fn new() -> Result<Self, rand::Error> {
        use rand::{rngs::OsRng, SeedableRng};

        let core = rand_chacha::ChaCha12Core::from_rng(OsRng)?;
        Ok(Self(rand::rngs::adapter::ReseedingRng::new(
            core,
            1024 * 64,
            OsRng,
        )))
    }
}

impl RandSource for DefaultRandSource {
    fn next_u32(&mut self) -> u32 {
        rand::RngCore::next_u32(&mut self.0)
    }

    fn next_u64(&mut self) -> u64 {
        rand::RngCore::next_u64(&mut self.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand::RngCore::fill_bytes(&mut self.0, dest)
    }
}

/// Produces fresh hash contexts for V8 hash-based generators.
pub type HashFactory = Arc<dyn Fn() -> Box<dyn DynDigest + Send> + Send + Sync>;

/// Options shared by every generator constructor. Each generator reads the fields it needs and
/// ignores the rest.
///
/// # Examples
///
/// ```rust
/// use uuidkit::{FixedLeapSeconds, GeneratorOptions, Node};
///
/// let options = GeneratorOptions::default()
///     .with_node(Node::from_bytes([0x02, 0x00, 0x5e, 0x10, 0x00, 0x01]))
///     .with_leap_seconds(FixedLeapSeconds);
/// ```
#[derive(Default)]
pub struct GeneratorOptions {
    /// Node for time-based generators. Resolved from the host when `None` or nil.
    pub node: Option<Node>,

    /// Clock for time-based generators, [`StdSystemTime`] if `None`.
    pub time_source: Option<Box<dyn TimeSource + Send>>,

    /// Leap-second calculator for V1 and V6, [`NoLeapSeconds`](crate::NoLeapSeconds) if `None`.
    pub leap_seconds: Option<Arc<dyn LeapSecondCalculator + Send + Sync>>,

    /// Clock persistence for time-based generators,
    /// [`UnavailableClockStorage`](crate::UnavailableClockStorage) if `None`.
    pub clock_storage: Option<Arc<dyn ClockStorage>>,

    /// Namespace for hash-based generators; must be a valid UUID.
    pub namespace: Uuid,

    /// Hash contexts for V8 hash-based generators. V3 and V5 always use MD5 and SHA-1.
    pub hash_factory: Option<HashFactory>,

    /// Skip host interfaces and use a random node.
    pub force_random_node: bool,

    /// Randomness for random-based generators, node synthesis and counter seeding,
    /// [`DefaultRandSource`] if `None`.
    pub random_source: Option<Box<dyn RandSource + Send>>,

    /// Host interface enumeration, [`SystemInterfaces`](crate::SystemInterfaces) if `None`.
    pub interfaces: Option<Box<dyn InterfaceSource + Send>>,
}

impl GeneratorOptions {
    /// Pins the node instead of resolving it from the host.
    pub fn with_node(mut self, node: Node) -> Self {
        self.node = Some(node);
        self
    }

    /// Replaces the system clock.
    pub fn with_time_source(mut self, time_source: impl TimeSource + Send + 'static) -> Self {
        self.time_source = Some(Box::new(time_source));
        self
    }

    /// Sets the leap-second calculator applied to V1 and V6 timestamps.
    pub fn with_leap_seconds(
        mut self,
        leap_seconds: impl LeapSecondCalculator + Send + Sync + 'static,
    ) -> Self {
        self.leap_seconds = Some(Arc::new(leap_seconds));
        self
    }

    /// Persists clock state to `clock_storage`, which may be shared between generators.
    pub fn with_clock_storage(mut self, clock_storage: Arc<dyn ClockStorage>) -> Self {
        self.clock_storage = Some(clock_storage);
        self
    }

    /// Sets the namespace hash-based generators hash names under.
    pub fn with_namespace(mut self, namespace: Uuid) -> Self {
        self.namespace = namespace;
        self
    }

    /// Sets the hash factory from a [`Digest`](digest::Digest) type, e.g. `sha1::Sha1`.
    pub fn with_hash<D>(mut self) -> Self
    where
        D: DynDigest + Default + Send + 'static,
    {
        self.hash_factory = Some(Arc::new(|| {
            Box::new(D::default()) as Box<dyn DynDigest + Send>
        }));
        self
    }

    /// Skips host interfaces when set, so time-based generators always use a random node.
    pub fn with_force_random_node(mut self, force_random_node: bool) -> Self {
        self.force_random_node = force_random_node;
        self
    }

    /// Replaces the default random source.
    ///
    /// See [`with_rand08`](Self::with_rand08) for `rand` 0.8 generators.
    pub fn with_random_source(mut self, random_source: impl RandSource + Send + 'static) -> Self {
        self.random_source = Some(Box::new(random_source));
        self
    }

    /// Replaces host interface enumeration, e.g. with a fixed list.
    pub fn with_interfaces(mut self, interfaces: impl InterfaceSource + Send + 'static) -> Self {
        self.interfaces = Some(Box::new(interfaces));
        self
    }

    /// Takes the configured random source or seeds a [`DefaultRandSource`].
    pub(crate) fn take_random_source(&mut self) -> Result<Box<dyn RandSource + Send>, Error> {
        match self.random_source.take() {
            Some(rng) => Ok(rng),
            None => DefaultRandSource::new()
                .map(|rng| Box::new(rng) as Box<dyn RandSource + Send>)
                .map_err(|source| Error::Random { source }),
        }
    }
}

impl fmt::Debug for GeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorOptions")
            .field("node", &self.node)
            .field("time_source", &self.time_source.is_some())
            .field("leap_seconds", &self.leap_seconds.is_some())
            .field("clock_storage", &self.clock_storage.is_some())
            .field("namespace", &self.namespace)
            .field("hash_factory", &self.hash_factory.is_some())
            .field("force_random_node", &self.force_random_node)
            .field("random_source", &self.random_source.is_some())
            .field("interfaces", &self.interfaces.is_some())
            .finish()
    }
}

/// A UUID generator for one version, built from one of three strategies.
///
/// | Strategy                   | Versions   | [`new_uuid`] | [`new_hash_uuid`] |
/// | -------------------------- | ---------- | ------------ | ----------------- |
/// | [`TimeGenerator`]          | 1, 6, 7, 8 | yes          |                   |
/// | [`HashGenerator`]          | 3, 5, 8    |              | yes               |
/// | [`RandomGenerator`]        | 4, 8       | yes          |                   |
///
/// Unsupported methods return [`Error::UnsupportedMethod`]. Generators are `Send + Sync`;
/// share one behind an [`Arc`] to keep a single monotonic sequence across threads.
///
/// # Examples
///
/// ```rust
/// use uuidkit::{Generator, GeneratorOptions, Version};
///
/// let g = Generator::new(Version::V7, GeneratorOptions::default().with_force_random_node(true))?;
/// let a = g.new_uuid()?;
/// let b = g.new_uuid()?;
/// assert!(a < b);
/// # Ok::<(), uuidkit::Error>(())
/// ```
///
/// [`new_uuid`]: Generator::new_uuid
/// [`new_hash_uuid`]: Generator::new_hash_uuid
#[derive(Debug)]
pub enum Generator {
    /// Clock and counter based.
    Time(TimeGenerator),
    /// Name based.
    Hash(HashGenerator),
    /// Random.
    Random(RandomGenerator),
}

impl Generator {
    /// Constructs the default generator for `version`.
    ///
    /// Shorthand for [`GeneratorRegistry::construct`] on an empty registry.
    pub fn new(version: Version, options: GeneratorOptions) -> Result<Self, Error> {
        GeneratorRegistry::new().construct(version, options)
    }

    /// Returns the version this generator produces.
    pub fn version(&self) -> Version {
        match self {
            Self::Time(g) => g.version(),
            Self::Hash(g) => g.version(),
            Self::Random(g) => g.version(),
        }
    }

    /// Generates a new unpredictable UUID.
    pub fn new_uuid(&self) -> Result<Uuid, Error> {
        match self {
            Self::Time(g) => g.generate(),
            Self::Random(g) => g.generate(),
            Self::Hash(g) => Err(Error::UnsupportedMethod {
                version: g.version(),
                method: Method::NewUuid,
            }),
        }
    }

    /// Generates a deterministic UUID by hashing `data` under the namespace.
    pub fn new_hash_uuid(&self, data: &[u8]) -> Result<Uuid, Error> {
        match self {
            Self::Hash(g) => Ok(g.generate(data)),
            other => Err(Error::UnsupportedMethod {
                version: other.version(),
                method: Method::NewHashUuid,
            }),
        }
    }
}

impl From<TimeGenerator> for Generator {
    fn from(src: TimeGenerator) -> Self {
        Self::Time(src)
    }
}

impl From<HashGenerator> for Generator {
    fn from(src: HashGenerator) -> Self {
        Self::Hash(src)
    }
}

impl From<RandomGenerator> for Generator {
    fn from(src: RandomGenerator) -> Self {
        Self::Random(src)
    }
}

/// Constructs a [`Generator`] for a version.
///
/// Implemented for closures of the same shape.
pub trait GeneratorFactory: Send + Sync {
    fn construct(&self, version: Version, options: GeneratorOptions) -> Result<Generator, Error>;
}

impl<F> GeneratorFactory for F
where
    F: Fn(Version, GeneratorOptions) -> Result<Generator, Error> + Send + Sync,
{
    fn construct(&self, version: Version, options: GeneratorOptions) -> Result<Generator, Error> {
        self(version, options)
    }
}

/// Maps versions to generator factories, falling back to the built-in strategies.
///
/// Independent registries may coexist; nothing here is process-wide.
///
/// # Examples
///
/// ```rust
/// use uuidkit::{Generator, GeneratorOptions, GeneratorRegistry, RandomGenerator, Version};
///
/// let mut registry = GeneratorRegistry::new();
/// registry.register(Version::V8, |version: Version, options: GeneratorOptions| {
///     RandomGenerator::new(version, options).map(Generator::from)
/// });
/// let g = registry.construct(Version::V8, GeneratorOptions::default())?;
/// assert_eq!(g.new_uuid()?.version(), Some(Version::V8));
/// # Ok::<(), uuidkit::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    overrides: HashMap<Version, Arc<dyn GeneratorFactory>>,
}

impl GeneratorRegistry {
    /// Creates a registry with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `version` to `factory`, replacing any earlier registration.
    pub fn register(
        &mut self,
        version: Version,
        factory: impl GeneratorFactory + 'static,
    ) -> &mut Self {
        self.overrides.insert(version, Arc::new(factory));
        self
    }

    /// Removes the override for `version`, returning true if there was one.
    pub fn unregister(&mut self, version: Version) -> bool {
        self.overrides.remove(&version).is_some()
    }

    /// Constructs a generator for `version`: a registered override first, then time-based for
    /// 1, 6 and 7, MD5 for 3, SHA-1 for 5 and random for 4.
    pub fn construct(
        &self,
        version: Version,
        options: GeneratorOptions,
    ) -> Result<Generator, Error> {
        if let Some(factory) = self.overrides.get(&version) {
            tracing::debug!(%version, "constructing generator from registered factory");
            return factory.construct(version, options);
        }
        match version {
            v if v.is_time_based() => TimeGenerator::new(version, options).map(Generator::from),
            Version::V3 | Version::V5 => HashGenerator::new(version, options).map(Generator::from),
            Version::V4 => RandomGenerator::new(version, options).map(Generator::from),
            _ => Err(Error::UnsupportedVersion { version }),
        }
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut versions = self.overrides.keys().collect::<Vec<_>>();
        versions.sort();
        f.debug_struct("GeneratorRegistry")
            .field("overrides", &versions)
            .finish()
    }
}
