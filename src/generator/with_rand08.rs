//! Integration with `rand` (v0.8) crate.

use super::{GeneratorOptions, RandSource};
use rand::RngCore;

/// An adapter that implements [`RandSource`] for [`RngCore`] types.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Adapter<T>(/** The wrapped [`RngCore`] type. */ pub T);

impl<T: RngCore> RandSource for Adapter<T> {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
}

impl GeneratorOptions {
    /// Sets the random source to a random number generator that implements [`RngCore`] from
    /// `rand` (v0.8) crate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use uuidkit::{Generator, GeneratorOptions, Version};
    ///
    /// let options = GeneratorOptions::default().with_rand08(StdRng::seed_from_u64(42));
    /// let g = Generator::new(Version::V4, options)?;
    /// println!("{}", g.new_uuid()?);
    /// # Ok::<(), uuidkit::Error>(())
    /// ```
    pub fn with_rand08<T: RngCore + Send + 'static>(self, rng: T) -> Self {
        self.with_random_source(Adapter(rng))
    }
}
