//! Generation, conversion and strict parsing of UUID versions 1 through 8
//!
//! ```rust
//! use uuidkit::{Generator, GeneratorOptions, Version};
//!
//! let g = Generator::new(Version::V7, GeneratorOptions::default())?;
//! let uuid = g.new_uuid()?;
//! println!("{}", uuid); // e.g. "018cc820-db2e-7123-8456-78a1b2c3d4e5"
//! println!("{}", uuid.urn()); // e.g. "urn:uuid:018cc820-db2e-7123-8456-78a1b2c3d4e5"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//! # Ok::<(), uuidkit::Error>(())
//! ```
//!
//! See [RFC 9562](https://www.rfc-editor.org/rfc/rfc9562.html).
//!
//! # Generators
//!
//! A [`Generator`] produces one version with one of three strategies:
//!
//! - [`TimeGenerator`] for versions 1, 6 and 7 (and 8 on request) keeps a clock state per node.
//!   Each new timestamp and counter pair is written to a [`ClockStorage`] before the UUID is
//!   handed out, so a generator restarted after the wall clock moved back carries on from the
//!   last persisted pair. Without storage the counter is seeded randomly on start.
//! - [`HashGenerator`] for versions 3 (MD5) and 5 (SHA-1), and 8 with a caller-supplied digest.
//! - [`RandomGenerator`] for versions 4 and 8.
//!
//! A [`GeneratorRegistry`] routes versions to custom factories ahead of these defaults.
//!
//! # Field and bit layout of time-based UUIDv7
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          unix_ts_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          unix_ts_ms           |  ver  |      counter_hi       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|0 0|     counter_mid       |  counter_lo   |     hash      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             hash                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 48-bit `unix_ts_ms` field is dedicated to the Unix timestamp in milliseconds.
//! - The 4-bit `ver` field is set at `0111`.
//! - The 32-bit counter is split into 12, 12 and 8 bits. It is carried over when the timestamp
//!   advances and incremented by one for each new ID generated within the same millisecond or
//!   after the clock moved back.
//! - The 2-bit `var` field is set at `10`, followed by two bits that are always clear.
//!   [`Uuid::decode`] recognizes the counter by those bits.
//! - The remaining 40 `hash` bits are taken from a BLAKE3 digest of the timestamp, counter and
//!   node.
//!
//! # Other features
//!
//! Parsing accepts the 32-digit, hyphenated, braced and URN forms, in either case, and rejects
//! UUIDs other than nil and max whose variant is not the RFC one:
//!
//! ```rust
//! use uuidkit::{Uuid, Version};
//!
//! let uuid: Uuid = "{20616934-4BA2-11E7-8000-010203040506}".parse()?;
//! assert_eq!(uuid.version(), Some(Version::V1));
//! assert_eq!(uuid.convert(Version::V6)?.to_string(), "1e74ba22-0616-6934-8000-010203040506");
//! # Ok::<(), uuidkit::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod clock;
mod convert;
mod decode;
mod error;
pub mod generator;
mod id;
mod layout;
mod leap;
mod node;
mod parse;
mod storage;
mod ticks;
mod version;

pub use clock::ClockState;
pub use decode::Decoded;
pub use error::{Error, Method, StorageOperation};
#[doc(inline)]
pub use generator::{
    DefaultRandSource, Generator, GeneratorFactory, GeneratorOptions, GeneratorRegistry,
    HashFactory, HashGenerator, RandSource, RandomGenerator, StdSystemTime, TimeGenerator,
    TimeSource,
};
pub use id::{Uuid, Variant};
pub use leap::{FixedLeapSeconds, LeapSecondCalculator, NoLeapSeconds};
pub use node::{
    resolve_node, HardwareInterface, InterfaceSource, Node, NodeParseError, SystemInterfaces,
};
pub use parse::{ParseError, ParseProblem};
pub use storage::{
    ClockRecord, ClockStorage, FileClockStorage, StorageError, UnavailableClockStorage,
};
pub use ticks::{from_gregorian_ticks, from_unix_millis, to_gregorian_ticks, to_unix_millis};
pub use version::Version;
