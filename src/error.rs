use std::{fmt, io};

use crate::version::VersionList;
use crate::{ParseError, StorageError, Uuid, Version};

/// Errors returned by conversion, generator construction and generation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Input text or bytes could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The input is neither a sentinel nor a UUID with the `10` variant.
    #[error("{input} is not a valid UUID")]
    InputNotValid { input: Uuid },

    /// The requested version cannot be produced from the current one, or by this generator.
    #[error(
        "{requested} UUIDs are not supported here; only {} UUIDs are supported",
        VersionList(.expected)
    )]
    VersionMismatch {
        requested: Version,
        expected: Vec<Version>,
    },

    /// No generator is known for the version.
    #[error("{version} UUIDs are not supported")]
    UnsupportedVersion { version: Version },

    /// Clock storage failed on load or store.
    #[error("failed to {operation} clock state")]
    Storage {
        operation: StorageOperation,
        #[source]
        source: StorageError,
    },

    /// A hash-based generator was given a namespace that fails the variant test.
    #[error("the generator for {version} UUIDs requires a valid namespace UUID, got {namespace}")]
    InvalidNamespace { version: Version, namespace: Uuid },

    /// A V8 hash-based generator was constructed without a hash factory.
    #[error("the generator for {version} UUIDs requires a hash factory")]
    MissingHashFactory { version: Version },

    /// The generator does not implement the method called.
    #[error("the generator for {version} UUIDs does not support {method}")]
    UnsupportedMethod { version: Version, method: Method },

    /// Host network interfaces could not be listed.
    #[error("failed to list network interfaces for a node identifier")]
    NodeLookup {
        #[source]
        source: io::Error,
    },

    /// The default random source could not be seeded.
    #[error("failed to seed the random source")]
    Random {
        #[source]
        source: rand::Error,
    },
}

/// The clock storage call that failed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StorageOperation {
    Load,
    Store,
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Store => "store",
        })
    }
}

/// The two generation methods of [`Generator`](crate::Generator).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Method {
    /// [`Generator::new_uuid`](crate::Generator::new_uuid)
    NewUuid,
    /// [`Generator::new_hash_uuid`](crate::Generator::new_hash_uuid)
    NewHashUuid,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NewUuid => "new_uuid",
            Self::NewHashUuid => "new_hash_uuid",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Formats messages with versions in prose
    #[test]
    fn formats_messages_with_versions_in_prose() {
        let err = Error::VersionMismatch {
            requested: Version::V4,
            expected: vec![Version::V1, Version::V6, Version::V7, Version::V8],
        };
        assert_eq!(
            err.to_string(),
            "Version 4 UUIDs are not supported here; only Version 1, Version 6, Version 7, \
             and Version 8 UUIDs are supported"
        );

        let err = Error::UnsupportedMethod {
            version: Version::V5,
            method: Method::NewUuid,
        };
        assert_eq!(
            err.to_string(),
            "the generator for Version 5 UUIDs does not support new_uuid"
        );
    }

    /// Chains storage causes
    #[test]
    fn chains_storage_causes() {
        use std::error::Error as _;

        let err = Error::Storage {
            operation: StorageOperation::Store,
            source: StorageError::Closed,
        };
        assert_eq!(err.to_string(), "failed to store clock state");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("clock storage is closed".to_owned())
        );
    }
}
