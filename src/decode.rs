use chrono::{DateTime, Utc};

use crate::layout::{
    get_clock14, get_clock32, get_uint48, get_v1_ticks, get_v6_ticks, sign_extend_millis,
    unstamp,
};
use crate::ticks::{from_gregorian_ticks, from_unix_millis};
use crate::{LeapSecondCalculator, NoLeapSeconds, Node, Uuid, Version};

/// The fields of a valid UUID, broken down by version.
///
/// | Version | `ticks` / `time` | `counter` | `node` | `dce`  | `data`                 |
/// | ------- | ---------------- | --------- | ------ | ------ | ---------------------- |
/// | 1, 6    | 100 ns ticks     | 14 bits   | yes    |        |                        |
/// | 2       |                  |           |        | yes    | remaining 11 bytes     |
/// | 7       | milliseconds     | 32 bits*  |        |        | bytes after the fields |
/// | 3, 4, 5, 8 |               |           |        |        | all 16 bytes           |
///
/// \* only when the counter sub-format is detected; otherwise `data` holds bytes 6-15.
///
/// `data` always has the version and variant bits cleared.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Decoded {
    /// The version field.
    pub version: Version,

    /// Raw tick count: 100 ns units since 1582-10-15 (probably including leap seconds) for V1
    /// and V6, or milliseconds since 1970-01-01 for V7.
    pub ticks: Option<i64>,

    /// The tick count as an instant.
    pub time: Option<DateTime<Utc>>,

    /// The counter or clock sequence.
    pub counter: Option<u32>,

    /// The node identifier.
    pub node: Option<Node>,

    /// The DCE domain and local identifier of a V2 UUID.
    pub dce: Option<(u8, u32)>,

    /// Remaining random or opaque bytes.
    pub data: Option<Vec<u8>>,
}

impl Uuid {
    /// Breaks a valid UUID down into its fields, assuming no leap seconds.
    ///
    /// Returns `None` for invalid UUIDs, including the nil and max UUIDs.
    pub fn decode(&self) -> Option<Decoded> {
        self.decode_with(&NoLeapSeconds)
    }

    /// Breaks a valid UUID down into its fields, using `lsc` to interpret V1 and V6 ticks.
    pub fn decode_with(&self, lsc: &dyn LeapSecondCalculator) -> Option<Decoded> {
        let version = self.version()?;
        let mut bytes = *self.as_bytes();
        let mut result = Decoded {
            version,
            ticks: None,
            time: None,
            counter: None,
            node: None,
            dce: None,
            data: None,
        };

        match version {
            Version::V1 | Version::V6 => {
                let ticks = if version == Version::V1 {
                    get_v1_ticks(&bytes)
                } else {
                    get_v6_ticks(&bytes)
                };
                let mut node = [0u8; 6];
                node.copy_from_slice(&bytes[10..16]);
                result.ticks = Some(ticks as i64);
                result.time = Some(from_gregorian_ticks(lsc, ticks));
                result.counter = Some(get_clock14(&bytes));
                result.node = Some(Node::from_bytes(node));
            }
            Version::V2 => {
                let id = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                unstamp(&mut bytes);
                result.dce = Some((bytes[9], id));
                result.data = Some([&bytes[4..9], &bytes[10..16]].concat());
            }
            Version::V7 => {
                let millis = sign_extend_millis(get_uint48(&bytes));
                result.ticks = Some(millis);
                result.time = Some(from_unix_millis(millis as u64));
                let counter = get_clock32(&bytes, version);
                unstamp(&mut bytes);
                result.data = Some(match counter {
                    Some(_) => bytes[11..16].to_vec(),
                    None => bytes[6..16].to_vec(),
                });
                result.counter = counter;
            }
            Version::V3 | Version::V4 | Version::V5 | Version::V8 => {
                unstamp(&mut bytes);
                result.data = Some(bytes.to_vec());
            }
        }
        Some(result)
    }
}
