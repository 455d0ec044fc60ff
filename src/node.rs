//! Node identifiers for time-based UUIDs and their selection.

use std::{fmt, io, str};

use crate::generator::RandSource;

/// A 6-byte node identifier, semantically an EUI-48.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Node([u8; 6]);

/// Error parsing a node identifier that is not six colon-separated hex octets.
#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("invalid node identifier {input:?}; expected six colon-separated hex octets")]
pub struct NodeParseError {
    /// The rejected input.
    pub input: String,
}

impl Node {
    /// The all-zero node.
    pub const NIL: Self = Self([0; 6]);

    /// Creates an object from a byte array.
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if all six bytes are zero.
    pub const fn is_zero(&self) -> bool {
        matches!(self.0, [0, 0, 0, 0, 0, 0])
    }

    /// Returns true if this is a non-nil, universally administered address.
    pub const fn is_global(&self) -> bool {
        !self.is_zero() && self.0[0] & 0x02 == 0
    }

    /// Returns true if the locally-administered bit is set.
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Returns true if the multicast bit is clear.
    pub const fn is_unicast(&self) -> bool {
        self.0[0] & 0x01 == 0
    }

    /// Returns true if the multicast bit is set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Derives a node from a hardware address.
    ///
    /// EUI-48 addresses are used as is. EUI-64 addresses built from an EUI-48 (`ff:fe` in the
    /// middle) are reduced back by dropping those bytes and flipping the universal/local bit.
    /// Anything else yields `None`.
    pub fn from_hardware_addr(addr: &[u8]) -> Option<Self> {
        match *addr {
            [a, b, c, d, e, f] => Some(Self([a, b, c, d, e, f])),
            [a, b, c, 0xff, 0xfe, d, e, f] => Some(Self([a ^ 0x02, b, c, d, e, f])),
            _ => None,
        }
    }

    /// Synthesizes a random node with the local and multicast bits set, so that it can never be
    /// mistaken for a hardware address.
    pub fn random(rng: &mut dyn RandSource) -> Self {
        let mut bytes = [0u8; 6];
        rng.fill_bytes(&mut bytes);
        bytes[0] |= 0x03;
        Self(bytes)
    }
}

impl fmt::Display for Node {
    /// Writes the lowercase colon-hex form, e.g. `aa:bb:cc:dd:ee:ff`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl str::FromStr for Node {
    type Err = NodeParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let err = || NodeParseError {
            input: src.to_owned(),
        };
        let octets = parse_octets(src).ok_or_else(err)?;
        <[u8; 6]>::try_from(octets.as_slice())
            .map(Self)
            .map_err(|_| err())
    }
}

/// Parses colon-separated two-digit hex octets of any count.
fn parse_octets(src: &str) -> Option<Vec<u8>> {
    src.trim()
        .split(':')
        .map(|e| match e.len() {
            2 => u8::from_str_radix(e, 16).ok(),
            _ => None,
        })
        .collect()
}

impl From<[u8; 6]> for Node {
    fn from(src: [u8; 6]) -> Self {
        Self(src)
    }
}

impl From<Node> for [u8; 6] {
    fn from(src: Node) -> Self {
        src.0
    }
}

mod serde_support {
    use super::{fmt, Node};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Node {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.collect_str(self)
            } else {
                serializer.serialize_bytes(&self.0)
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Node {
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
        type Value = Node;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a colon-hex node identifier")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            <[u8; 6]>::try_from(value)
                .map(Self::Value::from)
                .map_err(de::Error::custom)
        }
    }
}

/// A network interface as reported by the host.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct HardwareInterface {
    /// The interface name, e.g. `eth0`.
    pub name: String,

    /// True for loopback interfaces.
    pub loopback: bool,

    /// The raw hardware address, which may be empty or longer than six bytes.
    pub hardware_addr: Vec<u8>,
}

/// Lists the host's network interfaces in enumeration order.
pub trait InterfaceSource {
    /// Returns the interfaces, or the I/O error that prevented listing them.
    fn interfaces(&self) -> io::Result<Vec<HardwareInterface>>;
}

/// Lists the host's interfaces through the `mac_address` crate.
///
/// Interfaces without a hardware address, loopback among them, are reported with an all-zero
/// address and never selected.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<HardwareInterface>> {
        let addrs = mac_address::MacAddressIterator::new()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        addrs
            .map(|addr| {
                let name = mac_address::name_by_mac_address(&addr)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
                    .unwrap_or_default();
                let hardware_addr = addr.bytes().to_vec();
                Ok(HardwareInterface {
                    name,
                    loopback: hardware_addr.iter().all(|&b| b == 0),
                    hardware_addr,
                })
            })
            .collect()
    }
}

/// Selects the node for a time-based generator.
///
/// Unless `force_random` is set, non-loopback interfaces with a usable hardware address are
/// ranked globally administered first, then unicast first, then in enumeration order, and the
/// best one wins. With no candidate, or when forced, a [random](Node::random) node is returned.
pub fn resolve_node(
    force_random: bool,
    interfaces: &dyn InterfaceSource,
    rng: &mut dyn RandSource,
) -> io::Result<Node> {
    if !force_random {
        let mut candidates = interfaces
            .interfaces()?
            .into_iter()
            .filter(|e| !e.loopback)
            .filter_map(|e| Node::from_hardware_addr(&e.hardware_addr).map(|n| (n, e.name)))
            .filter(|(n, _)| !n.is_zero())
            .collect::<Vec<_>>();
        candidates.sort_by_key(|(n, _)| (!n.is_global(), n.is_multicast()));
        if let Some((node, name)) = candidates.into_iter().next() {
            tracing::debug!(%node, interface = %name, "using hardware node");
            return Ok(node);
        }
    }

    let node = Node::random(rng);
    tracing::debug!(%node, force_random, "using random node");
    Ok(node)
}
