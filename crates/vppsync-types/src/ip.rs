//! IP prefixes and address families.
//!
//! A [`IpPrefix`] here is always something concrete: either a requested
//! network (address + mask length) from the control plane, or an address
//! actually observed on a live host interface. Its `Display` form
//! (`addr/len`) is the canonical serialized prefix used in composite keys
//! and stored records, so the add and remove paths of the engine build
//! byte-identical keys.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// IP address family, with the tag used in composite prefix-store keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Returns the composite-key tag for this family.
    pub const fn tag(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "v4",
            AddressFamily::Ipv6 => "v6",
        }
    }

    /// Returns the maximum prefix length for this family.
    pub const fn max_prefix_len(&self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128,
        }
    }

    /// Returns true for [`AddressFamily::Ipv6`].
    pub const fn is_ipv6(&self) -> bool {
        matches!(self, AddressFamily::Ipv6)
    }
}

impl From<&IpAddr> for AddressFamily {
    fn from(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An IP prefix in CIDR notation (e.g. `10.0.0.1/24` or `2001:db8::1/64`).
///
/// Unlike a bare network, the address part may carry host bits: a resolved
/// prefix records the concrete address bound to an interface together with
/// its mask length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpPrefix {
    address: IpAddr,
    prefix_len: u8,
}

impl IpPrefix {
    /// Creates a new prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length exceeds the maximum for the
    /// address family (32 for IPv4, 128 for IPv6).
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self, ParseError> {
        let family = AddressFamily::from(&address);
        if prefix_len > family.max_prefix_len() {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum {} for {}",
                prefix_len,
                family.max_prefix_len(),
                family
            )));
        }
        Ok(IpPrefix {
            address,
            prefix_len,
        })
    }

    /// Returns the address part of this prefix.
    pub const fn address(&self) -> &IpAddr {
        &self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns the address family of this prefix.
    pub fn family(&self) -> AddressFamily {
        AddressFamily::from(&self.address)
    }

    /// Returns true if this is an IPv6 prefix.
    pub fn is_ipv6(&self) -> bool {
        self.family().is_ipv6()
    }

    /// Returns true if this is a host route (/32 for IPv4, /128 for IPv6).
    pub fn is_host_route(&self) -> bool {
        self.prefix_len == self.family().max_prefix_len()
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        IpPrefix::new(address, prefix_len)
    }
}
