//! Raw control-plane wire prefixes and route entries.
//!
//! The control plane carries prefixes as a {family tag, address bytes, mask
//! bytes} triple. The family tag is an untrusted integer: conversion into an
//! [`IpPrefix`] dispatches on it and treats any value outside the recognized
//! set as a programming-invariant violation, distinguishable from ordinary
//! failures.

use crate::ip::{AddressFamily, IpPrefix};
use crate::{ParseError, RawObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Wire value for an IPv4 family tag.
pub const IP_ADDR_FAMILY_IPV4: i32 = 0;
/// Wire value for an IPv6 family tag.
pub const IP_ADDR_FAMILY_IPV6: i32 = 1;

/// A raw IP prefix as carried in control-plane attribute sets.
///
/// IPv4 values occupy the first 4 bytes of `addr`/`mask`; the remaining
/// bytes are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaiIpPrefix {
    /// Raw family tag; see [`IP_ADDR_FAMILY_IPV4`] and
    /// [`IP_ADDR_FAMILY_IPV6`].
    pub addr_family: i32,
    /// Network address bytes.
    pub addr: [u8; 16],
    /// Network mask bytes.
    pub mask: [u8; 16],
}

/// Counts the leading one bits of an address mask.
fn prefix_len_from_mask(mask: &[u8]) -> u8 {
    let mut len = 0u8;
    for byte in mask {
        if *byte == 0xff {
            len += 8;
        } else {
            len += byte.leading_ones() as u8;
            break;
        }
    }
    len
}

/// Expands a prefix length into mask bytes.
fn mask_from_prefix_len(prefix_len: u8, bytes: usize) -> [u8; 16] {
    let mut mask = [0u8; 16];
    let mut remaining = prefix_len as usize;
    for slot in mask.iter_mut().take(bytes) {
        if remaining >= 8 {
            *slot = 0xff;
            remaining -= 8;
        } else {
            *slot = !(0xffu8 >> remaining) & 0xff;
            break;
        }
    }
    mask
}

impl SaiIpPrefix {
    /// Builds an IPv4 wire prefix.
    pub fn v4(addr: Ipv4Addr, prefix_len: u8) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&addr.octets());
        Self {
            addr_family: IP_ADDR_FAMILY_IPV4,
            addr: bytes,
            mask: mask_from_prefix_len(prefix_len, 4),
        }
    }

    /// Builds an IPv6 wire prefix.
    pub fn v6(addr: Ipv6Addr, prefix_len: u8) -> Self {
        Self {
            addr_family: IP_ADDR_FAMILY_IPV6,
            addr: addr.octets(),
            mask: mask_from_prefix_len(prefix_len, 16),
        }
    }

    /// Returns the address family, failing on an unrecognized family tag.
    pub fn family(&self) -> Result<AddressFamily, ParseError> {
        match self.addr_family {
            IP_ADDR_FAMILY_IPV4 => Ok(AddressFamily::Ipv4),
            IP_ADDR_FAMILY_IPV6 => Ok(AddressFamily::Ipv6),
            other => Err(ParseError::UnknownAddressFamily(other)),
        }
    }

    /// Converts the wire prefix into a concrete [`IpPrefix`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownAddressFamily`] if the family tag is
    /// outside the recognized set. Callers must surface this as an invariant
    /// violation, not a normal failure.
    pub fn to_prefix(&self) -> Result<IpPrefix, ParseError> {
        let (address, prefix_len) = match self.family()? {
            AddressFamily::Ipv4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(&self.addr[..4]);
                (
                    IpAddr::V4(Ipv4Addr::from(octets)),
                    prefix_len_from_mask(&self.mask[..4]),
                )
            }
            AddressFamily::Ipv6 => (
                IpAddr::V6(Ipv6Addr::from(self.addr)),
                prefix_len_from_mask(&self.mask),
            ),
        };
        IpPrefix::new(address, prefix_len)
    }
}

impl From<&IpPrefix> for SaiIpPrefix {
    fn from(prefix: &IpPrefix) -> Self {
        match prefix.address() {
            IpAddr::V4(addr) => SaiIpPrefix::v4(*addr, prefix.prefix_len()),
            IpAddr::V6(addr) => SaiIpPrefix::v6(*addr, prefix.prefix_len()),
        }
    }
}

/// A control-plane route entry: a destination prefix scoped to a virtual
/// router.
///
/// The serialized form `<vr-oid-hex>|<destination>` is the route key handed
/// to the engine by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteEntry {
    /// Owning virtual router object id.
    pub virtual_router: RawObjectId,
    /// Destination prefix.
    pub destination: SaiIpPrefix,
}

impl RouteEntry {
    /// Creates a route entry.
    pub fn new(virtual_router: RawObjectId, destination: SaiIpPrefix) -> Self {
        Self {
            virtual_router,
            destination,
        }
    }

    /// Returns the destination address string used as the key of the
    /// destination-IP maps (address only, no prefix length).
    pub fn destination_ip(&self) -> Result<String, ParseError> {
        Ok(self.destination.to_prefix()?.address().to_string())
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.destination.to_prefix() {
            Ok(prefix) => write!(f, "0x{:x}|{}", self.virtual_router, prefix),
            Err(_) => write!(f, "0x{:x}|<family {}>", self.virtual_router, self.destination.addr_family),
        }
    }
}

impl FromStr for RouteEntry {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vr_str, dest_str) = s
            .split_once('|')
            .ok_or_else(|| ParseError::InvalidRouteEntry(s.to_string()))?;
        let raw = vr_str
            .strip_prefix("0x")
            .ok_or_else(|| ParseError::InvalidRouteEntry(s.to_string()))?;
        let virtual_router = RawObjectId::from_str_radix(raw, 16)
            .map_err(|_| ParseError::InvalidRouteEntry(s.to_string()))?;
        let destination: IpPrefix = dest_str.parse()?;
        Ok(RouteEntry::new(virtual_router, SaiIpPrefix::from(&destination)))
    }
}
