//! Value types for the VPP dataplane synchronization engine.
//!
//! - [`ip`]: IP prefixes as observed on live interfaces, address families
//!   with their composite-key tags
//! - [`sai`]: raw control-plane wire prefixes and route entries, with
//!   fallible conversion into resolved prefixes
//! - [`oid`]: type-safe object IDs preventing accidental mixing of
//!   control-plane object kinds

pub mod ip;
pub mod oid;
pub mod sai;

pub use ip::{AddressFamily, IpPrefix};
pub use oid::{ObjectType, PortOid, RawObjectId, RouterInterfaceOid, VirtualRouterOid};
pub use sai::{RouteEntry, SaiIpPrefix};

use thiserror::Error;

/// Errors from parsing or converting wire-level values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The string is not a valid IP address.
    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// The string is not a valid IP prefix.
    #[error("invalid IP prefix: {0}")]
    InvalidIpPrefix(String),

    /// The string is not a valid route entry.
    #[error("invalid route entry: {0}")]
    InvalidRouteEntry(String),

    /// The wire family tag is outside the recognized set. This is a
    /// programming-invariant violation, not a normal failure.
    #[error("unknown address family value {0}")]
    UnknownAddressFamily(i32),
}
