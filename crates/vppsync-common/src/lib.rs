//! Common infrastructure for the VPP dataplane synchronization crates.
//!
//! This crate provides the pieces shared by the router-interface/VRF/address
//! synchronization engine:
//!
//! - [`shell`]: safe shell command execution with proper quoting, used for
//!   all host OS address and VRF-table discovery
//! - [`error`]: the failure taxonomy of synchronization operations
//!
//! The host `ip` command is the only source of truth for the addresses
//! actually assigned to interfaces, so every discovery path funnels through
//! [`shell::exec`]. An empty stdout on a zero exit is a valid "nothing found"
//! result, never an error.

pub mod error;
pub mod shell;

pub use error::{SyncError, SyncResult};
