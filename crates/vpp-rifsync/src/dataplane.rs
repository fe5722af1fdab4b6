//! Dataplane control API boundary.
//!
//! The packet-processing engine is configured through a narrow command
//! surface; everything the synchronization engine needs from it is collected
//! in the [`Dataplane`] trait. Every call maps to one dataplane RPC whose
//! integer status has already been folded into a `Result` — non-zero status
//! becomes [`SyncError::DataplaneCall`].

use async_trait::async_trait;
use std::net::IpAddr;
use vppsync_common::SyncResult;
use vppsync_types::{AddressFamily, IpPrefix};

/// Flow-hash field: source address.
pub const FLOW_HASH_SRC_IP: u32 = 1 << 0;
/// Flow-hash field: destination address.
pub const FLOW_HASH_DST_IP: u32 = 1 << 1;
/// Flow-hash field: source port.
pub const FLOW_HASH_SRC_PORT: u32 = 1 << 2;
/// Flow-hash field: destination port.
pub const FLOW_HASH_DST_PORT: u32 = 1 << 3;
/// Flow-hash field: IP protocol.
pub const FLOW_HASH_PROTO: u32 = 1 << 4;

/// The fixed ECMP load-balancing hash programmed on every managed VRF.
pub const ECMP_FLOW_HASH: u32 =
    FLOW_HASH_SRC_IP | FLOW_HASH_DST_IP | FLOW_HASH_SRC_PORT | FLOW_HASH_DST_PORT | FLOW_HASH_PROTO;

/// A resolved prefix in the dataplane's wire shape: family tag, 4 or 16
/// address bytes, prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VppIpPrefix {
    /// Address family.
    pub family: AddressFamily,
    /// Address bytes; the first 4 are significant for IPv4.
    pub addr: [u8; 16],
    /// Prefix length in bits.
    pub prefix_len: u8,
}

impl From<&IpPrefix> for VppIpPrefix {
    fn from(prefix: &IpPrefix) -> Self {
        let mut addr = [0u8; 16];
        let family = match prefix.address() {
            IpAddr::V4(v4) => {
                addr[..4].copy_from_slice(&v4.octets());
                AddressFamily::Ipv4
            }
            IpAddr::V6(v6) => {
                addr.copy_from_slice(&v6.octets());
                AddressFamily::Ipv6
            }
        };
        Self {
            family,
            addr,
            prefix_len: prefix.prefix_len(),
        }
    }
}

/// Asynchronous events surfaced by the dataplane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VppEvent {
    /// A hardware interface changed link state.
    LinkStatus {
        /// Dataplane hardware-interface name.
        hwif_name: String,
        /// True when the link came up.
        link_up: bool,
    },
}

/// Narrow interface over the dataplane command library.
#[async_trait]
pub trait Dataplane: Send + Sync {
    /// Creates a VLAN sub-interface pair (dataplane and host side).
    async fn create_sub_interface(&self, hwif: &str, sub_id: u16, vlan_id: u16) -> SyncResult<()>;

    /// Deletes a dataplane VLAN sub-interface.
    async fn delete_sub_interface(&self, hwif: &str, vlan_id: u16) -> SyncResult<()>;

    /// Creates a VRF table.
    async fn ip_vrf_add(&self, vrf_id: u32, name: &str, is_ipv6: bool) -> SyncResult<()>;

    /// Deletes a VRF table.
    async fn ip_vrf_del(&self, vrf_id: u32, name: &str, is_ipv6: bool) -> SyncResult<()>;

    /// Binds an interface (or its VLAN sub-interface) to a VRF table.
    /// Table 0 resets the binding to the default table.
    async fn set_interface_vrf(
        &self,
        hwif: &str,
        vlan_id: u16,
        vrf_id: u32,
        is_ipv6: bool,
    ) -> SyncResult<()>;

    /// Adds or withdraws an address on an interface.
    async fn interface_ip_address_add_del(
        &self,
        hwif: &str,
        prefix: &VppIpPrefix,
        is_add: bool,
    ) -> SyncResult<()>;

    /// Sets interface admin state.
    async fn interface_set_state(&self, hwif: &str, is_up: bool) -> SyncResult<()>;

    /// Sets the hardware (port-level) MTU.
    async fn hw_interface_set_mtu(&self, hwif: &str, mtu: u32) -> SyncResult<()>;

    /// Sets the per-family link MTU.
    async fn sw_interface_set_mtu(
        &self,
        hwif: &str,
        mtu: u32,
        family: AddressFamily,
    ) -> SyncResult<()>;

    /// Programs the load-balancing flow hash of a VRF table.
    async fn ip_flow_hash_set(
        &self,
        vrf_id: u32,
        hash_mask: u32,
        family: AddressFamily,
    ) -> SyncResult<()>;

    /// Creates a loopback construct with a fixed instance number.
    async fn create_loopback_instance(&self, hwif: &str, instance: u32) -> SyncResult<()>;

    /// Deletes a loopback construct.
    async fn delete_loopback(&self, hwif: &str, instance: u32) -> SyncResult<()>;

    /// Creates or deletes the lcp tap pairing between a dataplane interface
    /// and a host device.
    async fn configure_lcp_pair(
        &self,
        vpp_name: &str,
        host_name: &str,
        is_add: bool,
    ) -> SyncResult<()>;

    /// Re-reads the dataplane interface inventory. Required after creating
    /// or deleting interfaces so later calls resolve the new names.
    async fn refresh_interfaces_list(&self) -> SyncResult<()>;

    /// Synchronizes with the dataplane event channel.
    async fn sync_for_events(&self) -> SyncResult<()>;

    /// Dequeues one pending event, if any.
    async fn dequeue_event(&self) -> Option<VppEvent>;
}
