//! Router-interface / VRF / address synchronization for a VPP dataplane.
//!
//! This crate keeps the dataplane's notion of router interfaces, VRF tables,
//! loopback devices and interface addressing consistent with the
//! control-plane object model and with the live host OS interface state.
//! Control-plane operations arrive keyed by attribute sets; the concrete
//! address strings exist only on the host, so the engine reconciles three
//! state sources through composite lookup keys.
//!
//! The entry point is [`rif::RifSync`]. Collaborators are consumed through
//! trait seams: [`dataplane::Dataplane`] for the packet-processing engine,
//! [`host::HostNetwork`] for live OS queries, [`store::ObjectStore`] for the
//! attribute layer and [`events::PortStatusNotifier`] for link-state
//! notifications.

pub mod dataplane;
pub mod events;
pub mod host;
pub mod loopback;
pub mod naming;
pub mod prefix_store;
pub mod rif;
pub mod store;
pub mod vrf;

pub use dataplane::{Dataplane, VppEvent, VppIpPrefix};
pub use events::{EventBridge, PortOperStatus, PortStatusNotifier, PortsIndex};
pub use host::{HostNetwork, ShellHostNetwork};
pub use rif::RifSync;
pub use store::{ObjectStore, RifAttr, RifAttrId, RifType, StoreError, StoreResult};
pub use vrf::{IpVrf, VrfTable};
