//! Router-interface state machine.
//!
//! [`RifSync`] orchestrates create/update/remove of router interfaces across
//! host tap devices, dataplane VLAN sub-interfaces, VRF binding, MTU and
//! admin-state propagation, and interface addressing. Operations arrive
//! keyed by attribute sets; the concrete address strings only exist in the
//! live host state, so the add/remove address paths resolve them on the fly
//! and record what was pushed for symmetric withdrawal.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use vppsync_common::{SyncError, SyncResult};
use vppsync_types::{
    AddressFamily, IpPrefix, ObjectType, PortOid, RouteEntry, RouterInterfaceOid, SaiIpPrefix,
    VirtualRouterOid,
};

use crate::dataplane::{Dataplane, VppIpPrefix};
use crate::events::{EventBridge, PortStatusNotifier, PortsIndex};
use crate::host::HostNetwork;
use crate::loopback::{InstanceAllocator, LoopbackRegistry};
use crate::naming;
use crate::prefix_store::{self, PrefixStore};
use crate::store::{attr, ObjectStore, RifAttr, RifAttrId, RifType, StoreError};
use crate::vrf::VrfTable;

/// Resolved binding of a router interface: its type, owning port and
/// optional outer VLAN tag.
struct RifBinding {
    rif_type: RifType,
    port: PortOid,
    vlan_id: u16,
}

/// Maps a wire-family conversion failure to the fatal invariant error.
fn invariant_err(e: impl std::fmt::Display) -> SyncError {
    SyncError::invariant(e.to_string())
}

fn store_err(e: StoreError) -> SyncError {
    SyncError::internal(e.to_string())
}

/// The router-interface / VRF / address synchronization engine.
///
/// All mutable maps are owned by the engine and touched only from the
/// synchronous call path; the event bridge reads the shared port index
/// only. One engine instance exists per dataplane switch.
pub struct RifSync {
    store: Arc<dyn ObjectStore>,
    dp: Arc<dyn Dataplane>,
    host: Arc<dyn HostNetwork>,
    ports: Arc<PortsIndex>,
    vrfs: VrfTable,
    allocator: InstanceAllocator,
    loopbacks: LoopbackRegistry,
    prefix_store: PrefixStore,
    ip_nbr_active: bool,
    use_tap_device: bool,
    bridge: Option<(CancellationToken, JoinHandle<()>)>,
}

impl RifSync {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        dp: Arc<dyn Dataplane>,
        host: Arc<dyn HostNetwork>,
        use_tap_device: bool,
    ) -> Self {
        Self {
            store,
            dp,
            host,
            ports: Arc::new(PortsIndex::new()),
            vrfs: VrfTable::new(),
            allocator: InstanceAllocator::new(),
            loopbacks: LoopbackRegistry::new(),
            prefix_store: PrefixStore::new(),
            ip_nbr_active: false,
            use_tap_device,
            bridge: None,
        }
    }

    /// Marks the IP neighbor/route subsystem active or inactive. MTU and
    /// admin-state propagation are no-ops while inactive.
    pub fn set_ip_nbr_active(&mut self, active: bool) {
        self.ip_nbr_active = active;
    }

    pub fn is_ip_nbr_active(&self) -> bool {
        self.ip_nbr_active
    }

    /// The tap↔port index shared with the event bridge.
    pub fn ports(&self) -> Arc<PortsIndex> {
        Arc::clone(&self.ports)
    }

    /// Registers a port and its host tap device name.
    pub fn register_port(&self, port: PortOid, tap_name: &str) {
        self.ports.insert(port, tap_name);
    }

    /// Forgets a port registration.
    pub fn unregister_port(&self, port: PortOid) {
        self.ports.remove(port);
    }

    /// Starts the event bridge. Idempotent per engine; call once at
    /// dataplane-initialization time.
    pub fn dp_initialize(&mut self, notifier: Arc<dyn PortStatusNotifier>) -> SyncResult<()> {
        if self.bridge.is_some() {
            warn!("Event bridge already running");
            return Ok(());
        }
        let token = CancellationToken::new();
        let handle = EventBridge::spawn(
            Arc::clone(&self.dp),
            Arc::clone(&self.ports),
            notifier,
            token.clone(),
        );
        self.bridge = Some((token, handle));
        Ok(())
    }

    /// Stops and joins the event bridge.
    pub async fn shutdown(&mut self) {
        if let Some((token, handle)) = self.bridge.take() {
            token.cancel();
            if let Err(e) = handle.await {
                error!("Event bridge task join failed: {}", e);
            }
        }
    }

    fn tap_name_of(&self, port: PortOid) -> SyncResult<String> {
        self.ports.tap_for_port(port).ok_or_else(|| {
            error!("Host interface for port {} not found", port);
            SyncError::internal(format!("host interface for port {port} not found"))
        })
    }

    /// The dataplane hardware-interface name of a port, or of its VLAN
    /// sub-interface when `vlan_id` is non-zero. `None` when the port has
    /// no registered tap device.
    fn hwif_name(&self, port: PortOid, vlan_id: u16) -> Option<String> {
        let tap = self.ports.tap_for_port(port)?;
        Some(naming::subif_name(&naming::tap_to_hwif_name(&tap), vlan_id))
    }

    /// Reads the type/port binding of a stored router interface.
    ///
    /// `Ok(None)` is the VLAN skip: the bound object is a VLAN and the
    /// engine has no work to do. A binding to anything else but a physical
    /// port is a hard failure.
    fn rif_binding(&self, rif: RouterInterfaceOid) -> SyncResult<Option<RifBinding>> {
        let rif_type = match self.store.get_rif_attr(rif, RifAttrId::Type) {
            Ok(RifAttr::Type(t)) => t,
            _ => return Err(SyncError::missing_attribute("ROUTER_INTERFACE_ATTR_TYPE")),
        };
        let port_raw = match self.store.get_rif_attr(rif, RifAttrId::PortId) {
            Ok(RifAttr::PortId(oid)) => oid,
            _ => return Err(SyncError::missing_attribute("ROUTER_INTERFACE_ATTR_PORT_ID")),
        };

        let ot = self.store.object_type_query(port_raw);
        if ot == ObjectType::Vlan {
            debug!("Skipping object type VLAN");
            return Ok(None);
        }
        if ot != ObjectType::Port {
            return Err(SyncError::unexpected_binding(
                format!("0x{port_raw:x}"),
                "PORT",
                ot.to_string(),
            ));
        }

        let vlan_id = match self.store.get_rif_attr(rif, RifAttrId::OuterVlanId) {
            Ok(RifAttr::OuterVlanId(v)) => v,
            _ => 0,
        };

        Ok(Some(RifBinding {
            rif_type,
            port: PortOid::from_raw(port_raw),
            vlan_id,
        }))
    }

    /// Sets interface admin state; intentional no-op while the IP
    /// neighbor/route subsystem is inactive.
    pub async fn set_interface_state(
        &self,
        port: PortOid,
        vlan_id: u16,
        is_up: bool,
    ) -> SyncResult<()> {
        if !self.ip_nbr_active {
            return Ok(());
        }
        if let Some(hwif) = self.hwif_name(port, vlan_id) {
            if let Err(e) = self.dp.interface_set_state(&hwif, is_up).await {
                error!("Failed to set admin state on {}: {}", hwif, e);
            }
            info!(
                "Updating router interface admin state {} {}",
                hwif,
                if is_up { "UP" } else { "DOWN" }
            );
        }
        Ok(())
    }

    /// Sets the hardware (port-level) MTU; no-op while inactive.
    pub async fn set_port_mtu(&self, port: PortOid, vlan_id: u16, mtu: u32) -> SyncResult<()> {
        if !self.ip_nbr_active {
            return Ok(());
        }
        if let Some(hwif) = self.hwif_name(port, vlan_id) {
            if let Err(e) = self.dp.hw_interface_set_mtu(&hwif, mtu).await {
                error!("Failed to set port mtu on {}: {}", hwif, e);
            }
            info!("Updating router interface mtu {} to {}", hwif, mtu);
        }
        Ok(())
    }

    /// Sets the per-family link MTU; no-op while inactive.
    pub async fn set_interface_mtu(
        &self,
        port: PortOid,
        vlan_id: u16,
        mtu: u32,
        family: AddressFamily,
    ) -> SyncResult<()> {
        if !self.ip_nbr_active {
            return Ok(());
        }
        if let Some(hwif) = self.hwif_name(port, vlan_id) {
            if let Err(e) = self.dp.sw_interface_set_mtu(&hwif, mtu, family).await {
                error!("Failed to set {} mtu on {}: {}", family, hwif, e);
            }
            info!("Updating router interface mtu {} to {}", hwif, mtu);
        }
        Ok(())
    }

    /// Propagates port attribute updates (admin state, MTU) to the
    /// dataplane. No-op while the IP neighbor/route subsystem is inactive.
    #[instrument(skip(self))]
    pub async fn update_port(&self, port: PortOid, attrs: &[RifAttr]) -> SyncResult<()> {
        if !self.ip_nbr_active {
            return Ok(());
        }
        if let Some(is_up) = attr::admin_v4_state(attrs) {
            self.set_interface_state(port, 0, is_up).await?;
        }
        if let Some(mtu) = attr::mtu(attrs) {
            self.set_port_mtu(port, 0, mtu).await?;
        }
        Ok(())
    }

    /// Adds or withdraws an interface address for a router interface.
    ///
    /// The requested prefix names a network, not a concrete address; the
    /// actual address is resolved from the live host state on add and read
    /// back from the prefix store on remove. A resolution miss on add and a
    /// missing record on remove are both success-with-no-op.
    #[instrument(skip(self))]
    pub async fn add_del_intf_ip_addr(
        &mut self,
        sai_prefix: &SaiIpPrefix,
        rif: RouterInterfaceOid,
        is_add: bool,
    ) -> SyncResult<()> {
        let Some(binding) = self.rif_binding(rif)? else {
            return Ok(());
        };
        if !matches!(
            binding.rif_type,
            RifType::Port | RifType::SubPort | RifType::Loopback
        ) {
            return Ok(());
        }

        let tap = self.tap_name_of(binding.port)?;
        let linux_ifname = naming::subif_name(&tap, binding.vlan_id);

        let family = sai_prefix.family().map_err(invariant_err)?;
        let requested = sai_prefix.to_prefix().map_err(invariant_err)?;
        let key = prefix_store::prefix_key(&linux_ifname, family, &requested);

        let resolved: IpPrefix = if is_add {
            let Some(resolved) = self
                .host
                .intf_ip_address(&linux_ifname, &requested, family)
                .await?
            else {
                debug!("No ip address to add on router interface {}", linux_ifname);
                return Ok(());
            };
            info!("Adding ip address on router interface {}", linux_ifname);
            self.prefix_store.put(key, resolved.to_string());
            resolved
        } else {
            let Some(record) = self.prefix_store.get(&key).map(str::to_string) else {
                debug!(
                    "No ip address to remove on router interface {}",
                    linux_ifname
                );
                return Ok(());
            };
            info!("Removing ip address on router interface {}", linux_ifname);
            let resolved = record
                .parse::<IpPrefix>()
                .map_err(|e| SyncError::internal(format!("corrupt prefix record '{record}': {e}")))?;
            self.prefix_store.remove(&key);
            resolved
        };

        let hw_ifname = naming::subif_name(&naming::tap_to_hwif_name(&tap), binding.vlan_id);
        self.dp
            .interface_ip_address_add_del(&hw_ifname, &VppIpPrefix::from(&resolved), is_add)
            .await
    }

    /// Adds or withdraws an address for a route destination that has no
    /// router-interface object: the owning device is discovered by reverse
    /// lookup on add and recorded alongside the resolved prefix for remove.
    #[instrument(skip(self))]
    pub async fn add_del_intf_ip_addr_norif(
        &mut self,
        key: &str,
        route_entry: &RouteEntry,
        is_add: bool,
    ) -> SyncResult<()> {
        let family = route_entry.destination.family().map_err(invariant_err)?;
        let requested = route_entry.destination.to_prefix().map_err(invariant_err)?;

        let (full_if_name, stored_prefix) = if is_add {
            let Some(name) = self.host.intf_name_for_prefix(&requested, family).await? else {
                error!("Host interface for prefix {} not found", requested);
                return Err(SyncError::internal(format!(
                    "host interface for prefix {requested} not found"
                )));
            };
            (name, None)
        } else {
            let Some(record) = self.prefix_store.get(key).map(str::to_string) else {
                debug!("No interface ip address found for {}", key);
                return Ok(());
            };
            let Some((ifname, prefix_str)) = prefix_store::decode_intf_data(&record) else {
                warn!("Record '{}' does not contain delimiter @", record);
                return Err(SyncError::internal(format!(
                    "corrupt interface record '{record}'"
                )));
            };
            (ifname.to_string(), Some(prefix_str.to_string()))
        };

        let (if_name, vlan_id) = naming::split_subif(&full_if_name);
        let if_name = if_name.to_string();

        let resolved: IpPrefix = if is_add {
            let Some(resolved) = self
                .host
                .intf_ip_address(&full_if_name, &requested, family)
                .await?
            else {
                debug!("No ip address to add on router interface {}", full_if_name);
                return Ok(());
            };
            info!("Adding ip address on router interface {}", full_if_name);
            self.prefix_store
                .put(key, prefix_store::encode_intf_data(&full_if_name, &resolved));
            resolved
        } else {
            info!("Removing ip address on router interface {}", full_if_name);
            let prefix_str = stored_prefix.unwrap_or_default();
            let resolved = prefix_str.parse::<IpPrefix>().map_err(|e| {
                SyncError::internal(format!("corrupt prefix record '{prefix_str}': {e}"))
            })?;
            self.prefix_store.remove(key);
            resolved
        };

        let hw_ifname = naming::subif_name(&naming::tap_to_hwif_name(&if_name), vlan_id);
        self.dp
            .interface_ip_address_add_del(&hw_ifname, &VppIpPrefix::from(&resolved), is_add)
            .await
    }

    /// Classifies a route destination as loopback-backed and, when it is,
    /// drives loopback addressing. Returns whether the destination was
    /// handled as a loopback.
    ///
    /// A second address family joining an already-instantiated loopback
    /// only records its mappings; no second dataplane construct is created.
    #[instrument(skip(self))]
    pub async fn process_interface_loopback(
        &mut self,
        route_entry: &RouteEntry,
        is_add: bool,
    ) -> SyncResult<bool> {
        let destination_ip = route_entry.destination_ip().map_err(invariant_err)?;

        let interface_name = if is_add {
            let family = route_entry.destination.family().map_err(invariant_err)?;
            let requested = route_entry.destination.to_prefix().map_err(invariant_err)?;
            self.host
                .intf_name_for_prefix(&requested, family)
                .await?
                .unwrap_or_default()
        } else {
            self.loopbacks
                .hostif_for_ip(&destination_ip)
                .unwrap_or_default()
                .to_string()
        };

        let is_loopback = naming::is_host_loopback(&interface_name);
        info!(
            "interfaceName:{} isLoopback:{}",
            interface_name, is_loopback
        );

        if !is_loopback {
            return Ok(false);
        }

        let instance = naming::loopback_instance_of(&interface_name).ok_or_else(|| {
            SyncError::internal(format!(
                "loopback device '{interface_name}' has no instance suffix"
            ))
        })?;
        let vpp_if_name = naming::vpp_loopback_name(instance);

        if is_add && self.loopbacks.has_instance(&vpp_if_name) {
            // Dual stack: second family joins the existing construct.
            self.loopbacks
                .map_ip(destination_ip.clone(), vpp_if_name, interface_name.clone());
            debug!(
                "interfaceName:{} exists new-ip:{}",
                interface_name, destination_ip
            );
        } else {
            self.add_del_loopback_ip(route_entry, is_add).await?;
        }

        Ok(true)
    }

    /// Full loopback creation/teardown for a route destination.
    ///
    /// Creation is best-effort: intermediate dataplane failures are logged
    /// and the sequence continues, since partial rollback is not part of the
    /// contract. The host loopback address is removed before lcp tap
    /// creation and re-added afterwards; tap creation disturbs existing
    /// host addressing.
    #[instrument(skip(self))]
    pub async fn add_del_loopback_ip(
        &mut self,
        route_entry: &RouteEntry,
        is_add: bool,
    ) -> SyncResult<()> {
        let destination_ip = route_entry.destination_ip().map_err(invariant_err)?;

        if is_add {
            let instance = self.allocator.allocate();
            let vpp_if_name = naming::vpp_loopback_name(instance);
            self.loopbacks.insert_instance(&vpp_if_name, instance);

            info!(
                "create_loopback_instance interfaceName:{} instance:{}",
                vpp_if_name, instance
            );
            if let Err(e) = self.dp.create_loopback_instance(&vpp_if_name, instance).await {
                error!("create_loopback_instance returned error: {}", e);
            }
            // New interface; the dataplane inventory must be re-read.
            if let Err(e) = self.dp.refresh_interfaces_list().await {
                error!("refresh_interfaces_list returned error: {}", e);
            }

            let family = route_entry.destination.family().map_err(invariant_err)?;
            let prefix = route_entry.destination.to_prefix().map_err(invariant_err)?;

            if let Err(e) = self
                .dp
                .interface_ip_address_add_del(&vpp_if_name, &VppIpPrefix::from(&prefix), true)
                .await
            {
                error!("interface_ip_address_add_del returned error: {}", e);
            }
            if let Err(e) = self.dp.interface_set_state(&vpp_if_name, true).await {
                error!("interface_set_state returned error: {}", e);
            }

            let host_ifname = self
                .host
                .intf_name_for_prefix(&prefix, family)
                .await?
                .unwrap_or_default();
            info!("host interface for prefix: {}", host_ifname);
            self.loopbacks
                .map_ip(destination_ip.clone(), vpp_if_name.clone(), host_ifname.clone());

            // Remove the host loopback address before creating the lcp tap.
            if let Err(e) = self
                .host
                .configure_loopback(false, &host_ifname, &destination_ip, prefix.prefix_len())
                .await
            {
                error!("Failed to configure loopback interface remove: {}", e);
            }

            debug!(
                "configure_lcp_pair vpp_name:{} host_name:{}",
                vpp_if_name, host_ifname
            );
            if let Err(e) = self
                .dp
                .configure_lcp_pair(&vpp_if_name, &host_ifname, true)
                .await
            {
                error!("configure_lcp_pair returned error: {}", e);
            }

            // Re-add the host loopback address after tap creation.
            if let Err(e) = self
                .host
                .configure_loopback(true, &host_ifname, &destination_ip, prefix.prefix_len())
                .await
            {
                error!("Failed to configure loopback interface add: {}", e);
            }

            Ok(())
        } else {
            let Some(vpp_if_name) = self.loopbacks.hwif_for_ip(&destination_ip).map(str::to_string)
            else {
                debug!("No loopback interface for destination {}", destination_ip);
                return Ok(());
            };
            let instance = self.loopbacks.instance_of(&vpp_if_name).unwrap_or(0);

            if let Err(e) = self.dp.delete_loopback(&vpp_if_name, instance).await {
                error!("delete_loopback returned error: {}", e);
            }
            if let Err(e) = self.dp.refresh_interfaces_list().await {
                error!("refresh_interfaces_list returned error: {}", e);
            }

            self.loopbacks.remove_instance(&vpp_if_name);
            self.loopbacks.erase_dual_stack_entries(&destination_ip);
            self.allocator.release(instance);

            Ok(())
        }
    }

    /// Resolves the dataplane next-hop interface name for a route through a
    /// router interface. `None` when the interface is VLAN-bound or of a
    /// type this engine does not manage.
    pub async fn router_intf_name(
        &self,
        _sai_prefix: &SaiIpPrefix,
        rif: RouterInterfaceOid,
    ) -> SyncResult<Option<String>> {
        let Some(binding) = self.rif_binding(rif)? else {
            return Ok(None);
        };
        if !matches!(
            binding.rif_type,
            RifType::Port | RifType::SubPort | RifType::Loopback
        ) {
            return Ok(None);
        }

        let tap = self.tap_name_of(binding.port)?;
        let hw_ifname = naming::subif_name(&naming::tap_to_hwif_name(&tap), binding.vlan_id);
        info!("Configuring ip address on router interface {}", hw_ifname);
        Ok(Some(hw_ifname))
    }

    /// Creates the dataplane side of a router interface from a caller
    /// attribute set: VLAN sub-interface, VRF acquisition and binding, MTU
    /// and admin state.
    #[instrument(skip(self))]
    pub async fn create_router_interface(&mut self, attrs: &[RifAttr]) -> SyncResult<()> {
        let Some(rif_type) = attr::rif_type(attrs) else {
            return Err(SyncError::missing_attribute("ROUTER_INTERFACE_ATTR_TYPE"));
        };

        if !matches!(rif_type, RifType::Port | RifType::SubPort) {
            info!(
                "Skipping router interface create for attr type {:?}",
                rif_type
            );
            return Ok(());
        }

        let Some(port_raw) = attr::port_id(attrs) else {
            return Err(SyncError::missing_attribute("ROUTER_INTERFACE_ATTR_PORT_ID"));
        };

        let ot = self.store.object_type_query(port_raw);
        if ot == ObjectType::Vlan {
            debug!("Skipping tap creation for hostif with object type VLAN");
            return Ok(());
        }
        if ot != ObjectType::Port {
            return Err(SyncError::unexpected_binding(
                format!("0x{port_raw:x}"),
                "PORT",
                ot.to_string(),
            ));
        }

        let vlan_id = match attr::outer_vlan_id(attrs) {
            Some(v) => v,
            None if rif_type == RifType::SubPort => {
                return Err(SyncError::missing_attribute(
                    "ROUTER_INTERFACE_ATTR_OUTER_VLAN_ID",
                ));
            }
            None => 0,
        };

        let port = PortOid::from_raw(port_raw);
        let tap = self.tap_name_of(port)?;
        let hwif = naming::tap_to_hwif_name(&tap);

        let linux_ifname = if rif_type == RifType::SubPort {
            // The host tap sub-interface is created alongside the dataplane
            // sub-interface.
            if let Err(e) = self.dp.create_sub_interface(&hwif, vlan_id, vlan_id).await {
                error!("create_sub_interface returned error: {}", e);
            }
            if let Err(e) = self.dp.refresh_interfaces_list().await {
                error!("refresh_interfaces_list returned error: {}", e);
            }
            naming::subif_name(&tap, vlan_id)
        } else {
            tap.clone()
        };

        let vrf_oid = match attr::virtual_router_id(attrs) {
            Some(oid) => {
                info!("Virtual router 0x{:x} passed for {}", oid, linux_ifname);
                VirtualRouterOid::from_raw(oid)
            }
            None => {
                info!("No virtual router passed for {}", linux_ifname);
                VirtualRouterOid::NULL
            }
        };

        match self.host.vrf_table_id(&linux_ifname).await {
            Ok(vrf_id) => {
                self.vrfs.acquire(self.dp.as_ref(), vrf_oid, vrf_id).await?;
                if vrf_id != 0 {
                    if let Err(e) = self.dp.set_interface_vrf(&hwif, vlan_id, vrf_id, false).await
                    {
                        error!("set_interface_vrf returned error: {}", e);
                    }
                }
            }
            Err(e) => {
                error!("VRF table lookup failed for {}: {}", linux_ifname, e);
            }
        }

        if let Some(mtu) = attr::mtu(attrs) {
            self.set_interface_mtu(port, vlan_id, mtu, AddressFamily::Ipv4)
                .await?;
            self.set_interface_mtu(port, vlan_id, mtu, AddressFamily::Ipv6)
                .await?;
        }

        let v4_state = attr::admin_v4_state(attrs);
        let v6_state = attr::admin_v6_state(attrs);
        if v4_state.is_some() || v6_state.is_some() {
            let is_up = v4_state.unwrap_or(false) || v6_state.unwrap_or(false);
            self.set_interface_state(port, vlan_id, is_up).await?;
        }

        Ok(())
    }

    /// Updates an existing router interface. Non-sub-port interfaces only
    /// support VRF unbinding; sub-ports repeat the MTU/admin propagation.
    #[instrument(skip(self))]
    pub async fn update_router_interface(
        &mut self,
        rif: RouterInterfaceOid,
        attrs: &[RifAttr],
    ) -> SyncResult<()> {
        let Some(binding) = self.rif_binding(rif)? else {
            return Ok(());
        };

        if binding.rif_type != RifType::SubPort {
            return self.router_interface_remove_vrf(binding.port).await;
        }

        let vlan_id = match self.store.get_rif_attr(rif, RifAttrId::OuterVlanId) {
            Ok(RifAttr::OuterVlanId(v)) => v,
            _ => {
                return Err(SyncError::missing_attribute(
                    "ROUTER_INTERFACE_ATTR_OUTER_VLAN_ID",
                ));
            }
        };

        if let Some(mtu) = attr::mtu(attrs) {
            self.set_interface_mtu(binding.port, vlan_id, mtu, AddressFamily::Ipv4)
                .await?;
            self.set_interface_mtu(binding.port, vlan_id, mtu, AddressFamily::Ipv6)
                .await?;
        }

        let v4_state = attr::admin_v4_state(attrs);
        let v6_state = attr::admin_v6_state(attrs);
        if v4_state.is_some() || v6_state.is_some() {
            let is_up = v4_state.unwrap_or(false) || v6_state.unwrap_or(false);
            self.set_interface_state(binding.port, vlan_id, is_up).await?;
        }

        Ok(())
    }

    /// Tears down the dataplane side of a router interface: VRF unbind for
    /// plain ports, sub-interface deletion for sub-ports.
    #[instrument(skip(self))]
    pub async fn remove_router_interface(&mut self, rif: RouterInterfaceOid) -> SyncResult<()> {
        let Some(binding) = self.rif_binding(rif)? else {
            return Ok(());
        };

        if binding.rif_type != RifType::SubPort {
            return self.router_interface_remove_vrf(binding.port).await;
        }

        let vlan_id = match self.store.get_rif_attr(rif, RifAttrId::OuterVlanId) {
            Ok(RifAttr::OuterVlanId(v)) => v,
            _ => {
                return Err(SyncError::missing_attribute(
                    "ROUTER_INTERFACE_ATTR_OUTER_VLAN_ID",
                ));
            }
        };

        let tap = self.tap_name_of(binding.port)?;
        if let Err(e) = self
            .dp
            .delete_sub_interface(&naming::tap_to_hwif_name(&tap), vlan_id)
            .await
        {
            error!("delete_sub_interface returned error: {}", e);
        }
        if let Err(e) = self.dp.refresh_interfaces_list().await {
            error!("refresh_interfaces_list returned error: {}", e);
        }

        Ok(())
    }

    /// Resets an interface's VRF binding to the default table. IPv4 tables
    /// only for now.
    pub async fn router_interface_remove_vrf(&self, port: PortOid) -> SyncResult<()> {
        let tap = self.tap_name_of(port)?;
        let hwif = naming::tap_to_hwif_name(&tap);

        info!("Resetting to default vrf for interface {}", tap);
        if let Err(e) = self.dp.set_interface_vrf(&hwif, 0, 0, false).await {
            error!("set_interface_vrf returned error: {}", e);
        }
        Ok(())
    }

    /// Top-level router-interface create: decides create vs update by the
    /// stored Type attribute, drives the dataplane when tap devices are in
    /// use, then records the object in the store.
    #[instrument(skip(self))]
    pub async fn create_router_if(
        &mut self,
        rif: RouterInterfaceOid,
        attrs: &[RifAttr],
    ) -> SyncResult<()> {
        if self.use_tap_device {
            let result = match self.store.get_rif_attr(rif, RifAttrId::Type) {
                Err(StoreError::NotFound) => self.create_router_interface(attrs).await,
                _ => self.update_router_interface(rif, attrs).await,
            };
            // Best effort: the store record is written regardless.
            if let Err(e) = result {
                error!("Router interface {} dataplane sync failed: {}", rif, e);
            }
        }

        self.store
            .create_internal(ObjectType::RouterInterface, &rif.to_string(), attrs)
            .map_err(store_err)
    }

    /// Top-level router-interface remove.
    #[instrument(skip(self))]
    pub async fn remove_router_if(&mut self, rif: RouterInterfaceOid) -> SyncResult<()> {
        if self.use_tap_device {
            if let Err(e) = self.remove_router_interface(rif).await {
                error!("Router interface {} dataplane teardown failed: {}", rif, e);
            }
        }

        self.store
            .remove_internal(ObjectType::RouterInterface, &rif.to_string())
            .map_err(store_err)
    }

    /// Top-level virtual-router remove: destroys the dataplane VRF table
    /// and removes the store record.
    #[instrument(skip(self))]
    pub async fn remove_vrf(&mut self, vrf: VirtualRouterOid) -> SyncResult<()> {
        if self.use_tap_device {
            if let Err(e) = self.vrfs.release(self.dp.as_ref(), vrf).await {
                error!("VRF {} dataplane teardown failed: {}", vrf, e);
            }
        }

        self.store
            .remove_internal(ObjectType::VirtualRouter, &vrf.to_string())
            .map_err(store_err)
    }

    #[cfg(test)]
    pub(crate) fn prefix_store(&self) -> &PrefixStore {
        &self.prefix_store
    }

    #[cfg(test)]
    pub(crate) fn vrfs(&self) -> &VrfTable {
        &self.vrfs
    }

    #[cfg(test)]
    pub(crate) fn loopbacks(&self) -> &LoopbackRegistry {
        &self.loopbacks
    }
}
