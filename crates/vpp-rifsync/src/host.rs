//! Live host OS network state queries.
//!
//! The control-plane model carries requested networks without concrete
//! addresses; the host OS is the only place the assigned address strings
//! exist. [`HostNetwork`] is the capability seam for discovering them. The
//! shell implementation reproduces the `ip addr show … scope global`
//! pipelines of the platform: global-scope filter, first match wins, empty
//! output is a normal "nothing found" outcome.

use async_trait::async_trait;
use tracing::{debug, error, info};
use vppsync_common::shell::{self, shellquote, IP_CMD};
use vppsync_common::SyncResult;
use vppsync_types::{AddressFamily, IpPrefix};

/// Capability interface over live host interface state.
#[async_trait]
pub trait HostNetwork: Send + Sync {
    /// Discovers the actual global-scope address assigned to `device` within
    /// the requested network. `None` when the interface has no matching
    /// address (yet); not an error.
    async fn intf_ip_address(
        &self,
        device: &str,
        requested: &IpPrefix,
        family: AddressFamily,
    ) -> SyncResult<Option<IpPrefix>>;

    /// Reverse lookup: finds the host interface currently owning an address
    /// in the requested network. When several interfaces match, the first
    /// one reported by the host wins; no tie-break order is defined.
    async fn intf_name_for_prefix(
        &self,
        requested: &IpPrefix,
        family: AddressFamily,
    ) -> SyncResult<Option<String>>;

    /// Returns the VRF table id `device` is enslaved to, or 0 for the
    /// default table.
    async fn vrf_table_id(&self, device: &str) -> SyncResult<u32>;

    /// Adds the destination address to, or deletes, a host loopback device.
    /// Used to re-apply host addressing around lcp tap creation.
    async fn configure_loopback(
        &self,
        add: bool,
        host_ifname: &str,
        destination_ip: &str,
        prefix_len: u8,
    ) -> SyncResult<()>;
}

/// [`HostNetwork`] implementation shelling out to `/sbin/ip`.
#[derive(Debug, Default)]
pub struct ShellHostNetwork;

impl ShellHostNetwork {
    pub fn new() -> Self {
        Self
    }

    fn family_flag(family: AddressFamily) -> &'static str {
        match family {
            AddressFamily::Ipv4 => "",
            AddressFamily::Ipv6 => " -6",
        }
    }
}

#[async_trait]
impl HostNetwork for ShellHostNetwork {
    async fn intf_ip_address(
        &self,
        device: &str,
        requested: &IpPrefix,
        family: AddressFamily,
    ) -> SyncResult<Option<IpPrefix>> {
        let pattern = match family {
            AddressFamily::Ipv4 => "/inet /",
            AddressFamily::Ipv6 => "/inet6 /",
        };
        let cmd = format!(
            "{ip}{flag} addr show dev {dev} to {net} scope global | awk '{pat} {{print $2}}'",
            ip = IP_CMD,
            flag = Self::family_flag(family),
            dev = shellquote(device),
            net = requested,
            pat = pattern,
        );
        let out = shell::exec_or_throw(&cmd).await?;

        let Some(first) = out.lines().next().filter(|l| !l.is_empty()) else {
            return Ok(None);
        };
        match first.parse::<IpPrefix>() {
            Ok(prefix) => {
                info!("{} address of {} is {}", family, device, prefix);
                Ok(Some(prefix))
            }
            Err(e) => {
                error!("Unparseable address '{}' on {}: {}", first, device, e);
                Ok(None)
            }
        }
    }

    async fn intf_name_for_prefix(
        &self,
        requested: &IpPrefix,
        family: AddressFamily,
    ) -> SyncResult<Option<String>> {
        let cmd = format!(
            "{ip}{flag} addr show to {net} scope global \
             | awk -F':' '/[0-9]+: [a-zA-Z]+/ {{ printf \"%s\", $2 }}' \
             | cut -d' ' -f2 -z | sed 's/@[a-zA-Z].*//g'",
            ip = IP_CMD,
            flag = Self::family_flag(family),
            net = requested,
        );
        let out = shell::exec_or_throw(&cmd).await?;

        let name = out.trim_matches('\0').trim();
        if name.is_empty() {
            Ok(None)
        } else {
            info!("{} interface with prefix {} is {}", family, requested, name);
            Ok(Some(name.to_string()))
        }
    }

    async fn vrf_table_id(&self, device: &str) -> SyncResult<u32> {
        // The device must exist; a missing device is a real failure.
        let cmd = format!("{} link show dev {}", IP_CMD, shellquote(device));
        shell::exec_or_throw(&cmd).await?;

        let table_cmd = format!(
            "{} -d link show dev {} | grep -o 'vrf_slave table [0-9]\\+' | cut -d' ' -f3",
            IP_CMD,
            shellquote(device)
        );
        let out = shell::exec_or_throw(&table_cmd).await?;

        if out.is_empty() {
            return Ok(0);
        }
        match out.parse::<u32>() {
            Ok(id) => Ok(id),
            Err(_) => {
                error!("Unparseable VRF table id '{}' for {}", out, device);
                Ok(0)
            }
        }
    }

    async fn configure_loopback(
        &self,
        add: bool,
        host_ifname: &str,
        destination_ip: &str,
        prefix_len: u8,
    ) -> SyncResult<()> {
        let cmd = if add {
            format!(
                "{} address add {}/{} dev {}",
                IP_CMD,
                destination_ip,
                prefix_len,
                shellquote(host_ifname)
            )
        } else {
            format!("{} link delete dev {}", IP_CMD, shellquote(host_ifname))
        };
        shell::exec_or_throw(&cmd).await?;
        debug!(
            "{} host loopback {} for {}",
            if add { "Configured" } else { "Removed" },
            host_ifname,
            destination_ip
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Recording mock of live host state for tests.
    #[derive(Default)]
    pub(crate) struct MockHostNetwork {
        /// (device, requested network) -> assigned address.
        pub addresses: Mutex<HashMap<(String, String), IpPrefix>>,
        /// requested network -> owning device.
        pub prefix_owners: Mutex<HashMap<String, String>>,
        /// device -> VRF table id.
        pub vrf_tables: Mutex<HashMap<String, u32>>,
        /// Recorded configure_loopback invocations (add, ifname, ip, len).
        pub loopback_calls: Mutex<Vec<(bool, String, String, u8)>>,
    }

    impl MockHostNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn assign_address(&self, device: &str, requested: &str, actual: &str) {
            self.addresses.lock().unwrap().insert(
                (device.to_string(), requested.to_string()),
                actual.parse().unwrap(),
            );
        }

        pub fn own_prefix(&self, requested: &str, device: &str) {
            self.prefix_owners
                .lock()
                .unwrap()
                .insert(requested.to_string(), device.to_string());
        }

        pub fn set_vrf_table(&self, device: &str, table: u32) {
            self.vrf_tables
                .lock()
                .unwrap()
                .insert(device.to_string(), table);
        }
    }

    #[async_trait]
    impl HostNetwork for MockHostNetwork {
        async fn intf_ip_address(
            &self,
            device: &str,
            requested: &IpPrefix,
            _family: AddressFamily,
        ) -> SyncResult<Option<IpPrefix>> {
            Ok(self
                .addresses
                .lock()
                .unwrap()
                .get(&(device.to_string(), requested.to_string()))
                .copied())
        }

        async fn intf_name_for_prefix(
            &self,
            requested: &IpPrefix,
            _family: AddressFamily,
        ) -> SyncResult<Option<String>> {
            Ok(self
                .prefix_owners
                .lock()
                .unwrap()
                .get(&requested.to_string())
                .cloned())
        }

        async fn vrf_table_id(&self, device: &str) -> SyncResult<u32> {
            Ok(self
                .vrf_tables
                .lock()
                .unwrap()
                .get(device)
                .copied()
                .unwrap_or(0))
        }

        async fn configure_loopback(
            &self,
            add: bool,
            host_ifname: &str,
            destination_ip: &str,
            prefix_len: u8,
        ) -> SyncResult<()> {
            self.loopback_calls.lock().unwrap().push((
                add,
                host_ifname.to_string(),
                destination_ip.to_string(),
                prefix_len,
            ));
            Ok(())
        }
    }
}
