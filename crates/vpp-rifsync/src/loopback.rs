//! Loopback instance allocation and dual-stack tracking.
//!
//! Dataplane loopback constructs are numbered by small reusable instance
//! ids. The registry tracks which destination IPs ride on which loopback;
//! a single construct may serve both an IPv4 and an IPv6 destination
//! (dual-stack), so teardown must only happen when the last address family
//! using the construct goes away.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Allocator of reusable loopback instance numbers.
///
/// Released instances are reused in ascending order before the running
/// counter is advanced. A double release is unguarded, matching the
/// original contract; the free set absorbs the duplicate.
#[derive(Debug, Default)]
pub struct InstanceAllocator {
    available: BTreeSet<u32>,
    current_max: u32,
}

impl InstanceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next instance: the smallest released one if any, else
    /// the high-water mark.
    pub fn allocate(&mut self) -> u32 {
        let next = if let Some(&lowest) = self.available.iter().next() {
            self.available.remove(&lowest);
            lowest
        } else {
            let next = self.current_max;
            self.current_max += 1;
            next
        };
        debug!("Next loopback instance: {}", next);
        next
    }

    /// Marks an instance available again.
    pub fn release(&mut self, instance: u32) {
        if !self.available.insert(instance) {
            debug!("Instance {} released twice", instance);
        }
    }
}

/// Tracks live loopback constructs and their destination-IP users.
#[derive(Debug, Default)]
pub struct LoopbackRegistry {
    /// Dataplane loopback name → instance number.
    instances: HashMap<String, u32>,
    /// Destination IP → dataplane loopback name.
    ip_to_hwif: HashMap<String, String>,
    /// Destination IP → host loopback device name.
    ip_to_hostif: HashMap<String, String>,
}

impl LoopbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a created loopback construct.
    pub fn insert_instance(&mut self, hwif_name: impl Into<String>, instance: u32) {
        self.instances.insert(hwif_name.into(), instance);
    }

    /// Returns the instance number of a loopback construct.
    pub fn instance_of(&self, hwif_name: &str) -> Option<u32> {
        self.instances.get(hwif_name).copied()
    }

    /// True when the construct already exists — a second address family
    /// joining it must not create a duplicate.
    pub fn has_instance(&self, hwif_name: &str) -> bool {
        self.instances.contains_key(hwif_name)
    }

    /// Forgets a loopback construct.
    pub fn remove_instance(&mut self, hwif_name: &str) -> Option<u32> {
        self.instances.remove(hwif_name)
    }

    /// Maps a destination IP onto a loopback construct.
    pub fn map_ip(
        &mut self,
        destination_ip: impl Into<String>,
        hwif_name: impl Into<String>,
        host_ifname: impl Into<String>,
    ) {
        let destination_ip = destination_ip.into();
        self.ip_to_hwif
            .insert(destination_ip.clone(), hwif_name.into());
        self.ip_to_hostif.insert(destination_ip, host_ifname.into());
    }

    /// Returns the dataplane loopback name serving a destination IP.
    pub fn hwif_for_ip(&self, destination_ip: &str) -> Option<&str> {
        self.ip_to_hwif.get(destination_ip).map(String::as_str)
    }

    /// Returns the host loopback device serving a destination IP.
    pub fn hostif_for_ip(&self, destination_ip: &str) -> Option<&str> {
        self.ip_to_hostif.get(destination_ip).map(String::as_str)
    }

    /// Erases every destination-IP mapping that shares the exact loopback
    /// names associated with `destination_ip` — both families of a
    /// dual-stack construct at once, and nothing else.
    pub fn erase_dual_stack_entries(&mut self, destination_ip: &str) {
        let (Some(hwif_name), Some(host_ifname)) = (
            self.ip_to_hwif.get(destination_ip).cloned(),
            self.ip_to_hostif.get(destination_ip).cloned(),
        ) else {
            debug!("Entries not found for destination IP {}", destination_ip);
            return;
        };

        self.ip_to_hwif.retain(|_, name| *name != hwif_name);
        self.ip_to_hostif.retain(|_, name| *name != host_ifname);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_allocate_sequential() {
        let mut alloc = InstanceAllocator::new();
        assert_eq!(alloc.allocate(), 0);
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
    }

    #[test]
    fn test_released_instances_reused_ascending() {
        let mut alloc = InstanceAllocator::new();
        alloc.allocate();
        alloc.allocate();
        alloc.allocate();

        alloc.release(1);
        // Released id comes back before the counter advances.
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 3);
    }

    #[test]
    fn test_release_multiple_lowest_first() {
        let mut alloc = InstanceAllocator::new();
        for _ in 0..4 {
            alloc.allocate();
        }
        alloc.release(2);
        alloc.release(0);
        assert_eq!(alloc.allocate(), 0);
        assert_eq!(alloc.allocate(), 2);
        assert_eq!(alloc.allocate(), 4);
    }

    #[test]
    fn test_registry_dual_stack_sweep_spares_other_loopback() {
        let mut reg = LoopbackRegistry::new();
        reg.insert_instance("loop0", 0);
        reg.insert_instance("loop1", 1);
        reg.map_ip("10.0.0.1", "loop0", "Loopback0");
        reg.map_ip("2001:db8::1", "loop0", "Loopback0");
        reg.map_ip("10.0.0.2", "loop1", "Loopback1");

        reg.erase_dual_stack_entries("10.0.0.1");

        // Both families of loop0 are gone; loop1's user is untouched.
        assert_eq!(reg.hwif_for_ip("10.0.0.1"), None);
        assert_eq!(reg.hwif_for_ip("2001:db8::1"), None);
        assert_eq!(reg.hwif_for_ip("10.0.0.2"), Some("loop1"));
        assert_eq!(reg.hostif_for_ip("10.0.0.2"), Some("Loopback1"));
    }

    #[test]
    fn test_registry_sweep_unknown_ip_is_noop() {
        let mut reg = LoopbackRegistry::new();
        reg.map_ip("10.0.0.1", "loop0", "Loopback0");
        reg.erase_dual_stack_entries("192.0.2.1");
        assert_eq!(reg.hwif_for_ip("10.0.0.1"), Some("loop0"));
    }

    #[test]
    fn test_registry_instance_tracking() {
        let mut reg = LoopbackRegistry::new();
        reg.insert_instance("loop3", 3);
        assert!(reg.has_instance("loop3"));
        assert_eq!(reg.instance_of("loop3"), Some(3));
        assert_eq!(reg.remove_instance("loop3"), Some(3));
        assert!(!reg.has_instance("loop3"));
    }
}
