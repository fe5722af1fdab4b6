//! Interface name translation helpers.
//!
//! The same attachment point is known by several names: the host tap device
//! (`Ethernet0`), the dataplane hardware interface (`host-Ethernet0`), VLAN
//! sub-interfaces of either (`Ethernet0.100`), and dataplane loopback
//! constructs (`loop0`) paired with host loopback devices (`Loopback0`).
//! Everything here is a pure function over those encodings.

/// Prefix of dataplane hardware-interface names for lcp tap pairs.
const HWIF_PREFIX: &str = "host-";

/// Host interface name pattern identifying a loopback device.
const HOST_LOOPBACK: &str = "Loopback";

/// Dataplane loopback construct name prefix.
const VPP_LOOPBACK_PREFIX: &str = "loop";

/// Translates a host tap device name to the dataplane hardware-interface
/// name of the same port.
pub fn tap_to_hwif_name(tap: &str) -> String {
    format!("{HWIF_PREFIX}{tap}")
}

/// Translates a dataplane hardware-interface name back to the host tap
/// device name. Returns `None` for names the dataplane did not derive from
/// a tap.
pub fn hwif_to_tap_name(hwif: &str) -> Option<&str> {
    hwif.strip_prefix(HWIF_PREFIX)
}

/// Encodes a VLAN sub-interface name (`name.vlan`). A zero VLAN id means
/// the parent interface itself.
pub fn subif_name(name: &str, vlan_id: u16) -> String {
    if vlan_id != 0 {
        format!("{name}.{vlan_id}")
    } else {
        name.to_string()
    }
}

/// Splits a possibly VLAN-encoded interface name into the parent name and
/// the VLAN id (0 when there is no sub-interface suffix or the suffix does
/// not parse).
pub fn split_subif(full_name: &str) -> (&str, u16) {
    match full_name.split_once('.') {
        Some((name, vlan)) => (name, vlan.parse().unwrap_or(0)),
        None => (full_name, 0),
    }
}

/// Returns true if the host interface name designates a loopback device.
pub fn is_host_loopback(ifname: &str) -> bool {
    ifname.contains(HOST_LOOPBACK)
}

/// Extracts the numeric instance from a host loopback device name
/// (`Loopback3` → 3).
pub fn loopback_instance_of(ifname: &str) -> Option<u32> {
    let pos = ifname.find(HOST_LOOPBACK)?;
    ifname[pos + HOST_LOOPBACK.len()..].parse().ok()
}

/// Returns the dataplane loopback construct name for an instance number.
pub fn vpp_loopback_name(instance: u32) -> String {
    format!("{VPP_LOOPBACK_PREFIX}{instance}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tap_hwif_roundtrip() {
        assert_eq!(tap_to_hwif_name("Ethernet0"), "host-Ethernet0");
        assert_eq!(hwif_to_tap_name("host-Ethernet0"), Some("Ethernet0"));
        assert_eq!(hwif_to_tap_name("loop0"), None);
    }

    #[test]
    fn test_subif_name() {
        assert_eq!(subif_name("Ethernet4", 100), "Ethernet4.100");
        assert_eq!(subif_name("Ethernet4", 0), "Ethernet4");
    }

    #[test]
    fn test_split_subif() {
        assert_eq!(split_subif("Ethernet4.100"), ("Ethernet4", 100));
        assert_eq!(split_subif("Ethernet4"), ("Ethernet4", 0));
    }

    #[test]
    fn test_subif_roundtrip() {
        let full = subif_name("host-Ethernet8", 4094);
        assert_eq!(split_subif(&full), ("host-Ethernet8", 4094));
    }

    #[test]
    fn test_host_loopback_detection() {
        assert!(is_host_loopback("Loopback0"));
        assert!(!is_host_loopback("Ethernet0"));
    }

    #[test]
    fn test_loopback_instance_of() {
        assert_eq!(loopback_instance_of("Loopback0"), Some(0));
        assert_eq!(loopback_instance_of("Loopback17"), Some(17));
        assert_eq!(loopback_instance_of("Ethernet0"), None);
        assert_eq!(loopback_instance_of("Loopback"), None);
    }

    #[test]
    fn test_vpp_loopback_name() {
        assert_eq!(vpp_loopback_name(2), "loop2");
    }
}
