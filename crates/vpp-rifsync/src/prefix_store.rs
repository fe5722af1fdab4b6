//! Observed-prefix state store.
//!
//! Records the addresses the engine has pushed to the dataplane so removal
//! can withdraw exactly what was added. Keys are composed from the device
//! name, the address-family tag and the serialized *requested* prefix; the
//! add and remove paths must build byte-identical keys or removal silently
//! degrades to a no-op and leaves stale dataplane state.

use std::collections::HashMap;
use tracing::{debug, info};
use vppsync_types::{AddressFamily, IpPrefix};

/// Delimiter between the interface name and the prefix in no-RIF records.
const INTF_DATA_DELIMITER: char = '@';

/// Builds the composite key for a (device, family, requested prefix) triple.
pub fn prefix_key(device: &str, family: AddressFamily, requested: &IpPrefix) -> String {
    format!("{}{}{}", device, family.tag(), requested)
}

/// Encodes a no-RIF record: resolved interface name + resolved prefix.
pub fn encode_intf_data(ifname: &str, prefix: &IpPrefix) -> String {
    format!("{}{}{}", ifname, INTF_DATA_DELIMITER, prefix)
}

/// Decodes a no-RIF record. `None` when the delimiter is missing.
pub fn decode_intf_data(data: &str) -> Option<(&str, &str)> {
    data.split_once(INTF_DATA_DELIMITER)
}

/// Map from composite prefix keys to serialized observed-prefix records.
///
/// Unbounded by design; in practice bounded by the number of addressed
/// interfaces. Absence on removal is a normal outcome (the matching add may
/// have found no assignable address).
#[derive(Debug, Default)]
pub struct PrefixStore {
    entries: HashMap<String, String>,
}

impl PrefixStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observed prefix under its composite key.
    pub fn put(&mut self, key: impl Into<String>, record: impl Into<String>) {
        let key = key.into();
        let record = record.into();
        debug!("Storing prefix record {} for key {}", record, key);
        self.entries.insert(key, record);
    }

    /// Looks up the record for a composite key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(record) => {
                info!("Found prefix record {} for key {}", record, key);
                Some(record)
            }
            None => {
                info!("No prefix record for key {}", key);
                None
            }
        }
    }

    /// Removes and returns the record for a composite key.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.entries.remove(key);
        match &removed {
            Some(record) => info!("Removed prefix record {} for key {}", record, key),
            None => debug!("No prefix record to remove for key {}", key),
        }
        removed
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
