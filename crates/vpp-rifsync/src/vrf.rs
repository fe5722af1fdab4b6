//! VRF lifecycle management.
//!
//! Maps control-plane virtual-router objects to dataplane VRF tables. One
//! descriptor exists per distinct virtual-router object; numeric VRF id 0 is
//! the default table and is referenced but never created or destroyed.

use std::collections::HashMap;
use tracing::{error, info, warn};
use vppsync_common::SyncResult;
use vppsync_types::{AddressFamily, VirtualRouterOid};

use crate::dataplane::{Dataplane, ECMP_FLOW_HASH};

/// Descriptor of a managed dataplane VRF table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpVrf {
    /// Owning virtual-router object.
    pub oid: VirtualRouterOid,
    /// Numeric dataplane VRF table id; 0 is the default table.
    pub vrf_id: u32,
    /// Dataplane table name (`vrf_<id>`).
    pub name: String,
    /// Address family the table was created for.
    pub is_ipv6: bool,
}

/// Virtual-router object → VRF descriptor table.
#[derive(Debug, Default)]
pub struct VrfTable {
    vrfs: HashMap<VirtualRouterOid, IpVrf>,
}

impl VrfTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the VRF descriptor for a virtual-router object, creating the
    /// dataplane table on first reference.
    ///
    /// Idempotent: an existing descriptor is returned unchanged without a
    /// second dataplane create. When `vrf_id` is non-zero the dataplane
    /// table `vrf_<id>` is created first; if that fails, nothing is
    /// registered and the id stays unmanaged. After registration the fixed
    /// ECMP flow hash is programmed for the table (failure logged only).
    pub async fn acquire(
        &mut self,
        dp: &dyn Dataplane,
        oid: VirtualRouterOid,
        vrf_id: u32,
    ) -> SyncResult<Option<&IpVrf>> {
        if self.vrfs.contains_key(&oid) {
            let existing = &self.vrfs[&oid];
            if existing.name.is_empty() {
                warn!("VRF({}) descriptor with empty table name", oid);
            }
            info!("VRF({}) with id {} already exists", oid, existing.vrf_id);
            return Ok(Some(&self.vrfs[&oid]));
        }

        let name = format!("vrf_{vrf_id}");

        if vrf_id != 0 {
            if let Err(e) = dp.ip_vrf_add(vrf_id, &name, false).await {
                error!("Failed to create VRF table {} in dataplane: {}", name, e);
                return Ok(None);
            }
        }
        info!("VRF({}) with id {} created in dataplane", oid, vrf_id);

        self.vrfs.insert(
            oid,
            IpVrf {
                oid,
                vrf_id,
                name,
                is_ipv6: false,
            },
        );

        match dp
            .ip_flow_hash_set(vrf_id, ECMP_FLOW_HASH, AddressFamily::Ipv4)
            .await
        {
            Ok(()) => info!("Flow hash set for VRF {} with vrf_id {}", oid, vrf_id),
            Err(e) => error!("Flow hash set failed for VRF {}: {}", oid, e),
        }

        Ok(Some(&self.vrfs[&oid]))
    }

    /// Releases a VRF descriptor, destroying the dataplane table. Silent
    /// no-op when the object is not managed.
    pub async fn release(&mut self, dp: &dyn Dataplane, oid: VirtualRouterOid) -> SyncResult<()> {
        let Some(vrf) = self.vrfs.get(&oid) else {
            return Ok(());
        };

        info!("Deleting VRF({}) with id {}", oid, vrf.vrf_id);
        dp.ip_vrf_del(vrf.vrf_id, &vrf.name, vrf.is_ipv6).await?;
        self.vrfs.remove(&oid);

        Ok(())
    }

    /// Looks up the descriptor of a virtual-router object.
    pub fn lookup(&self, oid: VirtualRouterOid) -> Option<&IpVrf> {
        self.vrfs.get(&oid)
    }

    /// Number of managed descriptors.
    pub fn len(&self) -> usize {
        self.vrfs.len()
    }

    /// True when no VRFs are managed.
    pub fn is_empty(&self) -> bool {
        self.vrfs.is_empty()
    }
}
