//! Attribute store boundary and router-interface attribute model.
//!
//! The control plane keeps generic object attributes in a separate storage
//! layer; the engine consumes it through [`ObjectStore`]. Not-found must be
//! distinguishable from other failures — it is what decides between create
//! and update on a router-interface operation.

use thiserror::Error;
use vppsync_types::{ObjectType, RawObjectId, RouterInterfaceOid};

/// Result alias for attribute store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Attribute store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The object or attribute does not exist. A normal outcome on lookup
    /// paths, never folded into `Failure`.
    #[error("item not found")]
    NotFound,

    /// Any other storage failure.
    #[error("store failure: {0}")]
    Failure(String),
}

/// Router-interface type attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RifType {
    /// Attached to a physical port.
    Port,
    /// VLAN-tagged sub-interface of a physical port.
    SubPort,
    /// Loopback attachment.
    Loopback,
    /// VLAN router interface (not handled by this engine).
    Vlan,
    /// Bridge router interface (not handled by this engine).
    Bridge,
}

/// Attribute identifiers of a router-interface object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RifAttrId {
    Type,
    PortId,
    OuterVlanId,
    VirtualRouterId,
    Mtu,
    AdminV4State,
    AdminV6State,
}

/// A router-interface attribute with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RifAttr {
    Type(RifType),
    PortId(RawObjectId),
    OuterVlanId(u16),
    VirtualRouterId(RawObjectId),
    Mtu(u32),
    AdminV4State(bool),
    AdminV6State(bool),
}

impl RifAttr {
    /// Returns the identifier of this attribute.
    pub fn id(&self) -> RifAttrId {
        match self {
            RifAttr::Type(_) => RifAttrId::Type,
            RifAttr::PortId(_) => RifAttrId::PortId,
            RifAttr::OuterVlanId(_) => RifAttrId::OuterVlanId,
            RifAttr::VirtualRouterId(_) => RifAttrId::VirtualRouterId,
            RifAttr::Mtu(_) => RifAttrId::Mtu,
            RifAttr::AdminV4State(_) => RifAttrId::AdminV4State,
            RifAttr::AdminV6State(_) => RifAttrId::AdminV6State,
        }
    }
}

/// Finds an attribute by id in a caller-supplied attribute set.
pub fn find_attr(attrs: &[RifAttr], id: RifAttrId) -> Option<&RifAttr> {
    attrs.iter().find(|a| a.id() == id)
}

/// Typed accessors over caller-supplied attribute sets.
pub mod attr {
    use super::*;

    pub fn rif_type(attrs: &[RifAttr]) -> Option<RifType> {
        match find_attr(attrs, RifAttrId::Type) {
            Some(RifAttr::Type(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn port_id(attrs: &[RifAttr]) -> Option<RawObjectId> {
        match find_attr(attrs, RifAttrId::PortId) {
            Some(RifAttr::PortId(oid)) => Some(*oid),
            _ => None,
        }
    }

    pub fn outer_vlan_id(attrs: &[RifAttr]) -> Option<u16> {
        match find_attr(attrs, RifAttrId::OuterVlanId) {
            Some(RifAttr::OuterVlanId(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn virtual_router_id(attrs: &[RifAttr]) -> Option<RawObjectId> {
        match find_attr(attrs, RifAttrId::VirtualRouterId) {
            Some(RifAttr::VirtualRouterId(oid)) => Some(*oid),
            _ => None,
        }
    }

    pub fn mtu(attrs: &[RifAttr]) -> Option<u32> {
        match find_attr(attrs, RifAttrId::Mtu) {
            Some(RifAttr::Mtu(mtu)) => Some(*mtu),
            _ => None,
        }
    }

    pub fn admin_v4_state(attrs: &[RifAttr]) -> Option<bool> {
        match find_attr(attrs, RifAttrId::AdminV4State) {
            Some(RifAttr::AdminV4State(up)) => Some(*up),
            _ => None,
        }
    }

    pub fn admin_v6_state(attrs: &[RifAttr]) -> Option<bool> {
        match find_attr(attrs, RifAttrId::AdminV6State) {
            Some(RifAttr::AdminV6State(up)) => Some(*up),
            _ => None,
        }
    }
}

/// The attribute storage layer consumed by the engine.
pub trait ObjectStore: Send + Sync {
    /// Reads one attribute of a stored router-interface object.
    fn get_rif_attr(&self, rif: RouterInterfaceOid, id: RifAttrId) -> StoreResult<RifAttr>;

    /// Returns the object type encoded in a raw object id.
    fn object_type_query(&self, oid: RawObjectId) -> ObjectType;

    /// Records an object in the store under its serialized key.
    fn create_internal(
        &self,
        object_type: ObjectType,
        key: &str,
        attrs: &[RifAttr],
    ) -> StoreResult<()>;

    /// Removes an object from the store.
    fn remove_internal(&self, object_type: ObjectType, key: &str) -> StoreResult<()>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory [`ObjectStore`] for tests.
    #[derive(Default)]
    pub(crate) struct MockStore {
        rifs: Mutex<HashMap<RawObjectId, Vec<RifAttr>>>,
        object_types: Mutex<HashMap<RawObjectId, ObjectType>>,
        pub created: Mutex<Vec<(ObjectType, String)>>,
        pub removed: Mutex<Vec<(ObjectType, String)>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put_rif(&self, rif: RouterInterfaceOid, attrs: Vec<RifAttr>) {
            self.rifs.lock().unwrap().insert(rif.as_raw(), attrs);
        }

        pub fn set_object_type(&self, oid: RawObjectId, object_type: ObjectType) {
            self.object_types.lock().unwrap().insert(oid, object_type);
        }
    }

    impl ObjectStore for MockStore {
        fn get_rif_attr(&self, rif: RouterInterfaceOid, id: RifAttrId) -> StoreResult<RifAttr> {
            let rifs = self.rifs.lock().unwrap();
            let attrs = rifs.get(&rif.as_raw()).ok_or(StoreError::NotFound)?;
            find_attr(attrs, id).copied().ok_or(StoreError::NotFound)
        }

        fn object_type_query(&self, oid: RawObjectId) -> ObjectType {
            self.object_types
                .lock()
                .unwrap()
                .get(&oid)
                .copied()
                .unwrap_or(ObjectType::Unknown)
        }

        fn create_internal(
            &self,
            object_type: ObjectType,
            key: &str,
            _attrs: &[RifAttr],
        ) -> StoreResult<()> {
            self.created
                .lock()
                .unwrap()
                .push((object_type, key.to_string()));
            Ok(())
        }

        fn remove_internal(&self, object_type: ObjectType, key: &str) -> StoreResult<()> {
            self.removed
                .lock()
                .unwrap()
                .push((object_type, key.to_string()));
            Ok(())
        }
    }
}
