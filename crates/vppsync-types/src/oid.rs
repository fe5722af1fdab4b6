//! Type-safe control-plane object IDs.
//!
//! Strongly-typed wrappers over raw 64-bit object IDs, preventing a port OID
//! from being passed where a virtual-router OID is expected. The marker
//! pattern keeps the wrappers zero-cost.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Raw object ID type as carried on the control-plane wire.
pub type RawObjectId = u64;

/// Object types the engine distinguishes when resolving a router
/// interface's bound port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Port,
    Vlan,
    VirtualRouter,
    RouterInterface,
    /// Any other object type; always an unexpected binding.
    Unknown,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Port => "PORT",
            ObjectType::Vlan => "VLAN",
            ObjectType::VirtualRouter => "VIRTUAL_ROUTER",
            ObjectType::RouterInterface => "ROUTER_INTERFACE",
            ObjectType::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Marker trait for object kinds.
pub trait ObjectKind: Send + Sync + 'static {
    /// Returns the object type name for debugging.
    fn type_name() -> &'static str;
}

/// A type-safe object ID.
///
/// The phantom type parameter `T` records what kind of control-plane object
/// this ID refers to; IDs of different kinds cannot be mixed.
#[derive(Clone, Copy)]
pub struct ObjectId<T: ObjectKind> {
    raw: RawObjectId,
    _marker: PhantomData<T>,
}

impl<T: ObjectKind> ObjectId<T> {
    /// The null object ID.
    pub const NULL: Self = Self {
        raw: 0,
        _marker: PhantomData,
    };

    /// Creates an object ID from a raw value, including null.
    pub const fn from_raw(raw: RawObjectId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the raw object ID value.
    pub const fn as_raw(&self) -> RawObjectId {
        self.raw
    }

    /// Returns true if this is a null object ID.
    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }
}

impl<T: ObjectKind> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:x})", T::type_name(), self.raw)
    }
}

impl<T: ObjectKind> fmt::Display for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.raw)
    }
}

impl<T: ObjectKind> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: ObjectKind> Eq for ObjectId<T> {}

impl<T: ObjectKind> Hash for ObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: ObjectKind> Default for ObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $oid_alias:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        pub type $oid_alias = ObjectId<$name>;
    };
}

define_object_kind!(PortKind, "Port", PortOid);
define_object_kind!(VirtualRouterKind, "VirtualRouter", VirtualRouterOid);
define_object_kind!(RouterInterfaceKind, "RouterInterface", RouterInterfaceOid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_raw_roundtrip() {
        let port = PortOid::from_raw(0x1000000000001);
        assert_eq!(port.as_raw(), 0x1000000000001);
        assert!(!port.is_null());
    }

    #[test]
    fn test_null_oid() {
        assert!(PortOid::NULL.is_null());
        assert!(VirtualRouterOid::from_raw(0).is_null());
    }

    #[test]
    fn test_oid_debug_names_kind() {
        let vr = VirtualRouterOid::from_raw(0x2a);
        assert_eq!(format!("{:?}", vr), "VirtualRouter(0x2a)");
        assert_eq!(vr.to_string(), "0x2a");
    }

    #[test]
    fn test_oid_equality() {
        assert_eq!(PortOid::from_raw(1), PortOid::from_raw(1));
        assert_ne!(PortOid::from_raw(1), PortOid::from_raw(2));
    }
}
