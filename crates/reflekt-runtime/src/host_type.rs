//! Mapping between Rust types and host types
//!
//! Lets typed helpers such as constant enumeration and deferred-result
//! checks name a host type with a Rust type parameter.

use crate::handle::TypeHandle;
use crate::registry::TypeRegistry;
use crate::value::Value;

/// A Rust type with a host-type counterpart
pub trait HostType: Sized {
    /// Host type this Rust type stands for, if registered
    fn host_type(registry: &TypeRegistry) -> Option<TypeHandle>;

    /// Extract a value of this type; `None` when the value has another type
    fn from_value(value: Value) -> Option<Self>;
}

impl HostType for bool {
    fn host_type(_: &TypeRegistry) -> Option<TypeHandle> {
        Some(TypeHandle::BOOL)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl HostType for i64 {
    fn host_type(_: &TypeRegistry) -> Option<TypeHandle> {
        Some(TypeHandle::INT)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_int()
    }
}

impl HostType for f64 {
    fn host_type(_: &TypeRegistry) -> Option<TypeHandle> {
        Some(TypeHandle::FLOAT)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

impl HostType for String {
    fn host_type(_: &TypeRegistry) -> Option<TypeHandle> {
        Some(TypeHandle::STRING)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// `Value` stands for the universal root type and accepts anything
impl HostType for Value {
    fn host_type(_: &TypeRegistry) -> Option<TypeHandle> {
        Some(TypeHandle::OBJECT)
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}
