//! Reflekt Runtime - host type system for late-bound introspection
//!
//! This crate provides the runtime the reflection engine works against:
//! a registry of classes, interfaces and generic definitions, member
//! descriptors with attached custom attributes, closed-generic
//! construction, activation and late-bound invocation.
//!
//! # Example
//!
//! ```ignore
//! use reflekt_runtime::{MethodDefinition, TypeHandle, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::new();
//! let unit = registry.define_unit("app");
//! let mut greeter = registry.define_class(unit, "Greeter");
//! greeter.method(
//!     MethodDefinition::new("Greet")
//!         .returns(TypeHandle::STRING)
//!         .body(|_| Ok(Value::from("hello"))),
//! );
//! let greeter = greeter.build()?;
//! let instance = registry.create_instance(greeter, &[])?;
//! ```
//!
//! # Threading
//!
//! The registry is `Send + Sync`. Reads take a short shared lock; generic
//! construction is serialized so concurrent requests for the same closed
//! type return one handle.

#![warn(missing_docs)]

mod activation;
mod binding;
mod builder;
mod descriptor;
mod error;
mod generics;
mod handle;
mod host_type;
mod registry;
mod value;

pub use activation::MissingArguments;
pub use binding::BindingFlags;
pub use builder::{
    ConstructorDefinition, FieldDefinition, MethodDefinition, ParameterDefinition,
    PropertyDefinition, TypeBuilder,
};
pub use descriptor::{
    find_attributes, Attribute, AttributeTarget, CallFrame, ConstructorBody, ConstructorInfo, FieldInfo,
    GenericParameter, Getter, MethodBody, MethodInfo, ParameterInfo, PropertyInfo,
    TypeDescriptor, TypeKind, Visibility,
};
pub use error::{HostError, HostResult};
pub use handle::{TypeHandle, UnitHandle};
pub use host_type::HostType;
pub use registry::TypeRegistry;
pub use value::{Deferred, DeferredResult, Object, Value};
