//! Reflekt - runtime introspection and late-bound dispatch
//!
//! [`ReflectionService`] answers questions about registered types and calls
//! their members when the exact signature is only known at runtime:
//!
//! - property discovery, including interface-hierarchy flattening
//! - discovery of types deriving from a base type within a code unit
//! - custom attribute lookup on types, members and parameters
//! - generic type and interface resolution across an inheritance chain
//! - method selection and invocation by name and argument shape
//! - classification of deferred (`Task`) results
//!
//! The host type system lives in [`reflekt_runtime`], re-exported here as
//! [`runtime`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reflekt::{ReflectionService, runtime::{TypeHandle, TypeRegistry}};
//!
//! let registry = Arc::new(TypeRegistry::new());
//! // ... declare types ...
//! let service = ReflectionService::new(registry);
//! let result = service.invoke_generic_method(
//!     Some(repository),
//!     Some(&instance),
//!     Some("Find"),
//!     Some(&[TypeHandle::STRING]),
//!     &[key],
//! )?;
//! ```

#![warn(missing_docs)]

mod attributes;
mod config;
mod deferred;
mod dispatch;
mod error;
mod hierarchy;
mod service;

pub use config::{ConfigError, ReflectionOptions};
pub use deferred::DeferredResultShape;
pub use dispatch::MethodCandidate;
pub use error::{ReflectError, Result};
pub use service::ReflectionService;

pub use reflekt_runtime as runtime;
