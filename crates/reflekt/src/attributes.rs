//! Custom attribute lookup
//!
//! Attributes are plain Rust values attached at declaration time and
//! looked up by their Rust type. Only a target's own attributes are
//! searched; base types and overridden members are not consulted.

use std::any::Any;
use std::sync::Arc;

use reflekt_runtime::{find_attributes, AttributeTarget, TypeHandle};

use crate::service::ReflectionService;

impl ReflectionService {
    /// First attribute of type `A` on a member or parameter
    pub fn custom_attribute<A: Any + Send + Sync>(
        &self,
        target: Option<&dyn AttributeTarget>,
    ) -> Option<Arc<A>> {
        find_attributes::<A>(target?.attributes()).next()
    }

    /// First attribute of type `A` on a type
    pub fn type_attribute<A: Any + Send + Sync>(&self, ty: Option<TypeHandle>) -> Option<Arc<A>> {
        let desc = self.registry.get(ty?)?;
        let found = find_attributes::<A>(desc.attributes()).next();
        found
    }

    /// All attributes of type `A` on a member or parameter
    pub fn custom_attributes<A: Any + Send + Sync>(
        &self,
        target: Option<&dyn AttributeTarget>,
    ) -> Vec<Arc<A>> {
        target
            .map(|t| find_attributes::<A>(t.attributes()).collect())
            .unwrap_or_default()
    }

    /// All attributes of type `A` on a type
    pub fn type_attributes<A: Any + Send + Sync>(&self, ty: Option<TypeHandle>) -> Vec<Arc<A>> {
        ty.and_then(|t| self.registry.get(t))
            .map(|desc| find_attributes::<A>(desc.attributes()).collect())
            .unwrap_or_default()
    }
}
