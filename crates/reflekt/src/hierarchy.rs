//! Generic hierarchy queries and public constants

use std::iter;

use reflekt_runtime::{BindingFlags, FieldInfo, HostType, TypeHandle};

use crate::error::Result;
use crate::service::ReflectionService;

impl ReflectionService {
    /// First base type of `implementation` constructed from `generic_base`
    ///
    /// The universal root ends the search.
    pub fn generic_type_for_hierarchy(
        &self,
        generic_base: TypeHandle,
        implementation: Option<TypeHandle>,
    ) -> Option<TypeHandle> {
        self.registry
            .base_chain(implementation?)
            .into_iter()
            .take_while(|&base| base != TypeHandle::OBJECT)
            .find(|&base| self.is_constructed_from(base, generic_base))
    }

    /// Interface of `implementation` constructed from `generic_interface`
    ///
    /// Classes deriving directly from the universal root yield `None`.
    pub fn generic_interface_for_hierarchy(
        &self,
        generic_interface: TypeHandle,
        implementation: Option<TypeHandle>,
    ) -> Option<TypeHandle> {
        if !self.registry.get(generic_interface)?.is_interface() {
            return None;
        }
        let implementation = implementation?;
        let desc = self.registry.get(implementation)?;

        if desc.is_interface() {
            if self.is_constructed_from(implementation, generic_interface) {
                return Some(implementation);
            }
        } else if matches!(desc.base_type(), None | Some(TypeHandle::OBJECT)) {
            return None;
        }

        self.registry
            .interfaces(implementation)
            .into_iter()
            .find(|&i| self.is_constructed_from(i, generic_interface))
    }

    /// Values of the public constants of type `T` on `ty` and its bases
    pub fn public_constant_values<T: HostType>(&self, ty: TypeHandle) -> Result<Vec<T>> {
        Ok(self
            .public_constants::<T>(ty)?
            .iter()
            .filter_map(|f| f.raw_constant_value().cloned())
            .filter_map(T::from_value)
            .collect())
    }

    /// Public constants of type `T` on `ty` and its bases
    pub fn public_constants<T: HostType>(&self, ty: TypeHandle) -> Result<Vec<FieldInfo>> {
        let Some(field_type) = T::host_type(&self.registry) else {
            return Ok(Vec::new());
        };
        let flags = BindingFlags::PUBLIC | BindingFlags::STATIC | BindingFlags::FLATTEN_HIERARCHY;
        Ok(self
            .registry
            .fields(ty, flags)?
            .into_iter()
            .filter(|f| f.is_literal() && !f.is_init_only() && f.field_type() == field_type)
            .collect())
    }

    /// `ty` itself followed by its base chain
    pub(crate) fn self_and_bases(&self, ty: TypeHandle) -> impl Iterator<Item = TypeHandle> {
        iter::once(ty).chain(self.registry.base_chain(ty))
    }

    pub(crate) fn is_constructed_from(&self, ty: TypeHandle, definition: TypeHandle) -> bool {
        self.registry
            .get(ty)
            .is_some_and(|d| d.is_generic_type() && d.generic_type_definition() == Some(definition))
    }
}
