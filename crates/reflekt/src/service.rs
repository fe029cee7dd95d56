//! Reflection Service
//!
//! Entry point of the engine. The service owns nothing but a shared handle
//! to the host registry and its options; every query derives its answer
//! from the registry on demand.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use reflekt_runtime::{
    BindingFlags, HostError, HostType, MethodInfo, MissingArguments, PropertyInfo, TypeHandle,
    TypeRegistry, UnitHandle, Value,
};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::ReflectionOptions;
use crate::error::{ReflectError, Result};

/// Runtime introspection and late-bound dispatch over a [`TypeRegistry`]
#[derive(Clone)]
pub struct ReflectionService {
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) missing_arguments: MissingArguments,
    pub(crate) default_binding: BindingFlags,
}

impl ReflectionService {
    /// Create a service with default options
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            missing_arguments: MissingArguments::default(),
            default_binding: BindingFlags::DEFAULT_LOOKUP,
        }
    }

    /// Create a service with the given options
    pub fn with_options(registry: Arc<TypeRegistry>, options: &ReflectionOptions) -> Result<Self> {
        Ok(Self {
            registry,
            missing_arguments: options.missing_arguments()?,
            default_binding: options.binding_flags()?,
        })
    }

    /// The registry this service reads from
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Properties of a type
    ///
    /// For a class this is the host order (declared first, then each base).
    /// For an interface, the interface and every interface it extends are
    /// visited breadth first; the properties of each visited interface that
    /// are not collected yet are inserted at the front of the result.
    pub fn properties(
        &self,
        ty: Option<TypeHandle>,
        flags: Option<BindingFlags>,
    ) -> Result<Vec<PropertyInfo>> {
        let ty = ty.ok_or(ReflectError::missing("type"))?;
        let flags = flags.unwrap_or(self.default_binding);
        let desc = self.registry.descriptor(ty)?;
        if !desc.is_interface() {
            return Ok(self.registry.properties(ty, flags)?);
        }

        let mut properties: Vec<PropertyInfo> = Vec::new();
        let mut considered = FxHashSet::default();
        let mut queue = VecDeque::new();
        considered.insert(ty);
        queue.push_back(ty);

        while let Some(sub_type) = queue.pop_front() {
            for sub_interface in self.registry.interfaces(sub_type) {
                if considered.insert(sub_interface) {
                    queue.push_back(sub_interface);
                }
            }

            let fresh: Vec<PropertyInfo> = self
                .registry
                .properties(sub_type, flags)?
                .into_iter()
                .filter(|p| !properties.contains(p))
                .collect();
            let collected = std::mem::replace(&mut properties, fresh);
            properties.extend(collected);
        }
        Ok(properties)
    }

    /// Public instance properties of an object with their current values
    ///
    /// Null yields an empty list.
    pub fn property_values(&self, data: Option<&Value>) -> Result<Vec<(String, Value)>> {
        let Some(ty) = data.and_then(Value::runtime_type) else {
            return Ok(Vec::new());
        };
        let flags = BindingFlags::PUBLIC | BindingFlags::INSTANCE;
        self.registry
            .properties(ty, flags)?
            .iter()
            .map(|p| {
                let value = self.registry.read_property(p, data)?;
                Ok((p.name().to_string(), value))
            })
            .collect()
    }

    /// Readable properties of an object keyed by name, in host order
    ///
    /// Unreadable properties are skipped. Null yields an empty map.
    pub fn property_map(
        &self,
        data: Option<&Value>,
        flags: Option<BindingFlags>,
    ) -> Result<IndexMap<String, Value>> {
        let Some(ty) = data.and_then(Value::runtime_type) else {
            return Ok(IndexMap::new());
        };
        let mut map = IndexMap::new();
        for property in self.properties(Some(ty), flags)? {
            if !property.can_read() {
                continue;
            }
            let value = self.registry.read_property(&property, data)?;
            map.insert(property.name().to_string(), value);
        }
        Ok(map)
    }

    // ========================================================================
    // Type discovery
    // ========================================================================

    /// Public concrete classes of `unit` assignable to `base`, in
    /// registration order
    pub fn types_from_base_type_in_unit(&self, base: TypeHandle, unit: UnitHandle) -> Vec<TypeHandle> {
        let types: Vec<TypeHandle> = self
            .registry
            .unit_types(unit)
            .into_iter()
            .filter(|&t| {
                self.registry.get(t).is_some_and(|d| {
                    d.is_class()
                        && d.is_public()
                        && !d.is_abstract()
                        && self.registry.is_assignable(t, base)
                })
            })
            .collect();
        debug!(base = %base, unit = %unit, found = types.len(), "types from base type");
        types
    }

    /// Typed form of [`types_from_base_type_in_unit`](Self::types_from_base_type_in_unit)
    pub fn types_from_base_in_unit<T: HostType>(&self, unit: UnitHandle) -> Vec<TypeHandle> {
        match T::host_type(&self.registry) {
            Some(base) => self.types_from_base_type_in_unit(base, unit),
            None => Vec::new(),
        }
    }

    // ========================================================================
    // Generics and activation
    // ========================================================================

    /// Close a generic type definition
    pub fn make_generic_type(&self, definition: TypeHandle, arguments: &[TypeHandle]) -> Result<TypeHandle> {
        Ok(self.registry.make_generic_type(definition, arguments)?)
    }

    /// Close a generic method definition
    pub fn make_generic_method(&self, method: &MethodInfo, arguments: &[TypeHandle]) -> Result<MethodInfo> {
        Ok(self.registry.make_generic_method(method, arguments)?)
    }

    /// Create an instance through the public constructor matching `args`
    pub fn create_instance(&self, ty: TypeHandle, args: &[Value]) -> Result<Value> {
        Ok(self.registry.create_instance(ty, args)?)
    }

    /// Create an instance of the host type standing for `T` and convert it
    pub fn create_instance_of<T: HostType>(&self, args: &[Value]) -> Result<T> {
        let rust_name = std::any::type_name::<T>();
        let ty = T::host_type(&self.registry).ok_or_else(|| HostError::Activation {
            name: rust_name.to_string(),
            reason: "no host type is registered for it".to_string(),
        })?;
        let value = self.registry.create_instance(ty, args)?;
        let actual = self.registry.value_type_name(&value);
        T::from_value(value).ok_or_else(|| {
            ReflectError::from(HostError::TargetType {
                expected: rust_name.to_string(),
                actual,
            })
        })
    }
}

impl std::fmt::Debug for ReflectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectionService")
            .field("missing_arguments", &self.missing_arguments)
            .field("default_binding", &self.default_binding.to_string())
            .finish_non_exhaustive()
    }
}
