//! Generic construction
//!
//! Closing a generic definition substitutes every occurrence of its
//! parameters in the base type, interfaces and member signatures. Closed
//! types are interned per `(definition, arguments)`; the handle is cached
//! before members are substituted so a definition that refers to itself
//! (`Node<T>` with a `Next: Node<T>` property) resolves to the type being
//! built.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::descriptor::{
    ConstructorDescriptor, ConstructorInfo, FieldDescriptor, FieldInfo, GenericParameter,
    MethodDescriptor, MethodInfo, ParameterInfo, PropertyDescriptor, PropertyInfo,
    TypeDescriptor,
};
use crate::error::{HostError, HostResult};
use crate::handle::TypeHandle;
use crate::registry::TypeRegistry;

type Substitution = FxHashMap<TypeHandle, TypeHandle>;

impl TypeRegistry {
    /// Close a generic type definition over `arguments`
    ///
    /// Returns the same handle for the same definition and arguments.
    pub fn make_generic_type(
        &self,
        definition: TypeHandle,
        arguments: &[TypeHandle],
    ) -> HostResult<TypeHandle> {
        let _guard = self.construction.lock();

        let desc = self.descriptor(definition)?;
        if !desc.is_generic_type_definition() {
            return Err(HostError::NotGenericTypeDefinition {
                name: self.type_name(definition),
            });
        }
        self.check_arguments(&self.type_name(definition), desc.generic_parameters(), arguments)?;

        if let Some(existing) = self.constructed(definition, arguments) {
            return Ok(existing);
        }

        let handle = self.reserve();
        self.set_constructed(definition, arguments.to_vec(), Some(handle));
        match self.construct(&desc, handle, arguments) {
            Ok(constructed) => {
                self.install(constructed);
                debug!(definition = %definition, ty = %handle, name = %self.type_name(handle), "generic type constructed");
                Ok(handle)
            }
            Err(e) => {
                self.set_constructed(definition, arguments.to_vec(), None);
                Err(e)
            }
        }
    }

    /// Closed type already built from `definition` and `arguments`
    ///
    /// Unlike [`make_generic_type`](Self::make_generic_type) this never
    /// constructs. A type still being constructed is not reported.
    pub fn find_generic_type(&self, definition: TypeHandle, arguments: &[TypeHandle]) -> Option<TypeHandle> {
        self.constructed(definition, arguments)
            .filter(|&handle| self.get(handle).is_some())
    }

    /// Close a generic method definition over `arguments`
    pub fn make_generic_method(
        &self,
        method: &MethodInfo,
        arguments: &[TypeHandle],
    ) -> HostResult<MethodInfo> {
        if !method.is_generic_method_definition() {
            return Err(HostError::NotGenericMethodDefinition {
                name: method.name().to_string(),
            });
        }
        self.check_arguments(method.name(), method.generic_parameters(), arguments)?;

        let map = substitution(method.generic_parameters(), arguments);
        let source = &method.0;
        Ok(MethodInfo(Arc::new(MethodDescriptor {
            name: source.name.clone(),
            declaring_type: source.declaring_type,
            visibility: source.visibility,
            is_static: source.is_static,
            generic_parameters: source.generic_parameters.clone(),
            generic_arguments: arguments.to_vec(),
            definition: Some(method.clone()),
            parameters: self.substitute_parameters(&source.parameters, &map)?,
            return_type: source
                .return_type
                .map(|t| self.substitute(t, &map))
                .transpose()?,
            attributes: source.attributes.clone(),
            body: Arc::clone(&source.body),
        })))
    }

    fn check_arguments(
        &self,
        name: &str,
        parameters: &[GenericParameter],
        arguments: &[TypeHandle],
    ) -> HostResult<()> {
        if parameters.len() != arguments.len() {
            return Err(HostError::InvalidTypeArgCount {
                name: name.to_string(),
                expected: parameters.len(),
                actual: arguments.len(),
            });
        }
        for (parameter, &argument) in parameters.iter().zip(arguments) {
            self.descriptor(argument)?;
            for &constraint in &parameter.constraints {
                if !self.is_assignable(argument, constraint) {
                    return Err(HostError::ConstraintViolation {
                        name: name.to_string(),
                        parameter: parameter.name.clone(),
                        argument: self.type_name(argument),
                    });
                }
            }
        }
        Ok(())
    }

    fn construct(
        &self,
        desc: &TypeDescriptor,
        handle: TypeHandle,
        arguments: &[TypeHandle],
    ) -> HostResult<TypeDescriptor> {
        let map = substitution(desc.generic_parameters(), arguments);

        let base = desc.base.map(|b| self.substitute(b, &map)).transpose()?;
        let interfaces = desc
            .interfaces
            .iter()
            .map(|&i| self.substitute(i, &map))
            .collect::<HostResult<Vec<_>>>()?;

        let properties = desc
            .properties
            .iter()
            .map(|p| {
                Ok(PropertyInfo(Arc::new(PropertyDescriptor {
                    name: p.0.name.clone(),
                    declaring_type: handle,
                    property_type: self.substitute(p.0.property_type, &map)?,
                    visibility: p.0.visibility,
                    is_static: p.0.is_static,
                    getter: p.0.getter.clone(),
                    attributes: p.0.attributes.clone(),
                })))
            })
            .collect::<HostResult<Vec<_>>>()?;

        let methods = desc
            .methods
            .iter()
            .map(|m| {
                Ok(MethodInfo(Arc::new(MethodDescriptor {
                    name: m.0.name.clone(),
                    declaring_type: handle,
                    visibility: m.0.visibility,
                    is_static: m.0.is_static,
                    generic_parameters: m.0.generic_parameters.clone(),
                    generic_arguments: Vec::new(),
                    definition: None,
                    parameters: self.substitute_parameters(&m.0.parameters, &map)?,
                    return_type: m
                        .0
                        .return_type
                        .map(|t| self.substitute(t, &map))
                        .transpose()?,
                    attributes: m.0.attributes.clone(),
                    body: Arc::clone(&m.0.body),
                })))
            })
            .collect::<HostResult<Vec<_>>>()?;

        let constructors = desc
            .constructors
            .iter()
            .map(|c| {
                Ok(ConstructorInfo(Arc::new(ConstructorDescriptor {
                    declaring_type: handle,
                    visibility: c.0.visibility,
                    parameters: self.substitute_parameters(&c.0.parameters, &map)?,
                    attributes: c.0.attributes.clone(),
                    body: Arc::clone(&c.0.body),
                })))
            })
            .collect::<HostResult<Vec<_>>>()?;

        let fields = desc
            .fields
            .iter()
            .map(|f| {
                Ok(FieldInfo(Arc::new(FieldDescriptor {
                    name: f.0.name.clone(),
                    declaring_type: handle,
                    field_type: self.substitute(f.0.field_type, &map)?,
                    visibility: f.0.visibility,
                    is_static: f.0.is_static,
                    is_literal: f.0.is_literal,
                    is_init_only: f.0.is_init_only,
                    value: f.0.value.clone(),
                    attributes: f.0.attributes.clone(),
                })))
            })
            .collect::<HostResult<Vec<_>>>()?;

        Ok(TypeDescriptor {
            handle,
            name: desc.name.clone(),
            unit: desc.unit,
            kind: desc.kind,
            visibility: desc.visibility,
            is_abstract: desc.is_abstract,
            base,
            interfaces,
            generic_parameters: Vec::new(),
            generic_definition: Some(desc.handle),
            generic_arguments: arguments.to_vec(),
            properties,
            methods,
            constructors,
            fields,
            attributes: desc.attributes.clone(),
        })
    }

    fn substitute_parameters(
        &self,
        parameters: &[ParameterInfo],
        map: &Substitution,
    ) -> HostResult<Vec<ParameterInfo>> {
        parameters
            .iter()
            .map(|p| {
                Ok(ParameterInfo {
                    parameter_type: self.substitute(p.parameter_type, map)?,
                    ..p.clone()
                })
            })
            .collect()
    }

    /// Replace generic parameters inside `ty`
    ///
    /// A bare reference to a generic definition whose parameters are being
    /// substituted stands for the definition closed over its own parameters.
    fn substitute(&self, ty: TypeHandle, map: &Substitution) -> HostResult<TypeHandle> {
        if let Some(&mapped) = map.get(&ty) {
            return Ok(mapped);
        }
        let Some(desc) = self.get(ty) else {
            return Ok(ty);
        };

        if let Some(definition) = desc.generic_definition {
            let arguments = desc
                .generic_arguments
                .iter()
                .map(|&a| self.substitute(a, map))
                .collect::<HostResult<Vec<_>>>()?;
            if arguments != desc.generic_arguments {
                return self.make_generic_type(definition, &arguments);
            }
            return Ok(ty);
        }

        if desc.is_generic_type_definition()
            && desc.generic_parameters.iter().any(|p| map.contains_key(&p.handle))
        {
            let arguments: Vec<TypeHandle> = desc
                .generic_parameters
                .iter()
                .map(|p| map.get(&p.handle).copied().unwrap_or(p.handle))
                .collect();
            return self.make_generic_type(ty, &arguments);
        }

        Ok(ty)
    }
}

fn substitution(parameters: &[GenericParameter], arguments: &[TypeHandle]) -> Substitution {
    parameters
        .iter()
        .map(|p| p.handle)
        .zip(arguments.iter().copied())
        .collect()
}
