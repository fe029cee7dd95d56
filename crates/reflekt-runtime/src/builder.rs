//! Type Builder
//!
//! Types are declared through a [`TypeBuilder`] obtained from
//! [`TypeRegistry::define_class`] or [`TypeRegistry::define_interface`].
//! The builder reserves the type handle up front so members may refer to
//! the type being declared, and so generic parameters can be allocated
//! before the declaration is complete.
//!
//! ```ignore
//! let mut demo = registry.define_class(unit, "Demo");
//! let t = demo.method_generic_parameter("T");
//! demo.method(
//!     MethodDefinition::new("Describe")
//!         .generic(t)
//!         .param(ParameterDefinition::new("value", t.handle))
//!         .returns(TypeHandle::STRING)
//!         .body(|frame| Ok(format!("{:?}", frame.arg(0)).into())),
//! );
//! let demo = demo.build()?;
//! ```

use std::any::Any;
use std::sync::Arc;

use crate::descriptor::{
    Attribute, CallFrame, ConstructorBody, ConstructorDescriptor, ConstructorInfo,
    FieldDescriptor, FieldInfo, GenericParameter, Getter, MethodBody, MethodDescriptor,
    MethodInfo, ParameterInfo, PropertyDescriptor, PropertyInfo, TypeDescriptor, TypeKind,
    Visibility,
};
use crate::error::HostResult;
use crate::handle::{TypeHandle, UnitHandle};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Definition for a method or constructor parameter
#[derive(Clone)]
pub struct ParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub parameter_type: TypeHandle,
    /// Default value; present for optional parameters
    pub default: Option<Value>,
    /// Attributes
    pub attributes: Vec<Attribute>,
}

impl ParameterDefinition {
    /// Create a required parameter
    pub fn new(name: impl Into<String>, parameter_type: TypeHandle) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            default: None,
            attributes: Vec::new(),
        }
    }

    /// Mark as optional with the given default
    pub fn optional(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    fn into_info(self, position: usize) -> ParameterInfo {
        ParameterInfo {
            name: self.name,
            position,
            parameter_type: self.parameter_type,
            default: self.default,
            attributes: self.attributes,
        }
    }
}

/// Definition for a property
pub struct PropertyDefinition {
    name: String,
    property_type: TypeHandle,
    visibility: Visibility,
    is_static: bool,
    getter: Option<Getter>,
    attributes: Vec<Attribute>,
}

impl PropertyDefinition {
    /// Create a public instance property without getter
    pub fn new(name: impl Into<String>, property_type: TypeHandle) -> Self {
        Self {
            name: name.into(),
            property_type,
            visibility: Visibility::Public,
            is_static: false,
            getter: None,
            attributes: Vec::new(),
        }
    }

    /// Set the getter
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Value) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as static property
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }
}

/// Definition for a method
pub struct MethodDefinition {
    name: String,
    visibility: Visibility,
    is_static: bool,
    generic_parameters: Vec<GenericParameter>,
    parameters: Vec<ParameterDefinition>,
    return_type: Option<TypeHandle>,
    attributes: Vec<Attribute>,
    body: Option<MethodBody>,
}

impl MethodDefinition {
    /// Create a public instance method returning void
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            generic_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            attributes: Vec::new(),
            body: None,
        }
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Add a generic parameter allocated by
    /// [`TypeBuilder::method_generic_parameter`]
    pub fn generic(mut self, parameter: GenericParameter) -> Self {
        self.generic_parameters.push(parameter);
        self
    }

    /// Add a parameter
    pub fn param(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set return type
    pub fn returns(mut self, return_type: TypeHandle) -> Self {
        self.return_type = Some(return_type);
        self
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Set the body (defaults to a no-op returning null)
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }
}

/// Definition for a constructor
pub struct ConstructorDefinition {
    visibility: Visibility,
    parameters: Vec<ParameterDefinition>,
    attributes: Vec<Attribute>,
    body: ConstructorBody,
}

impl ConstructorDefinition {
    /// Create a public constructor whose body produces the object state
    pub fn new<S, F>(body: F) -> Self
    where
        S: Any + Send + Sync,
        F: Fn(&CallFrame<'_>) -> HostResult<S> + Send + Sync + 'static,
    {
        Self {
            visibility: Visibility::Public,
            parameters: Vec::new(),
            attributes: Vec::new(),
            body: Arc::new(move |frame: &CallFrame<'_>| {
                let state: Arc<dyn Any + Send + Sync> = Arc::new(body(frame)?);
                Ok(state)
            }),
        }
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Add a parameter
    pub fn param(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }
}

/// Definition for a field
pub struct FieldDefinition {
    name: String,
    field_type: TypeHandle,
    visibility: Visibility,
    is_static: bool,
    is_literal: bool,
    is_init_only: bool,
    value: Option<Value>,
    attributes: Vec<Attribute>,
}

impl FieldDefinition {
    /// Create a public instance field
    pub fn new(name: impl Into<String>, field_type: TypeHandle) -> Self {
        Self {
            name: name.into(),
            field_type,
            visibility: Visibility::Public,
            is_static: false,
            is_literal: false,
            is_init_only: false,
            value: None,
            attributes: Vec::new(),
        }
    }

    /// Create a public constant (static literal field)
    pub fn constant(name: impl Into<String>, field_type: TypeHandle, value: impl Into<Value>) -> Self {
        Self {
            is_static: true,
            is_literal: true,
            value: Some(value.into()),
            ..Self::new(name, field_type)
        }
    }

    /// Mark as static with an initial value
    pub fn as_static(mut self, value: impl Into<Value>) -> Self {
        self.is_static = true;
        self.value = Some(value.into());
        self
    }

    /// Mark as readonly
    pub fn as_readonly(mut self) -> Self {
        self.is_init_only = true;
        self
    }

    /// Set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }
}

/// Builder for a class or interface declaration
pub struct TypeBuilder<'r> {
    registry: &'r TypeRegistry,
    handle: TypeHandle,
    unit: UnitHandle,
    name: String,
    kind: TypeKind,
    visibility: Visibility,
    is_abstract: bool,
    base: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    generic_parameters: Vec<GenericParameter>,
    properties: Vec<PropertyDefinition>,
    methods: Vec<MethodDefinition>,
    constructors: Vec<ConstructorDefinition>,
    fields: Vec<FieldDefinition>,
    attributes: Vec<Attribute>,
}

impl<'r> TypeBuilder<'r> {
    pub(crate) fn new(
        registry: &'r TypeRegistry,
        unit: UnitHandle,
        name: String,
        kind: TypeKind,
    ) -> Self {
        Self {
            handle: registry.reserve(),
            registry,
            unit,
            name,
            kind,
            visibility: Visibility::Public,
            is_abstract: false,
            base: None,
            interfaces: Vec::new(),
            generic_parameters: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Handle the type will have once built
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// Set visibility
    pub fn visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.visibility = visibility;
        self
    }

    /// Mark as abstract
    pub fn abstract_type(&mut self) -> &mut Self {
        self.is_abstract = true;
        self
    }

    /// Set the base class (classes default to the universal root)
    pub fn extends(&mut self, base: TypeHandle) -> &mut Self {
        self.base = Some(base);
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    pub fn implements(&mut self, interface: TypeHandle) -> &mut Self {
        self.interfaces.push(interface);
        self
    }

    /// Declare a generic type parameter
    pub fn generic_parameter(&mut self, name: &str) -> TypeHandle {
        self.generic_parameter_with(name, &[])
    }

    /// Declare a generic type parameter with base type or interface constraints
    pub fn generic_parameter_with(&mut self, name: &str, constraints: &[TypeHandle]) -> TypeHandle {
        let parameter = self.registry.alloc_generic_parameter(self.unit, name, constraints);
        let handle = parameter.handle;
        self.generic_parameters.push(parameter);
        handle
    }

    /// Allocate a generic parameter for a method of this type
    ///
    /// Attach it with [`MethodDefinition::generic`].
    pub fn method_generic_parameter(&mut self, name: &str) -> GenericParameter {
        self.registry.alloc_generic_parameter(self.unit, name, &[])
    }

    /// Allocate a constrained generic parameter for a method of this type
    pub fn method_generic_parameter_with(
        &mut self,
        name: &str,
        constraints: &[TypeHandle],
    ) -> GenericParameter {
        self.registry.alloc_generic_parameter(self.unit, name, constraints)
    }

    /// Add a property
    pub fn property(&mut self, property: PropertyDefinition) -> &mut Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn method(&mut self, method: MethodDefinition) -> &mut Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor
    pub fn constructor(&mut self, constructor: ConstructorDefinition) -> &mut Self {
        self.constructors.push(constructor);
        self
    }

    /// Add a field
    pub fn field(&mut self, field: FieldDefinition) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(&mut self, attribute: A) -> &mut Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Finish the declaration and publish the type
    pub fn build(self) -> HostResult<TypeHandle> {
        let handle = self.handle;
        let base = match self.kind {
            TypeKind::Class => Some(self.base.unwrap_or(TypeHandle::OBJECT)),
            _ => None,
        };

        let properties = self
            .properties
            .into_iter()
            .map(|p| {
                PropertyInfo(Arc::new(PropertyDescriptor {
                    name: p.name,
                    declaring_type: handle,
                    property_type: p.property_type,
                    visibility: p.visibility,
                    is_static: p.is_static,
                    getter: p.getter,
                    attributes: p.attributes,
                }))
            })
            .collect();

        let methods = self
            .methods
            .into_iter()
            .map(|m| {
                MethodInfo(Arc::new(MethodDescriptor {
                    name: m.name,
                    declaring_type: handle,
                    visibility: m.visibility,
                    is_static: m.is_static,
                    generic_parameters: m.generic_parameters,
                    generic_arguments: Vec::new(),
                    definition: None,
                    parameters: into_parameters(m.parameters),
                    return_type: m.return_type,
                    attributes: m.attributes,
                    body: m.body.unwrap_or_else(|| Arc::new(noop_body)),
                }))
            })
            .collect();

        // Classes without a declared constructor get a parameterless one
        let mut declared_constructors = self.constructors;
        if self.kind == TypeKind::Class && declared_constructors.is_empty() {
            declared_constructors.push(ConstructorDefinition {
                visibility: Visibility::Public,
                parameters: Vec::new(),
                attributes: Vec::new(),
                body: Arc::new(empty_state),
            });
        }
        let constructors = declared_constructors
            .into_iter()
            .map(|c| {
                ConstructorInfo(Arc::new(ConstructorDescriptor {
                    declaring_type: handle,
                    visibility: c.visibility,
                    parameters: into_parameters(c.parameters),
                    attributes: c.attributes,
                    body: c.body,
                }))
            })
            .collect();

        let fields = self
            .fields
            .into_iter()
            .map(|f| {
                FieldInfo(Arc::new(FieldDescriptor {
                    name: f.name,
                    declaring_type: handle,
                    field_type: f.field_type,
                    visibility: f.visibility,
                    is_static: f.is_static,
                    is_literal: f.is_literal,
                    is_init_only: f.is_init_only,
                    value: f.value,
                    attributes: f.attributes,
                }))
            })
            .collect();

        self.registry.publish(TypeDescriptor {
            handle,
            name: self.name,
            unit: self.unit,
            kind: self.kind,
            visibility: self.visibility,
            is_abstract: self.is_abstract,
            base,
            interfaces: self.interfaces,
            generic_parameters: self.generic_parameters,
            generic_definition: None,
            generic_arguments: Vec::new(),
            properties,
            methods,
            constructors,
            fields,
            attributes: self.attributes,
        })
    }
}

pub(crate) fn empty_state(_: &CallFrame<'_>) -> HostResult<Arc<dyn Any + Send + Sync>> {
    Ok(Arc::new(()))
}

fn noop_body(_: &CallFrame<'_>) -> HostResult<Value> {
    Ok(Value::Null)
}

fn into_parameters(parameters: Vec<ParameterDefinition>) -> Vec<ParameterInfo> {
    parameters
        .into_iter()
        .enumerate()
        .map(|(i, p)| p.into_info(i))
        .collect()
}
