//! Type and member descriptors
//!
//! Descriptors are immutable once a type is built. Member handles
//! ([`PropertyInfo`], [`MethodInfo`], [`FieldInfo`], [`ConstructorInfo`]) are
//! cheap to clone and compare by identity: two handles are equal when they
//! come from the same declaration on the same (possibly constructed) type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::HostResult;
use crate::handle::{TypeHandle, UnitHandle};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Custom metadata attached to a type, member or parameter
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// Getter body: receives the target (`Value::Null` for static properties)
pub type Getter = Arc<dyn Fn(&Value) -> HostResult<Value> + Send + Sync>;

/// Method body
pub type MethodBody = Arc<dyn Fn(&CallFrame<'_>) -> HostResult<Value> + Send + Sync>;

/// Constructor body: produces the state of the new object
pub type ConstructorBody =
    Arc<dyn Fn(&CallFrame<'_>) -> HostResult<Arc<dyn Any + Send + Sync>> + Send + Sync>;

/// Type kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Reference type with a base class
    Class,
    /// Interface (no base, may extend other interfaces)
    Interface,
    /// Built-in value type
    Primitive,
    /// Placeholder for a generic type or method parameter
    GenericParameter,
}

/// Member and type visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to derived types
    Protected,
    /// Visible inside the declaring unit
    Internal,
    /// Visible to the declaring type only
    Private,
}

impl Visibility {
    /// Check if this is public visibility
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Anything that carries custom attributes
pub trait AttributeTarget {
    /// Own attributes in declaration order
    fn attributes(&self) -> &[Attribute];

    /// First own attribute of type `A`
    fn attribute<A: Any + Send + Sync>(&self) -> Option<Arc<A>>
    where
        Self: Sized,
    {
        find_attributes::<A>(self.attributes()).next()
    }
}

/// Own attributes of type `A`, in declaration order
pub fn find_attributes<A: Any + Send + Sync>(
    attributes: &[Attribute],
) -> impl Iterator<Item = Arc<A>> + '_ {
    attributes
        .iter()
        .filter_map(|a| Arc::clone(a).downcast::<A>().ok())
}

static NULL_VALUE: Value = Value::Null;

/// Arguments of a method or constructor call
pub struct CallFrame<'a> {
    /// Registry the member lives in
    pub registry: &'a TypeRegistry,
    /// Type that declares the invoked member (constructed if generic)
    pub declaring_type: TypeHandle,
    /// Target for instance members, `None` for static members and constructors
    pub target: Option<&'a Value>,
    /// Type arguments of a closed generic method (empty otherwise)
    pub type_arguments: &'a [TypeHandle],
    /// Arguments, already padded with defaults for omitted optional parameters
    pub args: &'a [Value],
}

impl CallFrame<'_> {
    /// Argument at `index`, null when absent
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&NULL_VALUE)
    }

    /// Target or null
    pub fn this(&self) -> &Value {
        self.target.unwrap_or(&NULL_VALUE)
    }
}

// ============================================================================
// Generic parameters
// ============================================================================

/// A generic type or method parameter
#[derive(Debug, Clone)]
pub struct GenericParameter {
    /// Type standing in for the parameter
    pub handle: TypeHandle,
    /// Parameter name
    pub name: String,
    /// Base type or interface constraints
    pub constraints: Vec<TypeHandle>,
}

// ============================================================================
// Type descriptor
// ============================================================================

/// Complete description of a registered type
pub struct TypeDescriptor {
    pub(crate) handle: TypeHandle,
    pub(crate) name: String,
    pub(crate) unit: UnitHandle,
    pub(crate) kind: TypeKind,
    pub(crate) visibility: Visibility,
    pub(crate) is_abstract: bool,
    pub(crate) base: Option<TypeHandle>,
    pub(crate) interfaces: Vec<TypeHandle>,
    pub(crate) generic_parameters: Vec<GenericParameter>,
    pub(crate) generic_definition: Option<TypeHandle>,
    pub(crate) generic_arguments: Vec<TypeHandle>,
    pub(crate) properties: Vec<PropertyInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) constructors: Vec<ConstructorInfo>,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) attributes: Vec<Attribute>,
}

impl TypeDescriptor {
    /// Handle of this type
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// Simple name (generic definitions and constructions share it)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring code unit
    pub fn unit(&self) -> UnitHandle {
        self.unit
    }

    /// Type kind
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Check if this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Check if this is a class
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    /// Check if this is a generic parameter placeholder
    pub fn is_generic_parameter(&self) -> bool {
        self.kind == TypeKind::GenericParameter
    }

    /// Type visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Check if the type is public
    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    /// Check if the type is abstract (interfaces always are)
    pub fn is_abstract(&self) -> bool {
        self.is_abstract || self.is_interface()
    }

    /// Direct base type
    pub fn base_type(&self) -> Option<TypeHandle> {
        self.base
    }

    /// Interfaces listed on the declaration itself
    pub fn declared_interfaces(&self) -> &[TypeHandle] {
        &self.interfaces
    }

    /// Generic definition with unbound parameters (`List<T>`)
    pub fn is_generic_type_definition(&self) -> bool {
        !self.generic_parameters.is_empty()
    }

    /// Generic definition or construction of one
    pub fn is_generic_type(&self) -> bool {
        self.is_generic_type_definition() || self.generic_definition.is_some()
    }

    /// Definition this type was constructed from; a definition returns itself
    pub fn generic_type_definition(&self) -> Option<TypeHandle> {
        if self.is_generic_type_definition() {
            Some(self.handle)
        } else {
            self.generic_definition
        }
    }

    /// Generic parameters of a definition
    pub fn generic_parameters(&self) -> &[GenericParameter] {
        &self.generic_parameters
    }

    /// Type arguments of a constructed generic type
    pub fn generic_arguments(&self) -> &[TypeHandle] {
        &self.generic_arguments
    }

    /// Properties declared on this type only
    pub fn declared_properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Methods declared on this type only
    pub fn declared_methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Constructors
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// Fields declared on this type only
    pub fn declared_fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

impl AttributeTarget for TypeDescriptor {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base", &self.base)
            .field("generic_arguments", &self.generic_arguments)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Property declaration
pub struct PropertyDescriptor {
    pub(crate) name: String,
    pub(crate) declaring_type: TypeHandle,
    pub(crate) property_type: TypeHandle,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) getter: Option<Getter>,
    pub(crate) attributes: Vec<Attribute>,
}

/// Shared handle to a property declaration
#[derive(Clone)]
pub struct PropertyInfo(pub(crate) Arc<PropertyDescriptor>);

impl PropertyInfo {
    /// Property name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type that declares the property
    pub fn declaring_type(&self) -> TypeHandle {
        self.0.declaring_type
    }

    /// Property type
    pub fn property_type(&self) -> TypeHandle {
        self.0.property_type
    }

    /// Property visibility
    pub fn visibility(&self) -> Visibility {
        self.0.visibility
    }

    /// Check if the property is static
    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Check if the property has a getter
    pub fn can_read(&self) -> bool {
        self.0.getter.is_some()
    }

    pub(crate) fn getter(&self) -> Option<&Getter> {
        self.0.getter.as_ref()
    }
}

impl PartialEq for PropertyInfo {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PropertyInfo {}

impl AttributeTarget for PropertyInfo {
    fn attributes(&self) -> &[Attribute] {
        &self.0.attributes
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyInfo({}.{})", self.0.declaring_type, self.0.name)
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Method or constructor parameter
#[derive(Clone)]
pub struct ParameterInfo {
    pub(crate) name: String,
    pub(crate) position: usize,
    pub(crate) parameter_type: TypeHandle,
    pub(crate) default: Option<Value>,
    pub(crate) attributes: Vec<Attribute>,
}

impl ParameterInfo {
    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Declared type
    pub fn parameter_type(&self) -> TypeHandle {
        self.parameter_type
    }

    /// Optional parameters carry a default value
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    /// Default value of an optional parameter
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl AttributeTarget for ParameterInfo {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl fmt::Debug for ParameterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterInfo")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("type", &self.parameter_type)
            .field("optional", &self.is_optional())
            .finish()
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Method declaration, open or closed
pub struct MethodDescriptor {
    pub(crate) name: String,
    pub(crate) declaring_type: TypeHandle,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) generic_parameters: Vec<GenericParameter>,
    pub(crate) generic_arguments: Vec<TypeHandle>,
    pub(crate) definition: Option<MethodInfo>,
    pub(crate) parameters: Vec<ParameterInfo>,
    pub(crate) return_type: Option<TypeHandle>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) body: MethodBody,
}

/// Shared handle to a method
#[derive(Clone)]
pub struct MethodInfo(pub(crate) Arc<MethodDescriptor>);

impl MethodInfo {
    /// Method name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type that declares the method
    pub fn declaring_type(&self) -> TypeHandle {
        self.0.declaring_type
    }

    /// Method visibility
    pub fn visibility(&self) -> Visibility {
        self.0.visibility
    }

    /// Check if the method is static
    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Declared with type parameters that are not bound yet
    pub fn is_generic_method_definition(&self) -> bool {
        !self.0.generic_parameters.is_empty() && self.0.generic_arguments.is_empty()
    }

    /// Generic definition or closed construction of one
    pub fn is_generic_method(&self) -> bool {
        !self.0.generic_parameters.is_empty()
    }

    /// Number of generic parameters
    pub fn generic_arity(&self) -> usize {
        self.0.generic_parameters.len()
    }

    /// Generic parameters of the definition
    pub fn generic_parameters(&self) -> &[GenericParameter] {
        &self.0.generic_parameters
    }

    /// Type arguments of a closed generic method
    pub fn generic_arguments(&self) -> &[TypeHandle] {
        &self.0.generic_arguments
    }

    /// Definition a closed generic method was made from
    pub fn generic_method_definition(&self) -> Option<&MethodInfo> {
        self.0.definition.as_ref()
    }

    /// Parameters in order
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.0.parameters
    }

    /// Number of parameters without a default value
    pub fn required_parameter_count(&self) -> usize {
        self.0.parameters.iter().filter(|p| !p.is_optional()).count()
    }

    /// Return type, `None` for void
    pub fn return_type(&self) -> Option<TypeHandle> {
        self.0.return_type
    }

    pub(crate) fn body(&self) -> &MethodBody {
        &self.0.body
    }

    /// Same parameter types (used to detect overrides)
    pub(crate) fn same_signature(&self, other: &MethodInfo) -> bool {
        self.name() == other.name()
            && self.generic_arity() == other.generic_arity()
            && self.0.parameters.len() == other.0.parameters.len()
            && self
                .0
                .parameters
                .iter()
                .zip(other.0.parameters.iter())
                .all(|(a, b)| a.parameter_type == b.parameter_type)
    }
}

impl PartialEq for MethodInfo {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0.definition, &other.0.definition) {
            (Some(a), Some(b)) => a == b && self.0.generic_arguments == other.0.generic_arguments,
            _ => Arc::ptr_eq(&self.0, &other.0),
        }
    }
}

impl Eq for MethodInfo {}

impl AttributeTarget for MethodInfo {
    fn attributes(&self) -> &[Attribute] {
        &self.0.attributes
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodInfo({}.{}", self.0.declaring_type, self.0.name)?;
        if !self.0.generic_arguments.is_empty() {
            write!(f, "<{:?}>", self.0.generic_arguments)?;
        } else if !self.0.generic_parameters.is_empty() {
            write!(f, "<{}>", self.0.generic_parameters.len())?;
        }
        write!(f, "/{})", self.0.parameters.len())
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Constructor declaration
pub struct ConstructorDescriptor {
    pub(crate) declaring_type: TypeHandle,
    pub(crate) visibility: Visibility,
    pub(crate) parameters: Vec<ParameterInfo>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) body: ConstructorBody,
}

/// Shared handle to a constructor
#[derive(Clone)]
pub struct ConstructorInfo(pub(crate) Arc<ConstructorDescriptor>);

impl ConstructorInfo {
    /// Type the constructor creates
    pub fn declaring_type(&self) -> TypeHandle {
        self.0.declaring_type
    }

    /// Constructor visibility
    pub fn visibility(&self) -> Visibility {
        self.0.visibility
    }

    /// Parameters in order
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.0.parameters
    }

    pub(crate) fn body(&self) -> &ConstructorBody {
        &self.0.body
    }
}

impl PartialEq for ConstructorInfo {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ConstructorInfo {}

impl AttributeTarget for ConstructorInfo {
    fn attributes(&self) -> &[Attribute] {
        &self.0.attributes
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConstructorInfo({}/{})",
            self.0.declaring_type,
            self.0.parameters.len()
        )
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Field declaration
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) declaring_type: TypeHandle,
    pub(crate) field_type: TypeHandle,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) is_literal: bool,
    pub(crate) is_init_only: bool,
    pub(crate) value: Option<Value>,
    pub(crate) attributes: Vec<Attribute>,
}

/// Shared handle to a field
#[derive(Clone)]
pub struct FieldInfo(pub(crate) Arc<FieldDescriptor>);

impl FieldInfo {
    /// Field name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type that declares the field
    pub fn declaring_type(&self) -> TypeHandle {
        self.0.declaring_type
    }

    /// Field type
    pub fn field_type(&self) -> TypeHandle {
        self.0.field_type
    }

    /// Field visibility
    pub fn visibility(&self) -> Visibility {
        self.0.visibility
    }

    /// Check if the field is static
    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Compile-time constant
    pub fn is_literal(&self) -> bool {
        self.0.is_literal
    }

    /// Readonly after initialization
    pub fn is_init_only(&self) -> bool {
        self.0.is_init_only
    }

    /// Constant value of a literal field, or initial value of a static field
    pub fn raw_constant_value(&self) -> Option<&Value> {
        self.0.value.as_ref()
    }
}

impl PartialEq for FieldInfo {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FieldInfo {}

impl AttributeTarget for FieldInfo {
    fn attributes(&self) -> &[Attribute] {
        &self.0.attributes
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldInfo({}.{})", self.0.declaring_type, self.0.name)
    }
}
