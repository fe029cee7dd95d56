//! Dynamic values passed through invocation and property access
//!
//! Primitives are stored inline. Objects pair a [`TypeHandle`] with shared,
//! type-erased state. Deferred values wrap a shared boxed future so that a
//! caller can clone and await them independently.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{HostError, HostResult};
use crate::handle::TypeHandle;

/// Output of a deferred computation
pub type DeferredResult = Result<Value, HostError>;

/// Dynamic value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Instance of a registered class
    Object(Object),
    /// Deferred computation
    Deferred(Deferred),
}

impl Value {
    /// Runtime type of the value, `None` for null
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeHandle::BOOL),
            Value::Int(_) => Some(TypeHandle::INT),
            Value::Float(_) => Some(TypeHandle::FLOAT),
            Value::Str(_) => Some(TypeHandle::STRING),
            Value::Object(o) => Some(o.type_handle()),
            Value::Deferred(d) => Some(d.type_handle()),
        }
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object if this is an object
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get as deferred if this is a deferred value
    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Value::Deferred(d) => Some(d),
            _ => None,
        }
    }

    /// Borrow the state of an object value as `S`
    ///
    /// Used by getters and method bodies to reach the Rust state behind
    /// their target.
    pub fn state<S: Any>(&self) -> HostResult<&S> {
        self.as_object()
            .and_then(|o| o.downcast_ref::<S>())
            .ok_or_else(|| HostError::TargetType {
                expected: std::any::type_name::<S>().to_string(),
                actual: self.kind_name().to_string(),
            })
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Deferred(_) => "deferred",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Deferred(a), Value::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(o) => write!(f, "Object({})", o.type_handle()),
            Value::Deferred(d) => write!(f, "Deferred({})", d.type_handle()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Value::Deferred(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Object
// ============================================================================

/// Instance of a registered type
#[derive(Clone)]
pub struct Object {
    ty: TypeHandle,
    state: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Create an object of type `ty` owning `state`
    pub fn new<S: Any + Send + Sync>(ty: TypeHandle, state: S) -> Self {
        Self {
            ty,
            state: Arc::new(state),
        }
    }

    /// Create an object from already shared state
    pub fn from_arc(ty: TypeHandle, state: Arc<dyn Any + Send + Sync>) -> Self {
        Self { ty, state }
    }

    /// Runtime type of the object
    pub fn type_handle(&self) -> TypeHandle {
        self.ty
    }

    /// Borrow the state as `S`
    pub fn downcast_ref<S: Any>(&self) -> Option<&S> {
        self.state.downcast_ref::<S>()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("ty", &self.ty).finish_non_exhaustive()
    }
}

// ============================================================================
// Deferred
// ============================================================================

/// A computation that may not have completed yet
///
/// The type handle is [`TypeHandle::TASK`], a closed `Task<T>`, or a type
/// derived from either. Cloning shares the underlying future; every clone
/// observes the same result.
#[derive(Clone)]
pub struct Deferred {
    ty: TypeHandle,
    inner: Shared<BoxFuture<'static, DeferredResult>>,
}

impl Deferred {
    /// Wrap a future under the given deferred type
    ///
    /// Prefer [`TypeRegistry::deferred`](crate::TypeRegistry::deferred),
    /// which derives the type from the result type.
    pub fn new<F>(ty: TypeHandle, future: F) -> Self
    where
        F: Future<Output = DeferredResult> + Send + 'static,
    {
        Self {
            ty,
            inner: future.boxed().shared(),
        }
    }

    /// Deferred type of this value
    pub fn type_handle(&self) -> TypeHandle {
        self.ty
    }

    /// Result if the computation already completed
    pub fn peek(&self) -> Option<&DeferredResult> {
        self.inner.peek()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl Future for Deferred {
    type Output = DeferredResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("ty", &self.ty)
            .field("completed", &self.peek().is_some())
            .finish()
    }
}
