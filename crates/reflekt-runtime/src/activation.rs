//! Activation and late-bound invocation
//!
//! These are the only paths that run member bodies. Arguments are checked
//! against parameter types before a body sees them; a body can rely on
//! `frame.args` having exactly one value per declared parameter.

use std::future::Future;

use futures::future;
use tracing::trace;

use crate::descriptor::{CallFrame, MethodInfo, ParameterInfo, PropertyInfo, TypeKind};
use crate::error::{HostError, HostResult};
use crate::handle::TypeHandle;
use crate::registry::TypeRegistry;
use crate::value::{Deferred, DeferredResult, Object, Value};

/// What to do when a call supplies fewer arguments than declared parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingArguments {
    /// Fill omitted trailing optional parameters with their defaults
    UseDefaults,
    /// Reject the call with a parameter count mismatch
    #[default]
    Reject,
}

impl TypeRegistry {
    /// Whether `value` may be passed where `ty` is expected
    ///
    /// Null is accepted for every non-primitive type. A parameter typed by a
    /// generic parameter accepts any value.
    pub fn is_value_assignable(&self, value: &Value, ty: TypeHandle) -> bool {
        if ty == TypeHandle::OBJECT {
            return true;
        }
        if self.get(ty).is_some_and(|d| d.is_generic_parameter()) {
            return true;
        }
        match value.runtime_type() {
            None => !ty.is_primitive(),
            Some(actual) => self.is_assignable(actual, ty),
        }
    }

    /// Type name of a value, `null` for null
    pub fn value_type_name(&self, value: &Value) -> String {
        value
            .runtime_type()
            .map(|t| self.type_name(t))
            .unwrap_or_else(|| "null".to_string())
    }

    /// Create an instance of `ty` using its public constructor matching `args`
    ///
    /// Primitive types activated without arguments yield their default value.
    pub fn create_instance(&self, ty: TypeHandle, args: &[Value]) -> HostResult<Value> {
        let desc = self.descriptor(ty)?;
        let fail = |reason: &str| HostError::Activation {
            name: self.type_name(ty),
            reason: reason.to_string(),
        };

        match desc.kind() {
            TypeKind::Interface => return Err(fail("type is an interface")),
            TypeKind::GenericParameter => return Err(fail("type is a generic parameter")),
            TypeKind::Primitive if args.is_empty() => {
                return Ok(match ty {
                    TypeHandle::BOOL => Value::Bool(false),
                    TypeHandle::INT => Value::Int(0),
                    _ => Value::Float(0.0),
                });
            }
            _ => {}
        }
        if desc.is_abstract() {
            return Err(fail("type is abstract"));
        }
        if desc.is_generic_type_definition() {
            return Err(fail("type has open generic parameters"));
        }

        let constructor = desc
            .constructors()
            .iter()
            .filter(|c| c.visibility().is_public())
            .find(|c| {
                c.parameters().len() == args.len()
                    && c.parameters()
                        .iter()
                        .zip(args)
                        .all(|(p, a)| self.is_value_assignable(a, p.parameter_type()))
            })
            .ok_or_else(|| {
                fail(&format!(
                    "no public constructor accepts {} argument(s)",
                    args.len()
                ))
            })?;

        let frame = CallFrame {
            registry: self,
            declaring_type: ty,
            target: None,
            type_arguments: desc.generic_arguments(),
            args,
        };
        let state = (constructor.body())(&frame)?;
        trace!(ty = %ty, args = args.len(), "instance created");
        Ok(Value::Object(Object::from_arc(ty, state)))
    }

    /// Invoke a closed method
    ///
    /// `target` is ignored for static methods. A null target counts as absent.
    pub fn invoke(
        &self,
        method: &MethodInfo,
        target: Option<&Value>,
        args: &[Value],
        missing: MissingArguments,
    ) -> HostResult<Value> {
        let declaring_type = method.declaring_type();
        let declaring = self.descriptor(declaring_type)?;
        if method.is_generic_method_definition() || declaring.is_generic_type_definition() {
            return Err(HostError::OpenGenericInvocation {
                member: method.name().to_string(),
            });
        }

        let target = if method.is_static() {
            None
        } else {
            Some(self.check_target(method.name(), declaring_type, target)?)
        };
        let args = self.bind_arguments(method.name(), method.parameters(), args, missing)?;

        let frame = CallFrame {
            registry: self,
            declaring_type,
            target,
            type_arguments: method.generic_arguments(),
            args: &args,
        };
        trace!(method = %method.name(), ty = %declaring_type, args = args.len(), "invoke");
        (method.body())(&frame)
    }

    /// Read a property through its getter
    pub fn read_property(&self, property: &PropertyInfo, target: Option<&Value>) -> HostResult<Value> {
        let getter = property
            .getter()
            .ok_or_else(|| HostError::PropertyNotReadable {
                name: property.name().to_string(),
            })?;
        if property.is_static() {
            return getter(&Value::Null);
        }
        let target = self.check_target(property.name(), property.declaring_type(), target)?;
        getter(target)
    }

    /// Wrap a future as a deferred value
    ///
    /// The deferred type is `Task` when `result_type` is `None`, `Task<T>`
    /// otherwise.
    pub fn deferred<F>(&self, result_type: Option<TypeHandle>, future: F) -> HostResult<Deferred>
    where
        F: Future<Output = DeferredResult> + Send + 'static,
    {
        let ty = match result_type {
            None => TypeHandle::TASK,
            Some(t) => self.make_generic_type(TypeHandle::TASK_OF, &[t])?,
        };
        Ok(Deferred::new(ty, future))
    }

    /// Deferred value that is already complete
    pub fn completed(&self, result_type: Option<TypeHandle>, value: Value) -> HostResult<Deferred> {
        self.deferred(result_type, future::ready(Ok(value)))
    }

    fn check_target<'v>(
        &self,
        member: &str,
        declaring_type: TypeHandle,
        target: Option<&'v Value>,
    ) -> HostResult<&'v Value> {
        let target = target
            .filter(|t| !t.is_null())
            .ok_or_else(|| HostError::TargetRequired {
                member: member.to_string(),
            })?;
        if !self.is_value_assignable(target, declaring_type) {
            return Err(HostError::TargetType {
                expected: self.type_name(declaring_type),
                actual: self.value_type_name(target),
            });
        }
        Ok(target)
    }

    fn bind_arguments(
        &self,
        member: &str,
        parameters: &[ParameterInfo],
        args: &[Value],
        missing: MissingArguments,
    ) -> HostResult<Vec<Value>> {
        let mismatch = || HostError::ParameterCountMismatch {
            member: member.to_string(),
            expected: parameters.len(),
            actual: args.len(),
        };
        if args.len() > parameters.len() {
            return Err(mismatch());
        }

        let mut bound = Vec::with_capacity(parameters.len());
        for (index, parameter) in parameters.iter().enumerate() {
            let value = match (args.get(index), parameter.default_value(), missing) {
                (Some(arg), _, _) => arg.clone(),
                (None, Some(default), MissingArguments::UseDefaults) => default.clone(),
                _ => return Err(mismatch()),
            };
            if !self.is_value_assignable(&value, parameter.parameter_type()) {
                return Err(HostError::ArgumentType {
                    member: member.to_string(),
                    index,
                    expected: self.type_name(parameter.parameter_type()),
                    actual: self.value_type_name(&value),
                });
            }
            bound.push(value);
        }
        Ok(bound)
    }
}
