//! Late-bound method dispatch
//!
//! Methods are selected by name and argument shape. A null target selects
//! among static methods, any other target among instance methods; public
//! and non-public methods are both considered. The first method in host
//! order that fits wins. There is no overload ranking.

use reflekt_runtime::{BindingFlags, Deferred, MethodInfo, TypeHandle, Value};
use tracing::{debug, trace, warn};

use crate::error::{ReflectError, Result};
use crate::service::ReflectionService;

/// Shape of a method as seen by candidate filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCandidate<'m> {
    /// Method name
    pub name: &'m str,
    /// Declared with unbound type parameters
    pub is_generic_definition: bool,
    /// Number of type parameters
    pub generic_arity: usize,
    /// Number of declared parameters
    pub total_parameters: usize,
    /// Number of parameters without a default
    pub required_parameters: usize,
    /// Static method
    pub is_static: bool,
}

impl<'m> MethodCandidate<'m> {
    /// Shape of `method`
    pub fn of(method: &'m MethodInfo) -> Self {
        Self {
            name: method.name(),
            is_generic_definition: method.is_generic_method_definition(),
            generic_arity: method.generic_arity(),
            total_parameters: method.parameters().len(),
            required_parameters: method.required_parameter_count(),
            is_static: method.is_static(),
        }
    }

    /// Whether `arg_count` arguments can bind to the parameters
    pub fn accepts_arguments(&self, arg_count: usize) -> bool {
        self.total_parameters >= arg_count && self.required_parameters <= arg_count
    }

    /// Whether this is a generic definition with `arity` type parameters
    pub fn accepts_type_arguments(&self, arity: usize) -> bool {
        self.is_generic_definition && self.generic_arity == arity
    }
}

impl ReflectionService {
    /// Invoke a generic method by name
    ///
    /// Fails with `MissingArgument` when `object_type` is absent, when
    /// `method_name` is absent or blank, or when `generic_types` is absent
    /// or empty (checked in that order), and with `MethodNotFound` when no
    /// generic definition fits.
    pub fn invoke_generic_method(
        &self,
        object_type: Option<TypeHandle>,
        target: Option<&Value>,
        method_name: Option<&str>,
        generic_types: Option<&[TypeHandle]>,
        args: &[Value],
    ) -> Result<Value> {
        let object_type = object_type.ok_or(ReflectError::missing("objectType"))?;
        let method_name = require_name(method_name)?;
        let generic_types = generic_types
            .filter(|g| !g.is_empty())
            .ok_or(ReflectError::missing("genericTypes"))?;

        let method = self.select_method(object_type, target, method_name, Some(generic_types.len()), args.len())?;
        let closed = self.registry.make_generic_method(&method, generic_types)?;
        Ok(self.registry.invoke(&closed, target, args, self.missing_arguments)?)
    }

    /// Invoke a generic method by name and hand back its deferred result
    ///
    /// The deferred value is not awaited. A result that is not deferred
    /// yields `None`.
    pub fn invoke_generic_method_async(
        &self,
        object_type: Option<TypeHandle>,
        target: Option<&Value>,
        method_name: Option<&str>,
        generic_types: Option<&[TypeHandle]>,
        args: &[Value],
    ) -> Result<Option<Deferred>> {
        let result = self.invoke_generic_method(object_type, target, method_name, generic_types, args)?;
        Ok(narrow_to_deferred(method_name.unwrap_or_default(), result))
    }

    /// Invoke a method by name without binding type arguments
    pub fn invoke_non_generic_method(
        &self,
        object_type: Option<TypeHandle>,
        target: Option<&Value>,
        method_name: Option<&str>,
        args: &[Value],
    ) -> Result<Value> {
        let object_type = object_type.ok_or(ReflectError::missing("objectType"))?;
        let method_name = require_name(method_name)?;

        let method = self.select_method(object_type, target, method_name, None, args.len())?;
        Ok(self.registry.invoke(&method, target, args, self.missing_arguments)?)
    }

    /// Invoke a method by name and hand back its deferred result
    pub fn invoke_non_generic_method_async(
        &self,
        object_type: Option<TypeHandle>,
        target: Option<&Value>,
        method_name: Option<&str>,
        args: &[Value],
    ) -> Result<Option<Deferred>> {
        let result = self.invoke_non_generic_method(object_type, target, method_name, args)?;
        Ok(narrow_to_deferred(method_name.unwrap_or_default(), result))
    }

    /// Invoke a method handle directly
    pub fn invoke(&self, target: Option<&Value>, method: Option<&MethodInfo>, args: &[Value]) -> Result<Value> {
        let method = method.ok_or(ReflectError::missing("method"))?;
        Ok(self.registry.invoke(method, target, args, self.missing_arguments)?)
    }

    /// Invoke a method handle directly and hand back its deferred result
    pub fn invoke_async(
        &self,
        target: Option<&Value>,
        method: Option<&MethodInfo>,
        args: &[Value],
    ) -> Result<Option<Deferred>> {
        let name = method.map(|m| m.name().to_string()).unwrap_or_default();
        let result = self.invoke(target, method, args)?;
        Ok(narrow_to_deferred(&name, result))
    }

    /// First method of `object_type` in the target's scope that fits
    ///
    /// `generic_arity` is `Some` for generic dispatch.
    fn select_method(
        &self,
        object_type: TypeHandle,
        target: Option<&Value>,
        method_name: &str,
        generic_arity: Option<usize>,
        arg_count: usize,
    ) -> Result<MethodInfo> {
        let scope = match target {
            Some(t) if !t.is_null() => BindingFlags::ALL_INSTANCE,
            _ => BindingFlags::ALL_STATIC,
        };

        let selected = self
            .registry
            .methods(object_type, scope)?
            .into_iter()
            .find(|method| {
                let candidate = MethodCandidate::of(method);
                if candidate.name != method_name {
                    return false;
                }
                let fits = generic_arity.map_or(true, |n| candidate.accepts_type_arguments(n))
                    && candidate.accepts_arguments(arg_count);
                if !fits {
                    trace!(?candidate, args = arg_count, "candidate rejected");
                }
                fits
            });

        match selected {
            Some(method) => {
                debug!(
                    ty = %object_type,
                    method = method_name,
                    is_static = method.is_static(),
                    parameters = method.parameters().len(),
                    "method selected"
                );
                Ok(method)
            }
            None => Err(ReflectError::MethodNotFound {
                method_name: method_name.to_string(),
            }),
        }
    }
}

fn require_name(method_name: Option<&str>) -> Result<&str> {
    match method_name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(ReflectError::missing("methodName")),
    }
}

fn narrow_to_deferred(method_name: &str, result: Value) -> Option<Deferred> {
    match result {
        Value::Deferred(deferred) => Some(deferred),
        Value::Null => None,
        other => {
            warn!(method = method_name, result = ?other, "result is not deferred");
            None
        }
    }
}
