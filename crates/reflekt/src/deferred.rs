//! Deferred-result classification
//!
//! A deferred type is `Task`, a closed `Task<T>`, or any type deriving from
//! either. None of these queries fail: null values and unknown handles
//! classify as not deferred.

use reflekt_runtime::{HostType, TypeHandle, Value};

use crate::service::ReflectionService;

/// How a type relates to deferred computations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredResultShape {
    /// Not a deferred type
    NotDeferred,
    /// Deferred without a result value
    Deferred,
    /// Deferred producing a value of the given type
    DeferredWithValue(TypeHandle),
}

impl ReflectionService {
    /// Whether `ty` is `Task` or derives from it
    pub fn is_task(&self, ty: TypeHandle) -> bool {
        self.registry.get(ty).is_some() && self.registry.is_assignable(ty, TypeHandle::TASK)
    }

    /// Whether the value is a deferred computation
    pub fn is_task_value(&self, value: &Value) -> bool {
        value.runtime_type().is_some_and(|t| self.is_task(t))
    }

    /// Whether `ty` is exactly `Task<T>`, open or closed
    ///
    /// Derived types do not count.
    pub fn is_generic_task(&self, ty: TypeHandle) -> bool {
        self.is_constructed_from(ty, TypeHandle::TASK_OF)
    }

    /// Whether `ty` is `Task<T>` or derives from it
    ///
    /// Only answers true once `Task<T>` has been constructed; asking never
    /// adds types to the registry.
    pub fn is_task_of<T: HostType>(&self, ty: TypeHandle) -> bool {
        self.task_of::<T>().is_some_and(|task| {
            self.registry.get(ty).is_some() && self.registry.is_assignable(ty, task)
        })
    }

    /// Whether the value is a deferred computation producing `T`
    pub fn is_task_of_value<T: HostType>(&self, value: &Value) -> bool {
        value.runtime_type().is_some_and(|t| self.is_task_of::<T>(t))
    }

    /// `Task<T>` as found in the hierarchy of `ty`
    pub fn task_type<T: HostType>(&self, ty: TypeHandle) -> Option<TypeHandle> {
        if !self.is_task_of::<T>(ty) {
            return None;
        }
        let task = self.task_of::<T>()?;
        self.self_and_bases(ty).find(|&t| t == task)
    }

    /// `Task<T>` as found in the hierarchy of the value's type
    pub fn task_type_of_value<T: HostType>(&self, value: &Value) -> Option<TypeHandle> {
        self.task_type::<T>(value.runtime_type()?)
    }

    /// Result type of the first closed `Task<T>` in the hierarchy of `ty`
    pub fn task_result_type(&self, ty: TypeHandle) -> Option<TypeHandle> {
        if !self.is_task(ty) {
            return None;
        }
        self.self_and_bases(ty).find_map(|t| {
            let desc = self.registry.get(t)?;
            if self.is_constructed_from(t, TypeHandle::TASK_OF) {
                desc.generic_arguments().first().copied()
            } else {
                None
            }
        })
    }

    /// Result type of a deferred value
    pub fn task_result_type_of_value(&self, value: &Value) -> Option<TypeHandle> {
        self.task_result_type(value.runtime_type()?)
    }

    /// Classify `ty`
    pub fn deferred_shape(&self, ty: TypeHandle) -> DeferredResultShape {
        if !self.is_task(ty) {
            return DeferredResultShape::NotDeferred;
        }
        match self.task_result_type(ty) {
            Some(result) => DeferredResultShape::DeferredWithValue(result),
            None => DeferredResultShape::Deferred,
        }
    }

    /// Classify the type of a value
    pub fn deferred_shape_of_value(&self, value: &Value) -> DeferredResultShape {
        match value.runtime_type() {
            Some(ty) => self.deferred_shape(ty),
            None => DeferredResultShape::NotDeferred,
        }
    }

    fn task_of<T: HostType>(&self) -> Option<TypeHandle> {
        let result = T::host_type(&self.registry)?;
        self.registry.find_generic_type(TypeHandle::TASK_OF, &[result])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reflekt_runtime::TypeRegistry;

    fn service() -> ReflectionService {
        ReflectionService::new(Arc::new(TypeRegistry::new()))
    }

    #[test]
    fn test_classify_types() {
        let service = service();
        let registry = Arc::clone(service.registry());
        let task_string = registry.make_generic_type(TypeHandle::TASK_OF, &[TypeHandle::STRING]).unwrap();

        assert!(service.is_task(TypeHandle::TASK));
        assert!(service.is_task(task_string));
        assert!(!service.is_task(TypeHandle::STRING));
        assert!(!service.is_task(TypeHandle::OBJECT));

        assert!(service.is_generic_task(task_string));
        assert!(!service.is_generic_task(TypeHandle::TASK));
        assert!(service.is_generic_task(TypeHandle::TASK_OF));

        assert!(service.is_task_of::<String>(task_string));
        assert!(!service.is_task_of::<i64>(task_string));
        assert!(!service.is_task_of::<Value>(task_string));

        assert_eq!(service.task_type::<String>(task_string), Some(task_string));
        assert_eq!(service.task_type::<i64>(task_string), None);
        assert_eq!(service.task_result_type(task_string), Some(TypeHandle::STRING));
        assert_eq!(service.task_result_type(TypeHandle::TASK), None);

        assert_eq!(service.deferred_shape(TypeHandle::INT), DeferredResultShape::NotDeferred);
        assert_eq!(service.deferred_shape(TypeHandle::TASK), DeferredResultShape::Deferred);
        assert_eq!(
            service.deferred_shape(task_string),
            DeferredResultShape::DeferredWithValue(TypeHandle::STRING)
        );
    }

    #[test]
    fn test_derived_task_types() {
        let service = service();
        let registry = Arc::clone(service.registry());
        let task_int = registry.make_generic_type(TypeHandle::TASK_OF, &[TypeHandle::INT]).unwrap();
        let unit = registry.define_unit("app");
        let mut job = registry.define_class(unit, "CountingJob");
        job.extends(task_int);
        let job = job.build().unwrap();

        assert!(service.is_task(job));
        assert!(!service.is_generic_task(job));
        assert!(service.is_task_of::<i64>(job));
        assert_eq!(service.task_type::<i64>(job), Some(task_int));
        assert_eq!(service.task_result_type(job), Some(TypeHandle::INT));
    }

    #[test]
    fn test_queries_do_not_construct_task_types() {
        let service = service();
        let registry = Arc::clone(service.registry());
        let task_string = registry.make_generic_type(TypeHandle::TASK_OF, &[TypeHandle::STRING]).unwrap();
        let before = registry.len();

        assert!(!service.is_task_of::<i64>(task_string));
        assert!(!service.is_task_of::<bool>(TypeHandle::TASK));
        assert_eq!(service.task_type::<f64>(task_string), None);
        assert!(!service.is_task_of_value::<i64>(&Value::Int(1)));
        assert_eq!(registry.len(), before);
        assert_eq!(registry.find_generic_type(TypeHandle::TASK_OF, &[TypeHandle::INT]), None);
    }

    #[test]
    fn test_classify_values() {
        let service = service();
        let registry = Arc::clone(service.registry());
        let deferred = Value::Deferred(registry.completed(Some(TypeHandle::STRING), "x".into()).unwrap());
        let plain = Value::Deferred(registry.completed(None, Value::Null).unwrap());

        assert!(service.is_task_value(&deferred));
        assert!(service.is_task_value(&plain));
        assert!(!service.is_task_value(&Value::Null));
        assert!(!service.is_task_value(&Value::Int(1)));

        assert!(service.is_task_of_value::<String>(&deferred));
        assert!(!service.is_task_of_value::<String>(&plain));
        assert_eq!(service.task_result_type_of_value(&deferred), Some(TypeHandle::STRING));
        assert_eq!(service.task_type_of_value::<String>(&Value::Null), None);
        assert_eq!(service.deferred_shape_of_value(&plain), DeferredResultShape::Deferred);
        assert_eq!(service.deferred_shape_of_value(&Value::Null), DeferredResultShape::NotDeferred);
    }

    #[test]
    fn test_unknown_handles_are_not_deferred() {
        let service = service();
        let registry = Arc::clone(service.registry());
        let unit = registry.define_unit("app");
        // A declaration in progress has a handle but no descriptor yet
        let pending = registry.define_class(unit, "Pending");
        assert!(!service.is_task(pending.handle()));
        assert_eq!(service.deferred_shape(pending.handle()), DeferredResultShape::NotDeferred);
    }
}
