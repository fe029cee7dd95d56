use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::executor::block_on;
use reflekt::runtime::{
    AttributeTarget, BindingFlags, ConstructorDefinition, MethodDefinition, ParameterDefinition,
    PropertyDefinition, TypeHandle, TypeRegistry, UnitHandle, Value, Visibility,
};
use reflekt::{DeferredResultShape, ReflectError, ReflectionOptions, ReflectionService};

// Marker attributes used by the fixtures
#[derive(Debug)]
struct Mandatory;

#[derive(Debug)]
struct DisplayName(&'static str);

struct Customer {
    id: i64,
    name: String,
}

fn new_service() -> (ReflectionService, Arc<TypeRegistry>, UnitHandle) {
    let registry = Arc::new(TypeRegistry::new());
    let unit = registry.define_unit("crm");
    (ReflectionService::new(Arc::clone(&registry)), registry, unit)
}

fn property_names(props: &[reflekt::runtime::PropertyInfo]) -> Vec<&str> {
    props.iter().map(|p| p.name()).collect()
}

// ============================================================================
// Property Discovery Tests
// ============================================================================

#[test]
fn test_class_properties_in_host_order() {
    let (service, registry, unit) = new_service();

    let mut entity = registry.define_class(unit, "Entity");
    entity
        .abstract_type()
        .property(PropertyDefinition::new("Id", TypeHandle::INT))
        .property(PropertyDefinition::new("Version", TypeHandle::INT).as_static())
        .property(PropertyDefinition::new("Secret", TypeHandle::STRING).visibility(Visibility::Private));
    let entity = entity.build().unwrap();

    let mut customer = registry.define_class(unit, "Customer");
    customer
        .extends(entity)
        .property(PropertyDefinition::new("Name", TypeHandle::STRING))
        .property(PropertyDefinition::new("Count", TypeHandle::INT).as_static());
    let customer = customer.build().unwrap();

    let props = service.properties(Some(customer), None).unwrap();
    assert_eq!(property_names(&props), vec!["Name", "Count", "Id"]);

    let instance_only = service
        .properties(Some(customer), Some(BindingFlags::PUBLIC | BindingFlags::INSTANCE))
        .unwrap();
    assert_eq!(property_names(&instance_only), vec!["Name", "Id"]);
}

#[test]
fn test_interface_properties_breadth_first_with_prepend() {
    let (service, registry, unit) = new_service();

    let mut k = registry.define_interface(unit, "K");
    k.property(PropertyDefinition::new("p", TypeHandle::STRING));
    let k = k.build().unwrap();

    let mut j = registry.define_interface(unit, "J");
    j.implements(k)
        .property(PropertyDefinition::new("q", TypeHandle::STRING));
    let j = j.build().unwrap();

    let mut i = registry.define_interface(unit, "I");
    i.implements(j)
        .property(PropertyDefinition::new("r", TypeHandle::STRING));
    let i = i.build().unwrap();

    let props = service.properties(Some(i), None).unwrap();
    assert_eq!(property_names(&props), vec!["p", "q", "r"]);
    assert_eq!(props[0].declaring_type(), k);
    assert_eq!(props[2].declaring_type(), i);
}

#[test]
fn test_interface_properties_visit_shared_bases_once() {
    let (service, registry, unit) = new_service();

    let mut named = registry.define_interface(unit, "INamed");
    named.property(PropertyDefinition::new("Name", TypeHandle::STRING));
    let named = named.build().unwrap();

    let mut left = registry.define_interface(unit, "ILeft");
    left.implements(named)
        .property(PropertyDefinition::new("Left", TypeHandle::INT));
    let left = left.build().unwrap();

    let mut right = registry.define_interface(unit, "IRight");
    right
        .implements(named)
        .property(PropertyDefinition::new("Right", TypeHandle::INT));
    let right = right.build().unwrap();

    let mut both = registry.define_interface(unit, "IBoth");
    both.implements(left)
        .implements(right)
        .property(PropertyDefinition::new("Both", TypeHandle::INT));
    let both = both.build().unwrap();

    // Visit order: IBoth, ILeft, INamed, IRight; each visit prepends
    let props = service.properties(Some(both), None).unwrap();
    assert_eq!(property_names(&props), vec!["Right", "Name", "Left", "Both"]);
}

#[test]
fn test_property_values_of_instance() {
    let (service, registry, unit) = new_service();

    let mut customer = registry.define_class(unit, "Customer");
    customer
        .constructor(
            ConstructorDefinition::new(|frame| {
                Ok(Customer {
                    id: frame.arg(0).as_int().unwrap_or_default(),
                    name: frame.arg(1).as_str().unwrap_or_default().to_string(),
                })
            })
            .param(ParameterDefinition::new("id", TypeHandle::INT))
            .param(ParameterDefinition::new("name", TypeHandle::STRING)),
        )
        .property(
            PropertyDefinition::new("Id", TypeHandle::INT)
                .getter(|this| Ok(this.state::<Customer>()?.id.into())),
        )
        .property(
            PropertyDefinition::new("Name", TypeHandle::STRING)
                .getter(|this| Ok(this.state::<Customer>()?.name.clone().into())),
        );
    let customer = customer.build().unwrap();

    let instance = service
        .create_instance(customer, &[Value::Int(7), "Ada".into()])
        .unwrap();
    let values = service.property_values(Some(&instance)).unwrap();
    assert_eq!(
        values,
        vec![
            ("Id".to_string(), Value::Int(7)),
            ("Name".to_string(), Value::from("Ada")),
        ]
    );
    assert!(service.property_values(Some(&Value::Null)).unwrap().is_empty());
}

// ============================================================================
// Type Discovery Tests
// ============================================================================

#[test]
fn test_types_from_base_type_in_unit() {
    let (service, registry, unit) = new_service();
    let other = registry.define_unit("billing");

    let mut handler = registry.define_class(unit, "Handler");
    handler.abstract_type();
    let handler = handler.build().unwrap();

    let mut email = registry.define_class(unit, "EmailHandler");
    email.extends(handler);
    let email = email.build().unwrap();

    let mut hidden = registry.define_class(unit, "HiddenHandler");
    hidden.extends(handler).visibility(Visibility::Internal);
    hidden.build().unwrap();

    let mut sms = registry.define_class(unit, "SmsHandler");
    sms.extends(email);
    let sms = sms.build().unwrap();

    registry.define_class(unit, "Unrelated").build().unwrap();

    let mut invoice = registry.define_class(other, "InvoiceHandler");
    invoice.extends(handler);
    invoice.build().unwrap();

    assert_eq!(service.types_from_base_type_in_unit(handler, unit), vec![email, sms]);
    assert_eq!(service.types_from_base_type_in_unit(email, unit), vec![email, sms]);
    assert_eq!(service.types_from_base_in_unit::<Value>(unit).len(), 3);
}

// ============================================================================
// Generic Dispatch Tests
// ============================================================================

struct Repository {
    calls: Arc<AtomicUsize>,
}

fn repository_type(registry: &TypeRegistry, unit: UnitHandle) -> TypeHandle {
    let mut repository = registry.define_class(unit, "Repository");
    let t = repository.method_generic_parameter("T");
    let u = repository.method_generic_parameter("U");
    repository
        .constructor(ConstructorDefinition::new(|_| {
            Ok(Repository {
                calls: Arc::new(AtomicUsize::new(0)),
            })
        }))
        .method(
            MethodDefinition::new("Count")
                .generic(t.clone())
                .returns(TypeHandle::INT)
                .body(|frame| {
                    let repo = frame.this().state::<Repository>()?;
                    repo.calls.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(frame.type_arguments, &[TypeHandle::INT]);
                    Ok(Value::Int(42))
                }),
        )
        .method(MethodDefinition::new("Save").param(ParameterDefinition::new("item", TypeHandle::OBJECT)))
        .method(
            MethodDefinition::new("Convert")
                .generic(t.clone())
                .generic(u.clone())
                .param(ParameterDefinition::new("value", t.handle))
                .returns(u.handle)
                .body(|frame| Ok(frame.arg(0).clone())),
        )
        .method(
            MethodDefinition::new("LoadAsync")
                .generic(t)
                .param(ParameterDefinition::new("key", TypeHandle::STRING))
                .returns(TypeHandle::TASK)
                .body(|frame| {
                    let key = frame.arg(0).as_str().unwrap_or_default().to_string();
                    let deferred = frame
                        .registry
                        .completed(Some(TypeHandle::STRING), format!("loaded:{}", key).into())?;
                    Ok(Value::Deferred(deferred))
                }),
        );
    repository.build().unwrap()
}

#[test]
fn test_generic_instance_method_invoked_once() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);
    let instance = service.create_instance(repository, &[]).unwrap();

    let result = service
        .invoke_generic_method(
            Some(repository),
            Some(&instance),
            Some("Count"),
            Some(&[TypeHandle::INT]),
            &[],
        )
        .unwrap();

    assert_eq!(result, Value::Int(42));
    let calls = &instance.state::<Repository>().unwrap().calls;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_generic_dispatch_matches_arity() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);
    let instance = service.create_instance(repository, &[]).unwrap();

    let result = service
        .invoke_generic_method(
            Some(repository),
            Some(&instance),
            Some("Convert"),
            Some(&[TypeHandle::STRING, TypeHandle::OBJECT]),
            &["abc".into()],
        )
        .unwrap();
    assert_eq!(result, Value::from("abc"));
}

#[test]
fn test_non_generic_name_is_not_found() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);
    let instance = service.create_instance(repository, &[]).unwrap();

    let err = service
        .invoke_generic_method(
            Some(repository),
            Some(&instance),
            Some("Save"),
            Some(&[TypeHandle::INT]),
            &[Value::Int(1)],
        )
        .unwrap_err();

    assert!(matches!(err, ReflectError::MethodNotFound { .. }));
    assert_eq!(err.method_name(), Some("Save"));
    assert_eq!(err.to_string(), "Method 'Save' not found");
}

#[test]
fn test_missing_object_type() {
    let (service, _, _) = new_service();
    let err = service
        .invoke_generic_method(None, None, Some("Count"), Some(&[TypeHandle::INT]), &[])
        .unwrap_err();
    assert_eq!(err.parameter(), Some("objectType"));
}

#[test]
fn test_missing_method_name() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);

    for name in [None, Some(""), Some("    ")] {
        let err = service
            .invoke_generic_method(Some(repository), None, name, Some(&[TypeHandle::INT]), &[])
            .unwrap_err();
        assert_eq!(err.parameter(), Some("methodName"), "name = {:?}", name);
    }
}

#[test]
fn test_missing_generic_types() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);

    let err = service
        .invoke_generic_method(Some(repository), None, Some("Count"), None, &[])
        .unwrap_err();
    assert_eq!(err.parameter(), Some("genericTypes"));

    let err = service
        .invoke_generic_method(Some(repository), None, Some("Count"), Some(&[]), &[])
        .unwrap_err();
    assert_eq!(err.parameter(), Some("genericTypes"));
}

#[test]
fn test_validation_order() {
    let (service, _, _) = new_service();
    let err = service
        .invoke_generic_method(None, None, None, None, &[])
        .unwrap_err();
    assert_eq!(err.parameter(), Some("objectType"));
}

#[test]
fn test_generic_async_returns_unawaited_deferred() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);
    let instance = service.create_instance(repository, &[]).unwrap();

    let deferred = service
        .invoke_generic_method_async(
            Some(repository),
            Some(&instance),
            Some("LoadAsync"),
            Some(&[TypeHandle::STRING]),
            &["42".into()],
        )
        .unwrap()
        .expect("deferred result");

    let value = Value::Deferred(deferred.clone());
    assert!(service.is_task_value(&value));
    assert_eq!(service.task_result_type_of_value(&value), Some(TypeHandle::STRING));
    assert_eq!(block_on(deferred).unwrap(), Value::from("loaded:42"));
}

fn job_type(registry: &TypeRegistry, unit: UnitHandle, started: Arc<AtomicBool>) -> TypeHandle {
    let mut job = registry.define_class(unit, "Job");
    job.method(
        MethodDefinition::new("RunAsync")
            .as_static()
            .returns(TypeHandle::TASK)
            .body(move |frame| {
                let started = Arc::clone(&started);
                let deferred = frame.registry.deferred(None, async move {
                    started.store(true, Ordering::SeqCst);
                    Ok::<_, reflekt::runtime::HostError>(Value::Null)
                })?;
                Ok(Value::Deferred(deferred))
            }),
    );
    job.build().unwrap()
}

#[test]
fn test_non_generic_async_does_not_await() {
    let (service, registry, unit) = new_service();
    let started = Arc::new(AtomicBool::new(false));
    let job = job_type(&registry, unit, Arc::clone(&started));

    let deferred = service
        .invoke_non_generic_method_async(Some(job), None, Some("RunAsync"), &[])
        .unwrap()
        .expect("deferred result");

    assert!(!started.load(Ordering::SeqCst));
    assert!(deferred.peek().is_none());
    assert_eq!(deferred.type_handle(), TypeHandle::TASK);

    assert_eq!(block_on(deferred).unwrap(), Value::Null);
    assert!(started.load(Ordering::SeqCst));
}

#[test]
fn test_invoke_async_does_not_await() {
    let (service, registry, unit) = new_service();
    let started = Arc::new(AtomicBool::new(false));
    let job = job_type(&registry, unit, Arc::clone(&started));
    let run = registry
        .methods(job, BindingFlags::ALL_STATIC)
        .unwrap()
        .into_iter()
        .find(|m| m.name() == "RunAsync")
        .unwrap();

    let deferred = service
        .invoke_async(None, Some(&run), &[])
        .unwrap()
        .expect("deferred result");

    assert!(!started.load(Ordering::SeqCst));
    assert!(service.is_task_value(&Value::Deferred(deferred.clone())));

    block_on(deferred).unwrap();
    assert!(started.load(Ordering::SeqCst));
}

#[test]
fn test_host_errors_pass_through() {
    let (service, registry, unit) = new_service();
    let repository = repository_type(&registry, unit);
    let instance = service.create_instance(repository, &[]).unwrap();

    // Convert<int, string>("abc"): the argument does not fit T = int
    let err = service
        .invoke_generic_method(
            Some(repository),
            Some(&instance),
            Some("Convert"),
            Some(&[TypeHandle::INT, TypeHandle::STRING]),
            &["abc".into()],
        )
        .unwrap_err();
    assert!(matches!(
        err.host_error(),
        Some(reflekt::runtime::HostError::ArgumentType { index: 0, .. })
    ));
}

// ============================================================================
// Options Tests
// ============================================================================

#[test]
fn test_reject_missing_optional_arguments() {
    let registry = Arc::new(TypeRegistry::new());
    let unit = registry.define_unit("app");
    let mut greeter = registry.define_class(unit, "Greeter");
    greeter.method(
        MethodDefinition::new("Greet")
            .as_static()
            .param(ParameterDefinition::new("name", TypeHandle::STRING))
            .param(ParameterDefinition::new("greeting", TypeHandle::STRING).optional("Hello"))
            .returns(TypeHandle::STRING)
            .body(|frame| {
                let name = frame.arg(0).as_str().unwrap_or_default();
                let greeting = frame.arg(1).as_str().unwrap_or_default();
                Ok(format!("{}, {}", greeting, name).into())
            }),
    );
    let greeter = greeter.build().unwrap();

    let strict = ReflectionService::new(Arc::clone(&registry));
    let err = strict
        .invoke_non_generic_method(Some(greeter), None, Some("Greet"), &["Bob".into()])
        .unwrap_err();
    assert!(matches!(
        err.host_error(),
        Some(reflekt::runtime::HostError::ParameterCountMismatch { expected: 2, actual: 1, .. })
    ));
    assert_eq!(
        strict
            .invoke_non_generic_method(Some(greeter), None, Some("Greet"), &["Bob".into(), "Hi".into()])
            .unwrap(),
        Value::from("Hi, Bob")
    );

    let options = ReflectionOptions::from_str("missing_optional_arguments = \"use-defaults\"").unwrap();
    let lenient = ReflectionService::with_options(Arc::clone(&registry), &options).unwrap();
    assert_eq!(
        lenient
            .invoke_non_generic_method(Some(greeter), None, Some("Greet"), &["Bob".into()])
            .unwrap(),
        Value::from("Hello, Bob")
    );
}

// ============================================================================
// Deferred Classification Tests
// ============================================================================

#[test]
fn test_deferred_string_round_trip() {
    let (service, registry, _) = new_service();
    let deferred = registry
        .completed(Some(TypeHandle::STRING), "payload".into())
        .unwrap();
    let value = Value::Deferred(deferred);

    assert!(service.is_task_value(&value));
    assert_eq!(service.task_result_type_of_value(&value), Some(TypeHandle::STRING));
    assert_eq!(
        service.deferred_shape_of_value(&value),
        DeferredResultShape::DeferredWithValue(TypeHandle::STRING)
    );

    let plain = Value::from("not deferred");
    assert!(!service.is_task_value(&plain));
    assert_eq!(service.task_result_type_of_value(&plain), None);
}

// ============================================================================
// Attribute Tests
// ============================================================================

#[test]
fn test_missing_attributes_are_none() {
    let (service, registry, unit) = new_service();

    let mut contact = registry.define_class(unit, "Contact");
    contact
        .attribute(DisplayName("Contact"))
        .property(PropertyDefinition::new("Email", TypeHandle::STRING).attribute(DisplayName("E-mail")))
        .method(
            MethodDefinition::new("Notify")
                .param(ParameterDefinition::new("message", TypeHandle::STRING)),
        );
    let contact = contact.build().unwrap();

    let desc = registry.descriptor(contact).unwrap();
    let email = &desc.declared_properties()[0];
    let notify = &desc.declared_methods()[0];
    let message = &notify.parameters()[0];

    assert!(service.type_attribute::<Mandatory>(Some(contact)).is_none());
    assert!(service.custom_attribute::<Mandatory>(Some(email)).is_none());
    assert!(service.custom_attribute::<Mandatory>(Some(message)).is_none());

    let display = service.custom_attribute::<DisplayName>(Some(email)).unwrap();
    assert_eq!(display.0, "E-mail");
    assert_eq!(email.attribute::<DisplayName>().map(|d| d.0), Some("E-mail"));
    assert_eq!(service.type_attribute::<DisplayName>(Some(contact)).map(|d| d.0), Some("Contact"));
}
