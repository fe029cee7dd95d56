use std::sync::Arc;
use std::thread;

use reflekt_runtime::{
    BindingFlags, ConstructorDefinition, HostError, MethodDefinition, MissingArguments,
    ParameterDefinition, PropertyDefinition, TypeHandle, TypeRegistry, Value,
};

struct Boxed {
    item: Value,
}

// A generic container `Box<T>` with a constructor, a getter and a method
// whose signatures mention T.
fn box_definition(registry: &TypeRegistry) -> TypeHandle {
    let unit = registry.define_unit("containers");
    let mut boxed = registry.define_class(unit, "Box");
    let t = boxed.generic_parameter("T");
    boxed
        .constructor(
            ConstructorDefinition::new(|frame| {
                Ok(Boxed {
                    item: frame.arg(0).clone(),
                })
            })
            .param(ParameterDefinition::new("item", t)),
        )
        .property(
            PropertyDefinition::new("Item", t)
                .getter(|this| Ok(this.state::<Boxed>()?.item.clone())),
        )
        .method(
            MethodDefinition::new("Replace")
                .param(ParameterDefinition::new("item", t))
                .returns(t)
                .body(|frame| {
                    let _ = frame.this().state::<Boxed>()?;
                    Ok(frame.arg(0).clone())
                }),
        );
    boxed.build().unwrap()
}

// ============================================================================
// Generic Activation Tests
// ============================================================================

#[test]
fn test_constructed_type_signatures() {
    let registry = TypeRegistry::new();
    let definition = box_definition(&registry);
    let box_int = registry.make_generic_type(definition, &[TypeHandle::INT]).unwrap();
    assert_eq!(registry.type_name(box_int), "Box<int>");

    let desc = registry.descriptor(box_int).unwrap();
    assert_eq!(desc.declared_properties()[0].property_type(), TypeHandle::INT);
    assert_eq!(desc.constructors()[0].parameters()[0].parameter_type(), TypeHandle::INT);
    assert_eq!(desc.declared_methods()[0].return_type(), Some(TypeHandle::INT));

    // Constructed types are not listed in their definition's unit
    assert_eq!(registry.unit_types(desc.unit()), vec![definition]);
}

#[test]
fn test_activate_and_invoke_constructed_type() {
    let registry = TypeRegistry::new();
    let definition = box_definition(&registry);
    let box_int = registry.make_generic_type(definition, &[TypeHandle::INT]).unwrap();

    let instance = registry.create_instance(box_int, &[Value::Int(5)]).unwrap();
    let desc = registry.descriptor(box_int).unwrap();
    let item = registry
        .read_property(&desc.declared_properties()[0], Some(&instance))
        .unwrap();
    assert_eq!(item, Value::Int(5));

    let replace = &desc.declared_methods()[0];
    let replaced = registry
        .invoke(replace, Some(&instance), &[Value::Int(9)], MissingArguments::UseDefaults)
        .unwrap();
    assert_eq!(replaced, Value::Int(9));

    let err = registry
        .invoke(replace, Some(&instance), &["nine".into()], MissingArguments::UseDefaults)
        .unwrap_err();
    assert!(matches!(err, HostError::ArgumentType { .. }));

    assert!(matches!(
        registry.create_instance(box_int, &["five".into()]),
        Err(HostError::Activation { .. })
    ));
}

#[test]
fn test_open_definition_cannot_be_invoked() {
    let registry = TypeRegistry::new();
    let definition = box_definition(&registry);
    let desc = registry.descriptor(definition).unwrap();
    let replace = &desc.declared_methods()[0];
    let target = Value::Null;

    assert!(matches!(
        registry.invoke(replace, Some(&target), &[Value::Int(1)], MissingArguments::UseDefaults),
        Err(HostError::OpenGenericInvocation { .. })
    ));
}

#[test]
fn test_find_generic_type_does_not_construct() {
    let registry = TypeRegistry::new();
    let definition = box_definition(&registry);
    let before = registry.len();

    assert_eq!(registry.find_generic_type(definition, &[TypeHandle::INT]), None);
    assert_eq!(registry.len(), before);

    let box_int = registry.make_generic_type(definition, &[TypeHandle::INT]).unwrap();
    assert_eq!(registry.find_generic_type(definition, &[TypeHandle::INT]), Some(box_int));
    assert_eq!(registry.find_generic_type(definition, &[TypeHandle::STRING]), None);
    assert_eq!(registry.len(), before + 1);
}

#[test]
fn test_concurrent_construction_interns_once() {
    let registry = Arc::new(TypeRegistry::new());
    let definition = box_definition(&registry);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .make_generic_type(definition, &[TypeHandle::STRING])
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<TypeHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

// ============================================================================
// Member Enumeration Tests
// ============================================================================

#[test]
fn test_inherited_generic_members_are_closed() {
    let registry = TypeRegistry::new();
    let definition = box_definition(&registry);
    let box_string = registry.make_generic_type(definition, &[TypeHandle::STRING]).unwrap();

    let unit = registry.define_unit("app");
    let mut label = registry.define_class(unit, "Label");
    label.extends(box_string);
    let label = label.build().unwrap();

    let props = registry.properties(label, BindingFlags::DEFAULT_LOOKUP).unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].property_type(), TypeHandle::STRING);
    assert_eq!(props[0].declaring_type(), box_string);

    let methods = registry.methods(label, BindingFlags::ALL_INSTANCE).unwrap();
    assert_eq!(methods.len(), 1);
    assert!(registry.is_assignable(label, box_string));
    assert!(!registry.is_assignable(label, definition));
}
