//! Type Registry
//!
//! Owns every type descriptor of the host runtime. Types are addressed by
//! [`TypeHandle`] and grouped into code units. Handles are allocated
//! sequentially; a handle is reserved when a declaration starts and becomes
//! resolvable once the declaration is published.
//!
//! Descriptor lookups take a short read lock and hand out `Arc`s, so callers
//! never hold the lock while running member bodies.

use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::binding::BindingFlags;
use crate::builder::{empty_state, TypeBuilder};
use crate::descriptor::{
    ConstructorDescriptor, ConstructorInfo, FieldInfo, GenericParameter, MethodInfo,
    PropertyInfo, TypeDescriptor, TypeKind, Visibility,
};
use crate::error::{HostError, HostResult};
use crate::handle::{TypeHandle, UnitHandle};

/// A named collection of types
#[derive(Debug, Clone)]
struct CodeUnit {
    name: String,
    types: Vec<TypeHandle>,
}

#[derive(Default)]
struct RegistryState {
    /// Descriptor slots; `None` while a declaration is in progress
    types: Vec<Option<Arc<TypeDescriptor>>>,
    /// (unit, name) -> declared type
    names: FxHashMap<(UnitHandle, String), TypeHandle>,
    units: Vec<CodeUnit>,
    /// (definition, arguments) -> constructed type
    constructed: FxHashMap<(TypeHandle, Vec<TypeHandle>), TypeHandle>,
}

/// Registry of all types known to the host runtime
pub struct TypeRegistry {
    state: RwLock<RegistryState>,
    /// Serializes generic construction; re-entrant for self-referential generics
    pub(crate) construction: ReentrantMutex<()>,
}

impl TypeRegistry {
    /// Create a registry holding the well-known types in the core unit
    pub fn new() -> Self {
        let registry = Self {
            state: RwLock::new(RegistryState::default()),
            construction: ReentrantMutex::new(()),
        };
        registry.install_well_known();
        registry
    }

    fn install_well_known(&self) {
        let mut state = self.state.write();
        state.units.push(CodeUnit {
            name: "core".to_string(),
            types: Vec::new(),
        });

        let object_ctor = ConstructorInfo(Arc::new(ConstructorDescriptor {
            declaring_type: TypeHandle::OBJECT,
            visibility: Visibility::Public,
            parameters: Vec::new(),
            attributes: Vec::new(),
            body: Arc::new(empty_state),
        }));
        let task_param = GenericParameter {
            handle: TypeHandle::TASK_RESULT_PARAM,
            name: "TResult".to_string(),
            constraints: Vec::new(),
        };

        let entries = [
            (TypeHandle::OBJECT, "object", TypeKind::Class, None),
            (TypeHandle::BOOL, "bool", TypeKind::Primitive, Some(TypeHandle::OBJECT)),
            (TypeHandle::INT, "int", TypeKind::Primitive, Some(TypeHandle::OBJECT)),
            (TypeHandle::FLOAT, "float", TypeKind::Primitive, Some(TypeHandle::OBJECT)),
            (TypeHandle::STRING, "string", TypeKind::Class, Some(TypeHandle::OBJECT)),
            (TypeHandle::TASK, "Task", TypeKind::Class, Some(TypeHandle::OBJECT)),
            (TypeHandle::TASK_OF, "Task", TypeKind::Class, Some(TypeHandle::TASK)),
            (
                TypeHandle::TASK_RESULT_PARAM,
                "TResult",
                TypeKind::GenericParameter,
                Some(TypeHandle::OBJECT),
            ),
        ];
        debug_assert_eq!(entries.len(), TypeHandle::WELL_KNOWN_COUNT);

        for (handle, name, kind, base) in entries {
            let mut desc = TypeDescriptor {
                handle,
                name: name.to_string(),
                unit: UnitHandle::CORE,
                kind,
                visibility: Visibility::Public,
                is_abstract: false,
                base,
                interfaces: Vec::new(),
                generic_parameters: Vec::new(),
                generic_definition: None,
                generic_arguments: Vec::new(),
                properties: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                fields: Vec::new(),
                attributes: Vec::new(),
            };
            if handle == TypeHandle::OBJECT {
                desc.constructors.push(object_ctor.clone());
            }
            if handle == TypeHandle::TASK_OF {
                desc.generic_parameters.push(task_param.clone());
            }
            state.types.push(Some(Arc::new(desc)));
            if kind != TypeKind::GenericParameter {
                state.units[0].types.push(handle);
                // Task and Task<TResult> share a name; the definition is
                // reachable through TypeHandle::TASK_OF only.
                state
                    .names
                    .entry((UnitHandle::CORE, name.to_string()))
                    .or_insert(handle);
            }
        }
    }

    // ========================================================================
    // Units and declarations
    // ========================================================================

    /// Create a new, empty code unit
    pub fn define_unit(&self, name: impl Into<String>) -> UnitHandle {
        let mut state = self.state.write();
        let handle = UnitHandle(state.units.len() as u32);
        state.units.push(CodeUnit {
            name: name.into(),
            types: Vec::new(),
        });
        handle
    }

    /// Name of a code unit
    pub fn unit_name(&self, unit: UnitHandle) -> Option<String> {
        self.state.read().units.get(unit.index()).map(|u| u.name.clone())
    }

    /// Types declared in a unit, in publication order
    ///
    /// Generic parameters and constructed generic types are not listed.
    pub fn unit_types(&self, unit: UnitHandle) -> Vec<TypeHandle> {
        self.state
            .read()
            .units
            .get(unit.index())
            .map(|u| u.types.clone())
            .unwrap_or_default()
    }

    /// Find a declared type by name
    pub fn lookup(&self, unit: UnitHandle, name: &str) -> Option<TypeHandle> {
        self.state
            .read()
            .names
            .get(&(unit, name.to_string()))
            .copied()
    }

    /// Start declaring a class (base defaults to the universal root)
    pub fn define_class(&self, unit: UnitHandle, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder::new(self, unit, name.into(), TypeKind::Class)
    }

    /// Start declaring an interface
    pub fn define_interface(&self, unit: UnitHandle, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder::new(self, unit, name.into(), TypeKind::Interface)
    }

    /// Reserve a handle for a declaration in progress
    pub(crate) fn reserve(&self) -> TypeHandle {
        let mut state = self.state.write();
        let handle = TypeHandle(state.types.len() as u32);
        state.types.push(None);
        handle
    }

    /// Publish a declared type into its slot and unit
    pub(crate) fn publish(&self, desc: TypeDescriptor) -> HostResult<TypeHandle> {
        let mut state = self.state.write();
        let handle = desc.handle;
        let key = (desc.unit, desc.name.clone());
        if state.names.contains_key(&key) {
            let unit = state
                .units
                .get(desc.unit.index())
                .map(|u| u.name.clone())
                .unwrap_or_default();
            return Err(HostError::DuplicateType {
                name: desc.name,
                unit,
            });
        }
        let unit = state
            .units
            .get_mut(desc.unit.index())
            .ok_or_else(|| HostError::UnknownType(handle))?;
        unit.types.push(handle);
        state.names.insert(key, handle);
        debug!(ty = %handle, name = %desc.name, kind = ?desc.kind, "type published");
        state.types[handle.index()] = Some(Arc::new(desc));
        Ok(handle)
    }

    /// Store a finished descriptor without listing it in a unit
    pub(crate) fn install(&self, desc: TypeDescriptor) {
        let mut state = self.state.write();
        let index = desc.handle.index();
        state.types[index] = Some(Arc::new(desc));
    }

    pub(crate) fn alloc_generic_parameter(
        &self,
        unit: UnitHandle,
        name: &str,
        constraints: &[TypeHandle],
    ) -> GenericParameter {
        let handle = self.reserve();
        let mut base = TypeHandle::OBJECT;
        let mut interfaces = Vec::new();
        for &c in constraints {
            match self.get(c).map(|d| d.kind) {
                Some(TypeKind::Interface) => interfaces.push(c),
                _ => base = c,
            }
        }
        self.install(TypeDescriptor {
            handle,
            name: name.to_string(),
            unit,
            kind: TypeKind::GenericParameter,
            visibility: Visibility::Public,
            is_abstract: false,
            base: Some(base),
            interfaces,
            generic_parameters: Vec::new(),
            generic_definition: None,
            generic_arguments: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            attributes: Vec::new(),
        });
        GenericParameter {
            handle,
            name: name.to_string(),
            constraints: constraints.to_vec(),
        }
    }

    pub(crate) fn constructed(&self, definition: TypeHandle, arguments: &[TypeHandle]) -> Option<TypeHandle> {
        self.state
            .read()
            .constructed
            .get(&(definition, arguments.to_vec()))
            .copied()
    }

    pub(crate) fn set_constructed(
        &self,
        definition: TypeHandle,
        arguments: Vec<TypeHandle>,
        handle: Option<TypeHandle>,
    ) {
        let mut state = self.state.write();
        match handle {
            Some(h) => {
                state.constructed.insert((definition, arguments), h);
            }
            None => {
                state.constructed.remove(&(definition, arguments));
            }
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Descriptor of a published type
    pub fn get(&self, handle: TypeHandle) -> Option<Arc<TypeDescriptor>> {
        self.state
            .read()
            .types
            .get(handle.index())
            .and_then(|slot| slot.clone())
    }

    /// Descriptor of a published type, or `UnknownType`
    pub fn descriptor(&self, handle: TypeHandle) -> HostResult<Arc<TypeDescriptor>> {
        self.get(handle).ok_or(HostError::UnknownType(handle))
    }

    /// Number of allocated handles (including reserved ones)
    pub fn len(&self) -> usize {
        self.state.read().types.len()
    }

    /// Never true: the well-known types are always present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display name, with type arguments for constructed generics
    pub fn type_name(&self, handle: TypeHandle) -> String {
        let Some(desc) = self.get(handle) else {
            return handle.to_string();
        };
        if !desc.generic_arguments.is_empty() {
            let args: Vec<String> = desc
                .generic_arguments
                .iter()
                .map(|&a| self.type_name(a))
                .collect();
            format!("{}<{}>", desc.name, args.join(", "))
        } else if !desc.generic_parameters.is_empty() {
            let params: Vec<&str> = desc
                .generic_parameters
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            format!("{}<{}>", desc.name, params.join(", "))
        } else {
            desc.name.clone()
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Base types from the direct base up to the root (excluding `handle`)
    pub fn base_chain(&self, handle: TypeHandle) -> Vec<TypeHandle> {
        let mut chain = Vec::new();
        let mut current = self.get(handle).and_then(|d| d.base);
        while let Some(base) = current {
            if chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = self.get(base).and_then(|d| d.base);
        }
        chain
    }

    /// Every interface implemented by `handle`, transitively
    ///
    /// Order: each declared interface followed by the interfaces it extends,
    /// then the interfaces of the base type. Each interface appears once.
    pub fn interfaces(&self, handle: TypeHandle) -> Vec<TypeHandle> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_interfaces(handle, &mut out, &mut seen);
        out
    }

    fn collect_interfaces(
        &self,
        handle: TypeHandle,
        out: &mut Vec<TypeHandle>,
        seen: &mut FxHashSet<TypeHandle>,
    ) {
        let Some(desc) = self.get(handle) else {
            return;
        };
        for &interface in &desc.interfaces {
            if seen.insert(interface) {
                out.push(interface);
                self.collect_interfaces(interface, out, seen);
            }
        }
        if let Some(base) = desc.base {
            self.collect_interfaces(base, out, seen);
        }
    }

    /// Whether a value of type `from` can be used where `to` is expected
    pub fn is_assignable(&self, from: TypeHandle, to: TypeHandle) -> bool {
        if from == to || to == TypeHandle::OBJECT {
            return true;
        }
        match self.get(to).map(|d| d.kind) {
            Some(TypeKind::Interface) => self.interfaces(from).contains(&to),
            Some(_) => self.base_chain(from).contains(&to),
            None => false,
        }
    }

    // ========================================================================
    // Member enumeration
    // ========================================================================

    /// Descriptors of `handle` and its base types, most derived first
    fn hierarchy(&self, handle: TypeHandle) -> HostResult<Vec<Arc<TypeDescriptor>>> {
        let mut levels = vec![self.descriptor(handle)?];
        for base in self.base_chain(handle) {
            levels.push(self.descriptor(base)?);
        }
        Ok(levels)
    }

    /// Whether an inherited member is visible through a derived type
    fn inherits(flags: BindingFlags, visibility: Visibility, is_static: bool) -> bool {
        visibility != Visibility::Private
            && (!is_static || flags.contains(BindingFlags::FLATTEN_HIERARCHY))
    }

    /// Properties of a type in host order
    ///
    /// Declared properties come first, then those of each base type. A base
    /// property is skipped when a more derived type declares one with the
    /// same name.
    pub fn properties(&self, handle: TypeHandle, flags: BindingFlags) -> HostResult<Vec<PropertyInfo>> {
        let mut out = Vec::new();
        let mut hidden: FxHashSet<String> = FxHashSet::default();
        for (depth, level) in self.hierarchy(handle)?.iter().enumerate() {
            for p in &level.properties {
                if depth > 0 && !Self::inherits(flags, p.visibility(), p.is_static()) {
                    continue;
                }
                if hidden.contains(p.name()) || !flags.admits(p.visibility(), p.is_static()) {
                    continue;
                }
                out.push(p.clone());
            }
            if flags.contains(BindingFlags::DECLARED_ONLY) {
                break;
            }
            hidden.extend(level.properties.iter().map(|p| p.name().to_string()));
        }
        Ok(out)
    }

    /// Methods of a type in host order
    ///
    /// Declared methods come first, then those of each base type. A base
    /// method is skipped when a more derived type declares one with the
    /// same signature.
    pub fn methods(&self, handle: TypeHandle, flags: BindingFlags) -> HostResult<Vec<MethodInfo>> {
        let mut out = Vec::new();
        let mut declared: Vec<MethodInfo> = Vec::new();
        for (depth, level) in self.hierarchy(handle)?.iter().enumerate() {
            for m in &level.methods {
                if depth > 0 && !Self::inherits(flags, m.visibility(), m.is_static()) {
                    continue;
                }
                if declared.iter().any(|d| d.same_signature(m))
                    || !flags.admits(m.visibility(), m.is_static())
                {
                    continue;
                }
                out.push(m.clone());
            }
            if flags.contains(BindingFlags::DECLARED_ONLY) {
                break;
            }
            declared.extend(level.methods.iter().cloned());
        }
        Ok(out)
    }

    /// Fields of a type in host order
    pub fn fields(&self, handle: TypeHandle, flags: BindingFlags) -> HostResult<Vec<FieldInfo>> {
        let mut out = Vec::new();
        let mut hidden: FxHashSet<String> = FxHashSet::default();
        for (depth, level) in self.hierarchy(handle)?.iter().enumerate() {
            for f in &level.fields {
                if depth > 0 && !Self::inherits(flags, f.visibility(), f.is_static()) {
                    continue;
                }
                if hidden.contains(f.name()) || !flags.admits(f.visibility(), f.is_static()) {
                    continue;
                }
                out.push(f.clone());
            }
            if flags.contains(BindingFlags::DECLARED_ONLY) {
                break;
            }
            hidden.extend(level.fields.iter().map(|f| f.name().to_string()));
        }
        Ok(out)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
