//! Type and code-unit handles

use std::fmt;

/// Identity of a type registered in a [`TypeRegistry`](crate::TypeRegistry)
///
/// Two handles are equal exactly when they denote the same type. Closed
/// generic types are interned, so `List<string>` built twice yields the
/// same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub(crate) u32);

impl TypeHandle {
    /// The universal root type every class derives from
    pub const OBJECT: TypeHandle = TypeHandle(0);
    /// `bool`
    pub const BOOL: TypeHandle = TypeHandle(1);
    /// 64-bit signed integer
    pub const INT: TypeHandle = TypeHandle(2);
    /// 64-bit float
    pub const FLOAT: TypeHandle = TypeHandle(3);
    /// `string`
    pub const STRING: TypeHandle = TypeHandle(4);
    /// Deferred computation without a result value
    pub const TASK: TypeHandle = TypeHandle(5);
    /// Open generic `Task<TResult>`, derived from [`TypeHandle::TASK`]
    pub const TASK_OF: TypeHandle = TypeHandle(6);
    /// The `TResult` parameter of [`TypeHandle::TASK_OF`]
    pub(crate) const TASK_RESULT_PARAM: TypeHandle = TypeHandle(7);

    /// Number of types registered by [`TypeRegistry::new`](crate::TypeRegistry::new)
    pub(crate) const WELL_KNOWN_COUNT: usize = 8;

    /// Index into the registry tables
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether the handle is one of the primitive value types
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::BOOL | Self::INT | Self::FLOAT)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.0)
    }
}

/// Identity of a code unit (a named collection of types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitHandle(pub(crate) u32);

impl UnitHandle {
    /// The unit holding the well-known types
    pub const CORE: UnitHandle = UnitHandle(0);

    /// Index into the unit table
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitHandle({})", self.0)
    }
}
