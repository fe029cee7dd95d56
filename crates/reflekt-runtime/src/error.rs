//! Host runtime errors

use thiserror::Error;

use crate::handle::TypeHandle;

/// Result type for host runtime operations
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised by the host runtime while resolving, activating or
/// invoking members
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    /// Handle does not denote a completed type
    #[error("Unknown type: {0}")]
    UnknownType(TypeHandle),

    /// A type with the same name already exists in the unit
    #[error("Duplicate type '{name}' in unit '{unit}'")]
    DuplicateType {
        /// Type name
        name: String,
        /// Unit name
        unit: String,
    },

    /// Type is not a generic type definition
    #[error("'{name}' is not a generic type definition")]
    NotGenericTypeDefinition {
        /// Type name
        name: String,
    },

    /// Method is not a generic method definition
    #[error("'{name}' is not a generic method definition")]
    NotGenericMethodDefinition {
        /// Method name
        name: String,
    },

    /// Wrong number of type arguments
    #[error("Invalid type argument count for '{name}': expected {expected}, got {actual}")]
    InvalidTypeArgCount {
        /// Generic type or method name
        name: String,
        /// Declared generic parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// A type argument does not satisfy a generic constraint
    #[error("Type argument '{argument}' violates the constraint of parameter '{parameter}' on '{name}'")]
    ConstraintViolation {
        /// Generic type or method name
        name: String,
        /// Generic parameter name
        parameter: String,
        /// Offending argument type name
        argument: String,
    },

    /// Activation failed
    #[error("Cannot create an instance of '{name}': {reason}")]
    Activation {
        /// Type name
        name: String,
        /// Reason
        reason: String,
    },

    /// Late-bound call on a member that still has open generic parameters
    #[error("Cannot invoke '{member}': it contains open generic parameters")]
    OpenGenericInvocation {
        /// Member name
        member: String,
    },

    /// Wrong number of arguments
    #[error("Parameter count mismatch invoking '{member}': expected {expected}, got {actual}")]
    ParameterCountMismatch {
        /// Member name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// An argument is not assignable to its parameter
    #[error("Argument {index} of '{member}' expects '{expected}', got '{actual}'")]
    ArgumentType {
        /// Member name
        member: String,
        /// Argument position
        index: usize,
        /// Parameter type name
        expected: String,
        /// Argument type name
        actual: String,
    },

    /// Instance member invoked without a target
    #[error("Non-static member '{member}' requires a target")]
    TargetRequired {
        /// Member name
        member: String,
    },

    /// Target or value does not have the expected type
    #[error("Object of type '{actual}' does not match target type '{expected}'")]
    TargetType {
        /// Expected type name
        expected: String,
        /// Actual type name
        actual: String,
    },

    /// Property has no getter
    #[error("Property '{name}' has no getter")]
    PropertyNotReadable {
        /// Property name
        name: String,
    },

    /// Error raised by a member body
    #[error("{message}")]
    Thrown {
        /// Message supplied by the body
        message: String,
    },
}

impl HostError {
    /// Error raised from inside a method, getter or constructor body
    pub fn thrown(message: impl Into<String>) -> Self {
        HostError::Thrown {
            message: message.into(),
        }
    }
}
