//! Engine errors

use reflekt_runtime::HostError;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors raised by the reflection service
///
/// Host errors pass through unchanged.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// A required argument was absent (or blank, for names)
    #[error("Value cannot be null. (Parameter '{parameter}')")]
    MissingArgument {
        /// Name of the offending parameter
        parameter: &'static str,
    },

    /// No method matched the requested name and shape
    #[error("Method '{method_name}' not found")]
    MethodNotFound {
        /// Requested method name
        method_name: String,
    },

    /// Error raised by the host runtime
    #[error(transparent)]
    Host(#[from] HostError),

    /// Options could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ReflectError {
    pub(crate) fn missing(parameter: &'static str) -> Self {
        ReflectError::MissingArgument { parameter }
    }

    /// Parameter name of a `MissingArgument` error
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            ReflectError::MissingArgument { parameter } => Some(parameter),
            _ => None,
        }
    }

    /// Method name of a `MethodNotFound` error
    pub fn method_name(&self) -> Option<&str> {
        match self {
            ReflectError::MethodNotFound { method_name } => Some(method_name),
            _ => None,
        }
    }

    /// Underlying host error, if any
    pub fn host_error(&self) -> Option<&HostError> {
        match self {
            ReflectError::Host(e) => Some(e),
            _ => None,
        }
    }
}
