//! Service options (reflekt.toml)
//!
//! ```toml
//! missing_optional_arguments = "use-defaults"
//! default_binding = "PUBLIC|INSTANCE"
//! ```

use std::path::Path;

use reflekt_runtime::{BindingFlags, MissingArguments};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read options file
    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse options: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid options: {0}")]
    ValidationError(String),
}

/// Options of a [`ReflectionService`](crate::ReflectionService)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReflectionOptions {
    /// Handling of omitted optional arguments: "reject" (default) or "use-defaults"
    pub missing_optional_arguments: String,

    /// Binding filter used when `properties` gets none
    pub default_binding: String,
}

impl Default for ReflectionOptions {
    fn default() -> Self {
        Self {
            missing_optional_arguments: "reject".to_string(),
            default_binding: BindingFlags::DEFAULT_LOOKUP.to_string(),
        }
    }
}

impl ReflectionOptions {
    /// Parse options from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse options from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let options: ReflectionOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.missing_arguments()?;
        self.binding_flags()?;
        Ok(())
    }

    /// Omitted-argument policy
    pub fn missing_arguments(&self) -> Result<MissingArguments, ConfigError> {
        match self.missing_optional_arguments.as_str() {
            "use-defaults" => Ok(MissingArguments::UseDefaults),
            "reject" => Ok(MissingArguments::Reject),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid missing_optional_arguments: {}. Must be 'use-defaults' or 'reject'",
                other
            ))),
        }
    }

    /// Default binding filter
    pub fn binding_flags(&self) -> Result<BindingFlags, ConfigError> {
        BindingFlags::from_combined_str(&self.default_binding).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "Invalid default_binding: {}",
                self.default_binding
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReflectionOptions::default();
        assert_eq!(options.missing_arguments().unwrap(), MissingArguments::Reject);
        assert_eq!(options.binding_flags().unwrap(), BindingFlags::DEFAULT_LOOKUP);
    }

    #[test]
    fn test_parse_options() {
        let options = ReflectionOptions::from_str(
            r#"
missing_optional_arguments = "use-defaults"
default_binding = "PUBLIC | INSTANCE"
"#,
        )
        .unwrap();
        assert_eq!(options.missing_arguments().unwrap(), MissingArguments::UseDefaults);
        assert_eq!(
            options.binding_flags().unwrap(),
            BindingFlags::PUBLIC | BindingFlags::INSTANCE
        );
    }

    #[test]
    fn test_partial_options_use_defaults() {
        let options = ReflectionOptions::from_str("default_binding = \"PUBLIC|STATIC\"").unwrap();
        assert_eq!(options.missing_optional_arguments, "reject");
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            ReflectionOptions::from_str("missing_optional_arguments = \"ignore\""),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            ReflectionOptions::from_str("default_binding = \"PUBLIC|EVERYTHING\""),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            ReflectionOptions::from_str("default_binding = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
