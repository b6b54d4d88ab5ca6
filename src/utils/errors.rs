//! User-facing errors with actionable suggestions

use colored::Colorize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::output::FormatError;

/// Error with suggestions, shown at the process boundary
#[derive(Error, Debug)]
#[error("{message}")]
pub struct VersionMatrixError {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl VersionMatrixError {
    /// Create a new error with suggestions
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    /// Add a suggestion to the error
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Display the error with suggestions on stderr
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.message);

        if !self.suggestions.is_empty() {
            eprintln!();
            eprintln!("{}", "Suggestions:".yellow().bold());
            for suggestion in &self.suggestions {
                eprintln!("  {} {}", "→".blue(), suggestion);
            }
        }
    }

    /// Inventory could not be loaded or failed validation
    pub fn invalid_inventory(err: &ConfigError) -> Self {
        let base = Self::new(err.to_string());
        match err {
            ConfigError::Read { .. } => base
                .suggest("Verify the path passed to --config exists and is readable"),
            ConfigError::Parse { .. } => base
                .suggest("Check the YAML syntax of the inventory")
                .suggest("Only name, source and occurrences are allowed on a product"),
            ConfigError::MissingName { .. } | ConfigError::MissingSource { .. } => {
                base.suggest("Every product needs a non-empty name and source")
            }
            ConfigError::NoLocator { .. } | ConfigError::MultipleLocators { .. } => base.suggest(
                "Set exactly one of goConstant, goFunction, helmChart or yamlFile per occurrence",
            ),
        }
    }

    /// Report could not be rendered or written
    pub fn output_failed(err: &FormatError) -> Self {
        Self::new(err.to_string()).suggest("Check that stdout is writable")
    }
}

/// Helper to display error and exit
pub fn display_error_and_exit(error: VersionMatrixError) -> ! {
    error.display();
    std::process::exit(1);
}

/// Convert an anyhow error to a VersionMatrixError when possible
pub fn enhance_error(err: anyhow::Error) -> VersionMatrixError {
    if let Some(config_err) = err.downcast_ref::<ConfigError>() {
        return VersionMatrixError::invalid_inventory(config_err);
    }

    if let Some(format_err) = err.downcast_ref::<FormatError>() {
        return VersionMatrixError::output_failed(format_err);
    }

    VersionMatrixError::new(format!("{:#}", err)).suggest("Run with -vv for more details")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_suggestions() {
        let err = VersionMatrixError::new("test")
            .suggest("suggestion 1")
            .suggest("suggestion 2");
        assert_eq!(err.suggestions.len(), 2);
        assert_eq!(err.to_string(), "test");
    }

    #[test]
    fn test_enhance_config_error() {
        let err = anyhow::Error::new(ConfigError::NoLocator {
            product: "etcd".to_string(),
            occurrence: 2,
        });

        let enhanced = enhance_error(err);
        assert!(enhanced.message.contains("etcd"));
        assert!(enhanced.message.contains("occurrence 2"));
        assert_eq!(enhanced.suggestions.len(), 1);
    }

    #[test]
    fn test_enhance_generic_error() {
        let err = anyhow::anyhow!("disk on fire").context("while reading");
        let enhanced = enhance_error(err);
        assert_eq!(enhanced.message, "while reading: disk on fire");
    }
}
