//! Error types for Crumbtrail.
//!
//! Nothing in this workspace lets an error escape into the host's
//! request/response cycle. These types exist so the failures can be logged
//! with enough context before being contained.

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Crumbtrail.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ignore pattern is not a valid regular expression
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    IgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A supported path is not a valid glob
    #[error("Invalid path glob '{pattern}': {source}")]
    PathGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A canonical crumb string could not be parsed
    #[error("Invalid crumb '{0}': expected realm/resource")]
    InvalidCrumb(String),
}

impl Error {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Config(_) => {
                Some("Check the [breadcrumbs] section of ~/.config/crumbtrail/config.toml")
            }
            Error::IgnorePattern { .. } => {
                Some("Fix or remove breadcrumbs.ignore_pattern; it must be a valid regex")
            }
            Error::PathGlob { .. } => {
                Some("Fix breadcrumbs.supported_paths; entries look like '/wiki*'")
            }
            Error::InvalidCrumb(_) => None,
        }
    }
}

/// Format an error with its recovery suggestion.
pub fn format_error_with_suggestion(error: &Error) -> String {
    let mut output = error.to_string();
    if let Some(suggestion) = error.recovery_suggestion() {
        output.push_str(&format!("\n  Suggestion: {}", suggestion));
    }
    output
}
