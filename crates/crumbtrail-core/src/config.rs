//! Configuration system for Crumbtrail.
//!
//! [`Config`] is the raw, serializable form loaded through figment.
//! [`TrackingConfig`] is the compiled, immutable form the tracker uses.

use figment::{
    providers::{Env, Format, Toml},
    value::{Dict, Map, Value},
    Figment, Metadata, Profile, Provider,
};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::trail::DEFAULT_MAX_CRUMBS;

/// Caps above this still work but make for a noisy navigation bar.
const LARGE_MAX_CRUMBS: usize = 50;

/// Older spellings of `[breadcrumbs]` keys and the key each one stands for.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("paths", "supported_paths"),
    ("ignore pattern", "ignore_pattern"),
];

/// Main configuration struct for Crumbtrail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Breadcrumb tracking settings
    pub breadcrumbs: BreadcrumbsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreadcrumbsConfig {
    /// Resources matching this regex are never added to the trail
    pub ignore_pattern: Option<String>,
    /// Maximum number of breadcrumbs stored per session
    pub max_crumbs: usize,
    /// URL path globs eligible for tracking
    pub supported_paths: Vec<String>,
}

impl Default for BreadcrumbsConfig {
    fn default() -> Self {
        Self {
            ignore_pattern: None,
            max_crumbs: DEFAULT_MAX_CRUMBS,
            supported_paths: vec![
                "/wiki*".to_string(),
                "/ticket*".to_string(),
                "/milestone*".to_string(),
            ],
        }
    }
}

/// Validation result with multiple issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Check if validation passed (no errors).
    pub fn is_ok(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == IssueSeverity::Error)
    }

    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == IssueSeverity::Error).collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == IssueSeverity::Warning).collect()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        });
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Field path (e.g., "breadcrumbs.max_crumbs")
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Warnings don't prevent loading
    Warning,
    /// Errors prevent loading
    Error,
}

impl Config {
    /// The layered figment: user config, project config, env.
    ///
    /// Each TOML layer has its legacy key spellings renamed before merging,
    /// so a later layer overrides an earlier one whichever spelling it uses.
    pub fn figment() -> Figment {
        let config_dir = Self::config_dir();

        Figment::new()
            .merge(LegacyKeys(Toml::file(config_dir.join("config.toml"))))
            .merge(LegacyKeys(Toml::file(".crumbtrail/config.toml")))
            // Project local config (gitignored)
            .merge(LegacyKeys(Toml::file(".crumbtrail/config.local.toml")))
            // CRUMBTRAIL_BREADCRUMBS__MAX_CRUMBS=3
            .merge(Env::prefixed("CRUMBTRAIL_").split("__"))
    }

    /// Load configuration from all sources.
    pub fn load() -> std::result::Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Load configuration from a single TOML file on top of the defaults.
    pub fn load_file(path: impl AsRef<Path>) -> std::result::Result<Self, figment::Error> {
        Figment::new()
            .merge(LegacyKeys(Toml::file(path.as_ref())))
            .extract()
    }

    /// Turn validation errors into an [`Error::Config`], logging warnings.
    pub fn ensure_valid(&self) -> Result<()> {
        let result = self.validate();

        if !result.is_ok() {
            let errors: Vec<String> = result
                .errors()
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return Err(Error::Config(format!(
                "Configuration validation failed:\n  {}",
                errors.join("\n  ")
            )));
        }

        for warning in result.warnings() {
            tracing::warn!("Config warning - {}: {}", warning.field, warning.message);
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        let crumbs = &self.breadcrumbs;

        if crumbs.max_crumbs == 0 {
            result.add_error("breadcrumbs.max_crumbs", "max_crumbs must be greater than 0");
        } else if crumbs.max_crumbs > LARGE_MAX_CRUMBS {
            result.add_warning(
                "breadcrumbs.max_crumbs",
                format!("max_crumbs is very high (> {})", LARGE_MAX_CRUMBS),
            );
        }

        if let Some(ref pattern) = crumbs.ignore_pattern {
            if let Err(e) = compile_ignore_pattern(pattern) {
                result.add_error("breadcrumbs.ignore_pattern", e.to_string());
            }
        }

        if crumbs.supported_paths.is_empty() {
            result.add_warning(
                "breadcrumbs.supported_paths",
                "No supported paths; nothing will be tracked",
            );
        }

        for pattern in &crumbs.supported_paths {
            if let Err(e) = build_path_globs(std::slice::from_ref(pattern)) {
                result.add_error("breadcrumbs.supported_paths", e.to_string());
            }
        }

        result
    }

    /// Get the configuration directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("crumbtrail"))
            .unwrap_or_else(|| PathBuf::from("~/.config/crumbtrail"))
    }
}

/// Compiled tracking settings, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    ignore_pattern: Option<Regex>,
    max_crumbs: usize,
    supported_paths: Vec<String>,
    path_globs: GlobSet,
}

impl TrackingConfig {
    /// Compile the `[breadcrumbs]` section.
    pub fn from_config(config: &BreadcrumbsConfig) -> Result<Self> {
        if config.max_crumbs == 0 {
            return Err(Error::Config("max_crumbs must be greater than 0".to_string()));
        }

        let ignore_pattern = config
            .ignore_pattern
            .as_deref()
            .map(compile_ignore_pattern)
            .transpose()?;

        Ok(Self {
            ignore_pattern,
            max_crumbs: config.max_crumbs,
            supported_paths: config.supported_paths.clone(),
            path_globs: build_path_globs(&config.supported_paths)?,
        })
    }

    pub fn max_crumbs(&self) -> usize {
        self.max_crumbs
    }

    pub fn supported_paths(&self) -> &[String] {
        &self.supported_paths
    }

    /// Whether the full request path matches any supported glob.
    pub fn is_supported(&self, path: &str) -> bool {
        self.path_globs.is_match(path)
    }

    /// Whether the resource name matches the ignore pattern at its start.
    pub fn is_ignored(&self, resource: &str) -> bool {
        self.ignore_pattern
            .as_ref()
            .map(|re| re.is_match(resource))
            .unwrap_or(false)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        let defaults = BreadcrumbsConfig::default();
        Self {
            ignore_pattern: None,
            max_crumbs: defaults.max_crumbs,
            path_globs: build_path_globs(&defaults.supported_paths)
                .unwrap_or_else(|_| GlobSet::empty()),
            supported_paths: defaults.supported_paths,
        }
    }
}

/// Renames [`LEGACY_KEYS`] in the `[breadcrumbs]` table of one layer.
///
/// When a layer has both spellings the current one wins.
struct LegacyKeys<P>(P);

impl<P: Provider> Provider for LegacyKeys<P> {
    fn metadata(&self) -> Metadata {
        self.0.metadata()
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        let mut data = self.0.data()?;
        for dict in data.values_mut() {
            if let Some(Value::Dict(_, section)) = dict.get_mut("breadcrumbs") {
                for (legacy, current) in LEGACY_KEYS {
                    if let Some(value) = section.remove(*legacy) {
                        section.entry(current.to_string()).or_insert(value);
                    }
                }
            }
        }
        Ok(data)
    }

    fn profile(&self) -> Option<Profile> {
        self.0.profile()
    }
}

/// Anchor the pattern at the start of the resource name.
fn compile_ignore_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|source| Error::IgnorePattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// `*` is allowed to cross `/` so `/wiki*` covers `/wiki/Sub/Page`.
fn build_path_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|source| Error::PathGlob {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| Error::PathGlob {
        pattern: patterns.join(","),
        source,
    })
}
