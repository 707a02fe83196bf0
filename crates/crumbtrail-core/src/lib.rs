//! # crumbtrail-core
//!
//! Core types and abstractions for Crumbtrail, per-session navigation
//! breadcrumbs for a web application.
//!
//! This crate provides:
//! - [`CrumbEntry`] and the bounded, recency-ordered [`CrumbTrail`]
//! - Configuration loading and validation
//! - Common error types

pub mod config;
pub mod error;
pub mod trail;

pub use config::{BreadcrumbsConfig, Config, TrackingConfig};
pub use error::{Error, Result};
pub use trail::{CrumbEntry, CrumbTrail, DEFAULT_MAX_CRUMBS};
