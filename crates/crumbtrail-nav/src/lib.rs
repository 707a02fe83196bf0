//! # crumbtrail-nav
//!
//! Breadcrumb tracking and rendering for Crumbtrail.
//!
//! This crate provides:
//! - [`CrumbTracker`]: records request paths under a move-to-front, capped policy
//! - [`CrumbRenderer`]: display names, links and the HTML navigation list
//! - [`BreadcrumbsPlugin`]: the request and page hooks a host calls
//!
//! ## Example
//!
//! ```ignore
//! use crumbtrail_nav::{BreadcrumbsPlugin, Href};
//! use crumbtrail_session::MemorySessionStore;
//!
//! let plugin = BreadcrumbsPlugin::from_config(&crumbtrail_core::Config::load()?)?;
//! let session = MemorySessionStore::new();
//!
//! plugin.post_process_request("/wiki/WikiStart", &session).await;
//!
//! let mut stylesheets = Vec::new();
//! let page = plugin.filter_page(&html, &session, &Href::new("/trac"), &mut stylesheets).await;
//! ```

pub mod plugin;
pub mod render;
pub mod tracker;

pub use plugin::{BreadcrumbsPlugin, StylesheetHook, STYLESHEET, STYLESHEET_PATH};
pub use render::{display_name, Crumb, CrumbRenderer, Crumbs, Href, LinkBuilder};
pub use tracker::{CrumbTracker, SkipReason, Visit};
