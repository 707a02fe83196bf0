//! Turning a trail into display names, links and the navigation fragment.

use std::slice;

use askama::Template;
use crumbtrail_core::{CrumbEntry, CrumbTrail};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;

/// Characters left as-is in link path segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds the URL of a resource. Supplied by the host's routing layer.
pub trait LinkBuilder {
    fn link(&self, realm: &str, resource: &str) -> String;
}

impl<F> LinkBuilder for F
where
    F: Fn(&str, &str) -> String,
{
    fn link(&self, realm: &str, resource: &str) -> String {
        self(realm, resource)
    }
}

/// Links of the form `{base}/{realm}/{resource}`, percent-encoded.
#[derive(Debug, Clone)]
pub struct Href {
    base: String,
}

impl Href {
    /// `base` is the application's mount point, e.g. `/trac/project`.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }
}

impl LinkBuilder for Href {
    fn link(&self, realm: &str, resource: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base,
            utf8_percent_encode(realm, PATH_SEGMENT),
            utf8_percent_encode(resource, PATH_SEGMENT)
        )
    }
}

/// One rendered breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub display_name: String,
    pub url: String,
}

/// Human-readable name of an entry.
///
/// Underscores become spaces; tickets read `#42`, wiki pages use the bare
/// name and every other realm is prefixed, as in `milestone:1.0`.
pub fn display_name(entry: &CrumbEntry) -> String {
    let name = entry.resource().replace('_', " ");
    match entry.realm() {
        "ticket" => format!("#{}", name),
        "wiki" => name,
        realm => format!("{}:{}", realm, name),
    }
}

/// Renders trails. Holds no state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrumbRenderer;

impl CrumbRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Crumbs in trail order, or `None` when there is nothing to render.
    pub fn render<'a, L>(&self, trail: &'a CrumbTrail, links: &'a L) -> Option<Crumbs<'a, L>>
    where
        L: LinkBuilder + ?Sized,
    {
        if trail.is_empty() {
            return None;
        }
        Some(Crumbs {
            entries: trail.iter(),
            links,
        })
    }
}

/// Iterator over the crumbs of one render call.
pub struct Crumbs<'a, L: ?Sized> {
    entries: slice::Iter<'a, CrumbEntry>,
    links: &'a L,
}

impl<'a, L> Iterator for Crumbs<'a, L>
where
    L: LinkBuilder + ?Sized,
{
    type Item = Crumb;

    fn next(&mut self) -> Option<Crumb> {
        let entry = self.entries.next()?;
        Some(Crumb {
            display_name: display_name(entry),
            url: self.links.link(entry.realm(), entry.resource()),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<'a, L> ExactSizeIterator for Crumbs<'a, L> where L: LinkBuilder + ?Sized {}

/// The `<ul id="breadcrumbs">` fragment. Names and URLs are HTML-escaped.
#[derive(Template)]
#[template(path = "breadcrumbs.html")]
struct BreadcrumbsTemplate {
    crumbs: Vec<Crumb>,
}

impl<'a, L> Crumbs<'a, L>
where
    L: LinkBuilder + ?Sized,
{
    /// The navigation list inserted into pages. Empty if rendering fails.
    pub fn to_html(self) -> String {
        let template = BreadcrumbsTemplate {
            crumbs: self.collect(),
        };
        match template.render() {
            Ok(html) => html,
            Err(err) => {
                warn!("failed to render breadcrumbs: {err}");
                String::new()
            }
        }
    }
}
