//! Request and page hooks wiring the tracker and renderer to a host.
//!
//! The host calls [`BreadcrumbsPlugin::post_process_request`] once the
//! response data is computed and [`BreadcrumbsPlugin::filter_page`] while
//! producing the page. Neither hook ever fails: problems are logged and the
//! request goes on without breadcrumbs.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, warn};

use crumbtrail_core::{Config, CrumbTrail, TrackingConfig};
use crumbtrail_session::{decode, encode, SessionStore, StoreError, TRAIL_KEY};

use crate::render::{CrumbRenderer, LinkBuilder};
use crate::tracker::{CrumbTracker, SkipReason};

/// Where the host serves [`STYLESHEET`].
pub const STYLESHEET_PATH: &str = "breadcrumbs/css/breadcrumbs.css";

/// Presentation for the breadcrumbs list.
pub const STYLESHEET: &str = include_str!("../assets/breadcrumbs.css");

static METANAV_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div\s(?:[^>]*\s)?id\s*=\s*["']metanav["'][^>]*>"#)
        .expect("metanav pattern is valid")
});

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)(?:\s[^>]*?)?(/?)>").expect("tag pattern is valid")
});

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Lets the page hook ask for a stylesheet on the outgoing response.
pub trait StylesheetHook {
    fn add_stylesheet(&mut self, href: &str);
}

impl StylesheetHook for Vec<String> {
    fn add_stylesheet(&mut self, href: &str) {
        if !self.iter().any(|s| s == href) {
            self.push(href.to_string());
        }
    }
}

/// Breadcrumb tracking for one deployment.
#[derive(Debug, Clone, Default)]
pub struct BreadcrumbsPlugin {
    tracker: CrumbTracker,
    renderer: CrumbRenderer,
}

impl BreadcrumbsPlugin {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            tracker: CrumbTracker::new(config),
            renderer: CrumbRenderer::new(),
        }
    }

    /// Validate and compile the `[breadcrumbs]` section.
    pub fn from_config(config: &Config) -> crumbtrail_core::Result<Self> {
        config.ensure_valid()?;
        Ok(Self::new(TrackingConfig::from_config(&config.breadcrumbs)?))
    }

    pub fn tracker(&self) -> &CrumbTracker {
        &self.tracker
    }

    pub fn renderer(&self) -> &CrumbRenderer {
        &self.renderer
    }

    /// Record `path` in the session's trail.
    pub async fn post_process_request<S>(&self, path: &str, session: &S)
    where
        S: SessionStore + ?Sized,
    {
        let entry = match self.tracker.entry_for(path) {
            Ok(entry) => entry,
            Err(SkipReason::TooFewSegments) => return,
            Err(reason) => {
                debug!(path, %reason, "Not tracking breadcrumb");
                return;
            }
        };

        let result: Result<(), StoreError> = async {
            let trail = self.load_trail(session).await?;
            let updated = self.tracker.apply(entry, &trail);
            session.set(TRAIL_KEY, &encode(&updated)).await
        }
        .await;

        if let Err(e) = result {
            error!(path, error = %e, "Breadcrumb tracking failed");
        }
    }

    /// Splice the breadcrumbs list into `html` after the metanav list.
    ///
    /// Asks `chrome` for the stylesheet only when there is a trail to show.
    /// Pages without a metanav list come back unchanged.
    pub async fn filter_page<S, L>(
        &self,
        html: &str,
        session: &S,
        links: &L,
        chrome: &mut dyn StylesheetHook,
    ) -> String
    where
        S: SessionStore + ?Sized,
        L: LinkBuilder + ?Sized,
    {
        let trail = self.crumbs(session).await;
        let Some(crumbs) = self.renderer.render(&trail, links) else {
            return html.to_string();
        };

        chrome.add_stylesheet(STYLESHEET_PATH);

        let Some(at) = metanav_insertion_point(html) else {
            debug!("Page has no metanav list; breadcrumbs not inserted");
            return html.to_string();
        };

        let fragment = crumbs.to_html();
        let mut page = String::with_capacity(html.len() + fragment.len());
        page.push_str(&html[..at]);
        page.push_str(&fragment);
        page.push_str(&html[at..]);
        page
    }

    /// The session's current trail. Empty when absent or unreadable.
    pub async fn crumbs<S>(&self, session: &S) -> CrumbTrail
    where
        S: SessionStore + ?Sized,
    {
        match self.load_trail(session).await {
            Ok(trail) => trail,
            Err(e) => {
                error!(error = %e, "Failed to read breadcrumbs from session");
                CrumbTrail::new()
            }
        }
    }

    /// Forget the session's trail.
    pub async fn clear<S>(&self, session: &S) -> Result<(), StoreError>
    where
        S: SessionStore + ?Sized,
    {
        session.delete(TRAIL_KEY).await
    }

    async fn load_trail<S>(&self, session: &S) -> Result<CrumbTrail, StoreError>
    where
        S: SessionStore + ?Sized,
    {
        let Some(raw) = session.get(TRAIL_KEY).await? else {
            return Ok(CrumbTrail::new());
        };

        match decode(&raw) {
            Ok(trail) => Ok(trail.truncated(self.tracker.config().max_crumbs())),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable breadcrumbs");
                session.delete(TRAIL_KEY).await?;
                Ok(CrumbTrail::new())
            }
        }
    }
}

/// Byte offset just past the first `<ul>` that is a direct child of the
/// metanav div. `None` when the div closes without one.
fn metanav_insertion_point(html: &str) -> Option<usize> {
    let open = METANAV_OPEN.find(html)?;
    // elements open below the metanav div, innermost last
    let mut stack: Vec<String> = Vec::new();

    for tag in TAG.captures_iter(&html[open.end()..]) {
        let name = tag[2].to_ascii_lowercase();

        if tag[1].is_empty() {
            if tag[3].is_empty() && !VOID_ELEMENTS.contains(&name.as_str()) {
                stack.push(name);
            }
            continue;
        }

        match stack.iter().rposition(|element| *element == name) {
            Some(0) if name == "ul" => {
                let whole = tag.get(0)?;
                return Some(open.end() + whole.end());
            }
            Some(depth) => stack.truncate(depth),
            None if name == "div" => return None,
            // stray close tag
            None => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Href;
    use crumbtrail_core::BreadcrumbsConfig;
    use crumbtrail_session::MemorySessionStore;
    use pretty_assertions::assert_eq;

    const PAGE: &str = concat!(
        r#"<html><body><div id="metanav" class="nav">"#,
        r#"<ul><li><a href="/login">Login</a></li></ul>"#,
        r#"</div><div id="main"></div></body></html>"#
    );

    #[test]
    fn test_insertion_point_after_metanav_list() {
        let at = metanav_insertion_point(PAGE).unwrap();
        assert!(PAGE[..at].ends_with("</li></ul>"));
        assert!(PAGE[at..].starts_with("</div>"));
    }

    #[test]
    fn test_insertion_point_handles_nested_lists() {
        let page = r#"<div id='metanav'><ul><li><ul><li>x</li></ul></li></ul><p/></div>"#;
        let at = metanav_insertion_point(page).unwrap();
        assert_eq!(&page[at..], "<p/></div>");
    }

    #[test]
    fn test_insertion_point_stops_at_end_of_metanav() {
        let page = concat!(
            r#"<div id="metanav"><p>no list</p></div>"#,
            r#"<div id="main"><ul><li>content</li></ul></div>"#
        );
        assert!(metanav_insertion_point(page).is_none());
    }

    #[test]
    fn test_insertion_point_ignores_lookalike_attributes() {
        let page = concat!(
            r#"<div data-id="metanav"><ul><li>decoy</li></ul></div>"#,
            r#"<div class="nav" id="metanav"><ul><li>Help</li></ul></div>"#
        );
        let at = metanav_insertion_point(page).unwrap();
        assert!(page[..at].ends_with("<li>Help</li></ul>"));
        assert_eq!(&page[at..], "</div>");
    }

    #[test]
    fn test_insertion_point_skips_lists_in_child_elements() {
        let page = concat!(
            r#"<div id="metanav"><div class="inner"><ul><li>a</li></ul></div>"#,
            r#"<br><ul><li>b<li>c</ul><p/></div>"#
        );
        let at = metanav_insertion_point(page).unwrap();
        assert!(page[..at].ends_with("<li>b<li>c</ul>"));
        assert_eq!(&page[at..], "<p/></div>");
    }

    #[test]
    fn test_insertion_point_missing() {
        assert!(metanav_insertion_point("<div id=\"main\"><ul></ul></div>").is_none());
    }

    #[tokio::test]
    async fn test_track_then_filter() {
        let plugin = BreadcrumbsPlugin::default();
        let session = MemorySessionStore::new();

        plugin.post_process_request("/wiki/WikiStart", &session).await;
        plugin.post_process_request("/ticket/42", &session).await;

        let mut stylesheets: Vec<String> = Vec::new();
        let page = plugin
            .filter_page(PAGE, &session, &Href::new("/trac"), &mut stylesheets)
            .await;

        assert_eq!(stylesheets, vec![STYLESHEET_PATH.to_string()]);
        assert!(page.contains(concat!(
            r#"</ul><ul class="nav" id="breadcrumbs">Breadcrumbs:"#,
            r##"<li><a title="#42" href="/trac/ticket/42">#42</a></li>"##,
            r#"<li><a title="WikiStart" href="/trac/wiki/WikiStart">WikiStart</a></li>"#,
            "</ul></div>"
        )));
    }

    #[tokio::test]
    async fn test_metanav_without_list_leaves_page_alone() {
        let plugin = BreadcrumbsPlugin::default();
        let session = MemorySessionStore::new();
        plugin.post_process_request("/wiki/WikiStart", &session).await;

        let page = concat!(
            r#"<div id="metanav"><p>no list</p></div>"#,
            r#"<div id="main"><ul><li>content</li></ul></div>"#
        );
        let mut stylesheets: Vec<String> = Vec::new();
        let filtered = plugin
            .filter_page(page, &session, &Href::new(""), &mut stylesheets)
            .await;

        assert_eq!(filtered, page);
        assert_eq!(stylesheets, vec![STYLESHEET_PATH.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_trail_leaves_page_alone() {
        let plugin = BreadcrumbsPlugin::default();
        let session = MemorySessionStore::new();

        plugin.post_process_request("/timeline", &session).await;

        let mut stylesheets: Vec<String> = Vec::new();
        let page = plugin
            .filter_page(PAGE, &session, &Href::new(""), &mut stylesheets)
            .await;
        assert_eq!(page, PAGE);
        assert!(stylesheets.is_empty());
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_value_self_heals() {
        let plugin = BreadcrumbsPlugin::default();
        let session = MemorySessionStore::new();
        session.set(TRAIL_KEY, b"(lp1\nS'wiki/Old'\na.").await.unwrap();

        assert!(plugin.crumbs(&session).await.is_empty());
        assert!(session.get(TRAIL_KEY).await.unwrap().is_none());

        plugin.post_process_request("/wiki/New", &session).await;
        assert_eq!(plugin.crumbs(&session).await.canonical(), vec!["wiki/New"]);
    }

    #[tokio::test]
    async fn test_stored_trail_is_capped_on_load() {
        let config = BreadcrumbsConfig {
            max_crumbs: 2,
            ..Default::default()
        };
        let plugin = BreadcrumbsPlugin::new(TrackingConfig::from_config(&config).unwrap());
        let session = MemorySessionStore::new();
        session
            .set(TRAIL_KEY, br#"["wiki/A","wiki/B","wiki/C"]"#)
            .await
            .unwrap();

        plugin.post_process_request("/wiki/C", &session).await;
        assert_eq!(plugin.crumbs(&session).await.canonical(), vec!["wiki/C", "wiki/A"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let plugin = BreadcrumbsPlugin::default();
        let session = MemorySessionStore::new();
        plugin.post_process_request("/milestone/1.0", &session).await;
        plugin.clear(&session).await.unwrap();
        assert!(plugin.crumbs(&session).await.is_empty());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = Config::default();
        config.breadcrumbs.max_crumbs = 0;
        assert!(BreadcrumbsPlugin::from_config(&config).is_err());
        assert!(BreadcrumbsPlugin::from_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_stylesheet_targets_breadcrumbs_list() {
        assert!(STYLESHEET.contains("#breadcrumbs"));
    }
}
