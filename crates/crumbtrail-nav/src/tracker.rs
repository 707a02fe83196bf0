//! Deciding whether a request path becomes a breadcrumb, and updating the
//! trail when it does.

use crumbtrail_core::{CrumbEntry, CrumbTrail, TrackingConfig};

/// Why a request path was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than `/realm/resource` segments.
    TooFewSegments,
    /// The path matches none of the supported globs.
    Unsupported,
    /// The resource matches the ignore pattern.
    Ignored,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::TooFewSegments => "too few path segments",
            SkipReason::Unsupported => "path not supported",
            SkipReason::Ignored => "resource ignored",
        };
        f.write_str(reason)
    }
}

/// Outcome of a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    Recorded(CrumbTrail),
    Skipped(SkipReason),
}

/// Records visited paths into a trail under a move-to-front, capped policy.
#[derive(Debug, Clone, Default)]
pub struct CrumbTracker {
    config: TrackingConfig,
}

impl CrumbTracker {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// The entry a request path would record, or why it would not.
    ///
    /// `/wiki/Foo&action=edit` yields `wiki/Foo`: anything from the first
    /// `&` in the resource is dropped.
    pub fn entry_for(&self, path: &str) -> Result<CrumbEntry, SkipReason> {
        let (realm, resource) = split_path(path).ok_or(SkipReason::TooFewSegments)?;

        if !self.config.is_supported(path) {
            return Err(SkipReason::Unsupported);
        }

        if self.config.is_ignored(resource) {
            return Err(SkipReason::Ignored);
        }

        let resource = match resource.find('&') {
            Some(idx) => &resource[..idx],
            None => resource,
        };
        if resource.is_empty() {
            return Err(SkipReason::TooFewSegments);
        }

        CrumbEntry::new(realm, resource).map_err(|_| SkipReason::TooFewSegments)
    }

    /// Put `entry` at the front of `trail`.
    pub fn apply(&self, entry: CrumbEntry, trail: &CrumbTrail) -> CrumbTrail {
        if trail.contains(&entry) {
            trail.move_to_front(&entry)
        } else {
            trail.insert_capped(entry, self.config.max_crumbs())
        }
    }

    pub fn visit(&self, path: &str, trail: &CrumbTrail) -> Visit {
        match self.entry_for(path) {
            Ok(entry) => Visit::Recorded(self.apply(entry, trail)),
            Err(reason) => Visit::Skipped(reason),
        }
    }

    /// The trail after visiting `path`; unchanged when the path is skipped.
    pub fn record(&self, path: &str, trail: &CrumbTrail) -> CrumbTrail {
        match self.visit(path, trail) {
            Visit::Recorded(updated) => updated,
            Visit::Skipped(_) => trail.clone(),
        }
    }
}

/// `/realm/resource...` into `(realm, resource)`. The resource keeps any
/// further slashes.
fn split_path(path: &str) -> Option<(&str, &str)> {
    let mut parts = path.splitn(3, '/');
    let _root = parts.next()?;
    let realm = parts.next()?;
    let resource = parts.next()?;
    if realm.is_empty() || resource.is_empty() {
        return None;
    }
    Some((realm, resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumbtrail_core::BreadcrumbsConfig;
    use pretty_assertions::assert_eq;

    fn tracker(max_crumbs: usize, paths: &[&str], ignore: Option<&str>) -> CrumbTracker {
        let config = BreadcrumbsConfig {
            ignore_pattern: ignore.map(str::to_string),
            max_crumbs,
            supported_paths: paths.iter().map(|p| p.to_string()).collect(),
        };
        CrumbTracker::new(TrackingConfig::from_config(&config).unwrap())
    }

    fn visit_all(tracker: &CrumbTracker, paths: &[&str]) -> CrumbTrail {
        paths
            .iter()
            .fold(CrumbTrail::new(), |trail, path| tracker.record(path, &trail))
    }

    #[test]
    fn test_cap_keeps_most_recent() {
        let t = tracker(3, &["/wiki*"], None);
        let trail = visit_all(&t, &["/wiki/A", "/wiki/B", "/wiki/C", "/wiki/D"]);
        assert_eq!(trail.canonical(), vec!["wiki/D", "wiki/C", "wiki/B"]);
    }

    #[test]
    fn test_revisit_moves_to_front() {
        let t = CrumbTracker::default();
        let trail = visit_all(&t, &["/wiki/A", "/ticket/1", "/milestone/m1", "/wiki/A"]);
        assert_eq!(trail.canonical(), vec!["wiki/A", "milestone/m1", "ticket/1"]);
    }

    #[test]
    fn test_query_suffix_stripped() {
        let t = CrumbTracker::default();
        let trail = t.record("/wiki/Foo&action=edit", &CrumbTrail::new());
        assert_eq!(trail.canonical(), vec!["wiki/Foo"]);
    }

    #[test]
    fn test_short_paths_skipped() {
        let t = CrumbTracker::default();
        let empty = CrumbTrail::new();
        assert_eq!(t.visit("/wiki", &empty), Visit::Skipped(SkipReason::TooFewSegments));
        assert_eq!(t.visit("/", &empty), Visit::Skipped(SkipReason::TooFewSegments));
        assert_eq!(t.visit("/wiki/", &empty), Visit::Skipped(SkipReason::TooFewSegments));
        assert_eq!(t.visit("/wiki/&x=1", &empty), Visit::Skipped(SkipReason::TooFewSegments));
    }

    #[test]
    fn test_unsupported_path_skipped() {
        let t = CrumbTracker::default();
        let trail = visit_all(&t, &["/wiki/A"]);
        assert_eq!(t.visit("/timeline/today", &trail), Visit::Skipped(SkipReason::Unsupported));
        assert_eq!(t.record("/browser/trunk", &trail), trail);
    }

    #[test]
    fn test_ignore_pattern_checked_before_suffix_strip() {
        let t = tracker(6, &["/wiki*"], Some("Sandbox"));
        let empty = CrumbTrail::new();
        assert_eq!(t.visit("/wiki/SandboxPage", &empty), Visit::Skipped(SkipReason::Ignored));
        assert_eq!(
            t.record("/wiki/MySandbox", &empty).canonical(),
            vec!["wiki/MySandbox"]
        );
    }

    #[test]
    fn test_nested_resource_kept_whole() {
        let t = CrumbTracker::default();
        let entry = t.entry_for("/wiki/Guide/Install").unwrap();
        assert_eq!(entry.realm(), "wiki");
        assert_eq!(entry.resource(), "Guide/Install");
    }

    #[test]
    fn test_glob_is_case_sensitive() {
        let t = CrumbTracker::default();
        assert_eq!(t.entry_for("/Wiki/A"), Err(SkipReason::Unsupported));
    }
}
