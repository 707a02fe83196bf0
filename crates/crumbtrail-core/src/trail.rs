//! Breadcrumb entries and the bounded, recency-ordered trail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default cap on trail length.
pub const DEFAULT_MAX_CRUMBS: usize = 6;

/// A visited resource within a realm, e.g. `wiki/WikiStart` or `ticket/42`.
///
/// Serializes as its canonical `realm/resource` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CrumbEntry {
    realm: String,
    resource: String,
}

impl CrumbEntry {
    /// Create an entry. The realm must be non-empty and free of `/`.
    pub fn new(realm: impl Into<String>, resource: impl Into<String>) -> Result<Self, Error> {
        let realm = realm.into();
        let resource = resource.into();
        if realm.is_empty() || realm.contains('/') {
            return Err(Error::InvalidCrumb(format!("{}/{}", realm, resource)));
        }
        Ok(Self { realm, resource })
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The canonical `realm/resource` form.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CrumbEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.realm, self.resource)
    }
}

impl FromStr for CrumbEntry {
    type Err = Error;

    /// Splits on the first `/`; everything after it is the resource.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((realm, resource)) => Self::new(realm, resource),
            None => Err(Error::InvalidCrumb(s.to_string())),
        }
    }
}

impl TryFrom<String> for CrumbEntry {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrumbEntry> for String {
    fn from(entry: CrumbEntry) -> Self {
        entry.canonical()
    }
}

/// Recently visited entries, most recent first, without duplicates.
///
/// All mutating operations are pure: they return a new trail and leave
/// `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CrumbTrail {
    entries: Vec<CrumbEntry>,
}

impl CrumbTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trail from entries in recency order.
    ///
    /// Later duplicates are dropped so the first (most recent) occurrence
    /// wins.
    pub fn from_entries(entries: impl IntoIterator<Item = CrumbEntry>) -> Self {
        let mut deduped: Vec<CrumbEntry> = Vec::new();
        for entry in entries {
            if !deduped.contains(&entry) {
                deduped.push(entry);
            }
        }
        Self { entries: deduped }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &CrumbEntry) -> bool {
        self.entries.contains(entry)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CrumbEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CrumbEntry] {
        &self.entries
    }

    /// Canonical strings in trail order.
    pub fn canonical(&self) -> Vec<String> {
        self.entries.iter().map(CrumbEntry::canonical).collect()
    }

    /// Move an existing entry to the front. Length is unchanged; if the
    /// entry is absent the trail is returned as-is.
    pub fn move_to_front(&self, entry: &CrumbEntry) -> Self {
        let Some(pos) = self.entries.iter().position(|e| e == entry) else {
            return self.clone();
        };
        let mut entries = self.entries.clone();
        let moved = entries.remove(pos);
        entries.insert(0, moved);
        Self { entries }
    }

    /// Insert a new entry at the front, then keep only the first `cap`.
    ///
    /// If the entry is already present it is moved instead, so the trail
    /// never holds duplicates.
    pub fn insert_capped(&self, entry: CrumbEntry, cap: usize) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.extend(self.entries.iter().filter(|e| **e != entry).cloned());
        entries.insert(0, entry);
        entries.truncate(cap);
        Self { entries }
    }

    /// The first `cap` entries.
    pub fn truncated(&self, cap: usize) -> Self {
        let mut entries = self.entries.clone();
        entries.truncate(cap);
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a CrumbTrail {
    type Item = &'a CrumbEntry;
    type IntoIter = std::slice::Iter<'a, CrumbEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> Deserialize<'de> for CrumbTrail {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<CrumbEntry>::deserialize(deserializer)?;
        Ok(Self::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(s: &str) -> CrumbEntry {
        s.parse().unwrap()
    }

    fn trail(items: &[&str]) -> CrumbTrail {
        CrumbTrail::from_entries(items.iter().map(|s| entry(s)))
    }

    #[test]
    fn test_parse_splits_on_first_slash() {
        let e = entry("wiki/Sub/Page");
        assert_eq!(e.realm(), "wiki");
        assert_eq!(e.resource(), "Sub/Page");
        assert_eq!(e.canonical(), "wiki/Sub/Page");
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!("wiki".parse::<CrumbEntry>().is_err());
        assert!("/Page".parse::<CrumbEntry>().is_err());
    }

    #[test]
    fn test_move_to_front_keeps_length() {
        let t = trail(&["wiki/C", "wiki/B", "wiki/A"]);
        let moved = t.move_to_front(&entry("wiki/A"));
        assert_eq!(moved.canonical(), vec!["wiki/A", "wiki/C", "wiki/B"]);
        // original untouched
        assert_eq!(t.canonical(), vec!["wiki/C", "wiki/B", "wiki/A"]);
    }

    #[test]
    fn test_move_to_front_absent_is_noop() {
        let t = trail(&["wiki/A"]);
        assert_eq!(t.move_to_front(&entry("wiki/Z")), t);
    }

    #[test]
    fn test_insert_capped_truncates() {
        let t = trail(&["wiki/C", "wiki/B", "wiki/A"]);
        let inserted = t.insert_capped(entry("wiki/D"), 3);
        assert_eq!(inserted.canonical(), vec!["wiki/D", "wiki/C", "wiki/B"]);
    }

    #[test]
    fn test_insert_capped_existing_does_not_duplicate() {
        let t = trail(&["wiki/B", "wiki/A"]);
        let inserted = t.insert_capped(entry("wiki/A"), 6);
        assert_eq!(inserted.canonical(), vec!["wiki/A", "wiki/B"]);
    }

    #[test]
    fn test_from_entries_keeps_first_occurrence() {
        let t = trail(&["wiki/A", "ticket/1", "wiki/A"]);
        assert_eq!(t.canonical(), vec!["wiki/A", "ticket/1"]);
    }

    #[test]
    fn test_serde_as_string_list() {
        let t = trail(&["ticket/42", "wiki/Home"]);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"["ticket/42","wiki/Home"]"#);
        let back: CrumbTrail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_deserialize_rejects_bad_entry() {
        assert!(serde_json::from_str::<CrumbTrail>(r#"["wiki/A","broken"]"#).is_err());
    }
}
