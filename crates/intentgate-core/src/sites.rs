//! The set of sites gating is turned on for.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::domain;
use crate::error::ValidationError;

/// Ordered, duplicate-free collection of domains and exact URLs.
///
/// Granularities may mix: `news.com` and `https://blog.news.com` can both be
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveSiteSet {
    sites: IndexSet<String>,
}

/// Two-valued toolbar icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconState {
    On,
    Off,
}

impl ActiveSiteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set-union insert. Returns `true` if the site was not present.
    pub fn insert(&mut self, site: impl Into<String>) -> bool {
        self.sites.insert(site.into())
    }

    /// Removes the site, keeping the order of the rest.
    pub fn remove(&mut self, site: &str) -> bool {
        self.sites.shift_remove(site)
    }

    pub fn contains(&self, site: &str) -> bool {
        self.sites.contains(site)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn clear(&mut self) {
        self.sites.clear();
    }

    pub fn icon_state(&self) -> IconState {
        if self.is_empty() {
            IconState::Off
        } else {
            IconState::On
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveSiteSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            sites: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Canonical form for a user-entered site.
///
/// Full URLs collapse to their exact (origin) form; bare hosts are kept
/// lowercase without a leading `www.` so they act as domain entries. Input
/// that normalizes to nothing is rejected.
pub fn canonical_site(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    let canonical = if input.contains("://") {
        domain::exact_of(input)
    } else {
        domain::domain_of(input)
    };
    if canonical.is_empty() {
        return Err(ValidationError::InvalidSite(input.to_string()));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_set_union_and_keeps_order() {
        let mut set = ActiveSiteSet::new();
        assert!(set.insert("b.com"));
        assert!(set.insert("a.com"));
        assert!(!set.insert("b.com"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b.com", "a.com"]);
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let mut set: ActiveSiteSet = ["a.com", "b.com", "c.com"].into_iter().collect();
        assert!(set.remove("b.com"));
        assert!(!set.remove("b.com"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a.com", "c.com"]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let set: ActiveSiteSet = ["news.com", "https://blog.news.com"].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["news.com","https://blog.news.com"]"#);
        let back: ActiveSiteSet = serde_json::from_str(r#"["x.com","x.com"]"#).unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn icon_follows_emptiness() {
        let mut set = ActiveSiteSet::new();
        assert_eq!(set.icon_state(), IconState::Off);
        set.insert("news.com");
        assert_eq!(set.icon_state(), IconState::On);
    }

    #[test]
    fn canonical_site_forms() {
        assert_eq!(canonical_site("WWW.News.com").unwrap(), "news.com");
        assert_eq!(canonical_site("https://news.com/a/b").unwrap(), "https://news.com");
        assert!(canonical_site("chrome://newtab").is_err());
        assert!(canonical_site("   ").is_err());
    }
}
