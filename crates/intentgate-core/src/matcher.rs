//! Active-site matching and the per-page gating decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PageIdentity;
use crate::sites::ActiveSiteSet;
use crate::whitelist::Whitelist;

/// Whether gating applies to a page.
///
/// Rules, in order:
/// 1. the exact URL is literally in the set;
/// 2. some entry `site` is a substring of the domain and the domain does not
///    contain `"." + site`.
///
/// Rule 2 is asymmetric: `google.com` does not activate
/// `meet.google.com`, and `meet.google.com` does not activate `google.com`.
/// It also means an entry embedded inside an unrelated host (`oogle.com`
/// in `google.com`, `news.com` in `badnews.com`) matches.
pub fn is_active(candidate_domain: &str, candidate_exact_url: &str, active_sites: &ActiveSiteSet) -> bool {
    if !candidate_exact_url.is_empty() && active_sites.contains(candidate_exact_url) {
        return true;
    }
    if candidate_domain.is_empty() {
        return false;
    }
    active_sites.iter().any(|site| {
        !site.is_empty()
            && candidate_domain.contains(site)
            && !candidate_domain.contains(&format!(".{site}"))
    })
}

/// Pages that are never gated regardless of the active set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRules {
    /// Substrings of link-redirect wrappers (`l.facebook.com`) that pass through.
    #[serde(default)]
    pub passthrough_wrappers: Vec<String>,
    /// Full hrefs of the onboarding pages.
    #[serde(default)]
    pub onboarding_urls: Vec<String>,
}

impl GateRules {
    pub fn is_passthrough(&self, href: &str) -> bool {
        self.passthrough_wrappers
            .iter()
            .any(|wrapper| !wrapper.is_empty() && href.contains(wrapper.as_str()))
    }

    pub fn is_onboarding(&self, href: &str) -> bool {
        self.onboarding_urls.iter().any(|url| url == href)
    }

    pub fn exempts(&self, href: &str) -> bool {
        self.is_onboarding(href) || self.is_passthrough(href)
    }
}

/// Outcome of one gating evaluation. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GatingDecision {
    NotApplicable,
    WhitelistedActive { expires_at: DateTime<Utc> },
    RequiresPrompt,
}

impl GatingDecision {
    pub fn requires_prompt(&self) -> bool {
        matches!(self, GatingDecision::RequiresPrompt)
    }
}

/// Combine matcher, exemption rules and whitelist into a decision.
pub fn evaluate(
    page: &PageIdentity,
    active_sites: &ActiveSiteSet,
    whitelist: &Whitelist,
    rules: &GateRules,
    now: DateTime<Utc>,
) -> GatingDecision {
    if rules.exempts(&page.href) {
        return GatingDecision::NotApplicable;
    }
    if !is_active(&page.domain, &page.exact_url, active_sites) {
        return GatingDecision::NotApplicable;
    }
    match whitelist.active_expiry(&page.domain, now) {
        Some(expires_at) => GatingDecision::WhitelistedActive { expires_at },
        None => GatingDecision::RequiresPrompt,
    }
}
