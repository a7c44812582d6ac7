//! Domain sub-score: is the record hosted where the author publishes?

use byline_common::normalize_host;
use url::Url;

use crate::error::{ScoringError, ScoringResult};

pub const OFFICIAL: u8 = 40;
pub const OFFICIAL_SUBDOMAIN: u8 = 35;
pub const NO_DOMAINS_CONFIGURED: u8 = 20;
pub const UNVERIFIED: u8 = 0;

/// Score `url` against an author's domain whitelist.
///
/// `whitelist` entries are expected normalized (see
/// [`byline_common::AuthorTrustProfile::domain_whitelist`]). A record without
/// a URL has nothing to verify and scores 0; a URL that is present but cannot
/// be parsed is an error.
pub fn domain_score(url: Option<&str>, whitelist: &[String]) -> ScoringResult<u8> {
    let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(UNVERIFIED);
    };

    let parsed = Url::parse(raw).map_err(|e| ScoringError::MalformedUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed
        .host_str()
        .map(normalize_host)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ScoringError::MalformedUrl {
            url: raw.to_string(),
            reason: "no host".to_string(),
        })?;

    if whitelist.is_empty() {
        tracing::warn!(host = %host, "No official domains configured, neutral domain score");
        return Ok(NO_DOMAINS_CONFIGURED);
    }

    if whitelist.iter().any(|d| *d == host) {
        tracing::debug!(host = %host, "Official domain verified");
        return Ok(OFFICIAL);
    }

    if whitelist
        .iter()
        .any(|d| host.ends_with(&format!(".{d}")))
    {
        tracing::debug!(host = %host, "Official subdomain verified");
        return Ok(OFFICIAL_SUBDOMAIN);
    }

    tracing::warn!(host = %host, "Domain not in whitelist");
    Ok(UNVERIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist(domains: &[&str]) -> Vec<String> {
        domains.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_exact_domain() {
        let wl = whitelist(&["tim.blog"]);
        assert_eq!(domain_score(Some("https://tim.blog/post/1"), &wl), Ok(40));
        assert_eq!(domain_score(Some("https://www.Tim.Blog/post/1"), &wl), Ok(40));
    }

    #[test]
    fn test_subdomain() {
        let wl = whitelist(&["tim.blog"]);
        assert_eq!(domain_score(Some("https://sub.tim.blog/x"), &wl), Ok(35));
        assert_eq!(domain_score(Some("https://a.b.tim.blog/x"), &wl), Ok(35));
    }

    #[test]
    fn test_lookalike_is_not_a_subdomain() {
        let wl = whitelist(&["tim.blog"]);
        assert_eq!(domain_score(Some("https://eviltim.blog/x"), &wl), Ok(0));
        assert_eq!(domain_score(Some("https://evil.com/x"), &wl), Ok(0));
    }

    #[test]
    fn test_no_domains_configured_is_neutral() {
        assert_eq!(domain_score(Some("https://anything.example/"), &[]), Ok(20));
    }

    #[test]
    fn test_missing_url_scores_zero() {
        let wl = whitelist(&["tim.blog"]);
        assert_eq!(domain_score(None, &wl), Ok(0));
        assert_eq!(domain_score(Some("  "), &wl), Ok(0));
        assert_eq!(domain_score(None, &[]), Ok(0));
    }

    #[test]
    fn test_malformed_url_is_an_error() {
        let wl = whitelist(&["tim.blog"]);
        assert!(matches!(
            domain_score(Some("not a url"), &wl),
            Err(ScoringError::MalformedUrl { .. })
        ));
        assert!(matches!(
            domain_score(Some("mailto:tim@tim.blog"), &wl),
            Err(ScoringError::MalformedUrl { .. })
        ));
    }
}
