//! Platform sub-score: does the record's platform identity match one the
//! author is known to use?

use std::collections::HashMap;

use byline_common::{keys, normalize_host, AuthorTrustProfile, Platform};
use serde_json::Value;

pub const VERIFIED: u8 = 40;
pub const VIDEO_NO_CHANNELS: u8 = 30;
pub const VIDEO_UNVERIFIED: u8 = 15;
pub const BLOG_UNVERIFIED: u8 = 15;
pub const PODCAST_UNVERIFIED: u8 = 25;
pub const BOOK_UNVERIFIED: u8 = 10;
pub const UNKNOWN_PLATFORM: u8 = 20;

pub fn platform_score(
    platform: &Platform,
    metadata: &HashMap<String, Value>,
    profile: &AuthorTrustProfile,
) -> u8 {
    match platform {
        // Social posts are only ever fetched from the author's own account.
        Platform::SocialPost => VERIFIED,
        Platform::Video => video_score(metadata, profile),
        Platform::Blog => blog_score(metadata, profile),
        Platform::AudioEpisode => podcast_score(metadata, profile),
        Platform::Book => book_score(metadata, profile),
        Platform::Other(name) if name.trim().is_empty() => 0,
        Platform::Other(name) => {
            tracing::warn!(platform = %name, "Unknown platform, neutral platform score");
            UNKNOWN_PLATFORM
        }
    }
}

fn video_score(metadata: &HashMap<String, Value>, profile: &AuthorTrustProfile) -> u8 {
    let channel_name = non_empty(metadata, keys::CHANNEL_NAME);
    let channel_id = non_empty(metadata, keys::CHANNEL_ID);

    let matched = profile.channels.iter().any(|c| {
        channel_name.is_some_and(|n| n == c.name)
            || matches!((channel_id, c.id.as_deref()), (Some(a), Some(b)) if a == b)
    });
    if matched {
        return VERIFIED;
    }
    if profile.channels.is_empty() {
        return VIDEO_NO_CHANNELS;
    }

    tracing::warn!(
        channel_name = channel_name.unwrap_or_default(),
        "Video channel not verified"
    );
    VIDEO_UNVERIFIED
}

fn blog_score(metadata: &HashMap<String, Value>, profile: &AuthorTrustProfile) -> u8 {
    let blog_name = non_empty(metadata, keys::BLOG_NAME);
    let domain = non_empty(metadata, keys::DOMAIN).map(normalize_host);

    let matched = profile.blogs.iter().any(|b| {
        blog_name.is_some_and(|n| n == b.name)
            || matches!((&domain, b.domain()), (Some(d), Some(bd)) if *d == bd)
    });
    if matched {
        return VERIFIED;
    }

    tracing::warn!(
        blog_name = blog_name.unwrap_or_default(),
        domain = domain.as_deref().unwrap_or_default(),
        "Blog not verified"
    );
    BLOG_UNVERIFIED
}

fn podcast_score(metadata: &HashMap<String, Value>, profile: &AuthorTrustProfile) -> u8 {
    let podcast_name = non_empty(metadata, keys::PODCAST_NAME);
    if podcast_name.is_some_and(|n| profile.podcasts.iter().any(|p| p.name == n)) {
        return VERIFIED;
    }
    // Likely a guest appearance on someone else's show.
    tracing::debug!(
        podcast_name = podcast_name.unwrap_or_default(),
        "Podcast not among the author's own shows"
    );
    PODCAST_UNVERIFIED
}

fn book_score(metadata: &HashMap<String, Value>, profile: &AuthorTrustProfile) -> u8 {
    let book_title = non_empty(metadata, keys::BOOK_TITLE);
    if book_title.is_some_and(|t| profile.books.iter().any(|b| b.title == t)) {
        return VERIFIED;
    }
    tracing::warn!(
        book_title = book_title.unwrap_or_default(),
        "Book not verified"
    );
    BOOK_UNVERIFIED
}

/// Non-empty string metadata value. Empty strings never match an identity.
fn non_empty<'a>(metadata: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
