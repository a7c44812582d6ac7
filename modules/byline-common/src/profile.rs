use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ground truth for one author: official domains and the platform identities
/// the author is known to publish under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorTrustProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub official_domains: Vec<String>,
    #[serde(default, alias = "twitter")]
    pub social: Option<SocialIdentity>,
    #[serde(default, alias = "youtube_channels")]
    pub channels: Vec<ChannelIdentity>,
    #[serde(default)]
    pub blogs: Vec<BlogIdentity>,
    #[serde(default)]
    pub podcasts: Vec<PodcastIdentity>,
    #[serde(default)]
    pub books: Vec<BookIdentity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialIdentity {
    pub handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "channel_id")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl BlogIdentity {
    /// Normalized host of the blog URL, if one is configured and parseable.
    pub fn domain(&self) -> Option<String> {
        self.url.as_deref().and_then(host_of)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodcastIdentity {
    pub name: String,
    #[serde(default)]
    pub rss_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookIdentity {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl AuthorTrustProfile {
    pub fn with_official_domain(mut self, domain: impl Into<String>) -> Self {
        self.official_domains.push(domain.into());
        self
    }

    pub fn with_social_handle(mut self, handle: impl Into<String>) -> Self {
        self.social = Some(SocialIdentity {
            handle: handle.into(),
        });
        self
    }

    pub fn with_channel(mut self, name: impl Into<String>, id: Option<&str>) -> Self {
        self.channels.push(ChannelIdentity {
            name: name.into(),
            id: id.map(String::from),
        });
        self
    }

    pub fn with_blog(mut self, name: impl Into<String>, url: Option<&str>) -> Self {
        self.blogs.push(BlogIdentity {
            name: name.into(),
            url: url.map(String::from),
        });
        self
    }

    pub fn with_podcast(mut self, name: impl Into<String>) -> Self {
        self.podcasts.push(PodcastIdentity {
            name: name.into(),
            rss_url: None,
        });
        self
    }

    pub fn with_book(mut self, title: impl Into<String>) -> Self {
        self.books.push(BookIdentity {
            title: title.into(),
            url: None,
        });
        self
    }

    /// Official domains plus the domain of every configured blog, normalized
    /// and deduplicated in configuration order.
    pub fn domain_whitelist(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        let configured = self
            .official_domains
            .iter()
            .filter_map(|d| normalize_domain_entry(d));
        let from_blogs = self.blogs.iter().filter_map(BlogIdentity::domain);

        for domain in configured.chain(from_blogs) {
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }
}

/// Immutable author-id → profile table for one scoring session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustProfiles {
    authors: HashMap<String, AuthorTrustProfile>,
}

impl TrustProfiles {
    pub fn new(authors: HashMap<String, AuthorTrustProfile>) -> Self {
        Self { authors }
    }

    pub fn with_author(mut self, id: impl Into<String>, profile: AuthorTrustProfile) -> Self {
        self.authors.insert(id.into(), profile);
        self
    }

    pub fn get(&self, author: &str) -> Option<&AuthorTrustProfile> {
        self.authors.get(author)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub fn author_ids(&self) -> impl Iterator<Item = &str> {
        self.authors.keys().map(String::as_str)
    }
}

impl FromIterator<(String, AuthorTrustProfile)> for TrustProfiles {
    fn from_iter<T: IntoIterator<Item = (String, AuthorTrustProfile)>>(iter: T) -> Self {
        Self {
            authors: iter.into_iter().collect(),
        }
    }
}

/// Lowercase a host and strip a leading `www.` and trailing dot.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Normalized host of a URL, or `None` if it does not parse or has no host.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed.host_str().map(normalize_host)
}

/// Accepts bare domains as well as full URLs in the authors file.
fn normalize_domain_entry(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }
    if entry.contains("://") {
        return host_of(entry);
    }
    Some(normalize_host(entry.trim_end_matches('/')))
}
