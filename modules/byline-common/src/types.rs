use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RecordError, RecordResult};

/// Metadata keys shared between extraction collaborators and the scorer.
pub mod keys {
    pub const WORD_COUNT: &str = "word_count";
    pub const METRICS: &str = "metrics";
    pub const CHANNEL_NAME: &str = "channel_name";
    pub const CHANNEL_ID: &str = "channel_id";
    pub const HANDLE: &str = "handle";
    pub const BLOG_NAME: &str = "blog_name";
    pub const DOMAIN: &str = "domain";
    pub const PODCAST_NAME: &str = "podcast_name";
    pub const BOOK_TITLE: &str = "book_title";
    pub const VALIDATION: &str = "validation";
}

/// Number of content characters folded into a record id.
const ID_CONTENT_PREFIX_CHARS: usize = 1000;

/// Source platform of a content record.
///
/// The set is closed; anything unrecognised is carried as `Other` so the
/// scorer can still treat it neutrally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Blog,
    SocialPost,
    Video,
    AudioEpisode,
    Book,
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Blog => "blog",
            Self::SocialPost => "social-post",
            Self::Video => "video",
            Self::AudioEpisode => "audio-episode",
            Self::Book => "book",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Platform {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" => Self::Blog,
            "social-post" | "social_post" | "twitter" => Self::SocialPost,
            "video" | "youtube" => Self::Video,
            "audio-episode" | "audio_episode" | "podcast" => Self::AudioEpisode,
            "book" => Self::Book,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for Platform {
    fn from(s: String) -> Self {
        Platform::from(s.as_str())
    }
}

impl From<Platform> for String {
    fn from(p: Platform) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of content attributed to an author, as handed over by the
/// extraction layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub author: String,
    #[serde(default)]
    pub author_name: Option<String>,
    pub platform: Platform,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date_published: Option<DateTime<Utc>>,
    pub date_scraped: DateTime<Utc>,
    #[serde(default)]
    pub authenticity_score: Option<u8>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub processed: bool,
}

impl ContentRecord {
    /// Build a record with a derived id and `word_count` metadata.
    pub fn new(
        author: impl Into<String>,
        platform: impl Into<Platform>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let content = content.into();
        let id = content_id(&url, &content);
        let mut metadata = HashMap::new();
        metadata.insert(keys::WORD_COUNT.to_string(), word_count(&content).into());

        Self {
            id,
            author: author.into(),
            author_name: None,
            platform: platform.into(),
            content_type: None,
            title: None,
            content,
            url: if url.is_empty() { None } else { Some(url) },
            date_published: None,
            date_scraped: Utc::now(),
            authenticity_score: None,
            metadata,
            processed: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, ct: impl Into<String>) -> Self {
        self.content_type = Some(ct.into());
        self
    }

    pub fn with_date_published(mut self, at: DateTime<Utc>) -> Self {
        self.date_published = Some(at);
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String metadata value, or `None` if absent or not a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Extract the site URL (scheme + host) from this record's URL.
    pub fn site_url(&self) -> Option<String> {
        let parsed = url::Url::parse(self.url.as_deref()?).ok()?;
        Some(format!("{}://{}", parsed.scheme(), parsed.host_str()?))
    }

    /// Basic sanity check applied before a record is scored or stored.
    pub fn validate(&self, min_content_length: usize) -> RecordResult<()> {
        if self.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(RecordError::MissingField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(RecordError::MissingField("content"));
        }
        if self.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(RecordError::MissingField("url"));
        }
        let len = self.content.chars().count();
        if len < min_content_length {
            return Err(RecordError::ContentTooShort {
                length: len,
                minimum: min_content_length,
            });
        }
        Ok(())
    }
}

/// Stable record id: SHA-256 over the URL and the leading content.
pub fn content_id(url: &str, content: &str) -> String {
    use sha2::{Digest, Sha256};
    let prefix: String = content.chars().take(ID_CONTENT_PREFIX_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b":");
    hasher.update(prefix.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn word_count(content: &str) -> u64 {
    content.split_whitespace().count() as u64
}
