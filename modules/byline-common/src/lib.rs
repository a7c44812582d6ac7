pub mod config;
pub mod error;
pub mod file_config;
pub mod profile;
pub mod types;

pub use config::ScraperConfig;
pub use error::{RecordError, RecordResult};
pub use file_config::load_trust_profiles;
pub use profile::{
    host_of, normalize_host, AuthorTrustProfile, BlogIdentity, BookIdentity, ChannelIdentity,
    PodcastIdentity, SocialIdentity, TrustProfiles,
};
pub use types::{content_id, keys, word_count, ContentRecord, Platform};
