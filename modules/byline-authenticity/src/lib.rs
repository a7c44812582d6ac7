//! Authenticity scoring: how confident are we that a content record was
//! really published by its claimed author?
//!
//! A score is the sum of three independent sub-scores (domain 0-40, platform
//! 0-40, metadata 0-20), clamped to 0-100 and compared with a pass threshold.

pub mod domain;
pub mod error;
pub mod metadata;
pub mod platform;
pub mod scorer;

pub use domain::domain_score;
pub use error::{ScoringError, ScoringResult};
pub use metadata::metadata_score;
pub use platform::platform_score;
pub use scorer::{score_record, AuthenticityScorer, ScoreBreakdown, Verdict};
