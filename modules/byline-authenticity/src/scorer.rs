//! Combines the domain, platform and metadata sub-scores into a verdict and
//! annotates records with it.

use std::collections::HashMap;

use byline_common::{keys, AuthorTrustProfile, ContentRecord, ScraperConfig, TrustProfiles};
use serde::Serialize;
use serde_json::json;

use crate::domain::domain_score;
use crate::error::{ScoringError, ScoringResult};
use crate::metadata::metadata_score;
use crate::platform::platform_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub domain: u8,
    pub platform: u8,
    pub metadata: u8,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        let sum = u16::from(self.domain) + u16::from(self.platform) + u16::from(self.metadata);
        sum.min(100) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub score: u8,
    pub passed: bool,
    pub breakdown: ScoreBreakdown,
}

/// Score one record against one profile. Pure: no I/O, no mutation.
pub fn score_record(
    record: &ContentRecord,
    profile: &AuthorTrustProfile,
    threshold: u8,
) -> ScoringResult<Verdict> {
    score_with_whitelist(record, profile, &profile.domain_whitelist(), threshold)
}

fn score_with_whitelist(
    record: &ContentRecord,
    profile: &AuthorTrustProfile,
    whitelist: &[String],
    threshold: u8,
) -> ScoringResult<Verdict> {
    let breakdown = ScoreBreakdown {
        domain: domain_score(record.url.as_deref(), whitelist)?,
        platform: platform_score(&record.platform, &record.metadata, profile),
        metadata: metadata_score(&record.metadata),
    };
    let score = breakdown.total();
    Ok(Verdict {
        score,
        passed: score >= threshold,
        breakdown,
    })
}

/// Scores records against an immutable trust-profile table.
pub struct AuthenticityScorer {
    profiles: TrustProfiles,
    whitelists: HashMap<String, Vec<String>>,
    threshold: u8,
}

impl AuthenticityScorer {
    pub fn new(profiles: TrustProfiles, threshold: u8) -> Self {
        let whitelists: HashMap<String, Vec<String>> = profiles
            .author_ids()
            .filter_map(|id| {
                profiles
                    .get(id)
                    .map(|p| (id.to_string(), p.domain_whitelist()))
            })
            .collect();
        let threshold = threshold.min(100);
        tracing::info!(authors = whitelists.len(), threshold, "Built domain whitelist");

        Self {
            profiles,
            whitelists,
            threshold,
        }
    }

    pub fn from_config(profiles: TrustProfiles, config: &ScraperConfig) -> Self {
        Self::new(profiles, config.min_authenticity_score)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn profiles(&self) -> &TrustProfiles {
        &self.profiles
    }

    /// Normalized official domains for `author`, blog domains included.
    pub fn whitelist(&self, author: &str) -> Option<&[String]> {
        self.whitelists.get(author).map(Vec::as_slice)
    }

    pub fn score(&self, record: &ContentRecord) -> ScoringResult<Verdict> {
        let author = record.author.trim();
        if author.is_empty() {
            return Err(ScoringError::MissingAuthor);
        }
        // Fails closed: an author without a profile is an error, not a
        // neutral score against an empty profile.
        let profile = self
            .profiles
            .get(author)
            .ok_or_else(|| ScoringError::UnknownAuthor(author.to_string()))?;
        let whitelist = self.whitelist(author).unwrap_or_default();

        score_with_whitelist(record, profile, whitelist, self.threshold)
    }

    /// Score `record` and write the result into `authenticity_score` and
    /// `metadata.validation`. On error the record is left untouched.
    pub fn validate(&self, record: &mut ContentRecord) -> ScoringResult<Verdict> {
        let verdict = self.score(record)?;
        record.authenticity_score = Some(verdict.score);
        record.metadata.insert(
            keys::VALIDATION.to_string(),
            json!({ "score": verdict.score, "passed": verdict.passed }),
        );
        tracing::debug!(id = %record.id, score = verdict.score, passed = verdict.passed, "Scored record");
        Ok(verdict)
    }

    /// Score every record independently. A record that cannot be scored gets
    /// score 0, `passed = false` and the error in its validation block.
    pub fn validate_batch(&self, mut records: Vec<ContentRecord>) -> Vec<ContentRecord> {
        let mut failed = 0usize;
        for record in &mut records {
            if let Err(e) = self.validate(record) {
                failed += 1;
                tracing::error!(id = %record.id, author = %record.author, error = %e, "Failed to score record");
                record.authenticity_score = Some(0);
                record.metadata.insert(
                    keys::VALIDATION.to_string(),
                    json!({ "score": 0, "passed": false, "error": e.to_string() }),
                );
            }
        }
        tracing::info!(total = records.len(), failed, "Scored batch");
        records
    }

    /// Keep records scoring at least `min_score` (default: the configured
    /// threshold). Unscored records count as 0.
    pub fn filter_by_score(
        &self,
        records: Vec<ContentRecord>,
        min_score: Option<u8>,
    ) -> Vec<ContentRecord> {
        let min_score = min_score.unwrap_or(self.threshold);
        let total = records.len();
        let kept: Vec<ContentRecord> = records
            .into_iter()
            .filter(|r| r.authenticity_score.unwrap_or(0) >= min_score)
            .collect();
        tracing::info!(total, kept = kept.len(), min_score, "Filtered records by score");
        kept
    }
}
