use anyhow::{Context, Result};
use std::path::Path;

use crate::profile::TrustProfiles;

/// Load the author trust-profile table from disk.
///
/// `.json` files are parsed as JSON; anything else as TOML. Both formats are
/// a table keyed by author id.
pub fn load_trust_profiles(path: &Path) -> Result<TrustProfiles> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read authors file: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let profiles: TrustProfiles = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse authors file: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse authors file: {}", path.display()))?
    };

    tracing::info!(
        path = %path.display(),
        authors = profiles.len(),
        "Loaded author trust profiles"
    );
    Ok(profiles)
}
