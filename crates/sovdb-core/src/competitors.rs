use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One competitor tracked alongside the brand in share-of-voice charts.
///
/// The roster lives in `config/competitors.yaml` and is loaded at startup;
/// competitors are not persisted to the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorRecord {
    pub name: String,
    pub website: Option<String>,
    /// Chart slice color, `#rrggbb`.
    pub color: String,
}

impl CompetitorRecord {
    /// Generate a URL-safe slug from the competitor name.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Generate a URL-safe slug from a display name.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct CompetitorsFile {
    pub competitors: Vec<CompetitorRecord>,
}

/// Load and validate the competitor roster from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_competitors(path: &Path) -> Result<CompetitorsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RosterIo {
        path: path.to_path_buf(),
        source: e,
    })?;

    let roster: CompetitorsFile = serde_yaml::from_str(&content)?;

    validate_competitors(&roster)?;

    Ok(roster)
}

fn validate_competitors(roster: &CompetitorsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for competitor in &roster.competitors {
        if competitor.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "competitor name must be non-empty".to_string(),
            ));
        }

        if !is_hex_color(&competitor.color) {
            return Err(ConfigError::Validation(format!(
                "competitor '{}' has invalid color '{}'; expected #rrggbb",
                competitor.name, competitor.color
            )));
        }

        let slug = competitor.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate competitor slug: '{}' (from competitor '{}')",
                slug, competitor.name
            )));
        }
    }

    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
