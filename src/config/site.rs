//! Site configuration (frontdoc.yml)

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::content::ParseOptions;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Directory
    pub content_dir: String,
    /// File extensions treated as content documents
    pub extensions: Vec<String>,

    // Dates
    /// IANA zone for timestamps written without an offset, e.g. `America/Los_Angeles`.
    /// Empty means such timestamps are rejected.
    pub timezone: String,

    // Writing
    pub new_post_name: String,
    /// Whether `new` scaffolds documents as drafts
    pub new_post_draft: bool,
    pub render_drafts: bool,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            extensions: vec!["md".to_string(), "markdown".to_string()],

            timezone: String::new(),

            new_post_name: ":title.md".to_string(),
            new_post_draft: true,
            render_drafts: false,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        // Surface a bad zone at load time rather than on every document
        config.timezone()?;
        Ok(config)
    }

    /// The configured timezone, if any
    pub fn timezone(&self) -> Result<Option<Tz>> {
        let name = self.timezone.trim();
        if name.is_empty() {
            return Ok(None);
        }
        name.parse::<Tz>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid timezone {:?}: {}", name, e))
    }

    /// Parser options derived from this configuration
    pub fn parse_options(&self) -> Result<ParseOptions> {
        Ok(ParseOptions {
            timezone: self.timezone()?,
        })
    }

    /// Check whether a path has one of the configured extensions
    pub fn is_content_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}
