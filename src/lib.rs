//! frontdoc: front-matter content documents
//!
//! This crate parses and validates markdown documents that start with a
//! `---` delimited metadata block (title, date, draft flag), and provides a
//! small CLI for checking, listing and scaffolding them in a content directory.

pub mod commands;
pub mod config;
pub mod content;

use anyhow::Result;
use std::path::Path;

pub use content::{parse, serialize, ContentDocument, Field, ParseError};

/// Name of the configuration file in the base directory
pub const CONFIG_FILE: &str = "frontdoc.yml";

/// A content site rooted at a directory
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Content directory
    pub content_dir: std::path::PathBuf,
}

impl Site {
    /// Create a new Site instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            tracing::debug!("Loading config from {:?}", config_path);
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a Site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        Self {
            config,
            base_dir,
            content_dir,
        }
    }

    /// Validate every document in the content directory
    pub fn check(&self) -> Result<()> {
        commands::check::run(self)
    }

    /// Create a new document
    pub fn new_document(&self, title: &str, draft: bool) -> Result<std::path::PathBuf> {
        commands::new::create_document(self, title, draft, None)
    }
}
