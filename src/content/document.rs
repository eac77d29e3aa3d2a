//! The content document model

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;

use super::markdown::{self, Block, Link};

/// A markdown document with its front-matter
///
/// Built by [`super::frontmatter::parse`], or by hand for scaffolding.
/// Timestamps compare as instants, so two documents whose dates differ only
/// in offset notation are equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDocument {
    title: String,
    published_at: DateTime<FixedOffset>,
    draft: bool,
    /// Unrecognized front-matter keys, in source order
    extra: IndexMap<String, serde_yaml::Value>,
    body: String,
}

impl ContentDocument {
    /// Create a published document with an empty body
    pub fn new(title: impl Into<String>, published_at: DateTime<FixedOffset>) -> Self {
        Self {
            title: title.into(),
            published_at,
            draft: false,
            extra: IndexMap::new(),
            body: String::new(),
        }
    }

    pub fn with_draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_yaml::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Authored publish time, not the time a renderer processes the document
    pub fn published_at(&self) -> DateTime<FixedOffset> {
        self.published_at
    }

    pub fn draft(&self) -> bool {
        self.draft
    }

    pub fn extra(&self) -> &IndexMap<String, serde_yaml::Value> {
        &self.extra
    }

    /// Look up an unrecognized front-matter key
    pub fn extra_value(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.extra.get(key)
    }

    /// The verbatim markdown after the closing delimiter
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Block outline of the body
    pub fn outline(&self) -> Vec<Block> {
        markdown::outline(&self.body)
    }

    /// Every hyperlink in the body, in document order
    pub fn links(&self) -> Vec<Link> {
        markdown::links(&self.body)
    }

    /// Serialize back into front-matter plus body
    pub fn to_markdown(&self) -> String {
        super::frontmatter::serialize(self)
    }
}
