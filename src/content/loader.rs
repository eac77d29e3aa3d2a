//! Content loader - loads documents from the content directory

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{frontmatter, ContentDocument, LoadError, ParseOptions};
use crate::Site;

/// A parsed document and where it came from
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Path relative to the content directory
    pub source: String,
    /// Full source file path
    pub full_source: PathBuf,
    pub document: ContentDocument,
}

/// Outcome of loading a content directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Parsed documents, newest first
    pub documents: Vec<LoadedDocument>,
    /// Files that could not be read or parsed, in path order
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    /// Documents not marked as drafts
    pub fn published(&self) -> impl Iterator<Item = &LoadedDocument> {
        self.documents.iter().filter(|d| !d.document.draft())
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads content from the content directory
pub struct DocumentLoader<'a> {
    site: &'a Site,
    options: ParseOptions,
}

impl<'a> DocumentLoader<'a> {
    /// Create a new document loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let options = site.config.parse_options()?;
        Ok(Self { site, options })
    }

    /// Load every content file under the content directory
    pub fn load(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        let content_dir = &self.site.content_dir;
        if !content_dir.exists() {
            tracing::debug!("Content directory {:?} does not exist", content_dir);
            return Ok(report);
        }

        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Dangling links, link loops, unreadable directories
                    let path = e.path().unwrap_or(content_dir.as_path()).to_path_buf();
                    tracing::debug!("Failed to walk {:?}: {}", path, e);
                    report.failures.push(LoadError::Io {
                        path,
                        source: e.into(),
                    });
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !self.site.config.is_content_file(path) {
                continue;
            }

            match self.load_file(path) {
                Ok(doc) => report.documents.push(doc),
                Err(e) => {
                    tracing::debug!("Failed to load {:?}: {}", path, e);
                    report.failures.push(e);
                }
            }
        }

        // Sort by date descending (newest first)
        report
            .documents
            .sort_by(|a, b| b.document.published_at().cmp(&a.document.published_at()));

        tracing::debug!(
            "Loaded {} documents ({} failed)",
            report.documents.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Load a single document from a file
    pub fn load_file(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let document =
            frontmatter::parse_with(&content, &self.options).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // Calculate source path relative to content dir
        let source = path
            .strip_prefix(&self.site.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        Ok(LoadedDocument {
            source,
            full_source: path.to_path_buf(),
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{Field, ParseError};

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn site(base: &Path) -> Site {
        Site::with_config(base, SiteConfig::default())
    }

    #[test]
    fn test_load_sorts_newest_first_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        write(
            &content,
            "old.md",
            "---\ntitle: Old\ndate: 2022-01-01T00:00:00Z\n---\nold\n",
        );
        write(
            &content,
            "posts/new.markdown",
            "---\ntitle: New\ndate: 2023-02-01T16:00:00-08:00\ndraft: true\n---\nnew\n",
        );
        write(&content, "image.png", "not a document");

        let site = site(dir.path());
        let report = DocumentLoader::new(&site).unwrap().load().unwrap();

        assert!(report.is_ok());
        let titles: Vec<&str> = report
            .documents
            .iter()
            .map(|d| d.document.title())
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
        assert_eq!(
            Path::new(&report.documents[0].source),
            Path::new("posts/new.markdown")
        );

        let published: Vec<&str> = report.published().map(|d| d.document.title()).collect();
        assert_eq!(published, vec!["Old"]);
    }

    #[test]
    fn test_load_reports_failures_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        write(&content, "broken.md", "---\ntitle: Broken\n---\n");
        write(&content, "plain.md", "# no front-matter\n");

        let site = site(dir.path());
        let report = DocumentLoader::new(&site).unwrap().load().unwrap();

        assert!(report.documents.is_empty());
        assert_eq!(report.failures.len(), 2);

        match &report.failures[0] {
            LoadError::Parse { path, source } => {
                assert!(path.ends_with("broken.md"));
                assert_eq!(
                    source,
                    &ParseError::MissingRequiredField {
                        field: Field::Date,
                        line: 3
                    }
                );
            }
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(matches!(
            &report.failures[1],
            LoadError::Parse {
                source: ParseError::MissingMetadataBlock,
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        std::os::unix::fs::symlink(content.join("missing.md"), content.join("post.md")).unwrap();
        std::os::unix::fs::symlink(&content, content.join("loop")).unwrap();

        let site = site(dir.path());
        let report = DocumentLoader::new(&site).unwrap().load().unwrap();

        assert!(report.documents.is_empty());
        assert!(!report.is_ok());
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f, LoadError::Io { .. })));
        assert!(report
            .failures
            .iter()
            .any(|f| f.path().ends_with("post.md")));
    }

    #[test]
    fn test_missing_content_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path());
        let report = DocumentLoader::new(&site).unwrap().load().unwrap();
        assert!(report.documents.is_empty());
        assert!(report.is_ok());
    }

    #[test]
    fn test_configured_timezone_applies() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        write(
            &content,
            "local.md",
            "---\ntitle: Local\ndate: 2024-01-15 10:30:00\n---\n",
        );

        let strict = site(dir.path());
        let report = DocumentLoader::new(&strict).unwrap().load().unwrap();
        assert_eq!(report.failures.len(), 1);

        let config = SiteConfig {
            timezone: "Asia/Shanghai".to_string(),
            ..Default::default()
        };
        let zoned = Site::with_config(dir.path(), config);
        let report = DocumentLoader::new(&zoned).unwrap().load().unwrap();
        assert!(report.is_ok());
        assert_eq!(
            report.documents[0].document.published_at().to_rfc3339(),
            "2024-01-15T10:30:00+08:00"
        );
    }
}
