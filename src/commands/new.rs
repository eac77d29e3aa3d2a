//! Create a new document

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, Offset, Timelike, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::{frontmatter, ContentDocument};
use crate::Site;

/// Create a new document in the content directory
pub fn create_document(
    site: &Site,
    title: &str,
    draft: bool,
    path: Option<&str>,
) -> Result<PathBuf> {
    if title.trim().is_empty() {
        anyhow::bail!("Title must not be empty");
    }

    let now = now(site)?;
    fs::create_dir_all(&site.content_dir)?;

    // Generate filename
    let filename = if let Some(p) = path {
        if site.config.is_content_file(Path::new(p)) {
            p.to_string()
        } else {
            let ext = site
                .config
                .extensions
                .first()
                .map(String::as_str)
                .unwrap_or("md");
            format!("{}.{}", p, ext)
        }
    } else {
        let slug = slug::slugify(title);

        site.config
            .new_post_name
            .replace(":title", &slug)
            .replace(":year", &now.format("%Y").to_string())
            .replace(":month", &now.format("%m").to_string())
            .replace(":day", &now.format("%d").to_string())
            .replace(":i_month", &now.format("%-m").to_string())
            .replace(":i_day", &now.format("%-d").to_string())
    };
    let file_path = site.content_dir.join(filename);

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let document = ContentDocument::new(title, now).with_draft(draft);
    fs::write(&file_path, frontmatter::serialize(&document))?;

    tracing::info!("Created: {:?}", file_path);
    Ok(file_path)
}

/// Current time in the configured zone, or the local zone
fn now(site: &Site) -> Result<DateTime<FixedOffset>> {
    let utc = Utc::now();
    let now = match site.config.timezone()? {
        Some(tz) => {
            let zoned = utc.with_timezone(&tz);
            zoned.with_timezone(&zoned.offset().fix())
        }
        None => {
            let local = utc.with_timezone(&Local);
            local.with_timezone(&local.offset().fix())
        }
    };
    // Whole seconds keep the written date readable
    Ok(now.with_nanosecond(0).unwrap_or(now))
}

/// Run the new command
pub fn run(site: &Site, title: &str, publish: bool, path: Option<&str>) -> Result<()> {
    let draft = !publish && site.config.new_post_draft;
    let file_path = create_document(site, title, draft, path)?;
    println!("Created: {:?}", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_create_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_config(dir.path(), SiteConfig::default());

        let path = create_document(&site, "Functional Patterns in Flutter", true, None).unwrap();
        assert_eq!(
            path,
            site.content_dir.join("functional-patterns-in-flutter.md")
        );

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("---\ntitle: \"Functional Patterns in Flutter\"\ndate: "));
        let doc = frontmatter::parse(&text).unwrap();
        assert_eq!(doc.title(), "Functional Patterns in Flutter");
        assert!(doc.draft());
        assert!(doc.body().is_empty());
    }

    #[test]
    fn test_create_document_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_config(dir.path(), SiteConfig::default());

        create_document(&site, "Hello", false, Some("hello")).unwrap();
        let err = create_document(&site, "Hello again", false, Some("hello.md")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_new_post_name_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            new_post_name: "posts/:year/:title.md".to_string(),
            timezone: "UTC".to_string(),
            ..Default::default()
        };
        let site = Site::with_config(dir.path(), config);

        let path = site.new_document("Hello World", false).unwrap();
        let year = Utc::now().format("%Y").to_string();
        assert!(path.ends_with(format!("posts/{}/hello-world.md", year)));

        let doc = frontmatter::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!doc.draft());
        assert_eq!(doc.published_at().offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_path_uses_configured_extension() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            extensions: vec!["mdx".to_string()],
            ..Default::default()
        };
        let site = Site::with_config(dir.path(), config);

        let path = create_document(&site, "Hello", false, Some("foo")).unwrap();
        assert_eq!(path, site.content_dir.join("foo.mdx"));
        let path = create_document(&site, "Bar", false, Some("bar.mdx")).unwrap();
        assert_eq!(path, site.content_dir.join("bar.mdx"));

        let report = crate::commands::check::validate(&site).unwrap();
        assert_eq!(report.documents.len(), 2);
    }

    #[test]
    fn test_empty_title_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_config(dir.path(), SiteConfig::default());
        assert!(create_document(&site, "  ", true, None).is_err());
    }
}
