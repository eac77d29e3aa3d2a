//! Validate every document in the content directory

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::time::Duration;

use crate::content::loader::{DocumentLoader, LoadReport};
use crate::content::LoadError;
use crate::{Site, CONFIG_FILE};

/// Validate all documents, failing if any document is invalid
pub fn run(site: &Site) -> Result<()> {
    let report = validate(site)?;
    print_report(&report);

    if !report.is_ok() {
        anyhow::bail!(
            "{} of {} documents failed validation",
            report.failures.len(),
            report.failures.len() + report.documents.len()
        );
    }
    Ok(())
}

/// Load and validate without printing
pub fn validate(site: &Site) -> Result<LoadReport> {
    let start = std::time::Instant::now();
    let report = DocumentLoader::new(site)?.load()?;

    tracing::info!(
        "Checked {} documents in {:.2}s",
        report.documents.len() + report.failures.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Format one failure as `path:line: message`
pub fn describe(failure: &LoadError) -> String {
    match failure {
        LoadError::Parse { path, source } => match source.line() {
            Some(line) => format!("{}:{}: {}", path.display(), line, source.detail()),
            None => format!("{}: {}", path.display(), source),
        },
        LoadError::Io { path, source } => format!("{}: {}", path.display(), source),
    }
}

fn print_report(report: &LoadReport) {
    for failure in &report.failures {
        println!("{}", describe(failure));
    }
    if report.is_ok() {
        println!("All {} documents are valid.", report.documents.len());
    }
}

/// Re-validate whenever the content directory or config changes
pub async fn watch(site: &Site) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |res: DebounceEventResult| {
            let _ = tx.send(res);
        },
    )?;

    if site.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.content_dir, RecursiveMode::Recursive)?;
    }
    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(Ok(events)) => {
                    tracing::debug!("{} file events", events.len());
                    // Config edits change how documents are parsed
                    let site = match Site::new(&site.base_dir) {
                        Ok(site) => site,
                        Err(e) => {
                            tracing::error!("Failed to reload config: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = run(&site) {
                        tracing::error!("{}", e);
                    }
                }
                Some(Err(e)) => tracing::warn!("Watch error: {}", e),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    #[test]
    fn test_run_fails_on_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("good.md"),
            "---\ntitle: Good\ndate: 2023-02-01T16:00:00-08:00\n---\n",
        )
        .unwrap();

        let site = Site::with_config(dir.path(), SiteConfig::default());
        assert!(run(&site).is_ok());

        fs::write(content.join("bad.md"), "---\ntitle: Bad\ndraft: maybe\n---\n").unwrap();
        let err = run(&site).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 documents failed validation");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_fails_on_dangling_link() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        std::os::unix::fs::symlink(content.join("gone.md"), content.join("post.md")).unwrap();

        let site = Site::with_config(dir.path(), SiteConfig::default());
        let err = run(&site).unwrap_err();
        assert_eq!(err.to_string(), "1 of 1 documents failed validation");
    }

    #[test]
    fn test_describe_failure() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("bad.md"),
            "---\ntitle: Bad\ndate: soon\n---\n",
        )
        .unwrap();

        let site = Site::with_config(dir.path(), SiteConfig::default());
        let report = validate(&site).unwrap();
        let line = describe(&report.failures[0]);
        assert!(line.ends_with("bad.md:3: malformed field `date`: `soon` is not a timestamp (expected e.g. 2023-02-01T16:00:00-08:00)"), "{}", line);
    }
}
