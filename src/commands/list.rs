//! List site content

use anyhow::Result;
use serde::Serialize;

use crate::content::loader::{DocumentLoader, LoadReport, LoadedDocument};
use crate::content::ContentDocument;
use crate::Site;

#[derive(Serialize)]
struct Entry<'a> {
    source: &'a str,
    #[serde(flatten)]
    document: &'a ContentDocument,
}

/// List documents, newest first
pub fn run(site: &Site, drafts: bool, json: bool) -> Result<()> {
    let report = DocumentLoader::new(site)?.load()?;
    for failure in &report.failures {
        tracing::warn!("Skipping {}", failure);
    }

    let include_drafts = drafts || site.config.render_drafts;
    let documents = visible(&report, include_drafts);

    if json {
        let entries: Vec<Entry> = documents
            .iter()
            .map(|d| Entry {
                source: &d.source,
                document: &d.document,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Documents ({}):", documents.len());
    for doc in documents {
        println!("  {}", format_line(doc));
    }

    Ok(())
}

fn visible(report: &LoadReport, include_drafts: bool) -> Vec<&LoadedDocument> {
    if include_drafts {
        report.documents.iter().collect()
    } else {
        report.published().collect()
    }
}

fn format_line(doc: &LoadedDocument) -> String {
    let mut line = format!(
        "{} - {} [{}]",
        doc.document.published_at().format("%Y-%m-%d"),
        doc.document.title(),
        doc.source
    );
    if doc.document.draft() {
        line.push_str(" (draft)");
    }
    line
}
