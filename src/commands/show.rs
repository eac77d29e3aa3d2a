//! Show one document's metadata and body outline

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::content::{frontmatter, Block, ContentDocument, Link};
use crate::Site;

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    document: &'a ContentDocument,
    outline: Vec<Block>,
    links: Vec<Link>,
}

/// Print a document summary
pub fn run(site: &Site, path: &Path, json: bool) -> Result<()> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else if site.base_dir.join(path).exists() {
        site.base_dir.join(path)
    } else {
        site.content_dir.join(path)
    };

    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
    let options = site.config.parse_options()?;
    let document = frontmatter::parse_with(&text, &options)
        .with_context(|| format!("Failed to parse {:?}", path))?;

    if json {
        let summary = Summary {
            document: &document,
            outline: document.outline(),
            links: document.links(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render(&document));
    }
    Ok(())
}

fn render(document: &ContentDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!("title: {}\n", document.title()));
    out.push_str(&format!(
        "date:  {}\n",
        frontmatter::format_timestamp(&document.published_at())
    ));
    out.push_str(&format!("draft: {}\n", document.draft()));
    for key in document.extra().keys() {
        out.push_str(&format!("extra: {}\n", key));
    }

    out.push('\n');
    for block in document.outline() {
        out.push_str(&outline_line(&block));
        out.push('\n');
    }

    let links = document.links();
    if !links.is_empty() {
        out.push_str(&format!("\nLinks ({}):\n", links.len()));
        for link in links {
            out.push_str(&format!("  [{}]({})\n", link.text, link.url));
        }
    }
    out
}

fn outline_line(block: &Block) -> String {
    match block {
        Block::Heading { level, text } => {
            format!("{}{} {}", "  ".repeat(*level as usize - 1), "#".repeat(*level as usize), text)
        }
        Block::Paragraph { text, .. } => format!("  ¶ {}", preview(text)),
        Block::ListItem { text, .. } => format!("  - {}", preview(text)),
        Block::CodeBlock { fence, code } => {
            let mut line = format!(
                "  ``` {}",
                fence.language.as_deref().unwrap_or("(plain)")
            );
            if let Some(annotation) = &fence.annotation {
                line.push_str(&format!(" {{{}}}", annotation));
            }
            line.push_str(&format!(" ({} lines)", code.lines().count()));
            line
        }
    }
}

fn preview(text: &str) -> String {
    const WIDTH: usize = 60;
    if text.chars().count() <= WIDTH {
        text.to_string()
    } else {
        let cut: String = text.chars().take(WIDTH).collect();
        format!("{}…", cut)
    }
}
