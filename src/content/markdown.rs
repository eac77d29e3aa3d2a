//! Read-only block outline of a markdown body
//!
//! The body of a document is kept verbatim; this module derives a structural
//! view of it (headings, paragraphs, list items, fenced code blocks and the
//! links and emphasis spans inside them) without rendering anything.

use lazy_static::lazy_static;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// `<language> {<annotation>}`, both parts optional
    static ref FENCE_INFO: Regex = Regex::new(r"^\s*([^\s{]+)?\s*(?:\{(.*)\})?\s*$").unwrap();
}

/// A hyperlink in `[text](url)` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Language and highlight annotation of a fenced code block,
/// e.g. `go {linenos=table,hl_lines=[8,"15-17"]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FenceInfo {
    pub language: Option<String>,
    /// Text between the braces, without the braces
    pub annotation: Option<String>,
}

impl FenceInfo {
    /// Split a fence info string
    pub fn parse(info: &str) -> Self {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        match FENCE_INFO.captures(info) {
            Some(caps) => Self {
                language: caps.get(1).and_then(|m| non_empty(m.as_str())),
                annotation: caps.get(2).and_then(|m| non_empty(m.as_str())),
            },
            None => Self {
                language: info.split_whitespace().next().map(str::to_string),
                annotation: None,
            },
        }
    }

    /// Annotation as ordered `key=value` pairs
    ///
    /// Pairs are separated by commas or whitespace outside brackets and
    /// quotes. A bare word yields an empty value.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let Some(annotation) = &self.annotation else {
            return Vec::new();
        };

        let mut parts = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        for c in annotation.chars() {
            match (quote, c) {
                (Some(q), c) if c == q => {
                    quote = None;
                    current.push(c);
                }
                (Some(_), c) => current.push(c),
                (None, '"' | '\'') => {
                    quote = Some(c);
                    current.push(c);
                }
                (None, '[' | '(') => {
                    depth += 1;
                    current.push(c);
                }
                (None, ']' | ')') => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                (None, c) if depth == 0 && (c == ',' || c.is_whitespace()) => {
                    parts.push(std::mem::take(&mut current));
                }
                (None, c) => current.push(c),
            }
        }
        parts.push(current);

        parts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| match p.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => (p.trim().to_string(), String::new()),
            })
            .collect()
    }
}

/// One block element of the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
        links: Vec<Link>,
        emphasis: Vec<String>,
    },
    ListItem {
        text: String,
        links: Vec<Link>,
        emphasis: Vec<String>,
    },
    CodeBlock {
        fence: FenceInfo,
        code: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Heading(u8),
    Paragraph,
    ListItem,
}

/// Text being collected for an open heading, paragraph or list item
#[derive(Debug)]
struct Inline {
    kind: InlineKind,
    text: String,
    links: Vec<Link>,
    emphasis: Vec<String>,
    /// (url, text offset) of open links
    open_links: Vec<(String, usize)>,
    /// Text offsets of open emphasis spans
    open_emphasis: Vec<usize>,
}

impl Inline {
    fn new(kind: InlineKind) -> Self {
        Self {
            kind,
            text: String::new(),
            links: Vec::new(),
            emphasis: Vec::new(),
            open_links: Vec::new(),
            open_emphasis: Vec::new(),
        }
    }

    fn into_block(self) -> Option<Block> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return None;
        }
        Some(match self.kind {
            InlineKind::Heading(level) => Block::Heading { level, text },
            InlineKind::Paragraph => Block::Paragraph {
                text,
                links: self.links,
                emphasis: self.emphasis,
            },
            InlineKind::ListItem => Block::ListItem {
                text,
                links: self.links,
                emphasis: self.emphasis,
            },
        })
    }
}

fn parser(markdown: &str) -> Parser<'_> {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES;
    Parser::new_ext(markdown, options)
}

/// Build the block outline of a markdown body
pub fn outline(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut stack: Vec<Inline> = Vec::new();
    let mut code: Option<(FenceInfo, String)> = None;

    for event in parser(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let fence = match kind {
                    CodeBlockKind::Fenced(info) => FenceInfo::parse(&info),
                    CodeBlockKind::Indented => FenceInfo::default(),
                };
                code = Some((fence, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((fence, code)) = code.take() {
                    blocks.push(Block::CodeBlock { fence, code });
                }
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, buf)) = code.as_mut() {
                    buf.push_str(&text);
                }
            }

            Event::Start(Tag::Heading { level, .. }) => {
                stack.push(Inline::new(InlineKind::Heading(level as u8)));
            }
            Event::Start(Tag::Paragraph) => {
                // Loose list items wrap their text in paragraphs
                let in_item = stack
                    .last()
                    .is_some_and(|inline| inline.kind == InlineKind::ListItem);
                if !in_item {
                    stack.push(Inline::new(InlineKind::Paragraph));
                }
            }
            Event::Start(Tag::Item) => {
                // A nested list starts: emit what the parent item has so far
                if let Some(parent) = stack.last_mut() {
                    if parent.kind == InlineKind::ListItem {
                        let flushed = std::mem::replace(parent, Inline::new(InlineKind::ListItem));
                        blocks.extend(flushed.into_block());
                    }
                }
                stack.push(Inline::new(InlineKind::ListItem));
            }
            Event::End(TagEnd::Heading(_)) | Event::End(TagEnd::Item) => {
                if let Some(inline) = stack.pop() {
                    blocks.extend(inline.into_block());
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if stack
                    .last()
                    .is_some_and(|inline| inline.kind == InlineKind::Paragraph)
                {
                    if let Some(inline) = stack.pop() {
                        blocks.extend(inline.into_block());
                    }
                } else if let Some(item) = stack.last_mut() {
                    item.text.push(' ');
                }
            }

            Event::Start(Tag::Link { dest_url, .. }) => {
                if let Some(inline) = stack.last_mut() {
                    let start = inline.text.len();
                    inline.open_links.push((dest_url.to_string(), start));
                }
            }
            Event::End(TagEnd::Link) => {
                if let Some(inline) = stack.last_mut() {
                    if let Some((url, start)) = inline.open_links.pop() {
                        let text = inline.text[start..].trim().to_string();
                        inline.links.push(Link { text, url });
                    }
                }
            }
            Event::Start(Tag::Emphasis) | Event::Start(Tag::Strong) => {
                if let Some(inline) = stack.last_mut() {
                    let start = inline.text.len();
                    inline.open_emphasis.push(start);
                }
            }
            Event::End(TagEnd::Emphasis) | Event::End(TagEnd::Strong) => {
                if let Some(inline) = stack.last_mut() {
                    if let Some(start) = inline.open_emphasis.pop() {
                        let span = inline.text[start..].trim().to_string();
                        inline.emphasis.push(span);
                    }
                }
            }

            Event::Text(text) | Event::Code(text) => {
                if let Some(inline) = stack.last_mut() {
                    inline.text.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(inline) = stack.last_mut() {
                    inline.text.push(' ');
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Every `[text](url)` link in the body, in document order
pub fn links(markdown: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let mut open: Option<(String, String)> = None;

    for event in parser(markdown) {
        match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                open = Some((dest_url.to_string(), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buf)) = open.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::Link) => {
                if let Some((url, text)) = open.take() {
                    links.push(Link {
                        text: text.trim().to_string(),
                        url,
                    });
                }
            }
            _ => {}
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"# Functional patterns

Flutter leans on *immutable* widgets. See [the docs](https://docs.flutter.dev) for **more**.

## Sample

```dart {linenos=table,hl_lines=[8,"15-17"]}
void main() => runApp(const App());
```

- first [item](https://example.com/one)
- second
"#;

    #[test]
    fn test_outline_blocks() {
        let blocks = outline(BODY);

        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Functional patterns".to_string()
            }
        );
        match &blocks[1] {
            Block::Paragraph {
                text,
                links,
                emphasis,
            } => {
                assert!(text.starts_with("Flutter leans on immutable widgets."));
                assert_eq!(
                    links,
                    &vec![Link {
                        text: "the docs".to_string(),
                        url: "https://docs.flutter.dev".to_string()
                    }]
                );
                assert_eq!(emphasis, &vec!["immutable".to_string(), "more".to_string()]);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
        assert_eq!(
            blocks[2],
            Block::Heading {
                level: 2,
                text: "Sample".to_string()
            }
        );
        match &blocks[3] {
            Block::CodeBlock { fence, code } => {
                assert_eq!(fence.language.as_deref(), Some("dart"));
                assert_eq!(
                    fence.annotation.as_deref(),
                    Some(r#"linenos=table,hl_lines=[8,"15-17"]"#)
                );
                assert_eq!(code, "void main() => runApp(const App());\n");
            }
            other => panic!("expected code block, got {:?}", other),
        }
        assert!(matches!(&blocks[4], Block::ListItem { text, links, .. }
            if text == "first item" && links.len() == 1));
        assert!(matches!(&blocks[5], Block::ListItem { text, .. } if text == "second"));
    }

    #[test]
    fn test_nested_list_items_keep_order() {
        let blocks = outline("- parent\n  - child\n- sibling\n");
        let texts: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["parent", "child", "sibling"]);
    }

    #[test]
    fn test_code_is_not_interpreted() {
        let blocks = outline("```\n# not a heading\n[not](a-link)\n```\n");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::CodeBlock { fence, code } => {
                assert_eq!(fence, &FenceInfo::default());
                assert!(code.contains("# not a heading"));
            }
            other => panic!("expected code block, got {:?}", other),
        }
        assert!(links("```\n[not](a-link)\n```\n").is_empty());
    }

    #[test]
    fn test_links_in_order() {
        let found = links(BODY);
        let urls: Vec<&str> = found.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://docs.flutter.dev", "https://example.com/one"]
        );
        assert_eq!(found[1].text, "item");
    }

    #[test]
    fn test_fence_info_parse() {
        assert_eq!(
            FenceInfo::parse("rust"),
            FenceInfo {
                language: Some("rust".to_string()),
                annotation: None
            }
        );
        assert_eq!(
            FenceInfo::parse("{linenos=true}"),
            FenceInfo {
                language: None,
                annotation: Some("linenos=true".to_string())
            }
        );
        assert_eq!(FenceInfo::parse(""), FenceInfo::default());
        assert_eq!(
            FenceInfo::parse("go {unclosed").language.as_deref(),
            Some("go")
        );
    }

    #[test]
    fn test_fence_attributes() {
        let fence = FenceInfo::parse(r#"go {linenos=table,hl_lines=[8,"15-17"], linenostart=199 .wide}"#);
        assert_eq!(
            fence.attributes(),
            vec![
                ("linenos".to_string(), "table".to_string()),
                ("hl_lines".to_string(), r#"[8,"15-17"]"#.to_string()),
                ("linenostart".to_string(), "199".to_string()),
                (".wide".to_string(), String::new()),
            ]
        );
        assert!(FenceInfo::parse("go").attributes().is_empty());
    }
}
