//! Front-matter parsing and serialization

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::str::FromStr;

use super::document::ContentDocument;
use super::error::{Field, ParseError};

/// Line that opens and closes the metadata block
pub const DELIMITER: &str = "---";

/// Keys interpreted by the parser; never written from `extra`
const RESERVED_KEYS: [&str; 3] = ["title", "date", "draft"];

/// Timestamp layouts that carry their own UTC offset, tried after RFC 3339
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S %:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Offset-less layouts, only accepted when a timezone is configured
const LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Knobs for [`parse_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Zone used for timestamps written without a UTC offset.
    /// When unset such timestamps are rejected.
    pub timezone: Option<Tz>,
}

impl ParseOptions {
    pub fn with_timezone(timezone: Tz) -> Self {
        Self {
            timezone: Some(timezone),
        }
    }
}

/// The metadata block and body located in a document
#[derive(Debug)]
struct Sections<'a> {
    metadata: &'a str,
    /// Line number of the first line inside the block
    metadata_line: usize,
    /// Line number of the closing delimiter
    closing_line: usize,
    body: &'a str,
}

/// Parse a document, rejecting timestamps without a UTC offset
pub fn parse(text: &str) -> Result<ContentDocument, ParseError> {
    parse_with(text, &ParseOptions::default())
}

/// Parse a document
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<ContentDocument, ParseError> {
    let sections = split(text)?;
    let mapping = parse_mapping(&sections)?;
    let lines = key_lines(sections.metadata, sections.metadata_line);

    let line_of = |field: Field| {
        lines
            .get(field.key())
            .copied()
            .unwrap_or(sections.metadata_line)
    };

    let mut title = None;
    let mut date = None;
    let mut draft = None;
    let mut extra = IndexMap::new();

    for (key, value) in mapping {
        let key = key_to_string(&key).ok_or_else(|| ParseError::MalformedMetadata {
            reason: "keys must be strings".to_string(),
            line: sections.metadata_line,
        })?;
        match key.as_str() {
            // Keep in sync with RESERVED_KEYS
            "title" => title = Some(value),
            "date" => date = Some(value),
            "draft" => draft = Some(value),
            _ => {
                extra.insert(key, value);
            }
        }
    }

    let title = parse_title(title)
        .map_err(|problem| problem.into_error(Field::Title, line_of(Field::Title), &sections))?;
    let published_at = parse_date(date, options)
        .map_err(|problem| problem.into_error(Field::Date, line_of(Field::Date), &sections))?;
    let draft = parse_draft(draft)
        .map_err(|problem| problem.into_error(Field::Draft, line_of(Field::Draft), &sections))?;

    let mut doc = ContentDocument::new(title, published_at)
        .with_draft(draft)
        .with_body(sections.body);
    for (key, value) in extra {
        doc = doc.with_extra(key, value);
    }
    Ok(doc)
}

/// Serialize a document into a front-matter block followed by its body
pub fn serialize(doc: &ContentDocument) -> String {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&format!("title: {}\n", quote(doc.title())));
    out.push_str(&format!("date: {}\n", format_timestamp(&doc.published_at())));
    out.push_str(&format!("draft: {}\n", doc.draft()));

    let extra: IndexMap<&String, &Value> = doc
        .extra()
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .collect();
    if !extra.is_empty() {
        match serde_yaml::to_string(&extra) {
            Ok(yaml) => out.push_str(&yaml),
            Err(e) => tracing::warn!("Dropping unserializable front-matter keys: {}", e),
        }
    }

    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(doc.body());
    out
}

/// Format a timestamp the way [`serialize`] writes it
///
/// RFC 3339 offsets have minute precision, so offsets with a seconds part
/// are written in UTC to keep the instant.
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    if dt.offset().local_minus_utc() % 60 != 0 {
        return dt
            .with_timezone(&Utc.fix())
            .to_rfc3339_opts(SecondsFormat::AutoSi, false);
    }
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Write a string as a YAML double-quoted scalar
///
/// Everything outside YAML's printable set, and the characters YAML folds
/// as line breaks, is escaped.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if is_printable(c) => out.push(c),
            c if (c as u32) <= 0xff => out.push_str(&format!("\\x{:02X}", c as u32)),
            c if (c as u32) <= 0xffff => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push_str(&format!("\\U{:08X}", c as u32)),
        }
    }
    out.push('"');
    out
}

fn is_printable(c: char) -> bool {
    matches!(c as u32,
        0x20..=0x7e | 0xa0..=0xd7ff | 0xe000..=0xfefe | 0xff00..=0xfffd | 0x10000..=0x10ffff)
}

/// Parse a front-matter timestamp
///
/// Returns a human-readable reason on failure.
pub fn parse_timestamp(s: &str, timezone: Option<Tz>) -> Result<DateTime<FixedOffset>, String> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });

    let Some(naive) = naive else {
        return Err(format!(
            "`{}` is not a timestamp (expected e.g. 2023-02-01T16:00:00-08:00)",
            s
        ));
    };
    let Some(tz) = timezone else {
        return Err(format!("`{}` has no UTC offset", s));
    };

    match tz.from_local_datetime(&naive).single() {
        Some(dt) => Ok(dt.with_timezone(&dt.offset().fix())),
        None => Err(format!(
            "`{}` is ambiguous or does not exist in {}",
            s,
            tz.name()
        )),
    }
}

impl FromStr for ContentDocument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Locate the metadata block and the body
fn split(text: &str) -> Result<Sections<'_>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut offset = 0;
    let mut open: Option<(usize, usize)> = None;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        let start = offset;
        offset += line.len();
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);

        match open {
            None => {
                if content.trim().is_empty() {
                    continue;
                }
                if content != DELIMITER {
                    return Err(ParseError::MissingMetadataBlock);
                }
                open = Some((offset, line_no + 1));
            }
            Some((metadata_start, metadata_line)) => {
                if content == DELIMITER {
                    return Ok(Sections {
                        metadata: &text[metadata_start..start],
                        metadata_line,
                        closing_line: line_no,
                        body: &text[offset..],
                    });
                }
            }
        }
    }

    Err(ParseError::MissingMetadataBlock)
}

fn parse_mapping(sections: &Sections<'_>) -> Result<Mapping, ParseError> {
    if sections.metadata.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value =
        serde_yaml::from_str(sections.metadata).map_err(|e| ParseError::MalformedMetadata {
            line: e
                .location()
                .map(|loc| sections.metadata_line + loc.line().saturating_sub(1))
                .unwrap_or(sections.metadata_line),
            reason: e.to_string(),
        })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        // Only comments
        Value::Null => Ok(Mapping::new()),
        other => Err(ParseError::MalformedMetadata {
            reason: format!("expected key: value pairs, found {}", kind(&other)),
            line: sections.metadata_line,
        }),
    }
}

/// Line number of each top-level key in the block
fn key_lines(metadata: &str, first_line: usize) -> HashMap<String, usize> {
    let mut lines = HashMap::new();
    for (index, line) in metadata.lines().enumerate() {
        if line.starts_with([' ', '\t', '#', '-']) {
            continue;
        }
        if let Some((key, _)) = line.split_once(':') {
            let key = key.trim().trim_matches(|c| c == '"' || c == '\'');
            if !key.is_empty() {
                lines.entry(key.to_string()).or_insert(first_line + index);
            }
        }
    }
    lines
}

fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// What went wrong with a single recognized field
enum FieldProblem {
    Missing,
    Malformed(String),
}

impl FieldProblem {
    fn into_error(self, field: Field, line: usize, sections: &Sections<'_>) -> ParseError {
        match self {
            FieldProblem::Missing => ParseError::MissingRequiredField {
                field,
                line: sections.closing_line,
            },
            FieldProblem::Malformed(reason) => ParseError::MalformedField {
                field,
                reason,
                line,
            },
        }
    }
}

fn parse_title(value: Option<Value>) -> Result<String, FieldProblem> {
    let title = match value {
        None | Some(Value::Null) => return Err(FieldProblem::Missing),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            return Err(FieldProblem::Malformed(format!(
                "expected a string, found {}",
                kind(&other)
            )))
        }
    };

    if title.trim().is_empty() {
        return Err(FieldProblem::Malformed("must not be empty".to_string()));
    }
    Ok(title)
}

fn parse_date(
    value: Option<Value>,
    options: &ParseOptions,
) -> Result<DateTime<FixedOffset>, FieldProblem> {
    match value {
        None | Some(Value::Null) => Err(FieldProblem::Missing),
        Some(Value::String(s)) => {
            parse_timestamp(&s, options.timezone).map_err(FieldProblem::Malformed)
        }
        Some(other) => Err(FieldProblem::Malformed(format!(
            "expected a timestamp, found {}",
            kind(&other)
        ))),
    }
}

fn parse_draft(value: Option<Value>) -> Result<bool, FieldProblem> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(other) => Err(FieldProblem::Malformed(format!(
            "expected true or false, found {}",
            kind(&other)
        ))),
    }
}
