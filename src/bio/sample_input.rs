//! Sample-oriented identifier lists
//!
//! ```text
//! >SampleA
//! K00031
//! K00032
//! >SampleB
//! K00033
//! ```
//!
//! A header line opens a sample; every identifier line up to the next
//! header belongs to it. Blank lines and comment lines are skipped.

use crate::bio::identifier::normalize;
use crate::bio::record::InputRecord;
use crate::error::StructuralError;
use nom::{bytes::complete::tag, combinator::rest, sequence::preceded, IResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

pub const HEADER_MARKER: &str = ">";
pub const DEFAULT_COMMENT_PREFIX: &str = "#";

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Lines starting with this prefix are ignored. Empty disables comments.
    pub comment_prefix: String,
    /// Inputs larger than this many bytes are rejected.
    pub max_input_bytes: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comment_prefix: DEFAULT_COMMENT_PREFIX.to_string(),
            max_input_bytes: None,
        }
    }
}

/// One sample header and how many identifier lines followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSection {
    pub name: String,
    pub header_line: usize,
    pub identifier_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    /// Samples in order of first appearance.
    pub samples: Vec<SampleSection>,
    pub total_lines: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub identifier_lines: usize,
    /// Headers that reopened an already seen sample.
    pub duplicate_headers: Vec<String>,
}

impl ParseReport {
    pub fn sample(&self, name: &str) -> Option<&SampleSection> {
        self.samples.iter().find(|s| s.name == name)
    }
}

enum Line<'a> {
    Blank,
    Comment,
    Header(&'a str),
    Identifier(&'a str),
}

fn sample_header(input: &str) -> IResult<&str, &str> {
    preceded(tag(HEADER_MARKER), rest)(input)
}

fn classify<'a>(line: &'a str, comment_prefix: &str) -> Line<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Ok((_, name)) = sample_header(trimmed) {
        return Line::Header(name.trim());
    }
    if !comment_prefix.is_empty() && trimmed.starts_with(comment_prefix) {
        return Line::Comment;
    }
    Line::Identifier(trimmed)
}

/// Parse with default options.
pub fn parse(raw: &str) -> Result<(Vec<InputRecord>, ParseReport), StructuralError> {
    parse_with(raw, &ParseOptions::default())
}

pub fn parse_with(
    raw: &str,
    options: &ParseOptions,
) -> Result<(Vec<InputRecord>, ParseReport), StructuralError> {
    if let Some(limit) = options.max_input_bytes {
        if raw.len() > limit {
            return Err(StructuralError::TooLarge {
                size: raw.len(),
                limit,
            });
        }
    }

    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut records = Vec::new();
    let mut report = ParseReport::default();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;
    let mut orphan: Option<(usize, String)> = None;

    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        report.total_lines += 1;

        match classify(line, &options.comment_prefix) {
            Line::Blank => report.blank_lines += 1,
            Line::Comment => report.comment_lines += 1,
            Line::Header(name) => {
                if name.is_empty() {
                    return Err(StructuralError::EmptyHeader { line: line_no });
                }
                let slot = match slots.get(name) {
                    Some(&slot) => {
                        report.duplicate_headers.push(name.to_string());
                        slot
                    }
                    None => {
                        report.samples.push(SampleSection {
                            name: name.to_string(),
                            header_line: line_no,
                            identifier_lines: 0,
                        });
                        let slot = report.samples.len() - 1;
                        slots.insert(name.to_string(), slot);
                        slot
                    }
                };
                current = Some(slot);
            }
            Line::Identifier(identifier) => {
                report.identifier_lines += 1;
                match current {
                    Some(slot) => {
                        let section = &mut report.samples[slot];
                        section.identifier_lines += 1;
                        records.push(InputRecord::new(section.name.clone(), normalize(identifier)));
                    }
                    None => {
                        if orphan.is_none() {
                            orphan = Some((line_no, identifier.to_string()));
                        }
                    }
                }
            }
        }
    }

    if report.samples.is_empty() {
        return Err(StructuralError::NoHeaders);
    }
    if let Some((line, identifier)) = orphan {
        return Err(StructuralError::IdentifierBeforeHeader { line, identifier });
    }

    debug!(
        samples = report.samples.len(),
        identifiers = records.len(),
        skipped_lines = report.blank_lines + report.comment_lines,
        "parsed sample input"
    );

    Ok((records, report))
}

/// Serialise records back to the input format, opening a header whenever
/// the sample changes.
pub fn render(records: &[InputRecord]) -> String {
    let mut output = String::new();
    let mut previous: Option<&str> = None;

    for record in records {
        if previous != Some(record.sample_id.as_str()) {
            output.push_str(HEADER_MARKER);
            output.push_str(&record.sample_id);
            output.push('\n');
            previous = Some(record.sample_id.as_str());
        }
        output.push_str(&record.gene_id);
        output.push('\n');
    }

    output
}
