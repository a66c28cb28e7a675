//! Milestone changelog document: parse, dedup, merge, re-serialize.
//!
//! A milestone description is treated as a semi-structured document:
//!
//! ```text
//! ## Changelog
//!
//! ### [Feature]
//! - [Feature] Something shipped (#12)
//!
//! ### [Fix]
//! - [Fix] Something repaired (#34)
//! ```
//!
//! Merging is a full re-serialization, not an in-place edit; text outside
//! the recognized structure does not survive a rewrite.

use crate::changelog::{self, Category};
use crate::error::{Result, TrackError};
use std::collections::HashMap;
use std::fmt::Write;

pub const HEADING: &str = "## Changelog";

// ---------------------------------------------------------------------------
// Entry parsing
// ---------------------------------------------------------------------------

/// Split `"MR #123: text"` or `"#123: text"` into the `#123` source id and
/// the remaining text. An unrecognizable prefix is a hard error: the merge
/// cannot be attributed without it.
fn split_source(entry: &str) -> Result<(String, String)> {
    let malformed = || TrackError::MalformedEntry(entry.to_string());

    let rest = entry.strip_prefix("MR ").unwrap_or(entry);
    let (id_part, text) = rest.split_once(':').ok_or_else(malformed)?;
    let id = id_part.trim();

    let digits = id.strip_prefix('#').ok_or_else(malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    Ok((id.to_string(), text.trim().to_string()))
}

// ---------------------------------------------------------------------------
// Section parsing
// ---------------------------------------------------------------------------

/// Collect existing `- ` lines under each recognized `### [Category]` header.
fn parse_sections(description: &str) -> HashMap<Category, Vec<String>> {
    let mut sections: HashMap<Category, Vec<String>> = HashMap::new();
    let mut current: Option<Category> = None;

    for line in description.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("### [").and_then(|r| r.strip_suffix(']')) {
            current = Category::from_name(name).filter(|c| Category::SECTIONS.contains(c));
        } else if line.starts_with("- ") {
            if let Some(category) = current {
                sections.entry(category).or_default().push(line.to_string());
            }
        }
    }
    sections
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge one resolved changelog entry into a milestone description.
///
/// Any prior line attributed to the same source id is replaced, so repeating
/// the merge for the same MR or issue updates rather than duplicates.
/// Sections render in fixed order (Feature, Improvement, Fix, Infra) with
/// their lines sorted lexicographically; empty sections are omitted.
pub fn merge_entry(current: &str, entry: &str) -> Result<String> {
    let (source_id, text) = split_source(entry)?;
    let category = changelog::category_of(&text)
        .filter(|c| Category::SECTIONS.contains(c))
        .ok_or_else(|| TrackError::MalformedEntry(entry.to_string()))?;

    let mut sections = parse_sections(current);

    // Dedup on the rendered attribution so #12 never swallows #123.
    let attribution = format!("({source_id})");
    for lines in sections.values_mut() {
        lines.retain(|line| !line.contains(&attribution));
    }

    sections
        .entry(category)
        .or_default()
        .push(format!("- {text} {attribution}"));

    let mut out = String::from(HEADING);
    out.push_str("\n\n");
    for category in Category::SECTIONS {
        let Some(lines) = sections.get_mut(&category) else {
            continue;
        };
        if lines.is_empty() {
            continue;
        }
        lines.sort();
        let _ = writeln!(out, "### [{}]", category.name());
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
