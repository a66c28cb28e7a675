use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Issue reference extraction
// ---------------------------------------------------------------------------

static ISSUE_REF_RE: OnceLock<Regex> = OnceLock::new();

/// Matches `#<digits>`, optionally preceded by one of the linking keywords.
/// The keyword is optional so a bare `#123` always counts.
fn issue_ref_re() -> &'static Regex {
    ISSUE_REF_RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:fixes|closes|resolves|references|implements|addresses|refs|re|see)?\s*#(\d+)",
        )
        .unwrap()
    })
}

/// Extract issue IIDs referenced in free text.
///
/// Recognized keywords (case-insensitive, all optional): fixes, closes,
/// resolves, references, implements, addresses, refs, re, see.
///
/// The result is deduplicated and sorted ascending, which keeps downstream
/// "first match wins" lookups deterministic.
pub fn extract_issue_ids(text: &str) -> Vec<u64> {
    let mut ids: Vec<u64> = issue_ref_re()
        .captures_iter(text)
        .filter_map(|c| c[1].parse().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_issue_ids("").is_empty());
        assert!(extract_issue_ids("Just a description").is_empty());
    }

    #[test]
    fn bare_reference() {
        assert_eq!(extract_issue_ids("#123"), vec![123]);
    }

    #[test]
    fn keyword_references() {
        assert_eq!(extract_issue_ids("fixes #123"), vec![123]);
        assert_eq!(extract_issue_ids("closes #123"), vec![123]);
        assert_eq!(
            extract_issue_ids("This fixes #123 and closes #456"),
            vec![123, 456]
        );
    }

    #[test]
    fn all_keywords() {
        assert_eq!(
            extract_issue_ids("resolves #123\nrefs #456\nre #789\nsee #101\naddresses #202"),
            vec![101, 123, 202, 456, 789]
        );
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(extract_issue_ids("Fixes #123, also fixes #123"), vec![123]);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            extract_issue_ids("FIXES #123 and Closes #456"),
            vec![123, 456]
        );
    }

    #[test]
    fn mixed_prose() {
        assert_eq!(
            extract_issue_ids("Implementation of feature request #123\nFixes bug #456"),
            vec![123, 456]
        );
    }

    #[test]
    fn output_is_sorted_ascending() {
        assert_eq!(extract_issue_ids("see #300, fixes #2, refs #45"), vec![2, 45, 300]);
    }
}
