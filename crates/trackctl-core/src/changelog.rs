use crate::client::{Client, UpdateMilestoneOpts};
use crate::error::{Result, TrackError};
use crate::milestone_doc;
use crate::refs;
use crate::types::Milestone;
use std::fmt;
use tracing::warn;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Changelog category, marked in free text as a bracketed tag on its own line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Feature,
    Improvement,
    Fix,
    Infra,
    /// Explicit opt-out: satisfies the "entry must be present" gate without
    /// producing a milestone line.
    NoChangelogEntry,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Feature,
        Category::Improvement,
        Category::Fix,
        Category::Infra,
        Category::NoChangelogEntry,
    ];

    /// Categories that render as milestone sections, in serialization order.
    pub const SECTIONS: [Category; 4] = [
        Category::Feature,
        Category::Improvement,
        Category::Fix,
        Category::Infra,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Feature => "Feature",
            Category::Improvement => "Improvement",
            Category::Fix => "Fix",
            Category::Infra => "Infra",
            Category::NoChangelogEntry => "No-Changelog-Entry",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Category::Feature => "[Feature]",
            Category::Improvement => "[Improvement]",
            Category::Fix => "[Fix]",
            Category::Infra => "[Infra]",
            Category::NoChangelogEntry => "[No-Changelog-Entry]",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tag matching
// ---------------------------------------------------------------------------

/// The category tagged on a line, if any (case-insensitive).
pub fn category_of(line: &str) -> Option<Category> {
    let lower = line.to_lowercase();
    Category::ALL
        .into_iter()
        .find(|c| lower.contains(&c.tag().to_lowercase()))
}

/// First tagged line in the text, trimmed. One entry per text blob; lines
/// after the first match are ignored. `[No-Changelog-Entry]` counts as a
/// match here — the caller decides what the opt-out means.
pub fn find_changelog_entry(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let trimmed = line.trim();
        category_of(trimmed).map(|_| trimmed.to_string())
    })
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the changelog line for a merge request.
///
/// Linked issues are consulted first, in ascending IID order — changelog
/// policy attributes user-facing notes to the originating issue, falling back
/// to the MR's own description only when no issue yields a usable entry.
/// Issues that cannot be fetched are logged and skipped. The opt-out tag is
/// never usable. Returns `Ok(None)` when nothing usable exists anywhere.
///
/// Output format: `"#<iid>: <line>"` for an issue, `"MR #<iid>: <line>"` for
/// the merge request itself.
pub fn resolve(client: &Client, project: u64, mr_iid: u64) -> Result<Option<String>> {
    let mr = client.get_merge_request(project, mr_iid)?;
    let description = mr.description_text();

    for issue_iid in refs::extract_issue_ids(description) {
        let issue = match client.get_issue(project, issue_iid) {
            Ok(issue) => issue,
            Err(e) => {
                warn!(issue = issue_iid, error = %e, "skipping unreadable linked issue");
                continue;
            }
        };
        if let Some(line) = find_changelog_entry(issue.description_text()) {
            if category_of(&line) != Some(Category::NoChangelogEntry) {
                return Ok(Some(format!("#{}: {}", issue.iid, line)));
            }
        }
    }

    if let Some(line) = find_changelog_entry(description) {
        if category_of(&line) != Some(Category::NoChangelogEntry) {
            return Ok(Some(format!("MR #{}: {}", mr.iid, line)));
        }
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// Milestone application
// ---------------------------------------------------------------------------

/// Resolve the changelog entry for one MR and merge it into the description
/// of the MR's milestone.
pub fn apply_to_milestone(client: &Client, project: u64, mr_iid: u64) -> Result<Milestone> {
    let mr = client.get_merge_request(project, mr_iid)?;
    let milestone_ref = mr.milestone.as_ref().ok_or(TrackError::NoMilestone(mr_iid))?;
    let milestone = client.get_milestone(project, milestone_ref.id)?;

    let entry =
        resolve(client, project, mr_iid)?.ok_or(TrackError::NoChangelogEntry(mr_iid))?;
    let description = milestone_doc::merge_entry(milestone.description_text(), &entry)?;

    client.update_milestone(
        project,
        milestone.id,
        &UpdateMilestoneOpts {
            description: Some(description),
            ..Default::default()
        },
    )
}

/// Rebuild a milestone changelog from every merged MR assigned to it.
///
/// Each MR is resolved and merged through the same path as
/// [`apply_to_milestone`], so the backfill dedups and categorizes
/// identically. MRs that fail to resolve are logged and skipped.
pub fn backfill_milestone(client: &Client, project: u64, milestone_id: u64) -> Result<Milestone> {
    let milestone = client.get_milestone(project, milestone_id)?;
    let mrs = client.list_milestone_merge_requests(project, milestone_id)?;

    let mut description = milestone.description_text().to_string();
    let mut changed = false;
    for mr in mrs.iter().filter(|mr| mr.state == "merged") {
        let entry = match resolve(client, project, mr.iid) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                warn!(mr = mr.iid, error = %e, "skipping merge request during backfill");
                continue;
            }
        };
        description = milestone_doc::merge_entry(&description, &entry)?;
        changed = true;
    }

    if !changed {
        return Ok(milestone);
    }
    client.update_milestone(
        project,
        milestone_id,
        &UpdateMilestoneOpts {
            description: Some(description),
            ..Default::default()
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
