//! Merge-request block toggle: a two-state convention driven by a literal
//! title prefix, annotated with notes so the reason is auditable.

use crate::client::{Client, UpdateMergeRequestOpts};
use crate::error::Result;
use crate::types::Note;
use tracing::warn;

pub const BLOCKED_PREFIX: &str = "[BLOCKED] ";
pub const BLOCKED_NOTE_MARKER: &str = "🚫 **Merge Blocked**:";
pub const UNBLOCKED_NOTE: &str = "✅ **Merge Unblocked**";

// ---------------------------------------------------------------------------
// Title helpers
// ---------------------------------------------------------------------------

pub fn is_blocked_title(title: &str) -> bool {
    title.starts_with(BLOCKED_PREFIX.trim_end())
}

/// Title with the blocked prefix applied (idempotent).
pub fn blocked_title(title: &str) -> String {
    if is_blocked_title(title) {
        title.to_string()
    } else {
        format!("{BLOCKED_PREFIX}{title}")
    }
}

/// Title with the blocked prefix removed (idempotent).
pub fn unblocked_title(title: &str) -> String {
    title.strip_prefix(BLOCKED_PREFIX).unwrap_or(title).to_string()
}

/// Reason from the most recent blocking note, if any.
pub fn block_reason(notes: &[Note]) -> Option<String> {
    notes.iter().rev().find_map(|note| {
        if !note.body.contains(BLOCKED_NOTE_MARKER) {
            return None;
        }
        Some(
            note.body
                .split_once(':')
                .map(|(_, reason)| reason.trim().to_string())
                .unwrap_or_default(),
        )
    })
}

// ---------------------------------------------------------------------------
// Remote operations
// ---------------------------------------------------------------------------

pub fn is_blocked(client: &Client, project: u64, mr_iid: u64) -> Result<bool> {
    let mr = client.get_merge_request(project, mr_iid)?;
    Ok(is_blocked_title(&mr.title))
}

pub fn reason(client: &Client, project: u64, mr_iid: u64) -> Result<Option<String>> {
    let notes = client.list_mr_notes(project, mr_iid)?;
    Ok(block_reason(&notes))
}

/// Block a merge request: post the annotation note, then prefix the title.
/// A failed note is logged and tolerated; a failed title update is not.
pub fn block(client: &Client, project: u64, mr_iid: u64, reason: &str) -> Result<()> {
    if let Err(e) = client.create_mr_note(project, mr_iid, &format!("{BLOCKED_NOTE_MARKER} {reason}"))
    {
        warn!(mr = mr_iid, error = %e, "failed to add blocking note");
    }

    let mr = client.get_merge_request(project, mr_iid)?;
    client.update_merge_request(
        project,
        mr_iid,
        &UpdateMergeRequestOpts {
            title: Some(blocked_title(&mr.title)),
            ..Default::default()
        },
    )?;
    Ok(())
}

/// Unblock a merge request: post the counter-annotation, strip the prefix.
pub fn unblock(client: &Client, project: u64, mr_iid: u64) -> Result<()> {
    if let Err(e) = client.create_mr_note(project, mr_iid, UNBLOCKED_NOTE) {
        warn!(mr = mr_iid, error = %e, "failed to add unblocking note");
    }

    let mr = client.get_merge_request(project, mr_iid)?;
    client.update_merge_request(
        project,
        mr_iid,
        &UpdateMergeRequestOpts {
            title: Some(unblocked_title(&mr.title)),
            ..Default::default()
        },
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
