//! Merge gates: checks run before a merge is allowed, each a described
//! failure when the required metadata is missing.

use crate::changelog;
use crate::client::{Client, UpdateIssueOpts, UpdateMergeRequestOpts};
use crate::error::{Result, TrackError};
use crate::refs;
use crate::types::Milestone;
use tracing::warn;

/// Comment posted on the MR when the changelog gate fails under CI.
pub const NO_CHANGELOG_COMMENT: &str = "No changelog found, please add one of the [Feature] / \
    [Improvement] / [Fix] / [Infra] / [No-Changelog-Entry] tags to the issue mentioned in the \
    MR description";

// ---------------------------------------------------------------------------
// Milestone gate
// ---------------------------------------------------------------------------

/// Verify the MR has a milestone and every linked issue shares it.
/// Unreadable linked issues are skipped, matching the resolver's policy.
pub fn check_milestone(client: &Client, project: u64, mr_iid: u64) -> Result<()> {
    let mr = client.get_merge_request(project, mr_iid)?;
    let mr_milestone = mr
        .milestone
        .as_ref()
        .ok_or(TrackError::NoMilestone(mr_iid))?;

    for issue_iid in refs::extract_issue_ids(mr.description_text()) {
        let issue = match client.get_issue(project, issue_iid) {
            Ok(issue) => issue,
            Err(e) => {
                warn!(issue = issue_iid, error = %e, "skipping unreadable linked issue");
                continue;
            }
        };
        match &issue.milestone {
            None => return Err(TrackError::IssueWithoutMilestone(issue_iid)),
            Some(m) if m.id != mr_milestone.id => {
                return Err(TrackError::MilestoneMismatch {
                    issue: issue_iid,
                    issue_milestone: m.title.clone(),
                    mr_milestone: mr_milestone.title.clone(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Changelog gate
// ---------------------------------------------------------------------------

/// Resolve the changelog entry for the MR, failing the gate when none exists.
///
/// Under CI (`in_ci`), a failing gate also posts the canonical comment on
/// the MR so the author sees why the pipeline blocked the merge; a failure
/// to post is logged, not fatal — the gate still fails.
pub fn check_changelog(client: &Client, project: u64, mr_iid: u64, in_ci: bool) -> Result<String> {
    match changelog::resolve(client, project, mr_iid)? {
        Some(entry) => Ok(entry),
        None => {
            if in_ci {
                if let Err(e) = client.create_mr_note(project, mr_iid, NO_CHANGELOG_COMMENT) {
                    warn!(mr = mr_iid, error = %e, "failed to add changelog gate comment");
                }
            }
            Err(TrackError::NoChangelogEntry(mr_iid))
        }
    }
}

// ---------------------------------------------------------------------------
// Current-milestone assignment
// ---------------------------------------------------------------------------

/// Assign the active milestone titled "Current" (case-insensitive) to the MR
/// and every linked issue. Returns the milestone that was assigned.
pub fn assign_current_milestone(client: &Client, project: u64, mr_iid: u64) -> Result<Milestone> {
    let mr = client.get_merge_request(project, mr_iid)?;

    let current = client
        .list_milestones(project, Some("active"))?
        .into_iter()
        .find(|m| m.title.eq_ignore_ascii_case("current"))
        .ok_or(TrackError::NoCurrentMilestone)?;

    client.update_merge_request(
        project,
        mr_iid,
        &UpdateMergeRequestOpts {
            milestone_id: Some(current.id),
            ..Default::default()
        },
    )?;

    for issue_iid in refs::extract_issue_ids(mr.description_text()) {
        client.update_issue(
            project,
            issue_iid,
            &UpdateIssueOpts {
                milestone_id: Some(current.id),
                ..Default::default()
            },
        )?;
    }
    Ok(current)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fixtures::{issue_json_with_milestone, milestone_json, mr_json, mr_json_with};

    fn client_for(server: &mockito::ServerGuard) -> Client {
        Client::new(Config::new(server.url(), "t")).unwrap()
    }

    #[test]
    fn milestone_gate_fails_without_mr_milestone() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(5, "Test MR", "fixes #3"))
            .create();

        let err = check_milestone(&client_for(&server), 1, 5).unwrap_err();
        assert!(matches!(err, TrackError::NoMilestone(5)));
    }

    #[test]
    fn milestone_gate_fails_on_unassigned_linked_issue() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json_with(5, "Test MR", "fixes #3", Some((9, "v1.0")), "opened"))
            .create();
        let _issue = server
            .mock("GET", "/projects/1/issues/3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(issue_json_with_milestone(3, "", None))
            .create();

        let err = check_milestone(&client_for(&server), 1, 5).unwrap_err();
        assert!(matches!(err, TrackError::IssueWithoutMilestone(3)));
    }

    #[test]
    fn milestone_gate_fails_on_mismatched_milestone() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json_with(5, "Test MR", "fixes #3", Some((9, "v1.0")), "opened"))
            .create();
        let _issue = server
            .mock("GET", "/projects/1/issues/3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(issue_json_with_milestone(3, "", Some((8, "v0.9"))))
            .create();

        let err = check_milestone(&client_for(&server), 1, 5).unwrap_err();
        assert!(err.to_string().contains("different milestone"));
    }

    #[test]
    fn milestone_gate_passes_when_aligned() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json_with(5, "Test MR", "fixes #3", Some((9, "v1.0")), "opened"))
            .create();
        let _issue = server
            .mock("GET", "/projects/1/issues/3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(issue_json_with_milestone(3, "", Some((9, "v1.0"))))
            .create();

        check_milestone(&client_for(&server), 1, 5).unwrap();
    }

    #[test]
    fn changelog_gate_posts_comment_under_ci() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(5, "Test MR", "nothing tagged"))
            .create();
        let note = server
            .mock("POST", "/projects/1/merge_requests/5/notes")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "body": NO_CHANGELOG_COMMENT
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body("{\"id\": 1, \"body\": \"x\"}")
            .create();

        let err = check_changelog(&client_for(&server), 1, 5, true).unwrap_err();
        assert!(matches!(err, TrackError::NoChangelogEntry(5)));
        note.assert();
    }

    #[test]
    fn changelog_gate_skips_comment_outside_ci() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(5, "Test MR", "nothing tagged"))
            .create();
        let note = server
            .mock("POST", "/projects/1/merge_requests/5/notes")
            .expect(0)
            .create();

        let err = check_changelog(&client_for(&server), 1, 5, false).unwrap_err();
        assert!(matches!(err, TrackError::NoChangelogEntry(5)));
        note.assert();
    }

    #[test]
    fn assigns_current_milestone_to_mr_and_issues() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(5, "Test MR", "fixes #3"))
            .create();
        let _list = server
            .mock("GET", "/projects/1/milestones?state=active")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                "[{},{}]",
                milestone_json(2, "v1.0", ""),
                milestone_json(7, "Current", "")
            ))
            .create();
        let put_mr = server
            .mock("PUT", "/projects/1/merge_requests/5")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({ "milestone_id": 7 }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(5, "Test MR", "fixes #3"))
            .create();
        let put_issue = server
            .mock("PUT", "/projects/1/issues/3")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({ "milestone_id": 7 }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(issue_json_with_milestone(3, "", Some((7, "Current"))))
            .create();

        let assigned = assign_current_milestone(&client_for(&server), 1, 5).unwrap();
        assert_eq!(assigned.id, 7);
        put_mr.assert();
        put_issue.assert();
    }

    #[test]
    fn missing_current_milestone_is_a_described_error() {
        let mut server = mockito::Server::new();
        let _mr = server
            .mock("GET", "/projects/1/merge_requests/5")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mr_json(5, "Test MR", ""))
            .create();
        let _list = server
            .mock("GET", "/projects/1/milestones?state=active")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", milestone_json(2, "v1.0", "")))
            .create();

        let err = assign_current_milestone(&client_for(&server), 1, 5).unwrap_err();
        assert!(matches!(err, TrackError::NoCurrentMilestone));
    }
}
