//! JSON payload builders shared by the HTTP-mock tests.

pub fn issue_json(iid: u64, description: &str) -> String {
    issue_json_with_milestone(iid, description, None)
}

pub fn issue_json_with_milestone(
    iid: u64,
    description: &str,
    milestone: Option<(u64, &str)>,
) -> String {
    let milestone = match milestone {
        Some((id, title)) => serde_json::json!({ "id": id, "title": title }),
        None => serde_json::Value::Null,
    };
    serde_json::json!({
        "iid": iid,
        "title": format!("Issue {iid}"),
        "description": description,
        "state": "opened",
        "labels": [],
        "milestone": milestone,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "web_url": format!("http://example.com/issues/{iid}"),
    })
    .to_string()
}

pub fn mr_json(iid: u64, title: &str, description: &str) -> String {
    mr_json_with(iid, title, description, None, "opened")
}

pub fn mr_json_with(
    iid: u64,
    title: &str,
    description: &str,
    milestone: Option<(u64, &str)>,
    state: &str,
) -> String {
    let milestone = match milestone {
        Some((id, mtitle)) => serde_json::json!({ "id": id, "title": mtitle }),
        None => serde_json::Value::Null,
    };
    serde_json::json!({
        "iid": iid,
        "title": title,
        "description": description,
        "state": state,
        "source_branch": "feature-branch",
        "target_branch": "main",
        "milestone": milestone,
        "merge_status": "can_be_merged",
        "has_conflicts": false,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "web_url": format!("http://example.com/merge_requests/{iid}"),
    })
    .to_string()
}

pub fn milestone_json(id: u64, title: &str, description: &str) -> String {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": description,
        "state": "active",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "web_url": format!("http://example.com/milestones/{id}"),
    })
    .to_string()
}

pub fn note_json(id: u64, body: &str) -> String {
    serde_json::json!({ "id": id, "body": body }).to_string()
}
