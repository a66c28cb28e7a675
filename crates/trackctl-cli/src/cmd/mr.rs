use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use tracing::warn;
use trackctl_core::client::{CreateMergeRequestOpts, UpdateMergeRequestOpts};
use trackctl_core::types::Issue;
use trackctl_core::{block, gate, Client};

#[derive(Subcommand)]
pub enum MrSubcommand {
    /// List merge requests
    List {
        /// MR state (opened/closed/merged/all)
        #[arg(long, short = 's')]
        state: Option<String>,
        /// Target branch
        #[arg(long, short = 't')]
        target: Option<String>,
    },
    /// Show merge request details
    Get { iid: u64 },
    /// Create a new merge request
    Create {
        /// Source branch
        #[arg(long, short = 's')]
        source: String,
        /// Target branch
        #[arg(long, short = 't', default_value = "main")]
        target: String,
        /// Merge request title
        #[arg(long, short = 'T')]
        title: String,
        /// Merge request description
        #[arg(long, short = 'd')]
        description: Option<String>,
        /// Remove source branch when merged
        #[arg(long, short = 'r')]
        remove_source: bool,
    },
    /// Update an existing merge request
    Update {
        iid: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// New target branch
        #[arg(long)]
        target: Option<String>,
    },
    /// Merge a merge request
    Merge {
        iid: u64,
        /// Merge commit message
        #[arg(long, short = 'M')]
        message: Option<String>,
    },
    /// Close a merge request
    Close { iid: u64 },
    /// Print the merge request description
    Description { iid: u64 },
    /// List issues linked from the merge request description
    Issues { iid: u64 },
    /// Resolve the changelog entry for the MR; fails (and comments, in CI) when none exists
    CheckChangelog { iid: u64 },
    /// Verify the MR and its linked issues share a milestone
    CheckMilestone { iid: u64 },
    /// Assign the active "Current" milestone to the MR and its linked issues
    SetMilestone { iid: u64 },
    /// Block the merge request from being merged
    Block {
        iid: u64,
        /// Reason for blocking
        #[arg(long, short = 'r')]
        reason: String,
    },
    /// Unblock the merge request
    Unblock { iid: u64 },
}

pub fn run(client: &Client, project: u64, subcmd: MrSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MrSubcommand::List { state, target } => {
            list(client, project, state.as_deref(), target.as_deref(), json)
        }
        MrSubcommand::Get { iid } => get(client, project, iid, json),
        MrSubcommand::Create {
            source,
            target,
            title,
            description,
            remove_source,
        } => create(client, project, source, target, title, description, remove_source, json),
        MrSubcommand::Update {
            iid,
            title,
            description,
            target,
        } => update(client, project, iid, title, description, target, json),
        MrSubcommand::Merge { iid, message } => merge(client, project, iid, message.as_deref(), json),
        MrSubcommand::Close { iid } => close(client, project, iid, json),
        MrSubcommand::Description { iid } => description(client, project, iid),
        MrSubcommand::Issues { iid } => issues(client, project, iid, json),
        MrSubcommand::CheckChangelog { iid } => check_changelog(client, project, iid, json),
        MrSubcommand::CheckMilestone { iid } => check_milestone(client, project, iid, json),
        MrSubcommand::SetMilestone { iid } => set_milestone(client, project, iid, json),
        MrSubcommand::Block { iid, reason } => block_mr(client, project, iid, &reason, json),
        MrSubcommand::Unblock { iid } => unblock_mr(client, project, iid, json),
    }
}

fn list(
    client: &Client,
    project: u64,
    state: Option<&str>,
    target: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mrs = client
        .list_merge_requests(project, state, target)
        .context("failed to list merge requests")?;

    if json {
        return print_json(&mrs);
    }
    if mrs.is_empty() {
        println!("No merge requests.");
        return Ok(());
    }

    for mr in &mrs {
        println!("#{}: [{}] {}", mr.iid, mr.state, mr.title);
        println!("  {} -> {}", mr.source_branch, mr.target_branch);
    }
    Ok(())
}

fn get(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    let mr = client
        .get_merge_request(project, iid)
        .with_context(|| format!("failed to get merge request #{iid}"))?;

    if json {
        return print_json(&mr);
    }

    println!("Merge Request #{}", mr.iid);
    println!("Title: {}", mr.title);
    println!("State: {}", mr.state);
    println!("Source: {}", mr.source_branch);
    println!("Target: {}", mr.target_branch);
    if let Some(m) = &mr.milestone {
        println!("Milestone: {}", m.title);
    }
    if !mr.description_text().is_empty() {
        println!("Description:\n{}", mr.description_text());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn create(
    client: &Client,
    project: u64,
    source: String,
    target: String,
    title: String,
    description: Option<String>,
    remove_source: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mr = client
        .create_merge_request(
            project,
            &CreateMergeRequestOpts {
                title,
                source_branch: source,
                target_branch: target,
                description,
                remove_source_branch: Some(remove_source),
            },
        )
        .context("failed to create merge request")?;

    if json {
        return print_json(&mr);
    }
    println!("Created merge request #{}: {}", mr.iid, mr.title);
    Ok(())
}

fn update(
    client: &Client,
    project: u64,
    iid: u64,
    title: Option<String>,
    description: Option<String>,
    target: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mr = client
        .update_merge_request(
            project,
            iid,
            &UpdateMergeRequestOpts {
                title,
                description,
                target_branch: target,
                ..Default::default()
            },
        )
        .with_context(|| format!("failed to update merge request #{iid}"))?;

    if json {
        return print_json(&mr);
    }
    println!("Updated merge request #{}", mr.iid);
    Ok(())
}

fn merge(
    client: &Client,
    project: u64,
    iid: u64,
    message: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mr = client
        .merge_merge_request(project, iid, message)
        .with_context(|| format!("failed to merge request #{iid}"))?;

    if json {
        return print_json(&mr);
    }
    println!("Merged request #{}", mr.iid);
    Ok(())
}

fn close(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    let mr = client
        .update_merge_request(
            project,
            iid,
            &UpdateMergeRequestOpts {
                state_event: Some("close".to_string()),
                ..Default::default()
            },
        )
        .with_context(|| format!("failed to close merge request #{iid}"))?;

    if json {
        return print_json(&mr);
    }
    println!("Closed merge request #{}", mr.iid);
    Ok(())
}

fn description(client: &Client, project: u64, iid: u64) -> anyhow::Result<()> {
    let mr = client
        .get_merge_request(project, iid)
        .with_context(|| format!("failed to get merge request #{iid}"))?;

    if mr.description_text().is_empty() {
        println!("No description provided");
    } else {
        println!("{}", mr.description_text());
    }
    Ok(())
}

fn issues(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    let mr = client
        .get_merge_request(project, iid)
        .with_context(|| format!("failed to get merge request #{iid}"))?;

    let mut linked: Vec<Issue> = Vec::new();
    for issue_iid in mr.linked_issue_iids() {
        match client.get_issue(project, issue_iid) {
            Ok(issue) => linked.push(issue),
            Err(e) => warn!(issue = issue_iid, error = %e, "failed to get linked issue"),
        }
    }

    if json {
        return print_json(&linked);
    }
    if linked.is_empty() {
        println!("No linked issues found");
        return Ok(());
    }

    println!("Found {} linked issues:", linked.len());
    let rows: Vec<Vec<String>> = linked
        .iter()
        .map(|i| vec![format!("#{}", i.iid), i.state.clone(), i.title.clone()])
        .collect();
    print_table(&["IID", "STATE", "TITLE"], rows);
    Ok(())
}

fn check_changelog(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    let in_ci = std::env::var("CI").is_ok_and(|v| !v.is_empty());
    let entry = gate::check_changelog(client, project, iid, in_ci)
        .context("changelog check failed")?;

    if json {
        return print_json(&serde_json::json!({ "mr": iid, "entry": entry }));
    }
    println!("Found changelog entry: {entry}");
    Ok(())
}

fn check_milestone(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    gate::check_milestone(client, project, iid).context("milestone check failed")?;

    if json {
        return print_json(&serde_json::json!({ "mr": iid, "milestone_check": "passed" }));
    }
    println!("Milestone check passed");
    Ok(())
}

fn set_milestone(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    let milestone = gate::assign_current_milestone(client, project, iid)
        .context("failed to assign current milestone")?;

    if json {
        return print_json(&serde_json::json!({
            "mr": iid,
            "milestone_id": milestone.id,
            "milestone": milestone.title,
        }));
    }
    println!(
        "Assigned milestone '{}' to merge request #{iid} and its linked issues",
        milestone.title
    );
    Ok(())
}

fn block_mr(client: &Client, project: u64, iid: u64, reason: &str, json: bool) -> anyhow::Result<()> {
    block::block(client, project, iid, reason)
        .with_context(|| format!("failed to block merge request #{iid}"))?;

    if json {
        return print_json(&serde_json::json!({ "mr": iid, "blocked": true, "reason": reason }));
    }
    println!("Blocked merge request #{iid}");
    Ok(())
}

fn unblock_mr(client: &Client, project: u64, iid: u64, json: bool) -> anyhow::Result<()> {
    block::unblock(client, project, iid)
        .with_context(|| format!("failed to unblock merge request #{iid}"))?;

    if json {
        return print_json(&serde_json::json!({ "mr": iid, "blocked": false }));
    }
    println!("Unblocked merge request #{iid}");
    Ok(())
}
