use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("no API token found: set GITLAB_TOKEN or CI_JOB_TOKEN")]
    MissingToken,

    #[error("project ID is required: pass --project or set CI_PROJECT_ID")]
    MissingProject,

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("merge request #{0} has no milestone assigned")]
    NoMilestone(u64),

    #[error("linked issue #{0} has no milestone assigned")]
    IssueWithoutMilestone(u64),

    #[error("linked issue #{issue} has different milestone ({issue_milestone}) than MR ({mr_milestone})")]
    MilestoneMismatch {
        issue: u64,
        issue_milestone: String,
        mr_milestone: String,
    },

    #[error("no changelog entry found in MR #{0}")]
    NoChangelogEntry(u64),

    #[error("invalid changelog entry, missing source ID: {0}")]
    MalformedEntry(String),

    #[error("no active milestone named 'Current' found")]
    NoCurrentMilestone,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackError>;
