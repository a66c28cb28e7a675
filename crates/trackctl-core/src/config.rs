use crate::error::{Result, TrackError};

pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection settings for the tracker API.
///
/// Built from the environment the way a CI job would see it: the job token
/// takes precedence over a personal token, and `CI_API_V4_URL` points at the
/// instance that spawned the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub token: String,
}

impl Config {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let token = non_empty_env("CI_JOB_TOKEN")
            .or_else(|| non_empty_env("GITLAB_TOKEN"))
            .ok_or(TrackError::MissingToken)?;
        let base_url =
            non_empty_env("CI_API_V4_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self { base_url, token })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// CI attribution
// ---------------------------------------------------------------------------

/// Trailer appended to descriptions created from a pipeline, so issues filed
/// by automation point back at the job that created them. `None` outside CI.
pub fn ci_trailer() -> Option<String> {
    if non_empty_env("CI").is_none() {
        return None;
    }
    Some(format_trailer(
        &std::env::var("CI_JOB_URL").unwrap_or_default(),
        &std::env::var("CI_PIPELINE_URL").unwrap_or_default(),
        &std::env::var("CI_COMMIT_REF_NAME").unwrap_or_default(),
    ))
}

fn format_trailer(job_url: &str, pipeline_url: &str, branch: &str) -> String {
    format!("\n\n---\nCreated by CI job: {job_url}\nPipeline: {pipeline_url}\nBranch: {branch}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
