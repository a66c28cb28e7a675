use crate::config::Config;
use crate::error::{Result, TrackError};
use crate::types::{Issue, MergeRequest, Milestone, Note};
use reqwest::blocking::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking REST client for the tracker API.
///
/// One handle per process, passed explicitly into every operation that talks
/// to the remote — there is no global client. Every call is a single
/// synchronous request; retries and timeouts are left to the transport.
pub struct Client {
    http: HttpClient,
    base_url: String,
    token: String,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpClient::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            return Err(TrackError::Api {
                status: status.as_u16(),
                message: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp.json()?)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &[])
    }

    fn get_with_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .header("PRIVATE-TOKEN", &self.token)
            .send()?;
        Self::decode(resp)
    }

    fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path, "POST");
        let resp = self
            .http
            .post(self.url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .json(body)
            .send()?;
        Self::decode(resp)
    }

    fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        debug!(path, "PUT");
        let resp = self
            .http
            .put(self.url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .json(body)
            .send()?;
        Self::decode(resp)
    }

    fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "DELETE");
        let resp = self
            .http
            .delete(self.url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TrackError::Api {
                status: status.as_u16(),
                message: resp.text().unwrap_or_default(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    pub fn list_issues(&self, project: u64, state: Option<&str>) -> Result<Vec<Issue>> {
        let mut query = Vec::new();
        if let Some(s) = state {
            query.push(("state", s));
        }
        self.get_with_query(&format!("projects/{project}/issues"), &query)
    }

    pub fn get_issue(&self, project: u64, iid: u64) -> Result<Issue> {
        self.get(&format!("projects/{project}/issues/{iid}"))
    }

    pub fn create_issue(&self, project: u64, opts: &CreateIssueOpts) -> Result<Issue> {
        self.post(&format!("projects/{project}/issues"), opts)
    }

    pub fn update_issue(&self, project: u64, iid: u64, opts: &UpdateIssueOpts) -> Result<Issue> {
        self.put(&format!("projects/{project}/issues/{iid}"), opts)
    }

    pub fn delete_issue(&self, project: u64, iid: u64) -> Result<()> {
        self.delete(&format!("projects/{project}/issues/{iid}"))
    }

    // -----------------------------------------------------------------------
    // Merge requests
    // -----------------------------------------------------------------------

    pub fn list_merge_requests(
        &self,
        project: u64,
        state: Option<&str>,
        target_branch: Option<&str>,
    ) -> Result<Vec<MergeRequest>> {
        let mut query = Vec::new();
        if let Some(s) = state {
            query.push(("state", s));
        }
        if let Some(t) = target_branch {
            query.push(("target_branch", t));
        }
        self.get_with_query(&format!("projects/{project}/merge_requests"), &query)
    }

    pub fn get_merge_request(&self, project: u64, iid: u64) -> Result<MergeRequest> {
        self.get(&format!("projects/{project}/merge_requests/{iid}"))
    }

    pub fn create_merge_request(
        &self,
        project: u64,
        opts: &CreateMergeRequestOpts,
    ) -> Result<MergeRequest> {
        self.post(&format!("projects/{project}/merge_requests"), opts)
    }

    pub fn update_merge_request(
        &self,
        project: u64,
        iid: u64,
        opts: &UpdateMergeRequestOpts,
    ) -> Result<MergeRequest> {
        self.put(&format!("projects/{project}/merge_requests/{iid}"), opts)
    }

    /// Accept (merge) a merge request.
    pub fn merge_merge_request(
        &self,
        project: u64,
        iid: u64,
        merge_commit_message: Option<&str>,
    ) -> Result<MergeRequest> {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            merge_commit_message: Option<&'a str>,
        }
        self.put(
            &format!("projects/{project}/merge_requests/{iid}/merge"),
            &Body {
                merge_commit_message,
            },
        )
    }

    // -----------------------------------------------------------------------
    // Milestones
    // -----------------------------------------------------------------------

    pub fn list_milestones(&self, project: u64, state: Option<&str>) -> Result<Vec<Milestone>> {
        let mut query = Vec::new();
        if let Some(s) = state {
            query.push(("state", s));
        }
        self.get_with_query(&format!("projects/{project}/milestones"), &query)
    }

    pub fn get_milestone(&self, project: u64, id: u64) -> Result<Milestone> {
        self.get(&format!("projects/{project}/milestones/{id}"))
    }

    pub fn create_milestone(&self, project: u64, opts: &CreateMilestoneOpts) -> Result<Milestone> {
        self.post(&format!("projects/{project}/milestones"), opts)
    }

    pub fn update_milestone(
        &self,
        project: u64,
        id: u64,
        opts: &UpdateMilestoneOpts,
    ) -> Result<Milestone> {
        self.put(&format!("projects/{project}/milestones/{id}"), opts)
    }

    pub fn delete_milestone(&self, project: u64, id: u64) -> Result<()> {
        self.delete(&format!("projects/{project}/milestones/{id}"))
    }

    /// Merge requests assigned to a milestone.
    pub fn list_milestone_merge_requests(
        &self,
        project: u64,
        id: u64,
    ) -> Result<Vec<MergeRequest>> {
        self.get(&format!("projects/{project}/milestones/{id}/merge_requests"))
    }

    // -----------------------------------------------------------------------
    // Merge request notes
    // -----------------------------------------------------------------------

    pub fn list_mr_notes(&self, project: u64, mr_iid: u64) -> Result<Vec<Note>> {
        self.get(&format!("projects/{project}/merge_requests/{mr_iid}/notes"))
    }

    pub fn create_mr_note(&self, project: u64, mr_iid: u64, body: &str) -> Result<Note> {
        #[derive(Serialize)]
        struct Body<'a> {
            body: &'a str,
        }
        self.post(
            &format!("projects/{project}/merge_requests/{mr_iid}/notes"),
            &Body { body },
        )
    }
}

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct CreateIssueOpts {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateIssueOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
pub struct CreateMergeRequestOpts {
    pub title: String,
    pub source_branch: String,
    pub target_branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_source_branch: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateMergeRequestOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
pub struct CreateMilestoneOpts {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateMilestoneOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
