//! The RepositoryHost collaborator contract and its GitHub implementation.
//!
//! The trait is the seam the orchestrator is tested against; [`GitHubHost`] is
//! the production implementation speaking the REST v3 refs/contents/pulls
//! endpoints. Every call uses the client's bounded timeout; a timeout surfaces
//! as [`RepositoryHostError::Request`].

use async_trait::async_trait;
use base64::Engine as _;
use postbridge_core::config::GitHubConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryHostError {
    #[error("repository host request failed during {operation}: {detail}")]
    Request { operation: &'static str, detail: String },
    #[error("repository host returned {status} during {operation}: {detail}")]
    Status { operation: &'static str, status: u16, detail: String },
    #[error("`{reference}` was not found on the repository host")]
    NotFound { reference: String },
}

/// Outcome of a branch-creation call. An existing branch is not an error:
/// the orchestrator treats it as an idempotent retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchCreation {
    Created,
    AlreadyExists,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedFile {
    pub sha: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn create_branch(
        &self,
        name: &str,
        base: &str,
    ) -> Result<BranchCreation, RepositoryHostError>;

    async fn commit_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<CommittedFile, RepositoryHostError>;

    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequestRef, RepositoryHostError>;

    /// Returns `true` if the branch was deleted, `false` if it did not exist.
    async fn delete_branch(&self, name: &str) -> Result<bool, RepositoryHostError>;
}

pub struct GitHubHost {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    token: SecretString,
}

impl GitHubHost {
    pub fn new(config: &GitHubConfig) -> Result<Self, RepositoryHostError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| RepositoryHostError::Request {
                operation: "client_init",
                detail: error.to_string(),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            repo: config.repo.clone(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/repos/{}/{path}", self.api_base, self.repo))
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, "postbridge")
    }

    async fn base_sha(&self, base: &str) -> Result<String, RepositoryHostError> {
        let response = self
            .request(reqwest::Method::GET, &format!("git/ref/heads/{base}"))
            .send()
            .await
            .map_err(|error| transport("create_branch", error))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepositoryHostError::NotFound { reference: format!("heads/{base}") });
        }
        let response = check_status("create_branch", response).await?;
        let git_ref: GitRefResponse =
            response.json().await.map_err(|error| transport("create_branch", error))?;
        Ok(git_ref.object.sha)
    }
}

#[async_trait]
impl RepositoryHost for GitHubHost {
    async fn create_branch(
        &self,
        name: &str,
        base: &str,
    ) -> Result<BranchCreation, RepositoryHostError> {
        let sha = self.base_sha(base).await?;

        let response = self
            .request(reqwest::Method::POST, "git/refs")
            .json(&json!({ "ref": format!("refs/heads/{name}"), "sha": sha }))
            .send()
            .await
            .map_err(|error| transport("create_branch", error))?;

        // 422 "Reference already exists" is the idempotent-retry case.
        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Ok(BranchCreation::AlreadyExists);
        }
        check_status("create_branch", response).await?;
        Ok(BranchCreation::Created)
    }

    async fn commit_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<CommittedFile, RepositoryHostError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        let response = self
            .request(reqwest::Method::PUT, &format!("contents/{path}"))
            .json(&json!({ "message": message, "content": encoded, "branch": branch }))
            .send()
            .await
            .map_err(|error| transport("commit_file", error))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepositoryHostError::NotFound { reference: path.to_owned() });
        }
        let response = check_status("commit_file", response).await?;
        let committed: ContentsResponse =
            response.json().await.map_err(|error| transport("commit_file", error))?;
        Ok(CommittedFile {
            sha: committed.commit.sha,
            url: committed.content.map(|content| content.html_url).unwrap_or_default(),
        })
    }

    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequestRef, RepositoryHostError> {
        let response = self
            .request(reqwest::Method::POST, "pulls")
            .json(&json!({ "title": title, "body": body, "head": head, "base": base }))
            .send()
            .await
            .map_err(|error| transport("create_pull_request", error))?;

        let response = check_status("create_pull_request", response).await?;
        let pull: PullResponse =
            response.json().await.map_err(|error| transport("create_pull_request", error))?;
        Ok(PullRequestRef { number: pull.number, url: pull.html_url })
    }

    async fn delete_branch(&self, name: &str) -> Result<bool, RepositoryHostError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("git/refs/heads/{name}"))
            .send()
            .await
            .map_err(|error| transport("delete_branch", error))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status("delete_branch", response).await?;
        Ok(true)
    }
}

fn transport(operation: &'static str, error: reqwest::Error) -> RepositoryHostError {
    RepositoryHostError::Request { operation, detail: error.to_string() }
}

async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, RepositoryHostError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(RepositoryHostError::Status { operation, status: status.as_u16(), detail })
}

#[derive(Debug, Deserialize)]
struct GitRefResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<ContentInfo>,
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct ContentInfo {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}
