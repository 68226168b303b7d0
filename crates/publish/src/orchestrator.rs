//! Strictly ordered publish sequence: create branch, commit file, open pull
//! request. Each step runs at most once per invocation; the only compensating
//! action is a single best-effort branch delete after a failed commit.

use std::sync::Arc;

use chrono::Utc;
use postbridge_core::identifiers::{plan, PublishPlan};
use postbridge_core::post::PostRecord;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::host::{BranchCreation, RepositoryHost, RepositoryHostError};
use crate::render::render_markdown;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish failed during {operation}: {source}")]
    Host {
        operation: &'static str,
        #[source]
        source: RepositoryHostError,
    },
    /// The commit failed after the branch had been created. The branch delete
    /// already ran (best-effort); `rolled_back` says whether it succeeded, so
    /// callers can tell the invoker whether `branch` may have been left behind.
    #[error("publish failed during {operation} on branch `{branch}`: {source}")]
    Partial {
        branch: String,
        rolled_back: bool,
        operation: &'static str,
        #[source]
        source: RepositoryHostError,
    },
}

/// Outcome of a publish attempt that got at least as far as a commit.
///
/// `success` with `error_details` set means the content is committed on its
/// branch but the pull request could not be opened; the branch is left in
/// place for manual review.
#[derive(Clone, Debug)]
pub struct PublishResult {
    pub success: bool,
    pub filename: String,
    pub filepath: String,
    pub branch_name: String,
    pub commit_sha: String,
    pub file_url: String,
    pub pr_url: Option<String>,
    pub error_details: Option<String>,
}

pub struct Orchestrator {
    host: Arc<dyn RepositoryHost>,
    base_branch: String,
}

impl Orchestrator {
    pub fn new(host: Arc<dyn RepositoryHost>, base_branch: impl Into<String>) -> Self {
        Self { host, base_branch: base_branch.into() }
    }

    /// Runs the full branch → commit → pull-request sequence for one record.
    ///
    /// `envelope_id` seeds the branch name, so concurrent submissions from the
    /// same user never collide. No step is retried; a branch that already
    /// exists is treated as a resumed attempt and committed onto.
    pub async fn publish(
        &self,
        record: &PostRecord,
        envelope_id: &str,
    ) -> Result<PublishResult, PublishError> {
        let publish_plan = plan(record, Utc::now(), envelope_id);
        let markdown = render_markdown(record);

        info!(
            event_name = "publish.started",
            kind = record.kind.label(),
            branch = %publish_plan.branch_name,
            filepath = %publish_plan.filepath(),
            "starting publish sequence"
        );

        match self.host.create_branch(&publish_plan.branch_name, &self.base_branch).await {
            Ok(BranchCreation::Created) => {}
            Ok(BranchCreation::AlreadyExists) => {
                info!(
                    event_name = "publish.branch_reused",
                    branch = %publish_plan.branch_name,
                    "branch already exists, continuing"
                );
            }
            Err(source) => {
                error!(
                    event_name = "publish.branch_failed",
                    branch = %publish_plan.branch_name,
                    error = %source,
                    "branch creation failed, nothing to roll back"
                );
                return Err(PublishError::Host { operation: "create_branch", source });
            }
        }

        let committed = match self
            .host
            .commit_file(
                &publish_plan.filepath(),
                &markdown,
                &publish_plan.commit_message,
                &publish_plan.branch_name,
            )
            .await
        {
            Ok(committed) => committed,
            Err(source) => {
                let rolled_back = self.roll_back_branch(&publish_plan).await;
                return Err(PublishError::Partial {
                    branch: publish_plan.branch_name,
                    rolled_back,
                    operation: "commit_file",
                    source,
                });
            }
        };

        info!(
            event_name = "publish.committed",
            branch = %publish_plan.branch_name,
            sha = %committed.sha,
            "file committed"
        );

        let pull = self
            .host
            .create_pull_request(
                &publish_plan.pr_title,
                &publish_plan.pr_body,
                &publish_plan.branch_name,
                &self.base_branch,
            )
            .await;

        let result = match pull {
            Ok(pull) => {
                info!(
                    event_name = "publish.completed",
                    branch = %publish_plan.branch_name,
                    pr_url = %pull.url,
                    "publish sequence complete"
                );
                PublishResult {
                    success: true,
                    filename: publish_plan.filename.clone(),
                    filepath: publish_plan.filepath(),
                    branch_name: publish_plan.branch_name,
                    commit_sha: committed.sha,
                    file_url: committed.url,
                    pr_url: Some(pull.url),
                    error_details: None,
                }
            }
            // The commit survives a failed pull request; the branch is left
            // for manual follow-up rather than rolled back.
            Err(source) => {
                warn!(
                    event_name = "publish.pr_failed",
                    branch = %publish_plan.branch_name,
                    error = %source,
                    "pull request creation failed, commit kept"
                );
                PublishResult {
                    success: true,
                    filename: publish_plan.filename.clone(),
                    filepath: publish_plan.filepath(),
                    branch_name: publish_plan.branch_name,
                    commit_sha: committed.sha,
                    file_url: committed.url,
                    pr_url: None,
                    error_details: Some(format!("pull request creation failed: {source}")),
                }
            }
        };

        Ok(result)
    }

    /// Single best-effort delete after a failed commit. A failed delete is
    /// logged and swallowed so the commit error stays the reported cause;
    /// returns whether the branch is known to be gone.
    async fn roll_back_branch(&self, publish_plan: &PublishPlan) -> bool {
        match self.host.delete_branch(&publish_plan.branch_name).await {
            Ok(deleted) => {
                info!(
                    event_name = "publish.rolled_back",
                    branch = %publish_plan.branch_name,
                    deleted,
                    "branch rollback after failed commit"
                );
                true
            }
            Err(delete_error) => {
                warn!(
                    event_name = "publish.rollback_failed",
                    branch = %publish_plan.branch_name,
                    error = %delete_error,
                    "branch could not be deleted after failed commit"
                );
                false
            }
        }
    }
}
