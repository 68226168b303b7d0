//! Background half of a modal submission. Runs detached after the deferred
//! acknowledgment; every exit path sends exactly one follow-up message and
//! nothing here can fail the HTTP request that spawned it.

use std::sync::Arc;

use chrono::Utc;
use postbridge_core::post::{normalize, ContentKind, PostRecord};
use postbridge_discord::gateway::SubmissionJob;
use postbridge_discord::modal::parse_modal_custom_id;
use postbridge_publish::media::MediaStore;
use postbridge_publish::notifier::Notifier;
use postbridge_publish::orchestrator::{Orchestrator, PublishError, PublishResult};
use tracing::{error, info, warn};

pub struct SubmissionPipeline {
    orchestrator: Orchestrator,
    notifier: Arc<dyn Notifier>,
    media: Arc<dyn MediaStore>,
    site_base_url: String,
    repo: String,
}

impl SubmissionPipeline {
    pub fn new(
        orchestrator: Orchestrator,
        notifier: Arc<dyn Notifier>,
        media: Arc<dyn MediaStore>,
        site_base_url: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            notifier,
            media,
            site_base_url: site_base_url.into(),
            repo: repo.into(),
        }
    }

    /// Processes one submission end to end. Infallible by contract: failures
    /// become the content of the follow-up message.
    pub async fn run(&self, job: SubmissionJob) {
        let message = self.process(&job).await;

        let delivered =
            self.notifier.send_followup(&job.application_id, &job.token, &message).await;
        if !delivered {
            error!(
                event_name = "pipeline.followup_lost",
                envelope_id = %job.envelope_id,
                invoker_id = %job.invoker_id,
                "submission outcome could not be reported back"
            );
        }
    }

    async fn process(&self, job: &SubmissionJob) -> String {
        let (kind, response_kind) = match parse_modal_custom_id(&job.modal_custom_id) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    event_name = "pipeline.custom_id_rejected",
                    envelope_id = %job.envelope_id,
                    custom_id = %job.modal_custom_id,
                    error = %error,
                    "modal custom id could not be parsed"
                );
                return format!("❌ Your submission could not be processed: {error}");
            }
        };

        let mut fields = job.fields.clone();
        if let Some(response_kind) = response_kind {
            fields.insert("response_kind".to_owned(), response_kind.label().to_owned());
        }

        let mut record = match normalize(&fields, kind, &job.invoker_id, Utc::now()) {
            Ok(record) => record,
            Err(error) => {
                info!(
                    event_name = "pipeline.validation_rejected",
                    envelope_id = %job.envelope_id,
                    kind = kind.label(),
                    error = %error,
                    "submission failed validation"
                );
                return format!("❌ Your {} was not published: {error}", kind.label());
            }
        };

        self.rehome_media(&mut record).await;

        match self.orchestrator.publish(&record, &job.envelope_id).await {
            Ok(result) => self.describe_outcome(kind, &result),
            Err(error) => {
                error!(
                    event_name = "pipeline.publish_failed",
                    envelope_id = %job.envelope_id,
                    kind = kind.label(),
                    invoker_id = %job.invoker_id,
                    error = %error,
                    "publish sequence failed"
                );
                match error {
                    PublishError::Host { .. } => format!(
                        "❌ Publishing your {} to `{}` failed: {error}",
                        kind.label(),
                        self.repo
                    ),
                    PublishError::Partial { branch, rolled_back: true, .. } => format!(
                        "❌ Publishing your {} failed partway; branch `{branch}` was cleaned up. \
                         Nothing was published.",
                        kind.label()
                    ),
                    PublishError::Partial { branch, rolled_back: false, .. } => format!(
                        "❌ Publishing your {} failed partway and branch `{branch}` could not be \
                         cleaned up; it may still exist. Nothing was published.",
                        kind.label()
                    ),
                }
            }
        }
    }

    /// Media posts reference platform-hosted attachment URLs that expire; the
    /// store re-homes them before the markdown is rendered.
    async fn rehome_media(&self, record: &mut PostRecord) {
        if record.kind != ContentKind::Media {
            return;
        }
        let Some(source_url) = record.media_url.clone() else {
            return;
        };
        let filename = source_url.rsplit('/').next().unwrap_or_default().to_owned();
        record.media_url = Some(self.media.upload(&source_url, &filename).await);
    }

    fn describe_outcome(&self, kind: ContentKind, result: &PublishResult) -> String {
        match (&result.pr_url, &result.error_details) {
            (Some(pr_url), _) => format!(
                "✅ Your {} is ready for review!\nPull request: {pr_url}\nFile: `{}`\n\
                 It will appear on {} once merged.",
                kind.label(),
                result.filepath,
                self.site_base_url
            ),
            (None, Some(details)) => format!(
                "⚠️ Your {} was committed to branch `{}` but the pull request could not be \
                 opened ({details}). Open one manually from that branch.",
                kind.label(),
                result.branch_name
            ),
            (None, None) => format!(
                "✅ Your {} was committed to branch `{}`.",
                kind.label(),
                result.branch_name
            ),
        }
    }
}
