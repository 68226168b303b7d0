use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

/// Posts the single follow-up message that closes out a deferred interaction.
/// Fire-and-forget: a `false` return is logged by callers but never escalated,
/// because by this point the original request/response cycle is long closed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_followup(&self, application_id: &str, token: &str, content: &str) -> bool;
}

/// Production notifier speaking the interaction-webhook follow-up endpoint.
/// The interaction token stays valid for roughly fifteen minutes, far longer
/// than any publish attempt.
pub struct DiscordNotifier {
    client: reqwest::Client,
    api_base: String,
}

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

impl DiscordNotifier {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, timeout_secs)
    }

    pub fn with_api_base(api_base: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, api_base: api_base.into().trim_end_matches('/').to_owned() }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_followup(&self, application_id: &str, token: &str, content: &str) -> bool {
        let url = format!("{}/webhooks/{application_id}/{token}", self.api_base);
        let result = self.client.post(&url).json(&json!({ "content": content })).send().await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    event_name = "notify.followup_failed",
                    status = response.status().as_u16(),
                    "follow-up message rejected by platform"
                );
                false
            }
            Err(error) => {
                warn!(
                    event_name = "notify.followup_failed",
                    error = %error,
                    "follow-up message could not be delivered"
                );
                false
            }
        }
    }
}
