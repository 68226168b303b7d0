//! The interaction gateway: verify → decode → authorize → dispatch.
//!
//! This is the complete fast path. Terminal states are Pong, an immediate
//! ephemeral reply, a modal request, or a deferred acknowledgment carrying a
//! [`SubmissionJob`] for the background pipeline. Authorization failures and
//! validation failures on the command path become immediate ephemeral replies;
//! they never reach the background pipeline.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::commands::{CommandRouter, RouterOutcome};
use crate::modal::{components_json, extract_fields};
use crate::signature::{SignatureError, SignatureVerifier};
use crate::wire::{InteractionEnvelope, InteractionResponse, InteractionType};

/// Work handed to the background pipeline after a modal submission is acked.
/// Carries everything the slow path needs; the original request/response cycle
/// is closed by the time it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionJob {
    pub envelope_id: String,
    pub token: String,
    pub application_id: String,
    pub invoker_id: String,
    /// Raw modal custom id; the slow path parses the kind out of it so a
    /// malformed id surfaces as a follow-up validation message, not a dropped
    /// acknowledgment.
    pub modal_custom_id: String,
    pub fields: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GatewayOutcome {
    /// Respond and stop: pong, immediate reply, or modal request.
    Reply(InteractionResponse),
    /// Respond with a deferred ack and run `job` in the background.
    Deferred { response: InteractionResponse, job: SubmissionJob },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("interaction envelope could not be decoded: {0}")]
    Decode(String),
}

pub struct Gateway {
    verifier: SignatureVerifier,
    router: CommandRouter,
    authorized_user_id: String,
}

impl Gateway {
    pub fn new(
        verifier: SignatureVerifier,
        router: CommandRouter,
        authorized_user_id: impl Into<String>,
    ) -> Self {
        Self { verifier, router, authorized_user_id: authorized_user_id.into() }
    }

    /// Handles one webhook request. Signature verification happens before any
    /// body parsing; a [`GatewayError`] maps to an HTTP-level failure, every
    /// other outcome is a normal interaction response.
    pub fn handle(
        &self,
        raw_body: &[u8],
        signature: &str,
        timestamp: &str,
    ) -> Result<GatewayOutcome, GatewayError> {
        self.verifier.verify(timestamp, raw_body, signature)?;

        let envelope: InteractionEnvelope = serde_json::from_slice(raw_body)
            .map_err(|error| GatewayError::Decode(error.to_string()))?;

        info!(
            event_name = "ingress.interaction.received",
            interaction_id = %envelope.id,
            interaction_type = ?envelope.kind,
            invoker_id = envelope.invoker_id().unwrap_or("unknown"),
            "interaction received"
        );

        match envelope.kind {
            InteractionType::Ping => Ok(GatewayOutcome::Reply(InteractionResponse::pong())),
            InteractionType::ApplicationCommand => Ok(self.handle_command(envelope)),
            InteractionType::ModalSubmit => Ok(self.handle_modal_submit(envelope)),
            InteractionType::MessageComponent
            | InteractionType::CommandAutocomplete
            | InteractionType::Unknown(_) => {
                warn!(
                    event_name = "ingress.interaction.unsupported",
                    interaction_id = %envelope.id,
                    interaction_type = ?envelope.kind,
                    "unsupported interaction type"
                );
                Ok(GatewayOutcome::Reply(InteractionResponse::ephemeral_message(
                    "This interaction type is not supported.",
                )))
            }
        }
    }

    fn handle_command(&self, envelope: InteractionEnvelope) -> GatewayOutcome {
        if let Some(denied) = self.authorize(&envelope) {
            return denied;
        }

        let data = envelope.data.unwrap_or_default();
        let name = data.name.clone().unwrap_or_default();

        match self.router.route(&name, &data) {
            Ok(RouterOutcome::ImmediateReply(text)) => {
                GatewayOutcome::Reply(InteractionResponse::ephemeral_message(text))
            }
            Ok(RouterOutcome::ModalRequest { title, custom_id, fields }) => {
                GatewayOutcome::Reply(InteractionResponse::modal(
                    title,
                    custom_id,
                    components_json(&fields),
                ))
            }
            Err(error) => {
                warn!(
                    event_name = "ingress.command.rejected",
                    interaction_id = %envelope.id,
                    command = %name,
                    error = %error,
                    "command rejected on fast path"
                );
                GatewayOutcome::Reply(InteractionResponse::ephemeral_message(error.to_string()))
            }
        }
    }

    fn handle_modal_submit(&self, envelope: InteractionEnvelope) -> GatewayOutcome {
        if let Some(denied) = self.authorize(&envelope) {
            return denied;
        }

        // Past this point the submission is always acked deferred; field
        // validation happens in the background and reports via follow-up.
        let invoker_id = envelope.invoker_id().unwrap_or_default().to_owned();
        let data = envelope.data.unwrap_or_default();
        let job = SubmissionJob {
            envelope_id: envelope.id,
            token: envelope.token,
            application_id: envelope.application_id,
            invoker_id,
            modal_custom_id: data.custom_id.unwrap_or_default(),
            fields: extract_fields(&data.components),
        };

        GatewayOutcome::Deferred { response: InteractionResponse::deferred(), job }
    }

    fn authorize(&self, envelope: &InteractionEnvelope) -> Option<GatewayOutcome> {
        let invoker = envelope.invoker_id();
        if invoker == Some(self.authorized_user_id.as_str()) {
            return None;
        }

        warn!(
            event_name = "ingress.interaction.unauthorized",
            interaction_id = %envelope.id,
            invoker_id = invoker.unwrap_or("unknown"),
            "invoker is not the configured publisher"
        );
        Some(GatewayOutcome::Reply(InteractionResponse::ephemeral_message(
            "You are not authorized to publish with this bot.",
        )))
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::{Gateway, GatewayError, GatewayOutcome};
    use crate::commands::CommandRouter;
    use crate::signature::SignatureVerifier;
    use crate::wire::{InteractionCallbackType, InteractionResponse};

    const TIMESTAMP: &str = "1700000000";

    struct Harness {
        signing: SigningKey,
        gateway: Gateway,
    }

    impl Harness {
        fn new() -> Self {
            let signing = SigningKey::from_bytes(&[42u8; 32]);
            let verifier =
                SignatureVerifier::from_hex(&hex::encode(signing.verifying_key().to_bytes()))
                    .expect("valid key");
            let gateway =
                Gateway::new(verifier, CommandRouter::new("octocat/site", "U100"), "U100");
            Self { signing, gateway }
        }

        fn signed(&self, body: &str) -> Result<GatewayOutcome, GatewayError> {
            let mut message = TIMESTAMP.as_bytes().to_vec();
            message.extend_from_slice(body.as_bytes());
            let signature = hex::encode(self.signing.sign(&message).to_bytes());
            self.gateway.handle(body.as_bytes(), &signature, TIMESTAMP)
        }
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let harness = Harness::new();
        let outcome = harness
            .signed(r#"{"type":1,"id":"i1","token":"t","application_id":"a"}"#)
            .expect("handled");
        assert_eq!(outcome, GatewayOutcome::Reply(InteractionResponse::pong()));
    }

    #[test]
    fn forged_signature_is_rejected_before_parsing() {
        let harness = Harness::new();
        let body = r#"{"type":1,"id":"i1","token":"t","application_id":"a"}"#;
        let forged = hex::encode([0u8; 64]);

        let result = harness.gateway.handle(body.as_bytes(), &forged, TIMESTAMP);
        assert!(matches!(result, Err(GatewayError::Signature(_))));

        // Even unparseable bodies only fail on the signature.
        let result = harness.gateway.handle(b"not json", &forged, TIMESTAMP);
        assert!(matches!(result, Err(GatewayError::Signature(_))));
    }

    #[test]
    fn malformed_json_with_valid_signature_is_a_decode_error() {
        let harness = Harness::new();
        let result = harness.signed("{not json");
        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }

    #[test]
    fn command_from_unauthorized_invoker_gets_ephemeral_denial() {
        let harness = Harness::new();
        let outcome = harness
            .signed(
                r#"{"type":2,"id":"i1","token":"t","application_id":"a",
                    "member":{"user":{"id":"U999"}},
                    "data":{"name":"post","options":[{"name":"kind","value":"note"}]}}"#,
            )
            .expect("handled");

        let GatewayOutcome::Reply(response) = outcome else {
            panic!("expected reply");
        };
        assert_eq!(response.kind, InteractionCallbackType::ChannelMessage);
        let data = response.data.expect("data");
        assert!(data["content"].as_str().expect("content").contains("not authorized"));
    }

    #[test]
    fn authorized_post_command_opens_a_modal() {
        let harness = Harness::new();
        let outcome = harness
            .signed(
                r#"{"type":2,"id":"i1","token":"t","application_id":"a",
                    "member":{"user":{"id":"U100"}},
                    "data":{"name":"post","options":[{"name":"kind","value":"note"}]}}"#,
            )
            .expect("handled");

        let GatewayOutcome::Reply(response) = outcome else {
            panic!("expected reply");
        };
        assert_eq!(response.kind, InteractionCallbackType::Modal);
        let data = response.data.expect("data");
        assert_eq!(data["custom_id"], "post:note");
        assert_eq!(data["components"].as_array().expect("rows").len(), 4);
    }

    #[test]
    fn command_validation_error_is_an_immediate_reply_not_a_modal() {
        let harness = Harness::new();
        let outcome = harness
            .signed(
                r#"{"type":2,"id":"i1","token":"t","application_id":"a",
                    "member":{"user":{"id":"U100"}},
                    "data":{"name":"post","options":[{"name":"kind","value":"poll"}]}}"#,
            )
            .expect("handled");

        let GatewayOutcome::Reply(response) = outcome else {
            panic!("expected reply");
        };
        assert_eq!(response.kind, InteractionCallbackType::ChannelMessage);
        let data = response.data.expect("data");
        assert!(data["content"].as_str().expect("content").contains("unsupported post kind"));
    }

    #[test]
    fn modal_submit_is_always_deferred_with_a_job() {
        let harness = Harness::new();
        let outcome = harness
            .signed(
                r#"{"type":5,"id":"env-77","token":"tok-77","application_id":"app-1",
                    "member":{"user":{"id":"U100"}},
                    "data":{"custom_id":"post:note","components":[
                        {"components":[{"custom_id":"title","value":"Weekly Update"}]},
                        {"components":[{"custom_id":"content","value":"Shipped feature X."}]},
                        {"components":[{"custom_id":"tags","value":"dev, update"}]},
                        {"components":[{"custom_id":"slug","value":""}]}]}}"#,
            )
            .expect("handled");

        let GatewayOutcome::Deferred { response, job } = outcome else {
            panic!("expected deferred outcome");
        };
        assert_eq!(response.kind, InteractionCallbackType::DeferredChannelMessage);
        assert_eq!(job.envelope_id, "env-77");
        assert_eq!(job.token, "tok-77");
        assert_eq!(job.modal_custom_id, "post:note");
        assert_eq!(job.fields["title"], "Weekly Update");
        assert_eq!(job.fields["slug"], "");
    }

    #[test]
    fn unknown_interaction_type_gets_unsupported_reply() {
        let harness = Harness::new();
        let outcome = harness
            .signed(r#"{"type":11,"id":"i1","token":"t","application_id":"a"}"#)
            .expect("handled");

        assert!(matches!(
            outcome,
            GatewayOutcome::Reply(response)
                if response.kind == InteractionCallbackType::ChannelMessage
        ));
    }
}
