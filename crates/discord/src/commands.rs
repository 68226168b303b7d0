use postbridge_core::errors::ValidationError;
use postbridge_core::post::{ContentKind, ResponseKind};
use thiserror::Error;

use crate::modal::{modal_custom_id, modal_fields, ModalField};
use crate::wire::InteractionData;

/// Terminal outcome of routing a slash command on the fast path: either text
/// to show immediately, or a modal to open and wait for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouterOutcome {
    ImmediateReply(String),
    ModalRequest { title: String, custom_id: String, fields: Vec<ModalField> },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("command `{0}` carried no data payload")]
    MissingData(String),
}

const ALLOWED_ATTACHMENT_PREFIXES: [&str; 3] = ["image/", "video/", "audio/"];

/// Routes slash-command invocations. Pure and synchronous: every branch must
/// stay well inside the acknowledgment deadline.
#[derive(Clone, Debug)]
pub struct CommandRouter {
    repo: String,
    authorized_user_id: String,
}

impl CommandRouter {
    pub fn new(repo: impl Into<String>, authorized_user_id: impl Into<String>) -> Self {
        Self { repo: repo.into(), authorized_user_id: authorized_user_id.into() }
    }

    pub fn route(
        &self,
        name: &str,
        data: &InteractionData,
    ) -> Result<RouterOutcome, CommandRouteError> {
        match name {
            "status" => Ok(RouterOutcome::ImmediateReply(format!(
                "postbridge is up. Publishing to `{}` for <@{}>.",
                self.repo, self.authorized_user_id
            ))),
            "post" => self.route_post(data),
            other => Ok(RouterOutcome::ImmediateReply(format!(
                "Unsupported command `/{other}`. Try `/post` or `/status`."
            ))),
        }
    }

    fn route_post(&self, data: &InteractionData) -> Result<RouterOutcome, CommandRouteError> {
        let kind_value =
            data.option_str("kind").ok_or(ValidationError::MissingField("kind"))?;
        let kind = ContentKind::parse(kind_value)?;

        let response_kind = match data.option_str("response_kind") {
            Some(value) => Some(ResponseKind::parse(value)?),
            None => None,
        };

        let attachment = data.attachment("attachment");
        if let Some(attachment) = attachment {
            if kind != ContentKind::Media {
                return Err(ValidationError::AttachmentKindMismatch(kind).into());
            }
            let content_type = attachment.content_type.as_deref().unwrap_or("unknown");
            let allowed = ALLOWED_ATTACHMENT_PREFIXES
                .iter()
                .any(|prefix| content_type.starts_with(prefix));
            if !allowed {
                return Err(
                    ValidationError::UnsupportedAttachmentType(content_type.to_owned()).into()
                );
            }
        }

        let mut fields = modal_fields(kind);
        if let Some(attachment) = attachment {
            if let Some(media_field) =
                fields.iter_mut().find(|field| field.custom_id == "media_url")
            {
                media_field.prefill = Some(attachment.url.clone());
            }
        }

        Ok(RouterOutcome::ModalRequest {
            title: format!("New {kind} post"),
            custom_id: modal_custom_id(kind, response_kind),
            fields,
        })
    }
}
