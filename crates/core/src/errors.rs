use thiserror::Error;

use crate::post::ContentKind;

/// Field-level failures raised while turning raw modal input into a
/// [`crate::post::PostRecord`], or while validating command options on the
/// fast path. Every variant renders to a message that is safe to show the
/// invoker verbatim in a follow-up or ephemeral reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
    #[error("field `{field}` is not a well-formed url: `{value}`")]
    InvalidUrl { field: &'static str, value: String },
    #[error("unsupported post kind `{0}` (expected note|response|bookmark|media)")]
    UnknownKind(String),
    #[error("unsupported response kind `{0}` (expected reply|repost|like)")]
    UnknownResponseKind(String),
    #[error("attachments are only accepted for media posts, not `{kind}`", kind = .0.label())]
    AttachmentKindMismatch(ContentKind),
    #[error("attachment content type `{0}` is not allowed (expected image, video, or audio)")]
    UnsupportedAttachmentType(String),
}

impl ValidationError {
    /// Stable name of the field the error is about, used as a structured log
    /// field and in follow-up messages.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => field,
            Self::InvalidUrl { field, .. } => field,
            Self::UnknownKind(_) => "kind",
            Self::UnknownResponseKind(_) => "response_kind",
            Self::AttachmentKindMismatch(_) | Self::UnsupportedAttachmentType(_) => "attachment",
        }
    }
}
