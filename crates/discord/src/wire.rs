//! Wire contract for webhook-delivered interactions.
//!
//! Type codes are modeled as exhaustive enums rather than bare integers so a
//! new interaction type is a compile-time exercise, with an `Unknown` variant
//! absorbing codes this service does not handle (those get an "unsupported"
//! reply, never a decode failure).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Incoming interaction type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    CommandAutocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::CommandAutocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(kind: InteractionType) -> Self {
        match kind {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::CommandAutocomplete => 4,
            InteractionType::ModalSubmit => 5,
            InteractionType::Unknown(other) => other,
        }
    }
}

/// Outgoing interaction callback type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum InteractionCallbackType {
    Pong,
    ChannelMessage,
    DeferredChannelMessage,
    Modal,
}

impl From<InteractionCallbackType> for u8 {
    fn from(kind: InteractionCallbackType) -> Self {
        match kind {
            InteractionCallbackType::Pong => 1,
            InteractionCallbackType::ChannelMessage => 4,
            InteractionCallbackType::DeferredChannelMessage => 5,
            InteractionCallbackType::Modal => 9,
        }
    }
}

/// Message flag marking a reply visible only to the invoker.
pub const EPHEMERAL_FLAG: u64 = 64;

/// The decoded webhook envelope. Single-use; the `token` stays valid for a
/// platform-bounded window (~15 minutes) for follow-up messages only. Never
/// persisted.
#[derive(Clone, Debug, Deserialize)]
pub struct InteractionEnvelope {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub id: String,
    pub token: String,
    pub application_id: String,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

impl InteractionEnvelope {
    /// Invoker identity, whether the interaction arrived from a guild
    /// (`member.user`) or a direct message (`user`).
    pub fn invoker_id(&self) -> Option<&str> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(self.user.as_ref())
            .map(|user| user.id.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: String,
}

/// Payload-specific data: command name + options for commands, custom id +
/// component rows for modal submissions.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub components: Vec<ComponentRow>,
    #[serde(default)]
    pub resolved: Option<ResolvedData>,
}

impl InteractionData {
    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options.iter().find(|option| option.name == name).map(|option| &option.value)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(serde_json::Value::as_str)
    }

    /// Resolves an attachment-type option to its metadata, if both the option
    /// and the resolved entry are present.
    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        let id = self.option_str(name)?;
        self.resolved.as_ref()?.attachments.get(id)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// One action row inside a modal submission. Rows hold exactly one text input
/// each in this application, but the wire shape is a list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ComponentRow {
    #[serde(default)]
    pub components: Vec<InputComponent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InputComponent {
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub attachments: HashMap<String, Attachment>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// The response body returned to the webhook caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: InteractionCallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: InteractionCallbackType::Pong, data: None }
    }

    /// Immediate message visible only to the invoker.
    pub fn ephemeral_message(content: impl Into<String>) -> Self {
        Self {
            kind: InteractionCallbackType::ChannelMessage,
            data: Some(json!({ "content": content.into(), "flags": EPHEMERAL_FLAG })),
        }
    }

    /// Deferred acknowledgment: "accepted, result follows later".
    pub fn deferred() -> Self {
        Self { kind: InteractionCallbackType::DeferredChannelMessage, data: None }
    }

    pub fn modal(title: impl Into<String>, custom_id: impl Into<String>, components: serde_json::Value) -> Self {
        Self {
            kind: InteractionCallbackType::Modal,
            data: Some(json!({
                "title": title.into(),
                "custom_id": custom_id.into(),
                "components": components,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InteractionCallbackType, InteractionEnvelope, InteractionResponse, InteractionType};

    #[test]
    fn interaction_type_codes_round_trip() {
        for (code, expected) in [
            (1u8, InteractionType::Ping),
            (2, InteractionType::ApplicationCommand),
            (5, InteractionType::ModalSubmit),
            (9, InteractionType::Unknown(9)),
        ] {
            assert_eq!(InteractionType::from(code), expected);
            assert_eq!(u8::from(expected), code);
        }
    }

    #[test]
    fn callback_type_serializes_to_wire_code() {
        let response = InteractionResponse::deferred();
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["type"], 5);
        assert!(value.get("data").is_none());

        let pong = serde_json::to_value(InteractionResponse::pong()).expect("serialize");
        assert_eq!(pong["type"], 1);
    }

    #[test]
    fn ephemeral_message_sets_invoker_only_flag() {
        let value =
            serde_json::to_value(InteractionResponse::ephemeral_message("nope")).expect("serialize");
        assert_eq!(value["type"], u8::from(InteractionCallbackType::ChannelMessage));
        assert_eq!(value["data"]["flags"], 64);
        assert_eq!(value["data"]["content"], "nope");
    }

    #[test]
    fn envelope_decodes_guild_and_dm_invokers() {
        let guild: InteractionEnvelope = serde_json::from_str(
            r#"{"type":2,"id":"i1","token":"t","application_id":"a",
                "member":{"user":{"id":"U1"}},
                "data":{"name":"post"}}"#,
        )
        .expect("decode");
        assert_eq!(guild.invoker_id(), Some("U1"));
        assert_eq!(guild.kind, InteractionType::ApplicationCommand);

        let dm: InteractionEnvelope = serde_json::from_str(
            r#"{"type":1,"id":"i2","token":"t","application_id":"a","user":{"id":"U2"}}"#,
        )
        .expect("decode");
        assert_eq!(dm.invoker_id(), Some("U2"));
    }

    #[test]
    fn attachment_resolution_joins_option_and_resolved_map() {
        let envelope: InteractionEnvelope = serde_json::from_str(
            r#"{"type":2,"id":"i1","token":"t","application_id":"a",
                "user":{"id":"U1"},
                "data":{"name":"post",
                        "options":[{"name":"attachment","value":"900"}],
                        "resolved":{"attachments":{"900":{"url":"https://cdn.example/x.png","content_type":"image/png"}}}}}"#,
        )
        .expect("decode");

        let data = envelope.data.expect("data");
        let attachment = data.attachment("attachment").expect("attachment");
        assert_eq!(attachment.url, "https://cdn.example/x.png");
        assert_eq!(attachment.content_type.as_deref(), Some("image/png"));
    }
}
