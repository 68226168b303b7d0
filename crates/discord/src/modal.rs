//! Declarative modal forms.
//!
//! One static field table keyed by [`ContentKind`] replaces the per-kind modal
//! class hierarchy the platform SDKs encourage: every kind gets the shared
//! `{title, content, tags, slug}` quartet plus at most one kind-specific field,
//! and submissions are flattened back into a plain field map by
//! [`extract_fields`].

use std::collections::HashMap;

use postbridge_core::errors::ValidationError;
use postbridge_core::post::{ContentKind, ResponseKind};
use serde_json::{json, Value};

use crate::wire::ComponentRow;

/// Single-line vs multi-line text input, by wire style code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextInputStyle {
    Short,
    Paragraph,
}

impl TextInputStyle {
    fn code(self) -> u8 {
        match self {
            Self::Short => 1,
            Self::Paragraph => 2,
        }
    }
}

/// One declared modal input. There is no server-side interactivity here: the
/// platform enforces `required` and `max_length`, everything else is validated
/// after submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalField {
    pub custom_id: &'static str,
    pub label: &'static str,
    pub style: TextInputStyle,
    pub required: bool,
    pub max_length: u16,
    /// Pre-filled value, used to carry an attachment URL into `media_url`.
    pub prefill: Option<String>,
}

impl ModalField {
    const fn new(
        custom_id: &'static str,
        label: &'static str,
        style: TextInputStyle,
        required: bool,
        max_length: u16,
    ) -> Self {
        Self { custom_id, label, style, required, max_length, prefill: None }
    }
}

const TITLE: ModalField = ModalField::new("title", "Title", TextInputStyle::Short, true, 100);
const CONTENT: ModalField =
    ModalField::new("content", "Content", TextInputStyle::Paragraph, true, 4000);
const TAGS: ModalField =
    ModalField::new("tags", "Tags (comma-separated)", TextInputStyle::Short, false, 200);
const SLUG: ModalField =
    ModalField::new("slug", "Custom slug (optional)", TextInputStyle::Short, false, 80);
const TARGET_URL: ModalField =
    ModalField::new("target_url", "Target URL", TextInputStyle::Short, true, 500);
const MEDIA_URL: ModalField =
    ModalField::new("media_url", "Media URL", TextInputStyle::Short, false, 500);

/// The field list for one kind: always `{title, content, tags, slug}` plus the
/// kind-specific field.
pub fn modal_fields(kind: ContentKind) -> Vec<ModalField> {
    let mut fields = vec![TITLE, CONTENT, TAGS, SLUG];
    match kind {
        ContentKind::Note => {}
        ContentKind::Response | ContentKind::Bookmark => fields.push(TARGET_URL),
        ContentKind::Media => fields.push(MEDIA_URL),
    }
    fields
}

/// Builds the modal `custom_id` that lets the deferred phase recover the kind
/// without any stored state.
pub fn modal_custom_id(kind: ContentKind, response_kind: Option<ResponseKind>) -> String {
    match response_kind {
        Some(sub) => format!("post:{}:{}", kind.label(), sub.label()),
        None => format!("post:{}", kind.label()),
    }
}

/// Inverse of [`modal_custom_id`].
pub fn parse_modal_custom_id(
    custom_id: &str,
) -> Result<(ContentKind, Option<ResponseKind>), ValidationError> {
    let rest = custom_id
        .strip_prefix("post:")
        .ok_or_else(|| ValidationError::UnknownKind(custom_id.to_owned()))?;

    match rest.split_once(':') {
        Some((kind, sub)) => Ok((ContentKind::parse(kind)?, Some(ResponseKind::parse(sub)?))),
        None => Ok((ContentKind::parse(rest)?, None)),
    }
}

/// Renders the field list as wire component rows (one text input per row).
pub fn components_json(fields: &[ModalField]) -> Value {
    let rows: Vec<Value> = fields
        .iter()
        .map(|field| {
            let mut input = json!({
                "type": 4,
                "custom_id": field.custom_id,
                "label": field.label,
                "style": field.style.code(),
                "required": field.required,
                "max_length": field.max_length,
            });
            if let Some(prefill) = &field.prefill {
                input["value"] = json!(prefill);
            }
            json!({ "type": 1, "components": [input] })
        })
        .collect();
    Value::Array(rows)
}

/// Flattens a modal submission's two-level component rows into
/// `{custom_id: value}`. Missing values default to the empty string; malformed
/// rows simply contribute nothing. Pure, no failure mode.
pub fn extract_fields(rows: &[ComponentRow]) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for row in rows {
        for component in &row.components {
            let Some(custom_id) = &component.custom_id else {
                continue;
            };
            fields.insert(custom_id.clone(), component.value.clone().unwrap_or_default());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use postbridge_core::post::{ContentKind, ResponseKind};

    use super::{
        components_json, extract_fields, modal_custom_id, modal_fields, parse_modal_custom_id,
    };
    use crate::wire::{ComponentRow, InputComponent};

    fn field_ids(kind: ContentKind) -> Vec<&'static str> {
        modal_fields(kind).iter().map(|field| field.custom_id).collect()
    }

    #[test]
    fn note_modal_has_exactly_the_shared_quartet_in_order() {
        assert_eq!(field_ids(ContentKind::Note), vec!["title", "content", "tags", "slug"]);
    }

    #[test]
    fn kind_specific_field_is_appended_last() {
        assert_eq!(
            field_ids(ContentKind::Response),
            vec!["title", "content", "tags", "slug", "target_url"]
        );
        assert_eq!(
            field_ids(ContentKind::Bookmark),
            vec!["title", "content", "tags", "slug", "target_url"]
        );
        assert_eq!(
            field_ids(ContentKind::Media),
            vec!["title", "content", "tags", "slug", "media_url"]
        );
    }

    #[test]
    fn custom_id_round_trips_kind_and_sub_kind() {
        let plain = modal_custom_id(ContentKind::Note, None);
        assert_eq!(plain, "post:note");
        assert_eq!(parse_modal_custom_id(&plain).expect("parse"), (ContentKind::Note, None));

        let with_sub = modal_custom_id(ContentKind::Response, Some(ResponseKind::Repost));
        assert_eq!(with_sub, "post:response:repost");
        assert_eq!(
            parse_modal_custom_id(&with_sub).expect("parse"),
            (ContentKind::Response, Some(ResponseKind::Repost))
        );
    }

    #[test]
    fn foreign_custom_ids_are_rejected() {
        assert!(parse_modal_custom_id("something:else").is_err());
        assert!(parse_modal_custom_id("post:poll").is_err());
        assert!(parse_modal_custom_id("post:response:boost").is_err());
    }

    #[test]
    fn components_json_renders_one_input_per_row() {
        let rendered = components_json(&modal_fields(ContentKind::Note));
        let rows = rendered.as_array().expect("rows");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["components"][0]["custom_id"], "title");
        assert_eq!(rows[1]["components"][0]["style"], 2);
        assert_eq!(rows[2]["components"][0]["required"], false);
    }

    #[test]
    fn prefill_value_is_included_when_set() {
        let mut fields = modal_fields(ContentKind::Media);
        let media = fields.last_mut().expect("media field");
        media.prefill = Some("https://cdn.example/img.png".to_owned());

        let rendered = components_json(&fields);
        assert_eq!(
            rendered[4]["components"][0]["value"],
            "https://cdn.example/img.png"
        );
        assert!(rendered[0]["components"][0].get("value").is_none());
    }

    #[test]
    fn extract_flattens_rows_and_defaults_missing_values() {
        let rows = vec![
            ComponentRow {
                components: vec![InputComponent {
                    custom_id: Some("title".to_owned()),
                    value: Some("Hello".to_owned()),
                }],
            },
            ComponentRow {
                components: vec![InputComponent {
                    custom_id: Some("tags".to_owned()),
                    value: None,
                }],
            },
            // malformed row: no custom id
            ComponentRow {
                components: vec![InputComponent { custom_id: None, value: Some("x".to_owned()) }],
            },
            ComponentRow { components: vec![] },
        ];

        let fields = extract_fields(&rows);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["title"], "Hello");
        assert_eq!(fields["tags"], "");
    }
}
