use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ValidationError;

/// Post kinds the bridge can publish. The kind decides which modal fields are
/// requested, which frontmatter dialect is rendered, and which site directory
/// receives the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Note,
    Response,
    Bookmark,
    Media,
}

impl ContentKind {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "note" => Ok(Self::Note),
            "response" => Ok(Self::Response),
            "bookmark" => Ok(Self::Bookmark),
            "media" => Ok(Self::Media),
            other => Err(ValidationError::UnknownKind(other.to_owned())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Response => "response",
            Self::Bookmark => "bookmark",
            Self::Media => "media",
        }
    }

    /// Site directory the rendered file lands in. Bookmarks share the response
    /// directory on the target site.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Note => "notes",
            Self::Response | Self::Bookmark => "responses",
            Self::Media => "media",
        }
    }

    /// Whether `target_url` is mandatory for this kind.
    pub fn requires_target_url(&self) -> bool {
        matches!(self, Self::Response | Self::Bookmark)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-kind for response posts, mapped into the `response_type` frontmatter key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Reply,
    Repost,
    Like,
}

impl ResponseKind {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reply" => Ok(Self::Reply),
            "repost" => Ok(Self::Repost),
            "like" => Ok(Self::Like),
            other => Err(ValidationError::UnknownResponseKind(other.to_owned())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Repost => "repost",
            Self::Like => "like",
        }
    }
}

/// Canonical post record. Built once per modal submission, passed by value
/// through the publish pipeline, never persisted. Optional strings are `None`
/// when not provided, never `Some("")`, so the frontmatter projection can tell
/// "not provided" apart from "explicitly empty".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRecord {
    pub title: String,
    pub body: String,
    pub kind: ContentKind,
    pub tags: Vec<String>,
    pub target_url: Option<String>,
    pub response_kind: Option<ResponseKind>,
    pub media_url: Option<String>,
    pub media_alt: Option<String>,
    pub slug: Option<String>,
    pub invoker_id: String,
    pub created_at: DateTime<Utc>,
}

/// Maps the flattened modal field map into a validated [`PostRecord`].
///
/// All strings are trimmed; tags are split on commas and deduplicated
/// case-insensitively with first-seen order preserved; kind-required fields are
/// checked here so nothing downstream has to re-validate.
pub fn normalize(
    fields: &HashMap<String, String>,
    kind: ContentKind,
    invoker_id: &str,
    now: DateTime<Utc>,
) -> Result<PostRecord, ValidationError> {
    let title = required(fields, "title")?;
    let body = required(fields, "content")?;
    let tags = split_tags(fields.get("tags").map(String::as_str).unwrap_or_default());
    let slug = optional(fields, "slug");

    let target_url = optional(fields, "target_url");
    if kind.requires_target_url() {
        let value = target_url.as_deref().ok_or(ValidationError::MissingField("target_url"))?;
        validate_url("target_url", value)?;
    }

    let media_url = optional(fields, "media_url");
    if let Some(value) = media_url.as_deref() {
        validate_url("media_url", value)?;
    }

    let response_kind = match optional(fields, "response_kind") {
        Some(value) => Some(ResponseKind::parse(&value)?),
        None => None,
    };

    Ok(PostRecord {
        title,
        body,
        kind,
        tags,
        target_url,
        response_kind,
        media_url,
        media_alt: optional(fields, "media_alt"),
        slug,
        invoker_id: invoker_id.to_owned(),
        created_at: now,
    })
}

fn required(
    fields: &HashMap<String, String>,
    key: &'static str,
) -> Result<String, ValidationError> {
    optional_by_key(fields, key).ok_or(ValidationError::MissingField(key))
}

fn optional(fields: &HashMap<String, String>, key: &'static str) -> Option<String> {
    optional_by_key(fields, key)
}

fn optional_by_key(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    let value = fields.get(key)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidUrl { field, value: value.to_owned() };
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    if !parsed.has_host() {
        return Err(invalid());
    }
    Ok(())
}

/// Splits a comma-separated tag string, trimming each entry and dropping
/// case-insensitive duplicates while keeping first-seen order.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut tags = Vec::new();
    for tag in raw.split(',') {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        let folded = tag.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        tags.push(tag.to_owned());
    }
    tags
}
