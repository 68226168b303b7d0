//! Deterministic identifier generation: slugs, filenames, branch names, and
//! the per-attempt publish plan.
//!
//! Branch names carry date, kind, invoker, and the request-scoped envelope id.
//! That entropy is the system's only concurrency control: two deliveries can
//! never share an envelope id, so two in-flight publishes never collide on a
//! branch without any locking.

use chrono::{DateTime, Utc};

use crate::post::PostRecord;

pub const SLUG_MAX_CHARS: usize = 80;
pub const FALLBACK_SLUG: &str = "untitled";
const PREVIEW_MAX_CHARS: usize = 50;

/// Everything the orchestrator needs for one publish attempt. Derived fresh
/// from the record and the current timestamp; never reused across attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishPlan {
    pub filename: String,
    pub directory: String,
    pub branch_name: String,
    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,
}

impl PublishPlan {
    pub fn filepath(&self) -> String {
        format!("{}/{}", self.directory, self.filename)
    }
}

/// Normalizes arbitrary text into a filename-safe slug: lowercased, unicode
/// alphanumerics kept, everything else collapsed to single hyphens, trimmed,
/// capped at [`SLUG_MAX_CHARS`]. Idempotent.
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_hyphen = false;

    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }

    if slug.chars().count() > SLUG_MAX_CHARS {
        slug = slug.chars().take(SLUG_MAX_CHARS).collect();
    }
    slug.trim_end_matches('-').to_owned()
}

/// Builds the publish plan for one attempt.
///
/// Slug priority: the invoker's custom slug when it survives sanitization,
/// then the title, then [`FALLBACK_SLUG`]. The filename date comes from `now`,
/// not any user-supplied value, so directory listings sort chronologically.
pub fn plan(record: &PostRecord, now: DateTime<Utc>, envelope_id: &str) -> PublishPlan {
    let slug = resolve_slug(record);
    let date = now.format("%Y-%m-%d");
    let filename = format!("{date}-{slug}.md");
    let directory = record.kind.directory().to_owned();
    let branch_name = format!(
        "content/bot/{date}/{kind}/{invoker}-{envelope_id}",
        kind = record.kind,
        invoker = record.invoker_id,
    );

    let title_preview = preview(&record.title);
    let body_preview = preview(&record.body);
    let pr_body = format!(
        "## New {kind} post\n\n\
         **Title:** {title}\n\n\
         **Preview:** {body_preview}\n\n\
         **Validation:** title, content{url_check} verified by the bot.\n\n\
         ### Review checklist\n\
         - [ ] Frontmatter fields look correct\n\
         - [ ] Content renders as expected\n\
         - [ ] Tags and slug are appropriate\n",
        kind = record.kind,
        title = record.title,
        url_check = if record.target_url.is_some() { ", target url" } else { "" },
    );

    PublishPlan {
        filename,
        directory,
        branch_name,
        commit_message: format!("Add {kind} post: {slug}", kind = record.kind),
        pr_title: format!("Publish {kind}: {title_preview}", kind = record.kind),
        pr_body,
    }
}

fn resolve_slug(record: &PostRecord) -> String {
    if let Some(custom) = record.slug.as_deref() {
        let sanitized = sanitize_slug(custom);
        if !sanitized.is_empty() {
            return sanitized;
        }
    }
    let from_title = sanitize_slug(&record.title);
    if from_title.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        from_title
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
