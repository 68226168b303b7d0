//! Markdown assembly: frontmatter block + sanitized body + optional media
//! block. The frontmatter dialect comes entirely from the core schema
//! projection; this module only decides the YAML surface syntax.

use postbridge_core::post::{ContentKind, PostRecord};
use postbridge_core::schema::{mapping_for, project, FrontmatterValue};

pub fn render_markdown(record: &PostRecord) -> String {
    let entries = project(record, mapping_for(record.kind));

    let mut out = String::from("---\n");
    for (key, value) in &entries {
        match value {
            FrontmatterValue::Scalar(scalar) => {
                out.push_str(key);
                out.push_str(": ");
                out.push_str(&quote(scalar));
                out.push('\n');
            }
            FrontmatterValue::List(items) => {
                out.push_str(key);
                out.push_str(":\n");
                for item in items {
                    out.push_str("  - ");
                    out.push_str(&quote(item));
                    out.push('\n');
                }
            }
        }
    }
    out.push_str("---\n\n");
    out.push_str(sanitize_body(&record.body).as_str());
    out.push('\n');

    if record.kind == ContentKind::Media {
        if let Some(media_url) = &record.media_url {
            let alt = record.media_alt.as_deref().unwrap_or("");
            out.push_str(&format!("\n![{alt}]({media_url})\n"));
        }
    }

    out
}

/// All scalars are double-quoted so titles containing `:`, quotes, or leading
/// symbols never break the frontmatter block.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Normalizes line endings and strips trailing whitespace per line; the body
/// is otherwise passed through verbatim.
fn sanitize_body(body: &str) -> String {
    body.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_owned()
}
