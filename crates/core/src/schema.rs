//! Frontmatter schema mapping.
//!
//! The [`PostRecord`] stays canonical all the way through the pipeline; the
//! target site's per-kind frontmatter dialect is produced only at render time
//! by [`project`]. Each kind has one static [`SchemaMapping`] table instead of
//! a type per kind, so adding a dialect field is a data change, not a new type.

use crate::post::{ContentKind, PostRecord, ResponseKind};

/// Static description of one kind's frontmatter dialect: which keys must be
/// emitted, how canonical record fields are renamed into dialect keys, and
/// which keys carry timestamps.
#[derive(Clone, Copy, Debug)]
pub struct SchemaMapping {
    pub required_fields: &'static [&'static str],
    pub renames: &'static [(&'static str, &'static str)],
    pub date_fields: &'static [&'static str],
}

/// A single frontmatter value. Tags render as a YAML list, everything else as
/// a scalar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrontmatterValue {
    Scalar(String),
    List(Vec<String>),
}

pub const NOTE_MAPPING: SchemaMapping = SchemaMapping {
    required_fields: &["post_type", "title", "published_date"],
    renames: &[("kind", "post_type"), ("created_at", "published_date")],
    date_fields: &["published_date"],
};

pub const RESPONSE_MAPPING: SchemaMapping = SchemaMapping {
    required_fields: &["title", "targeturl", "response_type", "dt_published", "dt_updated"],
    renames: &[
        ("target_url", "targeturl"),
        ("response_kind", "response_type"),
        ("created_at", "dt_published"),
        ("created_at", "dt_updated"),
    ],
    date_fields: &["dt_published", "dt_updated"],
};

pub const MEDIA_MAPPING: SchemaMapping = SchemaMapping {
    required_fields: &["post_type", "title", "published_date"],
    renames: &[("kind", "post_type"), ("created_at", "published_date")],
    date_fields: &["published_date"],
};

pub fn mapping_for(kind: ContentKind) -> &'static SchemaMapping {
    match kind {
        ContentKind::Note => &NOTE_MAPPING,
        ContentKind::Response | ContentKind::Bookmark => &RESPONSE_MAPPING,
        ContentKind::Media => &MEDIA_MAPPING,
    }
}

/// Projects a canonical record into the ordered frontmatter map for its kind.
///
/// Emits exactly the mapping's required fields, in table order, followed by
/// the optional tags/media fields when the record carries them. Pure; called
/// once per render.
pub fn project(record: &PostRecord, mapping: &SchemaMapping) -> Vec<(String, FrontmatterValue)> {
    let mut entries = Vec::with_capacity(mapping.required_fields.len() + 3);

    for &field in mapping.required_fields {
        let value = required_value(record, mapping, field);
        entries.push((field.to_owned(), FrontmatterValue::Scalar(value)));
    }

    if !record.tags.is_empty() {
        entries.push(("tags".to_owned(), FrontmatterValue::List(record.tags.clone())));
    }
    if record.kind == ContentKind::Media {
        if let Some(media_url) = &record.media_url {
            entries.push(("media_url".to_owned(), FrontmatterValue::Scalar(media_url.clone())));
        }
        if let Some(media_alt) = &record.media_alt {
            entries.push(("media_alt".to_owned(), FrontmatterValue::Scalar(media_alt.clone())));
        }
    }

    entries
}

fn required_value(record: &PostRecord, mapping: &SchemaMapping, field: &str) -> String {
    let canonical = mapping
        .renames
        .iter()
        .find(|(_, dialect)| *dialect == field)
        .map(|(canonical, _)| *canonical)
        .unwrap_or(field);

    if mapping.date_fields.contains(&field) {
        return render_date(record, field);
    }

    match canonical {
        "kind" => record.kind.label().to_owned(),
        "title" => record.title.clone(),
        "target_url" => record.target_url.clone().unwrap_or_default(),
        "response_kind" => response_type_value(record),
        other => {
            debug_assert!(false, "unmapped frontmatter field `{other}`");
            String::new()
        }
    }
}

fn render_date(record: &PostRecord, field: &str) -> String {
    // `published_date` is a calendar date; the dt_* pair carries the full
    // timestamp expected by the response dialect.
    if field == "published_date" {
        record.created_at.format("%Y-%m-%d").to_string()
    } else {
        record.created_at.to_rfc3339()
    }
}

fn response_type_value(record: &PostRecord) -> String {
    match record.kind {
        ContentKind::Bookmark => "bookmark".to_owned(),
        _ => record.response_kind.unwrap_or(ResponseKind::Reply).label().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};

    use super::{mapping_for, project, FrontmatterValue};
    use crate::post::{normalize, ContentKind};

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    fn keys(entries: &[(String, FrontmatterValue)]) -> Vec<&str> {
        entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    #[test]
    fn note_projection_contains_exactly_the_note_dialect() {
        let now = Utc.with_ymd_and_hms(2025, 8, 9, 10, 30, 0).unwrap();
        let record = normalize(
            &fields(&[("title", "Weekly Update"), ("content", "body"), ("tags", "dev, update")]),
            ContentKind::Note,
            "U1",
            now,
        )
        .expect("valid note");

        let entries = project(&record, mapping_for(record.kind));
        assert_eq!(keys(&entries), vec!["post_type", "title", "published_date", "tags"]);
        assert_eq!(entries[0].1, FrontmatterValue::Scalar("note".to_owned()));
        assert_eq!(entries[2].1, FrontmatterValue::Scalar("2025-08-09".to_owned()));
        assert_eq!(
            entries[3].1,
            FrontmatterValue::List(vec!["dev".to_owned(), "update".to_owned()])
        );
    }

    #[test]
    fn bookmark_projection_uses_response_dialect_with_bookmark_type() {
        let now = Utc.with_ymd_and_hms(2025, 8, 9, 10, 30, 0).unwrap();
        let record = normalize(
            &fields(&[
                ("title", "Interesting read"),
                ("content", "worth saving"),
                ("target_url", "https://example.com/article"),
            ]),
            ContentKind::Bookmark,
            "U1",
            now,
        )
        .expect("valid bookmark");

        let entries = project(&record, mapping_for(record.kind));
        assert_eq!(
            keys(&entries),
            vec!["title", "targeturl", "response_type", "dt_published", "dt_updated"]
        );
        assert_eq!(
            entries[1].1,
            FrontmatterValue::Scalar("https://example.com/article".to_owned())
        );
        assert_eq!(entries[2].1, FrontmatterValue::Scalar("bookmark".to_owned()));
    }

    #[test]
    fn response_without_sub_kind_defaults_to_reply() {
        let record = normalize(
            &fields(&[("title", "t"), ("content", "b"), ("target_url", "https://example.com")]),
            ContentKind::Response,
            "U1",
            Utc::now(),
        )
        .expect("valid response");

        let entries = project(&record, mapping_for(record.kind));
        assert_eq!(entries[2].1, FrontmatterValue::Scalar("reply".to_owned()));
    }

    #[test]
    fn media_projection_appends_media_fields_only_when_present() {
        let now = Utc::now();
        let bare = normalize(
            &fields(&[("title", "t"), ("content", "b")]),
            ContentKind::Media,
            "U1",
            now,
        )
        .expect("valid media");
        assert_eq!(
            keys(&project(&bare, mapping_for(bare.kind))),
            vec!["post_type", "title", "published_date"]
        );

        let with_media = normalize(
            &fields(&[
                ("title", "t"),
                ("content", "b"),
                ("media_url", "https://cdn.example.com/a.jpg"),
                ("media_alt", "a photo"),
            ]),
            ContentKind::Media,
            "U1",
            now,
        )
        .expect("valid media");
        let entries = project(&with_media, mapping_for(with_media.kind));
        assert_eq!(
            keys(&entries),
            vec!["post_type", "title", "published_date", "media_url", "media_alt"]
        );
    }

    #[test]
    fn every_kind_projects_its_required_fields_and_nothing_unexpected() {
        let now = Utc::now();
        for kind in [
            ContentKind::Note,
            ContentKind::Response,
            ContentKind::Bookmark,
            ContentKind::Media,
        ] {
            let record = normalize(
                &fields(&[("title", "t"), ("content", "b"), ("target_url", "https://example.com")]),
                kind,
                "U1",
                now,
            )
            .expect("valid record");

            let mapping = mapping_for(kind);
            let entries = project(&record, mapping);
            let emitted = keys(&entries);
            for required in mapping.required_fields {
                assert!(emitted.contains(required), "{kind} missing {required}");
            }
            for key in &emitted {
                let optional = ["tags", "media_url", "media_alt"].contains(key);
                assert!(
                    mapping.required_fields.contains(key) || optional,
                    "{kind} emitted unexpected key {key}"
                );
            }
        }
    }
}
