//! Collection export helpers.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{CollectionKind, Record, Timestamp};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Render records exactly as they are persisted.
pub fn render_json_export(records: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Render records in Markdown with a frontmatter block each.
#[must_use]
pub fn render_markdown_export(records: &[Record]) -> String {
    let mut output = String::new();

    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", record.id);
        let _ = writeln!(output, "created_at: {}", record.created_at);
        let _ = writeln!(output, "updated_at: {}", record.updated_at);
        if let Some(status) = record.status {
            let _ = writeln!(output, "status: {status}");
        }
        let _ = writeln!(output, "category: {}", record.category);
        let _ = writeln!(output, "priority: {}", record.priority);
        if !record.assigned_to.is_empty() {
            let _ = writeln!(output, "assigned_to: {}", record.assigned_to);
        }
        let _ = writeln!(
            output,
            "reactions: {{like: {}, helpful: {}, agree: {}}}",
            record.reactions.like, record.reactions.helpful, record.reactions.agree
        );
        let _ = writeln!(output, "votes: {}", record.votes);
        let _ = writeln!(output, "labels:");
        for label in &record.labels {
            let _ = writeln!(output, "  - {label}");
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        output.push_str(record.text());
        output.push('\n');

        for reply in &record.replies {
            let _ = writeln!(output);
            let _ = writeln!(output, "> **Reply ({})**: {}", reply.created_at, reply.message);
        }
        for attachment in &record.attachments {
            let _ = writeln!(
                output,
                "\n[attachment: {} ({})]",
                attachment.filename, attachment.content_type
            );
        }
    }

    output
}

/// Render records based on the selected export format.
pub fn render_records_export(
    records: &[Record],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(records),
        ExportFormat::Markdown => Ok(render_markdown_export(records)),
    }
}

/// Deterministic default file name, e.g. `murmur-tickets-20240501T120000.md`.
#[must_use]
pub fn suggested_export_file_name(
    kind: CollectionKind,
    format: ExportFormat,
    at: Timestamp,
) -> String {
    let stamp = at.to_string().replace([':', '-'], "");
    format!("murmur-{}-{stamp}.{}", kind.as_str(), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, RecordId, Reply};

    fn ts(value: &str) -> Timestamp {
        value.parse().unwrap()
    }

    #[test]
    fn render_markdown_export_includes_frontmatter_and_replies() {
        let mut record = Record::new(
            CollectionKind::Tickets,
            RecordId::new(9),
            "Heating broken in B12",
            ts("2024-05-01T08:00:00"),
        );
        record.labels = vec!["facilities".to_string()];
        record.assigned_to = "maintenance".to_string();
        record.replies.push(Reply {
            message: "Technician booked".to_string(),
            created_at: ts("2024-05-01T09:30:00"),
        });
        record.attachments.push(Attachment {
            filename: "photo.png".to_string(),
            content_base64: "iVBORw0KGgo=".to_string(),
            content_type: "image/png".to_string(),
        });

        let rendered = render_markdown_export(&[record]);
        assert!(rendered.contains("id: 9"));
        assert!(rendered.contains("created_at: 2024-05-01T08:00:00"));
        assert!(rendered.contains("status: In Process"));
        assert!(rendered.contains("assigned_to: maintenance"));
        assert!(rendered.contains("labels:\n  - facilities"));
        assert!(rendered.contains("Heating broken in B12"));
        assert!(rendered.contains("> **Reply (2024-05-01T09:30:00)**: Technician booked"));
        assert!(rendered.contains("[attachment: photo.png (image/png)]"));
    }

    #[test]
    fn feedback_markdown_has_no_status_line() {
        let record = Record::new(
            CollectionKind::Feedback,
            RecordId::new(1),
            "Love the new cafeteria menu",
            ts("2024-05-01T08:00:00"),
        );
        let rendered = render_markdown_export(&[record]);
        assert!(!rendered.contains("status:"));
        assert!(!rendered.contains("assigned_to:"));
    }

    #[test]
    fn json_export_matches_persisted_shape() {
        let record = Record::new(
            CollectionKind::Feedback,
            RecordId::new(1),
            "hi",
            ts("2024-05-01T08:00:00"),
        );
        let rendered = render_records_export(&[record], ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["message"], "hi");
        assert_eq!(value[0]["id"], 1);
    }

    #[test]
    fn suggested_export_file_name_uses_kind_and_extension() {
        let at = ts("2024-05-01T12:00:00");
        assert_eq!(
            suggested_export_file_name(CollectionKind::Feedback, ExportFormat::Json, at),
            "murmur-feedback-20240501T120000.json"
        );
        assert_eq!(
            suggested_export_file_name(CollectionKind::Tickets, ExportFormat::Markdown, at),
            "murmur-tickets-20240501T120000.md"
        );
    }
}
