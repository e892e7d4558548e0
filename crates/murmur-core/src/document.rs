//! Collection document codec.

use serde_json::Value;

use crate::models::{CollectionKind, Record, Timestamp};
use crate::normalize::normalize_document;
use crate::Result;

/// Decode stored bytes into normalized records.
///
/// Content that is not UTF-8 JSON yields an empty collection so a corrupted
/// document never takes the board down; the next successful save replaces it.
pub fn decode_records(kind: CollectionKind, bytes: &[u8], now: Timestamp) -> Vec<Record> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(document) => normalize_document(kind, document, now),
        Err(error) => {
            tracing::warn!(
                "{} document is not valid JSON ({}); treating as empty",
                kind,
                error
            );
            Vec::new()
        }
    }
}

/// Encode records as the persisted pretty-printed JSON array.
pub fn encode_records(records: &[Record]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn now() -> Timestamp {
        "2024-05-01T12:00:00".parse().unwrap()
    }

    #[test]
    fn corrupted_content_decodes_to_empty() {
        assert!(decode_records(CollectionKind::Feedback, b"{not json", now()).is_empty());
        assert!(decode_records(CollectionKind::Feedback, &[0xff, 0xfe], now()).is_empty());
        assert!(decode_records(CollectionKind::Feedback, b"  \n", now()).is_empty());
    }

    #[test]
    fn encode_then_decode_keeps_records() {
        let records = vec![
            Record::new(CollectionKind::Tickets, RecordId::new(1), "first", now()),
            Record::new(CollectionKind::Tickets, RecordId::new(2), "second", now()),
        ];
        let bytes = encode_records(&records).unwrap();
        assert!(String::from_utf8(bytes.clone()).unwrap().contains("\"query\": \"first\""));
        assert_eq!(decode_records(CollectionKind::Tickets, &bytes, now()), records);
    }
}
