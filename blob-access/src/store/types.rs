use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upload state of a blob. Moves from `Pending` to `Confirmed` once, outside this crate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlobStatus {
    Pending,
    Confirmed,
}

/// Metadata stored for every blob.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlobRecord {
    pub blob_id: String,
    pub account_id: String,
    pub size: i64,
    pub content_type: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker. A deleted blob is never served again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub status: BlobStatus,
    #[serde(default)]
    pub multipart: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

impl BlobRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// One uploaded part of a multipart upload, as reported by the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    pub part_number: i32,
    #[serde(alias = "etag")]
    pub e_tag: String,
}

/// Key under which a blob record is stored.
pub fn blob_key(account_id: &str, blob_id: &str) -> String {
    format!("ACCOUNT#{}#BLOB#{}", account_id, blob_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_wire_format() {
        let value = json!({
            "blobId": "abc123",
            "accountId": "acct-1",
            "size": 2048,
            "contentType": "application/pdf",
            "storageKey": "acct-1/abc123",
            "createdAt": "2026-01-01T00:00:00Z",
            "status": "pending",
            "multipart": true,
            "uploadId": "up-1"
        });
        let record: BlobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.status, BlobStatus::Pending);
        assert_eq!(record.upload_id.as_deref(), Some("up-1"));
        assert!(!record.is_deleted());
    }

    #[test]
    fn test_part_wire_format() {
        let part: CompletedPart = serde_json::from_value(json!({"partNumber": 3, "eTag": "\"e3\""})).unwrap();
        assert_eq!(part, CompletedPart { part_number: 3, e_tag: "\"e3\"".to_string() });
    }
}
