//! Blob upload metadata (RFC 8620, Section 6).

use serde::Deserialize;

use crate::id::Id;

/// The server's record of an uploaded blob.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Upload {
    /// Account the blob was uploaded into.
    pub account_id: Id,
    /// Server-assigned blob id.
    pub blob_id: Id,
    /// MIME type the server recorded.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Blob size in bytes.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_record() {
        let upload: Upload = serde_json::from_str(
            r#"{"accountId": "a1", "blobId": "b1", "type": "application/sieve", "size": 512}"#,
        )
        .unwrap();
        assert_eq!(upload.blob_id, Id::new("b1"));
        assert_eq!(upload.content_type, "application/sieve");
        assert_eq!(upload.size, 512);
    }
}
