use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

pub mod gmail_api;

pub use gmail_api::GmailProvider;

/// Read-only mail access: discover message ids by query, fetch full messages.
/// Implementations own pagination, auth, and transport retries; callers treat
/// every method as independently fallible.
#[async_trait(?Send)]
pub trait MailProvider {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<String>>;

    async fn fetch(&self, message_id: &str) -> Result<MailMessage>;
}

/// A fetched message: provider id, header list, MIME payload tree.
#[derive(Debug, Clone, Deserialize)]
pub struct MailMessage {
    pub id: String,
    #[serde(rename = "internalDate")]
    pub internal_date: Option<String>,
    pub payload: MailPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailPayload {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub headers: Option<Vec<MailHeader>>,
    pub body: Option<MailBody>,
    pub parts: Option<Vec<MailPayload>>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailBody {
    pub size: Option<u64>,
    /// base64url-encoded content, no padding.
    pub data: Option<String>,
}

impl MailMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn subject(&self) -> &str {
        self.header("Subject").unwrap_or("")
    }

    pub fn from(&self) -> &str {
        self.header("From").unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::{MailHeader, MailMessage, MailPayload};

    fn message_with_headers(headers: Vec<MailHeader>) -> MailMessage {
        MailMessage {
            id: "m-1".to_string(),
            internal_date: None,
            payload: MailPayload {
                headers: Some(headers),
                ..MailPayload::default()
            },
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let msg = message_with_headers(vec![MailHeader {
            name: "SUBJECT".to_string(),
            value: "Order confirmed".to_string(),
        }]);
        assert_eq!(msg.subject(), "Order confirmed");
        assert_eq!(msg.header("subject"), Some("Order confirmed"));
    }

    #[test]
    fn missing_headers_default_to_empty() {
        let msg = message_with_headers(vec![]);
        assert_eq!(msg.subject(), "");
        assert_eq!(msg.from(), "");
    }

    #[test]
    fn deserializes_gmail_shape() {
        let raw = r#"{
            "id": "abc",
            "internalDate": "1700000000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [{"name": "From", "value": "x@y.com"}],
                "parts": [{"mimeType": "text/plain", "body": {"size": 4, "data": "dGVzdA"}}]
            }
        }"#;
        let msg: MailMessage = serde_json::from_str(raw).expect("deserialize message");
        assert_eq!(msg.id, "abc");
        assert_eq!(msg.from(), "x@y.com");
        let parts = msg.payload.parts.expect("parts");
        assert_eq!(parts[0].mime_type.as_deref(), Some("text/plain"));
    }
}
