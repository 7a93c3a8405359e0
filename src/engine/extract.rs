//! Content extraction: MIME payload tree to normalized plain text.
//!
//! Plain-text alternatives are preferred over HTML because they are far less
//! noisy for pattern matching. Normalization canonicalizes every way Indian
//! financial mail spells the rupee (`Rs.`, `INR`, numeric entities, a common
//! mis-encoded UTF-8 byte sequence) into `₹` so downstream patterns match a
//! single symbol.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;

use crate::mail::MailPayload;

pub struct ContentExtractor {
    style_block: Regex,
    script_block: Regex,
    tag: Regex,
    entity: Regex,
    rupee_entity: Regex,
    rs_marker: Regex,
    inr_marker: Regex,
    whitespace: Regex,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        let re = |pattern: &str| Regex::new(pattern).expect("extractor pattern must compile");
        Self {
            style_block: re(r"(?is)<style[^>]*>.*?</style>"),
            script_block: re(r"(?is)<script[^>]*>.*?</script>"),
            tag: re(r"<[^>]+>"),
            entity: re(r"(?i)&(amp|lt|gt|nbsp);"),
            rupee_entity: re(r"(?i)&#8377;|&#x20b9;"),
            rs_marker: re(r"(?i)\brs\.?\s*"),
            inr_marker: re(r"(?i)\binr\s*"),
            whitespace: re(r"\s+"),
        }
    }

    /// Walk the payload tree and return the normalized body, or an empty
    /// string when nothing decodes.
    pub fn extract(&self, payload: &MailPayload) -> String {
        let mut plains = Vec::new();
        let mut htmls = Vec::new();
        if let Some(parts) = &payload.parts {
            gather(parts, &mut plains, &mut htmls);
        }

        let mut raw = if !plains.is_empty() {
            plains.join("\n")
        } else {
            htmls.join("\n")
        };

        if raw.is_empty() {
            if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
                raw = decode_body_data(data).unwrap_or_default();
            }
        }

        if raw.is_empty() {
            return String::new();
        }

        self.normalize(&raw)
    }

    pub fn normalize(&self, raw: &str) -> String {
        let text = self.style_block.replace_all(raw, " ");
        let text = self.script_block.replace_all(&text, " ");
        let text = self.tag.replace_all(&text, " ");
        let text = self
            .entity
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                match caps[1].to_ascii_lowercase().as_str() {
                    "amp" => "&",
                    "lt" => "<",
                    "gt" => ">",
                    _ => " ",
                }
            });
        let text = self.rupee_entity.replace_all(&text, "₹");
        let text = text.replace("â‚¹", "₹");
        let text = self.rs_marker.replace_all(&text, "₹");
        let text = self.inr_marker.replace_all(&text, "₹");
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().to_string()
    }
}

/// Collect text/plain and text/html leaf bodies, depth-first.
fn gather(parts: &[MailPayload], plains: &mut Vec<String>, htmls: &mut Vec<String>) {
    for part in parts {
        let mime = part.mime_type.as_deref().unwrap_or("");
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
            if let Some(decoded) = decode_body_data(data) {
                if mime.eq_ignore_ascii_case("text/plain") {
                    plains.push(decoded);
                } else if mime.eq_ignore_ascii_case("text/html") {
                    htmls.push(decoded);
                }
            }
        }
        if let Some(children) = &part.parts {
            gather(children, plains, htmls);
        }
    }
}

/// base64url decode; undecodable or non-UTF-8 parts are silently dropped.
fn decode_body_data(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::ContentExtractor;
    use crate::mail::{MailBody, MailPayload};

    fn part(mime: &str, text: &str) -> MailPayload {
        MailPayload {
            mime_type: Some(mime.to_string()),
            body: Some(MailBody {
                size: Some(text.len() as u64),
                data: Some(URL_SAFE_NO_PAD.encode(text)),
            }),
            ..MailPayload::default()
        }
    }

    fn multipart(parts: Vec<MailPayload>) -> MailPayload {
        MailPayload {
            mime_type: Some("multipart/alternative".to_string()),
            parts: Some(parts),
            ..MailPayload::default()
        }
    }

    #[test]
    fn prefers_plain_text_over_html() {
        let extractor = ContentExtractor::new();
        let payload = multipart(vec![
            part("text/html", "<p>HTML body</p>"),
            part("text/plain", "plain body"),
        ]);
        assert_eq!(extractor.extract(&payload), "plain body");
    }

    #[test]
    fn falls_back_to_html_and_strips_markup() {
        let extractor = ContentExtractor::new();
        let payload = multipart(vec![part(
            "text/html",
            "<style>.x{color:red}</style><script>alert(1)</script><div>Order Total: &#8377;499</div>",
        )]);
        assert_eq!(extractor.extract(&payload), "Order Total: ₹499");
    }

    #[test]
    fn recurses_into_nested_parts() {
        let extractor = ContentExtractor::new();
        let payload = multipart(vec![multipart(vec![part("text/plain", "nested receipt")])]);
        assert_eq!(extractor.extract(&payload), "nested receipt");
    }

    #[test]
    fn decodes_direct_body_when_no_parts() {
        let extractor = ContentExtractor::new();
        let payload = part("text/plain", "direct body ₹100");
        assert_eq!(extractor.extract(&payload), "direct body ₹100");
    }

    #[test]
    fn empty_payload_yields_empty_string() {
        let extractor = ContentExtractor::new();
        assert_eq!(extractor.extract(&MailPayload::default()), "");
    }

    #[test]
    fn canonicalizes_currency_markers() {
        let extractor = ContentExtractor::new();
        assert_eq!(extractor.normalize("You paid Rs. 1,499 today"), "You paid ₹1,499 today");
        assert_eq!(extractor.normalize("Amount: INR 250"), "Amount: ₹250");
        assert_eq!(extractor.normalize("Total &#x20B9; 99"), "Total ₹ 99");
        assert_eq!(extractor.normalize("paid â‚¹350 via UPI"), "paid ₹350 via UPI");
    }

    #[test]
    fn decodes_basic_entities_and_collapses_whitespace() {
        let extractor = ContentExtractor::new();
        assert_eq!(
            extractor.normalize("Tom&amp;Jerry&nbsp;Store\n\n  paid &lt;now&gt;"),
            "Tom&Jerry Store paid <now>"
        );
    }
}
