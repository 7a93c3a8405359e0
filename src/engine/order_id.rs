//! Order identifier resolution: labeled merchant references in priority order.
//!
//! The provider's own message id is never used here — message ids differ per
//! message even for the same logical order, which defeats deduplication.

use regex::Regex;

/// First labeled pattern that matches anywhere in the body wins; the result
/// is uppercased. Returns None when nothing matches.
pub fn resolve_order_id(patterns: &[Regex], body: &str) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(body) {
            if let Some(m) = caps.get(1) {
                let id = m.as_str().trim();
                if !id.is_empty() {
                    return Some(id.to_uppercase());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::resolve_order_id;
    use crate::engine::rules::EngineRules;

    #[test]
    fn labeled_order_id_wins_over_bare_hash_token() {
        let rules = EngineRules::builtin();
        let body = "Ref #XYZ999 ... Order ID: ABC123 ... thanks";
        assert_eq!(
            resolve_order_id(&rules.order_id, body).as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn result_is_uppercased() {
        let rules = EngineRules::builtin();
        let body = "order id: flp-88219";
        assert_eq!(
            resolve_order_id(&rules.order_id, body).as_deref(),
            Some("FLP-88219")
        );
    }

    #[test]
    fn upi_reference_needs_at_least_ten_digits() {
        let rules = EngineRules::builtin();
        assert_eq!(
            resolve_order_id(&rules.order_id, "UPI Ref No: 123456789012").as_deref(),
            Some("123456789012")
        );
        assert!(resolve_order_id(&rules.order_id, "UPI Ref No: 12345").is_none());
    }

    #[test]
    fn pnr_is_resolved() {
        let rules = EngineRules::builtin();
        assert_eq!(
            resolve_order_id(&rules.order_id, "Your PNR: 4521789640 for the journey").as_deref(),
            Some("4521789640")
        );
    }

    #[test]
    fn bare_hash_token_is_the_last_resort() {
        let rules = EngineRules::builtin();
        assert_eq!(
            resolve_order_id(&rules.order_id, "Receipt #INV2026X ready").as_deref(),
            Some("INV2026X")
        );
    }

    #[test]
    fn body_without_reference_yields_none() {
        let rules = EngineRules::builtin();
        assert!(resolve_order_id(&rules.order_id, "no identifiers in here").is_none());
    }
}
