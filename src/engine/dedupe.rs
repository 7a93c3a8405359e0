//! Dedup key construction: a stable identity hash so repeated imports never
//! duplicate a transaction.

use chrono::{DateTime, Utc};
use ring::digest::{digest, SHA256};

use crate::db::models::TxnType;

/// The digest that keys the store's uniqueness constraint, plus the value to
/// persist as the order reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeKey {
    pub hash: String,
    pub order_reference: String,
}

/// With a resolved order id the key is `{account}_{orderId}_{type}`, which
/// collapses the confirmation/invoice/receipt mails of one order into a
/// single row. Without one it is `{account}_{merchant}_{day}_{amount}_{type}`;
/// the provider message id is stored for traceability but kept out of the
/// key, so re-syncing the identical mail can never mint a new row.
pub fn build_dedupe_key(
    account_id: &str,
    txn_type: TxnType,
    order_id: Option<&str>,
    merchant: &str,
    amount: f64,
    date: &DateTime<Utc>,
    message_id: &str,
) -> DedupeKey {
    let (key, order_reference) = match order_id {
        Some(order_id) => (
            format!("{account_id}_{order_id}_{txn_type}"),
            order_id.to_string(),
        ),
        None => {
            let day = date.format("%Y-%m-%d");
            (
                format!("{account_id}_{merchant}_{day}_{amount}_{txn_type}"),
                message_id.to_string(),
            )
        }
    };

    DedupeKey {
        hash: hex_encode(digest(&SHA256, key.as_bytes()).as_ref()),
        order_reference,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::build_dedupe_key;
    use crate::db::models::TxnType;

    #[test]
    fn order_id_key_ignores_message_id() {
        let date = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
        let first = build_dedupe_key(
            "acc-1",
            TxnType::Expense,
            Some("FLP-88219"),
            "Flipkart",
            499.0,
            &date,
            "msg-aaa",
        );
        let second = build_dedupe_key(
            "acc-1",
            TxnType::Expense,
            Some("FLP-88219"),
            "Flipkart",
            499.0,
            &date,
            "msg-bbb",
        );
        assert_eq!(first.hash, second.hash);
        assert_eq!(first.order_reference, "FLP-88219");
    }

    #[test]
    fn fallback_key_is_stable_for_identical_inputs() {
        let date = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
        let first = build_dedupe_key(
            "acc-1", TxnType::Expense, None, "Swiggy", 349.0, &date, "msg-aaa",
        );
        let second = build_dedupe_key(
            "acc-1", TxnType::Expense, None, "Swiggy", 349.0, &date, "msg-bbb",
        );
        // Same merchant/day/amount: same hash even across differing message ids.
        assert_eq!(first.hash, second.hash);
        // The reference keeps the message id for traceability only.
        assert_eq!(first.order_reference, "msg-aaa");
        assert_eq!(second.order_reference, "msg-bbb");
    }

    #[test]
    fn fallback_key_distinguishes_merchants_on_the_same_day() {
        let date = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
        let swiggy = build_dedupe_key(
            "acc-1", TxnType::Expense, None, "Swiggy", 349.0, &date, "m-1",
        );
        let zomato = build_dedupe_key(
            "acc-1", TxnType::Expense, None, "Zomato", 349.0, &date, "m-2",
        );
        assert_ne!(swiggy.hash, zomato.hash);
    }

    #[test]
    fn type_is_part_of_the_identity() {
        let date = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
        let expense = build_dedupe_key(
            "acc-1",
            TxnType::Expense,
            Some("AB-1234"),
            "Amazon",
            999.0,
            &date,
            "m-1",
        );
        let refund = build_dedupe_key(
            "acc-1",
            TxnType::Refund,
            Some("AB-1234"),
            "Amazon",
            999.0,
            &date,
            "m-1",
        );
        assert_ne!(expense.hash, refund.hash);
    }

    #[test]
    fn hash_is_64_hex_chars() {
        let date = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let key = build_dedupe_key("a", TxnType::Cashback, None, "M", 10.0, &date, "m");
        assert_eq!(key.hash.len(), 64);
        assert!(key.hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
