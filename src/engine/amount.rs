//! Amount resolution: pick the currency amount that best represents the
//! transaction value, by proximity to type-specific anchor phrases.

use crate::db::models::TxnType;
use crate::engine::rules::AnchorRules;

const MIN_AMOUNT: f64 = 1.0;
const MAX_AMOUNT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy)]
struct FoundAmount {
    value: f64,
    offset: usize,
}

/// Resolve the transaction amount from a normalized body, or None when no
/// plausible currency amount exists.
///
/// Expenses take the maximum of the candidate pool (the grand total dominates
/// itemized lines); credit events take the minimum (conservative — avoids an
/// unrelated larger total mentioned nearby). The pool is every amount within
/// the anchor window of any anchor occurrence; when no anchor pools anything,
/// the same rule runs over all amounts in the body.
pub fn resolve_amount(anchors: &AnchorRules, body: &str, txn_type: TxnType) -> Option<f64> {
    let all_amounts: Vec<FoundAmount> = anchors
        .currency
        .captures_iter(body)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let value: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
            Some(FoundAmount {
                value,
                offset: m.start(),
            })
        })
        .filter(|a| a.value >= MIN_AMOUNT && a.value <= MAX_AMOUNT)
        .collect();

    if all_amounts.is_empty() {
        return None;
    }

    let anchor_offsets: Vec<usize> = anchors
        .for_type(txn_type)
        .find_iter(body)
        .map(|m| m.start())
        .collect();

    if !anchor_offsets.is_empty() {
        let nearby: Vec<f64> = anchor_offsets
            .iter()
            .flat_map(|&anchor| {
                all_amounts.iter().filter_map(move |amt| {
                    let distance = amt.offset.abs_diff(anchor);
                    (distance <= anchors.window).then_some(amt.value)
                })
            })
            .collect();
        if !nearby.is_empty() {
            return Some(pick(&nearby, txn_type));
        }
    }

    let values: Vec<f64> = all_amounts.iter().map(|a| a.value).collect();
    Some(pick(&values, txn_type))
}

fn pick(values: &[f64], txn_type: TxnType) -> f64 {
    if txn_type.is_credit() {
        values.iter().copied().fold(f64::MAX, f64::min)
    } else {
        values.iter().copied().fold(f64::MIN, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_amount;
    use crate::db::models::TxnType;
    use crate::engine::rules::AnchorRules;

    #[test]
    fn expense_picks_anchored_total_over_item_lines() {
        let anchors = AnchorRules::builtin();
        let body = "Paneer Roll ₹120 Fries ₹80 Delivery ₹30 Order Total: ₹230 Order ID: Z-1";
        let amount = resolve_amount(&anchors, body, TxnType::Expense).expect("amount");
        assert!((amount - 230.0).abs() < f64::EPSILON);
    }

    #[test]
    fn refund_picks_minimum_near_anchor() {
        let anchors = AnchorRules::builtin();
        let body = "Refund of ₹250 processed against your order worth ₹1,800.";
        let amount = resolve_amount(&anchors, body, TxnType::Refund).expect("amount");
        assert!((amount - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn falls_back_to_all_amounts_when_no_anchor_matches() {
        let anchors = AnchorRules::builtin();
        let body = "₹99 and ₹450 appear with no anchor phrase anywhere";
        let amount = resolve_amount(&anchors, body, TxnType::Expense).expect("amount");
        assert!((amount - 450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn amounts_outside_bounds_are_discarded() {
        let anchors = AnchorRules::builtin();
        // 0.5 is below the floor, 2,500,000 above the ceiling.
        let body = "Total: ₹0.5 then ₹2,500,000 and nothing else";
        assert!(resolve_amount(&anchors, body, TxnType::Expense).is_none());
    }

    #[test]
    fn body_without_currency_yields_none() {
        let anchors = AnchorRules::builtin();
        assert!(resolve_amount(&anchors, "no money mentioned here", TxnType::Expense).is_none());
    }

    #[test]
    fn thousands_separators_are_parsed() {
        let anchors = AnchorRules::builtin();
        let body = "Grand Total: ₹1,24,999";
        let amount = resolve_amount(&anchors, body, TxnType::Expense).expect("amount");
        assert!((amount - 124_999.0).abs() < f64::EPSILON);
    }
}
