//! Scoring classifier: three independent weighted-pattern accumulators.

use serde::Serialize;

use crate::db::models::TxnType;
use crate::engine::rules::{ScoringRules, WeightedPattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub txn_type: TxnType,
    pub score: i32,
}

fn score_list(patterns: &[WeightedPattern], text: &str) -> i32 {
    // Every applicable pattern contributes; this is a sum, not first-match.
    patterns
        .iter()
        .filter(|p| p.pattern.is_match(text))
        .map(|p| p.weight)
        .sum()
}

/// Classify a message from its subject and normalized body, or None when no
/// accumulator clears its threshold.
///
/// Credit events are checked first: refunds and cashbacks are rarer and
/// easily confused with the dominant expense signal, so they must both clear
/// the higher credit threshold and beat the expense score. When refund and
/// cashback tie above the threshold, neither wins and the message stays
/// unclassified.
pub fn classify(rules: &ScoringRules, subject: &str, body: &str) -> Option<Classification> {
    let expense_score =
        score_list(&rules.expense_subject, subject) + score_list(&rules.expense_body, body);
    let refund_score =
        score_list(&rules.refund_subject, subject) + score_list(&rules.refund_body, body);
    let cashback_score =
        score_list(&rules.cashback_subject, subject) + score_list(&rules.cashback_body, body);

    if refund_score >= rules.credit_threshold
        && refund_score >= cashback_score
        && refund_score > expense_score
    {
        return Some(Classification {
            txn_type: TxnType::Refund,
            score: refund_score,
        });
    }

    if cashback_score >= rules.credit_threshold && cashback_score > expense_score {
        return Some(Classification {
            txn_type: TxnType::Cashback,
            score: cashback_score,
        });
    }

    if expense_score >= rules.expense_threshold {
        return Some(Classification {
            txn_type: TxnType::Expense,
            score: expense_score,
        });
    }

    None
}
