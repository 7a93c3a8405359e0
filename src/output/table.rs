use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::db::models::{Account, Transaction};
use crate::db::{DatabaseStats, MerchantTotal, SpendingSummary};
use crate::engine::ImportSummary;

const DATE_WIDTH: usize = 12;
const TYPE_WIDTH: usize = 8;
const MERCHANT_WIDTH: usize = 24;
const AMOUNT_WIDTH: usize = 12;
const REFERENCE_WIDTH: usize = 22;

pub fn format_import_summary(summary: &ImportSummary) -> String {
    let mut out = String::new();
    out.push_str("Import complete\n");
    out.push_str(&format!("Imported:   {}\n", summary.imported_count()));
    out.push_str(&format!("Duplicates: {}\n", summary.duplicates));
    out.push_str(&format!("Skipped:    {}\n", summary.skipped));
    out.push_str(&format!("Rejected:   {}\n", summary.rejected));

    if !summary.imported.is_empty() {
        out.push('\n');
        for item in &summary.imported {
            out.push_str(&format!(
                "+ {} ₹{} | {} ({})\n",
                item.txn_type, item.amount, item.merchant, item.order_reference
            ));
        }
    }

    if !summary.errors.is_empty() {
        out.push('\n');
        out.push_str(&format!("Errors: {}\n", summary.errors.len()));
        for error in &summary.errors {
            out.push_str(&format!("- {error}\n"));
        }
    }

    out
}

pub fn format_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<date$}  {:<kind$}  {:<merchant$}  {:>amount$}  {:<reference$}\n",
        "Date",
        "Type",
        "Merchant",
        "Amount",
        "Reference",
        date = DATE_WIDTH,
        kind = TYPE_WIDTH,
        merchant = MERCHANT_WIDTH,
        amount = AMOUNT_WIDTH,
        reference = REFERENCE_WIDTH
    ));
    out.push_str(&format!(
        "{}  {}  {}  {}  {}\n",
        "-".repeat(DATE_WIDTH),
        "-".repeat(TYPE_WIDTH),
        "-".repeat(MERCHANT_WIDTH),
        "-".repeat(AMOUNT_WIDTH),
        "-".repeat(REFERENCE_WIDTH)
    ));

    for txn in transactions {
        let date = truncate_for_width(&short_date(&txn.transaction_date), DATE_WIDTH);
        let merchant = truncate_for_width(&txn.merchant, MERCHANT_WIDTH);
        let reference = truncate_for_width(
            txn.order_reference.as_deref().unwrap_or("-"),
            REFERENCE_WIDTH,
        );
        let amount = format!("₹{:.2}", txn.amount);

        out.push_str(&format!(
            "{:<date$}  {:<kind$}  {:<merchant$}  {:>amount$}  {:<reference$}\n",
            date,
            txn.txn_type.to_string(),
            merchant,
            amount,
            reference,
            date = DATE_WIDTH,
            kind = TYPE_WIDTH,
            merchant = MERCHANT_WIDTH,
            amount = AMOUNT_WIDTH,
            reference = REFERENCE_WIDTH
        ));
    }

    out
}

pub fn format_summary(summary: &SpendingSummary) -> String {
    let mut out = String::new();
    out.push_str("Spending Summary\n");
    out.push_str("================\n");
    out.push_str(&format!(
        "Expenses:  ₹{:.2} ({} transactions)\n",
        summary.total_expense, summary.expense_count
    ));
    out.push_str(&format!(
        "Refunds:   ₹{:.2} ({} transactions)\n",
        summary.total_refund, summary.refund_count
    ));
    out.push_str(&format!(
        "Cashback:  ₹{:.2} ({} transactions)\n",
        summary.total_cashback, summary.cashback_count
    ));
    out.push_str(&format!("Net spend: ₹{:.2}\n", summary.net_spending));
    out
}

pub fn format_merchants(merchants: &[MerchantTotal]) -> String {
    if merchants.is_empty() {
        return "No expense transactions yet.".to_string();
    }

    let mut out = String::new();
    out.push_str("Merchant                    Total Spent\n");
    out.push_str("--------------------------  ------------\n");
    for row in merchants {
        out.push_str(&format!(
            "{:<26}  {:>12}\n",
            truncate_for_width(&row.merchant, 26),
            format!("₹{:.2}", row.total_expense)
        ));
    }
    out
}

pub fn format_accounts(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "No accounts configured.".to_string();
    }

    let mut out = String::new();
    out.push_str("Accounts\n");
    out.push_str("========\n");
    for account in accounts {
        out.push_str(&format!(
            "{}  {}  enabled={}  last_sync={}\n",
            account.account_id,
            account.email_address,
            account.enabled,
            account.last_sync.as_deref().unwrap_or("never")
        ));
    }
    out
}

pub fn format_stats(stats: &DatabaseStats) -> String {
    let mut out = String::new();
    out.push_str("spent Stats\n");
    out.push_str("===========\n");
    out.push_str(&format!("Accounts:     {}\n", stats.total_accounts));
    out.push_str(&format!("Transactions: {}\n", stats.total_transactions));

    if !stats.transactions_by_type.is_empty() {
        out.push('\n');
        out.push_str("Transactions by type\n");
        out.push_str("--------------------\n");
        for row in &stats.transactions_by_type {
            out.push_str(&format!("{:<12} {:>8}\n", row.txn_type, row.count));
        }
    }

    out
}

fn short_date(input: &str) -> String {
    match DateTime::parse_from_rfc3339(input) {
        Ok(value) => value.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        Err(_) => input.to_string(),
    }
}

fn truncate_for_width(value: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(value) <= max_width {
        return value.to_string();
    }

    if max_width <= 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    let mut width = 0usize;
    for c in value.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use crate::db::models::{Transaction, TxnType};
    use crate::engine::{ImportSummary, ImportedTransaction};

    use super::{format_import_summary, format_transactions};

    fn sample_transaction() -> Transaction {
        Transaction {
            id: Some(1),
            account_id: "acc-1".to_string(),
            merchant: "A merchant with an extremely long display name".to_string(),
            order_reference: Some("ORD-1".to_string()),
            amount: 499.0,
            transaction_date: "2026-02-01T09:30:00Z".to_string(),
            txn_type: TxnType::Expense,
            dedupe_hash: Some("cd".repeat(32)),
            notes: None,
            is_manual: false,
            created_at: None,
        }
    }

    #[test]
    fn transactions_table_has_headers_and_truncates() {
        let rendered = format_transactions(&[sample_transaction()]);
        assert!(rendered.contains("Merchant"));
        assert!(rendered.contains("2026-02-01"));
        assert!(rendered.contains('…'), "long merchant must be truncated");
    }

    #[test]
    fn import_summary_lists_counts_and_rows() {
        let summary = ImportSummary {
            imported: vec![ImportedTransaction {
                merchant: "Swiggy".to_string(),
                amount: 349.0,
                txn_type: TxnType::Expense,
                order_reference: "SWG-1".to_string(),
            }],
            duplicates: 2,
            skipped: 3,
            rejected: 1,
            errors: vec![],
        };
        let rendered = format_import_summary(&summary);
        assert!(rendered.contains("Imported:   1"));
        assert!(rendered.contains("Duplicates: 2"));
        assert!(rendered.contains("Swiggy"));
    }

    #[test]
    fn empty_list_has_friendly_message() {
        assert_eq!(format_transactions(&[]), "No transactions found.");
    }
}
