use anyhow::Result;

use crate::db::models::{Account, Transaction};
use crate::db::{DatabaseStats, MerchantTotal, SpendingSummary};
use crate::engine::ImportSummary;

pub fn format_import_summary(summary: &ImportSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn format_transactions(transactions: &[Transaction]) -> Result<String> {
    Ok(serde_json::to_string_pretty(transactions)?)
}

pub fn format_summary(summary: &SpendingSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn format_merchants(merchants: &[MerchantTotal]) -> Result<String> {
    Ok(serde_json::to_string_pretty(merchants)?)
}

pub fn format_accounts(accounts: &[Account]) -> Result<String> {
    Ok(serde_json::to_string_pretty(accounts)?)
}

pub fn format_stats(stats: &DatabaseStats) -> Result<String> {
    Ok(serde_json::to_string_pretty(stats)?)
}
