pub mod json;
pub mod table;

use anyhow::Result;

use crate::db::models::{Account, Transaction};
use crate::db::{DatabaseStats, MerchantTotal, SpendingSummary};
use crate::engine::ImportSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Table
        }
    }
}

pub fn format_import_summary(format: OutputFormat, summary: &ImportSummary) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_import_summary(summary)),
        OutputFormat::Json => json::format_import_summary(summary),
    }
}

pub fn format_transactions(format: OutputFormat, transactions: &[Transaction]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_transactions(transactions)),
        OutputFormat::Json => json::format_transactions(transactions),
    }
}

pub fn format_summary(format: OutputFormat, summary: &SpendingSummary) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_summary(summary)),
        OutputFormat::Json => json::format_summary(summary),
    }
}

pub fn format_merchants(format: OutputFormat, merchants: &[MerchantTotal]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_merchants(merchants)),
        OutputFormat::Json => json::format_merchants(merchants),
    }
}

pub fn format_accounts(format: OutputFormat, accounts: &[Account]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_accounts(accounts)),
        OutputFormat::Json => json::format_accounts(accounts),
    }
}

pub fn format_stats(format: OutputFormat, stats: &DatabaseStats) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_stats(stats)),
        OutputFormat::Json => json::format_stats(stats),
    }
}
