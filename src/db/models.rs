use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rusqlite::{Result as SqlResult, Row};
use serde::{Deserialize, Serialize};

/// Direction of a financial event. Expense is money leaving the user;
/// refund and cashback are credit events (money coming back).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Expense,
    Refund,
    Cashback,
}

impl TxnType {
    pub fn is_credit(self) -> bool {
        matches!(self, Self::Refund | Self::Cashback)
    }
}

impl Display for TxnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Refund => write!(f, "refund"),
            Self::Cashback => write!(f, "cashback"),
        }
    }
}

impl FromStr for TxnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "refund" => Ok(Self::Refund),
            "cashback" => Ok(Self::Cashback),
            other => Err(format!("invalid transaction type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// SQLite rowid; None until inserted.
    pub id: Option<i64>,
    pub account_id: String,
    pub merchant: String,
    /// Resolved order id, or the provider message id when no order id was
    /// found (kept for traceability; never part of the dedupe key then).
    pub order_reference: Option<String>,
    pub amount: f64,
    /// RFC 3339 timestamp of the underlying mail.
    pub transaction_date: String,
    pub txn_type: TxnType,
    /// 64-hex-char digest enforcing uniqueness; None for manual entries.
    pub dedupe_hash: Option<String>,
    pub notes: Option<String>,
    pub is_manual: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub account_id: String,
    pub email_address: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub last_sync: Option<String>,
    pub config: Option<serde_json::Value>,
}

fn parse_json_value(raw: Option<String>) -> Option<serde_json::Value> {
    raw.and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
}

impl Transaction {
    pub fn from_row(row: &Row<'_>) -> SqlResult<Self> {
        let type_raw: String = row.get("txn_type")?;
        let txn_type = TxnType::from_str(&type_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                type_raw.len(),
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            account_id: row.get("account_id")?,
            merchant: row.get("merchant")?,
            order_reference: row.get("order_reference")?,
            amount: row.get("amount")?,
            transaction_date: row.get("transaction_date")?,
            txn_type,
            dedupe_hash: row.get("dedupe_hash")?,
            notes: row.get("notes")?,
            is_manual: row.get("is_manual")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Account {
    pub fn from_row(row: &Row<'_>) -> SqlResult<Self> {
        Ok(Self {
            account_id: row.get("account_id")?,
            email_address: row.get("email_address")?,
            display_name: row.get("display_name")?,
            enabled: row.get("enabled")?,
            last_sync: row.get("last_sync")?,
            config: parse_json_value(row.get("config")?),
        })
    }
}
