use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ToSql};
use serde::Serialize;
use thiserror::Error;

use self::models::{Account, Transaction, TxnType};

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("json serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("filesystem: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Config(String),
}

pub mod migrations;
pub mod models;
pub mod schema;

#[derive(Debug, Clone, Default)]
pub struct TransactionFilters {
    pub account_id: Option<String>,
    pub txn_type: Option<TxnType>,
    pub limit: usize,
}

/// Per-type totals for the summary view. Net spending is
/// expenses minus everything that came back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpendingSummary {
    pub total_expense: f64,
    pub total_refund: f64,
    pub total_cashback: f64,
    pub expense_count: i64,
    pub refund_count: i64,
    pub cashback_count: i64,
    pub net_spending: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantTotal {
    pub merchant: String,
    pub total_expense: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_accounts: i64,
    pub total_transactions: i64,
    pub transactions_by_type: Vec<TypeCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    pub txn_type: String,
    pub count: i64,
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        let mut db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.initialize()?;
        Ok(db)
    }

    pub fn initialize(&mut self) -> Result<(), DbError> {
        migrations::migrate(&self.conn)
            .map_err(|e| DbError::Config(format!("migration failed: {e}")))
    }

    pub fn default_db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir()
            .ok_or_else(|| DbError::Config("failed to determine home directory".to_string()))?;
        Ok(home.join(".spent").join("spent.db"))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert_account(&self, account: &Account) -> Result<(), DbError> {
        let config_json = account
            .config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO accounts (
                account_id, email_address, display_name, enabled, last_sync, config
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                account.account_id,
                account.email_address,
                account.display_name,
                account.enabled,
                account.last_sync,
                config_json,
            ],
        )?;

        Ok(())
    }

    pub fn get_account(&self, account_id: &str) -> Result<Option<Account>, DbError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT account_id, email_address, display_name, enabled, last_sync, config
            FROM accounts
            WHERE account_id = ?
            LIMIT 1
            "#,
        )?;

        let mut rows = stmt.query([account_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Account::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_accounts(&self) -> Result<Vec<Account>, DbError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT account_id, email_address, display_name, enabled, last_sync, config
            FROM accounts
            ORDER BY email_address ASC
            "#,
        )?;

        let accounts = stmt
            .query_map([], Account::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    pub fn remove_account(&self, account_id: &str) -> Result<usize, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM accounts WHERE account_id = ?", [account_id])?;
        Ok(deleted)
    }

    pub fn touch_last_sync(&self, account_id: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE accounts SET last_sync = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') WHERE account_id = ?",
            [account_id],
        )?;
        Ok(())
    }

    /// Atomic conditional insert keyed on the dedupe hash. Returns true when
    /// a new row was created, false when the hash already existed.
    pub fn insert_transaction_if_absent(&self, txn: &Transaction) -> Result<bool, DbError> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO transactions (
                account_id, merchant, order_reference, amount, transaction_date,
                txn_type, dedupe_hash, notes, is_manual
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                txn.account_id,
                txn.merchant,
                txn.order_reference,
                txn.amount,
                txn.transaction_date,
                txn.txn_type.to_string(),
                txn.dedupe_hash,
                txn.notes,
                txn.is_manual,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Manual entry: no dedupe hash, flagged is_manual.
    pub fn insert_manual_transaction(&self, txn: &Transaction) -> Result<i64, DbError> {
        self.conn.execute(
            r#"
            INSERT INTO transactions (
                account_id, merchant, order_reference, amount, transaction_date,
                txn_type, dedupe_hash, notes, is_manual
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, ?, true)
            "#,
            params![
                txn.account_id,
                txn.merchant,
                txn.order_reference,
                txn.amount,
                txn.transaction_date,
                txn.txn_type.to_string(),
                txn.notes,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_transactions(
        &self,
        mut filters: TransactionFilters,
    ) -> Result<Vec<Transaction>, DbError> {
        if filters.limit == 0 {
            filters.limit = 100;
        }

        let mut sql = String::from(
            r#"
            SELECT id, account_id, merchant, order_reference, amount, transaction_date,
                   txn_type, dedupe_hash, notes, is_manual, created_at
            FROM transactions
            WHERE 1 = 1
            "#,
        );
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(account_id) = filters.account_id {
            sql.push_str(" AND account_id = ?");
            params_vec.push(Box::new(account_id));
        }

        if let Some(txn_type) = filters.txn_type {
            sql.push_str(" AND txn_type = ?");
            params_vec.push(Box::new(txn_type.to_string()));
        }

        sql.push_str(" ORDER BY transaction_date DESC LIMIT ?");
        params_vec.push(Box::new(filters.limit as i64));

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|v| v.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let results = stmt
            .query_map(params_refs.as_slice(), Transaction::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(results)
    }

    pub fn delete_transaction(&self, id: i64, account_id: &str) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM transactions WHERE id = ? AND account_id = ?",
            params![id, account_id],
        )?;
        Ok(deleted)
    }

    pub fn spending_summary(&self, account_id: &str) -> Result<SpendingSummary, DbError> {
        let mut summary = self.conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN txn_type = 'expense' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN txn_type = 'refund' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN txn_type = 'cashback' THEN amount ELSE 0 END), 0),
                COUNT(CASE WHEN txn_type = 'expense' THEN 1 END),
                COUNT(CASE WHEN txn_type = 'refund' THEN 1 END),
                COUNT(CASE WHEN txn_type = 'cashback' THEN 1 END)
            FROM transactions WHERE account_id = ?
            "#,
            [account_id],
            |row| {
                Ok(SpendingSummary {
                    total_expense: row.get(0)?,
                    total_refund: row.get(1)?,
                    total_cashback: row.get(2)?,
                    expense_count: row.get(3)?,
                    refund_count: row.get(4)?,
                    cashback_count: row.get(5)?,
                    net_spending: 0.0,
                })
            },
        )?;
        summary.net_spending =
            summary.total_expense - summary.total_refund - summary.total_cashback;
        Ok(summary)
    }

    pub fn merchant_summary(
        &self,
        account_id: &str,
        limit: usize,
    ) -> Result<Vec<MerchantTotal>, DbError> {
        let limit = if limit == 0 { 10 } else { limit };
        let mut stmt = self.conn.prepare(
            r#"
            SELECT merchant, SUM(amount) AS total_expense
            FROM transactions
            WHERE account_id = ? AND txn_type = 'expense'
            GROUP BY merchant
            ORDER BY total_expense DESC
            LIMIT ?
            "#,
        )?;

        let totals = stmt
            .query_map(params![account_id, limit as i64], |row| {
                Ok(MerchantTotal {
                    merchant: row.get(0)?,
                    total_expense: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(totals)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats, DbError> {
        let total_accounts: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        let total_transactions: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT txn_type, COUNT(*) AS count FROM transactions GROUP BY txn_type ORDER BY count DESC",
        )?;
        let transactions_by_type = stmt
            .query_map([], |row| {
                Ok(TypeCount {
                    txn_type: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DatabaseStats {
            total_accounts,
            total_transactions,
            transactions_by_type,
        })
    }
}
