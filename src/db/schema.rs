use anyhow::Result;
use rusqlite::Connection;

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            account_id TEXT PRIMARY KEY,
            email_address TEXT NOT NULL,
            display_name TEXT,
            enabled BOOLEAN NOT NULL DEFAULT true,
            last_sync TEXT,
            config TEXT
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id TEXT NOT NULL REFERENCES accounts(account_id),
            merchant TEXT NOT NULL,
            order_reference TEXT,
            amount REAL NOT NULL CHECK(amount > 0),
            transaction_date TEXT NOT NULL,
            txn_type TEXT NOT NULL CHECK(txn_type IN ('expense', 'refund', 'cashback')),
            dedupe_hash TEXT UNIQUE,
            notes TEXT,
            is_manual BOOLEAN NOT NULL DEFAULT false,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_account_id ON transactions(account_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
        CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(txn_type);
        CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(merchant);
        "#,
    )?;

    Ok(())
}
