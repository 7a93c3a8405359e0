use std::path::PathBuf;

use spent::db::models::{Account, Transaction, TxnType};
use spent::db::{Database, TransactionFilters};
use uuid::Uuid;

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("spent-store-it-{}.db", Uuid::new_v4()))
}

fn account(id: &str, email: &str) -> Account {
    Account {
        account_id: id.to_string(),
        email_address: email.to_string(),
        display_name: Some(id.to_string()),
        enabled: true,
        last_sync: None,
        config: None,
    }
}

fn transaction(account_id: &str, merchant: &str, amount: f64, hash: &str) -> Transaction {
    Transaction {
        id: None,
        account_id: account_id.to_string(),
        merchant: merchant.to_string(),
        order_reference: Some("REF-1".to_string()),
        amount,
        transaction_date: "2026-02-01T10:00:00Z".to_string(),
        txn_type: TxnType::Expense,
        dedupe_hash: Some(hash.to_string()),
        notes: None,
        is_manual: false,
        created_at: None,
    }
}

#[test]
fn store_foundation_smoke_test() {
    let db_path = temp_db_path();
    let db = Database::open(&db_path).expect("open db");

    db.insert_account(&account("acc-a", "a@example.com"))
        .expect("insert account a");
    db.insert_account(&account("acc-b", "b@example.com"))
        .expect("insert account b");
    assert_eq!(db.list_accounts().expect("list accounts").len(), 2);

    assert!(db
        .insert_transaction_if_absent(&transaction("acc-a", "Amazon", 1200.0, &"11".repeat(32)))
        .expect("insert amazon"));
    assert!(db
        .insert_transaction_if_absent(&transaction("acc-a", "Uber", 230.0, &"22".repeat(32)))
        .expect("insert uber"));
    assert!(db
        .insert_transaction_if_absent(&transaction("acc-b", "Amazon", 999.0, &"33".repeat(32)))
        .expect("insert for other account"));

    // Listing is scoped per account.
    let acc_a_rows = db
        .list_transactions(TransactionFilters {
            account_id: Some("acc-a".to_string()),
            ..TransactionFilters::default()
        })
        .expect("list acc-a");
    assert_eq!(acc_a_rows.len(), 2);

    // Manual entry and deletion, scoped to the owning account.
    let manual = Transaction {
        dedupe_hash: None,
        is_manual: true,
        notes: Some("cash purchase".to_string()),
        ..transaction("acc-a", "Corner Bakery", 85.0, "unused")
    };
    let manual_id = db.insert_manual_transaction(&manual).expect("insert manual");
    assert_eq!(
        db.delete_transaction(manual_id, "acc-b").expect("wrong account"),
        0,
        "deletion must be scoped to the owning account"
    );
    assert_eq!(
        db.delete_transaction(manual_id, "acc-a").expect("right account"),
        1
    );

    let summary = db.spending_summary("acc-a").expect("summary");
    assert_eq!(summary.expense_count, 2);
    assert!((summary.total_expense - 1430.0).abs() < f64::EPSILON);

    let merchants = db.merchant_summary("acc-a", 10).expect("merchants");
    assert_eq!(merchants[0].merchant, "Amazon");

    let stats = db.get_stats().expect("stats");
    assert_eq!(stats.total_accounts, 2);
    assert_eq!(stats.total_transactions, 3);

    db.touch_last_sync("acc-a").expect("touch last sync");
    let refreshed = db
        .get_account("acc-a")
        .expect("get account")
        .expect("account exists");
    assert!(refreshed.last_sync.is_some());

    let _ = std::fs::remove_file(db_path);
}
