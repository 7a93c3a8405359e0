//! spent: imports purchase, refund, and cashback emails from Gmail into a
//! local transaction ledger. The library exposes the import engine, the mail
//! provider abstraction, and the SQLite-backed store; the `spent` binary is a
//! thin CLI over them.

pub mod db;
pub mod engine;
pub mod mail;
pub mod output;
