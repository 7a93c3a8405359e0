//! The import engine: discovers candidate messages, drives each through the
//! guard/classify/resolve pipeline, and offers the survivors to the store.
//!
//! Defined exactly once; every caller (the CLI sync command or embedding
//! code) goes through [`ImportEngine::run`].

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, warn};

pub mod amount;
pub mod classify;
pub mod dedupe;
pub mod extract;
pub mod merchant;
pub mod order_id;
pub mod promo;
pub mod rules;

pub use classify::Classification;
pub use extract::ContentExtractor;
pub use promo::HeaderVerdict;
pub use rules::EngineRules;

use crate::db::models::{Account, Transaction, TxnType};
use crate::db::Database;
use crate::mail::{MailMessage, MailProvider};

pub struct ImportEngine {
    rules: EngineRules,
    extractor: ContentExtractor,
}

/// One successfully stored transaction, echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ImportedTransaction {
    pub merchant: String,
    pub amount: f64,
    pub txn_type: TxnType,
    pub order_reference: String,
}

/// Structured result of one import run. Recovered per-query and per-message
/// failures land in `errors`; only total connectivity/auth failure aborts
/// the run itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: Vec<ImportedTransaction>,
    pub duplicates: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

/// Guard exits that mean "no financial signal here". Not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NonFinancialSubject,
    EmptyBody,
    Unclassified,
    NoAmount,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinancialSubject => write!(f, "non-financial subject"),
            Self::EmptyBody => write!(f, "empty body"),
            Self::Unclassified => write!(f, "unclassified"),
            Self::NoAmount => write!(f, "no amount"),
        }
    }
}

/// Guard exits that mean "this is marketing". Not errors either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    PromotionalHeaders,
    PromotionalBody,
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PromotionalHeaders => write!(f, "promotional subject/sender"),
            Self::PromotionalBody => write!(f, "promotional body"),
        }
    }
}

/// A fully resolved, not-yet-persisted transaction derived from one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub merchant: String,
    pub amount: f64,
    pub txn_type: TxnType,
    pub score: i32,
    pub order_id: Option<String>,
    pub date: DateTime<Utc>,
}

/// Outcome of the pure per-message pipeline, before any store interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Candidate(Candidate),
    Skipped(SkipReason),
    Rejected(RejectReason),
}

impl Default for ImportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportEngine {
    pub fn new() -> Self {
        Self::with_rules(EngineRules::builtin())
    }

    pub fn with_rules(rules: EngineRules) -> Self {
        Self {
            rules,
            extractor: ContentExtractor::new(),
        }
    }

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    /// Run one bounded import batch for an account: discover message ids via
    /// the fixed query battery, merge them, then pipeline each message and
    /// insert the survivors. Query and message failures are recovered
    /// locally; the run continues.
    pub async fn run(
        &self,
        mail: &dyn MailProvider,
        db: &Database,
        account: &Account,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        let message_ids = self.discover(mail, &mut summary).await;
        debug!(
            account = %account.account_id,
            candidates = message_ids.len(),
            "discovery complete"
        );

        for message_id in &message_ids {
            let message = match mail.fetch(message_id).await {
                Ok(message) => message,
                Err(error) => {
                    warn!("fetch {message_id} failed: {error:#}");
                    summary.errors.push(format!("message {message_id}: {error}"));
                    continue;
                }
            };

            self.process(db, account, &message, &mut summary);
        }

        db.touch_last_sync(&account.account_id)?;
        Ok(summary)
    }

    /// Run every search query, merging returned ids into an insertion-ordered
    /// set — the same message often satisfies several queries.
    async fn discover(&self, mail: &dyn MailProvider, summary: &mut ImportSummary) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut message_ids = Vec::new();

        for query in &self.rules.queries {
            match mail.search(query.q).await {
                Ok(ids) => {
                    for id in ids {
                        if seen.insert(id.clone()) {
                            message_ids.push(id);
                        }
                    }
                }
                Err(error) => {
                    warn!("search query '{}' failed: {error:#}", query.q);
                    summary.errors.push(format!("query '{}': {error}", query.q));
                }
            }
        }

        message_ids
    }

    fn process(
        &self,
        db: &Database,
        account: &Account,
        message: &MailMessage,
        summary: &mut ImportSummary,
    ) {
        match self.evaluate(message) {
            Evaluation::Skipped(reason) => {
                debug!(id = %message.id, %reason, "message skipped");
                summary.skipped += 1;
            }
            Evaluation::Rejected(reason) => {
                debug!(id = %message.id, %reason, "message rejected");
                summary.rejected += 1;
            }
            Evaluation::Candidate(candidate) => {
                let key = dedupe::build_dedupe_key(
                    &account.account_id,
                    candidate.txn_type,
                    candidate.order_id.as_deref(),
                    &candidate.merchant,
                    candidate.amount,
                    &candidate.date,
                    &message.id,
                );

                let txn = Transaction {
                    id: None,
                    account_id: account.account_id.clone(),
                    merchant: candidate.merchant.clone(),
                    order_reference: Some(key.order_reference.clone()),
                    amount: candidate.amount,
                    transaction_date: candidate.date.to_rfc3339(),
                    txn_type: candidate.txn_type,
                    dedupe_hash: Some(key.hash),
                    notes: None,
                    is_manual: false,
                    created_at: None,
                };

                match db.insert_transaction_if_absent(&txn) {
                    Ok(true) => {
                        debug!(
                            id = %message.id,
                            merchant = %candidate.merchant,
                            amount = candidate.amount,
                            txn_type = %candidate.txn_type,
                            "transaction imported"
                        );
                        summary.imported.push(ImportedTransaction {
                            merchant: candidate.merchant,
                            amount: candidate.amount,
                            txn_type: candidate.txn_type,
                            order_reference: key.order_reference,
                        });
                    }
                    Ok(false) => {
                        debug!(id = %message.id, "duplicate transaction");
                        summary.duplicates += 1;
                    }
                    Err(error) => {
                        warn!("store insert for {} failed: {error:#}", message.id);
                        summary
                            .errors
                            .push(format!("message {}: {error}", message.id));
                    }
                }
            }
        }
    }

    /// The pure per-message pipeline: header screen, body extraction, body
    /// arbitration, classification, amount resolution. No store interaction.
    pub fn evaluate(&self, message: &MailMessage) -> Evaluation {
        let subject = message.subject();
        let from = message.from();

        if let Some(verdict) = self.rules.promo.screen_headers(subject, from) {
            return match verdict {
                HeaderVerdict::Skip => Evaluation::Skipped(SkipReason::NonFinancialSubject),
                HeaderVerdict::Promo => Evaluation::Rejected(RejectReason::PromotionalHeaders),
            };
        }

        let body = self.extractor.extract(&message.payload);
        if body.is_empty() {
            return Evaluation::Skipped(SkipReason::EmptyBody);
        }

        if self.rules.promo.body_is_promotional(&body) {
            return Evaluation::Rejected(RejectReason::PromotionalBody);
        }

        let Some(classification) = classify::classify(&self.rules.scoring, subject, &body) else {
            return Evaluation::Skipped(SkipReason::Unclassified);
        };

        let Some(amount) =
            amount::resolve_amount(&self.rules.anchors, &body, classification.txn_type)
        else {
            return Evaluation::Skipped(SkipReason::NoAmount);
        };

        Evaluation::Candidate(Candidate {
            merchant: merchant::resolve_merchant(&self.rules.merchant, from),
            amount,
            txn_type: classification.txn_type,
            score: classification.score,
            order_id: order_id::resolve_order_id(&self.rules.order_id, &body),
            date: message_date(message),
        })
    }
}

/// Transaction timestamp: the Date header when parseable, else the provider's
/// internal epoch-millis date, else now.
fn message_date(message: &MailMessage) -> DateTime<Utc> {
    if let Some(raw) = message.header("Date") {
        if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
            return parsed.with_timezone(&Utc);
        }
    }

    message
        .internal_date
        .as_deref()
        .and_then(|ms| ms.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
}
