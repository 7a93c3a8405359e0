//! Rule tables for the import engine: promotional screens, weighted scoring
//! patterns, amount anchors, order-id patterns, the known-merchant map, and
//! the Gmail search catalogue. Everything here is data compiled once at
//! start-up and injected into the engine; the matching loops live next door.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::db::models::TxnType;

pub const EXPENSE_THRESHOLD: i32 = 5;
pub const CREDIT_THRESHOLD: i32 = 7;

/// Characters either side of an anchor phrase searched for currency amounts.
pub const ANCHOR_WINDOW: usize = 300;

#[derive(Debug)]
pub struct WeightedPattern {
    pub pattern: Regex,
    pub weight: i32,
}

/// Two ordered pattern lists (subject, body) per accumulator, plus the
/// thresholds the decision rule applies. Weights may be negative: a phrase
/// that cancels a false signal subtracts from that accumulator.
#[derive(Debug)]
pub struct ScoringRules {
    pub expense_subject: Vec<WeightedPattern>,
    pub expense_body: Vec<WeightedPattern>,
    pub refund_subject: Vec<WeightedPattern>,
    pub refund_body: Vec<WeightedPattern>,
    pub cashback_subject: Vec<WeightedPattern>,
    pub cashback_body: Vec<WeightedPattern>,
    pub expense_threshold: i32,
    pub credit_threshold: i32,
}

/// Two-tier header screen plus the body arbitration lists. Both header tiers
/// are deliberately narrow: a false skip/promo match permanently loses a
/// transaction, so ambiguous subjects fall through to scoring instead.
#[derive(Debug)]
pub struct PromotionalPolicy {
    pub skip_subject: Vec<Regex>,
    pub promo_subject: Vec<Regex>,
    pub promo_from: Vec<Regex>,
    pub strong_promo_body: Vec<Regex>,
    pub strong_tx_body: Vec<Regex>,
}

/// Anchor phrases per transaction type and the canonical currency pattern.
#[derive(Debug)]
pub struct AnchorRules {
    pub currency: Regex,
    pub expense: Regex,
    pub refund: Regex,
    pub cashback: Regex,
    pub window: usize,
}

impl AnchorRules {
    pub fn for_type(&self, txn_type: TxnType) -> &Regex {
        match txn_type {
            TxnType::Expense => &self.expense,
            TxnType::Refund => &self.refund,
            TxnType::Cashback => &self.cashback,
        }
    }
}

#[derive(Debug)]
pub struct MerchantRules {
    pub display_name: Regex,
    pub role_suffix: Regex,
    pub domain: Regex,
    pub generic_subdomain: Regex,
    pub tlds: HashSet<&'static str>,
    pub known: HashMap<&'static str, &'static str>,
}

/// One provider search query with the signal it targets.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery {
    pub target: TxnType,
    pub q: &'static str,
}

#[derive(Debug)]
pub struct EngineRules {
    pub promo: PromotionalPolicy,
    pub scoring: ScoringRules,
    pub anchors: AnchorRules,
    pub order_id: Vec<Regex>,
    pub merchant: MerchantRules,
    pub queries: Vec<SearchQuery>,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in rule pattern must compile")
}

fn wp(pattern: &str, weight: i32) -> WeightedPattern {
    WeightedPattern {
        pattern: re(pattern),
        weight,
    }
}

impl EngineRules {
    /// The built-in rule set, tuned on Indian consumer mail (₹ notation).
    pub fn builtin() -> Self {
        Self {
            promo: PromotionalPolicy::builtin(),
            scoring: ScoringRules::builtin(),
            anchors: AnchorRules::builtin(),
            order_id: order_id_patterns(),
            merchant: MerchantRules::builtin(),
            queries: search_queries(),
        }
    }
}

impl PromotionalPolicy {
    pub fn builtin() -> Self {
        Self {
            // Unambiguously non-financial subjects: tracking, OTP, onboarding,
            // surveys. Keep this list tight — false positives here cause
            // missing transactions.
            skip_subject: vec![
                re(r"(?i)\b(shipped|dispatched|out for delivery|arriving|on its way)\b"),
                re(r"(?i)\b(password reset|verify your email|otp|security code|two.factor)\b"),
                re(r"(?i)\b(welcome to|confirm your email|activate your account|email verification)\b"),
                re(r"(?i)\b(survey|rate your experience|how was your (order|ride|experience))\b"),
                re(r"(?i)\b(track your order|shipment update|delivery update|package update)\b"),
            ],
            promo_subject: vec![
                re(r"(?i)\bup to\s*\d+%\s*(off|discount|cashback)\b"),
                re(r"(?i)\bearn\b.{0,20}\bcashback\b.{0,30}\b(next|every|when)\b"),
                re(r"(?i)\bget\b.{0,15}\b\d+%\s*(off|discount)\b"),
                re(r"(?i)\b(mega|big|flash|end of season)\s*sale\b"),
                re(r"(?i)\b(last chance|don.?t miss|ends tonight|ends today)\b"),
                re(r"(?i)\buse code\s+[A-Z0-9]{3,}\b"),
                re(r"(?i)\b(new arrival|just launched|back in stock)\b"),
                re(r"(?i)\b(referral bonus|refer a friend|invite friends)\b"),
                re(r"(?i)\bnewsletter\b|\bunsubscribe\b"),
            ],
            promo_from: vec![
                re(r"(?i)\b(offers?|deals?|newsletter|marketing|campaign|promotions?)\b[^@]*@"),
                re(r"(?i)@[^>]*\b(offers?|deals?|newsletter|marketing|campaign)\b"),
            ],
            // Body arbitration: reject only when a strong promo phrase fires
            // and no strong transactional phrase does, so a receipt that
            // mentions an unrelated promotion survives.
            strong_promo_body: vec![
                re(r"(?i)earn\s*(?:up to\s*)?₹\s*[\d,]+\s*cashback\s*on\s*(your\s*next|every)"),
                re(r"(?i)get\s*(?:up to\s*)?₹\s*[\d,]+\s*(cashback|off|discount)\s*on\s*(your\s*next|every)"),
                re(r"(?i)use\s*code\s+[A-Z0-9]{3,}\s+to\s+(?:get|avail)"),
            ],
            strong_tx_body: vec![
                re(r"(?i)payment\s*(?:of\s*)?₹\s*[\d,]+\s*(?:successful|confirmed|received|debited)"),
                re(r"(?i)₹\s*[\d,]+\s*(?:was|has been)\s*debited"),
                re(r"(?i)your\s*(?:order|booking)\b.{0,30}\b(?:confirmed|placed)"),
                re(r"(?i)refund\s*(?:of\s*)?₹\s*[\d,]+\s*(?:has been|will be)\s*(?:processed|credited)"),
                re(r"(?i)cashback\s*of\s*₹\s*[\d,]+\s*(?:has been|is)\s*(?:credited|added)"),
            ],
        }
    }
}

impl ScoringRules {
    pub fn builtin() -> Self {
        Self {
            expense_subject: vec![
                wp(r"(?i)\border\b.{0,15}\b(confirmed|placed|successful|received)\b", 8),
                wp(r"(?i)\bpayment\b.{0,15}\b(confirmed|successful|received|done|complete)\b", 8),
                wp(r"(?i)\b(purchase|booking)\b.{0,15}\b(confirmed|successful|placed)\b", 8),
                wp(r"(?i)\bthank you for (your )?(order|purchase|payment|shopping)\b", 8),
                wp(r"(?i)\binvoice\b.{0,20}\b(for|from|generated|attached)\b", 7),
                wp(r"(?i)\b(receipt|bill)\b.{0,15}\b(for|from|generated)\b", 7),
                wp(r"(?i)\bpurchase\s*confirmation\b", 9),
                wp(r"(?i)\bticket.{0,10}(confirmed|booked|booking confirmed)\b", 8),
                wp(r"(?i)\bbooking.{0,10}confirmed\b", 8),
                wp(r"(?i)\bamount\s*debited\b", 9),
                wp(r"(?i)\bpayment\s*debited\b", 9),
                wp(r"(?i)\btransaction\b.{0,15}\b(successful|confirmed|complete)\b", 7),
                wp(r"(?i)\bsubscription\b.{0,20}\b(confirmed|activated|renewed|started)\b", 7),
                wp(r"(?i)\b(order|trip|ride|purchase)\s*(receipt|summary|details|invoice)\b", 8),
                wp(r"(?i)\bconfirmed[!.]?\s*$", 5),
                wp(r"(?i)\byour\b.{0,20}\border\b.{0,30}\bfrom\b", 8),
                wp(r"(?i)\byour\b.{0,30}\border\s*$", 6),
                wp(r"(?i)^order\b.{0,5}\bfrom\b", 6),
                wp(r"(?i)\bdebit\s*(alert|notification|intimation)\b", 8),
                wp(r"(?i)\ba/c\b.{0,30}\bdebited\b", 9),
                wp(r"(?i)\baccount\b.{0,20}\bdebited\b", 9),
                wp(r"(?i)\btxn\b.{0,20}\b(of|for)\b.{0,10}(inr|rs)", 8),
                wp(r"(?i)\b(inr|rs\.?)\s*[\d,]+.{0,20}\bdebited\b", 9),
            ],
            expense_body: vec![
                wp(r"(?i)payment\s*(?:of\s*)?₹\s*[\d,]+\s*(?:was|has been|is)\s*(?:successful|confirmed|received|processed)", 10),
                wp(r"(?i)₹\s*[\d,]+\s*(?:was|has been)\s*debited", 10),
                wp(r"(?i)amount\s*(?:of\s*)?₹\s*[\d,]+\s*(?:debited|charged|paid)", 10),
                wp(r"(?i)(?:order|grand|invoice)\s*total\s*[:\-]?\s*₹\s*[\d,]+", 9),
                wp(r"(?i)total\s*(?:amount\s*)?(?:paid|charged|billed)\s*[:\-]?\s*₹\s*[\d,]+", 9),
                wp(r"(?i)total\s*paid\s*[-:\s]\s*₹\s*[\d,]+", 10),
                wp(r"(?i)amount\s*[:\-]\s*₹\s*[\d,]+", 7),
                wp(r"(?i)you\s*(?:have\s*)?(?:paid|spent)\s*₹\s*[\d,]+", 8),
                wp(r"(?i)charged\s*(?:to\s*your)?.{0,30}₹\s*[\d,]+", 8),
                wp(r"(?i)thank you for (your )?(order|purchase|payment|shopping)", 7),
                wp(r"(?i)your\s*(?:order|booking|purchase)\b.{0,30}\b(?:confirmed|placed|successful)", 7),
                wp(r"(?i)(?:order|booking)\s*(?:id|no|number|#)\s*[:\-]?\s*[A-Z0-9]", 5),
                wp(r"(?i)invoice\s*(?:no|number|#)?.{0,20}₹\s*[\d,]+", 7),
                wp(r"(?i)billed\s*(?:amount\s*)?[:\-]?\s*₹\s*[\d,]+", 8),
                wp(r"(?i)total\s*[:\-]?\s*₹\s*[\d,]+", 7),
                wp(r"(?i)₹\s*[\d,]+\s*(?:only|paid|total)", 6),
                wp(r"(?i)thank you for ordering from", 7),
                wp(r"(?i)(?:debited|deducted)\s*(?:from\s*(?:your\s*)?(?:a/c|account))?.{0,30}₹\s*[\d,]+", 9),
                wp(r"(?i)₹\s*[\d,]+\s*(?:debited|deducted)\s*from", 9),
                // Credit-event phrases cancel the expense signal.
                wp(r"(?i)refund(?:ed)?\s*(?:of\s*)?₹", -10),
                wp(r"(?i)has been refunded|refund processed|refund initiated", -10),
                wp(r"(?i)credited back to your", -8),
                wp(r"(?i)cashback\s*(?:of\s*)?₹.{0,20}(?:credited|added)", -8),
            ],
            refund_subject: vec![
                wp(r"(?i)\brefund(ed)?\b", 5),
                wp(r"(?i)\bmoney.?back\b", 5),
                wp(r"(?i)\brefund\b.{0,20}\b(processed|initiated|successful)\b", 8),
                wp(r"(?i)\bamount\b.{0,15}\b(refunded|credited back)\b", 8),
                wp(r"(?i)\b(order|booking)\b.{0,10}\bcancell(ed|ation)\b", 4),
                wp(r"(?i)\breturn\b.{0,15}\b(processed|accepted|approved)\b", 7),
                wp(r"(?i)\bcancellation\b.{0,15}\b(confirmed|successful)\b", 6),
                wp(r"(?i)\bcredit.?note\b", 6),
                wp(r"(?i)\breimburse(ment|d)?\b", 6),
                wp(r"(?i)\breversal\b", 5),
            ],
            refund_body: vec![
                wp(r"(?i)refund of\s*₹\s*[\d,]+", 10),
                wp(r"(?i)₹\s*[\d,]+\s*(?:has been|will be)\s*refunded", 10),
                wp(r"(?i)refund\s*(?:of\s*)?₹\s*[\d,]+\s*(?:has been|is)\s*(?:processed|initiated|credited)", 10),
                wp(r"(?i)your refund (?:of|for|amounting)", 9),
                wp(r"(?i)we.?ve (processed|initiated) (your )?refund", 9),
                wp(r"(?i)refund\s*(?:has been\s*)?successfully\s*(processed|initiated|credited)", 9),
                wp(r"(?i)amount.{0,20}refunded.{0,30}(?:bank|account|wallet|upi)", 8),
                wp(r"(?i)credited back to your\s*(?:bank|account|card|wallet)", 8),
                wp(r"(?i)will be (?:credited|refunded).{0,40}(?:\d+.?\d*)\s*(?:working|business)?\s*days", 8),
                wp(r"(?i)return.{0,30}refund.{0,30}₹", 7),
                wp(r"(?i)cancell(?:ed|ation).{0,40}₹.{0,40}refund", 7),
                wp(r"(?i)refund.{0,30}(?:neft|imps|upi|wallet)", 7),
                wp(r"(?i)your order.{0,30}cancell", 4),
                // The original purchase quoted inline must not look like a refund.
                wp(r"(?i)payment (?:successful|confirmed|received)", -8),
                wp(r"(?i)order (?:placed|confirmed|received)", -8),
                wp(r"(?i)thank you for your (?:purchase|payment|order)", -7),
                wp(r"(?i)₹\s*[\d,]+\s*(?:was|has been)\s*debited", -10),
                wp(r"(?i)amount debited", -9),
            ],
            cashback_subject: vec![
                wp(r"(?i)\bcashback\b.{0,15}\b(credited|added|received)\b", 8),
                wp(r"(?i)\bcash back\b.{0,15}\b(credited|added)\b", 8),
                wp(r"(?i)\breward(s)?\b.{0,15}\b(credited|added|earned)\b", 7),
                wp(r"(?i)\bsupercoins?\b.{0,15}\b(added|credited)\b", 8),
                wp(r"(?i)\bwallet\b.{0,10}\bcredit\b", 6),
                wp(r"(?i)\bpoints?\b.{0,15}\b(credited|added)\b", 6),
            ],
            cashback_body: vec![
                wp(r"(?i)cashback of\s*₹\s*[\d,]+.{0,20}(?:credited|added)", 10),
                wp(r"(?i)₹\s*[\d,]+\s*cashback\s*(?:has been|is)\s*(?:credited|added)", 10),
                wp(r"(?i)we.?ve added\s*₹\s*[\d,]+.{0,20}(?:cashback|reward)", 9),
                wp(r"(?i)your (cashback|reward|supercoins?).{0,30}₹\s*[\d,]+.{0,20}(?:credited|added)", 9),
                wp(r"(?i)₹\s*[\d,]+\s*(?:supercoins?|coins?|points?).{0,20}(?:credited|added)", 8),
                wp(r"(?i)cashback.{0,30}credited.{0,20}(?:wallet|account|paytm|phonepe|gpay)", 8),
                wp(r"(?i)you.?ve earned\s*₹\s*[\d,]+\s*cashback", 9),
                // Future-tense cashback is marketing, not a credit event.
                wp(r"(?i)earn.*cashback.*next|cashback on your next", -8),
                wp(r"(?i)up to\s*₹\s*[\d,]+\s*cashback", -7),
                wp(r"(?i)payment (?:successful|confirmed)", -6),
            ],
            expense_threshold: EXPENSE_THRESHOLD,
            credit_threshold: CREDIT_THRESHOLD,
        }
    }
}

impl AnchorRules {
    pub fn builtin() -> Self {
        Self {
            currency: re(r"₹\s*([\d,]+\.?\d*)"),
            expense: re(
                r"(?i)total\s*paid|(?:order|grand|invoice|bill)?\s*total|amount\s*(?:paid|charged|billed|debited)|you\s*(?:paid|spent)|payment\s*(?:of|amount)|grand\s*total",
            ),
            refund: re(
                r"(?i)refund(?:ed)?(?:\s+of)?|credited back|has been credited|will be credited|reversal|reimburs",
            ),
            cashback: re(
                r"(?i)cashback(?:\s+of)?|cash back(?:\s+of)?|coins?\s*(?:added|credited)|reward(?:s)?\s*credited",
            ),
            window: ANCHOR_WINDOW,
        }
    }
}

/// Labeled-reference patterns in priority order; the bare `#token` fallback
/// comes last and is deliberately case-sensitive.
fn order_id_patterns() -> Vec<Regex> {
    vec![
        re(r"(?i)\b(?:order|booking)\s*(?:id|no\.?|number|#)\s*[:\-#]?\s*([A-Z0-9_/-]{5,30})"),
        re(r"(?i)\binvoice\s*(?:id|no\.?|number|#)\s*[:\-]?\s*([A-Z0-9_/-]{5,30})"),
        re(r"(?i)\btransaction\s*(?:id|no\.?|number|#)\s*[:\-]?\s*([A-Z0-9_/-]{6,30})"),
        re(r"(?i)\brefund\s*(?:id|no\.?|number|#)\s*[:\-]?\s*([A-Z0-9_/-]{5,30})"),
        re(r"(?i)\breference\s*(?:id|no\.?|number|#)?\s*[:\-]?\s*([A-Z0-9_-]{6,30})"),
        re(r"(?i)\bpnr\s*[:\-]?\s*([A-Z0-9]{6,15})"),
        re(r"(?i)\bupi\s*ref\s*(?:no\.?)?\s*[:\-]?\s*(\d{10,})"),
        re(r"#([A-Z0-9_-]{6,30})\b"),
    ]
}

impl MerchantRules {
    pub fn builtin() -> Self {
        Self {
            display_name: re(r#"^"?([^"<]{2,50}?)"?\s*<"#),
            role_suffix: re(
                r"(?i)\s*(support|team|no.?reply|noreply|notifications?|alerts?|orders?|info|help|care|service|billing|invoice|payments?|customer)\s*$",
            ),
            domain: re(r"@([\w.-]+)"),
            generic_subdomain: re(
                r"(?i)^(mail|mailer|email|info|support|noreply|no-reply|notifications?|orders?|payments?|alerts?|team|accounts?|customer|do-not-reply|billing|transact|connect)\.",
            ),
            tlds: HashSet::from([
                "com", "co", "in", "net", "org", "io", "app", "ai", "biz", "gov", "edu",
            ]),
            known: HashMap::from([
                ("amazon", "Amazon"),
                ("flipkart", "Flipkart"),
                ("myntra", "Myntra"),
                ("ajio", "AJIO"),
                ("nykaa", "Nykaa"),
                ("meesho", "Meesho"),
                ("snapdeal", "Snapdeal"),
                ("tatacliq", "Tata CLiQ"),
                ("swiggy", "Swiggy"),
                ("zomato", "Zomato"),
                ("blinkit", "Blinkit"),
                ("zepto", "Zepto"),
                ("bigbasket", "BigBasket"),
                ("dunzo", "Dunzo"),
                ("instamart", "Instamart"),
                ("paytm", "Paytm"),
                ("phonepe", "PhonePe"),
                ("gpay", "Google Pay"),
                ("razorpay", "Razorpay"),
                ("cashfree", "Cashfree"),
                ("juspay", "Juspay"),
                ("makemytrip", "MakeMyTrip"),
                ("goibibo", "Goibibo"),
                ("cleartrip", "Cleartrip"),
                ("easemytrip", "EaseMyTrip"),
                ("redbus", "redBus"),
                ("indigo", "IndiGo"),
                ("airindia", "Air India"),
                ("airtel", "Airtel"),
                ("jio", "Jio"),
                ("vodafone", "Vodafone Vi"),
                ("bsnl", "BSNL"),
                ("irctc", "IRCTC"),
                ("ola", "Ola"),
                ("uber", "Uber"),
                ("rapido", "Rapido"),
                ("cred", "CRED"),
                ("slice", "Slice"),
                ("simpl", "Simpl"),
                ("lazypay", "LazyPay"),
                ("hdfc", "HDFC Bank"),
                ("icici", "ICICI Bank"),
                ("sbi", "SBI"),
                ("axis", "Axis Bank"),
                ("kotak", "Kotak Bank"),
                ("idfcfirst", "IDFC First"),
                ("payu", "PayU"),
                ("netflix", "Netflix"),
                ("spotify", "Spotify"),
                ("hotstar", "Hotstar"),
                ("bookmyshow", "BookMyShow"),
                ("swipe", "Swipe"),
                ("ixigo", "ixigo"),
            ]),
        }
    }
}

/// Fixed discovery battery. The same message commonly satisfies several
/// queries; the orchestrator merges ids before fetching.
fn search_queries() -> Vec<SearchQuery> {
    use TxnType::{Cashback, Expense, Refund};

    vec![
        SearchQuery { target: Expense, q: "subject:(confirmed) subject:(order OR booking OR payment OR purchase)" },
        SearchQuery { target: Expense, q: r#"subject:("payment successful" OR "payment confirmed" OR "payment received")"# },
        SearchQuery { target: Expense, q: r#"subject:("amount debited" OR "payment debited" OR "transaction successful")"# },
        SearchQuery { target: Expense, q: "subject:(invoice OR receipt) (₹ OR rs OR inr OR rupee)" },
        SearchQuery { target: Expense, q: r#"subject:("thank you for your order" OR "purchase confirmation" OR "order placed")"# },
        SearchQuery { target: Expense, q: r#"subject:("ticket confirmed" OR "booking confirmed" OR "trip receipt")"# },
        SearchQuery { target: Expense, q: r#"subject:("subscription confirmed" OR "subscription renewed" OR "membership")"# },
        SearchQuery { target: Expense, q: r#"subject:("your order from") from:(zomato.com OR swiggy.com)"# },
        SearchQuery { target: Expense, q: r#"subject:("your zomato order" OR "your swiggy order" OR "your blinkit order")"# },
        SearchQuery { target: Expense, q: r#"subject:("your order") from:(zomato.com OR swiggy.com OR blinkit.com OR zepto.in OR bigbasket.com)"# },
        SearchQuery { target: Expense, q: r#"subject:("debit alert" OR "debited" OR "debit intimation")"# },
        SearchQuery { target: Expense, q: r#"subject:(txn OR transaction) (debited OR inr OR "a/c")"# },
        SearchQuery { target: Refund, q: r#"subject:(refund OR refunded OR "refund processed" OR "refund initiated")"# },
        SearchQuery { target: Refund, q: r#"subject:("money back" OR "cancellation confirmed" OR "order cancelled" OR "return processed")"# },
        SearchQuery { target: Refund, q: r#"subject:("amount credited" OR "amount refunded" OR "credit note" OR reversal)"# },
        SearchQuery { target: Refund, q: r#""your refund" (processed OR initiated OR credited)"# },
        SearchQuery { target: Cashback, q: r#"subject:("cashback credited" OR "cashback added" OR "cash back credited")"# },
        SearchQuery { target: Cashback, q: r#"subject:("reward credited" OR "supercoins added" OR "wallet credit" OR "points credited")"# },
    ]
}
