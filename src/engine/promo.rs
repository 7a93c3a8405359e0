//! Promotional guard: a header pre-filter and a later body arbitration.

use crate::engine::rules::PromotionalPolicy;

/// First-tier verdicts. `Skip` is unambiguously non-financial mail (tracking,
/// OTP, onboarding); `Promo` is unambiguous marketing. Anything else proceeds
/// to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVerdict {
    Skip,
    Promo,
}

impl PromotionalPolicy {
    /// Screen subject and sender before the body is even extracted.
    /// Tier order matters: the hard-skip list wins over the promo list.
    pub fn screen_headers(&self, subject: &str, from: &str) -> Option<HeaderVerdict> {
        if self.skip_subject.iter().any(|re| re.is_match(subject)) {
            return Some(HeaderVerdict::Skip);
        }
        if self.promo_subject.iter().any(|re| re.is_match(subject)) {
            return Some(HeaderVerdict::Promo);
        }
        if self.promo_from.iter().any(|re| re.is_match(from)) {
            return Some(HeaderVerdict::Promo);
        }
        None
    }

    /// Second-stage arbitration over the extracted body: promotional only if
    /// a strong promo phrase matches and no strong transactional phrase does.
    /// A legitimate receipt that mentions an unrelated promotion survives.
    pub fn body_is_promotional(&self, body: &str) -> bool {
        self.strong_promo_body.iter().any(|re| re.is_match(body))
            && !self.strong_tx_body.iter().any(|re| re.is_match(body))
    }
}
