//! Merchant resolution: derive a display-worthy counterparty name from the
//! sender header, preferring the human display name over the domain.

use crate::engine::rules::MerchantRules;

pub const UNKNOWN_MERCHANT: &str = "Unknown";

pub fn resolve_merchant(rules: &MerchantRules, from: &str) -> String {
    // Path 1: a display name before the angle address, with trailing role
    // words (support, no-reply, billing, ...) stripped.
    if let Some(caps) = rules.display_name.captures(from) {
        let name = caps[1].trim();
        let name = rules.role_suffix.replace(name, "").trim().to_string();

        let key: String = name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if let Some(canonical) = rules.known.get(key.as_str()) {
            return (*canonical).to_string();
        }
        let len = name.chars().count();
        if (2..=40).contains(&len) {
            return name;
        }
    }

    // Path 2: the sender domain, minus generic subdomain labels and TLDs.
    let Some(caps) = rules.domain.captures(from) else {
        return UNKNOWN_MERCHANT.to_string();
    };
    let domain = caps[1].to_lowercase();
    let domain = rules.generic_subdomain.replace(&domain, "");

    let raw = domain
        .split('.')
        .find(|label| !rules.tlds.contains(label))
        .or_else(|| domain.split('.').next())
        .unwrap_or("");

    if raw.is_empty() {
        return UNKNOWN_MERCHANT.to_string();
    }

    match rules.known.get(raw) {
        Some(canonical) => (*canonical).to_string(),
        None => title_case(raw),
    }
}

fn title_case(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_merchant, UNKNOWN_MERCHANT};
    use crate::engine::rules::MerchantRules;

    #[test]
    fn display_name_maps_to_canonical_merchant() {
        let rules = MerchantRules::builtin();
        assert_eq!(
            resolve_merchant(&rules, "\"Zomato\" <no-reply@zomato.com>"),
            "Zomato"
        );
    }

    #[test]
    fn role_suffix_is_stripped_before_lookup() {
        let rules = MerchantRules::builtin();
        assert_eq!(
            resolve_merchant(&rules, "Swiggy Orders <orders@swiggy.in>"),
            "Swiggy"
        );
    }

    #[test]
    fn unknown_display_name_is_returned_verbatim() {
        let rules = MerchantRules::builtin();
        assert_eq!(
            resolve_merchant(&rules, "Corner Bakery <hi@cornerbakery.in>"),
            "Corner Bakery"
        );
    }

    #[test]
    fn bare_address_falls_back_to_domain() {
        let rules = MerchantRules::builtin();
        assert_eq!(resolve_merchant(&rules, "receipts@myntra.com"), "Myntra");
    }

    #[test]
    fn generic_subdomain_and_tld_labels_are_dropped() {
        let rules = MerchantRules::builtin();
        assert_eq!(
            resolve_merchant(&rules, "noreply@mail.bluebird.co.in"),
            "Bluebird"
        );
    }

    #[test]
    fn unparseable_sender_is_unknown() {
        let rules = MerchantRules::builtin();
        assert_eq!(
            resolve_merchant(&rules, "undisclosed recipients"),
            UNKNOWN_MERCHANT
        );
    }

    #[test]
    fn unknown_domain_is_title_cased() {
        let rules = MerchantRules::builtin();
        assert_eq!(resolve_merchant(&rules, "billing@chaipoint.com"), "Chaipoint");
    }
}
