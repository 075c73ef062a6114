use tracing::warn;

use crate::config::KeywordRule;
use crate::models::LicenseCategory;

/// Decides which license tokens denote a paid license.
///
/// Matching is case-insensitive substring containment of a rule keyword
/// inside the token, so SKU prefixes and suffixes (`"Microsoft 365 Business
/// Basic (no Teams)"`) still match. Rules are evaluated in order and the
/// first hit wins.
#[derive(Debug, Clone)]
pub struct PaidLicenseMatcher {
    rules: Vec<(String, LicenseCategory)>,
}

impl PaidLicenseMatcher {
    /// Build a matcher from an ordered rule list. Keywords are lower-cased once here.
    /// Rules mapping to [`LicenseCategory::Unclassified`] are dropped, so
    /// `is_paid(t)` holds exactly when `classify(t)` is a paid category.
    pub fn new(rules: &[KeywordRule]) -> Self {
        let rules = rules
            .iter()
            .filter(|r| !r.keyword.trim().is_empty())
            .filter(|r| {
                if r.category == LicenseCategory::Unclassified {
                    warn!(keyword = %r.keyword, "ignoring keyword rule mapped to Unclassified");
                    return false;
                }
                true
            })
            .map(|r| (r.keyword.to_lowercase(), r.category))
            .collect();
        Self { rules }
    }

    /// `true` if any keyword occurs anywhere inside `token`.
    pub fn is_paid(&self, token: &str) -> bool {
        self.matching_rule(token).is_some()
    }

    /// Category of the first matching keyword, or [`LicenseCategory::Unclassified`].
    pub fn classify(&self, token: &str) -> LicenseCategory {
        self.matching_rule(token)
            .unwrap_or(LicenseCategory::Unclassified)
    }

    /// Keep only the tokens that satisfy [`is_paid`](Self::is_paid), in order.
    pub fn paid_tokens(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .filter(|t| self.is_paid(t))
            .cloned()
            .collect()
    }

    fn matching_rule(&self, token: &str) -> Option<LicenseCategory> {
        let lower = token.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| lower.contains(keyword.as_str()))
            .map(|(_, category)| *category)
    }
}

impl Default for PaidLicenseMatcher {
    fn default() -> Self {
        Self::new(&crate::config::default_keywords())
    }
}
