use anyhow::Result;
use regex::Regex;

use crate::license::matcher::PaidLicenseMatcher;
use crate::license::tokenizer::tokenize;
use crate::models::{Account, RawRecord};

/// Marker the directory appends to guest identities.
pub const EXTERNAL_MARKER: &str = "#EXT#";

/// Normalized `Block credential` values that mean the sign-in is blocked.
/// Mixed locale: exports come from Portuguese and English admin centers.
const BLOCKED_VALUES: [&str; 3] = ["VERDADEIRO", "TRUE", "1"];

/// `true` iff the principal name carries the guest marker (case-sensitive).
pub fn is_external(principal_name: &str) -> bool {
    principal_name.contains(EXTERNAL_MARKER)
}

/// Trim, upper-case and test against the fixed blocked-value set.
pub fn is_blocked(block_flag_raw: Option<&str>) -> bool {
    let normalized = block_flag_raw.unwrap_or("").trim().to_uppercase();
    BLOCKED_VALUES.contains(&normalized.as_str())
}

/// Derives the per-account fields from a loaded row.
pub struct AccountClassifier {
    matcher: PaidLicenseMatcher,
    unlicensed: String,
    domain_re: Regex,
}

impl AccountClassifier {
    pub fn new(matcher: PaidLicenseMatcher, unlicensed: impl Into<String>) -> Result<Self> {
        Ok(Self {
            matcher,
            unlicensed: unlicensed.into(),
            domain_re: Regex::new(r"@([\w.-]+)$")?,
        })
    }

    /// Classifier with the built-in keyword rules and sentinel.
    #[cfg(test)]
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            PaidLicenseMatcher::default(),
            crate::license::tokenizer::UNLICENSED,
        )
    }

    /// Lower-cased domain after the last `@`, or `None` when the principal
    /// name does not end in one.
    pub fn organization(&self, principal_name: &str) -> Option<String> {
        self.domain_re
            .captures(principal_name)
            .map(|caps| caps[1].to_lowercase())
    }

    pub fn classify(&self, record: &RawRecord) -> Account {
        let is_external = is_external(&record.principal_name);
        let organization = if is_external {
            None
        } else {
            self.organization(&record.principal_name)
        };

        let tokens = tokenize(record.licenses.as_deref(), &self.unlicensed);
        let paid_license_tokens = self.matcher.paid_tokens(&tokens);

        Account {
            principal_name: record.principal_name.clone(),
            display_name: record.display_name.clone(),
            raw_license_field: record.licenses.clone(),
            block_flag_raw: record.block_credential.clone(),
            is_external,
            organization,
            is_blocked: is_blocked(record.block_credential.as_deref()),
            has_paid_license: !paid_license_tokens.is_empty(),
            paid_license_tokens,
        }
    }

    pub fn classify_all(&self, records: &[RawRecord]) -> Vec<Account> {
        records.iter().map(|r| self.classify(r)).collect()
    }
}
