use serde::{Deserialize, Serialize};

/// One row of the user export, with its derived classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub principal_name: String,
    pub display_name: String,
    pub raw_license_field: Option<String>,
    pub block_flag_raw: Option<String>,
    pub is_external: bool,
    pub organization: Option<String>,
    pub is_blocked: bool,
    pub has_paid_license: bool,
    pub paid_license_tokens: Vec<String>,
}

impl Account {
    /// Paid tokens re-joined with `+`, as shown in the paid-license listings.
    pub fn paid_license_string(&self) -> String {
        self.paid_license_tokens.join("+")
    }
}

/// A row as it comes out of the loader, before classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    pub principal_name: String,
    pub display_name: String,
    pub licenses: Option<String>,
    pub block_credential: Option<String>,
}

/// Canonical paid-license category. Declaration order is the column order
/// of the per-organization pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LicenseCategory {
    BusinessBasic,
    BusinessStandard,
    BusinessPremium,
    PowerBIPro,
    ExchangeOnline,
    Unclassified,
}

impl LicenseCategory {
    /// Every category that can appear as a pivot column.
    pub const PAID: [LicenseCategory; 5] = [
        LicenseCategory::BusinessBasic,
        LicenseCategory::BusinessStandard,
        LicenseCategory::BusinessPremium,
        LicenseCategory::PowerBIPro,
        LicenseCategory::ExchangeOnline,
    ];

    /// Short column label used in the exported workbook.
    pub fn column_label(&self) -> &'static str {
        match self {
            LicenseCategory::BusinessBasic => "365 Basic",
            LicenseCategory::BusinessStandard => "365 Standard",
            LicenseCategory::BusinessPremium => "365 Premium",
            LicenseCategory::PowerBIPro => "Power BI Pro",
            LicenseCategory::ExchangeOnline => "Exchange Online",
            LicenseCategory::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for LicenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseCategory::BusinessBasic => write!(f, "Microsoft 365 Business Basic"),
            LicenseCategory::BusinessStandard => write!(f, "Microsoft 365 Business Standard"),
            LicenseCategory::BusinessPremium => write!(f, "Microsoft 365 Business Premium"),
            LicenseCategory::PowerBIPro => write!(f, "Power BI Pro"),
            LicenseCategory::ExchangeOnline => write!(f, "Exchange Online"),
            LicenseCategory::Unclassified => write!(f, "Unclassified"),
        }
    }
}

/// Active/blocked counts for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationSummary {
    pub organization: String,
    pub total_accounts: usize,
    pub active_count: usize,
    pub blocked_count: usize,
}

/// One line of the paid-license listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaidLicenseEntry {
    pub display_name: String,
    pub principal_name: String,
    pub paid_license_string: String,
    pub is_blocked: bool,
}

/// Per-organization category counts. `counts` is aligned with
/// [`LicensePivot::categories`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub organization: String,
    pub counts: Vec<usize>,
    pub total_with_license: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicensePivot {
    /// Categories with at least one occurrence, in pivot column order.
    pub categories: Vec<LicenseCategory>,
    pub rows: Vec<PivotRow>,
}

impl LicensePivot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything the renderers consume from one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_accounts: usize,
    pub internal_accounts: usize,
    pub selected_organizations: Vec<String>,
    pub organization_summary: Vec<OrganizationSummary>,
    pub paid_license_listing: Vec<PaidLicenseEntry>,
    pub blocked_paid_license_listing: Vec<PaidLicenseEntry>,
    pub license_category_pivot: LicensePivot,
    pub license_frequency: Vec<(LicenseCategory, usize)>,
    pub paid_users_by_organization: Vec<(String, usize)>,
    pub accounts_without_paid_license: Vec<Account>,
    pub external_accounts: Vec<Account>,
}
