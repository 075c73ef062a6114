//! Group-by and pivot passes over classified accounts.
//!
//! Every function here is a pure function of its inputs. Grouping goes through
//! `BTreeMap`/`BTreeSet`, so rows come out sorted by key and repeated runs over
//! the same accounts produce identical output.

use std::collections::{BTreeMap, BTreeSet};

use crate::license::matcher::PaidLicenseMatcher;
use crate::models::{
    Account, LicenseCategory, LicensePivot, OrganizationSummary, PaidLicenseEntry, PivotRow,
    Report,
};

/// Organization and category filters applied to the listing views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub organizations: BTreeSet<String>,
    pub categories: BTreeSet<LicenseCategory>,
}

impl Selection {
    /// Every organization present in `accounts` and every paid category.
    pub fn all(accounts: &[Account]) -> Self {
        Self {
            organizations: available_organizations(accounts).into_iter().collect(),
            categories: LicenseCategory::PAID.into_iter().collect(),
        }
    }
}

fn internal(accounts: &[Account]) -> impl Iterator<Item = (&Account, &str)> {
    accounts
        .iter()
        .filter(|a| !a.is_external)
        .filter_map(|a| a.organization.as_deref().map(|org| (a, org)))
}

fn selected<'a>(
    accounts: &'a [Account],
    organizations: &'a BTreeSet<String>,
) -> impl Iterator<Item = &'a Account> {
    internal(accounts)
        .filter(move |(_, org)| organizations.contains(*org))
        .map(|(a, _)| a)
}

/// Sorted, de-duplicated organizations of internal accounts.
pub fn available_organizations(accounts: &[Account]) -> Vec<String> {
    internal(accounts)
        .map(|(_, org)| org.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Total, active and blocked internal accounts per organization.
pub fn organization_summary(accounts: &[Account]) -> Vec<OrganizationSummary> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (account, org) in internal(accounts) {
        let entry = groups.entry(org).or_insert((0, 0));
        entry.0 += 1;
        if account.is_blocked {
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(org, (total, blocked))| OrganizationSummary {
            organization: org.to_string(),
            total_accounts: total,
            active_count: total - blocked,
            blocked_count: blocked,
        })
        .collect()
}

/// Accounts with a paid license in the selected organizations, by display name.
pub fn paid_license_listing(
    accounts: &[Account],
    organizations: &BTreeSet<String>,
) -> Vec<PaidLicenseEntry> {
    let mut entries: Vec<PaidLicenseEntry> = selected(accounts, organizations)
        .filter(|a| a.has_paid_license)
        .map(|a| PaidLicenseEntry {
            display_name: a.display_name.clone(),
            principal_name: a.principal_name.clone(),
            paid_license_string: a.paid_license_string(),
            is_blocked: a.is_blocked,
        })
        .collect();

    entries.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.principal_name.cmp(&b.principal_name))
    });
    entries
}

/// [`paid_license_listing`] restricted to blocked accounts.
pub fn blocked_paid_license_listing(
    accounts: &[Account],
    organizations: &BTreeSet<String>,
) -> Vec<PaidLicenseEntry> {
    paid_license_listing(accounts, organizations)
        .into_iter()
        .filter(|e| e.is_blocked)
        .collect()
}

/// Paid-token counts per organization and category, one row per organization.
///
/// Covers every internal account regardless of the current selection.
/// Categories that never occur are left out of the column set.
pub fn license_category_pivot(accounts: &[Account], matcher: &PaidLicenseMatcher) -> LicensePivot {
    let mut cells: BTreeMap<&str, BTreeMap<LicenseCategory, usize>> = BTreeMap::new();
    let mut seen: BTreeSet<LicenseCategory> = BTreeSet::new();

    for (account, org) in internal(accounts).filter(|(a, _)| a.has_paid_license) {
        for token in &account.paid_license_tokens {
            let category = matcher.classify(token);
            if category == LicenseCategory::Unclassified {
                continue;
            }
            *cells.entry(org).or_default().entry(category).or_insert(0) += 1;
            seen.insert(category);
        }
    }

    let categories: Vec<LicenseCategory> = LicenseCategory::PAID
        .into_iter()
        .filter(|c| seen.contains(c))
        .collect();

    let rows = cells
        .into_iter()
        .map(|(org, counts)| {
            let counts: Vec<usize> = categories
                .iter()
                .map(|c| counts.get(c).copied().unwrap_or(0))
                .collect();
            PivotRow {
                organization: org.to_string(),
                total_with_license: counts.iter().sum(),
                counts,
            }
        })
        .collect();

    LicensePivot { categories, rows }
}

/// Occurrences of each selected category across the paid tokens of the
/// selected organizations. Categories with no occurrence are omitted.
pub fn license_frequency(
    accounts: &[Account],
    selection: &Selection,
    matcher: &PaidLicenseMatcher,
) -> Vec<(LicenseCategory, usize)> {
    let mut counts: BTreeMap<LicenseCategory, usize> = BTreeMap::new();
    for account in selected(accounts, &selection.organizations) {
        for token in &account.paid_license_tokens {
            let category = matcher.classify(token);
            if selection.categories.contains(&category) {
                *counts.entry(category).or_insert(0) += 1;
            }
        }
    }
    counts.into_iter().collect()
}

/// Number of internal accounts holding a paid license, per organization.
pub fn paid_users_by_organization(accounts: &[Account]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, org) in internal(accounts).filter(|(a, _)| a.has_paid_license) {
        *counts.entry(org).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(org, n)| (org.to_string(), n))
        .collect()
}

/// Internal accounts of the selected organizations with no paid license, in input order.
pub fn accounts_without_paid_license(
    accounts: &[Account],
    organizations: &BTreeSet<String>,
) -> Vec<Account> {
    selected(accounts, organizations)
        .filter(|a| !a.has_paid_license)
        .cloned()
        .collect()
}

/// Guest accounts, in input order.
pub fn external_accounts(accounts: &[Account]) -> Vec<Account> {
    accounts.iter().filter(|a| a.is_external).cloned().collect()
}

/// Run every aggregation and collect the results for the renderers.
pub fn build_report(
    accounts: &[Account],
    selection: &Selection,
    matcher: &PaidLicenseMatcher,
) -> Report {
    Report {
        total_accounts: accounts.len(),
        internal_accounts: accounts.iter().filter(|a| !a.is_external).count(),
        selected_organizations: selection.organizations.iter().cloned().collect(),
        organization_summary: organization_summary(accounts),
        paid_license_listing: paid_license_listing(accounts, &selection.organizations),
        blocked_paid_license_listing: blocked_paid_license_listing(
            accounts,
            &selection.organizations,
        ),
        license_category_pivot: license_category_pivot(accounts, matcher),
        license_frequency: license_frequency(accounts, selection, matcher),
        paid_users_by_organization: paid_users_by_organization(accounts),
        accounts_without_paid_license: accounts_without_paid_license(
            accounts,
            &selection.organizations,
        ),
        external_accounts: external_accounts(accounts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountClassifier;
    use crate::models::RawRecord;

    fn accounts(rows: &[(&str, &str, Option<&str>, Option<&str>)]) -> Vec<Account> {
        let classifier = AccountClassifier::with_defaults().unwrap();
        let records: Vec<RawRecord> = rows
            .iter()
            .map(|(upn, name, lic, block)| RawRecord {
                principal_name: upn.to_string(),
                display_name: name.to_string(),
                licenses: lic.map(str::to_string),
                block_credential: block.map(str::to_string),
            })
            .collect();
        classifier.classify_all(&records)
    }

    fn sample() -> Vec<Account> {
        accounts(&[
            (
                "a@contoso.com",
                "Alice",
                Some("Microsoft 365 Business Premium + Exchange Online"),
                Some("FALSE"),
            ),
            ("b@contoso.com", "Bruno", Some("Unlicensed"), None),
            ("c@fabrikam.com", "Carla", Some("Power BI Pro"), Some("1")),
            (
                "d@fabrikam.com",
                "Diego",
                Some("Microsoft 365 Business Basic+Microsoft Teams Exploratory"),
                Some("Falso"),
            ),
            (
                "guest_a#EXT#@contoso.com",
                "Guest",
                Some("Microsoft 365 Business Basic"),
                None,
            ),
            ("no-domain", "Nobody", Some("Power BI Pro"), None),
        ])
    }

    #[test]
    fn test_organization_summary_counts() {
        let summary = organization_summary(&sample());
        assert_eq!(
            summary,
            vec![
                OrganizationSummary {
                    organization: "contoso.com".to_string(),
                    total_accounts: 2,
                    active_count: 2,
                    blocked_count: 0,
                },
                OrganizationSummary {
                    organization: "fabrikam.com".to_string(),
                    total_accounts: 2,
                    active_count: 1,
                    blocked_count: 1,
                },
            ]
        );
        for row in &summary {
            assert_eq!(row.active_count + row.blocked_count, row.total_accounts);
        }
    }

    #[test]
    fn test_scenario_two_fabrikam_accounts() {
        let accts = accounts(&[
            ("x@fabrikam.com", "X", None, Some("TRUE")),
            ("y@fabrikam.com", "Y", None, Some("FALSE")),
        ]);
        let summary = organization_summary(&accts);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].organization, "fabrikam.com");
        assert_eq!(summary[0].total_accounts, 2);
        assert_eq!(summary[0].active_count, 1);
        assert_eq!(summary[0].blocked_count, 1);
    }

    #[test]
    fn test_external_excluded_from_org_views() {
        let accts = sample();
        let pivot = license_category_pivot(&accts, &PaidLicenseMatcher::default());
        let total_accounts: usize = organization_summary(&accts)
            .iter()
            .map(|r| r.total_accounts)
            .sum();
        assert_eq!(total_accounts, 4);
        assert!(pivot
            .rows
            .iter()
            .all(|r| r.organization == "contoso.com" || r.organization == "fabrikam.com"));
        let externals = external_accounts(&accts);
        assert_eq!(externals.len(), 1);
        assert_eq!(externals[0].principal_name, "guest_a#EXT#@contoso.com");
    }

    #[test]
    fn test_paid_listing_sorted_and_filtered() {
        let accts = sample();
        let all = Selection::all(&accts);
        let listing = paid_license_listing(&accts, &all.organizations);
        let names: Vec<&str> = listing.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carla", "Diego"]);
        assert_eq!(
            listing[0].paid_license_string,
            "Microsoft 365 Business Premium+Exchange Online"
        );
        assert_eq!(listing[2].paid_license_string, "Microsoft 365 Business Basic");

        let only_contoso: BTreeSet<String> = ["contoso.com".to_string()].into_iter().collect();
        let listing = paid_license_listing(&accts, &only_contoso);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].display_name, "Alice");
    }

    #[test]
    fn test_scenario_blocked_power_bi() {
        let accts = sample();
        let all = Selection::all(&accts);
        let blocked = blocked_paid_license_listing(&accts, &all.organizations);
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].display_name, "Carla");
        assert_eq!(blocked[0].paid_license_string, "Power BI Pro");
    }

    #[test]
    fn test_scenario_unlicensed_listing() {
        let accts = sample();
        let all = Selection::all(&accts);
        let without = accounts_without_paid_license(&accts, &all.organizations);
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].principal_name, "b@contoso.com");
        assert!(paid_license_listing(&accts, &all.organizations)
            .iter()
            .all(|e| e.principal_name != "b@contoso.com"));
    }

    #[test]
    fn test_pivot_columns_and_totals() {
        let accts = sample();
        let pivot = license_category_pivot(&accts, &PaidLicenseMatcher::default());
        assert_eq!(
            pivot.categories,
            vec![
                LicenseCategory::BusinessBasic,
                LicenseCategory::BusinessPremium,
                LicenseCategory::PowerBIPro,
                LicenseCategory::ExchangeOnline,
            ]
        );
        assert_eq!(
            pivot.rows,
            vec![
                PivotRow {
                    organization: "contoso.com".to_string(),
                    counts: vec![0, 1, 0, 1],
                    total_with_license: 2,
                },
                PivotRow {
                    organization: "fabrikam.com".to_string(),
                    counts: vec![1, 0, 1, 0],
                    total_with_license: 2,
                },
            ]
        );
        for row in &pivot.rows {
            assert_eq!(row.total_with_license, row.counts.iter().sum::<usize>());
        }
    }

    #[test]
    fn test_pivot_empty_when_nobody_pays() {
        let accts = accounts(&[("a@contoso.com", "A", Some("Unlicensed"), None)]);
        let pivot = license_category_pivot(&accts, &PaidLicenseMatcher::default());
        assert!(pivot.is_empty());
        assert!(pivot.categories.is_empty());
    }

    #[test]
    fn test_license_frequency_respects_categories() {
        let accts = sample();
        let matcher = PaidLicenseMatcher::default();
        let mut selection = Selection::all(&accts);
        assert_eq!(
            license_frequency(&accts, &selection, &matcher),
            vec![
                (LicenseCategory::BusinessBasic, 1),
                (LicenseCategory::BusinessPremium, 1),
                (LicenseCategory::PowerBIPro, 1),
                (LicenseCategory::ExchangeOnline, 1),
            ]
        );

        selection.categories = [LicenseCategory::PowerBIPro].into_iter().collect();
        assert_eq!(
            license_frequency(&accts, &selection, &matcher),
            vec![(LicenseCategory::PowerBIPro, 1)]
        );
    }

    #[test]
    fn test_paid_users_by_organization() {
        assert_eq!(
            paid_users_by_organization(&sample()),
            vec![("contoso.com".to_string(), 1), ("fabrikam.com".to_string(), 2)]
        );
    }

    #[test]
    fn test_available_organizations_sorted() {
        let accts = accounts(&[
            ("z@zeta.io", "Z", None, None),
            ("a@Alpha.io", "A", None, None),
            ("b@alpha.io", "B", None, None),
        ]);
        assert_eq!(available_organizations(&accts), vec!["alpha.io", "zeta.io"]);
    }

    #[test]
    fn test_build_report_is_idempotent() {
        let accts = sample();
        let matcher = PaidLicenseMatcher::default();
        let selection = Selection::all(&accts);
        let first = build_report(&accts, &selection, &matcher);
        let second = build_report(&accts, &selection, &matcher);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.total_accounts, 6);
        assert_eq!(first.internal_accounts, 5);
    }
}
