//! `license-rollup` — classify a Microsoft 365 user export by organization and paid license.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load keyword config ([`config::load_config`]).
//! 3. Load the export and check required columns ([`loader`]).
//! 4. Classify every account ([`account`], [`license`]).
//! 5. Aggregate per organization and license category ([`aggregate`]).
//! 6. Render the requested report and optional charts ([`report`]).
//! 7. Exit `0`, or `1` on a load failure or a `--strict` violation.

mod account;
mod aggregate;
mod cli;
mod config;
mod error;
mod license;
mod loader;
mod models;
mod report;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use account::AccountClassifier;
use aggregate::{available_organizations, build_report, Selection};
use cli::{Cli, ReportFormat};
use config::load_config;
use license::matcher::PaidLicenseMatcher;
use loader::load_records;
use models::{Account, LicenseCategory, RawRecord, Report};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let input_dir = cli
        .file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let config = load_config(input_dir, cli.config.as_deref())?;

    let records = match load_records(&cli.file) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("{} {}: {}", "error:".red().bold(), cli.file.display(), e);
            std::process::exit(1);
        }
    };

    let matcher = PaidLicenseMatcher::new(&config.keyword_rules());
    let classifier = AccountClassifier::new(matcher.clone(), config.matcher.unlicensed.clone())?;
    let accounts = classify_with_progress(&classifier, &records, cli.quiet)?;

    let selection = resolve_selection(&cli, &accounts);
    debug!(
        organizations = selection.organizations.len(),
        categories = selection.categories.len(),
        "selection resolved"
    );

    let report = build_report(&accounts, &selection, &matcher);

    // --xlsx implies the workbook format
    let report_format = match &cli.xlsx {
        Some(_) => ReportFormat::Xlsx,
        None => cli.report.clone(),
    };
    let xlsx_path = cli
        .xlsx
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("analise_licencas.xlsx"));

    match report_format {
        ReportFormat::Terminal => {
            report::terminal::render(&report, &cli.file, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReportFormat::Xlsx => {
            report::workbook::render(&report, &xlsx_path)?;
        }
    }

    if let Some(dir) = &cli.charts {
        report::chart::render(&report, dir)?;
    }

    if cli.strict && strict_violation(&report) {
        eprintln!(
            "{} {} blocked account(s) still hold a paid license",
            "strict:".red().bold(),
            report.blocked_paid_license_listing.len()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn classify_with_progress(
    classifier: &AccountClassifier,
    records: &[RawRecord],
    quiet: bool,
) -> Result<Vec<Account>> {
    if quiet {
        return Ok(classifier.classify_all(records));
    }

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("classifying");

    let mut accounts = Vec::with_capacity(records.len());
    for record in records {
        accounts.push(classifier.classify(record));
        pb.inc(1);
    }
    pb.finish_and_clear();

    debug!(accounts = accounts.len(), "classified accounts");
    Ok(accounts)
}

/// `--strict` fails the run while any blocked account keeps a paid license.
fn strict_violation(report: &Report) -> bool {
    !report.blocked_paid_license_listing.is_empty()
}

/// Apply `--org` / `--category`, defaulting to everything present.
/// Organizations absent from the export are warned about and dropped.
fn resolve_selection(cli: &Cli, accounts: &[Account]) -> Selection {
    let mut selection = Selection::all(accounts);

    if !cli.organizations.is_empty() {
        let available: BTreeSet<String> = available_organizations(accounts).into_iter().collect();
        let requested: BTreeSet<String> = cli
            .organizations
            .iter()
            .map(|o| o.trim().to_lowercase())
            .collect();
        for org in requested.difference(&available) {
            warn!(organization = %org, "organization not present in export");
        }
        selection.organizations = requested.intersection(&available).cloned().collect();
    }

    if !cli.categories.is_empty() {
        selection.categories = cli
            .categories
            .iter()
            .map(LicenseCategory::from)
            .collect();
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const EXPORT: &str = "\u{feff}Display name,User principal name,Licenses,Block credential\n\
        Alice,a@contoso.com,Microsoft 365 Business Premium + Exchange Online,FALSE\n\
        Guest,guest_a#EXT#@contoso.com,Microsoft 365 Business Basic,False\n\
        Bruno,b@contoso.com,Unlicensed,False\n\
        Carla,c@fabrikam.com,Power BI Pro,1\n\
        Diego,d@fabrikam.com,Microsoft Teams Exploratory,verdadeiro\n";

    fn accounts(content: &str) -> Vec<Account> {
        let mut f = Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();

        let records = load_records(f.path()).unwrap();
        let classifier = AccountClassifier::new(PaidLicenseMatcher::default(), "Unlicensed").unwrap();
        classify_with_progress(&classifier, &records, true).unwrap()
    }

    fn run() -> Report {
        let accounts = accounts(EXPORT);
        let matcher = PaidLicenseMatcher::new(&config::default_keywords());
        build_report(&accounts, &Selection::all(&accounts), &matcher)
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["license-rollup", "users.csv"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let report = run();

        assert_eq!(report.total_accounts, 5);
        assert_eq!(report.external_accounts.len(), 1);
        assert_eq!(report.selected_organizations, vec!["contoso.com", "fabrikam.com"]);

        let fabrikam = &report.organization_summary[1];
        assert_eq!(fabrikam.organization, "fabrikam.com");
        assert_eq!((fabrikam.total_accounts, fabrikam.active_count, fabrikam.blocked_count), (2, 0, 2));

        let paid: Vec<&str> = report
            .paid_license_listing
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(paid, vec!["Alice", "Carla"]);
        assert_eq!(report.blocked_paid_license_listing.len(), 1);
        assert_eq!(report.blocked_paid_license_listing[0].paid_license_string, "Power BI Pro");

        let without: Vec<&str> = report
            .accounts_without_paid_license
            .iter()
            .map(|a| a.display_name.as_str())
            .collect();
        assert_eq!(without, vec!["Bruno", "Diego"]);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        assert_eq!(run(), run());
    }

    #[test]
    fn test_strict_flags_blocked_paid_account() {
        // Carla is blocked and still holds Power BI Pro
        assert!(strict_violation(&run()));
    }

    #[test]
    fn test_strict_passes_without_blocked_paid_accounts() {
        let accounts = accounts(
            "Display name,User principal name,Licenses,Block credential\n\
             Alice,a@contoso.com,Power BI Pro,FALSE\n\
             Diego,d@fabrikam.com,Microsoft Teams Exploratory,TRUE\n",
        );
        let report = build_report(&accounts, &Selection::all(&accounts), &PaidLicenseMatcher::default());
        assert!(!strict_violation(&report));
    }

    #[test]
    fn test_selection_defaults_to_everything() {
        let accounts = accounts(EXPORT);
        let selection = resolve_selection(&cli(&[]), &accounts);
        let orgs: Vec<&str> = selection.organizations.iter().map(String::as_str).collect();
        assert_eq!(orgs, vec!["contoso.com", "fabrikam.com"]);
        assert_eq!(selection.categories, Selection::all(&accounts).categories);
    }

    #[test]
    fn test_selection_normalizes_org_and_category_flags() {
        let accounts = accounts(EXPORT);
        let selection = resolve_selection(
            &cli(&["--org", " Contoso.COM ", "--category", "power-bi-pro"]),
            &accounts,
        );
        assert_eq!(
            selection.organizations,
            BTreeSet::from(["contoso.com".to_string()])
        );
        assert_eq!(selection.categories, BTreeSet::from([LicenseCategory::PowerBIPro]));
    }

    #[test]
    fn test_selection_drops_unknown_organizations() {
        let accounts = accounts(EXPORT);
        let selection = resolve_selection(
            &cli(&["--org", "fabrikam.com", "--org", "unknown.org"]),
            &accounts,
        );
        assert_eq!(
            selection.organizations,
            BTreeSet::from(["fabrikam.com".to_string()])
        );

        let report = build_report(&accounts, &selection, &PaidLicenseMatcher::default());
        assert_eq!(report.selected_organizations, vec!["fabrikam.com"]);
    }
}
