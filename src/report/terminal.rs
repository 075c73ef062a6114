use std::path::Path;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{Account, PaidLicenseEntry, Report};

/// Render a colored terminal report.
pub fn render(report: &Report, path: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let blocked_total: usize = report
        .organization_summary
        .iter()
        .map(|r| r.blocked_count)
        .sum();

    if quiet {
        println!(
            "Accounts: {}  Internal: {}  External: {}  Paid: {}  Blocked: {}  Blocked+Paid: {}",
            report.total_accounts,
            report.internal_accounts,
            report.external_accounts.len(),
            report.paid_license_listing.len().to_string().green(),
            blocked_total.to_string().yellow(),
            report.blocked_paid_license_listing.len().to_string().red(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "license-rollup".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Export: {}\n", path.display());

    // Summary box
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Accounts            : {:>6}", report.total_accounts)
    );
    println!(
        " │  {:<48} │",
        format!("Internal            : {:>6}", report.internal_accounts)
    );
    println!(
        " │  {:<48} │",
        format!("External (guests)   : {:>6}", report.external_accounts.len())
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Paid license     : {:>6}",
            "✓".green(),
            report.paid_license_listing.len()
        )
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Blocked + paid   : {:>6}",
            "✗".red(),
            report.blocked_paid_license_listing.len()
        )
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    println!(" {} Accounts per organization:\n", "[ORGS]".cyan().bold());
    render_org_summary(report);
    println!();

    println!(" {} Accounts with paid licenses:\n", "[PAID]".green().bold());
    render_paid_listing(&report.paid_license_listing);
    println!();

    println!(
        " {} Blocked accounts holding paid licenses:\n",
        "[BLOCKED]".red().bold()
    );
    render_paid_listing(&report.blocked_paid_license_listing);
    println!();

    println!(" {} Paid licenses per organization:\n", "[PIVOT]".cyan().bold());
    render_pivot(report);
    println!();

    println!(" {} License distribution:\n", "[CHART]".cyan().bold());
    render_frequency(report);
    println!();

    if verbose {
        println!(" {} Accounts without a paid license:\n", "[FREE]".yellow().bold());
        render_accounts(&report.accounts_without_paid_license);
        println!();

        println!(
            " {} External accounts ({}):\n",
            "[GUEST]".magenta().bold(),
            report.external_accounts.len()
        );
        render_accounts(&report.external_accounts);
        println!();
    } else {
        println!(
            " {} accounts without a paid license, {} external accounts (use --verbose to list)\n",
            report.accounts_without_paid_license.len(),
            report.external_accounts.len()
        );
    }

    Ok(())
}

fn no_data() {
    println!("   {}", "(no data)".dimmed());
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| Cell::new(l).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn render_org_summary(report: &Report) {
    if report.organization_summary.is_empty() {
        no_data();
        return;
    }

    let mut table = new_table();
    table.set_header(header(&["Organization", "Total", "Active", "Blocked"]));
    for row in &report.organization_summary {
        let blocked_color = if row.blocked_count > 0 {
            Color::Red
        } else {
            Color::DarkGrey
        };
        table.add_row(vec![
            Cell::new(&row.organization),
            Cell::new(row.total_accounts).set_alignment(CellAlignment::Right),
            Cell::new(row.active_count)
                .fg(Color::Green)
                .set_alignment(CellAlignment::Right),
            Cell::new(row.blocked_count)
                .fg(blocked_color)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);
}

fn render_paid_listing(entries: &[PaidLicenseEntry]) {
    if entries.is_empty() {
        no_data();
        return;
    }

    let mut table = new_table();
    table.set_header(header(&["Display name", "Paid licenses"]));
    for entry in entries {
        let name = if entry.is_blocked {
            Cell::new(&entry.display_name).fg(Color::Red)
        } else {
            Cell::new(&entry.display_name)
        };
        table.add_row(vec![name, Cell::new(&entry.paid_license_string)]);
    }
    println!("{}", table);
}

fn render_pivot(report: &Report) {
    let pivot = &report.license_category_pivot;
    if pivot.is_empty() {
        no_data();
        return;
    }

    let mut labels = vec!["Organization"];
    labels.extend(pivot.categories.iter().map(|c| c.column_label()));
    labels.push("Total");

    let mut table = new_table();
    table.set_header(header(&labels));
    for row in &pivot.rows {
        let mut cells = vec![Cell::new(&row.organization)];
        cells.extend(
            row.counts
                .iter()
                .map(|n| Cell::new(n).set_alignment(CellAlignment::Right)),
        );
        cells.push(
            Cell::new(row.total_with_license)
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        );
        table.add_row(cells);
    }
    println!("{}", table);
}

fn render_frequency(report: &Report) {
    let Some(max) = report.license_frequency.iter().map(|(_, n)| *n).max() else {
        no_data();
        return;
    };

    const BAR_WIDTH: usize = 30;
    for (category, count) in &report.license_frequency {
        let len = (count * BAR_WIDTH).div_ceil(max.max(1));
        println!(
            "   {:<32} {} {}",
            category.to_string(),
            "█".repeat(len).cyan(),
            count
        );
    }
}

fn render_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        no_data();
        return;
    }

    let mut table = new_table();
    table.set_header(header(&[
        "Display name",
        "User principal name",
        "Licenses",
        "Block credential",
    ]));
    for account in accounts {
        table.add_row(vec![
            Cell::new(&account.display_name),
            Cell::new(&account.principal_name),
            Cell::new(account.raw_license_field.as_deref().unwrap_or("")),
            Cell::new(account.block_flag_raw.as_deref().unwrap_or("")),
        ]);
    }
    println!("{}", table);
}
