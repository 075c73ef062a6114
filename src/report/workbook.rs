use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::models::{LicensePivot, OrganizationSummary, PaidLicenseEntry, Report};

pub const SHEET_PAID: &str = "Licencas_Pagas";
pub const SHEET_BLOCKED_PAID: &str = "Bloqueados_Licencas";
pub const SHEET_PIVOT: &str = "Resumo_Empresa";
pub const SHEET_BLOCK_SUMMARY: &str = "Resumo_Bloqueio";

const NO_DATA: &str = "Sem dados";

/// Write the consolidated four-sheet workbook.
pub fn render(report: &Report, output_path: &Path) -> Result<()> {
    let mut workbook = build(report)?;
    workbook
        .save(output_path)
        .with_context(|| format!("Failed to write workbook to {}", output_path.display()))?;

    println!("Workbook written to: {}", output_path.display());
    Ok(())
}

/// Assemble the workbook in memory. Sheet names and headers are the
/// downstream compatibility contract; keep them stable.
pub fn build(report: &Report) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_PAID)?;
    write_listing(sheet, &report.paid_license_listing, &bold)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_BLOCKED_PAID)?;
    write_listing(sheet, &report.blocked_paid_license_listing, &bold)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_PIVOT)?;
    write_pivot(sheet, &report.license_category_pivot, &bold)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_BLOCK_SUMMARY)?;
    write_block_summary(sheet, &report.organization_summary, &bold)?;

    Ok(workbook)
}

fn write_header(sheet: &mut Worksheet, labels: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, label) in labels.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *label, bold)?;
    }
    Ok(())
}

fn write_listing(
    sheet: &mut Worksheet,
    entries: &[PaidLicenseEntry],
    bold: &Format,
) -> Result<(), XlsxError> {
    write_header(sheet, &["Display name", "Licenças Pagas"], bold)?;
    sheet.set_column_width(0, 32)?;
    sheet.set_column_width(1, 60)?;

    if entries.is_empty() {
        sheet.write_string(1, 0, NO_DATA)?;
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &entry.display_name)?;
        sheet.write_string(row, 1, &entry.paid_license_string)?;
    }
    Ok(())
}

fn write_pivot(sheet: &mut Worksheet, pivot: &LicensePivot, bold: &Format) -> Result<(), XlsxError> {
    let mut labels = vec!["Empresa"];
    labels.extend(pivot.categories.iter().map(|c| c.column_label()));
    labels.push("Total com Licença");
    write_header(sheet, &labels, bold)?;
    sheet.set_column_width(0, 28)?;

    if pivot.is_empty() {
        sheet.write_string(1, 0, NO_DATA)?;
        return Ok(());
    }

    for (i, row) in pivot.rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.organization)?;
        for (j, count) in row.counts.iter().enumerate() {
            sheet.write_number(r, j as u16 + 1, *count as f64)?;
        }
        sheet.write_number(r, row.counts.len() as u16 + 1, row.total_with_license as f64)?;
    }
    Ok(())
}

fn write_block_summary(
    sheet: &mut Worksheet,
    summary: &[OrganizationSummary],
    bold: &Format,
) -> Result<(), XlsxError> {
    write_header(
        sheet,
        &["Empresa", "Total_Usuarios", "Ativos", "Bloqueados"],
        bold,
    )?;
    sheet.set_column_width(0, 28)?;

    if summary.is_empty() {
        sheet.write_string(1, 0, NO_DATA)?;
        return Ok(());
    }

    for (i, row) in summary.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string_with_format(r, 0, &row.organization, bold)?;
        sheet.write_number(r, 1, row.total_accounts as f64)?;
        sheet.write_number(r, 2, row.active_count as f64)?;
        sheet.write_number(r, 3, row.blocked_count as f64)?;
    }
    Ok(())
}
