use std::path::PathBuf;

use clap::Parser;

use crate::models::LicenseCategory;

#[derive(Parser, Debug)]
#[command(
    name = "license-rollup",
    about = "Summarize paid licenses and blocked accounts from a Microsoft 365 user export",
    version
)]
pub struct Cli {
    /// User export to analyze (.csv or .xlsx)
    pub file: PathBuf,

    /// Keyword config file [default: <export dir>/.license-rollup/config.toml, fallback ~/.config/license-rollup/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Workbook output path; use without value to default to analise_licencas.xlsx
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "analise_licencas.xlsx")]
    pub xlsx: Option<PathBuf>,

    /// Also render PNG bar charts into this directory
    #[arg(long, value_name = "DIR")]
    pub charts: Option<PathBuf>,

    /// Restrict listings to an organization domain (repeatable)
    #[arg(long = "org", value_name = "DOMAIN")]
    pub organizations: Vec<String>,

    /// Restrict the license distribution to a category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<CategoryArg>,

    /// Exit with status 1 if a blocked account still holds a paid license
    #[arg(long)]
    pub strict: bool,

    /// Also list accounts without a paid license and external accounts
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Xlsx,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum CategoryArg {
    BusinessBasic,
    BusinessStandard,
    BusinessPremium,
    PowerBiPro,
    ExchangeOnline,
}

impl From<&CategoryArg> for LicenseCategory {
    fn from(arg: &CategoryArg) -> Self {
        match arg {
            CategoryArg::BusinessBasic => LicenseCategory::BusinessBasic,
            CategoryArg::BusinessStandard => LicenseCategory::BusinessStandard,
            CategoryArg::BusinessPremium => LicenseCategory::BusinessPremium,
            CategoryArg::PowerBiPro => LicenseCategory::PowerBIPro,
            CategoryArg::ExchangeOnline => LicenseCategory::ExchangeOnline,
        }
    }
}
