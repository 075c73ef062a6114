use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::license::tokenizer::UNLICENSED;
use crate::models::LicenseCategory;

/// Root configuration structure, deserialized from `.license-rollup/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Paid-license matching rules.
    #[serde(default)]
    pub matcher: MatcherConfig,
}

/// Defines which license names count as paid.
#[derive(Debug, Deserialize)]
pub struct MatcherConfig {
    /// Ordered keyword rules; the first rule whose keyword occurs in a
    /// license token decides its category. An empty list means the defaults.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<KeywordRule>,
    /// Value of the `Licenses` column for accounts without any license.
    #[serde(default = "default_unlicensed")]
    pub unlicensed: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            keywords: default_keywords(),
            unlicensed: default_unlicensed(),
        }
    }
}

/// A single `keyword → category` rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: LicenseCategory,
}

fn default_unlicensed() -> String {
    UNLICENSED.to_string()
}

/// Built-in rule list: the five Microsoft commercial offerings, in priority order.
pub fn default_keywords() -> Vec<KeywordRule> {
    [
        ("Business Basic", LicenseCategory::BusinessBasic),
        ("Business Standard", LicenseCategory::BusinessStandard),
        ("Business Premium", LicenseCategory::BusinessPremium),
        ("Power BI Pro", LicenseCategory::PowerBIPro),
        ("Exchange Online", LicenseCategory::ExchangeOnline),
    ]
    .into_iter()
    .map(|(keyword, category)| KeywordRule {
        keyword: keyword.to_string(),
        category,
    })
    .collect()
}

impl Config {
    /// Rules to hand to the matcher, falling back to the defaults when a
    /// config file lists none.
    pub fn keyword_rules(&self) -> Vec<KeywordRule> {
        if self.matcher.keywords.is_empty() {
            default_keywords()
        } else {
            self.matcher.keywords.clone()
        }
    }

    /// `Unclassified` means "no keyword matched", so no rule may map to it.
    fn validate(&self) -> Result<()> {
        if let Some(rule) = self
            .matcher
            .keywords
            .iter()
            .find(|r| r.category == LicenseCategory::Unclassified)
        {
            bail!(
                "keyword {:?} maps to Unclassified; paid-license rules need a paid category",
                rule.keyword
            );
        }
        Ok(())
    }
}

/// Load the keyword configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<input_dir>/.license-rollup/config.toml`
/// 3. `~/.config/license-rollup/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(input_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let local_config = input_dir.join(".license-rollup").join("config.toml");
    if local_config.exists() {
        return read_config(&local_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config: PathBuf = home
            .join(".config")
            .join("license-rollup")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    info!("no config file found, using built-in keyword rules");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    info!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
