//! Tracked-company registry loaded from `config/companies.yaml`.
//!
//! The registry names the primary company and its competitors, the search
//! keywords used per platform, and the product taxonomy handed to the
//! classifier prompt.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConfig {
    /// Slug used as the `company` tag on persisted posts.
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub is_primary: bool,
    pub keywords: Vec<String>,
}

impl CompanyConfig {
    /// Primary search keyword for this company (first in the list).
    #[must_use]
    pub fn primary_keyword(&self) -> &str {
        self.keywords
            .first()
            .map_or(self.display_name.as_str(), String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompaniesFile {
    /// Product taxonomy offered to the classifier for product attribution.
    pub products: Vec<String>,
    pub companies: Vec<CompanyConfig>,
}

impl CompaniesFile {
    /// The single company marked `is_primary`.
    ///
    /// # Panics
    ///
    /// Does not panic for files that passed [`load_companies`] validation,
    /// which guarantees exactly one primary.
    #[must_use]
    pub fn primary(&self) -> &CompanyConfig {
        self.companies
            .iter()
            .find(|c| c.is_primary)
            .expect("validated companies file has exactly one primary")
    }

    #[must_use]
    pub fn competitors(&self) -> Vec<&CompanyConfig> {
        self.companies.iter().filter(|c| !c.is_primary).collect()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CompanyConfig> {
        self.companies.iter().find(|c| c.name == name)
    }
}

/// Load and validate the companies configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_companies(path: &Path) -> Result<CompaniesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CompaniesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CompaniesFile = serde_yaml::from_str(&content)?;
    validate_companies(&file)?;
    Ok(file)
}

fn validate_companies(file: &CompaniesFile) -> Result<(), ConfigError> {
    if file.companies.is_empty() {
        return Err(ConfigError::Validation(
            "companies list must not be empty".to_string(),
        ));
    }

    let primary_count = file.companies.iter().filter(|c| c.is_primary).count();
    if primary_count != 1 {
        return Err(ConfigError::Validation(format!(
            "exactly one company must be marked is_primary, found {primary_count}"
        )));
    }

    let mut seen_names = HashSet::new();
    for company in &file.companies {
        if company.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "company name must be non-empty".to_string(),
            ));
        }

        if company
            .name
            .chars()
            .any(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-')
        {
            return Err(ConfigError::Validation(format!(
                "company name '{}' must be a lowercase slug",
                company.name
            )));
        }

        if !seen_names.insert(company.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate company name: '{}'",
                company.name
            )));
        }

        if company.keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "company '{}' must have at least one search keyword",
                company.name
            )));
        }
    }

    Ok(())
}
