//! Configuration and roster loading

use anyhow::{Context, Result};
use practice_billing::model::services_in_display_order;
use practice_billing::{BillingConfig, Client, RateTable, Service, Therapist};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Tax rate, fallback prices, month names
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

/// Where the practice data lives
#[derive(Debug, Deserialize)]
pub struct FilesConfig {
    /// Roster file with clients, therapists and services
    #[serde(default = "default_roster_path")]
    pub roster: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self { roster: default_roster_path() }
    }
}

fn default_roster_path() -> PathBuf {
    PathBuf::from("roster.toml")
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: FileConfig = toml::from_str(&content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (tax_rate must be a number, month_names a list)\n\n\
             See config.toml.example for the expected format."
        })?;

        // Roster path is relative to the config file
        if config.files.roster.is_relative() {
            if let Some(dir) = path.parent() {
                config.files.roster = dir.join(&config.files.roster);
            }
        }

        Ok(config)
    }
}

// =============================================================================
// Roster (roster.toml)
// =============================================================================

/// Clients, therapists and services of the practice
#[derive(Debug, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub therapists: Vec<Therapist>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read roster file: {}", path.display()))?;
        let roster: Roster =
            toml::from_str(&content).with_context(|| format!("Failed to parse roster file: {}", path.display()))?;

        tracing::debug!(
            clients = roster.clients.len(),
            therapists = roster.therapists.len(),
            services = roster.services.len(),
            "Loaded roster"
        );
        Ok(roster)
    }

    /// Default hourly prices from the active services
    pub fn rate_table(&self) -> RateTable {
        RateTable::from_services(&self.services)
    }

    /// Services in display order
    pub fn services_sorted(&self) -> Vec<&Service> {
        services_in_display_order(&self.services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_billing::ClientId;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.billing, BillingConfig::default());
        assert_eq!(config.files.roster, PathBuf::from("roster.toml"));
    }

    #[test]
    fn test_billing_overrides() {
        let config: FileConfig = toml::from_str(
            r#"
            [billing]
            tax_rate = 0.0
            fallback_client_rate = 500.0
            month_names = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
            "#,
        )
        .unwrap();
        assert_eq!(config.billing.tax_rate, 0.0);
        assert_eq!(config.billing.fallback_client_rate, 500.0);
        assert_eq!(config.billing.fallback_therapist_cost, 200.0);
        assert_eq!(config.billing.month_names[0], "Jan");
    }

    #[test]
    fn test_roster_path_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[files]\nroster = \"data/roster.toml\"\n").unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.files.roster, dir.path().join("data/roster.toml"));
    }

    #[test]
    fn test_parse_roster() {
        let roster: Roster = toml::from_str(
            r#"
            [[clients]]
            id = "juan"
            name = "Juan Pérez"
            code = "C-001"
            custom_rates = { "couples" = 650.0 }

            [[therapists]]
            id = "ana"
            name = "Ana García"
            costs_by_client = { "juan" = 250.0 }
            costs_by_service = { "standard session" = 200.0 }

            [[services]]
            name = "standard session"
            base_price = 500.0
            order = 2

            [[services]]
            name = "legacy"
            base_price = 300.0
            active = false
            order = 1
            "#,
        )
        .unwrap();

        assert_eq!(roster.clients[0].custom_rates["couples"], Some(650.0));
        assert_eq!(roster.therapists[0].costs_by_client[&ClientId::from("juan")], 250.0);
        assert_eq!(roster.rate_table().get("standard session"), Some(500.0));
        assert_eq!(roster.rate_table().get("legacy"), None);
        assert_eq!(roster.services_sorted()[0].name, "legacy");
    }
}
