//! Process configuration resolved from the environment (plus `.env` via dotenvy).
//!
//! Secrets never live in code: the database name, the admin credentials and
//! the per-role provisioning passwords are all injected at deploy time.

use crate::error::FinflowError;
use figment::{Figment, providers::Env};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::sync::LazyLock;
use url::Url;

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| match Config::load() {
    Ok(cfg) => cfg,
    Err(e) => {
        eprintln!("configuration error: {e}");
        std::process::exit(2);
    }
});

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    /// Admin principal the tool connects as; must hold rights to create
    /// roles and issue grants when provisioning.
    pub db_user: String,
    pub db_password: String,

    #[serde(default)]
    pub fec_api_key: Option<String>,

    // Passwords for the three provisioned access tiers.
    #[serde(default)]
    pub schema_creator_password: Option<String>,
    #[serde(default)]
    pub etl_user_password: Option<String>,
    #[serde(default)]
    pub dashboard_user_password: Option<String>,

    #[serde(default)]
    pub proxy: Option<Url>,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_election_cycle")]
    pub election_cycle: u16,
    #[serde(default = "default_candidate_office")]
    pub candidate_office: String,
    #[serde(default = "default_per_page")]
    pub per_page: u16,
}

impl Config {
    pub fn load() -> Result<Config, figment::Error> {
        Figment::new().merge(Env::raw()).extract()
    }

    pub fn pg_connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_password)
    }

    /// Provisioning password for one of the three managed roles.
    pub fn role_password(&self, role: &str) -> Result<&str, FinflowError> {
        let (value, role, var) = match role {
            "schema_creator" => (
                &self.schema_creator_password,
                "schema_creator",
                "SCHEMA_CREATOR_PASSWORD",
            ),
            "etl_user" => (&self.etl_user_password, "etl_user", "ETL_USER_PASSWORD"),
            "dashboard_user" => (
                &self.dashboard_user_password,
                "dashboard_user",
                "DASHBOARD_USER_PASSWORD",
            ),
            other => return Err(FinflowError::UnknownRole(other.to_string())),
        };
        value
            .as_deref()
            .ok_or(FinflowError::MissingRolePassword { role, var })
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "campaign_finance".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_election_cycle() -> u16 {
    2024
}

fn default_candidate_office() -> String {
    "P".to_string()
}

fn default_per_page() -> u16 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_name: default_db_name(),
            db_user: "pipeline_admin".to_string(),
            db_password: "admin-pw".to_string(),
            fec_api_key: None,
            schema_creator_password: Some("creator-pw".to_string()),
            etl_user_password: None,
            dashboard_user_password: None,
            proxy: None,
            loglevel: default_loglevel(),
            fetch_concurrency: default_fetch_concurrency(),
            election_cycle: default_election_cycle(),
            candidate_office: default_candidate_office(),
            per_page: default_per_page(),
        }
    }

    #[test]
    fn role_password_returns_the_configured_secret() {
        let cfg = test_config();
        assert_eq!(cfg.role_password("schema_creator").unwrap(), "creator-pw");
    }

    #[test]
    fn missing_role_password_names_the_env_var_to_set() {
        let cfg = test_config();
        let err = cfg.role_password("etl_user").unwrap_err();
        assert!(matches!(
            err,
            FinflowError::MissingRolePassword {
                role: "etl_user",
                var: "ETL_USER_PASSWORD",
            }
        ));
        assert!(err.to_string().contains("ETL_USER_PASSWORD"));

        let err = cfg.role_password("dashboard_user").unwrap_err();
        assert!(err.to_string().contains("DASHBOARD_USER_PASSWORD"));
    }

    #[test]
    fn unmanaged_role_names_are_rejected() {
        let cfg = test_config();
        assert!(matches!(
            cfg.role_password("superuser"),
            Err(FinflowError::UnknownRole(name)) if name == "superuser"
        ));
    }
}
