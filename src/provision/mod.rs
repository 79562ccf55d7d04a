//! Role provisioning for the campaign-finance store.
//!
//! Establishes the three access tiers ([`tiers::ACCESS_TIERS`]) against one
//! target database and registers default-privilege rules so tables and
//! sequences added by later migrations inherit the same grants without
//! re-running anything. The whole procedure executes inside a single
//! transaction and converges already-existing roles, so it is safe to re-run
//! after a partial failure.

pub mod sql;
pub mod tiers;

use crate::config::Config;
use crate::db::PgPool;
use crate::error::FinflowError;
use std::collections::HashMap;
use tiers::{ACCESS_TIERS, RoleSpec};
use tracing::info;

/// Schema all managed grants apply to.
pub const TARGET_SCHEMA: &str = "public";

/// Fully resolved provisioning inputs: target database, the principals that
/// may create future objects, and one password per managed role.
pub struct ProvisionPlan {
    database: String,
    owners: Vec<String>,
    passwords: HashMap<&'static str, String>,
}

impl ProvisionPlan {
    /// Resolve the plan from configuration, failing fast on any missing
    /// role password rather than midway through the transaction.
    pub fn from_config(cfg: &Config) -> Result<Self, FinflowError> {
        let mut passwords = HashMap::new();
        for spec in &ACCESS_TIERS {
            passwords.insert(spec.name, cfg.role_password(spec.name)?.to_string());
        }
        // Default-privilege rules fire only for objects created by the named
        // owner. Cover both principals that may run future migrations: the
        // admin user this tool connects as, and schema_creator itself.
        let mut owners = vec![cfg.db_user.clone(), tiers::SCHEMA_CREATOR.name.to_string()];
        owners.dedup();
        Ok(Self {
            database: cfg.db_name.clone(),
            owners,
            passwords,
        })
    }

    pub fn new(database: String, owners: Vec<String>, passwords: HashMap<&'static str, String>) -> Self {
        Self {
            database,
            owners,
            passwords,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// CREATE or ALTER depending on whether the role already exists.
    pub fn role_statement(&self, spec: &RoleSpec, exists: bool) -> String {
        let password = self
            .passwords
            .get(spec.name)
            .map(String::as_str)
            .unwrap_or_default();
        if exists {
            sql::alter_role(spec.name, password)
        } else {
            sql::create_role(spec.name, password)
        }
    }

    /// Every grant and default-privilege statement for one tier, in
    /// application order. All of these are naturally idempotent.
    pub fn grant_statements(&self, spec: &RoleSpec) -> Vec<String> {
        let mut stmts = vec![sql::grant_connect(&self.database, spec.name)];
        if !spec.schema.is_empty() {
            stmts.push(sql::grant_on_schema(TARGET_SCHEMA, spec.schema, spec.name));
        }
        if !spec.tables.is_empty() {
            stmts.push(sql::grant_on_existing_tables(
                TARGET_SCHEMA,
                spec.tables,
                spec.name,
            ));
            for owner in &self.owners {
                stmts.push(sql::default_table_privileges(
                    owner,
                    TARGET_SCHEMA,
                    spec.tables,
                    spec.name,
                ));
            }
        }
        if !spec.sequences.is_empty() {
            stmts.push(sql::grant_on_existing_sequences(
                TARGET_SCHEMA,
                spec.sequences,
                spec.name,
            ));
            for owner in &self.owners {
                stmts.push(sql::default_sequence_privileges(
                    owner,
                    TARGET_SCHEMA,
                    spec.sequences,
                    spec.name,
                ));
            }
        }
        stmts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOutcome {
    pub role: &'static str,
    pub created: bool,
}

pub struct Provisioner {
    pool: PgPool,
}

impl Provisioner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the plan inside one transaction. Any failure rolls everything
    /// back, leaving the database exactly as it was.
    pub async fn apply(&self, plan: &ProvisionPlan) -> Result<Vec<RoleOutcome>, FinflowError> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(ACCESS_TIERS.len());

        for spec in &ACCESS_TIERS {
            let exists = sqlx::query_as::<_, (i32,)>("SELECT 1 FROM pg_roles WHERE rolname = $1")
                .bind(spec.name)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();

            sqlx::query(&plan.role_statement(spec, exists))
                .execute(&mut *tx)
                .await?;
            if exists {
                info!(role = spec.name, "role exists; converged login and password");
            } else {
                info!(role = spec.name, "created role");
            }

            for stmt in plan.grant_statements(spec) {
                sqlx::query(&stmt).execute(&mut *tx).await?;
            }
            info!(
                role = spec.name,
                database = plan.database(),
                "grants and default-privilege rules applied"
            );

            outcomes.push(RoleOutcome {
                role: spec.name,
                created: !exists,
            });
        }

        tx.commit().await?;
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::tiers::{DASHBOARD_USER, ETL_USER, SCHEMA_CREATOR};

    fn test_plan() -> ProvisionPlan {
        let mut passwords = HashMap::new();
        for spec in &ACCESS_TIERS {
            passwords.insert(spec.name, format!("{}-pw", spec.name));
        }
        ProvisionPlan::new(
            "campaign_finance".to_string(),
            vec!["pipeline_admin".to_string(), "schema_creator".to_string()],
            passwords,
        )
    }

    #[test]
    fn role_statement_switches_between_create_and_alter() {
        let plan = test_plan();
        assert!(
            plan.role_statement(&ETL_USER, false)
                .starts_with("CREATE ROLE \"etl_user\"")
        );
        assert!(
            plan.role_statement(&ETL_USER, true)
                .starts_with("ALTER ROLE \"etl_user\"")
        );
    }

    #[test]
    fn schema_creator_gets_structural_rights_only() {
        let plan = test_plan();
        let stmts = plan.grant_statements(&SCHEMA_CREATOR);
        assert_eq!(
            stmts,
            vec![
                "GRANT CONNECT ON DATABASE \"campaign_finance\" TO \"schema_creator\"".to_string(),
                "GRANT CREATE ON SCHEMA \"public\" TO \"schema_creator\"".to_string(),
            ]
        );
    }

    #[test]
    fn etl_user_covers_existing_and_future_objects_for_both_owners() {
        let plan = test_plan();
        let stmts = plan.grant_statements(&ETL_USER);
        let defaults: Vec<_> = stmts
            .iter()
            .filter(|s| s.starts_with("ALTER DEFAULT PRIVILEGES"))
            .collect();
        // one table rule and one sequence rule per owner
        assert_eq!(defaults.len(), 4);
        assert!(defaults.iter().any(|s| s.contains("FOR ROLE \"pipeline_admin\"")
            && s.contains("ON TABLES")));
        assert!(defaults.iter().any(|s| s.contains("FOR ROLE \"schema_creator\"")
            && s.contains("ON SEQUENCES")));
        assert!(
            stmts
                .iter()
                .any(|s| s.contains("ON ALL TABLES IN SCHEMA \"public\""))
        );
        assert!(
            stmts
                .iter()
                .any(|s| s.contains("ON ALL SEQUENCES IN SCHEMA \"public\""))
        );
    }

    #[test]
    fn dashboard_user_never_receives_write_verbs() {
        let plan = test_plan();
        for stmt in plan.grant_statements(&DASHBOARD_USER) {
            assert!(!stmt.contains("INSERT"), "unexpected write grant: {stmt}");
            assert!(!stmt.contains("UPDATE"), "unexpected write grant: {stmt}");
            assert!(!stmt.contains("SEQUENCES"), "unexpected sequence grant: {stmt}");
        }
    }
}
