//! Live verification of the privilege matrix.
//!
//! Probes the running database with `has_*_privilege` and compares against
//! the expectations derived from [`crate::provision::tiers`], including the
//! negative cases: the dashboard role must not be able to write, and the ETL
//! role must not be able to create tables. Tables are discovered from the
//! catalog, so objects created after provisioning are checked too.

use crate::db::PgPool;
use crate::error::FinflowError;
use crate::provision::TARGET_SCHEMA;
use crate::provision::sql::quote_ident;
use crate::provision::tiers::{
    ACCESS_TIERS, RoleSpec, SchemaPrivilege, SequencePrivilege, TablePrivilege,
};
use tracing::{info, warn};

const TABLE_VERBS: [TablePrivilege; 3] = [
    TablePrivilege::Select,
    TablePrivilege::Insert,
    TablePrivilege::Update,
];

const SEQUENCE_VERBS: [SequencePrivilege; 2] =
    [SequencePrivilege::Usage, SequencePrivilege::Select];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub role: &'static str,
    pub detail: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.role, self.detail)
    }
}

/// Expected outcome for one privilege probe, derived from the tier table.
fn expects_table_verb(spec: &RoleSpec, verb: TablePrivilege) -> bool {
    spec.tables.contains(&verb)
}

fn expects_sequence_verb(spec: &RoleSpec, verb: SequencePrivilege) -> bool {
    spec.sequences.contains(&verb)
}

async fn has_privilege(pool: &PgPool, query: &str, role: &str, object: &str, verb: &str) -> Result<bool, FinflowError> {
    let (held,): (bool,) = sqlx::query_as(query)
        .bind(role)
        .bind(object)
        .bind(verb)
        .fetch_one(pool)
        .await?;
    Ok(held)
}

async fn list_objects(pool: &PgPool, query: &str) -> Result<Vec<String>, FinflowError> {
    let rows: Vec<(String,)> = sqlx::query_as(query)
        .bind(TARGET_SCHEMA)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Check every role against the expected matrix; returns all violations.
pub async fn check(pool: &PgPool, database: &str) -> Result<Vec<Violation>, FinflowError> {
    let tables = list_objects(
        pool,
        "SELECT tablename FROM pg_tables WHERE schemaname = $1 ORDER BY tablename",
    )
    .await?;
    let sequences = list_objects(
        pool,
        "SELECT sequencename FROM pg_sequences WHERE schemaname = $1 ORDER BY sequencename",
    )
    .await?;
    info!(
        tables = tables.len(),
        sequences = sequences.len(),
        "probing privilege matrix"
    );

    let mut violations = Vec::new();

    for spec in &ACCESS_TIERS {
        // CONNECT is expected for every tier.
        if !has_privilege(
            pool,
            "SELECT has_database_privilege($1, $2, $3)",
            spec.name,
            database,
            "CONNECT",
        )
        .await?
        {
            violations.push(Violation {
                role: spec.name,
                detail: format!("missing CONNECT on database {database}"),
            });
        }

        for verb in [SchemaPrivilege::Create, SchemaPrivilege::Usage] {
            let expected = spec.schema.contains(&verb);
            let held = has_privilege(
                pool,
                "SELECT has_schema_privilege($1, $2, $3)",
                spec.name,
                TARGET_SCHEMA,
                verb.as_sql(),
            )
            .await?;
            if held != expected {
                violations.push(Violation {
                    role: spec.name,
                    detail: format!(
                        "schema {TARGET_SCHEMA}: {} {}",
                        verb.as_sql(),
                        if expected { "missing" } else { "unexpectedly held" }
                    ),
                });
            }
        }

        for table in &tables {
            let qualified = format!("{}.{}", quote_ident(TARGET_SCHEMA), quote_ident(table));
            for verb in TABLE_VERBS {
                let expected = expects_table_verb(spec, verb);
                let held = has_privilege(
                    pool,
                    "SELECT has_table_privilege($1, $2, $3)",
                    spec.name,
                    &qualified,
                    verb.as_sql(),
                )
                .await?;
                if held != expected {
                    violations.push(Violation {
                        role: spec.name,
                        detail: format!(
                            "table {table}: {} {}",
                            verb.as_sql(),
                            if expected { "missing" } else { "unexpectedly held" }
                        ),
                    });
                }
            }
        }

        for sequence in &sequences {
            let qualified = format!("{}.{}", quote_ident(TARGET_SCHEMA), quote_ident(sequence));
            for verb in SEQUENCE_VERBS {
                let expected = expects_sequence_verb(spec, verb);
                let held = has_privilege(
                    pool,
                    "SELECT has_sequence_privilege($1, $2, $3)",
                    spec.name,
                    &qualified,
                    verb.as_sql(),
                )
                .await?;
                if held != expected {
                    violations.push(Violation {
                        role: spec.name,
                        detail: format!(
                            "sequence {sequence}: {} {}",
                            verb.as_sql(),
                            if expected { "missing" } else { "unexpectedly held" }
                        ),
                    });
                }
            }
        }
    }

    for v in &violations {
        warn!(role = v.role, detail = %v.detail, "privilege violation");
    }
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::tiers::{DASHBOARD_USER, ETL_USER, SCHEMA_CREATOR};

    #[test]
    fn expected_matrix_matches_the_contract_table() {
        // dashboard: SELECT only, no sequences
        assert!(expects_table_verb(&DASHBOARD_USER, TablePrivilege::Select));
        assert!(!expects_table_verb(&DASHBOARD_USER, TablePrivilege::Insert));
        assert!(!expects_table_verb(&DASHBOARD_USER, TablePrivilege::Update));
        assert!(!expects_sequence_verb(&DASHBOARD_USER, SequencePrivilege::Usage));

        // etl: full data rights plus sequence access
        for verb in TABLE_VERBS {
            assert!(expects_table_verb(&ETL_USER, verb));
        }
        for verb in SEQUENCE_VERBS {
            assert!(expects_sequence_verb(&ETL_USER, verb));
        }

        // schema_creator: structural only
        for verb in TABLE_VERBS {
            assert!(!expects_table_verb(&SCHEMA_CREATOR, verb));
        }
    }
}
