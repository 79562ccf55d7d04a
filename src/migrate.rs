//! Idempotent schema reconciliation for databases initialized before the
//! hash columns existed. Each step probes the catalog and only applies its
//! DDL when the column or index is actually missing, logging exactly what
//! changed.

use crate::db::PgPool;
use crate::error::FinflowError;
use sqlx::PgConnection;
use tracing::info;

struct ColumnStep {
    table: &'static str,
    column: &'static str,
    ddl: &'static str,
}

struct IndexStep {
    index: &'static str,
    ddl: &'static str,
}

const COLUMN_STEPS: [ColumnStep; 2] = [
    ColumnStep {
        table: "contributors",
        column: "contributor_hash",
        ddl: "ALTER TABLE contributors ADD COLUMN contributor_hash VARCHAR(64)",
    },
    ColumnStep {
        table: "contributions",
        column: "contribution_hash",
        ddl: "ALTER TABLE contributions ADD COLUMN contribution_hash VARCHAR(64)",
    },
];

const INDEX_STEPS: [IndexStep; 2] = [
    IndexStep {
        index: "contributors_contributor_hash_idx",
        ddl: "CREATE UNIQUE INDEX contributors_contributor_hash_idx \
              ON contributors(contributor_hash)",
    },
    IndexStep {
        index: "contributions_contribution_hash_idx",
        ddl: "CREATE UNIQUE INDEX contributions_contribution_hash_idx \
              ON contributions(contribution_hash)",
    },
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationLog {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

async fn column_exists(
    conn: &mut PgConnection,
    table: &str,
    column: &str,
) -> Result<bool, FinflowError> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT 1 FROM information_schema.columns WHERE table_name = $1 AND column_name = $2",
    )
    .bind(table)
    .bind(column)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

async fn index_exists(conn: &mut PgConnection, index: &str) -> Result<bool, FinflowError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_indexes WHERE indexname = $1")
        .bind(index)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Run all reconciliation steps in one transaction.
pub async fn run(pool: &PgPool) -> Result<MigrationLog, FinflowError> {
    let mut tx = pool.begin().await?;
    let mut log = MigrationLog::default();

    for step in &COLUMN_STEPS {
        let target = format!("{}.{}", step.table, step.column);
        if column_exists(&mut *tx, step.table, step.column).await? {
            info!(column = %target, "column already exists");
            log.skipped.push(target);
        } else {
            info!(column = %target, "adding column");
            sqlx::query(step.ddl).execute(&mut *tx).await?;
            log.applied.push(target);
        }
    }

    for step in &INDEX_STEPS {
        if index_exists(&mut *tx, step.index).await? {
            info!(index = step.index, "index already exists");
            log.skipped.push(step.index.to_string());
        } else {
            info!(index = step.index, "creating index");
            sqlx::query(step.ddl).execute(&mut *tx).await?;
            log.applied.push(step.index.to_string());
        }
    }

    tx.commit().await?;
    info!(
        applied = log.applied.len(),
        skipped = log.skipped.len(),
        "migrations applied successfully"
    );
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_cover_both_hash_columns_and_their_indexes() {
        assert!(
            COLUMN_STEPS
                .iter()
                .all(|s| s.ddl.contains(s.table) && s.ddl.contains(s.column))
        );
        assert!(
            INDEX_STEPS
                .iter()
                .all(|s| s.ddl.contains(s.index) && s.ddl.contains("UNIQUE"))
        );
    }
}
