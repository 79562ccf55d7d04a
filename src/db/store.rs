use crate::db::PgPool;
use crate::db::models::{CandidateRow, CommitteeRow, ContributionRow, ContributorRow};
use crate::db::schema::PG_INIT;
use crate::error::FinflowError;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct FinanceStore {
    pool: PgPool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub contributors: usize,
    pub contributions_inserted: u64,
    pub contributions_skipped: u64,
}

impl FinanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the schema by executing the bundled DDL, one statement per
    /// query, inside a single transaction.
    pub async fn init_schema(&self) -> Result<(), FinflowError> {
        let mut tx = self.pool.begin().await?;
        for stmt in PG_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Batch upsert keyed on `candidate_id`.
    pub async fn upsert_candidates(&self, rows: &[CandidateRow]) -> Result<u64, FinflowError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO candidates (candidate_id, name, party, state, office, election_year)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (candidate_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    party = EXCLUDED.party,
                    state = EXCLUDED.state,
                    office = EXCLUDED.office,
                    election_year = EXCLUDED.election_year
                "#,
            )
            .bind(&row.candidate_id)
            .bind(&row.name)
            .bind(&row.party)
            .bind(&row.state)
            .bind(&row.office)
            .bind(row.election_year)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }

    /// Batch upsert keyed on `committee_id`.
    pub async fn upsert_committees(&self, rows: &[CommitteeRow]) -> Result<u64, FinflowError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO committees (committee_id, name, city, state, treasurer_name, committee_type)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (committee_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    city = EXCLUDED.city,
                    state = EXCLUDED.state,
                    treasurer_name = EXCLUDED.treasurer_name,
                    committee_type = EXCLUDED.committee_type
                "#,
            )
            .bind(&row.committee_id)
            .bind(&row.name)
            .bind(&row.city)
            .bind(&row.state)
            .bind(&row.treasurer_name)
            .bind(&row.committee_type)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }

    /// Load receipts in one transaction: upsert contributor identities first
    /// (dedupe on `contributor_hash`), then insert contributions with
    /// `ON CONFLICT (contribution_hash) DO NOTHING` so a re-run never
    /// duplicates a row.
    pub async fn insert_contributions(
        &self,
        contributors: &[ContributorRow],
        contributions: &[ContributionRow],
    ) -> Result<LoadStats, FinflowError> {
        let mut tx = self.pool.begin().await?;
        let mut ids: HashMap<&str, i32> = HashMap::with_capacity(contributors.len());

        for row in contributors {
            let (id,): (i32,) = sqlx::query_as(
                r#"
                INSERT INTO contributors (name, city, state, zip_code, occupation, employer, contributor_hash)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (contributor_hash) DO UPDATE SET
                    name = EXCLUDED.name,
                    city = EXCLUDED.city,
                    state = EXCLUDED.state,
                    zip_code = EXCLUDED.zip_code,
                    occupation = EXCLUDED.occupation,
                    employer = EXCLUDED.employer
                RETURNING contributor_id
                "#,
            )
            .bind(&row.name)
            .bind(&row.city)
            .bind(&row.state)
            .bind(&row.zip_code)
            .bind(&row.occupation)
            .bind(&row.employer)
            .bind(&row.contributor_hash)
            .fetch_one(&mut *tx)
            .await?;
            ids.insert(row.contributor_hash.as_str(), id);
        }

        let mut inserted = 0u64;
        let mut skipped = 0u64;
        for row in contributions {
            let Some(contributor_id) = ids.get(row.contributor_hash.as_str()) else {
                warn!(
                    hash = %row.contribution_hash,
                    "contribution references unknown contributor; skipping"
                );
                skipped += 1;
                continue;
            };
            let result = sqlx::query(
                r#"
                INSERT INTO contributions
                    (committee_id, contributor_id, contribution_date, contribution_amount, contribution_hash)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (contribution_hash) DO NOTHING
                "#,
            )
            .bind(&row.committee_id)
            .bind(contributor_id)
            .bind(row.contribution_date)
            .bind(row.contribution_amount)
            .bind(&row.contribution_hash)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                skipped += 1;
            } else {
                inserted += 1;
            }
        }

        tx.commit().await?;
        debug!(
            contributors = contributors.len(),
            inserted, skipped, "contribution load committed"
        );
        Ok(LoadStats {
            contributors: contributors.len(),
            contributions_inserted: inserted,
            contributions_skipped: skipped,
        })
    }
}
