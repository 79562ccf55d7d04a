//! SQL DDL for the campaign-finance tables.

/// Table names in the `public` schema, in creation order.
pub const TABLES: [&str; 5] = [
    "candidates",
    "committees",
    "contributors",
    "contributions",
    "candidate_committees",
];

/// Bootstrap DDL. Every statement is `IF NOT EXISTS`, so running it against
/// an already-initialized database is a no-op.
///
/// - `contributors.contributor_hash` and `contributions.contribution_hash`
///   are SHA-256 identity fingerprints computed by the ETL; their UNIQUE
///   constraints are what make re-runs duplicate-free.
/// - `contribution_id` / `contributor_id` are SERIAL, which is why
///   `etl_user` needs sequence USAGE.
pub const PG_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS candidates (
    candidate_id VARCHAR(255) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    party VARCHAR(255),
    state VARCHAR(2),
    office VARCHAR(255),
    election_year INTEGER
);

CREATE TABLE IF NOT EXISTS committees (
    committee_id VARCHAR(255) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    city VARCHAR(255),
    state VARCHAR(2),
    treasurer_name VARCHAR(255),
    committee_type VARCHAR(255)
);

CREATE TABLE IF NOT EXISTS contributors (
    contributor_id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    city VARCHAR(255),
    state VARCHAR(2),
    zip_code VARCHAR(255),
    occupation VARCHAR(255),
    employer VARCHAR(255),
    contributor_hash VARCHAR(64) UNIQUE,
    UNIQUE(name, city, state, zip_code, occupation, employer)
);

CREATE TABLE IF NOT EXISTS contributions (
    contribution_id SERIAL PRIMARY KEY,
    committee_id VARCHAR(255) REFERENCES committees(committee_id),
    contributor_id INTEGER REFERENCES contributors(contributor_id),
    contribution_date DATE,
    contribution_amount NUMERIC(12, 2),
    contribution_hash VARCHAR(64) UNIQUE
);

CREATE TABLE IF NOT EXISTS candidate_committees (
    candidate_id VARCHAR(255) REFERENCES candidates(candidate_id),
    committee_id VARCHAR(255) REFERENCES committees(committee_id),
    PRIMARY KEY (candidate_id, committee_id)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_creates_every_listed_table_and_nothing_else() {
        for table in TABLES {
            assert!(
                PG_INIT.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing DDL for {table}"
            );
        }
        assert_eq!(PG_INIT.matches("CREATE TABLE").count(), TABLES.len());
    }

    #[test]
    fn hash_columns_carry_unique_constraints() {
        assert!(PG_INIT.contains("contributor_hash VARCHAR(64) UNIQUE"));
        assert!(PG_INIT.contains("contribution_hash VARCHAR(64) UNIQUE"));
    }
}
