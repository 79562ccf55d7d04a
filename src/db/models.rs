use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRow {
    pub candidate_id: String,
    pub name: String,
    pub party: Option<String>,
    pub state: Option<String>,
    pub office: Option<String>,
    pub election_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitteeRow {
    pub committee_id: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub treasurer_name: Option<String>,
    pub committee_type: Option<String>,
}

/// A contributor identity ready for upsert. `contributor_hash` is the
/// SHA-256 fingerprint of the normalized identity fields and is the dedupe
/// key; the serial `contributor_id` is assigned by the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributorRow {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub contributor_hash: String,
}

/// A contribution referencing its contributor by hash; the store resolves
/// the hash to a `contributor_id` at insert time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributionRow {
    pub committee_id: Option<String>,
    pub contributor_hash: String,
    pub contribution_date: Option<NaiveDate>,
    pub contribution_amount: Option<Decimal>,
    pub contribution_hash: String,
}
