//! Pure transforms from raw FEC records to loadable rows.
//!
//! Identity fingerprints make the load idempotent: a contributor is the
//! SHA-256 of their normalized identity fields, a contribution the SHA-256
//! of committee, contributor and receipt details. Same input, same hash,
//! `ON CONFLICT` takes care of the rest.

use crate::api::fec::{FecCandidate, FecCommittee, FecReceipt};
use crate::db::models::{CandidateRow, CommitteeRow, ContributionRow, ContributorRow};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Trim, collapse internal whitespace, lowercase. `None` becomes "".
pub fn normalize(value: Option<&str>) -> String {
    value
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Identity hash over name|city|state|zip|occupation|employer.
pub fn contributor_fingerprint(
    name: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    zip_code: Option<&str>,
    occupation: Option<&str>,
    employer: Option<&str>,
) -> String {
    let key = [name, city, state, zip_code, occupation, employer]
        .iter()
        .map(|v| normalize(*v))
        .collect::<Vec<_>>()
        .join("|");
    sha256_hex(&key)
}

/// Receipt hash over committee|contributor-hash|date|amount (two decimals).
pub fn contribution_fingerprint(
    committee_id: Option<&str>,
    contributor_hash: &str,
    date: Option<NaiveDate>,
    amount: Option<Decimal>,
) -> String {
    let date_part = date.map(|d| d.to_string()).unwrap_or_default();
    let amount_part = amount.map(|a| a.round_dp(2).to_string()).unwrap_or_default();
    sha256_hex(&format!(
        "{}|{}|{}|{}",
        normalize(committee_id),
        contributor_hash,
        date_part,
        amount_part
    ))
}

/// FEC receipt dates arrive as `2024-01-01T00:00:00` or plain dates; only
/// the date part matters.
pub fn parse_receipt_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Candidates with a usable id and name; others are dropped.
pub fn candidate_rows(results: &[FecCandidate]) -> Vec<CandidateRow> {
    results
        .iter()
        .filter_map(|c| {
            let candidate_id = c.candidate_id.clone()?;
            let name = c.name.clone()?;
            Some(CandidateRow {
                candidate_id,
                name,
                party: c.party.clone(),
                state: c.state.clone(),
                office: c.office.clone(),
                election_year: c.election_years.first().copied(),
            })
        })
        .collect()
}

pub fn committee_rows(results: &[FecCommittee]) -> Vec<CommitteeRow> {
    results
        .iter()
        .filter_map(|c| {
            let committee_id = c.committee_id.clone()?;
            let name = c.name.clone()?;
            Some(CommitteeRow {
                committee_id,
                name,
                city: c.city.clone(),
                state: c.state.clone(),
                treasurer_name: c.treasurer_name.clone(),
                committee_type: c.committee_type.clone(),
            })
        })
        .collect()
}

/// Split receipts into deduplicated contributor identities and contribution
/// rows linked by contributor hash. Receipts without a contributor name are
/// dropped.
pub fn receipt_rows(receipts: &[FecReceipt]) -> (Vec<ContributorRow>, Vec<ContributionRow>) {
    let mut seen = HashSet::new();
    let mut contributors = Vec::new();
    let mut contributions = Vec::new();

    for receipt in receipts {
        let Some(name) = receipt.contributor_name.as_deref() else {
            continue;
        };
        let contributor_hash = contributor_fingerprint(
            Some(name),
            receipt.contributor_city.as_deref(),
            receipt.contributor_state.as_deref(),
            receipt.contributor_zip.as_deref(),
            receipt.contributor_occupation.as_deref(),
            receipt.contributor_employer.as_deref(),
        );
        if seen.insert(contributor_hash.clone()) {
            contributors.push(ContributorRow {
                name: name.to_string(),
                city: receipt.contributor_city.clone(),
                state: receipt.contributor_state.clone(),
                zip_code: receipt.contributor_zip.clone(),
                occupation: receipt.contributor_occupation.clone(),
                employer: receipt.contributor_employer.clone(),
                contributor_hash: contributor_hash.clone(),
            });
        }

        let contribution_date = parse_receipt_date(receipt.contribution_receipt_date.as_deref());
        let contribution_hash = contribution_fingerprint(
            receipt.committee_id.as_deref(),
            &contributor_hash,
            contribution_date,
            receipt.contribution_receipt_amount,
        );
        contributions.push(ContributionRow {
            committee_id: receipt.committee_id.clone(),
            contributor_hash,
            contribution_date,
            contribution_amount: receipt.contribution_receipt_amount,
            contribution_hash,
        });
    }

    (contributors, contributions)
}
