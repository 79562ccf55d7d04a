//! The extract-transform-load pipeline.
//!
//! Candidates come first, then Schedule A receipts per candidate with
//! bounded concurrency behind the shared rate limiter, then the committees
//! those receipts reference, and finally the contribution load itself.
//! A failed fetch for one candidate or committee is logged and skipped; the
//! rest of the run continues.

pub mod transforms;

use crate::api::FecApi;
use crate::config::CONFIG;
use crate::db::FinanceStore;
use crate::error::FinflowError;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EtlSummary {
    pub candidates: usize,
    pub committees: usize,
    pub contributors: usize,
    pub contributions_inserted: u64,
    pub contributions_skipped: u64,
}

pub async fn run(store: &FinanceStore) -> Result<EtlSummary, FinflowError> {
    let api = Arc::new(FecApi::from_config()?);
    let concurrency = CONFIG.fetch_concurrency.max(1);

    let raw_candidates = api
        .candidates(
            CONFIG.election_cycle,
            &CONFIG.candidate_office,
            CONFIG.per_page,
        )
        .await?;
    let candidates = transforms::candidate_rows(&raw_candidates);
    store.upsert_candidates(&candidates).await?;
    info!(
        cycle = CONFIG.election_cycle,
        office = %CONFIG.candidate_office,
        count = candidates.len(),
        "candidates loaded"
    );

    let mut receipts = Vec::new();
    let mut fetches = stream::iter(candidates.iter().map(|candidate| {
        let api = api.clone();
        let name = candidate.name.clone();
        async move {
            let result = api.schedule_a(&name, CONFIG.per_page).await;
            (name, result)
        }
    }))
    .buffer_unordered(concurrency);
    while let Some((name, result)) = fetches.next().await {
        match result {
            Ok(batch) => {
                info!(candidate = %name, receipts = batch.len(), "fetched receipts");
                receipts.extend(batch);
            }
            Err(e) => warn!(candidate = %name, error = %e, "receipt fetch failed; skipping"),
        }
    }

    let (contributors, contributions) = transforms::receipt_rows(&receipts);

    let committee_ids: BTreeSet<String> = contributions
        .iter()
        .filter_map(|c| c.committee_id.clone())
        .collect();
    info!(count = committee_ids.len(), "distinct committees referenced");

    let mut raw_committees = Vec::new();
    let mut fetches = stream::iter(committee_ids.into_iter().map(|id| {
        let api = api.clone();
        async move {
            let result = api.committee(&id).await;
            (id, result)
        }
    }))
    .buffer_unordered(concurrency);
    while let Some((id, result)) = fetches.next().await {
        match result {
            Ok(Some(committee)) => raw_committees.push(committee),
            Ok(None) => warn!(committee = %id, "committee not found upstream"),
            Err(e) => warn!(committee = %id, error = %e, "committee fetch failed; skipping"),
        }
    }
    let committees = transforms::committee_rows(&raw_committees);
    store.upsert_committees(&committees).await?;

    // A contribution whose committee never loaded would trip the foreign
    // key; keep the row but drop the link.
    let known: HashSet<&str> = committees.iter().map(|c| c.committee_id.as_str()).collect();
    let mut contributions = contributions;
    for contribution in &mut contributions {
        if let Some(id) = contribution.committee_id.as_deref()
            && !known.contains(id)
        {
            warn!(committee = %id, "contribution references unloaded committee; clearing link");
            contribution.committee_id = None;
        }
    }

    let stats = store.insert_contributions(&contributors, &contributions).await?;
    let summary = EtlSummary {
        candidates: candidates.len(),
        committees: committees.len(),
        contributors: stats.contributors,
        contributions_inserted: stats.contributions_inserted,
        contributions_skipped: stats.contributions_skipped,
    };
    info!(
        candidates = summary.candidates,
        committees = summary.committees,
        contributors = summary.contributors,
        inserted = summary.contributions_inserted,
        skipped = summary.contributions_skipped,
        "ETL run complete"
    );
    Ok(summary)
}
