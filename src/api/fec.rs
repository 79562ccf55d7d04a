//! Typed client for the FEC campaign-finance API (api.open.fec.gov/v1).
//!
//! All calls share one direct rate limiter and retry transient upstream
//! failures with exponential backoff.

use crate::config::CONFIG;
use crate::error::{FinflowError, IsRetryable};
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const FEC_BASE_URL: &str = "https://api.open.fec.gov/v1";

// The public FEC tier allows 1000 calls/hour; stay comfortably under it.
const CALLS_PER_MINUTE: u32 = 12;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(8))
        .with_max_times(3)
        .with_jitter()
}

/// Standard FEC response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub pages: Option<u32>,
    pub count: Option<u64>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FecCandidate {
    pub candidate_id: Option<String>,
    pub name: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub office: Option<String>,
    #[serde(default)]
    pub election_years: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FecCommittee {
    pub committee_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub treasurer_name: Option<String>,
    pub committee_type: Option<String>,
}

/// One Schedule A receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct FecReceipt {
    pub committee_id: Option<String>,
    pub contributor_name: Option<String>,
    pub contributor_city: Option<String>,
    pub contributor_state: Option<String>,
    pub contributor_zip: Option<String>,
    pub contributor_occupation: Option<String>,
    pub contributor_employer: Option<String>,
    pub contribution_receipt_date: Option<String>,
    pub contribution_receipt_amount: Option<Decimal>,
}

pub struct FecApi {
    client: reqwest::Client,
    api_key: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl FecApi {
    pub fn from_config() -> Result<Self, FinflowError> {
        let api_key = CONFIG
            .fec_api_key
            .clone()
            .ok_or(FinflowError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder()
            .user_agent("finflow-etl/0.2")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30));
        if let Some(proxy_url) = CONFIG.proxy.clone() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let client = builder.build()?;

        const PER_MINUTE: NonZeroU32 = NonZeroU32::new(CALLS_PER_MINUTE).unwrap();
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(PER_MINUTE)));

        Ok(Self {
            client,
            api_key,
            limiter,
        })
    }

    pub async fn candidates(
        &self,
        cycle: u16,
        office: &str,
        per_page: u16,
    ) -> Result<Vec<FecCandidate>, FinflowError> {
        let envelope: Envelope<FecCandidate> = self
            .get_json(
                "/candidates/",
                &[
                    ("cycle", cycle.to_string()),
                    ("office", office.to_string()),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await?;
        Ok(envelope.results)
    }

    /// Fetch a single committee by id; `None` when the API has no match.
    pub async fn committee(&self, committee_id: &str) -> Result<Option<FecCommittee>, FinflowError> {
        let envelope: Envelope<FecCommittee> = self
            .get_json(
                "/committees/",
                &[("committee_id", committee_id.to_string())],
            )
            .await?;
        Ok(envelope.results.into_iter().next())
    }

    /// Schedule A receipts matching a contributor name.
    pub async fn schedule_a(
        &self,
        contributor_name: &str,
        per_page: u16,
    ) -> Result<Vec<FecReceipt>, FinflowError> {
        let envelope: Envelope<FecReceipt> = self
            .get_json(
                "/schedules/schedule_a/",
                &[
                    ("contributor_name", contributor_name.to_string()),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await?;
        Ok(envelope.results)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, FinflowError> {
        let url = format!("{FEC_BASE_URL}{path}");

        (|| async {
            self.limiter.until_ready().await;
            let resp = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(query)
                .send()
                .await?;
            let status = resp.status();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(FinflowError::UpstreamStatus(status));
            }
            let resp = resp.error_for_status()?;
            Ok(resp.json::<Envelope<T>>().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &FinflowError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("FEC request retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_candidate_envelope() {
        let payload = r#"{
            "results": [
                {
                    "candidate_id": "P80001571",
                    "name": "BIDEN, JOSEPH R JR",
                    "party": "DEM",
                    "state": "US",
                    "office": "P",
                    "election_years": [2020, 2024]
                }
            ],
            "pagination": {"page": 1, "pages": 1, "count": 1, "per_page": 20}
        }"#;
        let envelope: Envelope<FecCandidate> =
            serde_json::from_str(payload).expect("candidate envelope");
        assert_eq!(envelope.results.len(), 1);
        let c = &envelope.results[0];
        assert_eq!(c.candidate_id.as_deref(), Some("P80001571"));
        assert_eq!(c.election_years.first(), Some(&2020));
        assert_eq!(envelope.pagination.and_then(|p| p.count), Some(1));
    }

    #[test]
    fn decodes_receipt_with_float_amount_and_missing_fields() {
        let payload = r#"{
            "results": [
                {
                    "committee_id": "C00703975",
                    "contributor_name": "DOE, JANE",
                    "contributor_zip": "90210",
                    "contribution_receipt_date": "2024-01-01T00:00:00",
                    "contribution_receipt_amount": 250.0
                }
            ]
        }"#;
        let envelope: Envelope<FecReceipt> =
            serde_json::from_str(payload).expect("receipt envelope");
        let r = &envelope.results[0];
        assert_eq!(
            r.contribution_receipt_amount,
            Some(Decimal::new(2500, 1))
        );
        assert!(r.contributor_city.is_none());
        assert!(envelope.pagination.is_none());
    }

    #[test]
    fn empty_envelope_defaults_to_no_results() {
        let envelope: Envelope<FecCandidate> = serde_json::from_str("{}").expect("empty envelope");
        assert!(envelope.results.is_empty());
    }
}
