use reqwest::StatusCode;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FinflowError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FEC_API_KEY is not set; export it or add it to your .env")]
    MissingApiKey,

    #[error("no password configured for role {role}; set {var}")]
    MissingRolePassword { role: &'static str, var: &'static str },

    #[error("FEC API responded with status {0}")]
    UpstreamStatus(StatusCode),

    #[error("privilege matrix check found {0} violation(s)")]
    GrantMismatch(usize),

    #[error("no managed role named {0}")]
    UnknownRole(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Retry predicate used by the backon policies in the API client.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FinflowError {
    fn is_retryable(&self) -> bool {
        match self {
            FinflowError::Reqwest(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            FinflowError::UpstreamStatus(code) => {
                code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_5xx_and_429_are_retryable() {
        assert!(FinflowError::UpstreamStatus(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(FinflowError::UpstreamStatus(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(!FinflowError::UpstreamStatus(StatusCode::NOT_FOUND).is_retryable());
    }

    #[test]
    fn config_and_auth_errors_are_terminal() {
        assert!(!FinflowError::MissingApiKey.is_retryable());
        assert!(
            !FinflowError::MissingRolePassword {
                role: "etl_user",
                var: "ETL_USER_PASSWORD",
            }
            .is_retryable()
        );
    }
}
