use std::error::Error as StdError;
use std::fmt;

use ecotip_contracts::tips::TipParseError;
use reqwest::StatusCode;
use thiserror::Error;

const BODY_PREVIEW_CHARS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Non-2xx reply from the endpoint.
    Http { status: u16 },
    Connection,
    Timeout,
    /// Any other transport or decode failure.
    Request,
    /// The reply text had no relevance score marker.
    Parse,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Http { .. } => "http",
            FailureKind::Connection => "connection",
            FailureKind::Timeout => "timeout",
            FailureKind::Request => "request",
            FailureKind::Parse => "parse",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Http { status } => write!(f, "http {status}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Why a tip request produced no tip. Never rendered as tip text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct TipFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl TipFailure {
    pub fn http(status: StatusCode, body: &str) -> Self {
        Self {
            kind: FailureKind::Http {
                status: status.as_u16(),
            },
            detail: format!(
                "HTTP Error: {status} - {}",
                truncate_text(body, BODY_PREVIEW_CHARS)
            ),
        }
    }

    pub fn transport(err: &reqwest::Error) -> Self {
        let cause = error_chain_text(err);
        if err.is_timeout() {
            return Self {
                kind: FailureKind::Timeout,
                detail: format!("Timeout Error: {cause}"),
            };
        }
        if err.is_connect() {
            return Self {
                kind: FailureKind::Connection,
                detail: format!("Error Connecting: {cause}"),
            };
        }
        Self::request(cause)
    }

    pub fn request(cause: impl fmt::Display) -> Self {
        Self {
            kind: FailureKind::Request,
            detail: format!("Something went wrong with the request: {cause}"),
        }
    }
}

impl From<TipParseError> for TipFailure {
    fn from(err: TipParseError) -> Self {
        Self {
            kind: FailureKind::Parse,
            detail: err.to_string(),
        }
    }
}

fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    parts.join(": ")
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
