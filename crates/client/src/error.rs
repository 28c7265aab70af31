use ledger::LedgerError;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Fallback when a rejection body carries no usable message.
pub const REQUEST_FAILED: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Local validation failed; nothing was sent over the wire.
    #[error(transparent)]
    Validation(#[from] LedgerError),
    /// The refresh path is exhausted. The caller must re-authenticate.
    #[error("Session expired. Please log in again.")]
    SessionExpired,
    /// The server rejected the request; the message is whatever the
    /// response body yielded, verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payload encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Digs the first human-readable message out of a rejection body.
///
/// Upstream services disagree on error shapes, so this walks the payload:
/// a plain string wins, then an `error` key, then `detail`, then array
/// items and remaining object values, each searched recursively. Empty
/// strings never match.
pub fn resolve_error_message(payload: &Value) -> Option<String> {
    match payload {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        Value::Array(items) => items.iter().find_map(resolve_error_message),
        Value::Object(fields) => {
            for key in ["error", "detail"] {
                if let Some(found) = fields.get(key).and_then(resolve_error_message) {
                    return Some(found);
                }
            }
            fields.values().find_map(resolve_error_message)
        }
        _ => None,
    }
}
