use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the remote store (PostgREST shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StoreErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }
}

/// A failed call against the remote store. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response from content store: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn remote(status: u16, body: StoreErrorBody) -> Self {
        Self::Remote {
            status,
            code: body.code,
            message: body.message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client-side checks that block a submission before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("invalid website url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("the end date must not be earlier than the start date")]
    DateOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_store_message_verbatim() {
        let body: StoreErrorBody = serde_json::from_str(
            r#"{"message":"permission denied for table articles","code":"42501","details":null,"hint":null}"#,
        )
        .expect("body");
        let err = StoreError::remote(403, body);
        assert_eq!(err.to_string(), "permission denied for table articles");
        assert_eq!(err.status(), Some(403));
    }
}
