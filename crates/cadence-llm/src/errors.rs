//! Decision model errors.

/// Errors from a [`DecisionModel`](crate::DecisionModel).
///
/// Every variant is a collaborator failure from the caller's point of view;
/// the runtime answers all of them with its deterministic lookup.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The model answered, but not with exactly one known tool call.
    #[error("non-conforming model response: {0}")]
    NonConforming(String),

    /// The model client is missing required configuration.
    #[error("decision model not configured: {0}")]
    Unconfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = DecisionError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "API error (503): overloaded");
    }

    #[test]
    fn non_conforming_display() {
        let err = DecisionError::NonConforming("no function call".into());
        assert!(err.to_string().contains("no function call"));
    }
}
