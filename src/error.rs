use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    #[error("{kind} '{name}' not found{scope}")]
    NotFound {
        kind: &'static str,
        name: String,
        // pre-rendered, e.g. " for course 'Linux'"
        scope: String,
    },

    #[error("{operation}: expected status {expected}, got {actual}")]
    UnexpectedStatus {
        operation: &'static str,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("{operation}: server did not acknowledge (expected message '{expected}', got {got:?})")]
    Unacknowledged {
        operation: &'static str,
        expected: String,
        got: Option<String>,
    },

    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} partially applied ({completed}); pending: [{}]: {source}", .pending.join(", "))]
    PartialFailure {
        operation: &'static str,
        resource_id: Option<String>,
        completed: String,
        pending: Vec<String>,
        #[source]
        source: Box<ProviderError>,
    },

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
            scope: String::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialFailure { .. })
    }

    /// The HTTP status carried by an `UnexpectedStatus`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_scope() {
        let err = ProviderError::NotFound {
            kind: "batch",
            name: "Batch 1".into(),
            scope: " for course 'Linux'".into(),
        };
        assert_eq!(err.to_string(), "batch 'Batch 1' not found for course 'Linux'");
        assert!(err.is_not_found());
        assert!(!err.is_partial());
    }

    #[test]
    fn partial_failure_lists_pending() {
        let err = ProviderError::PartialFailure {
            operation: "update enrollment",
            resource_id: Some("a,b".into()),
            completed: "revoked c".into(),
            pending: vec!["a".into(), "d".into()],
            source: Box::new(ProviderError::UnexpectedStatus {
                operation: "enroll users",
                expected: 200,
                actual: 500,
                body: String::new(),
            }),
        };
        let text = err.to_string();
        assert!(text.contains("pending: [a, d]"));
        assert!(text.contains("got 500"));
        assert_eq!(err.status(), None);
    }
}
