//! Uniform operation results
//!
//! Operations return `Result<Outcome<T>, CtxError>` so Rust callers keep the
//! types. Front ends that want one shape for everything (the CLI's `--json`
//! mode, for instance) convert that into a [`Report`].

use super::error::CtxError;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// A successful operation: what to tell the user, and the typed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome<T> {
    pub message: String,
    pub data: T,
}

impl<T> Outcome<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Flattened, serializable form of any operation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> From<Result<Outcome<T>, CtxError>> for Report {
    fn from(result: Result<Outcome<T>, CtxError>) -> Self {
        match result {
            Ok(outcome) => {
                let data = match serde_json::to_value(&outcome.data) {
                    Ok(Value::Null) => None,
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(error = %e, "could not serialize operation payload");
                        None
                    }
                };
                Report {
                    success: true,
                    message: outcome.message,
                    data,
                    error: None,
                }
            }
            Err(e) => {
                let error = e.to_string();
                Report {
                    success: false,
                    message: format!("Operation failed: {}", error),
                    data: e.details(),
                    error: Some(error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_payload() {
        let report = Report::from(Ok::<_, CtxError>(Outcome::new("Switched", "notes")));
        assert!(report.success);
        assert_eq!(report.message, "Switched");
        assert_eq!(report.data, Some(Value::from("notes")));
        assert_eq!(report.error, None);
    }

    #[test]
    fn empty_payload_is_omitted() {
        let report = Report::from(Ok::<_, CtxError>(Outcome::new("No changes to capture", ())));
        assert_eq!(report.data, None);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("data").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_carries_error_and_details() {
        let report = Report::from(Err::<Outcome<()>, _>(CtxError::UnknownRevision {
            available: vec!["main".into()],
        }));
        assert!(!report.success);
        assert_eq!(
            report.message,
            "Operation failed: Unknown branch or revision specified"
        );
        assert_eq!(
            report.error.as_deref(),
            Some("Unknown branch or revision specified")
        );
        assert_eq!(report.data.unwrap()["available_branches"][0], "main");
    }
}
