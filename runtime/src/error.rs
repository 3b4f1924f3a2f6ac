//! Typed errors for every pipeline stage.

use crate::pipeline::Stage;

/// Why a single fetch attempt did not yield a payload.
#[derive(thiserror::Error, Debug, Clone)]
pub enum FetchError {
    /// Navigation, script evaluation or form interaction failed or timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// The upstream answered, but the body is not the expected JSON.
    #[error("response is not valid JSON: {reason}")]
    MalformedPayload { reason: String, body: String },

    /// A rendered page never showed the element that marks results as loaded.
    #[error("page never rendered {selector}")]
    NotReady { selector: String, html: String },

    /// Every attempt failed; carries the last error and its raw response.
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        last: Box<FetchError>,
        diagnostic: Option<std::path::PathBuf>,
    },
}

impl FetchError {
    /// The raw response or page content captured with this error, if any.
    pub fn raw_content(&self) -> Option<&str> {
        match self {
            FetchError::Status { body, .. } | FetchError::MalformedPayload { body, .. } => {
                Some(body)
            }
            FetchError::NotReady { html, .. } => Some(html),
            FetchError::Exhausted { last, .. } => last.raw_content(),
            FetchError::Transport(_) => None,
        }
    }
}

/// Total failure to derive any records from a payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("payload is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("expected a list of records at `{path}`, found {found}")]
    UnexpectedShape { path: String, found: String },

    #[error("no table matches `{0}`")]
    TableNotFound(String),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

/// A record that cannot become canonical.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing mandatory field `{field}` (source key `{source_key}`)")]
    MissingField {
        field: &'static str,
        source_key: &'static str,
    },
}

/// Terminal failure of a pipeline run, tagged with the stage it happened in.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("browser unavailable: {0}")]
    Browser(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// A pipeline error together with the stage that was active when it happened.
#[derive(thiserror::Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct RunFailure {
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

pub type PipelineResult<T> = Result<T, RunFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_content_follows_exhaustion() {
        let err = FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::MalformedPayload {
                reason: "expected value".into(),
                body: "<html>blocked</html>".into(),
            }),
            diagnostic: None,
        };
        assert_eq!(err.raw_content(), Some("<html>blocked</html>"));
        assert!(err.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn test_run_failure_display_names_stage() {
        let failure = RunFailure {
            stage: Stage::Extract,
            source: PipelineError::Extract(ExtractError::TableNotFound("table#x".into())),
        };
        assert_eq!(failure.to_string(), "extract failed: no table matches `table#x`");
    }

    #[test]
    fn test_validation_error_message() {
        let err = ValidationError::MissingField {
            field: "companyName",
            source_key: "sm_name",
        };
        assert!(err.to_string().contains("sm_name"));
    }
}
