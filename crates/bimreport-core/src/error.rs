use thiserror::Error;

/// Everything that can end an upload or analysis attempt.
///
/// The `Display` text is what the user sees in the error notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("FILE FORMAT UNSUPPORTED!")]
    UnsupportedFormat { file_name: String },

    #[error("Please upload a file and select floor level!")]
    Validation,

    #[error("An upload or analysis is already in progress.")]
    Busy,

    #[error("No analysis is in progress.")]
    NoSubmission,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Unexpected analysis response: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Emission(#[from] EmissionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Backend error: {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("response has no `results` array")]
    MissingResults,

    #[error("result {index} is not a JSON object")]
    RecordNotAnObject { index: usize },

    #[error("result {index}: field `{field}` must be {expected}")]
    InvalidField {
        index: usize,
        field: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to save report {file_name}: {reason}")]
pub struct EmissionError {
    pub file_name: String,
    pub reason: String,
}

impl EmissionError {
    pub fn new(file_name: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            file_name: file_name.into(),
            reason: reason.to_string(),
        }
    }
}
