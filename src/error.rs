use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    ValidationError,
    NotFound,
    AmbiguousRef,
    TransportError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::TransportError => "TRANSPORT_ERROR",
        }
    }

    /// Whether the failure came from the backend rather than from the input.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportError)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BoardError {
    pub code: ErrorCode,
    pub message: String,
}

impl BoardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "Board is not initialized. Run `lectio-board init` first.",
        )
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {reference}"))
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!(
                "Ambiguous reference '{}'. Candidates: {}",
                reference,
                candidates.join(", ")
            ),
        )
    }

    pub fn unknown_status(value: &str) -> Self {
        Self::validation(format!(
            "Unknown status '{value}'. Expected one of: proposed, in_progress, testing, done"
        ))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportError, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(e: rusqlite::Error) -> Self {
        Self::transport(e.to_string())
    }
}

impl From<std::io::Error> for BoardError {
    fn from(e: std::io::Error) -> Self {
        Self::transport(e.to_string())
    }
}
