use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Periods are not ordered: period {next} (start {next_start}) follows period {previous} (start {previous_start})")]
    UnorderedPeriods {
        previous: String,
        previous_start: f64,
        next: String,
        next_start: f64,
    },

    #[error("Duplicate period id in update: {0}")]
    DuplicatePeriodId(String),

    #[error("Period {0} moved relative to the other known periods")]
    PeriodOrderMismatch(String),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    ManifestParseError,
    ManifestIncompatibleCodecsError,
}

impl MediaErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManifestParseError => "MANIFEST_PARSE_ERROR",
            Self::ManifestIncompatibleCodecsError => "MANIFEST_INCOMPATIBLE_CODECS_ERROR",
        }
    }
}

/// Non-fatal problem found while building the manifest graph.
///
/// These are collected in [`crate::Manifest::content_warnings`] and never abort construction.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}: {message}", code.as_str())]
pub struct MediaError {
    pub code: MediaErrorCode,
    pub message: String,
}

impl MediaError {
    pub fn new(code: MediaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn incompatible_codecs() -> Self {
        Self::new(
            MediaErrorCode::ManifestIncompatibleCodecsError,
            "An Adaptation contains only incompatible codecs.",
        )
    }
}
