//! Error types for the chart core.
//!
//! Only the initial load and narrative validation can fail. Filter toggles,
//! step navigation and pointer lookups run over already-validated state and
//! have no error path.

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// Fetching the dataset failed. Fatal: no chart renders.
    #[error("failed to load {source_name}: {reason}")]
    Load { source_name: String, reason: String },

    /// A malformed numeric cell or date header.
    #[error("parse error at row {row}, column {column:?}: {reason} (cell {cell:?})")]
    Parse {
        row: usize,
        column: String,
        cell: String,
        reason: String,
    },

    /// The table does not have the expected column layout.
    #[error("schema error: {0}")]
    Schema(String),

    /// A narrative selector matched no series.
    #[error("step {step:?}: annotation {annotation:?} matches no series")]
    UnresolvedAnnotation { step: String, annotation: String },

    /// A narrative selector matched more than one series.
    #[error("step {step:?}: annotation {annotation:?} matches {matches} series")]
    AmbiguousAnnotation {
        step: String,
        annotation: String,
        matches: usize,
    },

    /// Structural defect in the narrative configuration.
    #[error("invalid narrative: {0}")]
    InvalidNarrative(String),
}

impl ChartError {
    pub fn load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        ChartError::Load {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Configuration defects are caught at startup, before any render.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ChartError::UnresolvedAnnotation { .. }
                | ChartError::AmbiguousAnnotation { .. }
                | ChartError::InvalidNarrative(_)
        )
    }
}
