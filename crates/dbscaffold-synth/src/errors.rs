use dbscaffold_settings::SettingsError;
use thiserror::Error;

/// Errors emitted by the object model synthesizer.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A concrete target type was required but the type map has no entry.
    #[error("no type mapping for '{data_type}' (column '{column}' of '{object}')")]
    MappingNotFound {
        object: String,
        column: String,
        data_type: String,
    },
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl SynthesisError {
    /// Stable code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            SynthesisError::MappingNotFound { .. } => "mapping_not_found",
            SynthesisError::NotImplemented(_) => "not_implemented",
            SynthesisError::Settings(_) => "invalid_settings",
        }
    }
}
