use hook_store::StoreError;
use thiserror::Error;

use crate::emitter::EmitError;

/// Enumeration of errors that can happen while generating a handler.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("at least one webhook id is required")]
    EmptyInput,
    #[error("capture store is unavailable")]
    StoreUnavailable(#[source] StoreError),
    #[error("failed to emit handler source: {0}")]
    Emission(#[from] EmitError),
}

impl GenerateError {
    /// Label used for the outcome of a generation in metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            GenerateError::EmptyInput => "empty_input",
            GenerateError::StoreUnavailable(_) => "store_unavailable",
            GenerateError::Emission(_) => "emission_failed",
        }
    }
}
