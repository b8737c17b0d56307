//! Errors surfaced by external collaborators.
//!
//! Canopy's own queries never fail — missing inputs degrade to empty
//! results. Errors exist only at the boundary with providers (analysis,
//! version control, persistence), and callers are expected to treat
//! them as non-fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("version control error: {0}")]
    VersionControl(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
