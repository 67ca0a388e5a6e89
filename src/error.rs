//! Error kinds surfaced by the encoder, the solver backends and the decoder

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while configuring, encoding, solving or decoding a word design.
///
/// An unsatisfiable formula is not an error: it is reported as
/// [`SolveOutcome::Unsatisfiable`](crate::sat::SolveOutcome::Unsatisfiable).
#[derive(Debug, Error)]
pub enum DesignError {
    /// Invalid parameters, rejected before any clause is generated
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The external solver executable could not be launched
    #[error("solver executable '{}' was not found", executable.display())]
    SolverNotFound { executable: PathBuf },

    /// The solver answered, but not in a form we can trust
    #[error("solver protocol error: {reason}")]
    SolverProtocol { reason: String, raw_output: String },

    /// A reported model does not select exactly one symbol for some position
    #[error(
        "model assigns {true_count} symbols to word {word}, position {position} (expected exactly 1)"
    )]
    DecodeInconsistency {
        word: usize,
        position: usize,
        true_count: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DesignError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        DesignError::Configuration(message.into())
    }

    pub(crate) fn protocol(reason: impl Into<String>, raw_output: impl Into<String>) -> Self {
        DesignError::SolverProtocol {
            reason: reason.into(),
            raw_output: raw_output.into(),
        }
    }

    /// Raw solver output preserved with a protocol error, if any
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            DesignError::SolverProtocol { raw_output, .. } => Some(raw_output),
            _ => None,
        }
    }
}

pub type DesignResult<T> = std::result::Result<T, DesignError>;
