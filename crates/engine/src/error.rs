//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidConfig`] thrown when the report configuration cannot be used to
//!   compute windows or classify deposits.
//! - [`Decode`] thrown when a SavedVariables document is not valid Lua table
//!   text.
//! - [`MissingTable`] thrown when a document has no table at the requested
//!   path.
//!
//! Problems with single ledger or roster lines are never errors: they are
//! reported as [`Diagnostic`] values and the run continues.
//!
//!  [`InvalidConfig`]: EngineError::InvalidConfig
//!  [`Decode`]: EngineError::Decode
//!  [`MissingTable`]: EngineError::MissingTable
//!  [`Diagnostic`]: crate::Diagnostic
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Cannot decode document: {0}")]
    Decode(String),
    #[error("\"{0}\" table not found!")]
    MissingTable(String),
}
