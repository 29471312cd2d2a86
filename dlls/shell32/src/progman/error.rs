//! Program Manager command errors
//!
//! The interpreter keeps a detailed failure taxonomy for logging and
//! tests. At the DDE boundary every variant collapses into the single
//! legacy code `DMLERR_NOTPROCESSED`.

use std::io;

use thiserror::Error;

use crate::dde::DMLERR_NOTPROCESSED;
use crate::shelllink::LinkError;
use crate::window::WindowError;

/// Failure of one Program Manager command
#[derive(Debug, Error)]
pub enum ProgmanError {
    /// Tokenizer or argument parser rejected the text
    #[error("malformed command syntax: {0}")]
    MalformedSyntax(String),

    /// Command name is not in the dispatch table
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    /// Wrong number of arguments, or a bare word without an argument list
    #[error("{command}: expected {expected}, got {got} argument(s)")]
    ArityMismatch {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// Argument present but unusable (empty, bad flag, path escape)
    #[error("{command}: invalid argument `{value}`")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },

    /// AddItem/DeleteItem issued before any group was created or shown
    #[error("{0}: no current group")]
    MissingCurrentGroup(&'static str),

    /// Group, item or program does not exist
    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },

    /// Filesystem operation failed
    #[error("filesystem operation failed: {0}")]
    Io(#[from] io::Error),

    /// Shortcut could not be encoded
    #[error("shell link write failed: {0}")]
    Link(#[from] LinkError),

    /// Window table operation failed
    #[error("window operation failed: {0}")]
    Window(#[from] WindowError),
}

impl ProgmanError {
    /// Legacy DDEML code reported for this failure
    pub fn dde_code(&self) -> u32 {
        DMLERR_NOTPROCESSED
    }

    /// Whether an external resource (filesystem, window table) failed
    pub fn is_resource_failure(&self) -> bool {
        matches!(
            self,
            ProgmanError::Io(_) | ProgmanError::Link(_) | ProgmanError::Window(_)
        )
    }

    pub(crate) fn not_found(kind: &'static str, name: &str) -> Self {
        ProgmanError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn invalid(command: &'static str, value: &str) -> Self {
        ProgmanError::InvalidArgument {
            command,
            value: value.to_string(),
        }
    }
}

/// Result alias for Program Manager operations
pub type Result<T> = core::result::Result<T, ProgmanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_collapses_to_notprocessed() {
        let errors = [
            ProgmanError::MalformedSyntax("[x".into()),
            ProgmanError::UnknownCommand("FakeCommand".into()),
            ProgmanError::ArityMismatch { command: "ShowGroup", expected: "2", got: 1 },
            ProgmanError::invalid("CreateGroup", ""),
            ProgmanError::MissingCurrentGroup("AddItem"),
            ProgmanError::not_found("group", "Group1"),
            ProgmanError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        ];

        for err in errors.iter() {
            assert_eq!(err.dde_code(), DMLERR_NOTPROCESSED);
        }
    }

    #[test]
    fn test_resource_classification() {
        assert!(ProgmanError::Window(WindowError::TableFull).is_resource_failure());
        assert!(ProgmanError::Io(io::Error::from(io::ErrorKind::Other)).is_resource_failure());
        assert!(!ProgmanError::not_found("item", "x").is_resource_failure());
    }
}
