//! Error types produced by the composition pipeline.

use thiserror::Error;

use crate::document::KeyPath;

/// Errors that can occur while composing a document.
///
/// Only structural problems abort a run. Recoverable conditions such as an
/// unknown selected preset or an unresolvable `_inherits`/`_extends`
/// reference are skipped and logged instead, so sparse preset catalogs do
/// not block unrelated layers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComposeError {
    /// A mapping was required but a scalar or sequence was found.
    #[error("malformed input at '{path}': {message}")]
    MalformedInput {
        /// Path of the offending entry.
        path: KeyPath,
        /// Human-readable explanation of the structural problem.
        message: String,
    },

    /// The indexed-shape schema was built from a value that is not a
    /// mapping (or null) at some key.
    #[error("invalid shape at '{path}': {message}")]
    InvalidShape {
        /// Path of the offending schema entry.
        path: KeyPath,
        /// Human-readable explanation of the problem.
        message: String,
    },

    /// A stage name could not be resolved to a [`crate::StageKind`].
    #[error("unknown stage '{name}'")]
    UnknownStage {
        /// The unrecognised stage name.
        name: String,
    },

    /// A textual document could not be parsed.
    #[cfg(feature = "yaml")]
    #[error("failed to parse document: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },
}

impl ComposeError {
    /// Construct a [`ComposeError::MalformedInput`] for `path`.
    #[must_use]
    pub fn malformed(path: &KeyPath, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Construct a [`ComposeError::InvalidShape`] for `path`.
    #[must_use]
    pub fn invalid_shape(path: &KeyPath, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Construct a [`ComposeError::Parse`] from a parser diagnostic.
    #[cfg(feature = "yaml")]
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
