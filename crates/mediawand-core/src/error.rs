// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for mediawand.

use thiserror::Error;

/// Top-level error type for all mediawand operations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A caller-side precondition was violated: empty argument, non-positive
    /// dimension, or an input file that does not exist.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The engine failed to decode, transform, or encode. Wraps the engine's
    /// own diagnostic.
    #[error("processing error: {0}")]
    Processing(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The two caller-facing error classes.
///
/// Every [`MediaError`] variant collapses into one of these, so callers can
/// branch on "their fault" versus "the engine's fault" without matching the
/// full enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Processing,
}

impl MediaError {
    /// Shorthand for building an [`MediaError::InvalidInput`].
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }

    /// Shorthand for building a [`MediaError::Processing`].
    pub fn processing(detail: impl Into<String>) -> Self {
        Self::Processing(detail.into())
    }

    /// Classify this error into an [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::InvalidInput(_) | MediaError::Config(_) => ErrorKind::InvalidInput,
            MediaError::Processing(_)
            | MediaError::Io(_)
            | MediaError::Serialization(_) => ErrorKind::Processing,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }

    pub fn is_processing(&self) -> bool {
        self.kind() == ErrorKind::Processing
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MediaError>;
