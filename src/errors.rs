//! Typed error taxonomy for the sign-off engine.
//!
//! Every variant is a recoverable precondition violation: the caller can
//! fix its inputs or run a prerequisite operation and retry. None of these
//! is fatal to the process; the operation surface folds them into
//! structured failure responses.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignoffError {
    #[error("Governance not configured. Run setup-governance first")]
    GovernanceNotConfigured,

    #[error("Initiative {key} already exists")]
    InitiativeAlreadyExists { key: String },

    #[error("Initiative {key} not found")]
    InitiativeNotFound { key: String },

    #[error("Initiative {key} is at unknown step '{step}'. Repair state.yaml before advancing")]
    UnknownStep { key: String, step: String },

    #[error("Unknown artifact '{name}'. Valid: prd, ux, architecture, epics_stories, readiness")]
    UnknownArtifact { name: String },

    #[error("Invalid initiative key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Corrupt state at {path}: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SignoffError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptState {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
