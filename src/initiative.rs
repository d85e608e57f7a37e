//! Initiative record: the per-initiative persisted state document.
//!
//! One initiative tracks one unit of work through the five-artifact
//! sign-off sequence. All five artifact tracking entries exist from
//! creation so the full expected lifecycle shape is declared up front.
//! `history` is append-only and never truncated or reordered.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::str::FromStr;
use tracing::debug;

use crate::catalog::{ArtifactKind, Group};
use crate::config::WorkspaceConfig;
use crate::errors::SignoffError;

pub const STATE_VERSION: u32 = 1;

/// Coarse lifecycle phase. `Planning` covers the whole artifact
/// progression; `Complete` is the terminal state after the final step is
/// approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// Step not reached yet.
    Pending,
    /// Stub written, review in flight.
    Drafting,
    /// Required groups signed off (recorded via `complete`).
    Approved,
}

/// Tracking sub-record for one artifact of one initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactTracking {
    pub path: String,
    pub branch: String,
    #[serde(default)]
    pub pr_url: String,
    #[serde(default)]
    pub pr_number: Option<u64>,
    pub status: ArtifactStatus,
    /// Ticket references per required group, empty until tickets are
    /// created externally.
    #[serde(default)]
    pub signoff_tickets: BTreeMap<Group, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub label: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub tracker: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceRef {
    pub path: String,
}

/// The persisted initiative document (`state.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub version: u32,
    /// Bumped on every save. A stale in-memory copy is refused at save
    /// time, which surfaces lost-update races between concurrent writers.
    #[serde(default)]
    pub revision: u64,
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub external_ids: ExternalIds,
    pub phase: Phase,
    /// Kept as a plain string in the document so a corrupted value is
    /// reported as `UnknownStep` for this initiative instead of failing
    /// the whole parse.
    pub current_step: String,
    #[serde(default)]
    pub governance_ref: GovernanceRef,
    pub artifacts: BTreeMap<ArtifactKind, ArtifactTracking>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Initiative {
    /// Build a fresh initiative with all five artifact entries derived
    /// from the catalog and `current_step` at the catalog's first entry.
    pub fn new(key: &str, title: &str, config: &WorkspaceConfig) -> Self {
        let artifacts = ArtifactKind::ORDER
            .iter()
            .map(|kind| {
                let tickets = kind
                    .required_groups()
                    .iter()
                    .map(|g| (*g, String::new()))
                    .collect();
                (
                    *kind,
                    ArtifactTracking {
                        path: config.artifact_file(key, *kind).display().to_string(),
                        branch: kind.branch_name(key),
                        pr_url: String::new(),
                        pr_number: None,
                        status: ArtifactStatus::Pending,
                        signoff_tickets: tickets,
                    },
                )
            })
            .collect();

        Self {
            version: STATE_VERSION,
            revision: 0,
            key: key.to_string(),
            title: title.to_string(),
            external_ids: ExternalIds::default(),
            phase: Phase::Planning,
            current_step: ArtifactKind::first().as_str().to_string(),
            governance_ref: GovernanceRef {
                path: config.governance_ref(),
            },
            artifacts,
            history: Vec::new(),
        }
    }

    /// Resolve `current_step` against the catalog. A value outside the
    /// catalog is corrupted state for this initiative only.
    pub fn current_step(&self) -> Result<ArtifactKind, SignoffError> {
        ArtifactKind::from_str(&self.current_step).map_err(|_| SignoffError::UnknownStep {
            key: self.key.clone(),
            step: self.current_step.clone(),
        })
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// One-based position of the current step and the total step count.
    pub fn progress(&self) -> Result<(usize, usize), SignoffError> {
        let step = self.current_step()?;
        Ok((step.position() + 1, ArtifactKind::ORDER.len()))
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ArtifactTracking> {
        self.artifacts.get(&kind)
    }

    pub fn artifact_mut(&mut self, kind: ArtifactKind) -> Option<&mut ArtifactTracking> {
        self.artifacts.get_mut(&kind)
    }

    /// Append an audit entry. History is append-only; nothing ever removes
    /// or reorders entries.
    pub fn record(&mut self, label: &str, detail: &str) {
        self.history.push(HistoryEntry {
            at: Utc::now(),
            label: label.to_string(),
            detail: detail.to_string(),
        });
    }
}

/// Reject keys that are empty or would escape the initiatives directory
/// when used as a path component.
pub fn validate_key(key: &str) -> Result<(), SignoffError> {
    let invalid = |reason: &str| SignoffError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    if key.trim().is_empty() {
        return Err(invalid("key must not be empty"));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(invalid("key must not contain path separators"));
    }
    if key.starts_with('.') {
        return Err(invalid("key must not start with '.'"));
    }
    Ok(())
}

/// Guard holding an exclusive advisory lock for one initiative. Mutating
/// operations hold this across their load, mutate, save sequence.
pub struct StateLock {
    file: fs::File,
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Reads and writes initiative documents under the workspace's output
/// directory, one subdirectory per initiative key.
pub struct InitiativeStore {
    config: WorkspaceConfig,
}

impl InitiativeStore {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.config.state_file(key).exists()
    }

    /// Take the per-initiative advisory lock. Creates the initiative
    /// directory if needed. Blocks until the lock is free.
    pub fn lock(&self, key: &str) -> Result<StateLock, SignoffError> {
        let dir = self.config.initiative_dir(key);
        fs::create_dir_all(&dir).map_err(|e| SignoffError::storage(&dir, e))?;
        let lock_path = dir.join(".lock");
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| SignoffError::storage(&lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| SignoffError::storage(&lock_path, e))?;
        Ok(StateLock { file })
    }

    pub fn load(&self, key: &str) -> Result<Initiative, SignoffError> {
        let path = self.config.state_file(key);
        if !path.exists() {
            return Err(SignoffError::InitiativeNotFound {
                key: key.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| SignoffError::storage(&path, e))?;
        let initiative: Initiative = serde_yaml::from_str(&content)
            .map_err(|e| SignoffError::corrupt(&path, e.to_string()))?;
        Ok(initiative)
    }

    /// Persist the initiative, bumping its revision stamp. When the
    /// on-disk revision no longer matches the in-memory one, a concurrent
    /// writer has intervened and the save is refused.
    pub fn save(&self, initiative: &mut Initiative) -> Result<(), SignoffError> {
        let path = self.config.state_file(&initiative.key);

        if path.exists() {
            let on_disk = self.load(&initiative.key)?;
            if on_disk.revision != initiative.revision {
                return Err(SignoffError::corrupt(
                    &path,
                    format!(
                        "revision mismatch (disk {}, memory {}): concurrent write detected",
                        on_disk.revision, initiative.revision
                    ),
                ));
            }
        }

        initiative.revision += 1;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SignoffError::storage(parent, e))?;
        }
        let yaml = serde_yaml::to_string(initiative)
            .map_err(|e| SignoffError::corrupt(&path, e.to_string()))?;
        fs::write(&path, yaml).map_err(|e| SignoffError::storage(&path, e))?;
        debug!(key = %initiative.key, revision = initiative.revision, "initiative saved");
        Ok(())
    }
}
