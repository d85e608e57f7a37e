//! Initiative progression engine.
//!
//! The state machine at the heart of the crate. States are the five
//! catalog steps plus the terminal `complete` phase. Stub creation and
//! pointer movement are deliberately separate primitives:
//!
//! - `start_step` writes the current step's artifact stub and reports the
//!   required sign-off groups. It never moves the step pointer.
//! - `complete_step` records the external approval event and moves the
//!   pointer forward, or marks the initiative complete at the final step.
//!
//! Both are idempotent no-ops once the initiative is terminal. Every
//! mutating operation validates its preconditions before the first write
//! and holds the per-initiative advisory lock across its
//! load-mutate-save sequence.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use crate::catalog::{step_chain, ArtifactKind, Group};
use crate::config::WorkspaceConfig;
use crate::errors::SignoffError;
use crate::governance::{Governance, GovernanceStore};
use crate::initiative::{
    validate_key, ArtifactStatus, Initiative, InitiativeStore, Phase,
};
use crate::tickets::{self, TicketRequest};
use crate::timeline::Timeline;

/// Result of `start_step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The current step's artifact stub was written; review can begin.
    Started(StepStart),
    /// The initiative is terminal; nothing was written.
    Complete { key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStart {
    pub key: String,
    pub step: ArtifactKind,
    pub artifact_path: PathBuf,
    pub required_groups: Vec<Group>,
    pub branch: String,
}

/// Result of `complete_step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// The step was approved and the pointer moved forward.
    Advanced {
        key: String,
        approved: ArtifactKind,
        next: ArtifactKind,
    },
    /// The final step was approved; the initiative is now terminal.
    Finished { key: String, approved: ArtifactKind },
    /// The initiative was already terminal; nothing was written.
    AlreadyComplete { key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GovernanceStatus {
    NotConfigured,
    Configured {
        tracker_project_key: String,
        ba_leads: Vec<String>,
        design_leads: Vec<String>,
        dev_leads: Vec<String>,
    },
    /// The document exists but cannot be parsed. Reported, not fatal;
    /// `status` itself never fails.
    Unreadable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InitiativeStatus {
    NotFound {
        key: String,
    },
    Found {
        key: String,
        title: String,
        phase: Phase,
        current_step: String,
        position: usize,
        total: usize,
        step_chain: String,
    },
    Unreadable {
        key: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub governance: GovernanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative: Option<InitiativeStatus>,
}

/// The progression engine. Cheap to construct; all state lives in the
/// stores.
pub struct ProgressionEngine {
    config: WorkspaceConfig,
    governance: GovernanceStore,
    initiatives: InitiativeStore,
}

impl ProgressionEngine {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            governance: GovernanceStore::new(config.clone()),
            initiatives: InitiativeStore::new(config.clone()),
            config,
        }
    }

    pub fn governance_store(&self) -> &GovernanceStore {
        &self.governance
    }

    /// Create a new initiative at the catalog's first step.
    ///
    /// Preconditions (all checked before any write): governance must be
    /// configured, the key must be valid and not already in use.
    pub fn create(&self, key: &str, title: &str) -> Result<Initiative, SignoffError> {
        validate_key(key)?;
        if !self.governance.is_configured() {
            return Err(SignoffError::GovernanceNotConfigured);
        }
        if self.initiatives.exists(key) {
            return Err(SignoffError::InitiativeAlreadyExists {
                key: key.to_string(),
            });
        }

        let _lock = self.initiatives.lock(key)?;
        // Re-check under the lock; a concurrent creator may have won.
        if self.initiatives.exists(key) {
            return Err(SignoffError::InitiativeAlreadyExists {
                key: key.to_string(),
            });
        }

        let mut initiative = Initiative::new(key, title, &self.config);
        initiative.record("Initiative Initialized", "Initiative created");

        let artifacts_dir = self.config.artifacts_dir(key);
        fs::create_dir_all(&artifacts_dir)
            .map_err(|e| SignoffError::storage(&artifacts_dir, e))?;

        self.initiatives.save(&mut initiative)?;
        Timeline::new(self.config.timeline_file(key)).seed(key, title)?;

        info!(key, title, "initiative created");
        Ok(initiative)
    }

    /// Write the artifact stub for the initiative's current step and
    /// report what sign-offs it needs. Leaves the step pointer alone; the
    /// pointer moves only through `complete_step`.
    pub fn start_step(&self, key: &str) -> Result<AdvanceOutcome, SignoffError> {
        if !self.initiatives.exists(key) {
            return Err(SignoffError::InitiativeNotFound {
                key: key.to_string(),
            });
        }

        let _lock = self.initiatives.lock(key)?;
        let mut initiative = self.initiatives.load(key)?;

        if initiative.is_complete() {
            info!(key, "start_step on terminal initiative: no-op");
            return Ok(AdvanceOutcome::Complete {
                key: key.to_string(),
            });
        }

        let step = initiative.current_step()?;
        let artifact_path = self.write_stub(key, step)?;
        let groups = step.required_groups().to_vec();

        if let Some(tracking) = initiative.artifact_mut(step) {
            tracking.status = ArtifactStatus::Drafting;
        }
        let group_names = groups
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        initiative.record(
            &format!("{} Step Started", step.as_str().to_uppercase()),
            &format!("Created artifact stub; required groups: {group_names}"),
        );
        self.initiatives.save(&mut initiative)?;

        Timeline::new(self.config.timeline_file(key)).append(
            &format!("{} Step Started", step.as_str().to_uppercase()),
            &[
                "**Phase:** planning".to_string(),
                format!("**Step:** {step}"),
                "**Action:** Created artifact stub".to_string(),
                format!("**Required groups:** {group_names}"),
            ],
        )?;

        info!(key, step = %step, "artifact stub written");
        Ok(AdvanceOutcome::Started(StepStart {
            key: key.to_string(),
            step,
            artifact_path,
            required_groups: groups,
            branch: step.branch_name(key),
        }))
    }

    /// Record the external approval of the current step and move the
    /// pointer forward. At the final catalog entry the initiative becomes
    /// terminal instead; the pointer never moves past the end.
    pub fn complete_step(&self, key: &str) -> Result<CompletionOutcome, SignoffError> {
        if !self.initiatives.exists(key) {
            return Err(SignoffError::InitiativeNotFound {
                key: key.to_string(),
            });
        }

        let _lock = self.initiatives.lock(key)?;
        let mut initiative = self.initiatives.load(key)?;

        if initiative.is_complete() {
            info!(key, "complete_step on terminal initiative: no-op");
            return Ok(CompletionOutcome::AlreadyComplete {
                key: key.to_string(),
            });
        }

        let step = initiative.current_step()?;
        if let Some(tracking) = initiative.artifact_mut(step) {
            tracking.status = ArtifactStatus::Approved;
        }

        let timeline = Timeline::new(self.config.timeline_file(key));
        let step_upper = step.as_str().to_uppercase();

        let outcome = match step.next() {
            Some(next) => {
                initiative.current_step = next.as_str().to_string();
                initiative.record(
                    &format!("{step_upper} Approved"),
                    &format!("Step signed off; current step is now {next}"),
                );
                self.initiatives.save(&mut initiative)?;
                timeline.append(
                    &format!("{step_upper} Approved"),
                    &[
                        format!("**Step:** {step}"),
                        format!("**Next step:** {next}"),
                    ],
                )?;
                info!(key, from = %step, to = %next, "step approved, pointer advanced");
                CompletionOutcome::Advanced {
                    key: key.to_string(),
                    approved: step,
                    next,
                }
            }
            None => {
                initiative.phase = Phase::Complete;
                initiative.record(
                    "Initiative Complete",
                    "All artifacts have been signed off",
                );
                self.initiatives.save(&mut initiative)?;
                timeline.append(
                    "Initiative Complete",
                    &[format!("**Step:** {step}"), "**Phase:** complete".to_string()],
                )?;
                info!(key, "initiative complete");
                CompletionOutcome::Finished {
                    key: key.to_string(),
                    approved: step,
                }
            }
        };
        Ok(outcome)
    }

    /// Compute the ticket payloads for one artifact of one initiative.
    /// Pure apart from reading governance; nothing is persisted.
    pub fn ticket_payloads(
        &self,
        key: &str,
        artifact: &str,
        pr_url: Option<&str>,
    ) -> Result<Vec<TicketRequest>, SignoffError> {
        let kind = ArtifactKind::from_str(artifact).map_err(|_| SignoffError::UnknownArtifact {
            name: artifact.to_string(),
        })?;
        let governance = self.governance.require()?;
        Ok(tickets::generate(key, kind, pr_url, &governance))
    }

    /// Report governance and (optionally) one initiative's progress.
    /// Never fails: every degraded condition becomes part of the report.
    pub fn status(&self, key: Option<&str>) -> StatusReport {
        let governance = match self.governance.load() {
            Ok(None) => GovernanceStatus::NotConfigured,
            Ok(Some(g)) => governance_status(&g),
            Err(e) => {
                warn!(error = %e, "governance document unreadable");
                GovernanceStatus::Unreadable {
                    reason: e.to_string(),
                }
            }
        };

        let initiative = key.map(|key| {
            if !self.initiatives.exists(key) {
                return InitiativeStatus::NotFound {
                    key: key.to_string(),
                };
            }
            match self.initiatives.load(key) {
                Ok(initiative) => {
                    let (position, total) = match initiative.progress() {
                        Ok(p) => p,
                        // Unknown step: report position 0 rather than failing
                        // the whole status query.
                        Err(_) => (0, ArtifactKind::ORDER.len()),
                    };
                    InitiativeStatus::Found {
                        key: initiative.key,
                        title: initiative.title,
                        phase: initiative.phase,
                        current_step: initiative.current_step,
                        position,
                        total,
                        step_chain: step_chain(),
                    }
                }
                Err(e) => InitiativeStatus::Unreadable {
                    key: key.to_string(),
                    reason: e.to_string(),
                },
            }
        });

        StatusReport {
            governance,
            initiative,
        }
    }

    fn write_stub(&self, key: &str, step: ArtifactKind) -> Result<PathBuf, SignoffError> {
        let artifacts_dir = self.config.artifacts_dir(key);
        fs::create_dir_all(&artifacts_dir)
            .map_err(|e| SignoffError::storage(&artifacts_dir, e))?;

        let path = self.config.artifact_file(key, step);
        let content = format!(
            "# {} (Stub)\n\n\
             **Initiative:** `{key}`\n\
             **Current step:** `{step}`\n\
             **Generated at:** `{}`\n\n\
             ---\n\n\
             This is a stub artifact for the signoff workflow.\n\
             Signoff happens via PR approval — the repo/PR is the source of truth.\n",
            step.as_str().to_uppercase(),
            Utc::now().to_rfc3339(),
        );
        fs::write(&path, content).map_err(|e| SignoffError::storage(&path, e))?;
        Ok(path)
    }
}

fn governance_status(governance: &Governance) -> GovernanceStatus {
    GovernanceStatus::Configured {
        tracker_project_key: governance.tracker.project_key.clone(),
        ba_leads: governance.leads(Group::Ba).to_vec(),
        design_leads: governance.leads(Group::Design).to_vec(),
        dev_leads: governance.leads(Group::Dev).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn engine(dir: &std::path::Path) -> ProgressionEngine {
        ProgressionEngine::new(WorkspaceConfig::new(dir.to_path_buf()))
    }

    fn configured_engine(dir: &std::path::Path) -> ProgressionEngine {
        let engine = engine(dir);
        engine
            .governance_store()
            .configure(
                vec!["alice".into()],
                vec!["carol".into()],
                vec!["dan".into()],
                "PROJ".into(),
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_create_without_governance_fails() {
        let dir = tempdir().unwrap();
        let err = engine(dir.path()).create("FEAT-1", "t").unwrap_err();
        assert!(matches!(err, SignoffError::GovernanceNotConfigured));
        // Precondition failure happens before any write.
        assert!(!dir.path().join("_bmad-output/initiatives").exists());
    }

    #[test]
    fn test_create_initializes_full_shape() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        let initiative = engine.create("FEAT-1", "Checkout revamp").unwrap();

        assert_eq!(initiative.current_step, "prd");
        assert_eq!(initiative.artifacts.len(), 5);
        assert_eq!(initiative.history.len(), 1);
        assert_eq!(initiative.history[0].label, "Initiative Initialized");
        assert!(dir
            .path()
            .join("_bmad-output/initiatives/FEAT-1/state.yaml")
            .exists());
        assert!(dir
            .path()
            .join("_bmad-output/initiatives/FEAT-1/timeline.md")
            .exists());
    }

    #[test]
    fn test_create_duplicate_key_fails_and_preserves_first() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "first").unwrap();

        let err = engine.create("FEAT-1", "second").unwrap_err();
        assert!(matches!(err, SignoffError::InitiativeAlreadyExists { .. }));

        let report = engine.status(Some("FEAT-1"));
        match report.initiative.unwrap() {
            InitiativeStatus::Found { title, .. } => assert_eq!(title, "first"),
            other => panic!("Expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_create_rejects_invalid_keys() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        assert!(matches!(
            engine.create("", "t"),
            Err(SignoffError::InvalidKey { .. })
        ));
        assert!(engine.create("a/b", "t").is_err());
    }

    #[test]
    fn test_start_step_unknown_initiative_fails() {
        let dir = tempdir().unwrap();
        let err = configured_engine(dir.path())
            .start_step("NOPE")
            .unwrap_err();
        assert!(matches!(err, SignoffError::InitiativeNotFound { .. }));
    }

    #[test]
    fn test_start_step_at_prd() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "t").unwrap();

        let outcome = engine.start_step("FEAT-1").unwrap();
        let start = match outcome {
            AdvanceOutcome::Started(s) => s,
            other => panic!("Expected Started, got {:?}", other),
        };
        assert_eq!(start.step, ArtifactKind::Prd);
        assert!(start.artifact_path.ends_with("PRD.md"));
        assert!(start.artifact_path.exists());
        assert_eq!(
            start.required_groups,
            vec![Group::Ba, Group::Design, Group::Dev]
        );
        assert_eq!(start.branch, "bmad/FEAT-1/prd");

        let stub = fs::read_to_string(&start.artifact_path).unwrap();
        assert!(stub.contains("`FEAT-1`"));
        assert!(stub.contains("`prd`"));

        // Exactly one new audit entry beyond creation, pointer unmoved.
        let state = InitiativeStore::new(WorkspaceConfig::new(dir.path().to_path_buf()))
            .load("FEAT-1")
            .unwrap();
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.current_step, "prd");
        assert_eq!(
            state.artifact(ArtifactKind::Prd).unwrap().status,
            ArtifactStatus::Drafting
        );
    }

    #[test]
    fn test_start_step_does_not_move_pointer_on_repeat() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "t").unwrap();

        engine.start_step("FEAT-1").unwrap();
        let outcome = engine.start_step("FEAT-1").unwrap();
        match outcome {
            AdvanceOutcome::Started(s) => assert_eq!(s.step, ArtifactKind::Prd),
            other => panic!("Expected Started, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_step_advances_in_catalog_order() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "t").unwrap();

        let outcome = engine.complete_step("FEAT-1").unwrap();
        assert_eq!(
            outcome,
            CompletionOutcome::Advanced {
                key: "FEAT-1".into(),
                approved: ArtifactKind::Prd,
                next: ArtifactKind::Ux,
            }
        );

        let store = InitiativeStore::new(WorkspaceConfig::new(dir.path().to_path_buf()));
        let state = store.load("FEAT-1").unwrap();
        assert_eq!(state.current_step, "ux");
        assert_eq!(
            state.artifact(ArtifactKind::Prd).unwrap().status,
            ArtifactStatus::Approved
        );
    }

    #[test]
    fn test_full_progression_reaches_terminal() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "t").unwrap();

        for expected in ArtifactKind::ORDER {
            match engine.start_step("FEAT-1").unwrap() {
                AdvanceOutcome::Started(s) => assert_eq!(s.step, expected),
                other => panic!("Expected Started, got {:?}", other),
            }
            engine.complete_step("FEAT-1").unwrap();
        }

        let store = InitiativeStore::new(WorkspaceConfig::new(dir.path().to_path_buf()));
        let state = store.load("FEAT-1").unwrap();
        assert!(state.is_complete());
        assert_eq!(state.current_step, "readiness");
        for kind in ArtifactKind::ORDER {
            assert_eq!(
                state.artifact(kind).unwrap().status,
                ArtifactStatus::Approved
            );
        }
    }

    #[test]
    fn test_terminal_operations_are_idempotent_no_ops() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "t").unwrap();
        for _ in ArtifactKind::ORDER {
            engine.complete_step("FEAT-1").unwrap();
        }

        let state_path = dir.path().join("_bmad-output/initiatives/FEAT-1/state.yaml");
        let before = fs::read_to_string(&state_path).unwrap();

        for _ in 0..3 {
            assert_eq!(
                engine.start_step("FEAT-1").unwrap(),
                AdvanceOutcome::Complete {
                    key: "FEAT-1".into()
                }
            );
            assert_eq!(
                engine.complete_step("FEAT-1").unwrap(),
                CompletionOutcome::AlreadyComplete {
                    key: "FEAT-1".into()
                }
            );
        }

        let after = fs::read_to_string(&state_path).unwrap();
        assert_eq!(before, after, "terminal calls must not touch state.yaml");
    }

    #[test]
    fn test_unknown_step_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "t").unwrap();

        let state_path = dir.path().join("_bmad-output/initiatives/FEAT-1/state.yaml");
        let mangled = fs::read_to_string(&state_path)
            .unwrap()
            .replace("current_step: prd", "current_step: vibes");
        fs::write(&state_path, mangled).unwrap();

        let err = engine.start_step("FEAT-1").unwrap_err();
        assert!(matches!(err, SignoffError::UnknownStep { .. }));
        let err = engine.complete_step("FEAT-1").unwrap_err();
        assert!(matches!(err, SignoffError::UnknownStep { .. }));

        // Other initiatives are unaffected.
        engine.create("FEAT-2", "t").unwrap();
        assert!(engine.start_step("FEAT-2").is_ok());
    }

    #[test]
    fn test_ticket_payloads_unknown_artifact() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        let err = engine
            .ticket_payloads("FEAT-1", "poetry", None)
            .unwrap_err();
        assert!(matches!(err, SignoffError::UnknownArtifact { .. }));
    }

    #[test]
    fn test_ticket_payloads_in_catalog_group_order() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        let payloads = engine
            .ticket_payloads("FEAT-1", "ux", Some("http://pr/1"))
            .unwrap();
        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].summary.ends_with("BA"));
        assert!(payloads[1].summary.ends_with("DESIGN"));
    }

    #[test]
    fn test_status_never_fails() {
        let dir = tempdir().unwrap();
        let bare = engine(dir.path());

        let report = bare.status(None);
        assert_eq!(report.governance, GovernanceStatus::NotConfigured);
        assert!(report.initiative.is_none());

        let report = bare.status(Some("NOPE"));
        assert_eq!(
            report.initiative,
            Some(InitiativeStatus::NotFound {
                key: "NOPE".into()
            })
        );
    }

    #[test]
    fn test_status_reports_progress() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        engine.create("FEAT-1", "Checkout revamp").unwrap();
        engine.complete_step("FEAT-1").unwrap();

        let report = engine.status(Some("FEAT-1"));
        match report.governance {
            GovernanceStatus::Configured {
                tracker_project_key,
                ba_leads,
                ..
            } => {
                assert_eq!(tracker_project_key, "PROJ");
                assert_eq!(ba_leads, vec!["alice"]);
            }
            other => panic!("Expected Configured, got {:?}", other),
        }
        match report.initiative.unwrap() {
            InitiativeStatus::Found {
                current_step,
                position,
                total,
                ..
            } => {
                assert_eq!(current_step, "ux");
                assert_eq!(position, 2);
                assert_eq!(total, 5);
            }
            other => panic!("Expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_status_with_corrupt_governance_degrades() {
        let dir = tempdir().unwrap();
        let engine = configured_engine(dir.path());
        fs::write(
            dir.path().join("_bmad-output/governance/governance.yaml"),
            "version: [broken",
        )
        .unwrap();

        let report = engine.status(None);
        assert!(matches!(
            report.governance,
            GovernanceStatus::Unreadable { .. }
        ));
    }
}
