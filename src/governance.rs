//! Governance policy document and its store.
//!
//! Governance is a per-project singleton naming the lead reviewers for
//! each stakeholder group and the external tracker project. It is created
//! by `configure` and immutable afterward except by re-running `configure`,
//! which fully replaces the document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tracing::{debug, info};

use crate::catalog::{ArtifactKind, Group};
use crate::config::WorkspaceConfig;
use crate::errors::SignoffError;

pub const GOVERNANCE_VERSION: u32 = 1;

fn default_signoff_issue_type() -> String {
    "Task".to_string()
}

/// Lead reviewers for one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadList {
    /// Reviewer handles (e.g. code-host usernames). May be empty; ticket
    /// payloads then carry no assignee.
    #[serde(default)]
    pub identities: Vec<String>,
    /// Matching tracker account ids, when known.
    #[serde(default)]
    pub tracker_account_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPolicy {
    pub leads: LeadList,
    /// External team reference (e.g. a code-host team slug).
    #[serde(default)]
    pub external_team_ref: String,
}

/// Exactly the three fixed groups. The struct shape enforces the
/// invariant: no group can be absent, none can be added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Groups {
    pub ba: GroupPolicy,
    pub design: GroupPolicy,
    pub dev: GroupPolicy,
}

impl Groups {
    pub fn get(&self, group: Group) -> &GroupPolicy {
        match group {
            Group::Ba => &self.ba,
            Group::Design => &self.design,
            Group::Dev => &self.dev,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTypes {
    #[serde(default = "default_signoff_issue_type")]
    pub signoff_request: String,
}

impl Default for IssueTypes {
    fn default() -> Self {
        Self {
            signoff_request: default_signoff_issue_type(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub project_key: String,
    #[serde(default)]
    pub issue_types: IssueTypes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignoffRule {
    pub required_groups: Vec<Group>,
}

/// The persisted governance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Governance {
    pub version: u32,
    pub groups: Groups,
    pub tracker: TrackerConfig,
    /// Redundant encoding of the compiled-in catalog, written for external
    /// readers of the YAML document. The engine never reads it back; the
    /// catalog is the source of truth.
    #[serde(default)]
    pub signoff_rules: BTreeMap<ArtifactKind, SignoffRule>,
}

impl Governance {
    /// Build a fresh governance document. Empty or duplicate lead lists
    /// are accepted; downstream behavior degrades to assignee-less ticket
    /// payloads.
    pub fn new(
        ba_leads: Vec<String>,
        design_leads: Vec<String>,
        dev_leads: Vec<String>,
        tracker_project_key: String,
    ) -> Self {
        let group = |identities: Vec<String>| GroupPolicy {
            leads: LeadList {
                identities,
                tracker_account_ids: Vec::new(),
            },
            external_team_ref: String::new(),
        };

        let signoff_rules = ArtifactKind::ORDER
            .iter()
            .map(|kind| {
                (
                    *kind,
                    SignoffRule {
                        required_groups: kind.required_groups().to_vec(),
                    },
                )
            })
            .collect();

        Self {
            version: GOVERNANCE_VERSION,
            groups: Groups {
                ba: group(ba_leads),
                design: group(design_leads),
                dev: group(dev_leads),
            },
            tracker: TrackerConfig {
                project_key: tracker_project_key,
                issue_types: IssueTypes::default(),
            },
            signoff_rules,
        }
    }

    pub fn leads(&self, group: Group) -> &[String] {
        &self.groups.get(group).leads.identities
    }

    /// First tracker account id for a group, when one is recorded.
    pub fn tracker_account(&self, group: Group) -> Option<&str> {
        self.groups
            .get(group)
            .leads
            .tracker_account_ids
            .first()
            .map(String::as_str)
    }

    pub fn signoff_issue_type(&self) -> &str {
        &self.tracker.issue_types.signoff_request
    }
}

/// Reads and writes the governance document under the workspace's output
/// directory.
pub struct GovernanceStore {
    config: WorkspaceConfig,
}

impl GovernanceStore {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config }
    }

    /// Existence check only; does not validate the document.
    pub fn is_configured(&self) -> bool {
        self.config.governance_file().exists()
    }

    /// Fully replace any prior governance document. Idempotent for
    /// identical inputs, not additive: prior leads are discarded.
    pub fn configure(
        &self,
        ba_leads: Vec<String>,
        design_leads: Vec<String>,
        dev_leads: Vec<String>,
        tracker_project_key: String,
    ) -> Result<Governance, SignoffError> {
        let governance = Governance::new(ba_leads, design_leads, dev_leads, tracker_project_key);
        let path = self.config.governance_file();

        fs::create_dir_all(self.config.governance_dir())
            .map_err(|e| SignoffError::storage(self.config.governance_dir(), e))?;
        let yaml = serde_yaml::to_string(&governance)
            .map_err(|e| SignoffError::corrupt(&path, e.to_string()))?;
        fs::write(&path, yaml).map_err(|e| SignoffError::storage(&path, e))?;

        info!(
            tracker_project = %governance.tracker.project_key,
            "governance configured"
        );
        Ok(governance)
    }

    /// Load the governance document. Absence is `Ok(None)`; an unparseable
    /// document is `CorruptState`, never a silent fallback to defaults.
    pub fn load(&self) -> Result<Option<Governance>, SignoffError> {
        let path = self.config.governance_file();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| SignoffError::storage(&path, e))?;
        let governance: Governance = serde_yaml::from_str(&content)
            .map_err(|e| SignoffError::corrupt(&path, e.to_string()))?;
        debug!(path = %path.display(), "governance loaded");
        Ok(Some(governance))
    }

    /// Load the governance document, failing with `GovernanceNotConfigured`
    /// when absent.
    pub fn require(&self) -> Result<Governance, SignoffError> {
        self.load()?.ok_or(SignoffError::GovernanceNotConfigured)
    }
}

/// Render the governance document for display, e.g. in status output.
pub fn describe(governance: &Governance) -> String {
    let leads = |group: Group| -> String {
        let list = governance.leads(group);
        if list.is_empty() {
            "(none)".to_string()
        } else {
            list.join(", ")
        }
    };
    format!(
        "Tracker project: {}\nBA leads:     {}\nDesign leads: {}\nDev leads:    {}",
        governance.tracker.project_key,
        leads(Group::Ba),
        leads(Group::Design),
        leads(Group::Dev),
    )
}
