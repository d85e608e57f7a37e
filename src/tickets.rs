//! Signoff ticket payload generation.
//!
//! Pure functions mapping (initiative, artifact, governance) to the set of
//! ticket-creation requests an external tracker integration would submit.
//! Nothing here touches storage; the same inputs always produce the same
//! output, in the catalog's required-group order.

use serde::{Deserialize, Serialize};

use crate::catalog::ArtifactKind;
use crate::governance::Governance;

/// The placeholder embedded in descriptions while no PR exists yet.
pub const PENDING_PR: &str = "(pending)";

/// One ticket-creation request for an external issue tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub summary: String,
    pub project_key: String,
    pub issue_type: String,
    pub labels: Vec<String>,
    pub description: String,
    /// Tracker account id of the group's first lead, when governance
    /// records one. Absent when the lead list is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// Build one ticket request per required group of `kind`, in catalog
/// order.
pub fn generate(
    key: &str,
    kind: ArtifactKind,
    pr_url: Option<&str>,
    governance: &Governance,
) -> Vec<TicketRequest> {
    let pr = pr_url.unwrap_or(PENDING_PR);

    kind.required_groups()
        .iter()
        .map(|group| {
            let group_upper = group.as_str().to_uppercase();
            TicketRequest {
                summary: format!(
                    "[BMAD][{key}][{kind}] Signoff required — {group_upper}"
                ),
                project_key: governance.tracker.project_key.clone(),
                issue_type: governance.signoff_issue_type().to_string(),
                labels: vec![
                    "bmad".to_string(),
                    format!("initiative-{key}"),
                    format!("artifact-{kind}"),
                    format!("group-{group}"),
                ],
                description: format!(
                    "BMAD signoff requested (lead-only).\n\n\
                     Initiative: {key}\n\
                     Artifact: {}\n\
                     Group: {group_upper}\n\n\
                     PR: {pr}\n\n\
                     Action: Approve the PR to sign off.",
                    kind.as_str().to_uppercase()
                ),
                assignee: governance.tracker_account(*group).map(str::to_string),
            }
        })
        .collect()
}
