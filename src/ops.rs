//! Operation surface: thin request/response dispatch over the engine.
//!
//! This is the boundary a calling agent talks to. Every request produces a
//! structured `OpResponse`. Errors, whether expected precondition
//! violations or unexpected storage failures, are folded into `ok = false`
//! with a message. Nothing panics and nothing propagates an error across
//! this boundary.

use serde::{Deserialize, Serialize};

use crate::config::WorkspaceConfig;
use crate::engine::{
    AdvanceOutcome, CompletionOutcome, GovernanceStatus, InitiativeStatus, ProgressionEngine,
    StatusReport,
};
use crate::errors::SignoffError;
use crate::governance;
use crate::tickets::TicketRequest;

/// One operation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpRequest {
    Status {
        #[serde(default)]
        initiative_key: Option<String>,
    },
    SetupGovernance {
        ba_leads: Vec<String>,
        design_leads: Vec<String>,
        dev_leads: Vec<String>,
        tracker_project_key: String,
    },
    NewInitiative {
        key: String,
        title: String,
    },
    Advance {
        key: String,
    },
    Complete {
        key: String,
    },
    CreateTicketPayloads {
        key: String,
        artifact: String,
        #[serde(default)]
        pr_url: Option<String>,
    },
}

/// Structured response for every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpResponse {
    pub ok: bool,
    /// Human-readable report, ready to print.
    pub report: String,
    /// Machine-readable payload for the operation, when it has one.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl OpResponse {
    fn success(report: String, data: serde_json::Value) -> Self {
        Self {
            ok: true,
            report,
            data,
        }
    }

    fn failure(err: &SignoffError) -> Self {
        Self {
            ok: false,
            report: format!("Error: {err}"),
            data: serde_json::Value::Null,
        }
    }
}

/// Dispatch one request against the workspace. Never panics; never
/// returns an error.
pub fn dispatch(config: &WorkspaceConfig, request: OpRequest) -> OpResponse {
    let engine = ProgressionEngine::new(config.clone());
    match request {
        OpRequest::Status { initiative_key } => {
            let report = engine.status(initiative_key.as_deref());
            let text = render_status(&report);
            OpResponse::success(text, to_value(&report))
        }
        OpRequest::SetupGovernance {
            ba_leads,
            design_leads,
            dev_leads,
            tracker_project_key,
        } => {
            match engine.governance_store().configure(
                ba_leads,
                design_leads,
                dev_leads,
                tracker_project_key,
            ) {
                Ok(gov) => {
                    let text = format!(
                        "Governance configured.\n\n{}\n\nYou can now create initiatives with `signoff new`.",
                        governance::describe(&gov)
                    );
                    OpResponse::success(text, to_value(&gov))
                }
                Err(e) => OpResponse::failure(&e),
            }
        }
        OpRequest::NewInitiative { key, title } => match engine.create(&key, &title) {
            Ok(initiative) => {
                let text = format!(
                    "Initiative created.\n\n\
                     Key: {}\nTitle: {}\nCurrent step: {}\n\n\
                     Next: run `signoff advance {}` to create the PRD artifact stub.",
                    initiative.key, initiative.title, initiative.current_step, initiative.key
                );
                OpResponse::success(text, to_value(&initiative))
            }
            Err(e) => OpResponse::failure(&e),
        },
        OpRequest::Advance { key } => match engine.start_step(&key) {
            Ok(outcome) => {
                let text = render_advance(&outcome);
                OpResponse::success(text, to_value(&outcome))
            }
            Err(e) => OpResponse::failure(&e),
        },
        OpRequest::Complete { key } => match engine.complete_step(&key) {
            Ok(outcome) => {
                let text = render_completion(&outcome);
                OpResponse::success(text, to_value(&outcome))
            }
            Err(e) => OpResponse::failure(&e),
        },
        OpRequest::CreateTicketPayloads {
            key,
            artifact,
            pr_url,
        } => match engine.ticket_payloads(&key, &artifact, pr_url.as_deref()) {
            Ok(payloads) => {
                let text = render_tickets(&key, &artifact, &payloads);
                OpResponse::success(text, to_value(&payloads))
            }
            Err(e) => OpResponse::failure(&e),
        },
    }
}

fn to_value<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn render_status(report: &StatusReport) -> String {
    let mut out = String::from("Signoff Status\n==============\n\n");

    match &report.governance {
        GovernanceStatus::NotConfigured => {
            out.push_str("Governance: not configured (run `signoff setup-governance` first)\n");
        }
        GovernanceStatus::Configured {
            tracker_project_key,
            ba_leads,
            design_leads,
            dev_leads,
        } => {
            let join = |leads: &[String]| {
                if leads.is_empty() {
                    "(none)".to_string()
                } else {
                    leads.join(", ")
                }
            };
            out.push_str("Governance: configured\n");
            out.push_str(&format!("  Tracker project: {tracker_project_key}\n"));
            out.push_str(&format!("  BA leads:     {}\n", join(ba_leads)));
            out.push_str(&format!("  Design leads: {}\n", join(design_leads)));
            out.push_str(&format!("  Dev leads:    {}\n", join(dev_leads)));
        }
        GovernanceStatus::Unreadable { reason } => {
            out.push_str(&format!("Governance: unreadable ({reason})\n"));
        }
    }

    match &report.initiative {
        None => {}
        Some(InitiativeStatus::NotFound { key }) => {
            out.push_str(&format!("\nInitiative {key} not found.\n"));
        }
        Some(InitiativeStatus::Unreadable { key, reason }) => {
            out.push_str(&format!("\nInitiative {key}: unreadable ({reason})\n"));
        }
        Some(InitiativeStatus::Found {
            key,
            title,
            phase,
            current_step,
            position,
            total,
            step_chain,
        }) => {
            out.push_str(&format!("\nInitiative: {key}\n"));
            out.push_str(&format!("  Title: {title}\n"));
            out.push_str(&format!("  Phase: {}\n", phase.as_str()));
            out.push_str(&format!("  Current step: {current_step}\n"));
            out.push_str(&format!(
                "  Progress: {position}/{total} ({step_chain})\n"
            ));
        }
    }
    out
}

fn render_advance(outcome: &AdvanceOutcome) -> String {
    match outcome {
        AdvanceOutcome::Complete { key } => format!(
            "Initiative {key} is complete. All artifacts have been signed off."
        ),
        AdvanceOutcome::Started(start) => {
            let groups = start
                .required_groups
                .iter()
                .map(|g| g.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Artifact stub created.\n\n\
                 Initiative: {}\n\
                 Step: {}\n\
                 Artifact: {}\n\
                 Required signoffs: {groups}\n\
                 Suggested branch: {}\n\n\
                 Next steps:\n\
                   1. Open a PR for branch {}\n\
                   2. Generate signoff tickets: signoff tickets {} {} --pr-url <url>\n\
                   3. Request reviews from the group leads\n\
                   4. After the PR merges, run: signoff complete {}",
                start.key,
                start.step.as_str().to_uppercase(),
                start.artifact_path.display(),
                start.branch,
                start.branch,
                start.key,
                start.step,
                start.key,
            )
        }
    }
}

fn render_completion(outcome: &CompletionOutcome) -> String {
    match outcome {
        CompletionOutcome::AlreadyComplete { key } => format!(
            "Initiative {key} is complete. All artifacts have been signed off."
        ),
        CompletionOutcome::Advanced {
            key,
            approved,
            next,
        } => format!(
            "{} approved for {key}. Current step is now {next}.\n\
             Run `signoff advance {key}` to create the next artifact stub.",
            approved.as_str().to_uppercase(),
        ),
        CompletionOutcome::Finished { key, approved } => format!(
            "{} approved. Initiative {key} is complete: all artifacts have been signed off.",
            approved.as_str().to_uppercase(),
        ),
    }
}

fn render_tickets(key: &str, artifact: &str, payloads: &[TicketRequest]) -> String {
    let mut out = format!(
        "Signoff tickets to create for {key} / {artifact}\n\n"
    );
    for ticket in payloads {
        out.push_str(&format!("### {}\n", ticket.summary));
        out.push_str(&format!("- Project: {}\n", ticket.project_key));
        out.push_str(&format!("- Type: {}\n", ticket.issue_type));
        out.push_str(&format!("- Labels: {}\n", ticket.labels.join(", ")));
        if let Some(assignee) = &ticket.assignee {
            out.push_str(&format!("- Assignee: {assignee}\n"));
        }
        out.push_str(&format!("- Description:\n```\n{}\n```\n\n", ticket.description));
    }
    out
}
