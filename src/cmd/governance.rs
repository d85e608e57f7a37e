//! Governance setup command.

use anyhow::Result;

use signoff::config::WorkspaceConfig;
use signoff::ops::OpRequest;

pub fn cmd_setup_governance(
    config: &WorkspaceConfig,
    ba_leads: Vec<String>,
    design_leads: Vec<String>,
    dev_leads: Vec<String>,
    tracker_project_key: String,
    json: bool,
) -> Result<()> {
    super::emit(
        config,
        OpRequest::SetupGovernance {
            ba_leads,
            design_leads,
            dev_leads,
            tracker_project_key,
        },
        json,
    )
}
