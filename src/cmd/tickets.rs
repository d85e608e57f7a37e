//! Ticket payload command.

use anyhow::Result;

use signoff::config::WorkspaceConfig;
use signoff::ops::OpRequest;

pub fn cmd_tickets(
    config: &WorkspaceConfig,
    key: &str,
    artifact: &str,
    pr_url: Option<&str>,
    json: bool,
) -> Result<()> {
    super::emit(
        config,
        OpRequest::CreateTicketPayloads {
            key: key.to_string(),
            artifact: artifact.to_string(),
            pr_url: pr_url.map(str::to_string),
        },
        json,
    )
}
