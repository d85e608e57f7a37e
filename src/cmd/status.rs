//! Status command.

use anyhow::Result;

use signoff::config::WorkspaceConfig;
use signoff::ops::OpRequest;

pub fn cmd_status(config: &WorkspaceConfig, key: Option<&str>, json: bool) -> Result<()> {
    super::emit(
        config,
        OpRequest::Status {
            initiative_key: key.map(str::to_string),
        },
        json,
    )
}
