//! Initiative lifecycle commands: new, advance, complete.

use anyhow::Result;

use signoff::config::WorkspaceConfig;
use signoff::ops::OpRequest;

pub fn cmd_new(config: &WorkspaceConfig, key: &str, title: &str, json: bool) -> Result<()> {
    super::emit(
        config,
        OpRequest::NewInitiative {
            key: key.to_string(),
            title: title.to_string(),
        },
        json,
    )
}

pub fn cmd_advance(config: &WorkspaceConfig, key: &str, json: bool) -> Result<()> {
    super::emit(
        config,
        OpRequest::Advance {
            key: key.to_string(),
        },
        json,
    )
}

pub fn cmd_complete(config: &WorkspaceConfig, key: &str, json: bool) -> Result<()> {
    super::emit(
        config,
        OpRequest::Complete {
            key: key.to_string(),
        },
        json,
    )
}
