//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module        | Commands handled             |
//! |---------------|------------------------------|
//! | `status`      | `Status`                     |
//! | `governance`  | `SetupGovernance`            |
//! | `initiative`  | `New`, `Advance`, `Complete` |
//! | `tickets`     | `Tickets`                    |
//!
//! Every command goes through the operation surface (`ops::dispatch`) and
//! prints the structured response, so the CLI and an embedding agent see
//! identical behavior.

pub mod governance;
pub mod initiative;
pub mod status;
pub mod tickets;

pub use governance::cmd_setup_governance;
pub use initiative::{cmd_advance, cmd_complete, cmd_new};
pub use status::cmd_status;
pub use tickets::cmd_tickets;

use anyhow::Result;

use signoff::config::WorkspaceConfig;
use signoff::ops::{self, OpRequest};

/// Dispatch one request, print its response, and fail the process on a
/// failed operation so scripts can branch on the exit code.
pub(crate) fn emit(config: &WorkspaceConfig, request: OpRequest, json: bool) -> Result<()> {
    let response = ops::dispatch(config, request);
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if response.ok {
        println!("{}", response.report);
    } else {
        eprintln!("{}", console::style(&response.report).red());
    }
    if !response.ok {
        anyhow::bail!("operation failed");
    }
    Ok(())
}
