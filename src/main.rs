use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use signoff::config::WorkspaceConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "signoff")]
#[command(version, about = "Multi-party document sign-off orchestrator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root. Defaults to the current directory.
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Output directory for governance and initiative state.
    /// Defaults to <project-dir>/_bmad-output.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Emit the full structured response as JSON instead of a report.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show governance configuration and, optionally, one initiative's progress
    Status {
        /// Initiative key to include in the report
        key: Option<String>,
    },
    /// Configure group leads and the tracker project (full overwrite)
    SetupGovernance {
        /// BA lead handle (repeatable)
        #[arg(long = "ba-lead")]
        ba_leads: Vec<String>,
        /// Design lead handle (repeatable)
        #[arg(long = "design-lead")]
        design_leads: Vec<String>,
        /// Dev lead handle (repeatable)
        #[arg(long = "dev-lead")]
        dev_leads: Vec<String>,
        /// Issue-tracker project key (e.g. PROJ)
        #[arg(long)]
        tracker_project_key: String,
    },
    /// Create a new initiative (governance must be configured first)
    New {
        key: String,
        title: String,
    },
    /// Create the current step's artifact stub and report required signoffs
    Advance {
        key: String,
    },
    /// Record the current step as approved and move to the next
    Complete {
        key: String,
    },
    /// Compute signoff ticket payloads for an artifact
    Tickets {
        key: String,
        /// Artifact kind: prd, ux, architecture, epics_stories, readiness
        artifact: String,
        /// PR URL to embed in ticket descriptions
        #[arg(long)]
        pr_url: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("signoff=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = match cli.output_dir.clone() {
        Some(output_dir) => WorkspaceConfig::with_output_dir(project_dir, output_dir),
        None => WorkspaceConfig::new(project_dir),
    };

    match &cli.command {
        Commands::Status { key } => cmd::cmd_status(&config, key.as_deref(), cli.json),
        Commands::SetupGovernance {
            ba_leads,
            design_leads,
            dev_leads,
            tracker_project_key,
        } => cmd::cmd_setup_governance(
            &config,
            ba_leads.clone(),
            design_leads.clone(),
            dev_leads.clone(),
            tracker_project_key.clone(),
            cli.json,
        ),
        Commands::New { key, title } => cmd::cmd_new(&config, key, title, cli.json),
        Commands::Advance { key } => cmd::cmd_advance(&config, key, cli.json),
        Commands::Complete { key } => cmd::cmd_complete(&config, key, cli.json),
        Commands::Tickets {
            key,
            artifact,
            pr_url,
        } => cmd::cmd_tickets(&config, key, artifact, pr_url.as_deref(), cli.json),
    }
}
