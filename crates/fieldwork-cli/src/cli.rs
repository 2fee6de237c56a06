use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldwork_core::models::WorkStatus;

#[derive(Parser)]
#[command(name = "fieldwork")]
#[command(about = "Record field inspections, offline when the network is not there")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the offline queue database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Works API base URL (e.g. <https://works.example.gov.in/api>)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token sent to the works API
    #[arg(long, global = true, value_name = "TOKEN")]
    pub access_token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit an inspection for a work
    Submit(SubmitArgs),
    /// List updates waiting in the offline queue
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deliver queued updates to the works API
    Sync {
        /// Output the sync report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every queued update without sending it
    Clear {
        /// Confirm that queued updates will be lost
        #[arg(long)]
        yes: bool,
    },
    /// Show or write client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Identifier of the inspected work
    pub work_id: i64,
    /// Observed work status
    #[arg(short, long, value_parser = parse_status)]
    pub status: WorkStatus,
    /// Site photo
    #[arg(short, long, value_name = "PATH")]
    pub photo: PathBuf,
    /// Free-text remarks
    #[arg(short, long, default_value = "")]
    pub remarks: String,
    /// Manual latitude, used when GPS is unavailable
    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    /// Manual longitude, used when GPS is unavailable
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    /// Skip the GPS command even when one is configured
    #[arg(long)]
    pub no_gps: bool,
    /// What to do if the network request fails
    #[arg(long, value_enum, default_value_t = OfflineMode::Ask)]
    pub offline: OfflineMode,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OfflineMode {
    /// Prompt on the terminal
    Ask,
    /// Save to the offline queue
    Always,
    /// Drop the update
    Never,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write values to the config file
    ///
    /// Also stores the global --api-url, --access-token and --db-path values.
    Init {
        /// Command printing a JSON GPS fix (e.g. "termux-location -p gps")
        #[arg(long, value_name = "COMMAND")]
        gps_command: Option<String>,
        /// Seconds to wait for a GPS fix
        #[arg(long, value_name = "SECS")]
        gps_timeout_secs: Option<u64>,
    },
}

fn parse_status(raw: &str) -> Result<WorkStatus, String> {
    raw.parse::<WorkStatus>().map_err(|error| error.to_string())
}
