//! Command line arguments for `anon`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use crate::ranges::JobIdRange;

#[derive(Parser)]
#[command(
    name = "anon",
    version,
    about = "Create and manage anonymization jobs",
    long_about = "Create and manage jobs on anonymization servers through their web API.\n\n\
                  Mappings in the current folder say which data to anonymize and how.\n\
                  Jobs created from a folder are tracked in a batch in that folder."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow pseudonyms and source identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Settings file to use (default: <home>/AnonWebAPIClientSettings.yml).
    #[arg(long, value_name = "PATH", env = "ANONAPI_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage anonymization servers.
    #[command(subcommand)]
    Server(ServerCommand),

    /// Manage anonymization jobs.
    #[command(subcommand)]
    Job(JobCommand),

    /// Manage API credentials.
    #[command(subcommand)]
    User(UserCommand),

    /// Manage the batch of jobs in the current folder.
    #[command(subcommand)]
    Batch(BatchCommand),

    /// Map source data to pseudonyms, descriptions and destinations.
    #[command(subcommand)]
    Map(MapCommand),

    /// Create jobs.
    #[command(subcommand)]
    Create(CreateCommand),
}

#[derive(Subcommand)]
pub enum ServerCommand {
    /// Add a server to the list of servers in settings.
    Add { short_name: String, url: String },
    /// Remove a server from the list in settings.
    Remove { short_name: String },
    /// Show all servers in settings.
    List,
    /// Use this server for subsequent commands.
    Activate { short_name: String },
    /// Check whether the active server responds like an anonymization web API.
    Status,
    /// List the latest jobs on the active server.
    Jobs,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Print info on one job.
    Info { job_id: u64 },
    /// Info on several jobs. Ranges like 5-15 are allowed.
    List {
        job_ids: Vec<JobIdRange>,
        /// Include pseudonyms and paths.
        #[arg(long)]
        extended: bool,
    },
    /// Reset a job so it is processed again.
    Reset { job_id: u64 },
    /// Set a job to inactive.
    Cancel { job_id: u64 },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Show current credentials.
    Info,
    /// Set the user name in settings.
    SetUsername { user_name: String },
    /// Generate and save a new API token.
    GetToken,
}

#[derive(Subcommand)]
pub enum BatchCommand {
    /// Save an empty batch for the active server in the current folder.
    Init,
    /// Show the batch in the current folder.
    Info,
    /// Delete the batch in the current folder.
    Delete,
    /// Add job ids to the batch. Ranges like 5-15 are allowed.
    Add { job_ids: Vec<JobIdRange> },
    /// Remove job ids from the batch. Ranges like 5-15 are allowed.
    Remove { job_ids: Vec<JobIdRange> },
    /// Status overview of every job in the batch.
    Status,
    /// Reset every job in the batch.
    Reset(ConfirmArgs),
    /// Cancel every job in the batch.
    Cancel(ConfirmArgs),
    /// Reset every job in the batch that has an error.
    ResetError(ConfirmArgs),
}

#[derive(Subcommand)]
pub enum MapCommand {
    /// Save an example mapping in the current folder.
    Init,
    /// Show the mapping in the current folder.
    Info,
    /// Delete the mapping in the current folder.
    Delete,
    /// Add folders to the mapping.
    AddStudyFolder {
        paths: Vec<PathBuf>,
        /// Read folders from the folder column of this file instead.
        #[arg(long = "input-file", value_name = "PATH", conflicts_with = "paths")]
        input_file: Option<PathBuf>,
    },
    /// Add file selections to the mapping.
    AddSelection { paths: Vec<PathBuf> },
    /// Add studies to retrieve from the PACS by accession number.
    AddAccessionNumbers {
        accession_numbers: Vec<String>,
        /// Read accession numbers and optional pseudonyms from this file
        /// instead.
        #[arg(
            long = "input-file",
            value_name = "PATH",
            conflicts_with = "accession_numbers"
        )]
        input_file: Option<PathBuf>,
    },
    /// Convert a mapping list in the old format into a mapping.
    Migrate {
        /// Old mapping list (default: the mapping in the current folder).
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CreateCommand {
    /// Create a job for every row in the mapping in the current folder.
    FromMapping {
        /// Do not send anything to the server, print what would be sent.
        #[arg(long = "dry-run")]
        dry_run: bool,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Set the project and destination used when a mapping does not set them.
    SetDefaults,
    /// Show the project and destination defaults.
    ShowDefaults,
}

#[derive(Args, Clone, Copy)]
pub struct ConfirmArgs {
    /// Do not ask for confirmation.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_job_id_ranges() {
        let cli = Cli::try_parse_from(["anon", "batch", "add", "1-3", "7"]).unwrap();
        let Command::Batch(BatchCommand::Add { job_ids }) = cli.command else {
            panic!("expected batch add");
        };
        assert_eq!(crate::ranges::flatten(&job_ids), vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_create_flags() {
        let cli = Cli::try_parse_from(["anon", "create", "from-mapping", "--dry-run", "-y"]).unwrap();
        let Command::Create(CreateCommand::FromMapping { dry_run, confirm }) = cli.command else {
            panic!("expected create from-mapping");
        };
        assert!(dry_run);
        assert!(confirm.yes);
    }
}
