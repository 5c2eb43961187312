//! CLI module for cfgload
//!
//! Argument parsing, operator output and the commit prompt. Mutually
//! exclusive flag groups collapse into a single enum per group here, so
//! nothing downstream ever sees two load modes at once.

pub mod output;
pub mod prompt;

use clap::{Args, Parser};
use std::path::PathBuf;

use crate::app::LoadRequest;
use crate::error::{EXIT_SUCCESS, EXIT_USAGE};
use crate::transaction::{CommitMode, LoadMode};

/// cfgload - load a configuration onto a Junos device
///
/// Locks the configuration, loads the candidate, shows the differences
/// and commits after confirmation.
#[derive(Parser, Debug, Clone)]
#[command(name = "cfgload")]
#[command(version)]
#[command(about = "Guarded configuration loads for Junos devices", long_about = None)]
pub struct Cli {
    /// Target device (address, or hostname in the inventory)
    pub host: String,

    /// Credentials file
    #[arg(short = 'i', long)]
    pub cfgfile: PathBuf,

    /// Configuration file or template to load
    #[arg(short = 'c', long)]
    pub loadfile: PathBuf,

    /// JSON variable file; renders the load file as a template
    #[arg(short = 't', long)]
    pub varfile: Option<PathBuf>,

    /// Commit comment
    #[arg(short = 'm', long)]
    pub comment: Option<String>,

    /// Commit without asking
    #[arg(short = 'y', long)]
    pub noprompt: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub load_mode: LoadModeArgs,

    /// Ignore warnings while loading
    #[arg(short = 'w', long)]
    pub nowarn: bool,

    /// Do not lock the configuration
    #[arg(short = 'l', long)]
    pub nolock: bool,

    /// NETCONF port (overrides credentials and settings)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Connection timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Settings file
    #[arg(long, env = "CFGLOAD_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Candidate database scope flags
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct DatabaseArgs {
    /// Shared candidate database (default)
    #[arg(long)]
    pub shared: bool,

    /// Private candidate database
    #[arg(long)]
    pub private: bool,

    /// Exclusive candidate database
    #[arg(long)]
    pub exclusive: bool,
}

impl DatabaseArgs {
    /// The selected scope
    pub fn mode(&self) -> CommitMode {
        if self.private {
            CommitMode::Private
        } else if self.exclusive {
            CommitMode::Exclusive
        } else {
            CommitMode::Shared
        }
    }
}

/// Load mode flags
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct LoadModeArgs {
    /// Replace matching configuration (default)
    #[arg(long)]
    pub replace: bool,

    /// Merge with the existing configuration
    #[arg(long)]
    pub merge: bool,

    /// Override the whole configuration
    #[arg(long = "override")]
    pub override_: bool,

    /// Update only what differs
    #[arg(long)]
    pub update: bool,
}

impl LoadModeArgs {
    /// The selected load mode
    pub fn mode(&self) -> LoadMode {
        if self.merge {
            LoadMode::Merge
        } else if self.override_ {
            LoadMode::Override
        } else if self.update {
            LoadMode::Update
        } else {
            LoadMode::Replace
        }
    }
}

impl Cli {
    /// Parse command-line arguments, exiting 2 on usage errors
    pub fn parse_args() -> Self {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                // --help and --version also arrive here
                let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
                let _ = e.print();
                std::process::exit(code);
            }
        }
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// The load this invocation asks for
    pub fn request(&self) -> LoadRequest {
        LoadRequest {
            host: self.host.clone(),
            cfgfile: self.cfgfile.clone(),
            loadfile: self.loadfile.clone(),
            varfile: self.varfile.clone(),
            comment: self.comment.clone(),
            commit_mode: self.database.mode(),
            load_mode: self.load_mode.mode(),
            ignore_warnings: self.nowarn,
            lock: !self.nolock,
            port: self.port,
        }
    }
}
