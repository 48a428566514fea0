pub mod check;
pub mod hash;
pub mod status;

use clap::{Parser, Subcommand};
use fixity_lib::{Config, Overrides, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fixity")]
#[command(about = "Hash a directory tree, keep a baseline, report what changed", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to baseline file")]
    pub baseline: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to audit log file")]
    pub audit_log: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'q', global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Scan a directory, compare with the baseline and store the new baseline")]
    Check {
        #[arg(help = "Directory to scan (prompted for when omitted)")]
        root: Option<PathBuf>,

        #[arg(long, help = "Hash algorithm (sha256, sha512, blake3, md5)")]
        algorithm: Option<String>,

        #[arg(long, value_name = "GLOB", help = "Skip paths matching this pattern (repeatable)")]
        exclude: Vec<String>,

        #[arg(long, help = "Follow symbolic links")]
        follow_symlinks: bool,

        #[arg(long, value_name = "N", help = "Descend at most N directory levels below the root")]
        max_depth: Option<usize>,

        #[arg(long, help = "Leave out files and directories whose name starts with '.'")]
        skip_hidden: bool,

        #[arg(long, help = "Treat an unreadable baseline as empty instead of aborting")]
        discard_corrupt: bool,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,

        #[arg(long, help = "Exit with status 2 when changes are detected")]
        strict: bool,
    },

    #[command(about = "Show the stored baseline")]
    Status,

    #[command(about = "Print the digest of a single file")]
    Hash {
        #[arg(help = "File to hash")]
        file: PathBuf,

        #[arg(long, help = "Hash algorithm (sha256, sha512, blake3, md5)")]
        algorithm: Option<String>,
    },
}

/// Global flags shared by every subcommand.
pub struct GlobalArgs {
    pub baseline: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn load_config(&self, overrides: Overrides) -> Result<Config> {
        let overrides = Overrides {
            baseline: self.baseline.clone(),
            audit_log: self.audit_log.clone(),
            ..overrides
        };
        Config::new(self.config.clone(), overrides)
    }
}

pub fn dispatch(cli: Cli) -> Result<ExitCode> {
    let globals = GlobalArgs {
        baseline: cli.baseline,
        config: cli.config,
        audit_log: cli.audit_log,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Check {
            root,
            algorithm,
            exclude,
            follow_symlinks,
            max_depth,
            skip_hidden,
            discard_corrupt,
            json,
            strict,
        } => check::handle_check_command(
            &globals,
            check::CheckArgs {
                root,
                algorithm,
                exclude,
                follow_symlinks,
                max_depth,
                skip_hidden,
                discard_corrupt,
                json,
                strict,
            },
        ),

        Commands::Status => status::handle_status_command(&globals).map(|_| ExitCode::SUCCESS),

        Commands::Hash { file, algorithm } => {
            hash::handle_hash_command(&globals, &file, algorithm).map(|_| ExitCode::SUCCESS)
        }
    }
}
