mod cli;

use clap::Parser;
use console::style;
use std::process::ExitCode;

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli::dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} run aborted: {}", style("✗").red(), e);
            ExitCode::from(1)
        }
    }
}
