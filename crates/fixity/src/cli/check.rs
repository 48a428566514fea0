use super::GlobalArgs;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use fixity_lib::util::{create_spinner, format_bytes, format_duration_ms};
use fixity_lib::{
    AuditLog, BaselineStore, CheckOptions, CheckReport, Checker, CorruptPolicy, FixityError,
    LogReporter, Overrides, Reporter, Result, ScanFailure, ScanOptions, Tee,
};
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub struct CheckArgs {
    pub root: Option<PathBuf>,
    pub algorithm: Option<String>,
    pub exclude: Vec<String>,
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub skip_hidden: bool,
    pub discard_corrupt: bool,
    pub json: bool,
    pub strict: bool,
}

/// Terminal feedback while a check runs.
struct ConsoleReporter {
    spinner: Option<ProgressBar>,
}

impl ConsoleReporter {
    fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn file_started(&mut self, path: &Path) {
        if let Some(spinner) = &self.spinner {
            spinner.inc(1);
            spinner.set_message(format!("Hashing {}", path.display()));
        }
    }

    fn baseline_discarded(&mut self, error: &FixityError) {
        let message = format!(
            "{} {} (starting from an empty baseline)",
            style("!").yellow(),
            error
        );
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", message)),
            None => eprintln!("{}", message),
        }
    }
}

pub fn handle_check_command(globals: &GlobalArgs, args: CheckArgs) -> Result<ExitCode> {
    let root = match args.root {
        Some(root) => root,
        None => prompt_for_root()?,
    };

    let config = globals.load_config(Overrides {
        algorithm: args.algorithm,
        exclude: args.exclude,
        follow_symlinks: args.follow_symlinks,
        max_depth: args.max_depth,
        skip_hidden: args.skip_hidden,
        ..Default::default()
    })?;

    let options = CheckOptions {
        scan: ScanOptions {
            algorithm: config.algorithm,
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
            include_hidden: config.include_hidden,
            exclude: config.exclude.clone(),
            ..Default::default()
        },
        corrupt_policy: if args.discard_corrupt {
            CorruptPolicy::TreatAsEmpty
        } else {
            CorruptPolicy::Abort
        },
        state_files: vec![config.audit_log_path.clone()],
    };

    let checker = Checker::new(BaselineStore::new(config.baseline_path.clone()), options);
    let audit = AuditLog::open(&config.audit_log_path)?;

    let show_progress = !globals.quiet && !args.json;
    if show_progress {
        println!(
            "{} Scanning {} ({})...",
            style(">>>").cyan(),
            style(root.display()).bold(),
            config.algorithm
        );
    }

    let console = ConsoleReporter {
        spinner: show_progress.then(|| create_spinner("Hashing")),
    };
    let mut reporter = Tee(Tee(console, LogReporter), audit);

    let result = checker.run(&root, &mut reporter);
    reporter.0 .0.finish();
    let report = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !globals.quiet {
        print_report(&report, globals.verbose, reporter.1.path());
    } else if let Some(notice) = unreadable_notice(&report) {
        eprintln!("{} {}", style("!").yellow(), notice);
    }

    if args.strict && report.has_changes() {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// One-line summary of files left out of the baseline, for quiet runs.
fn unreadable_notice(report: &CheckReport) -> Option<String> {
    match report.unreadable_count() {
        0 => None,
        n => Some(format!("scan completed with {} unreadable files", n)),
    }
}

fn prompt_for_root() -> Result<PathBuf> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter the directory path to scan")
        .interact_text()?;
    Ok(PathBuf::from(answer.trim()))
}

fn print_report(report: &CheckReport, verbose: bool, audit_log: &Path) {
    println!("\n{}", style("Scan Results").bold().cyan());
    println!("  Modified files: {}", count(report.diff.modified.len()));
    println!("  Missing files: {}", count(report.diff.missing.len()));
    println!("  New files: {}", count(report.diff.added.len()));
    println!("  Unchanged files: {}", style(report.unchanged).dim());

    if report.baseline_discarded {
        println!(
            "  {}",
            style("Previous baseline was unreadable and has been replaced").yellow()
        );
    }

    print_paths("Modified Files", &report.diff.modified, style("~").yellow());
    print_paths("Missing Files", &report.diff.missing, style("×").red());

    if report.baseline_existed || verbose {
        print_paths("New Files", &report.diff.added, style("+").green());
    } else {
        println!(
            "\n{} No previous baseline: recorded {} files as the new baseline",
            style("·").dim(),
            report.file_count
        );
    }

    if !report.failures.is_empty() {
        print_failures(&report.failures);
    }

    if verbose {
        println!("\n{}", style("Statistics").bold());
        println!("  Files hashed: {}", report.stats.files_hashed);
        println!("  Directories: {}", report.stats.dirs_scanned);
        println!("  Data hashed: {}", format_bytes(report.stats.bytes_hashed));
        println!("  Symlinks skipped: {}", report.stats.symlinks_skipped);
        println!("  Excluded: {}", report.stats.excluded);
    }

    println!(
        "\n{} Scan completed in {}. Baseline saved to {}; results logged in {}",
        style("✓").green(),
        format_duration_ms(report.duration_ms),
        report.baseline_path,
        audit_log.display()
    );
}

fn count(n: usize) -> console::StyledObject<usize> {
    if n == 0 {
        style(n).dim()
    } else {
        style(n).bold()
    }
}

fn print_paths(title: &str, paths: &BTreeSet<String>, marker: console::StyledObject<&str>) {
    if paths.is_empty() {
        return;
    }

    println!("\n{}", style(title).bold());
    for path in paths {
        println!("  {} {}", marker, path);
    }
}

fn print_failures(failures: &[ScanFailure]) {
    println!(
        "\n{}",
        style(format!(
            "Scan completed with {} unreadable files (left out of the baseline)",
            failures.len()
        ))
        .yellow()
        .bold()
    );
    for failure in failures {
        println!("  {} {}: {}", style("!").yellow(), failure.path, failure.reason);
    }
}
