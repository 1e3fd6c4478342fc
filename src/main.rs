//! commonlink - keep a project directory hardlinked to a common directory.
//!
//! Usage:
//!   commonlink [COMMON_DIR]          Link common files into the project
//!   commonlink unlink [COMMON_DIR]   Turn links back into independent copies
//!   commonlink --help                Show help

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commonlink_core::{
    Category, DEFAULT_FILE_LIMIT, DEFAULT_TIME_LIMIT, Environment, RelativePath, SyncConfig,
    SyncError,
};
use commonlink_ops::OperationProgress;
use commonlink_sync::{
    Operation, SyncObserver, SyncOrchestrator, SyncOutcome, SyncPlan, SyncReport,
    TerminalConfirm, sample,
};

/// Number of sample paths listed per category.
const SAMPLE_SIZE: usize = 10;

#[derive(Parser)]
#[command(
    name = "commonlink",
    version,
    about = "Hardlink files from a common directory into a project",
    long_about = "commonlink replaces files in a project directory with hardlinks to \
                  their counterparts in a common directory, so edits on either side \
                  show up in both.\n\n\
                  Files that differ are left untouched. Run `commonlink unlink` to \
                  turn the links back into independent copies.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    args: SyncArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Replace linked project files with independent copies
    Unlink {
        #[command(flatten)]
        args: SyncArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct SyncArgs {
    /// Common directory (same as --common-dir)
    #[arg(value_name = "COMMON_DIR")]
    common: Option<PathBuf>,

    /// Common directory holding the source-of-truth files
    #[arg(short = 'c', long = "common-dir", value_name = "DIR", conflicts_with = "common")]
    common_dir: Option<PathBuf>,

    /// Project directory receiving the links
    #[arg(short = 'p', long = "project-dir", value_name = "DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Fail if more files than this are found
    #[arg(long, value_name = "N", default_value_t = DEFAULT_FILE_LIMIT)]
    file_limit: usize,

    /// Fail if finding files takes longer than this
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIME_LIMIT)]
    time_limit: u64,

    /// Extra ignore pattern (glob, wildcard or substring); repeatable
    #[arg(short = 'i', long = "ignored", value_name = "PATTERN")]
    ignored: Vec<String>,

    /// Extra gitignore-like file to read patterns from; repeatable
    #[arg(short = 'g', long = "gitignore", value_name = "FILE")]
    gitignore: Vec<PathBuf>,

    /// Don't prompt for confirmation
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Don't check the project for uncommitted changes
    #[arg(long)]
    no_git_check: bool,

    /// Show what would change without changing anything
    #[arg(short = 'd', long = "dry")]
    dry: bool,

    /// Number of concurrent workers (defaults to the number of CPUs)
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl SyncArgs {
    fn to_config(&self) -> Result<SyncConfig, SyncError> {
        let mut builder = SyncConfig::builder();
        if let Some(dir) = self.common_dir.as_ref().or(self.common.as_ref()) {
            builder.common_dir(dir.clone());
        }
        builder
            .project_dir(self.project_dir.clone())
            .ignored(self.ignored.clone())
            .gitignore_files(self.gitignore.clone())
            .file_limit(self.file_limit)
            .time_limit(self.time_limit)
            .dry_run(self.dry)
            .auto_confirm(self.yes)
            .skip_dirty_check(self.no_git_check);
        if let Some(jobs) = self.jobs {
            builder.concurrency(jobs);
        }
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (operation, args) = match cli.command {
        Some(Command::Unlink { args }) => (Operation::Unlink, args),
        None => (Operation::Link, cli.args),
    };

    init_tracing(args.verbose)?;

    let code = run(operation, &args).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Install a stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

/// Run one workflow and return the process exit code.
async fn run(operation: Operation, args: &SyncArgs) -> Result<i32> {
    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => return Ok(fail(&e)),
    };

    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let env = Environment::new(cwd, dirs::home_dir());

    let orchestrator = SyncOrchestrator::new(config, env)
        .with_confirm(Arc::new(TerminalConfirm))
        .with_observer(Arc::new(ConsoleObserver {
            format: args.format,
        }));

    match orchestrator.run(operation).await {
        Ok(report) => {
            match args.format {
                OutputFormat::Text => print_outcome(&report),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
            Ok(report.exit_code())
        }
        Err(e) if e.is_internal() => Err(e).context("commonlink failed"),
        Err(e) => Ok(fail(&e)),
    }
}

fn fail(error: &SyncError) -> i32 {
    eprintln!("error: {error}");
    error.exit_code()
}

/// Prints the plan in text mode so it is visible before the prompt, and
/// a progress line on an interactive stderr while mutating.
struct ConsoleObserver {
    format: OutputFormat,
}

impl SyncObserver for ConsoleObserver {
    fn on_plan(&self, plan: &SyncPlan) {
        if self.format == OutputFormat::Text {
            print_plan(plan);
        }
    }

    fn on_progress(&self, progress: &OperationProgress) {
        let mut stderr = std::io::stderr();
        if self.format != OutputFormat::Text || !stderr.is_terminal() {
            return;
        }
        let _ = write!(stderr, "\r{}", progress_line(progress));
        if progress.files_completed >= progress.files_total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

fn progress_line(progress: &OperationProgress) -> String {
    let mut line = format!(
        "[{:>3.0}%] {}/{} files, {}",
        progress.percentage(),
        progress.files_completed,
        progress.files_total,
        format_size(progress.bytes_processed)
    );
    if progress.has_errors() {
        line.push_str(&format!(", {} failed", progress.errors.len()));
    }
    line
}

fn print_plan(plan: &SyncPlan) {
    let classification = &plan.classification;

    println!("{} files found", plan.files_found);
    if !plan.warnings.is_empty() {
        eprintln!("{} path(s) could not be read", plan.warnings.len());
    }

    match plan.operation {
        Operation::Link => {
            let sections = [
                (Category::Different, "different files will be left untouched"),
                (Category::Linked, "files are already linked"),
                (Category::Same, "identical files will be linked"),
                (Category::NoExist, "non-existing files will be linked"),
            ];
            for (category, label) in sections {
                let paths = classification.get(category);
                if !paths.is_empty() {
                    println!("{} {}:", paths.len(), label);
                    print_sample(paths, category.tag());
                }
            }
        }
        Operation::Unlink => {
            let links = &classification.linked;
            if !links.is_empty() {
                println!("{} links will be broken", links.len());
                print_sample(links, Category::Linked.tag());
            }
        }
    }

    if !classification.errors.is_empty() {
        println!("{} files could not be checked:", classification.errors.len());
        for error in sample(&classification.errors, SAMPLE_SIZE) {
            println!("  [err]  {error}");
        }
        print_more(classification.errors.len());
    }

    println!("From: {}", plan.dirs.common_dir.display());
    println!("To->: {}", plan.dirs.project_dir.display());
}

fn print_sample(paths: &[RelativePath], tag: &str) {
    for path in sample(paths, SAMPLE_SIZE) {
        println!("  {tag} {path}");
    }
    print_more(paths.len());
}

fn print_more(total: usize) {
    if total > SAMPLE_SIZE {
        println!("  + {} more", total - SAMPLE_SIZE);
    }
}

fn print_outcome(report: &SyncReport) {
    match report.outcome {
        SyncOutcome::NothingToDo => match report.operation {
            Operation::Link => println!("No linkable files found"),
            Operation::Unlink => println!("No links found"),
        },
        SyncOutcome::DryRun | SyncOutcome::Declined => println!("No changes were made."),
        SyncOutcome::Completed => {
            let Some(mutation) = &report.mutation else {
                return;
            };
            println!();
            println!("{}", "─".repeat(60));
            println!(
                " {} ({})",
                mutation.summary(),
                format_size(mutation.bytes_processed)
            );
            println!("{}", "─".repeat(60));

            if !mutation.errors.is_empty() {
                println!();
                for error in &mutation.errors {
                    println!("  [fail] {error}");
                }
            } else {
                println!("Done!");
            }
        }
    }
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_positional_common_dir() {
        let cli = parse(&["commonlink", "../common", "-y", "--dry"]);
        assert!(cli.command.is_none());

        let config = cli.args.to_config().unwrap();
        assert_eq!(config.common_dir, PathBuf::from("../common"));
        assert!(config.auto_confirm);
        assert!(config.dry_run);
        assert_eq!(config.file_limit, DEFAULT_FILE_LIMIT);
    }

    #[test]
    fn test_unlink_subcommand() {
        let cli = parse(&[
            "commonlink", "unlink", "-c", "../common", "-p", "app", "-i", "*.log", "-j", "3",
        ]);
        let Some(Command::Unlink { args }) = cli.command else {
            panic!("expected unlink");
        };

        let config = args.to_config().unwrap();
        assert_eq!(config.project_dir, PathBuf::from("app"));
        assert_eq!(config.concurrency, 3);
        assert!(config.ignored.iter().any(|p| p == "*.log"));
        assert!(config.ignored.iter().any(|p| p == ".git"));
    }

    #[test]
    fn test_missing_common_dir_is_validation_error() {
        let cli = parse(&["commonlink"]);
        let err = cli.args.to_config().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("--common-dir"));
    }

    #[test]
    fn test_progress_line() {
        use commonlink_ops::{OperationError, OperationType};

        let mut progress = OperationProgress::new(OperationType::Link, 4);
        progress.complete_file(2048);
        assert_eq!(progress_line(&progress), "[ 25%] 1/4 files, 2 KiB");

        progress.add_error(OperationError::new(RelativePath::new("x"), "nope"));
        assert_eq!(progress_line(&progress), "[ 50%] 2/4 files, 2 KiB, 1 failed");
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "commonlink",
            "../c",
            "--no-git-check",
            "--file-limit",
            "20",
            "--time-limit",
            "3",
            "-g",
            "extra.ignore",
            "-f",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.args.format, OutputFormat::Json);
        assert_eq!(cli.args.verbose, 2);

        let config = cli.args.to_config().unwrap();
        assert!(config.skip_dirty_check);
        assert_eq!(config.file_limit, 20);
        assert_eq!(config.time_limit, 3);
        assert!(config.gitignore_files.contains(&PathBuf::from("extra.ignore")));
    }
}
