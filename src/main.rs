//! Ralph Ledger - task progress tracking for scripted runner loops
//!
//! Thin CLI over [`ralph_ledger::Ledger`]: parse arguments, run one command,
//! print the outcome.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::ffi::OsString;
use std::path::PathBuf;

use ralph_ledger::timestamp::Timestamp;
use ralph_ledger::{
    CommitRecord, Ledger, LedgerError, ModeSwitch, NextTask, StatusReport, Summary, Transition,
    TransitionKind, Workspace,
};

const BIN: &str = "ralph-ledger";
const RULE_WIDTH: usize = 60;

#[derive(Parser)]
#[command(name = "ralph-ledger")]
#[command(version)]
#[command(about = "Track RALPH task progress across runner invocations", long_about = None)]
#[command(after_help = "Examples:
  ralph-ledger next
  ralph-ledger start 1.1
  ralph-ledger commit feat: scaffold service
  ralph-ledger pass 1.1
  ralph-ledger mode backend")]
struct Cli {
    /// Installation root holding the run-state and catalog files
    #[arg(short, long, global = true, env = "RALPH_LEDGER_ROOT", default_value = ".")]
    root: PathBuf,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current state
    Status,

    /// Show the next task to work on
    Next,

    /// Mark a task as in progress
    Start {
        /// Task id from the active catalog
        task_id: String,
    },

    /// Mark a task as passed
    Pass {
        /// Task id from the active catalog
        task_id: String,
    },

    /// Mark a task as failed/blocked for supervisor review
    Fail {
        /// Task id from the active catalog
        task_id: String,
    },

    /// Record a commit message (git is not run)
    Commit {
        /// Message words, joined with single spaces
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        message: Vec<String>,
    },

    /// Show per-phase progress
    Summary,

    /// Switch between the backend and integration task sets
    Mode {
        /// backend or integration
        mode: String,
    },
}

const COMMAND_NAMES: &[&str] = &[
    "status", "next", "start", "pass", "fail", "commit", "summary", "mode", "help",
];

/// Position of the subcommand token, skipping global options.
fn command_index(args: &[OsString]) -> Option<usize> {
    let mut skip_value = false;
    for (i, arg) in args.iter().enumerate().skip(1) {
        if skip_value {
            skip_value = false;
            continue;
        }
        let arg = arg.to_string_lossy();
        if arg == "--root" || arg == "-r" {
            skip_value = true;
        } else if !arg.starts_with('-') {
            return Some(i);
        }
    }
    None
}

/// Command names are case-insensitive. Every word after `commit` belongs to
/// the message, including ones that look like global options.
fn normalize_args(mut args: Vec<OsString>) -> Vec<OsString> {
    if let Some(i) = command_index(&args) {
        let lower = args[i].to_string_lossy().to_lowercase();
        if COMMAND_NAMES.contains(&lower.as_str()) {
            if lower == "commit" {
                args.insert(i + 1, OsString::from("--"));
            }
            args[i] = lower.into();
        }
    }
    args
}

/// Parse arguments. `None` means usage has been printed and the process
/// should exit 0, which includes unrecognized commands.
fn parse_cli() -> Option<Cli> {
    let args = normalize_args(std::env::args_os().collect());
    match Cli::try_parse_from(&args) {
        Ok(cli) => Some(cli),
        Err(e) => {
            match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    let _ = e.print();
                }
                _ => {
                    let token = command_index(&args)
                        .map(|i| args[i].to_string_lossy().into_owned())
                        .unwrap_or_default();
                    println!("\n{} Unknown command: {}\n", "Error:".red().bold(), token);
                    let _ = Cli::command().print_help();
                    println!();
                }
            }
            None
        }
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn main() {
    let Some(cli) = parse_cli() else {
        return;
    };

    // Initialize tracing
    let filter = if cli.verbose {
        "ralph_ledger=debug"
    } else {
        "ralph_ledger=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return;
    };

    // Resolve installation root
    let root = cli.root.canonicalize().unwrap_or(cli.root.clone());

    if !root.exists() {
        eprintln!(
            "{} Installation root does not exist: {}",
            "Error:".red().bold(),
            root.display()
        );
        std::process::exit(1);
    }

    let ledger = match Workspace::open(&root) {
        Ok(workspace) => Ledger::new(workspace),
        Err(e) => std::process::exit(report_error(&e)),
    };

    if let Err(e) = run(&ledger, command) {
        let code = report_error(&e);
        if code != 0 {
            std::process::exit(code);
        }
    }
}

fn run(ledger: &Ledger, command: Commands) -> ralph_ledger::Result<()> {
    match command {
        Commands::Status => print_status(&ledger.status()?),
        Commands::Next => print_next(&ledger.next()?),
        Commands::Start { task_id } => print_transition(&ledger.start(&task_id)?),
        Commands::Pass { task_id } => print_transition(&ledger.pass(&task_id)?),
        Commands::Fail { task_id } => print_transition(&ledger.fail(&task_id)?),
        Commands::Commit { message } => print_commit(&ledger.commit(&message.join(" "))?),
        Commands::Summary => print_summary(&ledger.summary()?),
        Commands::Mode { mode } => print_mode_switch(&ledger.switch_mode(&mode)?),
    }
    Ok(())
}

/// Print a diagnostic and return the exit code for it.
fn report_error(err: &LedgerError) -> i32 {
    match err {
        LedgerError::TaskNotFound { id } => {
            println!("\n{} Task '{}' not found.\n", "Error:".red().bold(), id);
        }
        LedgerError::InvalidMode { value } => {
            println!("\n{} Invalid mode: {}", "Error:".red().bold(), value);
            println!("   Valid modes: backend, integration\n");
        }
        LedgerError::CatalogNotFound { path, mode } => {
            eprintln!(
                "\n{} Tasks file not found: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("   Current mode: {mode}");
            eprintln!("   Run '{BIN} mode <backend|integration>' to switch modes\n");
        }
        LedgerError::StateNotFound { path } => {
            eprintln!(
                "\n{} Run-state file not found: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("   The installation has not been bootstrapped.");
            eprintln!("   Create it with at least: {{\"mode\": \"integration\", \"status\": \"ready\", \"execution_history\": []}}\n");
        }
        LedgerError::Config { message, path } => {
            eprintln!("{} {}", "Error:".red().bold(), message);
            if let Some(path) = path {
                eprintln!("   Config file: {}", path.display());
            }
        }
        LedgerError::Other(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        other => {
            eprintln!("{} {}", "Error:".red().bold(), other);
        }
    }
    if !err.is_recoverable() {
        tracing::debug!(error = ?err, "Command failed");
    }
    err.exit_code()
}

fn print_status(report: &StatusReport) {
    let state = &report.state;
    let stats = &report.stats;

    println!("\n{}", rule());
    println!("  RALPH Status - {}", report.label.bold());
    println!("{}", rule());
    println!("\n  Mode:          {}", report.mode.as_str().to_uppercase());
    println!("\n  Current Phase: {}", state.phase_label());
    println!(
        "  Current Task:  {}",
        state.current_task.as_deref().unwrap_or("None")
    );
    println!("  Status:        {}", state.status);
    println!("\n  Progress:");
    println!("    Completed:   {}/{}", stats.completed, stats.total);
    println!("    In Progress: {}", stats.in_progress);
    println!("    Blocked:     {}", stats.blocked);
    println!("    Remaining:   {}", stats.remaining());
    println!(
        "\n  Last Updated: {}",
        state
            .last_updated
            .as_ref()
            .map(Timestamp::minutes)
            .unwrap_or_else(|| "Never".to_string())
    );
    println!(
        "  Last Commit:  {}",
        state.git.last_commit.as_deref().unwrap_or("None")
    );
    println!("{}\n", rule());
}

fn print_next(next: &NextTask) {
    let task = match next {
        NextTask::Task(task) => task,
        NextTask::AllDone { milestone } => {
            println!(
                "\n{} ALL TASKS COMPLETED! Milestone {} is done.\n",
                "OK".green().bold(),
                milestone
            );
            return;
        }
        NextTask::EmptyCatalog => {
            println!(
                "\n{} The active catalog has no tasks.\n",
                "Warning:".yellow().bold()
            );
            return;
        }
    };

    let marker = if task.in_progress {
        "In Progress".yellow()
    } else {
        "Pending".normal()
    };

    println!("\n{}", rule());
    println!("  NEXT TASK: {}", task.id);
    println!("{}", rule());
    println!("\n  Phase:  {}", task.phase);
    println!("  Title:  {}", task.title);
    println!("  Action: {}", task.action);
    println!("\n  Status: {}", marker);
    println!("\n  Instructions:");
    println!("  1. Read the task description");
    println!("  2. Consult the catalog for full context");
    println!("  3. Run: {BIN} start {}", task.id);
    println!("  4. Implement the feature");
    println!("  5. Run validation steps");
    println!("  6. Run: {BIN} pass {}", task.id);
    println!("{}\n", rule());
}

fn print_transition(outcome: &Transition) {
    let task = &outcome.task;
    match outcome.kind {
        TransitionKind::Start => {
            println!(
                "\n{} Started task {}: {}",
                "OK".green().bold(),
                task.id,
                task.title
            );
            println!("   Action: {}\n", task.action);
        }
        TransitionKind::Pass => {
            let stats = &outcome.stats;
            println!("\n{}", rule());
            println!("{} TASK COMPLETED: {}", "OK".green().bold(), task.id);
            println!("{}", rule());
            println!("\n  Title:    {}", task.title);
            println!("  Phase:    {}", task.phase);
            println!(
                "  Progress: {}/{} tasks completed ({:.1}%)",
                stats.completed,
                stats.total,
                stats.completion_pct()
            );
            println!("\n  Status:   RALPH execution paused");
            println!("  Action:   Review the completed work before continuing");
            println!("\n{}", rule());
            println!("\nTo continue RALPH execution:");
            println!("   1. Review the changes made for this task");
            println!("   2. Run: {BIN} next");
            println!("   3. Run: {BIN} start <task_id>");
            println!("\n{}\n", rule());
        }
        TransitionKind::Fail => {
            println!(
                "\n{} Task {}: {}",
                "BLOCKED:".yellow().bold(),
                task.id,
                task.title
            );
            println!("   Status: Requires supervisor review");
            println!(
                "\n   Action: Create execution_summary_task{}.md with failure details\n",
                task.id.replace('.', "_")
            );
        }
    }
}

fn print_commit(record: &CommitRecord) {
    println!(
        "\n{} Commit recorded: {}",
        "OK".green().bold(),
        record.message
    );
    println!(
        "   Run manually: git add . && git commit -m \"{}\"\n",
        record.message
    );
}

fn print_summary(summary: &Summary) {
    let stats = &summary.stats;

    println!("\n{}", rule());
    println!("  RALPH Progress Summary - {}", summary.label.bold());
    println!("{}", rule());
    println!(
        "\n  Overall: {}/{} tasks ({:.1}%)",
        stats.completed,
        stats.total,
        stats.completion_pct()
    );
    println!("\n  By Phase:");
    for phase in &summary.phases {
        let marker = if phase.is_complete() { "✅" } else { "⏳" };
        let name: String = phase.phase.chars().take(40).collect();
        println!(
            "    {} {:<40} [{}] {}/{}",
            marker,
            name,
            phase.bar(),
            phase.completed,
            phase.total
        );
    }
    println!("{}\n", rule());
}

fn print_mode_switch(outcome: &ModeSwitch) {
    match outcome {
        ModeSwitch::AlreadyActive(mode) => {
            println!("\n{} Already in {} mode\n", "OK".green().bold(), mode);
        }
        ModeSwitch::Switched {
            from,
            to,
            catalog_file,
            report_file,
        } => {
            println!(
                "\n{} Switched from {} to {} mode",
                "OK".green().bold(),
                from,
                to
            );
            println!("   Tasks file: {catalog_file}");
            println!("   Tasklist:   {report_file}");
            println!("\n   Run '{BIN} status' to see current state\n");
        }
    }
}
