#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pulse: stage-aware survey cadence tracking for shift workers",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from the flag and the environment.
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a pulse project",
        long_about = "Initialize a pulse project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    pulse init\n\n    # Emit machine-readable output\n    pulse init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Roster", about = "Manage the worker roster")]
    Worker {
        #[command(subcommand)]
        command: WorkerCommand,
    },

    #[command(
        next_help_heading = "Filing",
        about = "File one form into the ledger",
        long_about = "File one form submission. The stage window defaults to the one containing the submission instant; repeats of a slot are renumbered, never rejected.",
        after_help = "EXAMPLES:\n    # File a sleepiness score in the current window\n    pulse submit --worker ACME/0042 --form sleepiness --data '{\"score\": 3}'\n\n    # Late entry into this morning's window\n    pulse submit --worker ACME/0042 --form sleep --stage morning --data '{\"hours\": 6.5}'\n\n    # Start a second shift cycle\n    pulse submit --worker ACME/0042 --form sleepiness --batch 2 --data '{\"score\": 5}'"
    )]
    Submit(cmd::submit::SubmitArgs),

    #[command(
        next_help_heading = "Filing",
        about = "List the forms a worker should file",
        long_about = "List the form kinds a worker is expected to file, and the batch they file into.",
        after_help = "EXAMPLES:\n    # What does this worker owe?\n    pulse forms --worker ACME/0042\n\n    # Emit machine-readable output\n    pulse forms --worker ACME/0042 --json"
    )]
    Forms(cmd::forms::FormsArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Show the day's five-window completion picture",
        long_about = "Show how each stage window of a day stands against the cadence table.",
        after_help = "EXAMPLES:\n    # Today, current batch\n    pulse status --worker ACME/0042\n\n    # Audit a past day and batch\n    pulse status --worker ACME/0042 --at 2026-06-08T22:00 --batch 1 --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Show recent activity day by day",
        long_about = "Show the last N days of submissions, most recent day first. Quiet days are listed too.",
        after_help = "EXAMPLES:\n    # The default week\n    pulse history --worker ACME/0042\n\n    # A fortnight ending on a fixed day\n    pulse history --worker ACME/0042 --days 14 --until 2026-06-08"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Check whether a worker needs a reminder",
        long_about = "Decide whether the current stage window still needs filling, and optionally deliver the nag through the console transport.",
        after_help = "EXAMPLES:\n    # Just the decision\n    pulse remind --worker ACME/0042 --json\n\n    # Decide and deliver\n    pulse remind --worker ACME/0042 --notify"
    )]
    Remind(cmd::remind::RemindArgs),
}

#[derive(Subcommand, Debug)]
enum WorkerCommand {
    #[command(
        about = "Register a worker",
        after_help = "EXAMPLES:\n    # Register with a display name\n    pulse worker add ACME/0042 --name \"Lin Wei\""
    )]
    Add(cmd::worker::WorkerAddArgs),

    #[command(
        about = "List registered workers",
        after_help = "EXAMPLES:\n    pulse worker list --json"
    )]
    List(cmd::worker::WorkerListArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PULSE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "pulse=debug,info"
        } else {
            "pulse=info,warn"
        })
    });

    let format = env::var("PULSE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, cli.quiet, &project_root),
        Commands::Worker {
            command: WorkerCommand::Add(ref args),
        } => cmd::worker::run_worker_add(args, output, &project_root),
        Commands::Worker {
            command: WorkerCommand::List(ref args),
        } => cmd::worker::run_worker_list(args, output, &project_root),
        Commands::Submit(ref args) => cmd::submit::run_submit(args, output, &project_root),
        Commands::Forms(ref args) => cmd::forms::run_forms(args, output, &project_root),
        Commands::Status(ref args) => cmd::status::run_status(args, output, &project_root),
        Commands::History(ref args) => cmd::history::run_history(args, output, &project_root),
        Commands::Remind(ref args) => cmd::remind::run_remind(args, output, &project_root),
    }
}
