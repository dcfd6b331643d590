#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hth: household points, rewards and chores",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (unless HEARTH_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Parent PIN for guarded commands.
    #[arg(long, global = true)]
    pin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }

    fn pin(&self) -> Option<&str> {
        self.pin.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create a household in the current directory",
        long_about = "Create .hearth/config.toml (when missing) and a seeded .hearth/state.json.",
        after_help = "EXAMPLES:\n    # Start a new household\n    hth init\n\n    # Start over (needs the parent PIN when one is set)\n    hth --pin 4321 init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Overview",
        about = "Show balance, today's activity and quick picks",
        long_about = "Show a user's totals, today's earned and spent points, progress toward \
                      the next reward unlock and the most used events and rewards.",
        after_help = "EXAMPLES:\n    hth status\n    hth status --user will --top 5\n\n    # Machine-readable\n    hth status --format json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Overview",
        about = "List household members with their balances",
        after_help = "EXAMPLES:\n    hth users"
    )]
    Users,

    #[command(
        next_help_heading = "Overview",
        about = "Make another user the active one",
        after_help = "EXAMPLES:\n    hth switch will"
    )]
    Switch(cmd::users::SwitchArgs),

    #[command(
        next_help_heading = "Points",
        about = "Record earned points",
        long_about = "Record points for completing an event, or an ad-hoc amount with --points.",
        after_help = "EXAMPLES:\n    # Earn an event's points\n    hth earn --event tidy_room\n\n    # Ad-hoc points with a note\n    hth earn --points 3 --note \"Helped a neighbour\""
    )]
    Earn(cmd::earn::EarnArgs),

    #[command(
        next_help_heading = "Points",
        about = "Add or remove points directly (parent)",
        after_help = "EXAMPLES:\n    hth --pin 4321 adjust +5\n    hth --pin 4321 adjust -3 --note \"Left toys out\""
    )]
    Adjust(cmd::adjust::AdjustArgs),

    #[command(
        next_help_heading = "Points",
        about = "Spend points on a reward",
        long_about = "Redeem a reward. The user must have earned at least the reward's unlock \
                      threshold in total and hold a balance covering its cost.",
        after_help = "EXAMPLES:\n    hth redeem movie_choice\n    hth redeem dessert_pick --user will"
    )]
    Redeem(cmd::redeem::RedeemArgs),

    #[command(
        next_help_heading = "Points",
        about = "List ledger entries",
        after_help = "EXAMPLES:\n    # Last 7 days\n    hth history\n\n    # Everything spent this month\n    hth history --type spend --range 30d\n\n    # One category\n    hth history --range all --category Chores"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Manage a user's events",
        subcommand
    )]
    Events(cmd::catalog::EventsCommand),

    #[command(
        next_help_heading = "Catalog",
        about = "Manage a user's rewards",
        subcommand
    )]
    Rewards(cmd::catalog::RewardsCommand),

    #[command(
        next_help_heading = "Catalog",
        about = "List event or reward categories",
        after_help = "EXAMPLES:\n    hth categories\n    hth categories --kind rewards --user will"
    )]
    Categories(cmd::categories::CategoriesArgs),

    #[command(next_help_heading = "Parent", about = "Manage the parent PIN", subcommand)]
    Pin(cmd::pin::PinCommand),

    #[command(next_help_heading = "Parent", about = "Sound and sync preferences", subcommand)]
    Settings(cmd::settings::SettingsCommand),

    #[command(
        next_help_heading = "Data",
        about = "Write the household state as JSON",
        after_help = "EXAMPLES:\n    hth export > backup.json\n    hth export --output backup.json"
    )]
    Export(cmd::transfer::ExportArgs),

    #[command(
        next_help_heading = "Data",
        about = "Replace the household state from an export (parent)",
        after_help = "EXAMPLES:\n    hth --pin 4321 import backup.json"
    )]
    Import(cmd::transfer::ImportArgs),

    #[command(
        next_help_heading = "Data",
        about = "Discard all data and restore the seed household (parent)",
        after_help = "EXAMPLES:\n    hth --pin 4321 reset --yes"
    )]
    Reset(cmd::transfer::ResetArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HEARTH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "hearth=debug,info"
        } else {
            "hearth=info,warn"
        })
    });

    let format = env::var("HEARTH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // stdout carries command output; logs go to stderr.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let pin = cli.pin();
    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, pin, output, &project_root),
        Commands::Status(args) => cmd::status::run_status(args, output, &project_root),
        Commands::Users => cmd::users::run_users(output, &project_root),
        Commands::Switch(args) => cmd::users::run_switch(args, output, &project_root),
        Commands::Earn(args) => cmd::earn::run_earn(args, output, &project_root),
        Commands::Adjust(args) => cmd::adjust::run_adjust(args, pin, output, &project_root),
        Commands::Redeem(args) => cmd::redeem::run_redeem(args, output, &project_root),
        Commands::History(args) => cmd::history::run_history(args, output, &project_root),
        Commands::Events(command) => {
            cmd::catalog::run_events(command, pin, output, &project_root)
        }
        Commands::Rewards(command) => {
            cmd::catalog::run_rewards(command, pin, output, &project_root)
        }
        Commands::Categories(args) => {
            cmd::categories::run_categories(args, output, &project_root)
        }
        Commands::Pin(command) => cmd::pin::run_pin(command, pin, output, &project_root),
        Commands::Settings(command) => {
            cmd::settings::run_settings(command, output, &project_root)
        }
        Commands::Export(args) => cmd::transfer::run_export(args, output, &project_root),
        Commands::Import(args) => cmd::transfer::run_import(args, pin, output, &project_root),
        Commands::Reset(args) => cmd::transfer::run_reset(args, pin, output, &project_root),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = cli.output_mode();
    debug!(?output, "resolved output mode");

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        // Already rendered by the command.
        Err(err) if err.downcast_ref::<cmd::Reported>().is_some() => ExitCode::FAILURE,
        Err(err) => {
            if let Err(render_err) = render_error(output, &CliError::new(format!("{err:#}"))) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
