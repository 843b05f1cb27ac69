mod check_cmd;
mod config;
mod plan_cmds;
mod render;
mod resolve;
mod schedule_cmds;
mod session;
#[cfg(test)]
mod test_util;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use config::StageplanConfig;
use session::Session;
use stageplan_store::models::{PlanStatus, Stage};

#[derive(Parser)]
#[command(name = "stageplan", about = "Month-by-month stage schedules for course design plans")]
struct Cli {
    /// Store file path (overrides STAGEPLAN_STORE_PATH env var)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a stageplan config file
    Init {
        /// Store file path to record in the config (defaults to the data directory)
        #[arg(long)]
        store_path: Option<PathBuf>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Schedule editing
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Validate a schedule file without touching the store
    Check {
        /// Path to a .json or .toml schedule file
        file: PathBuf,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create an empty draft plan
    Create {
        /// Plan name
        #[arg(long)]
        name: Option<String>,
    },
    /// List all plans, newest first
    List {
        /// Only plans with this status (e.g. in_progress)
        #[arg(long)]
        status: Option<PlanStatus>,
    },
    /// Show plan details and its schedule
    Show {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
    },
    /// Lock in the schedule; the plan becomes ready to start
    Finalize {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
    },
    /// Start a finalized plan at its first stage
    Start {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
    },
    /// Move an in-progress plan to its next stage
    Advance {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
    },
    /// Give a stage of a started plan more months; later stages shift later
    Extend {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Stage name (e.g. design)
        stage: Stage,
        /// Number of months to add
        #[arg(long, default_value_t = 1)]
        months: u32,
        /// Refuse the extension if the plan's version has moved on
        #[arg(long)]
        expected_version: Option<u64>,
    },
    /// Archive a plan
    Archive {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
    },
    /// Show the plan's event log
    Events {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Replace a plan's schedule with one read from a file
    Set {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Path to a .json or .toml schedule file
        file: String,
        /// Also rename the plan
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a plan's schedule month by month
    Show {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Print stage cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// Give a stage one more month; later stages shift later
    AddMonth {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Stage name or index (0-4)
        stage: String,
        /// Refuse the edit if the plan's version has moved on
        #[arg(long)]
        expected_version: Option<u64>,
    },
    /// Take one month from a stage; later stages shift earlier
    RemoveMonth {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Stage name or index (0-4)
        stage: String,
        /// Refuse the edit if the plan's version has moved on
        #[arg(long)]
        expected_version: Option<u64>,
    },
    /// Check the stored schedule; exits non-zero on the first broken rule
    Validate {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the schedule as TOML (or JSON for a .json output path)
    Export {
        /// Plan ID (full UUID or unique prefix)
        plan_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

/// Execute the `stageplan init` command: write config file.
fn cmd_init(store_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        store: config::StoreSection {
            path: store_path.map(Path::to_path_buf),
        },
        display: config::DisplaySection::default(),
    };
    config::save_config(&path, &cfg)?;

    println!("Config written to {}", path.display());
    match &cfg.store.path {
        Some(p) => println!("  store.path = {}", p.display()),
        None => println!("  store.path = (default: {})", stageplan_store::config::StoreConfig::default_path().display()),
    }
    println!("  display.month_format = {:?}", cfg.display.month_format);
    println!();
    println!("Next: run `stageplan plan create --name <name>` to start a plan.");

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { store_path, force } => {
            cmd_init(store_path.as_deref(), force)?;
        }
        Commands::Plan { command } => {
            let resolved = StageplanConfig::resolve(cli.store.as_deref())?;
            let session = Session::open(&resolved.store)?;
            plan_cmds::run_plan_command(command, &session, &resolved.month_format)?;
        }
        Commands::Schedule { command } => {
            let resolved = StageplanConfig::resolve(cli.store.as_deref())?;
            let session = Session::open(&resolved.store)?;
            schedule_cmds::run_schedule_command(command, &session, &resolved.month_format)?;
        }
        Commands::Check { file } => {
            let resolved = StageplanConfig::resolve(cli.store.as_deref())?;
            check_cmd::run_check(&file, &resolved.month_format)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "stageplan", &mut std::io::stdout());
        }
    }

    Ok(())
}
