use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use evenav_cli::commands::export::{handle_export_neighbors, ExportArgs};
use evenav_cli::commands::precompute::{handle_precompute, PrecomputeArgs};
use evenav_cli::commands::route::{handle_route_command, RouteCommandArgs};
use evenav_cli::commands::ships::handle_list_ships;
use evenav_cli::commands::{load_config, DataPaths};
use evenav_cli::logging::{init_logging, LoggingConfig};
use evenav_cli::output::OutputFormat;
use evenav_lib::TravelMode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Risk-aware gate, jump, and hybrid route planner")]
struct Cli {
    /// Static-data SQLite database (falls back to EVENAV_DATA).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Jump-neighbor store (defaults to jump_neighbors.db next to the database).
    #[arg(long, global = true)]
    neighbors: Option<PathBuf>,

    /// JSON risk heatmap keyed by system id.
    #[arg(long, global = true)]
    risk: Option<PathBuf>,

    /// Engine configuration file (falls back to EVENAV_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan gate, jump, and hybrid routes between two systems.
    Route(RouteArgs),
    /// Build jump-neighbor tables for one or more range buckets.
    Precompute {
        /// Range bucket to build (1-10); repeat for several. Defaults to all.
        #[arg(long = "bucket")]
        buckets: Vec<i64>,
        /// Continue an interrupted build from its stored cursor.
        #[arg(long)]
        resume: bool,
        /// Stop each bucket after this many seconds.
        #[arg(long)]
        budget_secs: Option<u64>,
        /// Maximum neighbors stored per system.
        #[arg(long)]
        max_neighbors: Option<usize>,
    },
    /// Write a completed range bucket to a standalone snapshot file.
    ExportNeighbors {
        #[arg(long)]
        bucket: i64,
        #[arg(long)]
        output: PathBuf,
    },
    /// List jump-capable ships and their range.
    Ships,
}

#[derive(clap::Args, Debug)]
struct RouteArgs {
    /// Origin system name or id.
    #[arg(long = "from")]
    from: String,
    /// Destination system name or id.
    #[arg(long = "to")]
    to: String,
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,
    /// Jump-capable ship type, e.g. carrier or jump_freighter.
    #[arg(long)]
    ship: Option<String>,
    /// Jump skill level (0-5).
    #[arg(long, default_value_t = 0)]
    skill: i32,
    /// Hull class override, e.g. frigate or capital.
    #[arg(long)]
    class: Option<String>,
    #[arg(long)]
    covert_bridge: bool,
    /// 0 favours speed, 100 favours safety.
    #[arg(long, default_value_t = 50.0)]
    safety: f64,
    /// Explicit preference profile: speed, balanced, or safety.
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    avoid_lowsec: bool,
    #[arg(long)]
    avoid_nullsec: bool,
    /// System to avoid; repeat for several.
    #[arg(long)]
    avoid: Vec<String>,
    /// Penalize avoided systems instead of excluding them.
    #[arg(long)]
    soft: bool,
    /// Prefer stopping in systems with stations.
    #[arg(long)]
    prefer_stations: bool,
    /// Build a missing jump table in memory instead of skipping jump travel.
    #[arg(long)]
    online_fallback: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Auto,
    Gate,
    Jump,
    Hybrid,
}

impl From<ModeArg> for TravelMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => TravelMode::Auto,
            ModeArg::Gate => TravelMode::Gate,
            ModeArg::Jump => TravelMode::Jump,
            ModeArg::Hybrid => TravelMode::Hybrid,
        }
    }
}

impl From<RouteArgs> for RouteCommandArgs {
    fn from(args: RouteArgs) -> Self {
        RouteCommandArgs {
            from: args.from,
            to: args.to,
            mode: args.mode.into(),
            ship: args.ship,
            skill: args.skill,
            class: args.class,
            covert_bridge: args.covert_bridge,
            safety: args.safety,
            profile: args.profile,
            avoid_lowsec: args.avoid_lowsec,
            avoid_nullsec: args.avoid_nullsec,
            avoid: args.avoid,
            soft: args.soft,
            prefer_stations: args.prefer_stations,
            online_fallback: args.online_fallback,
        }
    }
}

fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env());
    let cli = Cli::parse();
    let started = Instant::now();

    let result = run(cli);
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "command finished");
    result
}

fn run(cli: Cli) -> Result<()> {
    let paths = || {
        DataPaths::resolve(
            cli.data.as_deref(),
            cli.neighbors.as_deref(),
            cli.risk.as_deref(),
        )
    };

    match cli.command {
        Command::Route(args) => {
            let paths = paths()?;
            let config = load_config(cli.config.as_deref())?;
            let format = args.format;
            handle_route_command(&paths, config, format, &args.into())
        }
        Command::Precompute {
            buckets,
            resume,
            budget_secs,
            max_neighbors,
        } => {
            let paths = paths()?;
            let config = load_config(cli.config.as_deref())?;
            let args = PrecomputeArgs {
                buckets,
                resume,
                budget_secs,
                max_neighbors,
            };
            handle_precompute(&paths, &config, &args)
        }
        Command::ExportNeighbors { bucket, output } => {
            handle_export_neighbors(&paths()?, &ExportArgs { bucket, output })
        }
        Command::Ships => {
            handle_list_ships();
            Ok(())
        }
    }
}
