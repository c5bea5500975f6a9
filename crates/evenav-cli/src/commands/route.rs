//! Route command handler.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use evenav_lib::routing::{AvoidanceStrictness, PreferenceProfile, RouteRequest, TravelMode};
use evenav_lib::{
    EngineConfig, JsonRiskSource, NavigationEngine, RiskSource, RouteBundle, ShipClass,
    SqliteGraphSource, SqliteNeighborStore, StaticRiskSource, SystemRef,
};

use crate::commands::DataPaths;
use crate::output::{render_bundle, OutputFormat};
use crate::terminal::ColorPalette;

/// Arguments for the route command.
#[derive(Debug, Clone, Default)]
pub struct RouteCommandArgs {
    /// Origin system name or numeric id.
    pub from: String,
    /// Destination system name or numeric id.
    pub to: String,
    pub mode: TravelMode,
    /// Jump-capable ship type.
    pub ship: Option<String>,
    pub skill: i32,
    /// Hull class override.
    pub class: Option<String>,
    pub covert_bridge: bool,
    /// 0 = fastest, 100 = safest.
    pub safety: f64,
    pub profile: Option<String>,
    pub avoid_lowsec: bool,
    pub avoid_nullsec: bool,
    /// Systems to avoid, by name or id.
    pub avoid: Vec<String>,
    /// Penalize avoided systems instead of excluding them.
    pub soft: bool,
    pub prefer_stations: bool,
    /// Build missing jump tables in memory.
    pub online_fallback: bool,
}

impl RouteCommandArgs {
    /// Convert CLI args to a library [`RouteRequest`].
    pub fn to_request(&self) -> Result<RouteRequest> {
        let ship_class = self
            .class
            .as_deref()
            .map(|name| {
                ShipClass::parse(name).ok_or_else(|| anyhow::anyhow!("unknown ship class '{name}'"))
            })
            .transpose()?;
        let preference = self
            .profile
            .as_deref()
            .map(|name| {
                PreferenceProfile::parse(name)
                    .ok_or_else(|| anyhow::anyhow!("unknown preference profile '{name}'"))
            })
            .transpose()?;

        let mut request = RouteRequest::new(system_ref(&self.from), system_ref(&self.to))
            .with_mode(self.mode)
            .with_safety_vs_speed(self.safety);
        request.jump_ship = self.ship.clone();
        request.skill_level = self.skill;
        request.ship_class = ship_class;
        request.covert_bridge = self.covert_bridge;
        request.preference = preference;
        request.avoid_lowsec = self.avoid_lowsec;
        request.avoid_nullsec = self.avoid_nullsec;
        request.avoid_systems = self.avoid.iter().map(|name| system_ref(name)).collect();
        request.strictness = if self.soft {
            AvoidanceStrictness::Soft
        } else {
            AvoidanceStrictness::Strict
        };
        request.prefer_stations = self.prefer_stations;
        Ok(request)
    }
}

/// Numeric input is treated as a system id, anything else as a name.
fn system_ref(value: &str) -> SystemRef {
    match value.trim().parse::<i64>() {
        Ok(id) => SystemRef::Id(id),
        Err(_) => SystemRef::Name(value.to_string()),
    }
}

/// Handle the route subcommand.
///
/// Prints the bundle and fails when no travel mode produced a route, so
/// scripts can rely on the exit status.
pub fn handle_route_command(
    paths: &DataPaths,
    mut config: EngineConfig,
    format: OutputFormat,
    args: &RouteCommandArgs,
) -> Result<()> {
    if args.online_fallback {
        config.online_neighbor_fallback = true;
    }
    let request = args.to_request()?;
    let bundle = compute(paths, config, &request)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_bundle(&mut out, &bundle, format, &ColorPalette::detect())
        .context("failed to write route output")?;
    out.flush()?;

    if bundle.best.mode.is_none() {
        anyhow::bail!("no feasible route from {} to {}", args.from, args.to);
    }
    Ok(())
}

fn compute(paths: &DataPaths, config: EngineConfig, request: &RouteRequest) -> Result<RouteBundle> {
    let neighbors = SqliteNeighborStore::open(&paths.neighbors).with_context(|| {
        format!("failed to open neighbor store {}", paths.neighbors.display())
    })?;
    let risk: Arc<dyn RiskSource> = match &paths.risk {
        Some(path) => Arc::new(JsonRiskSource::new(path)),
        None => Arc::new(StaticRiskSource::default()),
    };
    debug!(
        database = %paths.database.display(),
        neighbors = %paths.neighbors.display(),
        "opening navigation engine"
    );
    let engine = NavigationEngine::new(
        Arc::new(SqliteGraphSource::new(&paths.database)),
        risk,
        Arc::new(neighbors),
        config,
    )
    .with_context(|| format!("failed to load dataset from {}", paths.database.display()))?;

    engine
        .compute_routes(request)
        .context("route computation failed")
}
