//! Output formatting for route bundles.

use std::io::{self, Write};

use clap::ValueEnum;
use evenav_lib::routing::{CandidateRoute, LegKind, Route, RouteMode, RouteOutcome};
use evenav_lib::ship::FatigueRisk;
use evenav_lib::RouteBundle;

use crate::terminal::{leg_label, ColorPalette, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary of every candidate.
    #[default]
    Text,
    /// The full bundle as pretty-printed JSON.
    Json,
}

/// Write `bundle` to `out` in the requested format.
pub fn render_bundle<W: Write>(
    out: &mut W,
    bundle: &RouteBundle,
    format: OutputFormat,
    palette: &ColorPalette,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => render_text(out, bundle, palette),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(bundle).map_err(io::Error::other)?;
            writeln!(out, "{json}")
        }
    }
}

/// Human-friendly view: the selection, then one block per travel mode.
pub fn render_text<W: Write>(
    out: &mut W,
    bundle: &RouteBundle,
    palette: &ColorPalette,
) -> io::Result<()> {
    writeln!(
        out,
        "Route candidates (profile {}, snapshot generation {}):",
        bundle.profile, bundle.snapshot_generation
    )?;
    match bundle.best.mode {
        Some(mode) => writeln!(out, "Selected: {} ({})", mode, bundle.best.reason.code())?,
        None => writeln!(out, "{}", palette.paint(Style::Warning, "No feasible route"))?,
    }

    for mode in RouteMode::ALL {
        writeln!(out)?;
        render_candidate(out, bundle.candidate(mode), bundle.best.mode == Some(mode), palette)?;
    }

    if !bundle.explanation.is_empty() {
        writeln!(out, "\nNotes:")?;
        for note in &bundle.explanation {
            writeln!(out, "  - {note}")?;
        }
    }
    Ok(())
}

fn render_candidate<W: Write>(
    out: &mut W,
    candidate: &CandidateRoute,
    selected: bool,
    palette: &ColorPalette,
) -> io::Result<()> {
    let marker = if selected { " (selected)" } else { "" };
    match &candidate.outcome {
        RouteOutcome::Found(route) => {
            let m = &route.metrics;
            writeln!(
                out,
                "[{}]{marker} {} gates, {} jumps, {:.1} ly, risk {:.2}",
                candidate.mode, m.gate_hops, m.jump_hops, m.total_ly, m.risk_score
            )?;
            render_route(out, route, palette)?;
        }
        RouteOutcome::Partial { route, reason } => {
            writeln!(out, "[{}] partial: {reason}", candidate.mode)?;
            render_route(out, route, palette)?;
        }
        RouteOutcome::Infeasible { reason } => {
            writeln!(out, "[{}] infeasible: {reason}", candidate.mode)?;
            return Ok(());
        }
    }

    if candidate.avoidance.fallback_used {
        let relaxed = format!("avoidance relaxed to {}", candidate.avoidance.applied);
        writeln!(out, "  {}", palette.paint(Style::Warning, relaxed))?;
    }
    if candidate.amenity_detour_applied {
        writeln!(out, "  amenity detour applied")?;
    }
    for note in &candidate.explanation {
        writeln!(out, "  {}", palette.paint(Style::Muted, format!("- {note}")))?;
    }
    Ok(())
}

fn render_route<W: Write>(out: &mut W, route: &Route, palette: &ColorPalette) -> io::Result<()> {
    for (index, node) in route.nodes.iter().enumerate() {
        let leg = index.checked_sub(1).and_then(|i| route.legs.get(i));
        let kind = leg.map(|leg| leg.kind);
        write!(
            out,
            "  {} {} {}",
            palette.paint(Style::for_leg(kind), leg_label(kind)),
            palette.paint(Style::System, &node.name),
            palette.paint(
                Style::Security(node.security_band),
                format!("{:.1}", node.security_status)
            ),
        )?;
        if let Some(leg) = leg.filter(|leg| leg.kind == LegKind::Jump) {
            write!(out, " ({:.1} ly)", leg.distance_ly)?;
        }
        if node.has_station {
            write!(out, " [station]")?;
        }
        if node.chokepoint {
            write!(out, " {}", palette.paint(Style::Warning, "[chokepoint]"))?;
        }
        writeln!(out)?;
    }

    if let Some(fatigue) = &route.fatigue {
        writeln!(
            out,
            "  fatigue: {:.1} min cooldown, {:.1} min final ({})",
            fatigue.total_cooldown_minutes,
            fatigue.final_fatigue_minutes,
            fatigue_label(fatigue.risk)
        )?;
    }
    Ok(())
}

fn fatigue_label(risk: FatigueRisk) -> &'static str {
    match risk {
        FatigueRisk::Low => "low",
        FatigueRisk::Medium => "medium",
        FatigueRisk::High => "high",
    }
}
