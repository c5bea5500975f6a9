//! ANSI styling for route output.
//!
//! Each element of a printed route (stop tags, system names, security values,
//! warnings) has a [`Style`]. A [`ColorPalette`] decides whether styles turn
//! into escape sequences or vanish, so the renderer never branches on color
//! support itself.

use std::ffi::OsStr;
use std::fmt;

use evenav_lib::routing::LegKind;
use evenav_lib::SecurityBand;

const RESET: &str = "\x1b[0m";

/// Visual role of a piece of route output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Badge on the origin stop.
    StartTag,
    /// Badge on a stop reached through a gate.
    GateTag,
    /// Badge on a stop reached by jumping.
    JumpTag,
    System,
    Muted,
    Warning,
    /// Security status, colored by band.
    Security(SecurityBand),
}

impl Style {
    /// Badge style for a stop reached by `leg` (`None` for the origin).
    pub fn for_leg(leg: Option<LegKind>) -> Self {
        match leg {
            None => Style::StartTag,
            Some(LegKind::Gate) => Style::GateTag,
            Some(LegKind::Jump) => Style::JumpTag,
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            Style::StartTag => "\x1b[1;7;32m",
            Style::GateTag => "\x1b[1;7;36m",
            Style::JumpTag => "\x1b[1;7;33m",
            Style::System => "\x1b[1;97m",
            Style::Muted => "\x1b[90m",
            Style::Warning | Style::Security(SecurityBand::Null) => "\x1b[31m",
            Style::Security(SecurityBand::High) => "\x1b[32m",
            Style::Security(SecurityBand::Low) => "\x1b[38;5;208m",
        }
    }
}

/// Four-letter badge printed in front of a route stop.
pub fn leg_label(leg: Option<LegKind>) -> &'static str {
    match leg {
        None => "STRT",
        Some(LegKind::Gate) => "GATE",
        Some(LegKind::Jump) => "JUMP",
    }
}

/// Whether styles render as ANSI escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    enabled: bool,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self { enabled: true }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self { enabled: false }
    }

    /// Colored unless `NO_COLOR` is set or `TERM` is `dumb`.
    #[must_use]
    pub fn detect() -> Self {
        let term = std::env::var_os("TERM");
        Self {
            enabled: color_enabled(std::env::var_os("NO_COLOR").as_deref(), term.as_deref()),
        }
    }

    /// Wrap `value` so that it displays in `style`.
    pub fn paint<T: fmt::Display>(&self, style: Style, value: T) -> Painted<T> {
        Painted {
            code: self.enabled.then(|| style.ansi()),
            value,
        }
    }
}

fn color_enabled(no_color: Option<&OsStr>, term: Option<&OsStr>) -> bool {
    if no_color.is_some() {
        return false;
    }
    !term.is_some_and(|term| term.eq_ignore_ascii_case("dumb"))
}

/// A value rendered with an optional escape sequence around it.
#[derive(Debug, Clone, Copy)]
pub struct Painted<T> {
    code: Option<&'static str>,
    value: T,
}

impl<T: fmt::Display> fmt::Display for Painted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}{}{RESET}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Group a count into thousands, e.g. `12,345`.
pub fn group_digits(n: usize) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - head) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_inserts_commas_every_three_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(54_321), "54,321");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }

    #[test]
    fn plain_palette_emits_bare_values() {
        let palette = ColorPalette::plain();
        let text = format!("{}", palette.paint(Style::Security(SecurityBand::Null), "0.0"));
        assert_eq!(text, "0.0");
    }

    #[test]
    fn security_bands_use_distinct_colors() {
        let palette = ColorPalette::colored();
        let high = palette.paint(Style::Security(SecurityBand::High), 0.5).to_string();
        let low = palette.paint(Style::Security(SecurityBand::Low), 0.3).to_string();
        let null = palette.paint(Style::Security(SecurityBand::Null), 0.0).to_string();
        assert_eq!(high, "\x1b[32m0.5\x1b[0m");
        assert!(low.starts_with("\x1b[38;5;208m"));
        assert!(null.starts_with("\x1b[31m"));
    }

    #[test]
    fn leg_styles_follow_the_leg_kind() {
        assert_eq!(Style::for_leg(None), Style::StartTag);
        assert_eq!(Style::for_leg(Some(LegKind::Jump)), Style::JumpTag);
        assert_eq!(leg_label(Some(LegKind::Gate)), "GATE");
    }

    #[test]
    fn no_color_and_dumb_terminals_disable_styling() {
        assert!(!color_enabled(Some(OsStr::new("1")), None));
        assert!(!color_enabled(None, Some(OsStr::new("dumb"))));
        assert!(color_enabled(None, Some(OsStr::new("xterm-256color"))));
        assert!(color_enabled(None, None));
    }
}
