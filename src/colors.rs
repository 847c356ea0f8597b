//! Display colors per participant.
//!
//! Colors are a presentation concern: they are assigned here, keyed by name, and cached
//! in the data directory next to (but independent of) the selections.

use std::collections::BTreeMap;

use datepoll_core::SelectionState;
use datepoll_core::persistence::FilePersistence;
use owo_colors::OwoColorize;
use tracing::warn;

pub struct Palette {
    colors: BTreeMap<String, String>,
}

impl Palette {
    /// Load cached colors and cache one for every participant that has none yet.
    pub fn load(port: &FilePersistence, state: &SelectionState) -> Palette {
        let (palette, added) = Self::assign(port, state);
        if added {
            if let Err(e) = port.save_colors(&palette.colors) {
                warn!(error = %e, "Could not cache colors");
            }
        }
        palette
    }

    /// Like `load`, but never writes the cache.
    pub fn view(port: &FilePersistence, state: &SelectionState) -> Palette {
        Self::assign(port, state).0
    }

    fn assign(port: &FilePersistence, state: &SelectionState) -> (Palette, bool) {
        let mut colors = port.load_colors().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read cached colors");
            BTreeMap::new()
        });

        let known = colors.len();
        for name in state.participants() {
            colors
                .entry(name.to_string())
                .or_insert_with(|| hsl_for(name.as_str()));
        }

        let added = colors.len() != known;
        (Palette { colors }, added)
    }

    #[cfg(test)]
    pub(crate) fn from_colors(colors: BTreeMap<String, String>) -> Palette {
        Palette { colors }
    }

    /// `name` in its participant color, or plain if it has none.
    pub fn paint(&self, name: &str) -> String {
        match self.colors.get(name).and_then(|c| parse_hsl(c)) {
            Some((r, g, b)) => name.truecolor(r, g, b).to_string(),
            None => name.to_string(),
        }
    }
}

/// Stable hue from the name (FNV-1a).
fn hue_for(name: &str) -> u32 {
    let hash = name
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
    hash % 360
}

fn hsl_for(name: &str) -> String {
    format!("hsl({}, 70%, 50%)", hue_for(name))
}

/// Parse `hsl(H, S%, L%)`. Hue may be fractional.
fn parse_hsl(s: &str) -> Option<(u8, u8, u8)> {
    let inner = s.trim().strip_prefix("hsl(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim().trim_end_matches('%'));

    let h: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    let l: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    Some(hsl_to_rgb(h, s / 100.0, l / 100.0))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round() as u8;

    (channel(r1), channel(g1), channel(b1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datepoll_core::ParticipantName;

    #[test]
    fn test_hsl_to_rgb_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), (255, 255, 255));
    }

    #[test]
    fn test_parse_hsl_accepts_fractional_hue() {
        assert_eq!(parse_hsl("hsl(120, 100%, 50%)"), Some((0, 255, 0)));
        assert!(parse_hsl("hsl(217.34, 70%, 50%)").is_some());
        assert_eq!(parse_hsl("red"), None);
        assert_eq!(parse_hsl("hsl(1, 2%, 3%, 4)"), None);
    }

    #[test]
    fn test_hue_is_stable_per_name() {
        assert_eq!(hue_for("Alice"), hue_for("Alice"));
        assert!(hue_for("Alice") < 360);
        assert_eq!(hsl_for("Bob"), format!("hsl({}, 70%, 50%)", hue_for("Bob")));
    }

    #[test]
    fn test_palette_caches_new_participants() {
        let dir = tempfile::tempdir().unwrap();
        let port = FilePersistence::new(dir.path());
        let mut state = SelectionState::new();
        state.insert_participant(&ParticipantName::new("Alice").unwrap());

        Palette::load(&port, &state);

        let cached = port.load_colors().unwrap();
        assert_eq!(cached["Alice"], hsl_for("Alice"));
    }

    #[test]
    fn test_palette_view_does_not_write_cache() {
        let dir = tempfile::tempdir().unwrap();
        let port = FilePersistence::new(dir.path());
        let mut state = SelectionState::new();
        state.insert_participant(&ParticipantName::new("Mallory").unwrap());

        let palette = Palette::view(&port, &state);

        assert_ne!(palette.paint("Mallory"), "Mallory");
        assert!(!dir.path().join("colors.json").exists());
    }

    #[test]
    fn test_paint_without_color_is_plain() {
        let palette = Palette::from_colors(BTreeMap::new());
        assert_eq!(palette.paint("Nobody"), "Nobody");
    }
}
