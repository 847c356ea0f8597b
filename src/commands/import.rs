use std::path::Path;

use anyhow::{Context, Result};
use datepoll_core::config::DatePollConfig;
use datepoll_core::share;
use owo_colors::OwoColorize;

use super::start_session;
use crate::render::{pluralize, render_rejected};

/// Replace local selections with a JSON file in the `selections.json` shape.
pub fn run(config: &DatePollConfig, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let raw = share::parse_snapshot_json(&json)
        .with_context(|| format!("{} is not a selections file", path.display()))?;

    let mut session = start_session(config, None)?;
    let report = match config.timezone()? {
        Some(tz) => session.import_snapshot_in(raw, &tz)?,
        None => session.import_snapshot(raw)?,
    };

    if let Some(warning) = render_rejected(&report) {
        eprintln!("{}", warning);
    }

    let count = session.state().participant_count();
    println!(
        "{} selections for {} {}.",
        "Imported".green(),
        count,
        pluralize("participant", count)
    );

    Ok(())
}
