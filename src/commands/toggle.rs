use anyhow::Result;
use datepoll_core::DateKey;
use datepoll_core::config::DatePollConfig;
use datepoll_core::selection::Toggle;
use owo_colors::OwoColorize;

use super::{parse_date, start_session};
use crate::render::Render;

pub fn run(config: &DatePollConfig, dates: &[String]) -> Result<()> {
    let mut session = start_session(config, None)?;
    let keys = parse_all(config, dates)?;

    for key in keys {
        match session.toggle(key)? {
            Toggle::Added => println!("{} {}", "+".green(), key.render().green()),
            Toggle::Removed => println!("{} {}", "-".red(), key.render().red()),
        }
    }

    Ok(())
}

/// Parse everything first so a typo doesn't leave a half-applied change.
fn parse_all(config: &DatePollConfig, dates: &[String]) -> Result<Vec<DateKey>> {
    dates.iter().map(|d| parse_date(config, d)).collect()
}
