use anyhow::Result;
use datepoll_core::config::DatePollConfig;
use owo_colors::OwoColorize;

use super::start_session;

pub fn run(config: &DatePollConfig, name: &str) -> Result<()> {
    let mut session = start_session(config, None)?;
    let previous = session.identity().cloned();
    let name = session.identify(name)?.clone();

    match previous {
        Some(previous) if previous != name => {
            println!("Switched from {} to {}.", previous, name.green());
        }
        _ => println!("Welcome, {}!", name.green()),
    }

    let picked = session.state().dates_for(name.as_str()).map_or(0, |d| d.len());
    if picked == 0 {
        println!();
        println!("Pick dates with `datepoll toggle YYYY-MM-DD`.");
    }

    Ok(())
}
