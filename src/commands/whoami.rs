use anyhow::Result;
use datepoll_core::config::DatePollConfig;
use owo_colors::OwoColorize;

use super::start_session;

pub fn run(config: &DatePollConfig) -> Result<()> {
    let session = start_session(config, None)?;

    match session.identity() {
        Some(name) => println!("{}", name.green()),
        None => println!(
            "{}",
            "Not identified yet. Run `datepoll join <name>`.".dimmed()
        ),
    }

    Ok(())
}
