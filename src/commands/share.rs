use anyhow::Result;
use datepoll_core::config::DatePollConfig;
use owo_colors::OwoColorize;

use super::start_session;

pub fn run(config: &DatePollConfig, token_only: bool) -> Result<()> {
    let session = start_session(config, None)?;

    if token_only {
        println!("{}", session.share_token());
        return Ok(());
    }

    if !session.state().has_selections() {
        eprintln!("{}", "Nobody has picked a date yet; the link will be empty.".dimmed());
    }

    let url = session.share_url(&config.share_base_url()?);
    println!("{}", url);

    Ok(())
}
