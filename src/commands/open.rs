use anyhow::Result;
use datepoll_core::aggregate;
use datepoll_core::config::DatePollConfig;
use datepoll_core::{DecodeError, SelectionState, YearMonth};
use owo_colors::OwoColorize;

use super::{palette_for, report_hydration, start_session};
use crate::render::render_overview;

pub fn run(config: &DatePollConfig, link: &str, adopt: bool) -> Result<()> {
    let mut session = start_session(config, Some(link))?;
    report_hydration(&session);

    let month = opening_month(session.state());
    let palette = palette_for(&session);
    println!(
        "{}",
        render_overview(session.state(), month, config.top_n, None, &palette)
    );

    if adopt {
        ensure_adoptable(session.decode_error())?;
        session.adopt()?;
        println!();
        println!("{}", "Saved the shared selections as your local data.".green());
        println!("Run `datepoll join <name>` to add your own dates.");
    }

    Ok(())
}

/// The month of the most preferred date, or the current one when nothing is picked.
fn opening_month(state: &SelectionState) -> YearMonth {
    aggregate::top_preferred_dates(state, 1)
        .first()
        .map(|(date, _)| YearMonth::containing(*date))
        .unwrap_or_else(YearMonth::current)
}

/// An unreadable link decodes to an empty calendar, which must not replace local data.
fn ensure_adoptable(decode_error: Option<&DecodeError>) -> Result<()> {
    if let Some(e) = decode_error {
        anyhow::bail!("Not saving: the share link could not be read ({e})");
    }
    Ok(())
}
