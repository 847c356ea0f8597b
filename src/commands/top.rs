use anyhow::Result;
use datepoll_core::aggregate;
use datepoll_core::config::DatePollConfig;

use super::{report_hydration, start_session};
use crate::render::render_top;

pub fn run(config: &DatePollConfig, n: Option<usize>, link: Option<&str>) -> Result<()> {
    let session = start_session(config, link)?;
    report_hydration(&session);

    let n = n.unwrap_or(config.top_n);
    let ranked = aggregate::top_preferred_dates(session.state(), n);
    println!("{}", render_top(&ranked, n));

    Ok(())
}
