use anyhow::{Result, anyhow};
use datepoll_core::YearMonth;
use datepoll_core::config::DatePollConfig;
use datepoll_core::error::DatePollError;
use datepoll_core::session::BootPath;

use super::{palette_for, report_hydration, start_session};
use crate::render::render_overview;

/// `offset` moves away from the chosen month: negative is earlier, positive later.
pub fn run(
    config: &DatePollConfig,
    month: Option<&str>,
    offset: i32,
    link: Option<&str>,
) -> Result<()> {
    let session = start_session(config, link)?;
    require_identity(session.path())?;
    report_hydration(&session);

    let month = resolve_month(month, offset)?;
    let palette = palette_for(&session);
    let mine = session.identity().map(|name| name.as_str());

    println!(
        "{}",
        render_overview(session.state(), month, config.top_n, mine, &palette)
    );

    Ok(())
}

/// The calendar stays hidden until someone identifies on this machine. Links can
/// always be viewed.
fn require_identity(path: BootPath) -> Result<(), DatePollError> {
    match path {
        BootPath::FreshUser => Err(DatePollError::NotIdentified),
        BootPath::SharedLink | BootPath::ReturningUser => Ok(()),
    }
}

fn resolve_month(month: Option<&str>, offset: i32) -> Result<YearMonth> {
    let mut month = match month {
        Some(m) => m.parse::<YearMonth>()?,
        None => YearMonth::current(),
    };

    for _ in 0..offset.unsigned_abs() {
        let stepped = if offset < 0 {
            month.previous()
        } else {
            month.next()
        };
        month = stepped.ok_or_else(|| anyhow!("No month {offset:+} from {month}"))?;
    }
    Ok(month)
}
