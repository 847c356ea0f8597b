pub mod import;
pub mod join;
pub mod open;
pub mod share;
pub mod show;
pub mod toggle;
pub mod top;
pub mod whoami;

use anyhow::Result;
use datepoll_core::DateKey;
use datepoll_core::config::DatePollConfig;
use datepoll_core::persistence::{FilePersistence, PersistencePort};
use datepoll_core::session::{self, BootPath, EntryContext, Session};
use owo_colors::OwoColorize;

use crate::colors::Palette;
use crate::render;

/// Start a session as configured. `link` is a share URL or bare token from the command line.
pub fn start_session(
    config: &DatePollConfig,
    link: Option<&str>,
) -> Result<Session<FilePersistence>> {
    let context = link.map(EntryContext::from_link).unwrap_or_default();
    let port = config.persistence();

    let session = match config.timezone()? {
        Some(tz) => session::bootstrap_in(context, port, &tz),
        None => session::bootstrap(context, port),
    };
    Ok(session)
}

/// Parse a date typed on the command line in the configured zone.
pub fn parse_date(config: &DatePollConfig, input: &str) -> Result<DateKey> {
    let key = match config.timezone()? {
        Some(tz) => DateKey::parse_in(input, &tz)?,
        None => input.parse()?,
    };
    Ok(key)
}

/// Colors for everyone in the session. Viewing a share link never writes the color cache.
pub fn palette_for(session: &Session<FilePersistence>) -> Palette {
    let port = session.store().port();
    match session.path() {
        BootPath::SharedLink => Palette::view(port, session.state()),
        BootPath::ReturningUser | BootPath::FreshUser => Palette::load(port, session.state()),
    }
}

/// Tell the user about anything that went wrong while hydrating the session.
pub fn report_hydration<P: PersistencePort>(session: &Session<P>) {
    if let Some(e) = session.load_error() {
        eprintln!(
            "{} {}. Edits are refused until it is fixed or replaced via `datepoll import`.",
            "Could not read stored selections:".red(),
            e
        );
    }
    if let Some(e) = session.decode_error() {
        eprintln!(
            "{} {}. Showing an empty calendar instead.",
            "Could not read share link:".red(),
            e
        );
    }
    if let Some(warning) = render::render_rejected(session.report()) {
        eprintln!("{}", warning);
    }
}

#[cfg(test)]
pub fn test_config(dir: &std::path::Path) -> DatePollConfig {
    DatePollConfig {
        data_dir: dir.to_path_buf(),
        timezone: Some("UTC".to_string()),
        ..Default::default()
    }
}
