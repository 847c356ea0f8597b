//! TUI rendering for datepoll.
//!
//! Month grid with per-day shading, the ranked dates, and per-participant panels.

use datepoll_core::aggregate::{self, DateStat};
use datepoll_core::selection::{ImportReport, RejectReason};
use datepoll_core::{DateKey, SelectionState, YearMonth};
use owo_colors::{OwoColorize, Style};

use crate::colors::Palette;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
/// Fits the widest label, `31 (99+)`.
const CELL_WIDTH: usize = 9;
/// Larger counts are shown as `99+`.
const MAX_CELL_COUNT: usize = 99;

/// Shading runs from faint to strong blue as more participants pick a day.
const SHADE_BASE: (u8, u8, u8) = (59, 130, 246);
const MIN_OPACITY: f64 = 0.1;
const MAX_OPACITY: f64 = 0.9;

/// Extension trait for TUI rendering.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for DateKey {
    fn render(&self) -> String {
        self.date().format("%m/%d/%y").to_string()
    }
}

impl Render for YearMonth {
    fn render(&self) -> String {
        format!("📅 {}", self.title())
    }
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Blend the base color over a white background.
fn shade(intensity: f64) -> (u8, u8, u8) {
    let opacity = MIN_OPACITY + (MAX_OPACITY - MIN_OPACITY) * intensity.clamp(0.0, 1.0);
    let blend = |c: u8| (255.0 - (255.0 - c as f64) * opacity).round() as u8;
    (blend(SHADE_BASE.0), blend(SHADE_BASE.1), blend(SHADE_BASE.2))
}

fn cell_label(day: u32, count: usize) -> String {
    match count {
        0 => day.to_string(),
        n if n > MAX_CELL_COUNT => format!("{day} ({MAX_CELL_COUNT}+)"),
        n => format!("{day} ({n})"),
    }
}

fn render_cell(stat: &DateStat, max: usize, mine: Option<&str>) -> String {
    let label = cell_label(stat.date.day(), stat.count);
    let cell = format!("{:^width$}", label, width = CELL_WIDTH);

    if stat.count == 0 {
        return cell;
    }

    let (r, g, b) = shade(aggregate::intensity(stat.count, max));
    let mut style = Style::new().black().on_truecolor(r, g, b);
    if mine.is_some_and(|me| stat.participants.iter().any(|p| p.as_str() == me)) {
        style = style.bold();
    }
    cell.style(style).to_string()
}

/// A Sunday-first month grid. Picked days show their participant count, and a line
/// per picked day below the grid names who picked it.
pub fn render_month(
    state: &SelectionState,
    month: YearMonth,
    mine: Option<&str>,
    palette: &Palette,
) -> String {
    let stats = aggregate::month_stats(state, month);
    let max = aggregate::max_participants_on_any_date(state);

    let mut lines = vec![month.render().bold().to_string()];
    let header: String = WEEKDAYS
        .iter()
        .map(|d| format!("{:^width$}", d, width = CELL_WIDTH))
        .collect();
    lines.push(header.dimmed().to_string());

    let mut column = month.first_weekday() as usize;
    let mut row = " ".repeat(CELL_WIDTH * column);
    for stat in &stats {
        row.push_str(&render_cell(stat, max, mine));
        column += 1;
        if column == WEEKDAYS.len() {
            lines.push(std::mem::take(&mut row));
            column = 0;
        }
    }
    if !row.is_empty() {
        lines.push(row);
    }

    let picked: Vec<&DateStat> = stats.iter().filter(|stat| stat.count > 0).collect();
    if !picked.is_empty() {
        lines.push(String::new());
    }
    for stat in picked {
        let names: Vec<String> = stat
            .participants
            .iter()
            .map(|name| palette.paint(name.as_str()))
            .collect();
        lines.push(format!("{:>4}  {}", stat.date.day(), names.join(", ")));
    }

    lines.join("\n")
}

pub fn render_top(ranked: &[(DateKey, usize)], n: usize) -> String {
    let mut lines = vec![format!("Top {n} preferred dates:").bold().to_string()];

    if ranked.is_empty() {
        lines.push(format!("   {}", "No dates picked yet".dimmed()));
    }
    for (date, count) in ranked {
        lines.push(format!(
            "   {} - {} {}",
            date.render(),
            count,
            pluralize("participant", *count)
        ));
    }

    lines.join("\n")
}

/// Busiest participants first, each with their picked dates.
pub fn render_participants(state: &SelectionState, palette: &Palette) -> String {
    let mut lines = vec!["Selected dates by participant:".bold().to_string()];

    let participants = aggregate::participants_by_selection_count(state);
    if participants.is_empty() {
        lines.push(format!("   {}", "Nobody has joined yet".dimmed()));
    }

    for (name, count) in participants {
        lines.push(format!(
            "   {} {} {}",
            palette.paint(name.as_str()),
            count,
            pluralize("date", count)
        ));
        if let Some(dates) = state.dates_for(name.as_str()).filter(|d| !d.is_empty()) {
            let dates: Vec<String> = dates.iter().map(Render::render).collect();
            lines.push(format!("      {}", dates.join(", ").dimmed()));
        }
    }

    lines.join("\n")
}

/// Warnings for entries dropped while reading a link or local data.
pub fn render_rejected(report: &ImportReport) -> Option<String> {
    if report.is_clean() {
        return None;
    }

    let lines: Vec<String> = report
        .rejected
        .iter()
        .map(|entry| {
            let reason = match &entry.reason {
                RejectReason::InvalidDate(e) => e.to_string(),
                RejectReason::EmptyParticipant => "participant name is blank".to_string(),
            };
            format!(
                "   {} {}: '{}' ({})",
                "!".yellow(),
                entry.participant,
                entry.value,
                reason
            )
        })
        .collect();

    Some(format!(
        "{}\n{}",
        "Some entries were skipped:".yellow(),
        lines.join("\n")
    ))
}

pub fn render_overview(
    state: &SelectionState,
    month: YearMonth,
    top_n: usize,
    mine: Option<&str>,
    palette: &Palette,
) -> String {
    let ranked = aggregate::top_preferred_dates(state, top_n);
    [
        render_month(state, month, mine, palette),
        render_top(&ranked, top_n),
        render_participants(state, palette),
    ]
    .join("\n\n")
}
