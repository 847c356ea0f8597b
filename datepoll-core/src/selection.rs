//! Per-participant date selections.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use tracing::{debug, warn};

use crate::date_key::DateKey;
use crate::error::{DateParseError, DatePollResult};
use crate::participant::ParticipantName;
use crate::persistence::PersistencePort;

/// Exported form of a `SelectionState`: participant name to `YYYY-MM-DD` strings.
///
/// This is also the JSON shape written to local storage and embedded in share tokens.
pub type Snapshot = BTreeMap<String, Vec<String>>;

/// Import form: participant name to date-like values that still need normalizing.
pub type RawSnapshot = BTreeMap<String, Vec<DateInput>>;

/// A date-like value on its way into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// ISO-8601 text, either a plain date or a date-time.
    Text(String),
    Date(NaiveDate),
    /// An instant. Reduced to the calendar day it falls on in the import zone.
    Instant(DateTime<FixedOffset>),
}

impl DateInput {
    pub fn resolve_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<DateKey, DateParseError> {
        match self {
            DateInput::Text(s) => DateKey::parse_in(s, tz),
            DateInput::Date(date) => Ok(DateKey::from(*date)),
            DateInput::Instant(dt) => Ok(DateKey::from(dt.with_timezone(tz))),
        }
    }

    fn describe(&self) -> String {
        match self {
            DateInput::Text(s) => s.clone(),
            DateInput::Date(date) => date.to_string(),
            DateInput::Instant(dt) => dt.to_rfc3339(),
        }
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<DateKey> for DateInput {
    fn from(key: DateKey) -> Self {
        DateInput::Date(key.date())
    }
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        DateInput::Instant(dt)
    }
}

/// Why an import entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidDate(DateParseError),
    /// The whole bucket was dropped because its name is blank.
    EmptyParticipant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub participant: String,
    pub value: String,
    pub reason: RejectReason,
}

/// Outcome of an import. Valid entries are always kept; invalid ones are listed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rejected: Vec<RejectedEntry>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn rejected_values(&self) -> Vec<&str> {
        self.rejected.iter().map(|r| r.value.as_str()).collect()
    }
}

/// Result of toggling one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Participant to selected dates. Cloning gives an independent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selections: BTreeMap<ParticipantName, BTreeSet<DateKey>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one date for one participant, creating the participant if needed.
    pub fn toggle(&mut self, participant: &ParticipantName, date: impl Into<DateKey>) -> Toggle {
        let key = date.into();
        let dates = self.selections.entry(participant.clone()).or_default();

        if dates.remove(&key) {
            Toggle::Removed
        } else {
            dates.insert(key);
            Toggle::Added
        }
    }

    /// Like `toggle`, but leaves `self` untouched and returns the new state.
    pub fn with_toggled(&self, participant: &ParticipantName, date: impl Into<DateKey>) -> Self {
        let mut next = self.clone();
        next.toggle(participant, date);
        next
    }

    /// Ensure a (possibly empty) bucket exists. Returns true if it was created.
    pub fn insert_participant(&mut self, participant: &ParticipantName) -> bool {
        if self.selections.contains_key(participant) {
            return false;
        }
        self.selections.insert(participant.clone(), BTreeSet::new());
        true
    }

    pub fn is_selected(&self, participant: &str, date: DateKey) -> bool {
        self.selections
            .get(participant)
            .is_some_and(|dates| dates.contains(&date))
    }

    pub fn dates_for(&self, participant: &str) -> Option<&BTreeSet<DateKey>> {
        self.selections.get(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantName> {
        self.selections.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantName, &BTreeSet<DateKey>)> {
        self.selections.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.selections.len()
    }

    /// No participants at all.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// At least one participant has at least one date.
    pub fn has_selections(&self) -> bool {
        self.selections.values().any(|dates| !dates.is_empty())
    }

    pub fn export_snapshot(&self) -> Snapshot {
        self.selections
            .iter()
            .map(|(name, dates)| {
                let dates = dates.iter().map(DateKey::to_string).collect();
                (name.to_string(), dates)
            })
            .collect()
    }

    /// Build a fresh state from raw input, resolving date-times in `tz`.
    pub fn import_snapshot_in<Tz: TimeZone>(raw: RawSnapshot, tz: &Tz) -> (Self, ImportReport) {
        let mut state = SelectionState::new();
        let mut report = ImportReport::default();

        for (raw_name, inputs) in raw {
            let Ok(name) = ParticipantName::new(&raw_name) else {
                warn!(participant = %raw_name, "Dropping import bucket with blank name");
                report.rejected.push(RejectedEntry {
                    participant: raw_name.clone(),
                    value: raw_name,
                    reason: RejectReason::EmptyParticipant,
                });
                continue;
            };

            // Names that trim to the same value merge into one bucket.
            let dates = state.selections.entry(name).or_default();

            for input in inputs {
                match input.resolve_in(tz) {
                    Ok(key) => {
                        dates.insert(key);
                    }
                    Err(e) => {
                        warn!(participant = %raw_name, error = %e, "Rejecting import entry");
                        report.rejected.push(RejectedEntry {
                            participant: raw_name.clone(),
                            value: input.describe(),
                            reason: RejectReason::InvalidDate(e),
                        });
                    }
                }
            }
        }

        (state, report)
    }

    /// Import an exported (string-only) snapshot.
    pub fn from_snapshot_in<Tz: TimeZone>(snapshot: &Snapshot, tz: &Tz) -> (Self, ImportReport) {
        let raw = snapshot
            .iter()
            .map(|(name, dates)| {
                let inputs = dates.iter().map(|d| DateInput::from(d.as_str())).collect();
                (name.clone(), inputs)
            })
            .collect();
        Self::import_snapshot_in(raw, tz)
    }
}

/// The session's single source of truth, saved through a persistence port after
/// every mutation.
///
/// A mutation is committed in memory only after the save succeeds, so a failed save
/// leaves the store at its last-known-good state.
pub struct SelectionStore<P: PersistencePort> {
    state: SelectionState,
    port: P,
}

impl<P: PersistencePort> SelectionStore<P> {
    pub fn new(state: SelectionState, port: P) -> Self {
        SelectionStore { state, port }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// An owned copy that later mutations cannot affect.
    pub fn snapshot(&self) -> SelectionState {
        self.state.clone()
    }

    pub fn export_snapshot(&self) -> Snapshot {
        self.state.export_snapshot()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn toggle(
        &mut self,
        participant: &ParticipantName,
        date: impl Into<DateKey>,
    ) -> DatePollResult<Toggle> {
        let key = date.into();
        let mut next = self.state.clone();
        let outcome = next.toggle(participant, key);
        self.commit(next)?;

        debug!(participant = %participant, date = %key, ?outcome, "Toggled date");
        Ok(outcome)
    }

    pub fn ensure_participant(&mut self, participant: &ParticipantName) -> DatePollResult<()> {
        if self.state.dates_for(participant.as_str()).is_some() {
            return Ok(());
        }
        let mut next = self.state.clone();
        next.insert_participant(participant);
        self.commit(next)
    }

    /// Replace the entire state.
    pub fn replace(&mut self, state: SelectionState) -> DatePollResult<()> {
        self.commit(state)
    }

    /// Replace the entire state with imported data. Invalid entries are reported, not fatal.
    pub fn import_snapshot_in<Tz: TimeZone>(
        &mut self,
        raw: RawSnapshot,
        tz: &Tz,
    ) -> DatePollResult<ImportReport> {
        let (state, report) = SelectionState::import_snapshot_in(raw, tz);
        self.commit(state)?;
        Ok(report)
    }

    fn commit(&mut self, next: SelectionState) -> DatePollResult<()> {
        self.port.save_snapshot(&next.export_snapshot())?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatePollError;
    use crate::persistence::MemoryPersistence;
    use chrono::Utc;

    fn name(s: &str) -> ParticipantName {
        ParticipantName::new(s).unwrap()
    }

    fn key(s: &str) -> DateKey {
        DateKey::parse_in(s, &Utc).unwrap()
    }

    /// Port whose snapshot writes always fail.
    struct ReadOnlyPort;

    impl PersistencePort for ReadOnlyPort {
        fn load_identity(&self) -> DatePollResult<Option<ParticipantName>> {
            Ok(None)
        }
        fn save_identity(&mut self, _: &ParticipantName) -> DatePollResult<()> {
            Ok(())
        }
        fn load_snapshot(&self) -> DatePollResult<Option<Snapshot>> {
            Ok(None)
        }
        fn save_snapshot(&mut self, _: &Snapshot) -> DatePollResult<()> {
            Err(DatePollError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn test_toggle_is_an_involution() {
        let mut state = SelectionState::new();
        let alice = name("Alice");
        state.toggle(&alice, key("2024-03-01"));
        let before = state.clone();

        assert_eq!(state.toggle(&alice, key("2024-03-02")), Toggle::Added);
        assert_eq!(state.toggle(&alice, key("2024-03-02")), Toggle::Removed);
        assert_eq!(state, before);
    }

    #[test]
    fn test_toggle_ignores_time_of_day() {
        let mut state = SelectionState::new();
        let alice = name("Alice");
        let morning = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 3, 1, 22, 15, 0).unwrap();

        assert_eq!(state.toggle(&alice, morning), Toggle::Added);
        assert_eq!(state.toggle(&alice, night), Toggle::Removed);
        assert!(state.dates_for("Alice").unwrap().is_empty());
    }

    #[test]
    fn test_with_toggled_does_not_alias_previous_snapshot() {
        let original = SelectionState::new();
        let next = original.with_toggled(&name("Bob"), key("2024-03-01"));

        assert!(original.is_empty());
        assert!(next.is_selected("Bob", key("2024-03-01")));
    }

    #[test]
    fn test_export_is_sorted_and_keeps_empty_participants() {
        let mut state = SelectionState::new();
        state.toggle(&name("Zed"), key("2024-03-09"));
        state.toggle(&name("Zed"), key("2024-03-02"));
        state.insert_participant(&name("Amy"));

        let snapshot = state.export_snapshot();
        let entries: Vec<_> = snapshot.iter().collect();
        assert_eq!(entries[0].0, "Amy");
        assert!(entries[0].1.is_empty());
        assert_eq!(entries[1].1, &vec!["2024-03-02".to_string(), "2024-03-09".to_string()]);
    }

    #[test]
    fn test_import_keeps_valid_entries_and_reports_rejects() {
        let raw = RawSnapshot::from([(
            "Carol".to_string(),
            vec![DateInput::from("not-a-date"), DateInput::from("2024-03-05")],
        )]);

        let (state, report) = SelectionState::import_snapshot_in(raw, &Utc);

        let carol: Vec<_> = state.dates_for("Carol").unwrap().iter().collect();
        assert_eq!(carol, vec![&key("2024-03-05")]);
        assert_eq!(report.rejected_values(), vec!["not-a-date"]);
        assert_eq!(report.rejected[0].participant, "Carol");
        assert!(matches!(report.rejected[0].reason, RejectReason::InvalidDate(_)));
    }

    #[test]
    fn test_import_normalizes_mixed_inputs() {
        let instant = DateTime::parse_from_rfc3339("2024-03-01T12:00:00+02:00").unwrap();
        let raw = RawSnapshot::from([(
            " Dan ".to_string(),
            vec![
                DateInput::from(instant),
                DateInput::from("2024-03-01T00:00:00.000Z"),
                DateInput::from(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()),
            ],
        )]);

        let (state, report) = SelectionState::import_snapshot_in(raw, &Utc);

        assert!(report.is_clean());
        let dan: Vec<String> = state
            .dates_for("Dan")
            .unwrap()
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(dan, vec!["2024-03-01", "2024-03-07"]);
    }

    #[test]
    fn test_import_rejects_blank_participant_bucket() {
        let raw = RawSnapshot::from([
            ("  ".to_string(), vec![DateInput::from("2024-03-05")]),
            ("Eve".to_string(), vec![DateInput::from("2024-03-06")]),
        ]);

        let (state, report) = SelectionState::import_snapshot_in(raw, &Utc);

        assert_eq!(state.participant_count(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].reason, RejectReason::EmptyParticipant);
    }

    #[test]
    fn test_import_merges_names_that_trim_equal() {
        let raw = RawSnapshot::from([
            ("Alice".to_string(), vec![DateInput::from("2024-03-01")]),
            ("Alice ".to_string(), vec![DateInput::from("2024-03-02")]),
        ]);

        let (state, _) = SelectionState::import_snapshot_in(raw, &Utc);

        assert_eq!(state.participant_count(), 1);
        assert_eq!(state.dates_for("Alice").unwrap().len(), 2);
    }

    #[test]
    fn test_store_saves_after_toggle() {
        let mut store = SelectionStore::new(SelectionState::new(), MemoryPersistence::new());
        store.toggle(&name("Alice"), key("2024-03-01")).unwrap();

        let saved = store.port().snapshot().cloned().unwrap();
        assert_eq!(saved["Alice"], vec!["2024-03-01".to_string()]);
    }

    #[test]
    fn test_store_import_replaces_state() {
        let mut store = SelectionStore::new(SelectionState::new(), MemoryPersistence::new());
        store.toggle(&name("Alice"), key("2024-03-01")).unwrap();

        let raw = RawSnapshot::from([("Bob".to_string(), vec![DateInput::from("2024-04-01")])]);
        let report = store.import_snapshot_in(raw, &Utc).unwrap();

        assert!(report.is_clean());
        assert!(store.state().dates_for("Alice").is_none());
        assert!(store.state().is_selected("Bob", key("2024-04-01")));
    }

    #[test]
    fn test_store_keeps_last_known_good_state_when_save_fails() {
        let mut initial = SelectionState::new();
        initial.toggle(&name("Alice"), key("2024-03-01"));
        let mut store = SelectionStore::new(initial.clone(), ReadOnlyPort);

        assert!(store.toggle(&name("Alice"), key("2024-03-02")).is_err());
        assert!(store.ensure_participant(&name("Bob")).is_err());
        assert_eq!(store.state(), &initial);
    }
}
