//! Local persistence behind an explicit port.
//!
//! Three independent entries are kept: the local participant's identity, the selection
//! snapshot, and a display color per participant. The core reads and writes the first
//! two. Colors belong to the presentation layer and are only exposed by `FilePersistence`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::DatePollResult;
use crate::participant::ParticipantName;
use crate::selection::Snapshot;

const IDENTITY_FILE: &str = "identity";
const SELECTIONS_FILE: &str = "selections.json";
const COLORS_FILE: &str = "colors.json";

pub trait PersistencePort {
    fn load_identity(&self) -> DatePollResult<Option<ParticipantName>>;
    fn save_identity(&mut self, name: &ParticipantName) -> DatePollResult<()>;
    fn load_snapshot(&self) -> DatePollResult<Option<Snapshot>>;
    fn save_snapshot(&mut self, snapshot: &Snapshot) -> DatePollResult<()>;
}

/// Keeps everything in memory. Used for throwaway sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    identity: Option<ParticipantName>,
    snapshot: Option<Snapshot>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, name: ParticipantName) -> Self {
        self.identity = Some(name);
        self
    }

    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn identity(&self) -> Option<&ParticipantName> {
        self.identity.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }
}

impl PersistencePort for MemoryPersistence {
    fn load_identity(&self) -> DatePollResult<Option<ParticipantName>> {
        Ok(self.identity.clone())
    }

    fn save_identity(&mut self, name: &ParticipantName) -> DatePollResult<()> {
        self.identity = Some(name.clone());
        Ok(())
    }

    fn load_snapshot(&self) -> DatePollResult<Option<Snapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save_snapshot(&mut self, snapshot: &Snapshot) -> DatePollResult<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

/// Files in a data directory (`~/.local/share/datepoll` by default).
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FilePersistence { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn selections_path(&self) -> PathBuf {
        self.dir.join(SELECTIONS_FILE)
    }

    pub fn load_colors(&self) -> DatePollResult<BTreeMap<String, String>> {
        let path = self.dir.join(COLORS_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_colors(&self, colors: &BTreeMap<String, String>) -> DatePollResult<()> {
        let content = serde_json::to_string_pretty(colors)?;
        self.write_atomic(COLORS_FILE, &content)
    }

    fn write_atomic(&self, file: &str, content: &str) -> DatePollResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(file);
        let temp = self.dir.join(file.to_string() + ".tmp");

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }
}

impl PersistencePort for FilePersistence {
    fn load_identity(&self) -> DatePollResult<Option<ParticipantName>> {
        let path = self.dir.join(IDENTITY_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        // A blank file means no one has identified yet
        Ok(ParticipantName::new(&content).ok())
    }

    fn save_identity(&mut self, name: &ParticipantName) -> DatePollResult<()> {
        self.write_atomic(IDENTITY_FILE, name.as_str())
    }

    fn load_snapshot(&self) -> DatePollResult<Option<Snapshot>> {
        let path = self.dir.join(SELECTIONS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save_snapshot(&mut self, snapshot: &Snapshot) -> DatePollResult<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        self.write_atomic(SELECTIONS_FILE, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatePollError;

    #[test]
    fn test_file_persistence_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let port = FilePersistence::new(dir.path().join("data"));

        assert!(port.load_identity().unwrap().is_none());
        assert!(port.load_snapshot().unwrap().is_none());
        assert!(port.load_colors().unwrap().is_empty());
    }

    #[test]
    fn test_file_persistence_keeps_entries_independent() {
        let dir = tempfile::tempdir().unwrap();
        let mut port = FilePersistence::new(dir.path());

        let alice = ParticipantName::new("Alice").unwrap();
        port.save_identity(&alice).unwrap();
        let snapshot = Snapshot::from([("Bob".to_string(), vec!["2024-03-01".to_string()])]);
        port.save_snapshot(&snapshot).unwrap();
        let colors = BTreeMap::from([("Bob".to_string(), "hsl(200, 70%, 50%)".to_string())]);
        port.save_colors(&colors).unwrap();

        let reopened = FilePersistence::new(dir.path());
        assert_eq!(reopened.load_identity().unwrap(), Some(alice));
        assert_eq!(reopened.load_snapshot().unwrap(), Some(snapshot));
        assert_eq!(reopened.load_colors().unwrap(), colors);
        assert!(!dir.path().join("selections.json.tmp").exists());
    }

    #[test]
    fn test_file_persistence_blank_identity_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(IDENTITY_FILE), "  \n").unwrap();

        let port = FilePersistence::new(dir.path());
        assert!(port.load_identity().unwrap().is_none());
    }

    #[test]
    fn test_file_persistence_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SELECTIONS_FILE), "{not json").unwrap();

        let port = FilePersistence::new(dir.path());
        assert!(matches!(
            port.load_snapshot(),
            Err(DatePollError::Serialization(_))
        ));
    }
}
