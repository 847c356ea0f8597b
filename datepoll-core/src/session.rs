//! Session startup.
//!
//! A session decides once, at start, where its initial state comes from: a share
//! link, the returning participant's local data, or nothing. The decision is final
//! for the lifetime of the session.

use chrono::{Local, TimeZone};
use tracing::{debug, warn};
use url::Url;

use crate::date_key::DateKey;
use crate::error::{DatePollError, DatePollResult, DecodeError};
use crate::participant::ParticipantName;
use crate::persistence::PersistencePort;
use crate::selection::{ImportReport, RawSnapshot, SelectionState, SelectionStore, Toggle};
use crate::share::{self, ShareToken};

/// Which path startup took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPath {
    /// Started from a share token. No identity is assumed.
    SharedLink,
    /// A stored identity was found and its local snapshot loaded.
    ReturningUser,
    /// Nobody has identified on this machine yet.
    FreshUser,
}

/// What the session was started with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryContext {
    pub share_token: Option<String>,
}

impl EntryContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        EntryContext {
            share_token: Some(token.into()),
        }
    }

    /// Accepts a full share URL, one pasted without its scheme, or a bare token.
    pub fn from_link(link: &str) -> Self {
        let link = link.trim();
        if link.is_empty() {
            return Self::empty();
        }

        let url = Url::parse(link).or_else(|e| {
            if link.contains('?') {
                Url::parse(&format!("https://{link}"))
            } else {
                Err(e)
            }
        });
        match url {
            Ok(url) => EntryContext {
                share_token: share::token_from_url(&url),
            },
            Err(_) => Self::with_token(link),
        }
    }
}

pub struct Session<P: PersistencePort> {
    path: BootPath,
    identity: Option<ParticipantName>,
    store: SelectionStore<P>,
    report: ImportReport,
    decode_error: Option<DecodeError>,
    load_error: Option<String>,
}

/// Start a session, reading legacy date-times in the local zone.
pub fn bootstrap<P: PersistencePort>(context: EntryContext, port: P) -> Session<P> {
    bootstrap_in(context, port, &Local)
}

pub fn bootstrap_in<P: PersistencePort, Tz: TimeZone>(
    context: EntryContext,
    port: P,
    tz: &Tz,
) -> Session<P> {
    if let Some(token) = context.share_token {
        let (state, report, decode_error) = match share::decode_in(&token, tz) {
            Ok(decoded) => (decoded.state, decoded.report, None),
            Err(e) => {
                warn!(error = %e, "Could not decode share link, starting empty");
                (SelectionState::new(), ImportReport::default(), Some(e))
            }
        };
        debug!(participants = state.participant_count(), "Booted from share link");

        return Session {
            path: BootPath::SharedLink,
            identity: None,
            store: SelectionStore::new(state, port),
            report,
            decode_error,
            load_error: None,
        };
    }

    let identity = port.load_identity().unwrap_or_else(|e| {
        warn!(error = %e, "Could not read stored identity");
        None
    });

    let mut load_error = None;
    let (state, report) = match port.load_snapshot() {
        Ok(Some(snapshot)) => SelectionState::from_snapshot_in(&snapshot, tz),
        Ok(None) => (SelectionState::new(), ImportReport::default()),
        Err(e) => {
            warn!(error = %e, "Could not read stored selections, refusing to overwrite them");
            load_error = Some(e.to_string());
            (SelectionState::new(), ImportReport::default())
        }
    };

    let path = if identity.is_some() {
        BootPath::ReturningUser
    } else {
        BootPath::FreshUser
    };
    debug!(?path, participants = state.participant_count(), "Booted from local storage");

    Session {
        path,
        identity,
        store: SelectionStore::new(state, port),
        report,
        decode_error: None,
        load_error,
    }
}

impl<P: PersistencePort> Session<P> {
    pub fn path(&self) -> BootPath {
        self.path
    }

    pub fn identity(&self) -> Option<&ParticipantName> {
        self.identity.as_ref()
    }

    pub fn is_identified(&self) -> bool {
        self.identity.is_some()
    }

    pub fn state(&self) -> &SelectionState {
        self.store.state()
    }

    pub fn store(&self) -> &SelectionStore<P> {
        &self.store
    }

    /// Entries dropped while hydrating.
    pub fn report(&self) -> &ImportReport {
        &self.report
    }

    /// Set when a share link was present but unreadable.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        self.decode_error.as_ref()
    }

    /// Set when local selections existed but could not be read. Mutations are refused
    /// until they are replaced with `import_snapshot_in`.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn ensure_writable(&self) -> DatePollResult<()> {
        match &self.load_error {
            Some(e) => Err(DatePollError::UnreadableSelections(e.clone())),
            None => Ok(()),
        }
    }

    /// Identify the local participant. The name gets an empty bucket if new, then is stored.
    ///
    /// Adding the bucket is a mutation, so the current selections are saved locally. The
    /// identity is only written once that save went through.
    pub fn identify(&mut self, name: &str) -> DatePollResult<&ParticipantName> {
        let name = ParticipantName::new(name)?;
        self.ensure_writable()?;
        self.store.ensure_participant(&name)?;
        self.store.port_mut().save_identity(&name)?;

        debug!(participant = %name, "Identified");
        Ok(self.identity.insert(name))
    }

    pub fn toggle(&mut self, date: impl Into<DateKey>) -> DatePollResult<Toggle> {
        let name = self.identity.clone().ok_or(DatePollError::NotIdentified)?;
        self.ensure_writable()?;
        self.store.toggle(&name, date)
    }

    /// Save the state currently held (e.g. from a share link) as the local snapshot.
    pub fn adopt(&mut self) -> DatePollResult<()> {
        self.ensure_writable()?;
        let state = self.store.snapshot();
        self.store.replace(state)
    }

    /// Replace all selections with imported data, reading date-times in the local zone.
    pub fn import_snapshot(&mut self, raw: RawSnapshot) -> DatePollResult<ImportReport> {
        self.import_snapshot_in(raw, &Local)
    }

    /// Replace all selections with imported data. This also recovers a session whose
    /// stored selections were unreadable.
    pub fn import_snapshot_in<Tz: TimeZone>(
        &mut self,
        raw: RawSnapshot,
        tz: &Tz,
    ) -> DatePollResult<ImportReport> {
        let report = self.store.import_snapshot_in(raw, tz)?;
        self.load_error = None;
        Ok(report)
    }

    pub fn share_token(&self) -> ShareToken {
        share::encode(self.store.state())
    }

    pub fn share_url(&self, base: &Url) -> Url {
        share::share_url(base, self.store.state())
    }
}
