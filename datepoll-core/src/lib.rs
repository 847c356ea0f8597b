//! Core types for datepoll.
//!
//! Participants mark preferred dates, the overlap is ranked, and the whole selection
//! can be shared as a self-contained link:
//! - `date_key` canonical calendar-day identity
//! - `selection` per-participant selections and the persisted store
//! - `aggregate` counts and rankings over a snapshot
//! - `share` share tokens and URLs
//! - `session` startup from a share link, local data, or nothing

pub mod aggregate;
pub mod config;
pub mod date_key;
pub mod error;
pub mod participant;
pub mod persistence;
pub mod selection;
pub mod session;
pub mod share;

pub use date_key::{DateKey, YearMonth};
pub use error::{DatePollError, DatePollResult, DateParseError, DecodeError};
pub use participant::ParticipantName;
pub use selection::{SelectionState, SelectionStore, Snapshot};
