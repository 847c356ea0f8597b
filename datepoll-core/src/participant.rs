//! Participant identity.
//!
//! Participants are identified only by their display name. There is no uniqueness
//! check: two people entering the same name share one bucket of dates.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DatePollError;

/// A trimmed, non-empty display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn new(name: &str) -> Result<Self, DatePollError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DatePollError::InvalidParticipant(
                "name must not be blank".into(),
            ));
        }
        Ok(ParticipantName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ParticipantName {
    type Err = DatePollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParticipantName::new(s)
    }
}

impl AsRef<str> for ParticipantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ParticipantName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ParticipantName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ParticipantName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        let name = ParticipantName::new("  Alice \n").unwrap();
        assert_eq!(name.as_str(), "Alice");
        assert_eq!(name, ParticipantName::new("Alice").unwrap());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        assert!(matches!(
            ParticipantName::new("   "),
            Err(DatePollError::InvalidParticipant(_))
        ));
        assert!(serde_json::from_str::<ParticipantName>("\"\"").is_err());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert_ne!(
            ParticipantName::new("alice").unwrap(),
            ParticipantName::new("Alice").unwrap()
        );
    }
}
