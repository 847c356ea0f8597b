//! Share links.
//!
//! A share token is the JSON snapshot (`{"name": ["YYYY-MM-DD", ...]}`) encoded as
//! unpadded URL-safe base64. Its alphabet needs no escaping inside a query string,
//! so the token travels through a URL unchanged.
//!
//! Older links carry the JSON itself, percent-encoded, with full ISO date-time strings.
//! `decode` accepts those as well.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Local, TimeZone};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::DecodeError;
use crate::selection::{DateInput, ImportReport, RawSnapshot, SelectionState};

/// Query parameter that carries the token.
pub const SHARE_QUERY_PARAM: &str = "sharedData";

/// How many layers of percent-encoding a legacy token may arrive with.
const MAX_PERCENT_LAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded share. The state is new; it is never merged into anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedShare {
    pub state: SelectionState,
    pub report: ImportReport,
}

pub fn encode(state: &SelectionState) -> ShareToken {
    let object: serde_json::Map<String, Value> = state
        .export_snapshot()
        .into_iter()
        .map(|(name, dates)| (name, Value::from(dates)))
        .collect();
    let json = Value::Object(object).to_string();

    ShareToken(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token, placing date-times from legacy links in the local zone.
pub fn decode(token: &str) -> Result<DecodedShare, DecodeError> {
    decode_in(token, &Local)
}

pub fn decode_in<Tz: TimeZone>(token: &str, tz: &Tz) -> Result<DecodedShare, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let json = if is_legacy(token) {
        debug!("Decoding legacy JSON share token");
        percent_decode_json(token)?
    } else {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim_end_matches('='))
            .map_err(|e| DecodeError::Base64(e.to_string()))?;
        String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?
    };

    let raw = parse_snapshot_json(&json)?;
    let (state, report) = SelectionState::import_snapshot_in(raw, tz);

    if !report.is_clean() {
        warn!(rejected = report.rejected.len(), "Share token had invalid entries");
    }

    Ok(DecodedShare { state, report })
}

/// `base` with the `sharedData` parameter set to a fresh token. Other parameters are kept.
pub fn share_url(base: &Url, state: &SelectionState) -> Url {
    let token = encode(state);
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != SHARE_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(SHARE_QUERY_PARAM, token.as_str());
    }
    url
}

/// The token carried by a share URL, already percent-decoded once by the URL parser.
pub fn token_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == SHARE_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn is_legacy(token: &str) -> bool {
    ["{", "%7B", "%7b", "%25"]
        .iter()
        .any(|prefix| token.starts_with(prefix))
}

fn percent_decode_json(token: &str) -> Result<String, DecodeError> {
    let mut text = token.to_string();
    for _ in 0..MAX_PERCENT_LAYERS {
        if !text.starts_with('%') {
            break;
        }
        text = urlencoding::decode(&text)
            .map_err(|_| DecodeError::Utf8)?
            .into_owned();
    }
    Ok(text)
}

/// Read the JSON snapshot shape used by tokens and by `selections.json`.
///
/// Only the shape is checked here. Dates are validated when the result is imported.
pub fn parse_snapshot_json(json: &str) -> Result<RawSnapshot, DecodeError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| DecodeError::Payload(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(DecodeError::Payload("expected an object of participants".into()));
    };

    let mut raw = BTreeMap::new();
    for (name, dates) in object {
        let Value::Array(dates) = dates else {
            return Err(DecodeError::Payload(format!(
                "dates for '{name}' are not a list"
            )));
        };
        // Non-string entries are kept as text so the import reports them individually
        let inputs = dates
            .into_iter()
            .map(|date| match date {
                Value::String(s) => DateInput::Text(s),
                other => DateInput::Text(other.to_string()),
            })
            .collect();
        raw.insert(name, inputs);
    }
    Ok(raw)
}
