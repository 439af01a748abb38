//! Cursor-based pagination over the organization user listing.
//!
//! The listing has a single ordering contract: `(created_at DESC, id DESC)`,
//! with the id as deterministic tie-break for rows sharing a timestamp. A
//! cursor names the last-seen row's sort key; the next page is the rows that
//! sort strictly after it. A malformed cursor is a hard error - silently
//! restarting from page one would mask client bugs.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::util;

/// Wire form of a pagination cursor: the last-seen row's id and its
/// RFC 3339 ordering timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cursor {
    pub id: String,
    pub ts: String,
}

/// Decoded cursor: the sort key to resume after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorKey {
    pub id: String,
    pub ts: i64,
}

impl Cursor {
    /// Build a cursor from the last row kept on a page.
    pub fn encode(id: &str, ts: i64) -> Self {
        Self {
            id: id.to_string(),
            ts: util::to_rfc3339(ts),
        }
    }

    /// Parse a raw request value into a cursor.
    ///
    /// Rejects anything that is not exactly `{"id": string, "ts": string}`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| AppError::InvalidCursor(format!("malformed cursor: {}", e)))
    }

    /// Decode the ordering timestamp, failing on anything unparseable.
    pub fn decode(&self) -> Result<CursorKey> {
        let ts = DateTime::parse_from_rfc3339(&self.ts)
            .map_err(|e| AppError::InvalidCursor(format!("bad timestamp '{}': {}", self.ts, e)))?
            .timestamp();
        Ok(CursorKey {
            id: self.id.clone(),
            ts,
        })
    }
}
