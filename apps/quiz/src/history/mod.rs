//! Local history cache: the five most recent recommendation summaries,
//! most-recent-first, persisted as one JSON blob in a named slot.
//!
//! Reads never fail on a corrupted or foreign blob. Anything that is not a
//! JSON array is treated as an empty history, and individual entries are
//! normalized (see [`normalize_entry`]).

pub mod slot;

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::models::user::AuthUser;
use slot::{KeyValueSlot, SlotError};

pub const HISTORY_SLOT_KEY: &str = "recommendationHistory";
pub const HISTORY_CAPACITY: usize = 5;

/// One remembered recommendation. Read back through [`normalize_entry`],
/// never deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub text: String,
    /// Millisecond precision; serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

impl HistorySummary {
    /// A summary stamped with the current instant.
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now())
    }

    pub fn at(text: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            ts: to_millis(ts),
        }
    }
}

fn to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts.timestamp_millis())
        .single()
        .unwrap_or(ts)
}

/// Coerces one raw persisted entry into a [`HistorySummary`].
///
/// - a bare string becomes `{text: <string>, ts: now}`
/// - an object keeps its `text` (empty if absent) and `ts` (epoch millis or
///   RFC 3339); a missing or unreadable `ts` becomes `now`
/// - anything else is dropped
///
/// Idempotent: normalizing the serialized output yields the same summary.
pub fn normalize_entry(raw: &Value, now: DateTime<Utc>) -> Option<HistorySummary> {
    match raw {
        Value::String(text) => Some(HistorySummary::at(text.clone(), now)),
        Value::Object(fields) => {
            let text = match fields.get("text") {
                Some(Value::String(text)) => text.clone(),
                None | Some(Value::Null) => String::new(),
                Some(other) => other.to_string(),
            };
            let ts = fields.get("ts").and_then(parse_ts).unwrap_or(now);
            Some(HistorySummary::at(text, ts))
        }
        _ => None,
    }
}

fn parse_ts(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    }
}

/// Normalizes a whole persisted blob. Non-arrays yield an empty history.
pub fn normalize_history(raw: &Value, now: DateTime<Utc>) -> Vec<HistorySummary> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| normalize_entry(item, now))
            .collect(),
        _ => Vec::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scope
// ────────────────────────────────────────────────────────────────────────────

/// Which slot a history lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    /// One history per signed-in user; none while signed out.
    User,
    /// One history for the whole process, regardless of who is signed in.
    Device,
}

impl HistoryScope {
    pub fn slot_key(&self, user: Option<&AuthUser>) -> Option<String> {
        match self {
            HistoryScope::Device => Some(HISTORY_SLOT_KEY.to_string()),
            HistoryScope::User => user.map(|u| format!("{HISTORY_SLOT_KEY}:{}", u.uid)),
        }
    }
}

impl FromStr for HistoryScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(HistoryScope::User),
            "device" => Ok(HistoryScope::Device),
            other => anyhow::bail!("unknown history scope '{other}' (expected 'user' or 'device')"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// Bounded, ordered history over one slot key.
#[derive(Clone)]
pub struct HistoryStore {
    slot: Arc<dyn KeyValueSlot>,
    key: String,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(slot: Arc<dyn KeyValueSlot>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
            capacity: HISTORY_CAPACITY,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Most-recent-first, at most five entries.
    pub async fn list(&self) -> Result<Vec<HistorySummary>, SlotError> {
        self.load().await
    }

    /// Prepends `entry`, evicting the oldest entries beyond capacity.
    pub async fn record(&self, entry: HistorySummary) -> Result<(), SlotError> {
        let mut entries = self.load().await?;
        entries.insert(0, entry);
        entries.truncate(self.capacity);

        let blob = serde_json::to_string(&entries)?;
        self.slot.set(&self.key, &blob).await
    }

    pub async fn clear(&self) -> Result<(), SlotError> {
        self.slot.remove(&self.key).await
    }

    async fn load(&self) -> Result<Vec<HistorySummary>, SlotError> {
        let Some(blob) = self.slot.get(&self.key).await? else {
            return Ok(Vec::new());
        };

        let raw: Value = match serde_json::from_str(&blob) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, "Discarding corrupted history blob: {e}");
                return Ok(Vec::new());
            }
        };
        if !raw.is_array() {
            warn!(key = %self.key, "History blob is not a JSON array; treating as empty");
        }

        let mut entries = normalize_history(&raw, Utc::now());
        entries.truncate(self.capacity);
        Ok(entries)
    }
}
