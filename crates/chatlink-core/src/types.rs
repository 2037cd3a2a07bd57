//! Log-entry schema at the panel boundary.
//!
//! The panel returns loosely-typed console rows; [`RawLogEntry`] mirrors that
//! wire shape with every field optional. [`LogEntry::parse`] is the single
//! place loose rows become strict values — a row with a missing or
//! unparseable timestamp is dropped there, never defaulted downstream.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Console kind ────────────────────────────────────────────────────

/// What flavor of console an endpoint speaks. Affects outbound formatting:
/// Minecraft consoles take tellraw JSON components, everything else takes
/// the plain quoted-string variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    Minecraft,
    #[default]
    Generic,
}

impl ConsoleKind {
    /// Derive the kind from the panel's module string.
    #[must_use]
    pub fn from_module(module: &str) -> Self {
        if module.to_ascii_lowercase().contains("minecraft") {
            Self::Minecraft
        } else {
            Self::Generic
        }
    }
}

// ─── Entry kind ──────────────────────────────────────────────────────

/// Classification tag carried by a console row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A player chat line.
    Chat,
    /// Console/command output.
    Console,
    /// Anything else (join/leave notices, plugin spam, ...).
    Other,
}

impl EntryKind {
    /// Classify the panel's free-form type tag. The panel is not consistent
    /// about casing or exact values, so this matches substrings the same way
    /// the filters downstream expect.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        if tag.contains("chat") {
            Self::Chat
        } else if tag.contains("console") {
            Self::Console
        } else {
            Self::Other
        }
    }
}

// ─── Wire shape ──────────────────────────────────────────────────────

/// A console row exactly as the panel serializes it. All fields optional;
/// [`LogEntry::parse`] decides what survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Sender name ("source" in the panel's vocabulary).
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub contents: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

// ─── Strict schema ───────────────────────────────────────────────────

/// A parsed, timezone-normalized console entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub content: String,
    pub kind: EntryKind,
}

impl LogEntry {
    /// Parse a loose panel row into the strict schema.
    ///
    /// Returns `None` when the timestamp is missing or unparseable; such
    /// rows cannot be ordered against the watermark and are dropped.
    /// Missing sender/content become empty strings — the filter chain
    /// rejects those later with an explicit reason.
    #[must_use]
    pub fn parse(raw: &RawLogEntry) -> Option<Self> {
        let ts = parse_timestamp(raw.timestamp.as_deref()?)?;
        Some(Self {
            timestamp: ts,
            sender: raw.source.clone().unwrap_or_default(),
            content: raw.contents.clone().unwrap_or_default(),
            kind: EntryKind::from_tag(raw.kind.as_deref().unwrap_or_default()),
        })
    }
}

/// Parse an ISO-8601-ish timestamp to UTC. Offset-less timestamps are
/// treated as already UTC, matching the panel's behavior.
fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}
