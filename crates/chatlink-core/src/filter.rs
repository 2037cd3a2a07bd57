//! Chat classification: separates real player chat from server noise,
//! protocol echo, and pseudo-senders.
//!
//! The chain is a fixed-order list of named rules, each an independent
//! predicate. Evaluation short-circuits on the first rejection so rule
//! order is part of the contract (and visible in tests).

use crate::types::{EntryKind, LogEntry};

/// Why an entry was rejected by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not tagged as player chat.
    NotChat,
    /// Sender or content is empty.
    EmptyField,
    /// Matches the bridge's own broadcast format — forwarding it again
    /// would loop.
    EchoFormat,
    /// Bracket-prefixed server line (plugin tags, announcements).
    BracketPrefix,
    /// Sender name outside the plausible player-name range.
    SenderLength,
    /// Matches a known noise signature (tick monitors, whispers).
    NoiseSignature,
    /// Sender is a server pseudo-entity, not a player.
    SystemAccount,
}

/// Pseudo-senders that show up in modded-server console output and must
/// never be bridged as players.
const SYSTEM_ACCOUNTS: &[&str] = &[
    "server",
    "console",
    "rcon",
    "tip",
    "ftbteambases",
    "dimdungeons",
    "compactmachines",
    "storage",
    "twilight",
    "the",
    "overworld",
    "nether",
    "end",
    "irons_spellbooks",
    "ftb",
    "irregular_implements",
    "spatial",
];

/// Longest sender accepted as a player name.
const MAX_SENDER_LEN: usize = 32;

type Rule = (&'static str, fn(&LogEntry) -> Option<Rejection>);

/// The chain, in evaluation order.
const RULES: &[Rule] = &[
    ("chat_type", chat_type),
    ("non_empty", non_empty),
    ("echo_format", echo_format),
    ("bracket_prefix", bracket_prefix),
    ("sender_length", sender_length),
    ("noise_signature", noise_signature),
    ("system_account", system_account),
];

/// Run the chain. `None` means the entry is a candidate chat message.
#[must_use]
pub fn classify(entry: &LogEntry) -> Option<Rejection> {
    RULES.iter().find_map(|(_, rule)| rule(entry))
}

/// Name of the first rule that rejects the entry, for debug logging.
#[must_use]
pub fn rejecting_rule(entry: &LogEntry) -> Option<&'static str> {
    RULES
        .iter()
        .find(|(_, rule)| rule(entry).is_some())
        .map(|(name, _)| *name)
}

fn chat_type(entry: &LogEntry) -> Option<Rejection> {
    (entry.kind != EntryKind::Chat).then_some(Rejection::NotChat)
}

fn non_empty(entry: &LogEntry) -> Option<Rejection> {
    (entry.sender.is_empty() || entry.content.is_empty()).then_some(Rejection::EmptyField)
}

/// `[Alias] <Name> text` — the shape every bridged line takes on arrival.
fn echo_format(entry: &LogEntry) -> Option<Rejection> {
    let rest = entry.content.strip_prefix('[')?;
    let (tag, rest) = rest.split_once(']')?;
    if tag.is_empty() {
        return None;
    }
    let rest = rest.strip_prefix(" <")?;
    let (name, rest) = rest.split_once('>')?;
    if name.is_empty() || rest.trim_start().is_empty() {
        return None;
    }
    Some(Rejection::EchoFormat)
}

fn bracket_prefix(entry: &LogEntry) -> Option<Rejection> {
    (entry.content.starts_with('[') && entry.content.contains(']'))
        .then_some(Rejection::BracketPrefix)
}

fn sender_length(entry: &LogEntry) -> Option<Rejection> {
    let len = entry.sender.chars().count();
    (len == 0 || len > MAX_SENDER_LEN).then_some(Rejection::SenderLength)
}

fn noise_signature(entry: &LogEntry) -> Option<Rejection> {
    let lower = entry.content.to_lowercase();
    let tick_monitor = lower.contains("tps") && lower.contains("ms/tick");
    let whisper = lower.starts_with("private_for_");
    (tick_monitor || whisper).then_some(Rejection::NoiseSignature)
}

fn system_account(entry: &LogEntry) -> Option<Rejection> {
    SYSTEM_ACCOUNTS
        .contains(&entry.sender.to_lowercase().as_str())
        .then_some(Rejection::SystemAccount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chat(sender: &str, content: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            sender: sender.to_owned(),
            content: content.to_owned(),
            kind: EntryKind::Chat,
        }
    }

    #[test]
    fn plain_chat_passes() {
        assert_eq!(classify(&chat("Alice", "hello there")), None);
    }

    #[test]
    fn non_chat_kind_rejected() {
        let mut entry = chat("Alice", "hello");
        entry.kind = EntryKind::Console;
        assert_eq!(classify(&entry), Some(Rejection::NotChat));
    }

    #[test]
    fn empty_sender_and_content_rejected() {
        assert_eq!(classify(&chat("", "hello")), Some(Rejection::EmptyField));
        assert_eq!(classify(&chat("Alice", "")), Some(Rejection::EmptyField));
    }

    #[test]
    fn own_broadcast_format_rejected() {
        assert_eq!(
            classify(&chat("Alice", "[Lobby] <Bob> hi")),
            Some(Rejection::EchoFormat)
        );
    }

    #[test]
    fn bracketed_server_line_rejected() {
        assert_eq!(
            classify(&chat("Alice", "[Rank] promotion announcement")),
            Some(Rejection::BracketPrefix)
        );
    }

    #[test]
    fn bracket_without_close_is_chat() {
        assert_eq!(classify(&chat("Alice", "[unclosed bracket rant")), None);
    }

    #[test]
    fn sender_over_32_chars_rejected() {
        let long = "x".repeat(33);
        assert_eq!(classify(&chat(&long, "hi")), Some(Rejection::SenderLength));
        let exactly = "x".repeat(32);
        assert_eq!(classify(&chat(&exactly, "hi")), None);
    }

    #[test]
    fn tick_monitor_output_rejected() {
        assert_eq!(
            classify(&chat("Alice", "Mean TPS: 20.0, Mean tick: 12.3 ms/tick")),
            Some(Rejection::NoiseSignature)
        );
    }

    #[test]
    fn whisper_marker_rejected() {
        assert_eq!(
            classify(&chat("Alice", "PRIVATE_FOR_Bob psst")),
            Some(Rejection::NoiseSignature)
        );
    }

    #[test]
    fn console_pseudo_sender_rejected() {
        assert_eq!(
            classify(&chat("Console", "restarting soon")),
            Some(Rejection::SystemAccount)
        );
        assert_eq!(
            classify(&chat("SERVER", "motd")),
            Some(Rejection::SystemAccount)
        );
    }

    #[test]
    fn rejecting_rule_names_the_first_failure() {
        assert_eq!(rejecting_rule(&chat("Console", "hi")), Some("system_account"));
        assert_eq!(rejecting_rule(&chat("Alice", "hi")), None);
    }
}
