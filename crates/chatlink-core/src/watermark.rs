//! High-water-mark deduplication for overlapping poll windows.
//!
//! The panel only supports "last N seconds" style polling, so consecutive
//! batches overlap and entries within one second collide. The watermark is
//! the minimal correct cutoff for that: a monotonically non-decreasing
//! timestamp plus the set of entry hashes seen at exactly that instant.
//! Entries strictly before the mark are spent; entries at the mark dedup by
//! hash; entries after it advance the mark and reset the set.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::types::LogEntry;

/// Non-cryptographic 64-bit hash of `(sender, content)`.
///
/// Collisions at the same instant would drop a message; that risk is
/// accepted in exchange for constant-size watermark state.
#[must_use]
pub fn entry_hash(sender: &str, content: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    sender.hash(&mut hasher);
    content.hash(&mut hasher);
    hasher.finish()
}

/// Per-endpoint dedup cutoff.
#[derive(Debug, Clone)]
pub struct Watermark {
    ts: DateTime<Utc>,
    hashes: HashSet<u64>,
}

impl Watermark {
    /// Seed a watermark from an endpoint's first successful batch.
    ///
    /// The mark lands on the latest entry in the batch with that entry's
    /// hash pre-recorded, so the backlog the panel replays on startup is
    /// consumed without emitting anything. An empty batch seeds to `now`.
    #[must_use]
    pub fn seed(batch: &[LogEntry], now: DateTime<Utc>) -> Self {
        let mut sorted: Vec<&LogEntry> = batch.iter().collect();
        sorted.sort_by_key(|e| e.timestamp);
        match sorted.last() {
            Some(latest) => Self {
                ts: latest.timestamp,
                hashes: HashSet::from([entry_hash(&latest.sender, &latest.content)]),
            },
            None => Self {
                ts: now,
                hashes: HashSet::new(),
            },
        }
    }

    /// Current cutoff timestamp.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.ts
    }

    /// Consume a (possibly unordered, possibly overlapping) batch and return
    /// the strictly-new entries in ascending timestamp order.
    pub fn advance(&mut self, mut batch: Vec<LogEntry>) -> Vec<LogEntry> {
        batch.sort_by_key(|e| e.timestamp);

        let mut fresh = Vec::new();
        for entry in batch {
            if entry.timestamp < self.ts {
                continue;
            }
            let hash = entry_hash(&entry.sender, &entry.content);
            if entry.timestamp == self.ts {
                if !self.hashes.insert(hash) {
                    continue;
                }
            } else {
                self.ts = entry.timestamp;
                self.hashes = HashSet::from([hash]);
            }
            fresh.push(entry);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryKind;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry(secs: i64, sender: &str, content: &str) -> LogEntry {
        LogEntry {
            timestamp: at(secs),
            sender: sender.to_owned(),
            content: content.to_owned(),
            kind: EntryKind::Chat,
        }
    }

    #[test]
    fn seed_records_latest_and_emits_nothing() {
        let batch = vec![entry(90, "Old", "backlog"), entry(100, "Alice", "hello")];
        let mut wm = Watermark::seed(&batch, at(0));
        assert_eq!(wm.timestamp(), at(100));
        // Re-polling the same window right after seeding yields nothing.
        assert!(wm.advance(batch).is_empty());
    }

    #[test]
    fn seed_from_empty_batch_uses_now() {
        let wm = Watermark::seed(&[], at(500));
        assert_eq!(wm.timestamp(), at(500));
    }

    #[test]
    fn repolling_same_window_is_idempotent() {
        let mut wm = Watermark::seed(&[entry(50, "Seed", "x")], at(0));
        let batch = vec![entry(100, "Alice", "hello"), entry(105, "Bob", "hi")];
        assert_eq!(wm.advance(batch.clone()).len(), 2);
        assert!(wm.advance(batch).is_empty());
    }

    #[test]
    fn overlapping_batch_emits_only_the_new_tail() {
        let mut wm = Watermark::seed(&[entry(50, "Seed", "x")], at(0));
        wm.advance(vec![entry(100, "Alice", "hello")]);

        let fresh = wm.advance(vec![entry(100, "Alice", "hello"), entry(105, "Bob", "hi")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].sender, "Bob");
    }

    #[test]
    fn same_instant_different_content_both_accepted() {
        let mut wm = Watermark::seed(&[entry(50, "Seed", "x")], at(0));
        let fresh = wm.advance(vec![
            entry(100, "Alice", "hello"),
            entry(100, "Alice", "hello"),
            entry(100, "Alice", "hello again"),
        ]);
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn unsorted_batch_comes_back_ascending() {
        let mut wm = Watermark::seed(&[entry(50, "Seed", "x")], at(0));
        let fresh = wm.advance(vec![
            entry(105, "Bob", "second"),
            entry(100, "Alice", "first"),
        ]);
        assert_eq!(fresh[0].sender, "Alice");
        assert_eq!(fresh[1].sender, "Bob");
    }

    #[test]
    fn timestamp_never_decreases() {
        let mut wm = Watermark::seed(&[entry(100, "Seed", "x")], at(0));
        wm.advance(vec![entry(40, "Late", "straggler")]);
        assert_eq!(wm.timestamp(), at(100));
        wm.advance(vec![entry(200, "Alice", "new")]);
        assert_eq!(wm.timestamp(), at(200));
        wm.advance(vec![entry(150, "Late", "again")]);
        assert_eq!(wm.timestamp(), at(200));
    }

    #[test]
    fn hash_set_resets_when_mark_advances() {
        let mut wm = Watermark::seed(&[entry(50, "Seed", "x")], at(0));
        wm.advance(vec![entry(100, "Alice", "hello")]);
        wm.advance(vec![entry(105, "Bob", "hi")]);
        // "Alice hello" is now strictly before the mark; only the hash at
        // t=105 is retained.
        let fresh = wm.advance(vec![entry(105, "Bob", "hi"), entry(105, "Carol", "yo")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].sender, "Carol");
    }
}
