//! Pending-command registry.
//!
//! Command handlers that need a delayed console response register a regex
//! against the originating endpoint; the tick path runs every
//! watermark-accepted line past the registry before filtering (awaited
//! responses are usually non-chat lines). One mutex, two critical
//! sections: insert, and scan-and-take-on-match. A handler that gives up
//! just drops its receiver; the dead entry is pruned on the next scan.

use std::sync::Mutex;

use regex::Regex;
use tokio::sync::oneshot;

struct PendingEntry {
    source: String,
    pattern: Regex,
    tx: oneshot::Sender<String>,
}

#[derive(Default)]
pub struct PendingRegistry {
    entries: Mutex<Vec<PendingEntry>>,
}

impl PendingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern awaiting console output from `source`. The
    /// receiver resolves to the first capture group (or the whole match
    /// when the pattern has no groups).
    pub fn register(&self, source: &str, pattern: Regex) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        self.lock().push(PendingEntry {
            source: source.to_owned(),
            pattern,
            tx,
        });
        rx
    }

    /// Run one console line past all registrations for its endpoint.
    /// Matching entries are removed and completed; abandoned entries are
    /// pruned.
    pub fn match_line(&self, source: &str, line: &str) {
        let mut entries = self.lock();
        let mut i = 0;
        while i < entries.len() {
            if entries[i].tx.is_closed() {
                entries.remove(i);
                continue;
            }
            if entries[i].source == source {
                if let Some(caps) = entries[i].pattern.captures(line) {
                    let captured = caps
                        .get(1)
                        .map_or_else(|| caps[0].to_owned(), |m| m.as_str().to_owned());
                    let entry = entries.remove(i);
                    let _ = entry.tx.send(captured);
                    continue;
                }
            }
            i += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PendingEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_pattern(player: &str) -> Regex {
        Regex::new(&format!(
            r#"{} has the following entity data: "(?:[^:]+:)?(.+?)""#,
            regex::escape(player)
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn captures_first_group_on_match() {
        let registry = PendingRegistry::new();
        let rx = registry.register("smp", item_pattern("Alice"));

        registry.match_line("smp", "irrelevant chatter");
        registry.match_line(
            "smp",
            r#"Alice has the following entity data: "gtceu:tritanium_coil_block""#,
        );

        assert_eq!(rx.await.unwrap(), "tritanium_coil_block");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn namespace_prefix_is_optional() {
        let registry = PendingRegistry::new();
        let rx = registry.register("smp", item_pattern("Alice"));
        registry.match_line("smp", r#"Alice has the following entity data: "stone""#);
        assert_eq!(rx.await.unwrap(), "stone");
    }

    #[tokio::test]
    async fn only_matches_owning_endpoint() {
        let registry = PendingRegistry::new();
        let mut rx = registry.register("smp", item_pattern("Alice"));

        registry.match_line(
            "creative",
            r#"Alice has the following entity data: "stone""#,
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn abandoned_registrations_are_pruned() {
        let registry = PendingRegistry::new();
        let rx = registry.register("smp", item_pattern("Alice"));
        drop(rx);

        registry.match_line("smp", "any line at all");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn whole_match_when_pattern_has_no_groups() {
        let registry = PendingRegistry::new();
        let rx = registry.register("smp", Regex::new("Done \\(\\d+ms\\)").unwrap());
        registry.match_line("smp", "Done (42ms)! For help, type help");
        assert_eq!(rx.await.unwrap(), "Done (42ms)");
    }
}
