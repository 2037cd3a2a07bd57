//! Online-player roster lookup and channel-topic summaries.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use chatlink_panel::PanelApi;

use crate::registry::Endpoint;

/// Minimum seconds between topic updates for one group.
pub const TOPIC_MIN_INTERVAL_SECS: i64 = 300;

/// Chat services cap topic length; stay under it.
const TOPIC_MAX_LEN: usize = 1000;

/// Query every running member concurrently and return `(alias, players)`
/// rows in member order. Endpoints that are stopped, error out, or time
/// out are omitted rather than failing the whole roster.
pub async fn online_players(
    panel: Arc<dyn PanelApi>,
    queries: Vec<(Endpoint, String)>,
    lookup_timeout: Duration,
) -> Vec<(String, Vec<String>)> {
    let mut lookups = JoinSet::new();
    for (idx, (endpoint, alias)) in queries.into_iter().enumerate() {
        if !endpoint.running {
            continue;
        }
        let panel = Arc::clone(&panel);
        lookups.spawn(async move {
            match tokio::time::timeout(lookup_timeout, panel.active_users(&endpoint.name)).await {
                Ok(Ok(mut players)) => {
                    players.sort();
                    Some((idx, alias, players))
                }
                Ok(Err(err)) => {
                    tracing::debug!("presence lookup failed for {}: {err}", endpoint.name);
                    None
                }
                Err(_) => {
                    tracing::debug!("presence lookup timed out for {}", endpoint.name);
                    None
                }
            }
        });
    }

    let mut rows = Vec::new();
    while let Some(joined) = lookups.join_next().await {
        if let Ok(Some(row)) = joined {
            rows.push(row);
        }
    }
    rows.sort_by_key(|(idx, _, _)| *idx);
    rows.into_iter()
        .map(|(_, alias, players)| (alias, players))
        .collect()
}

/// Compose the channel topic: player total plus deduplicated sorted names.
#[must_use]
pub fn topic_line(online: &[(String, Vec<String>)]) -> String {
    let total: usize = online.iter().map(|(_, players)| players.len()).sum();
    let names: BTreeSet<&str> = online
        .iter()
        .flat_map(|(_, players)| players.iter().map(String::as_str))
        .collect();

    let mut topic = format!("Online Players ({total})");
    if !names.is_empty() {
        topic.push_str(": ");
        topic.push_str(&names.into_iter().collect::<Vec<_>>().join(", "));
    }
    if topic.chars().count() > TOPIC_MAX_LEN {
        topic = topic.chars().take(TOPIC_MAX_LEN).collect();
        topic.push_str("...");
    }
    topic
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatlink_core::types::{ConsoleKind, RawLogEntry};
    use chatlink_panel::{InstanceRef, PanelError};

    struct RosterPanel;

    #[async_trait]
    impl PanelApi for RosterPanel {
        async fn list_instances(&self) -> Result<Vec<InstanceRef>, PanelError> {
            Ok(Vec::new())
        }
        async fn get_updates(&self, _: &str) -> Result<Vec<RawLogEntry>, PanelError> {
            Ok(Vec::new())
        }
        async fn send_console(&self, _: &str, _: &str) -> Result<(), PanelError> {
            Ok(())
        }
        async fn active_users(&self, instance: &str) -> Result<Vec<String>, PanelError> {
            match instance {
                "smp" => Ok(vec!["Bob".to_owned(), "Alice".to_owned()]),
                "creative" => Ok(Vec::new()),
                _ => Err(PanelError::Timeout),
            }
        }
        async fn invalidate_session(&self, _: &str) {}
    }

    fn endpoint(name: &str, running: bool) -> Endpoint {
        Endpoint {
            name: name.to_owned(),
            instance_id: format!("id-{name}"),
            kind: ConsoleKind::Minecraft,
            running,
        }
    }

    #[tokio::test]
    async fn roster_keeps_member_order_and_sorts_players() {
        let rows = online_players(
            Arc::new(RosterPanel),
            vec![
                (endpoint("creative", true), "Creative".to_owned()),
                (endpoint("smp", true), "SMP".to_owned()),
            ],
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(
            rows,
            vec![
                ("Creative".to_owned(), vec![]),
                ("SMP".to_owned(), vec!["Alice".to_owned(), "Bob".to_owned()]),
            ]
        );
    }

    #[tokio::test]
    async fn stopped_and_failing_endpoints_are_omitted() {
        let rows = online_players(
            Arc::new(RosterPanel),
            vec![
                (endpoint("smp", false), "SMP".to_owned()),
                (endpoint("broken", true), "Broken".to_owned()),
            ],
            Duration::from_secs(1),
        )
        .await;
        assert!(rows.is_empty());
    }

    #[test]
    fn topic_counts_and_dedups_names() {
        let online = vec![
            ("SMP".to_owned(), vec!["Alice".to_owned(), "Bob".to_owned()]),
            ("Creative".to_owned(), vec!["Alice".to_owned()]),
        ];
        assert_eq!(topic_line(&online), "Online Players (3): Alice, Bob");
    }

    #[test]
    fn topic_with_nobody_online() {
        assert_eq!(topic_line(&[]), "Online Players (0)");
    }

    #[test]
    fn long_topics_are_truncated() {
        let players: Vec<String> = (0..200).map(|i| format!("Player_{i:03}")).collect();
        let topic = topic_line(&[("SMP".to_owned(), players)]);
        assert!(topic.chars().count() <= TOPIC_MAX_LEN + 3);
        assert!(topic.ends_with("..."));
    }
}
