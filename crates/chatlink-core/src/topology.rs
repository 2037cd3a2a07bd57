//! Group/topology model: which endpoints relay to which, and how each is
//! displayed.
//!
//! The document is written by the configuration surface and read-only to
//! the engine. Groups map a name to a member list, an active flag, and an
//! optional chat-UI sink channel.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid topology document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The whole configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyDoc {
    #[serde(default)]
    pub groups: HashMap<String, Group>,
    #[serde(default)]
    pub endpoint_settings: HashMap<String, EndpointSettings>,
}

/// A named set of endpoints that relay chat to one another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Opaque sink reference (resolved by the sink client), if the group
    /// forwards to the external chat UI.
    #[serde(default)]
    pub sink_channel: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Per-endpoint display overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Resolved display settings for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub alias: String,
    pub color: String,
}

impl TopologyDoc {
    pub fn parse(json: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Groups that can produce traffic: active with at least one member.
    pub fn active_groups(&self) -> impl Iterator<Item = (&String, &Group)> {
        self.groups
            .iter()
            .filter(|(_, group)| group.active && !group.members.is_empty())
    }

    /// Union of members across all traffic-producing groups — the set of
    /// endpoints the poller must visit this tick.
    #[must_use]
    pub fn active_members(&self) -> HashSet<&str> {
        self.active_groups()
            .flat_map(|(_, group)| group.members.iter().map(String::as_str))
            .collect()
    }

    /// Display settings for an endpoint: configured alias falling back to
    /// the endpoint name, configured color validated against the console's
    /// palette falling back to the default.
    #[must_use]
    pub fn display(&self, endpoint: &str) -> DisplaySettings {
        let settings = self.endpoint_settings.get(endpoint);
        let alias = settings
            .and_then(|s| s.alias.clone())
            .unwrap_or_else(|| endpoint.to_owned());
        let color = settings
            .and_then(|s| s.color.as_deref())
            .map(format::color_or_default)
            .unwrap_or(format::DEFAULT_COLOR)
            .to_owned();
        DisplaySettings { alias, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "groups": {
            "survival": {
                "members": ["smp", "creative"],
                "active": true,
                "sink_channel": "bridge-chat"
            },
            "paused": {
                "members": ["events"],
                "active": false
            },
            "empty": {
                "members": []
            }
        },
        "endpoint_settings": {
            "smp": { "alias": "SMP", "color": "gold" },
            "creative": { "color": "no_such_color" }
        }
    }"#;

    #[test]
    fn parses_full_document() {
        let doc = TopologyDoc::parse(DOC).unwrap();
        assert_eq!(doc.groups.len(), 3);
        assert_eq!(
            doc.groups["survival"].sink_channel.as_deref(),
            Some("bridge-chat")
        );
        // Unstated active defaults to true.
        assert!(doc.groups["empty"].active);
    }

    #[test]
    fn active_members_skips_inactive_and_empty_groups() {
        let doc = TopologyDoc::parse(DOC).unwrap();
        let members = doc.active_members();
        assert_eq!(members, HashSet::from(["smp", "creative"]));
    }

    #[test]
    fn zero_member_group_produces_no_traffic() {
        let doc = TopologyDoc::parse(DOC).unwrap();
        assert!(doc.active_groups().all(|(name, _)| name != "empty"));
    }

    #[test]
    fn display_falls_back_to_name_and_default_color() {
        let doc = TopologyDoc::parse(DOC).unwrap();
        assert_eq!(
            doc.display("smp"),
            DisplaySettings {
                alias: "SMP".to_owned(),
                color: "gold".to_owned()
            }
        );
        // Unknown color falls back, alias falls back to the endpoint name.
        assert_eq!(
            doc.display("creative"),
            DisplaySettings {
                alias: "creative".to_owned(),
                color: "aqua".to_owned()
            }
        );
        assert_eq!(doc.display("unconfigured").alias, "unconfigured");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(TopologyDoc::parse("{ groups: nope }").is_err());
    }
}
