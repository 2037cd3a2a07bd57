//! Endpoint registry: the engine's view of which consoles exist.
//!
//! Rebuilt from the panel's instance list at startup and every
//! [`REGISTRY_REFRESH_TICKS`] ticks. A failed or empty refresh keeps the
//! previous set — a panel hiccup must not make every endpoint vanish
//! mid-bridge.

use std::collections::HashMap;

use chatlink_core::types::ConsoleKind;
use chatlink_panel::PanelApi;

/// Refresh the registry every this many ticks (~once a minute at the
/// default 2s tick).
pub const REGISTRY_REFRESH_TICKS: u64 = 30;

/// One linked console endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Stable display name; the identity the topology refers to.
    pub name: String,
    /// Panel-side handle.
    pub instance_id: String,
    pub kind: ConsoleKind,
    pub running: bool,
}

#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, Endpoint>,
}

impl EndpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the panel's current instance list.
    pub async fn refresh(&mut self, panel: &dyn PanelApi) {
        match panel.list_instances().await {
            Ok(instances) if !instances.is_empty() => {
                self.endpoints = instances
                    .into_iter()
                    .map(|inst| {
                        let endpoint = Endpoint {
                            name: inst.name.clone(),
                            instance_id: inst.instance_id,
                            kind: ConsoleKind::from_module(&inst.module),
                            running: inst.running,
                        };
                        (inst.name, endpoint)
                    })
                    .collect();
                tracing::debug!("registry refreshed: {} endpoints", self.endpoints.len());
            }
            Ok(_) => {
                tracing::debug!("panel returned no instances, keeping previous registry");
            }
            Err(err) => {
                tracing::debug!("registry refresh failed, keeping previous: {err}");
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Resolve a member name list to known endpoints, preserving order and
    /// silently skipping names the panel no longer reports.
    #[must_use]
    pub fn resolve_members(&self, names: &[String]) -> Vec<Endpoint> {
        names
            .iter()
            .filter_map(|name| self.endpoints.get(name).cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
