//! JSON network description.
//!
//! ```json
//! {
//!   "endTime": 100,
//!   "clientSendRate": 10,
//!   "routers": ["A", "B"],
//!   "clients": ["a", "b"],
//!   "links": [["a", "A", 1], ["A", "B", 1], ["B", "b", 1]],
//!   "changes": [[30, ["A", "B"], "down"], [60, ["A", "B", 1], "up"]],
//!   "correctRoutes": [["a", "A", "B", "b"], ["b", "B", "A", "a"]]
//! }
//! ```
//!
//! Times (`endTime`, `clientSendRate`, change times) and link costs are in
//! latency units; one unit is `latencyMultiplier` milliseconds (default 100).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TopologyError;
use crate::net::{Addr, DEFAULT_LATENCY_MULTIPLIER_MS, DEFAULT_TICK_MS, LinkChange, Network};
use crate::proto::{Cost, ProtocolKind};
use crate::sim::SimTime;

/// Heartbeat interval, in latency units.
pub const HEARTBEAT_UNITS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub end_time: u64,
    pub client_send_rate: u64,
    #[serde(default)]
    pub routers: Vec<Addr>,
    #[serde(default)]
    pub clients: Vec<Addr>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub changes: Vec<ChangeSpec>,
    #[serde(default)]
    pub correct_routes: Vec<Vec<Addr>>,
    #[serde(default)]
    pub latency_multiplier: Option<u64>,
}

/// `[a, b, cost]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec(pub Addr, pub Addr, pub Cost);

/// `[time, target, "up" | "down"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSpec(pub u64, pub ChangeTarget, pub ChangeKind);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeTarget {
    WithCost(Addr, Addr, Cost),
    Pair(Addr, Addr),
}

impl ChangeTarget {
    fn ends(&self) -> (&Addr, &Addr) {
        match self {
            ChangeTarget::WithCost(a, b, _) | ChangeTarget::Pair(a, b) => (a, b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Up,
    Down,
}

/// Knobs that are not part of the description itself.
#[derive(Debug, Clone)]
pub struct BuildOpts {
    pub protocol: ProtocolKind,
    pub tick: SimTime,
    /// Overrides the `HEARTBEAT_UNITS × latencyMultiplier` default.
    pub heartbeat_ms: Option<u64>,
}

impl Default for BuildOpts {
    fn default() -> Self {
        Self {
            protocol: ProtocolKind::Dv,
            tick: SimTime::from_millis(DEFAULT_TICK_MS),
            heartbeat_ms: None,
        }
    }
}

impl NetworkSpec {
    pub fn from_json(raw: &str) -> Result<Self, TopologyError> {
        let spec: NetworkSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self, TopologyError> {
        let raw = fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn multiplier_ms(&self) -> u64 {
        self.latency_multiplier.unwrap_or(DEFAULT_LATENCY_MULTIPLIER_MS)
    }

    fn units(&self, n: u64) -> SimTime {
        SimTime::from_millis(n.saturating_mul(self.multiplier_ms()))
    }

    pub fn end_time(&self) -> SimTime {
        self.units(self.end_time)
    }

    pub fn client_send_rate(&self) -> SimTime {
        self.units(self.client_send_rate)
    }

    pub fn heartbeat_ms(&self) -> u64 {
        HEARTBEAT_UNITS.saturating_mul(self.multiplier_ms())
    }

    /// Check names and change targets without building anything.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut seen = HashSet::new();
        for addr in self.routers.iter().chain(&self.clients) {
            if !seen.insert(addr) {
                return Err(TopologyError::DuplicateAddr(addr.clone()));
            }
        }

        let check = |a: &Addr, b: &Addr| -> Result<(), TopologyError> {
            if a == b {
                return Err(TopologyError::SelfLoop(a.clone()));
            }
            for end in [a, b] {
                if !seen.contains(end) {
                    return Err(TopologyError::UnknownEndpoint {
                        a: a.clone(),
                        b: b.clone(),
                        missing: end.clone(),
                    });
                }
            }
            Ok(())
        };
        for LinkSpec(a, b, _) in &self.links {
            check(a, b)?;
        }
        for ChangeSpec(_, target, _) in &self.changes {
            let (a, b) = target.ends();
            check(a, b)?;
        }
        self.link_changes().map(|_| ())
    }

    /// Scheduled link changes in time order.
    pub fn link_changes(&self) -> Result<Vec<(SimTime, LinkChange)>, TopologyError> {
        let mut out = Vec::with_capacity(self.changes.len());
        for ChangeSpec(at, target, kind) in &self.changes {
            let change = match (kind, target) {
                (ChangeKind::Up, ChangeTarget::WithCost(a, b, cost)) => LinkChange::Up {
                    a: a.clone(),
                    b: b.clone(),
                    cost: *cost,
                },
                (ChangeKind::Up, ChangeTarget::Pair(a, b)) => {
                    return Err(TopologyError::MissingCost {
                        at: *at,
                        a: a.clone(),
                        b: b.clone(),
                    });
                }
                (ChangeKind::Down, target) => {
                    let (a, b) = target.ends();
                    LinkChange::Down {
                        a: a.clone(),
                        b: b.clone(),
                    }
                }
            };
            out.push((self.units(*at), change));
        }
        out.sort_by_key(|(at, _)| *at);
        Ok(out)
    }

    /// Create every node and bring the initial links up.
    ///
    /// Link-up notifications are queued at both ends; routers absorb them one
    /// per tick once the simulation starts.
    pub fn build_network(&self, opts: &BuildOpts) -> Result<Network, TopologyError> {
        let mut net = Network::new(self.multiplier_ms(), opts.tick);
        let heartbeat_ms = opts.heartbeat_ms.unwrap_or_else(|| self.heartbeat_ms());

        for addr in &self.routers {
            net.add_router(addr.clone(), opts.protocol, heartbeat_ms)?;
        }
        for addr in &self.clients {
            net.add_client(addr.clone(), self.clients.clone(), self.client_send_rate())?;
        }
        for LinkSpec(a, b, cost) in &self.links {
            net.link_up(a, b, *cost)?;
        }
        for route in &self.correct_routes {
            net.routes.add_correct_route(route.clone());
        }

        debug!(
            routers = self.routers.len(),
            clients = self.clients.len(),
            links = self.links.len(),
            "网络已构建"
        );
        Ok(net)
    }
}
