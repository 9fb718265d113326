//! Routing protocol engines.
//!
//! Every engine implements [`RoutingProtocol`], the four-callback contract the
//! router control loop drives: packet received, link added, link removed and
//! timer fired. Engines never touch links directly; all output goes through a
//! [`PortIo`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownProtocol;
use crate::net::{Addr, Packet, Port};

pub mod dv;
pub mod ls;
pub mod mirror;

pub use dv::DistanceVector;
pub use ls::LinkState;
pub use mirror::Mirror;

/// Link / path metric.
pub type Cost = u32;

/// "Unreachable". Any computed cost at or above this value is stored as exactly
/// `INFINITY`.
pub const INFINITY: Cost = 16;

/// Clamp a computed path cost to `INFINITY`.
pub fn clamp_cost(cost: Cost) -> Cost {
    cost.min(INFINITY)
}

/// Outbound side of the link layer as seen by an engine.
///
/// Sending on a port that is not (or no longer) attached is a silent no-op.
pub trait PortIo {
    fn send(&mut self, port: Port, pkt: Packet);
}

/// Per-router protocol state machine.
pub trait RoutingProtocol: Send {
    /// Short protocol name for logs ("dv", "ls", ...).
    fn name(&self) -> &'static str;

    fn on_packet(&mut self, port: Port, pkt: Packet, io: &mut dyn PortIo);

    fn on_link_up(&mut self, port: Port, endpoint: &Addr, cost: Cost, io: &mut dyn PortIo);

    fn on_link_down(&mut self, port: Port, io: &mut dyn PortIo);

    fn on_tick(&mut self, now_ms: u64, io: &mut dyn PortIo);

    /// Read-only snapshot of the current forwarding decisions, sorted by destination.
    fn routes(&self) -> Vec<RouteEntry>;

    fn debug_string(&self) -> String {
        let mut out = String::new();
        for r in self.routes() {
            out.push_str(&r.to_string());
            out.push('\n');
        }
        out
    }
}

/// One line of a routing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub dest: Addr,
    pub cost: Cost,
    pub next_hop: Option<Addr>,
    pub out_port: Option<Port>,
}

impl RouteEntry {
    /// Unreachable entries carry no next hop.
    pub fn is_reachable(&self) -> bool {
        self.next_hop.is_some()
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.next_hop, self.out_port) {
            (Some(nh), Some(port)) => {
                write!(f, "{} cost={} via {} ({})", self.dest, self.cost, nh, port)
            }
            (Some(nh), None) => write!(f, "{} cost={} via {}", self.dest, self.cost, nh),
            _ => write!(f, "{} unreachable", self.dest),
        }
    }
}

/// Which engine a router runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    Dv,
    Ls,
    Mirror,
}

impl ProtocolKind {
    pub fn build(self, addr: Addr, heartbeat_ms: u64) -> Box<dyn RoutingProtocol> {
        match self {
            ProtocolKind::Dv => Box::new(DistanceVector::new(addr, heartbeat_ms)),
            ProtocolKind::Ls => Box::new(LinkState::new(addr, heartbeat_ms)),
            ProtocolKind::Mirror => Box::new(Mirror::new(addr)),
        }
    }
}

impl FromStr for ProtocolKind {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dv" => Ok(ProtocolKind::Dv),
            "ls" => Ok(ProtocolKind::Ls),
            "mirror" => Ok(ProtocolKind::Mirror),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolKind::Dv => "dv",
            ProtocolKind::Ls => "ls",
            ProtocolKind::Mirror => "mirror",
        })
    }
}
