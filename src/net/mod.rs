//! 网络模拟模块
//!
//! 节点、链路、数据包、拓扑，以及驱动它们的仿真事件。

mod client;
mod final_routes;
mod id;
mod link;
mod link_change;
mod net_world;
mod network;
mod node;
mod node_tick;
mod packet;
mod route_tracker;
mod router;
mod routing;
mod stats;

pub use client::Client;
pub use final_routes::FinalRoutes;
pub use id::{Addr, LinkId, NodeId, Port};
pub use link::{Link, LinkTable};
pub use link_change::ApplyLinkChange;
pub use net_world::NetWorld;
pub use network::{
    DEFAULT_LATENCY_MULTIPLIER_MS, DEFAULT_TICK_MS, Forwarding, LinkChange, Network,
};
pub use node::{LinkEvent, Node, NodeCtx};
pub use node_tick::NodeTick;
pub use packet::{Packet, PacketKind};
pub use route_tracker::{RouteTracker, TracedRoute};
pub use router::Router;
pub use routing::ReferencePaths;
pub use stats::Stats;
