//! Router control loop.
//!
//! Pure dispatch: per tick, apply at most one queued link change, poll every
//! attached link for at most one packet, then fire the engine's timer. All
//! protocol logic lives behind [`RoutingProtocol`].

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, trace};

use super::id::{Addr, LinkId, NodeId, Port};
use super::link::LinkTable;
use super::node::{LinkEvent, Node, NodeCtx};
use super::packet::Packet;
use super::stats::Stats;
use crate::proto::{Cost, PortIo, ProtocolKind, RouteEntry, RoutingProtocol};
use crate::sim::SimTime;

pub struct Router {
    id: NodeId,
    addr: Addr,
    kind: ProtocolKind,
    next_free_port: u32,
    port_of: HashMap<LinkId, Port>,
    link_of: BTreeMap<Port, LinkId>,
    link_changes: VecDeque<LinkEvent>,
    protocol: Box<dyn RoutingProtocol>,
}

/// Resolves engine ports to links for the duration of one callback.
struct LinkPorts<'a> {
    addr: &'a Addr,
    link_of: &'a BTreeMap<Port, LinkId>,
    links: &'a mut LinkTable,
    stats: &'a mut Stats,
    now: SimTime,
}

impl PortIo for LinkPorts<'_> {
    fn send(&mut self, port: Port, pkt: Packet) {
        let Some(&link) = self.link_of.get(&port) else {
            trace!(router = %self.addr, port = %port, "port not attached, dropped");
            self.stats.dropped_pkts += 1;
            return;
        };
        let routing = pkt.is_routing();
        if !self.links.send(link, self.addr, pkt, self.now) {
            self.stats.dropped_pkts += 1;
        } else if routing {
            self.stats.control_pkts += 1;
        } else {
            self.stats.traces_forwarded += 1;
        }
    }
}

fn ports<'a>(
    addr: &'a Addr,
    link_of: &'a BTreeMap<Port, LinkId>,
    ctx: &'a mut NodeCtx<'_>,
) -> LinkPorts<'a> {
    LinkPorts {
        addr,
        link_of,
        now: ctx.now,
        links: &mut *ctx.links,
        stats: &mut *ctx.stats,
    }
}

impl Router {
    pub fn new(id: NodeId, addr: Addr, kind: ProtocolKind, heartbeat_ms: u64) -> Self {
        let protocol = kind.build(addr.clone(), heartbeat_ms);
        Self {
            id,
            addr,
            kind,
            next_free_port: 1,
            port_of: HashMap::new(),
            link_of: BTreeMap::new(),
            link_changes: VecDeque::new(),
            protocol,
        }
    }

    /// Port currently bound to `link`.
    pub fn port(&self, link: LinkId) -> Option<Port> {
        self.port_of.get(&link).copied()
    }

    pub fn attached(&self) -> usize {
        self.link_of.len()
    }

    fn add_link(&mut self, link: LinkId, endpoint: &Addr, cost: Cost, ctx: &mut NodeCtx<'_>) {
        // Re-attaching a live link is a cost change: it keeps its port.
        let port = match self.remove_link(link, ctx) {
            Some(port) => port,
            None => {
                let port = Port(self.next_free_port);
                self.next_free_port += 1;
                port
            }
        };
        self.port_of.insert(link, port);
        self.link_of.insert(port, link);
        debug!(router = %self.addr, port = %port, endpoint = %endpoint, cost, "link up");

        let mut io = ports(&self.addr, &self.link_of, ctx);
        self.protocol.on_link_up(port, endpoint, cost, &mut io);
    }

    fn remove_link(&mut self, link: LinkId, ctx: &mut NodeCtx<'_>) -> Option<Port> {
        let port = self.port_of.remove(&link)?;
        self.link_of.remove(&port);
        debug!(router = %self.addr, port = %port, "link down");

        let mut io = ports(&self.addr, &self.link_of, ctx);
        self.protocol.on_link_down(port, &mut io);
        Some(port)
    }
}

impl Node for Router {
    fn id(&self) -> NodeId {
        self.id
    }

    fn addr(&self) -> &Addr {
        &self.addr
    }

    fn queue_link_change(&mut self, change: LinkEvent) {
        self.link_changes.push_back(change);
    }

    fn on_tick(&mut self, ctx: &mut NodeCtx<'_>) {
        if let Some(change) = self.link_changes.pop_front() {
            match change {
                LinkEvent::Up {
                    link,
                    endpoint,
                    cost,
                } => self.add_link(link, &endpoint, cost, ctx),
                LinkEvent::Down { link } => {
                    if self.remove_link(link, ctx).is_none() {
                        trace!(router = %self.addr, link = ?link, "down for unattached link ignored");
                    }
                }
            }
        }

        let attached: Vec<(Port, LinkId)> = self.link_of.iter().map(|(p, l)| (*p, *l)).collect();
        for (port, link) in attached {
            let Some(pkt) = ctx.links.recv(link, &self.addr, ctx.now) else {
                continue;
            };
            trace!(router = %self.addr, port = %port, kind = ?pkt.kind, src = %pkt.src, "packet in");
            let mut io = ports(&self.addr, &self.link_of, ctx);
            self.protocol.on_packet(port, pkt, &mut io);
        }

        let now_ms = ctx.now.as_millis();
        let mut io = ports(&self.addr, &self.link_of, ctx);
        self.protocol.on_tick(now_ms, &mut io);
    }

    fn protocol(&self) -> Option<ProtocolKind> {
        Some(self.kind)
    }

    fn routes(&self) -> Option<Vec<RouteEntry>> {
        Some(self.protocol.routes())
    }

    fn debug_string(&self) -> String {
        self.protocol.debug_string()
    }
}
