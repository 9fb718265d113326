//! Distance-vector routing (Bellman-Ford relaxation with poisoning).
//!
//! Each router keeps one entry per known destination and periodically ships
//! its whole table to every neighbor. Routes that break are poisoned to
//! [`INFINITY`] instead of being deleted, and the poison spreads hop by hop.
//!
//! Propagation is deliberately slow: receiving an advertisement never triggers
//! an immediate re-broadcast. Tables move outward only on the heartbeat or on
//! the next local link change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Cost, INFINITY, PortIo, RouteEntry, RoutingProtocol, clamp_cost};
use crate::net::{Addr, Packet, Port};

/// Routing table entry. `cost == INFINITY` iff both `next_hop` and `out_port` are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DvEntry {
    pub cost: Cost,
    pub next_hop: Option<Addr>,
    pub out_port: Option<Port>,
}

impl DvEntry {
    pub fn unreachable() -> Self {
        Self {
            cost: INFINITY,
            next_hop: None,
            out_port: None,
        }
    }

    /// Route through `next_hop`; collapses to [`DvEntry::unreachable`] once the cost hits `INFINITY`.
    pub fn via(cost: Cost, next_hop: Addr, out_port: Port) -> Self {
        if clamp_cost(cost) >= INFINITY {
            return Self::unreachable();
        }
        Self {
            cost,
            next_hop: Some(next_hop),
            out_port: Some(out_port),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.cost < INFINITY
    }
}

/// Wire form of a routing packet: the sender's table as advertised to one neighbor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DvAdvert {
    pub routes: BTreeMap<Addr, DvEntry>,
}

/// Direct link to a neighbor, independent of the (possibly multi-hop) table entry for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Neighbor {
    out_port: Port,
    cost: Cost,
}

#[derive(Debug)]
pub struct DistanceVector {
    addr: Addr,
    heartbeat_ms: u64,
    last_broadcast_ms: u64,
    table: BTreeMap<Addr, DvEntry>,
    neighbors: BTreeMap<Addr, Neighbor>,
    port_neighbors: BTreeMap<Port, Addr>,
}

impl DistanceVector {
    pub fn new(addr: Addr, heartbeat_ms: u64) -> Self {
        Self {
            addr,
            heartbeat_ms,
            last_broadcast_ms: 0,
            table: BTreeMap::new(),
            neighbors: BTreeMap::new(),
            port_neighbors: BTreeMap::new(),
        }
    }

    pub fn addr(&self) -> &Addr {
        &self.addr
    }

    pub fn entry(&self, dest: &Addr) -> Option<&DvEntry> {
        self.table.get(dest)
    }

    pub fn table(&self) -> &BTreeMap<Addr, DvEntry> {
        &self.table
    }

    /// Direct link cost to `neighbor`, if it is attached.
    pub fn neighbor_cost(&self, neighbor: &Addr) -> Option<Cost> {
        self.neighbors.get(neighbor).map(|n| n.cost)
    }

    /// Table as shown to `neighbor`.
    ///
    /// Our own address goes out at cost 0 so neighbors can always relax against
    /// the direct link. Routes whose next hop is `neighbor` are reported as
    /// unreachable (poison reverse).
    pub fn advert_for(&self, neighbor: &Addr) -> DvAdvert {
        let mut routes = BTreeMap::new();
        routes.insert(
            self.addr.clone(),
            DvEntry {
                cost: 0,
                next_hop: None,
                out_port: None,
            },
        );
        for (dest, entry) in &self.table {
            let shown = if entry.next_hop.as_ref() == Some(neighbor) {
                DvEntry::unreachable()
            } else {
                entry.clone()
            };
            routes.insert(dest.clone(), shown);
        }
        DvAdvert { routes }
    }

    /// Send the table to every attached neighbor.
    fn broadcast(&self, io: &mut dyn PortIo) {
        for (neighbor, link) in &self.neighbors {
            let advert = self.advert_for(neighbor);
            let content = match serde_json::to_vec(&advert) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "failed to encode distance vector");
                    continue;
                }
            };
            trace!(to = %neighbor, port = %link.out_port, routes = advert.routes.len(), "advertise table");
            io.send(
                link.out_port,
                Packet::routing(self.addr.clone(), neighbor.clone(), content),
            );
        }
    }

    fn forward(&self, pkt: Packet, io: &mut dyn PortIo) {
        let port = self
            .table
            .get(&pkt.dst)
            .filter(|e| e.is_reachable())
            .and_then(|e| e.out_port);
        match port {
            Some(port) => io.send(port, pkt),
            None => trace!(dst = %pkt.dst, "no route, dropping traceroute"),
        }
    }

    /// Relax the local table against one neighbor's advertisement.
    fn merge(&mut self, sender: &Addr, advert: DvAdvert) {
        let Some(link) = self.neighbors.get(sender).copied() else {
            trace!(from = %sender, "advertisement from unknown neighbor, ignored");
            return;
        };

        for (dest, remote) in advert.routes {
            if dest == self.addr {
                continue;
            }
            let remote_broken = remote.cost >= INFINITY;

            // The sender reports its own path to `dest` as broken.
            if remote_broken && remote.next_hop.as_ref() == Some(sender) {
                if let Some(local) = self.table.get_mut(&dest) {
                    *local = DvEntry::unreachable();
                }
            }

            let candidate = clamp_cost(remote.cost.saturating_add(link.cost));
            match self.table.get_mut(&dest) {
                None => {
                    let entry = DvEntry::via(candidate, sender.clone(), link.out_port);
                    debug!(dest = %dest, cost = entry.cost, via = %sender, "learned destination");
                    self.table.insert(dest, entry);
                }
                Some(local) if candidate < local.cost => {
                    debug!(dest = %dest, old = local.cost, new = candidate, via = %sender, "better route");
                    *local = DvEntry::via(candidate, sender.clone(), link.out_port);
                }
                Some(local) if remote_broken && local.next_hop.as_ref() == Some(sender) => {
                    debug!(dest = %dest, via = %sender, "route poisoned by neighbor");
                    *local = DvEntry::unreachable();
                }
                // Our next hop's own cost went up: follow it.
                Some(local) if local.next_hop.as_ref() == Some(sender) && candidate != local.cost => {
                    debug!(dest = %dest, old = local.cost, new = candidate, via = %sender, "next hop cost changed");
                    *local = DvEntry::via(candidate, sender.clone(), link.out_port);
                }
                Some(_) => {}
            }
        }
    }
}

impl RoutingProtocol for DistanceVector {
    fn name(&self) -> &'static str {
        "dv"
    }

    #[tracing::instrument(skip(self, pkt, io), fields(router = %self.addr, src = %pkt.src))]
    fn on_packet(&mut self, port: Port, pkt: Packet, io: &mut dyn PortIo) {
        if pkt.is_traceroute() {
            self.forward(pkt, io);
            return;
        }
        match serde_json::from_slice::<DvAdvert>(&pkt.content) {
            Ok(advert) => self.merge(&pkt.src, advert),
            Err(e) => debug!(error = %e, "undecodable distance vector dropped"),
        }
    }

    #[tracing::instrument(skip(self, io), fields(router = %self.addr))]
    fn on_link_up(&mut self, port: Port, endpoint: &Addr, cost: Cost, io: &mut dyn PortIo) {
        self.port_neighbors.insert(port, endpoint.clone());
        self.neighbors.insert(
            endpoint.clone(),
            Neighbor {
                out_port: port,
                cost,
            },
        );

        let install = self
            .table
            .get(endpoint)
            .is_none_or(|existing| cost < existing.cost);
        if install {
            self.table
                .insert(endpoint.clone(), DvEntry::via(cost, endpoint.clone(), port));
        }
        debug!(installed = install, "neighbor attached");
        self.broadcast(io);
    }

    #[tracing::instrument(skip(self, io), fields(router = %self.addr))]
    fn on_link_down(&mut self, port: Port, io: &mut dyn PortIo) {
        if let Some(neighbor) = self.port_neighbors.remove(&port) {
            self.neighbors.remove(&neighbor);
        }
        let mut poisoned = 0usize;
        for entry in self.table.values_mut() {
            if entry.out_port == Some(port) {
                *entry = DvEntry::unreachable();
                poisoned += 1;
            }
        }
        debug!(poisoned, "neighbor detached");
        self.broadcast(io);
    }

    fn on_tick(&mut self, now_ms: u64, io: &mut dyn PortIo) {
        if now_ms.saturating_sub(self.last_broadcast_ms) >= self.heartbeat_ms {
            trace!(router = %self.addr, now_ms, "heartbeat");
            self.broadcast(io);
            self.last_broadcast_ms = now_ms;
        }
    }

    fn routes(&self) -> Vec<RouteEntry> {
        self.table
            .iter()
            .map(|(dest, e)| RouteEntry {
                dest: dest.clone(),
                cost: e.cost,
                next_hop: e.next_hop.clone(),
                out_port: e.out_port,
            })
            .collect()
    }
}
