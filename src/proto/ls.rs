//! Link-state routing: LSA flooding plus a tentative/confirmed shortest-path
//! computation over the assembled database.
//!
//! An origin's LSA is only ever replaced by one with a strictly larger
//! sequence number. Duplicate suppression is what keeps flooding finite.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Cost, PortIo, RouteEntry, RoutingProtocol};
use crate::net::{Addr, Packet, Port};

/// One advertised adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsaLink {
    pub cost: Cost,
    pub out_port: Port,
}

/// Link-state advertisement: an origin's full neighbor list at one sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lsa {
    pub origin: Addr,
    pub neighbors: BTreeMap<Addr, LsaLink>,
    pub seq: u64,
}

/// Shortest-path result for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfEntry {
    pub cost: Cost,
    pub next_hop: Option<Addr>,
}

#[derive(Debug)]
pub struct LinkState {
    addr: Addr,
    heartbeat_ms: u64,
    last_broadcast_ms: u64,
    /// Sequence number the next self-LSA goes out with.
    seq: u64,
    neighbors: BTreeMap<Addr, LsaLink>,
    port_neighbors: BTreeMap<Port, Addr>,
    lsdb: BTreeMap<Addr, Lsa>,
    confirmed: BTreeMap<Addr, SpfEntry>,
}

impl LinkState {
    pub fn new(addr: Addr, heartbeat_ms: u64) -> Self {
        let mut confirmed = BTreeMap::new();
        confirmed.insert(
            addr.clone(),
            SpfEntry {
                cost: 0,
                next_hop: None,
            },
        );
        Self {
            addr,
            heartbeat_ms,
            last_broadcast_ms: 0,
            seq: 0,
            neighbors: BTreeMap::new(),
            port_neighbors: BTreeMap::new(),
            lsdb: BTreeMap::new(),
            confirmed,
        }
    }

    pub fn addr(&self) -> &Addr {
        &self.addr
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn lsdb(&self) -> &BTreeMap<Addr, Lsa> {
        &self.lsdb
    }

    pub fn confirmed(&self) -> &BTreeMap<Addr, SpfEntry> {
        &self.confirmed
    }

    /// Build the self-LSA at the current sequence number, flood it to every
    /// neighbor and bump the counter.
    fn flood_self(&mut self, io: &mut dyn PortIo) {
        let lsa = Lsa {
            origin: self.addr.clone(),
            neighbors: self.neighbors.clone(),
            seq: self.seq,
        };
        match serde_json::to_vec(&lsa) {
            Ok(content) => {
                for (neighbor, link) in &self.neighbors {
                    io.send(
                        link.out_port,
                        Packet::routing(self.addr.clone(), neighbor.clone(), content.clone()),
                    );
                }
                trace!(router = %self.addr, seq = self.seq, fanout = self.neighbors.len(), "flooded self LSA");
            }
            Err(e) => debug!(error = %e, "failed to encode LSA"),
        }
        self.lsdb.insert(self.addr.clone(), lsa);
        self.seq += 1;
    }

    /// Rebuild the confirmed set from scratch.
    ///
    /// Ties on cost are broken by lowest address, so the result depends only on
    /// the database contents.
    pub fn recompute(&mut self) {
        let mut confirmed = BTreeMap::new();
        let mut tentative: BTreeMap<Addr, SpfEntry> = BTreeMap::new();
        confirmed.insert(
            self.addr.clone(),
            SpfEntry {
                cost: 0,
                next_hop: None,
            },
        );

        let mut next = Some(self.addr.clone());
        while let Some(node) = next.take() {
            let Some(base) = confirmed.get(&node).cloned() else {
                continue;
            };
            if let Some(lsa) = self.lsdb.get(&node) {
                for (neighbor, link) in &lsa.neighbors {
                    if confirmed.contains_key(neighbor) {
                        continue;
                    }
                    let cost = base.cost.saturating_add(link.cost);
                    let next_hop = if node == self.addr {
                        Some(neighbor.clone())
                    } else {
                        base.next_hop.clone()
                    };
                    match tentative.get_mut(neighbor) {
                        None => {
                            tentative.insert(neighbor.clone(), SpfEntry { cost, next_hop });
                        }
                        Some(t) if cost < t.cost => *t = SpfEntry { cost, next_hop },
                        Some(_) => {}
                    }
                }
            }

            // min_by_key keeps the first minimum, i.e. the lowest address.
            let best = tentative
                .iter()
                .min_by_key(|(_, e)| e.cost)
                .map(|(addr, _)| addr.clone());
            if let Some((addr, entry)) = best.and_then(|a| tentative.remove_entry(&a)) {
                confirmed.insert(addr.clone(), entry);
                next = Some(addr);
            }
        }

        debug!(router = %self.addr, confirmed = confirmed.len(), "shortest paths recomputed");
        self.confirmed = confirmed;
    }

    fn forward(&self, pkt: Packet, io: &mut dyn PortIo) {
        let port = self
            .confirmed
            .get(&pkt.dst)
            .and_then(|e| e.next_hop.as_ref())
            .and_then(|nh| self.neighbors.get(nh))
            .map(|link| link.out_port);
        match port {
            Some(port) => io.send(port, pkt),
            None => trace!(dst = %pkt.dst, "no route, dropping traceroute"),
        }
    }

    fn accept(&mut self, in_port: Port, pkt: Packet, lsa: Lsa, io: &mut dyn PortIo) {
        // We are authoritative for our own LSA; echoes are never installed.
        if lsa.origin == self.addr {
            return;
        }
        let fresh = self
            .lsdb
            .get(&lsa.origin)
            .is_none_or(|stored| lsa.seq > stored.seq);
        if !fresh {
            trace!(origin = %lsa.origin, seq = lsa.seq, "stale LSA dropped");
            return;
        }

        debug!(origin = %lsa.origin, seq = lsa.seq, "LSA accepted");
        let origin = lsa.origin.clone();
        self.lsdb.insert(origin.clone(), lsa);
        self.recompute();

        for (neighbor, link) in &self.neighbors {
            if link.out_port != in_port && *neighbor != origin {
                io.send(link.out_port, pkt.clone());
            }
        }
    }
}

impl RoutingProtocol for LinkState {
    fn name(&self) -> &'static str {
        "ls"
    }

    #[tracing::instrument(skip(self, pkt, io), fields(router = %self.addr, src = %pkt.src))]
    fn on_packet(&mut self, port: Port, pkt: Packet, io: &mut dyn PortIo) {
        if pkt.is_traceroute() {
            self.forward(pkt, io);
            return;
        }
        match serde_json::from_slice::<Lsa>(&pkt.content) {
            Ok(lsa) => self.accept(port, pkt, lsa, io),
            Err(e) => debug!(error = %e, "undecodable LSA dropped"),
        }
    }

    #[tracing::instrument(skip(self, io), fields(router = %self.addr))]
    fn on_link_up(&mut self, port: Port, endpoint: &Addr, cost: Cost, io: &mut dyn PortIo) {
        self.port_neighbors.insert(port, endpoint.clone());
        self.neighbors.insert(
            endpoint.clone(),
            LsaLink {
                cost,
                out_port: port,
            },
        );
        self.flood_self(io);
        self.recompute();
    }

    #[tracing::instrument(skip(self, io), fields(router = %self.addr))]
    fn on_link_down(&mut self, port: Port, io: &mut dyn PortIo) {
        let Some(neighbor) = self.port_neighbors.remove(&port) else {
            return;
        };
        self.neighbors.remove(&neighbor);
        // Local knowledge only; re-learned if the neighbor floods again.
        self.lsdb.remove(&neighbor);
        self.flood_self(io);
        self.recompute();
    }

    fn on_tick(&mut self, now_ms: u64, io: &mut dyn PortIo) {
        if now_ms.saturating_sub(self.last_broadcast_ms) >= self.heartbeat_ms {
            self.flood_self(io);
            self.last_broadcast_ms = now_ms;
        }
    }

    fn routes(&self) -> Vec<RouteEntry> {
        self.confirmed
            .iter()
            .filter(|(dest, _)| **dest != self.addr)
            .map(|(dest, e)| RouteEntry {
                dest: dest.clone(),
                cost: e.cost,
                next_hop: e.next_hop.clone(),
                out_port: e
                    .next_hop
                    .as_ref()
                    .and_then(|nh| self.neighbors.get(nh))
                    .map(|link| link.out_port),
            })
            .collect()
    }
}
