//! 网络拓扑管理
//!
//! 持有全部节点与链路，负责把拓扑变化分发给两端节点，并提供
//! 收敛检查、转发路径追踪等诊断接口。

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use tracing::{debug, info, warn};

use super::client::Client;
use super::id::{Addr, LinkId, NodeId};
use super::link::LinkTable;
use super::node::{LinkEvent, Node, NodeCtx};
use super::route_tracker::RouteTracker;
use super::router::Router;
use super::routing::ReferencePaths;
use super::stats::Stats;
use crate::error::TopologyError;
use crate::proto::{Cost, INFINITY, ProtocolKind, RouteEntry};
use crate::sim::SimTime;

/// 路由器轮询周期
pub const DEFAULT_TICK_MS: u64 = 100;
/// 每单位链路代价对应的传播时延
pub const DEFAULT_LATENCY_MULTIPLIER_MS: u64 = 100;

/// 一次链路变化（由拓扑描述中的 changes 生成）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChange {
    Up { a: Addr, b: Addr, cost: Cost },
    Down { a: Addr, b: Addr },
}

/// 沿路由表逐跳追踪的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forwarding {
    Delivered(Vec<Addr>),
    /// 在路径最后一个节点处没有可用路由
    Unreachable(Vec<Addr>),
    /// 路径最后一个节点重复出现
    Loop(Vec<Addr>),
}

pub struct Network {
    nodes: Vec<Box<dyn Node>>,
    index: HashMap<Addr, NodeId>,
    links: LinkTable,
    edges: HashMap<(Addr, Addr), LinkId>,
    latency_multiplier_ms: u64,
    tick: SimTime,
    pub routes: RouteTracker,
    pub stats: Stats,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(
            DEFAULT_LATENCY_MULTIPLIER_MS,
            SimTime::from_millis(DEFAULT_TICK_MS),
        )
    }
}

fn edge_key(a: &Addr, b: &Addr) -> (Addr, Addr) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl Network {
    pub fn new(latency_multiplier_ms: u64, tick: SimTime) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            links: LinkTable::default(),
            edges: HashMap::new(),
            latency_multiplier_ms,
            tick,
            routes: RouteTracker::default(),
            stats: Stats::default(),
        }
    }

    pub fn tick_period(&self) -> SimTime {
        self.tick
    }

    /// 链路代价换算为传播时延
    pub fn latency_for(&self, cost: Cost) -> SimTime {
        SimTime::from_millis(u64::from(cost).saturating_mul(self.latency_multiplier_ms))
    }

    fn register(&mut self, addr: &Addr) -> Result<NodeId, TopologyError> {
        if self.index.contains_key(addr) {
            return Err(TopologyError::DuplicateAddr(addr.clone()));
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(addr.clone(), id);
        Ok(id)
    }

    pub fn add_router(
        &mut self,
        addr: Addr,
        kind: ProtocolKind,
        heartbeat_ms: u64,
    ) -> Result<NodeId, TopologyError> {
        let id = self.register(&addr)?;
        debug!(addr = %addr, protocol = %kind, heartbeat_ms, "添加路由器");
        self.nodes
            .push(Box::new(Router::new(id, addr, kind, heartbeat_ms)));
        Ok(id)
    }

    pub fn add_client(
        &mut self,
        addr: Addr,
        peers: Vec<Addr>,
        send_rate: SimTime,
    ) -> Result<NodeId, TopologyError> {
        let id = self.register(&addr)?;
        debug!(addr = %addr, peers = peers.len(), "添加客户端");
        self.nodes
            .push(Box::new(Client::new(id, addr, peers, send_rate)));
        Ok(id)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    pub fn node(&self, addr: &Addr) -> Option<&dyn Node> {
        let id = self.index.get(addr)?;
        self.nodes.get(id.0).map(|n| n.as_ref())
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn link_between(&self, a: &Addr, b: &Addr) -> Option<LinkId> {
        self.edges.get(&edge_key(a, b)).copied()
    }

    fn queue(&mut self, addr: &Addr, change: LinkEvent) {
        if let Some(node) = self.index.get(addr).and_then(|id| self.nodes.get_mut(id.0)) {
            node.queue_link_change(change);
        }
    }

    pub fn apply(&mut self, change: &LinkChange) -> Result<Option<LinkId>, TopologyError> {
        match change {
            LinkChange::Up { a, b, cost } => self.link_up(a, b, *cost).map(Some),
            LinkChange::Down { a, b } => Ok(self.link_down(a, b)),
        }
    }

    /// 建立（或修改代价）一条双向链路，并通知两端节点。
    ///
    /// 已存在的链路只更新代价，两端保持原有端口。
    pub fn link_up(&mut self, a: &Addr, b: &Addr, cost: Cost) -> Result<LinkId, TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a.clone()));
        }
        for end in [a, b] {
            if !self.index.contains_key(end) {
                return Err(TopologyError::UnknownEndpoint {
                    a: a.clone(),
                    b: b.clone(),
                    missing: end.clone(),
                });
            }
        }

        let latency = self.latency_for(cost);
        let existing = self
            .link_between(a, b)
            .filter(|id| self.links.get(*id).is_some());
        let id = match existing.and_then(|id| self.links.get_mut(id)) {
            Some(link) => {
                link.cost = cost;
                link.latency = latency;
                info!(a = %a, b = %b, cost, "🔧 链路代价变化");
                link.id
            }
            None => {
                let id = self.links.insert(a.clone(), b.clone(), cost, latency);
                self.edges.insert(edge_key(a, b), id);
                info!(a = %a, b = %b, cost, link = ?id, "⬆️  链路建立");
                id
            }
        };

        self.queue(
            a,
            LinkEvent::Up {
                link: id,
                endpoint: b.clone(),
                cost,
            },
        );
        self.queue(
            b,
            LinkEvent::Up {
                link: id,
                endpoint: a.clone(),
                cost,
            },
        );
        Ok(id)
    }

    /// 拆除链路；链路不存在时返回 None
    pub fn link_down(&mut self, a: &Addr, b: &Addr) -> Option<LinkId> {
        let Some(id) = self.edges.remove(&edge_key(a, b)) else {
            warn!(a = %a, b = %b, "拆除不存在的链路，忽略");
            return None;
        };
        self.links.remove(id);
        info!(a = %a, b = %b, link = ?id, "⬇️  链路拆除");
        self.queue(a, LinkEvent::Down { link: id });
        self.queue(b, LinkEvent::Down { link: id });
        Some(id)
    }

    /// 驱动一个节点的一次 tick
    pub fn tick_node(&mut self, id: NodeId, now: SimTime) {
        let Network {
            nodes,
            links,
            routes,
            stats,
            ..
        } = self;
        let Some(node) = nodes.get_mut(id.0) else {
            return;
        };
        let mut ctx = NodeCtx {
            now,
            links,
            routes,
            stats,
        };
        node.on_tick(&mut ctx);
    }

    pub fn routing_table(&self, addr: &Addr) -> Option<Vec<RouteEntry>> {
        self.node(addr)?.routes()
    }

    /// 当前存活链路上的真实最短路径（只经路由器中转）
    pub fn reference_paths(&self) -> ReferencePaths {
        let transit: HashSet<Addr> = self
            .nodes
            .iter()
            .filter(|n| n.protocol().is_some())
            .map(|n| n.addr().clone())
            .collect();
        ReferencePaths::build(self.links.live(), &transit)
    }

    /// 与参考最短路径不一致的路由项；为空表示已收敛。
    ///
    /// 距离向量路由器对代价达到 INFINITY 的目的地只要求标记为不可达。
    pub fn convergence_errors(&self) -> Vec<String> {
        let reference = self.reference_paths();
        let mut errors = Vec::new();

        for router in &self.nodes {
            let Some(kind) = router.protocol() else {
                continue;
            };
            if kind == ProtocolKind::Mirror {
                continue;
            }
            let table: HashMap<Addr, RouteEntry> = router
                .routes()
                .unwrap_or_default()
                .into_iter()
                .map(|e| (e.dest.clone(), e))
                .collect();
            let from = router.addr();

            for dest in self.nodes.iter().map(|n| n.addr()).filter(|d| *d != from) {
                let expected = reference
                    .cost(from, dest)
                    .filter(|c| kind != ProtocolKind::Dv || *c < INFINITY);
                let entry = table.get(dest).filter(|e| e.is_reachable());
                match (expected, entry) {
                    (None, None) => {}
                    (None, Some(e)) => {
                        errors.push(format!("{from}: {dest} should be unreachable, has {e}"));
                    }
                    (Some(c), None) => {
                        errors.push(format!("{from}: {dest} missing, expected cost {c}"));
                    }
                    (Some(c), Some(e)) => {
                        if e.cost != c {
                            errors.push(format!("{from}: {dest} cost {} expected {c}", e.cost));
                        } else if let Some(nh) = &e.next_hop {
                            if !reference.is_on_shortest_path(from, nh, dest) {
                                errors.push(format!("{from}: {dest} next hop {nh} not on a shortest path"));
                            }
                        }
                    }
                }
            }
        }
        errors
    }

    pub fn converged(&self) -> bool {
        self.convergence_errors().is_empty()
    }

    /// 从 `from` 出发沿各路由器的路由表逐跳追踪到 `to`，最多走节点数那么多步。
    pub fn forwarding_path(&self, from: &Addr, to: &Addr) -> Forwarding {
        let mut path = vec![from.clone()];
        let mut cur = from.clone();
        for _ in 0..=self.nodes.len() {
            if cur == *to {
                return Forwarding::Delivered(path);
            }
            let next_hop = self
                .routing_table(&cur)
                .and_then(|t| t.into_iter().find(|e| e.dest == *to))
                .filter(|e| e.is_reachable())
                .and_then(|e| e.next_hop);
            let Some(nh) = next_hop else {
                return Forwarding::Unreachable(path);
            };
            let looped = path.contains(&nh);
            path.push(nh.clone());
            if looped {
                return Forwarding::Loop(path);
            }
            cur = nh;
        }
        Forwarding::Loop(path)
    }

    /// 收尾：清空已记录的路径，让所有客户端立即再发一轮
    pub fn final_routes(&mut self) {
        self.routes.reset();
        for node in &mut self.nodes {
            node.request_final_send();
        }
    }

    /// 所有路由器的路由表（按地址排序）
    pub fn dump_tables(&self) -> String {
        let mut routers: Vec<&dyn Node> = self
            .nodes
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| n.protocol().is_some())
            .collect();
        routers.sort_by(|a, b| a.addr().cmp(b.addr()));

        let mut out = String::new();
        for r in routers {
            let kind = r.protocol().map(|k| k.to_string()).unwrap_or_default();
            let _ = writeln!(out, "{} ({kind}):", r.addr());
            for line in r.debug_string().lines() {
                let _ = writeln!(out, "  {line}");
            }
        }
        out
    }
}
