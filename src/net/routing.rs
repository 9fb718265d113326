//! 参考最短路径
//!
//! 直接在当前存活的链路上跑 Dijkstra，得到各节点之间的真实最短代价，
//! 用来检验协议收敛后的路由表。客户端只作为端点，不做中转。

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::id::Addr;
use super::link::Link;
use crate::proto::Cost;

#[derive(Debug, Default, Clone)]
pub struct ReferencePaths {
    adj: HashMap<Addr, Vec<(Addr, Cost)>>,
    /// (from, to) -> 最短代价；不可达的对不出现
    dist: HashMap<(Addr, Addr), Cost>,
    transit: HashSet<Addr>,
}

impl ReferencePaths {
    /// `transit` 为允许中转的节点（路由器）
    pub fn build<'a>(links: impl IntoIterator<Item = &'a Link>, transit: &HashSet<Addr>) -> Self {
        let mut adj: HashMap<Addr, Vec<(Addr, Cost)>> = HashMap::new();
        for link in links {
            adj.entry(link.a.clone())
                .or_default()
                .push((link.b.clone(), link.cost));
            adj.entry(link.b.clone())
                .or_default()
                .push((link.a.clone(), link.cost));
        }

        let mut dist = HashMap::new();
        for src in adj.keys() {
            for (dst, d) in dijkstra(&adj, src, transit) {
                dist.insert((src.clone(), dst), d);
            }
        }
        Self {
            adj,
            dist,
            transit: transit.clone(),
        }
    }

    pub fn cost(&self, from: &Addr, to: &Addr) -> Option<Cost> {
        self.dist.get(&(from.clone(), to.clone())).copied()
    }

    /// 两个直连节点之间最便宜的链路代价
    pub fn link_cost(&self, a: &Addr, b: &Addr) -> Option<Cost> {
        self.adj
            .get(a)?
            .iter()
            .filter(|(n, _)| n == b)
            .map(|(_, c)| *c)
            .min()
    }

    /// `next_hop` 是否位于 `from` 到 `to` 的某条最短路径上
    pub fn is_on_shortest_path(&self, from: &Addr, next_hop: &Addr, to: &Addr) -> bool {
        let (Some(total), Some(first)) = (self.cost(from, to), self.link_cost(from, next_hop)) else {
            return false;
        };
        let rest = if next_hop == to {
            Some(0)
        } else if self.transit.contains(next_hop) {
            self.cost(next_hop, to)
        } else {
            None
        };
        rest.is_some_and(|r| first.saturating_add(r) == total)
    }
}

fn dijkstra(
    adj: &HashMap<Addr, Vec<(Addr, Cost)>>,
    src: &Addr,
    transit: &HashSet<Addr>,
) -> HashMap<Addr, Cost> {
    let mut best: HashMap<Addr, Cost> = HashMap::new();
    let mut heap = BinaryHeap::new();
    best.insert(src.clone(), 0);
    heap.push(Reverse((0, src.clone())));

    while let Some(Reverse((d, node))) = heap.pop() {
        if best.get(&node).is_some_and(|&b| d > b) {
            continue;
        }
        // 非中转节点只能是路径终点
        if node != *src && !transit.contains(&node) {
            continue;
        }
        for (next, c) in adj.get(&node).into_iter().flatten() {
            let nd = d.saturating_add(*c);
            if best.get(next).is_none_or(|&b| nd < b) {
                best.insert(next.clone(), nd);
                heap.push(Reverse((nd, next.clone())));
            }
        }
    }

    best.remove(src);
    best
}
