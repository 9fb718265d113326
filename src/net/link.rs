//! 链路类型
//!
//! 双向、无损、每个方向 FIFO 的链路。传播时延由链路代价乘以
//! `latency_multiplier` 得出；接收端每次轮询最多取走一个已到达的包。

use std::collections::VecDeque;

use tracing::trace;

use super::id::{Addr, LinkId};
use super::packet::Packet;
use crate::proto::Cost;
use crate::sim::SimTime;

#[derive(Debug)]
struct InFlight {
    arrive: SimTime,
    pkt: Packet,
}

#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub a: Addr,
    pub b: Addr,
    pub cost: Cost,
    pub latency: SimTime,
    a_to_b: VecDeque<InFlight>,
    b_to_a: VecDeque<InFlight>,
}

impl Link {
    pub fn new(id: LinkId, a: Addr, b: Addr, cost: Cost, latency: SimTime) -> Self {
        Self {
            id,
            a,
            b,
            cost,
            latency,
            a_to_b: VecDeque::new(),
            b_to_a: VecDeque::new(),
        }
    }

    /// 另一端的地址；`addr` 不是端点时返回 None
    pub fn other_end(&self, addr: &Addr) -> Option<&Addr> {
        if *addr == self.a {
            Some(&self.b)
        } else if *addr == self.b {
            Some(&self.a)
        } else {
            None
        }
    }

    /// 从 `from` 一端发出；traceroute 包在这里记录对端地址。
    pub fn send(&mut self, from: &Addr, mut pkt: Packet, now: SimTime) {
        let arrive = now.saturating_add(self.latency);
        let (to, q) = if *from == self.a {
            (&self.b, &mut self.a_to_b)
        } else if *from == self.b {
            (&self.a, &mut self.b_to_a)
        } else {
            trace!(link = ?self.id, from = %from, "sender is not an endpoint, dropped");
            return;
        };
        pkt.add_to_route(to);
        q.push_back(InFlight { arrive, pkt });
    }

    /// 在 `at` 一端取出至多一个已到达的包
    pub fn recv(&mut self, at: &Addr, now: SimTime) -> Option<Packet> {
        let q = if *at == self.b {
            &mut self.a_to_b
        } else if *at == self.a {
            &mut self.b_to_a
        } else {
            return None;
        };
        if q.front()?.arrive > now {
            return None;
        }
        q.pop_front().map(|f| f.pkt)
    }

    /// 两个方向上尚未被取走的包数
    pub fn in_flight(&self) -> usize {
        self.a_to_b.len() + self.b_to_a.len()
    }
}

/// 所有链路；被拆除的链路留下空位，保证 `LinkId` 不被复用。
#[derive(Debug, Default)]
pub struct LinkTable {
    slots: Vec<Option<Link>>,
}

impl LinkTable {
    pub fn insert(&mut self, a: Addr, b: Addr, cost: Cost, latency: SimTime) -> LinkId {
        let id = LinkId(self.slots.len());
        self.slots.push(Some(Link::new(id, a, b, cost, latency)));
        id
    }

    /// 拆除链路，链路上未送达的包一并丢弃
    pub fn remove(&mut self, id: LinkId) -> Option<Link> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn get(&self, id: LinkId) -> Option<&Link> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// 仍然存活的链路
    pub fn live(&self) -> impl Iterator<Item = &Link> {
        self.slots.iter().flatten()
    }

    /// 发往已拆除的链路时静默丢弃，返回是否真正发出
    pub fn send(&mut self, id: LinkId, from: &Addr, pkt: Packet, now: SimTime) -> bool {
        match self.get_mut(id) {
            Some(link) => {
                link.send(from, pkt, now);
                true
            }
            None => {
                trace!(link = ?id, "link is gone, packet dropped");
                false
            }
        }
    }

    pub fn recv(&mut self, id: LinkId, at: &Addr, now: SimTime) -> Option<Packet> {
        self.get_mut(id)?.recv(at, now)
    }
}
