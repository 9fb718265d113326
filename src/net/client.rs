//! 客户端节点
//!
//! 客户端挂在一条链路上，按固定间隔向所有其它客户端发送 traceroute 包，
//! 并把收到的包所记录的路径上报给 `RouteTracker`。

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::id::{Addr, LinkId, NodeId};
use super::node::{LinkEvent, Node, NodeCtx};
use super::packet::Packet;
use crate::sim::SimTime;

pub struct Client {
    id: NodeId,
    addr: Addr,
    link: Option<LinkId>,
    peers: Vec<Addr>,
    send_rate: SimTime,
    last_send: Option<SimTime>,
    final_send: bool,
    link_changes: VecDeque<LinkEvent>,
}

impl Client {
    /// `peers` 中等于自身地址的项会被忽略
    pub fn new(id: NodeId, addr: Addr, peers: Vec<Addr>, send_rate: SimTime) -> Self {
        let peers = peers.into_iter().filter(|p| *p != addr).collect();
        Self {
            id,
            addr,
            link: None,
            peers,
            send_rate,
            last_send: None,
            final_send: false,
            link_changes: VecDeque::new(),
        }
    }

    fn send_due(&self, now: SimTime) -> bool {
        self.final_send
            || self
                .last_send
                .is_none_or(|t| now.saturating_sub(t) >= self.send_rate)
    }
}

impl Node for Client {
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
        match self.link_changes.pop_front() {
            Some(LinkEvent::Up { link, .. }) => self.link = Some(link),
            Some(LinkEvent::Down { link }) if self.link == Some(link) => self.link = None,
            _ => {}
        }
        let Some(link) = self.link else {
            return;
        };

        if let Some(pkt) = ctx.links.recv(link, &self.addr, ctx.now) {
            if pkt.is_traceroute() && pkt.dst == self.addr {
                debug!(client = %self.addr, src = %pkt.src, hops = pkt.route.len(), "traceroute arrived");
                ctx.stats.traces_delivered += 1;
                ctx.routes.update(pkt.src, pkt.dst, pkt.route, ctx.now);
            } else {
                trace!(client = %self.addr, kind = ?pkt.kind, "ignored packet");
            }
        }

        if self.send_due(ctx.now) {
            for peer in &self.peers {
                let pkt = Packet::traceroute(self.addr.clone(), peer.clone());
                if ctx.links.send(link, &self.addr, pkt, ctx.now) {
                    ctx.stats.traces_sent += 1;
                }
            }
            self.last_send = Some(ctx.now);
            self.final_send = false;
        }
    }

    fn debug_string(&self) -> String {
        format!("Client: address {}", self.addr)
    }

    fn request_final_send(&mut self) {
        self.final_send = true;
    }
}
