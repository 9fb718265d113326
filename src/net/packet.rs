//! 数据包类型
//!
//! 路由器之间只交换两类数据包：诊断用的 traceroute 包和协议控制包。

use super::id::Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Diagnostic traffic, forwarded by the routing table.
    Traceroute,
    /// Protocol control traffic, consumed by the neighbor that receives it.
    Routing,
}

#[derive(Debug, Clone)]
pub struct Packet {
    pub kind: PacketKind,
    pub src: Addr,
    pub dst: Addr,
    /// Engine-specific serialized state for routing packets, empty for traceroute.
    pub content: Vec<u8>,
    /// Addresses visited so far (traceroute only; the link appends the far end).
    pub route: Vec<Addr>,
}

impl Packet {
    /// 新建 traceroute 包，路径从源地址开始记录
    pub fn traceroute(src: Addr, dst: Addr) -> Self {
        Self {
            kind: PacketKind::Traceroute,
            route: vec![src.clone()],
            src,
            dst,
            content: Vec::new(),
        }
    }

    pub fn routing(src: Addr, dst: Addr, content: Vec<u8>) -> Self {
        Self {
            kind: PacketKind::Routing,
            src,
            dst,
            content,
            route: Vec::new(),
        }
    }

    pub fn is_traceroute(&self) -> bool {
        self.kind == PacketKind::Traceroute
    }

    pub fn is_routing(&self) -> bool {
        self.kind == PacketKind::Routing
    }

    /// 记录一跳（仅 traceroute 包）
    pub(crate) fn add_to_route(&mut self, addr: &Addr) {
        if self.is_traceroute() {
            self.route.push(addr.clone());
        }
    }
}
