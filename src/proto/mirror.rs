//! Protocol-less router: every packet goes straight back out the port it came in on.

use super::{Cost, PortIo, RouteEntry, RoutingProtocol};
use crate::net::{Addr, Packet, Port};

#[derive(Debug)]
pub struct Mirror {
    addr: Addr,
}

impl Mirror {
    pub fn new(addr: Addr) -> Self {
        Self { addr }
    }
}

impl RoutingProtocol for Mirror {
    fn name(&self) -> &'static str {
        "mirror"
    }

    fn on_packet(&mut self, port: Port, pkt: Packet, io: &mut dyn PortIo) {
        io.send(port, pkt);
    }

    fn on_link_up(&mut self, _port: Port, _endpoint: &Addr, _cost: Cost, _io: &mut dyn PortIo) {}

    fn on_link_down(&mut self, _port: Port, _io: &mut dyn PortIo) {}

    fn on_tick(&mut self, _now_ms: u64, _io: &mut dyn PortIo) {}

    fn routes(&self) -> Vec<RouteEntry> {
        Vec::new()
    }

    fn debug_string(&self) -> String {
        format!("Mirror router: address {}", self.addr)
    }
}
