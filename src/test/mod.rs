use crate::net::{Packet, Port};
use crate::proto::PortIo;

mod dv;
mod link;
mod sim_time;

/// 记录引擎发出的包，代替真实链路
#[derive(Debug, Default)]
pub(crate) struct Sent(pub(crate) Vec<(Port, Packet)>);

impl Sent {
    pub(crate) fn ports(&self) -> Vec<Port> {
        self.0.iter().map(|(p, _)| *p).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PortIo for Sent {
    fn send(&mut self, port: Port, pkt: Packet) {
        self.0.push((port, pkt));
    }
}
