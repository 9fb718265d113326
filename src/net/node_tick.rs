//! 节点轮询事件

use super::id::NodeId;
use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};
use tracing::warn;

/// 事件：驱动一个节点完成一次 tick，然后按轮询周期重新调度自己。
#[derive(Debug)]
pub struct NodeTick {
    pub node: NodeId,
}

impl Event for NodeTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(w) = NetWorld::downcast(world) else {
            warn!("NodeTick 需要 NetWorld，事件丢弃");
            return;
        };
        w.net.tick_node(self.node, sim.now());
        let period = w.net.tick_period();
        sim.schedule_after(period, *self);
    }
}
