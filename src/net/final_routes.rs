//! 收尾事件

use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};
use tracing::{info, warn};

/// 事件：清空已记录路径，并让客户端立即发出最后一轮 traceroute。
#[derive(Debug)]
pub struct FinalRoutes;

impl Event for FinalRoutes {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(w) = NetWorld::downcast(world) else {
            warn!("FinalRoutes 需要 NetWorld，事件丢弃");
            return;
        };
        info!(now = ?sim.now(), "🏁 收集最终路径");
        w.net.final_routes();
    }
}
