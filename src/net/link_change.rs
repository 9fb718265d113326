//! 链路变化事件

use super::net_world::NetWorld;
use super::network::LinkChange;
use crate::sim::{Event, Simulator, World};
use tracing::{info, warn};

/// 事件：在指定时刻建立或拆除一条链路。
#[derive(Debug)]
pub struct ApplyLinkChange {
    pub change: LinkChange,
}

impl Event for ApplyLinkChange {
    #[tracing::instrument(skip(self, sim, world), fields(change = ?self.change))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Some(w) = NetWorld::downcast(world) else {
            warn!("ApplyLinkChange 需要 NetWorld，事件丢弃");
            return;
        };
        info!(now = ?sim.now(), "🔀 应用链路变化");
        if let Err(e) = w.net.apply(&self.change) {
            warn!(error = %e, "链路变化无效，忽略");
        }
    }
}
