//! 网络世界实现

use super::network::Network;
use crate::sim::World;
use std::any::Any;

/// 持有 `Network` 的仿真世界
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    pub fn new(net: Network) -> Self {
        Self { net }
    }

    /// 从事件拿到的 `dyn World` 取回 `NetWorld`
    pub fn downcast(world: &mut dyn World) -> Option<&mut NetWorld> {
        world.as_any_mut().downcast_mut::<NetWorld>()
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
