//! 世界 trait

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由网络层实现，事件通过 `as_any_mut` 取回具体类型。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
