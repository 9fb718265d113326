//! 事件 trait

use super::simulator::Simulator;
use super::world::World;

/// 可被调度执行的事件。`self: Box<Self>` 让事件在执行时取回自身所有权
/// （例如周期性事件把自己重新放回队列）。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
