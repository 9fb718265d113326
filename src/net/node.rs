//! 节点类型
//!
//! 网络中有两种节点：运行路由协议的路由器和只收发 traceroute 包的客户端。
//! 两者都由周期性的 `NodeTick` 事件驱动。

use super::id::{Addr, LinkId, NodeId};
use super::link::LinkTable;
use super::route_tracker::RouteTracker;
use super::stats::Stats;
use crate::proto::{Cost, ProtocolKind, RouteEntry};
use crate::sim::SimTime;

/// 排队等待节点处理的链路变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Up {
        link: LinkId,
        endpoint: Addr,
        cost: Cost,
    },
    Down {
        link: LinkId,
    },
}

/// 一次 tick 中节点可以访问的网络状态
pub struct NodeCtx<'a> {
    pub now: SimTime,
    pub links: &'a mut LinkTable,
    pub routes: &'a mut RouteTracker,
    pub stats: &'a mut Stats,
}

/// 节点接口
pub trait Node: Send {
    fn id(&self) -> NodeId;

    fn addr(&self) -> &Addr;

    /// 链路变化先入队，在节点自己的 tick 里逐个处理
    fn queue_link_change(&mut self, change: LinkEvent);

    fn on_tick(&mut self, ctx: &mut NodeCtx<'_>);

    /// 路由器的协议种类；客户端为 None
    fn protocol(&self) -> Option<ProtocolKind> {
        None
    }

    /// 路由快照；客户端没有路由表
    fn routes(&self) -> Option<Vec<RouteEntry>> {
        None
    }

    fn debug_string(&self) -> String;

    /// 收尾阶段：客户端在下一个 tick 立即再发一轮
    fn request_final_send(&mut self) {}
}
