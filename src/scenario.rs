//! 场景运行
//!
//! 把网络描述装配成 `Simulator` + `NetWorld`：每个节点一个周期性
//! `NodeTick`，每条链路变化一个 `ApplyLinkChange`。运行到结束时间后
//! 触发 `FinalRoutes`，再运行 4 个客户端发送周期收集最后一轮路径。

use tracing::info;

use crate::error::TopologyError;
use crate::net::{ApplyLinkChange, FinalRoutes, NetWorld, NodeTick, Stats};
use crate::sim::{SimTime, Simulator};
use crate::topo::{BuildOpts, NetworkSpec};

pub struct Scenario {
    pub sim: Simulator,
    pub world: NetWorld,
    /// 收集最终路径的时刻
    pub end: SimTime,
    /// 收尾阶段的时长
    pub drain: SimTime,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct Report {
    pub routes: String,
    pub all_correct: bool,
    pub converged: bool,
    pub convergence_errors: Vec<String>,
    pub stats: Stats,
    pub finished_at: SimTime,
}

impl Scenario {
    /// `until` 覆盖描述中的结束时间
    pub fn build(
        spec: &NetworkSpec,
        opts: &BuildOpts,
        until: Option<SimTime>,
    ) -> Result<Self, TopologyError> {
        let net = spec.build_network(opts)?;
        let mut sim = Simulator::default();

        for node in net.node_ids() {
            sim.schedule(SimTime::ZERO, NodeTick { node });
        }
        for (at, change) in spec.link_changes()? {
            sim.schedule(at, ApplyLinkChange { change });
        }

        let send_rate = spec.client_send_rate();
        Ok(Self {
            sim,
            world: NetWorld::new(net),
            end: until.unwrap_or_else(|| spec.end_time()),
            drain: SimTime(send_rate.0.saturating_mul(4)),
        })
    }

    pub fn run_until(&mut self, until: SimTime) {
        self.sim.run_until(until, &mut self.world);
    }

    /// 运行到结束时间，收集最终路径并生成报告
    pub fn run(&mut self) -> Report {
        info!(end = ?self.end, "▶️  运行场景");
        self.run_until(self.end);
        self.sim.schedule(self.end, FinalRoutes);
        self.run_until(self.end.saturating_add(self.drain));
        self.report()
    }

    pub fn report(&self) -> Report {
        let net = &self.world.net;
        let convergence_errors = net.convergence_errors();
        Report {
            routes: net.routes.report(true),
            all_correct: net.routes.all_correct(),
            converged: convergence_errors.is_empty(),
            convergence_errors,
            stats: net.stats.clone(),
            finished_at: self.sim.now(),
        }
    }
}
