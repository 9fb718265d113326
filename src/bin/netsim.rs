//! 路由协议仿真
//!
//! 读取 JSON 网络描述，用距离向量 / 链路状态 / mirror 路由器运行到结束时间，
//! 打印客户端 traceroute 得到的路径。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use routesim_rs::proto::ProtocolKind;
use routesim_rs::scenario::Scenario;
use routesim_rs::sim::SimTime;
use routesim_rs::topo::{BuildOpts, NetworkSpec};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "netsim", about = "路由协议仿真：距离向量 (dv) / 链路状态 (ls)")]
struct Args {
    /// 网络描述文件（JSON）
    network: PathBuf,
    /// 路由协议：dv、ls 或 mirror（大小写不敏感）
    #[arg(default_value = "mirror")]
    protocol: ProtocolKind,
    /// 路由器轮询周期（毫秒）
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// 心跳间隔（毫秒），默认 10 × latencyMultiplier
    #[arg(long)]
    heartbeat_ms: Option<u64>,
    /// 覆盖描述中的结束时间（毫秒）
    #[arg(long)]
    until_ms: Option<u64>,
    /// 结束后打印每个路由器的路由表
    #[arg(long)]
    dump_tables: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let spec = match NetworkSpec::load(&args.network) {
        Ok(spec) => spec,
        Err(e) => {
            error!(error = %e, "无法加载网络描述");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let opts = BuildOpts {
        protocol: args.protocol,
        tick: SimTime::from_millis(args.tick_ms.max(1)),
        heartbeat_ms: args.heartbeat_ms,
    };
    let until = args.until_ms.map(SimTime::from_millis);

    let mut scenario = match Scenario::build(&spec, &opts, until) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "无法构建网络");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(protocol = %args.protocol, network = %args.network.display(), "开始仿真");
    let report = scenario.run();

    println!();
    print!("{}", report.routes);
    if args.dump_tables {
        println!();
        print!("{}", scenario.world.net.dump_tables());
    }
    println!(
        "done @ {}ms, protocol={}, converged={}, control_pkts={}, traces_delivered={}, dropped_pkts={}",
        report.finished_at.as_millis(),
        args.protocol,
        report.converged,
        report.stats.control_pkts,
        report.stats.traces_delivered,
        report.stats.dropped_pkts
    );

    ExitCode::SUCCESS
}
