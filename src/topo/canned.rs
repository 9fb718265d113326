//! 常用小拓扑
//!
//! 只生成 `NetworkSpec`，真正的构建仍走 `NetworkSpec::build_network`。

use super::spec::{LinkSpec, NetworkSpec};
use crate::net::Addr;
use crate::proto::Cost;

/// 第 i 个路由器的名字：A, B, ..., Z, R26, R27, ...
pub fn router_name(i: usize) -> Addr {
    if i < 26 {
        Addr(((b'A' + i as u8) as char).to_string())
    } else {
        Addr(format!("R{i}"))
    }
}

fn routers_only(n: usize, links: Vec<LinkSpec>) -> NetworkSpec {
    NetworkSpec {
        end_time: 100,
        client_send_rate: 10,
        routers: (0..n).map(router_name).collect(),
        clients: Vec::new(),
        links,
        changes: Vec::new(),
        correct_routes: Vec::new(),
        latency_multiplier: None,
    }
}

/// 直线拓扑：A - B - C - ...，每段代价 `cost`
pub fn line(n: usize, cost: Cost) -> NetworkSpec {
    let links = (1..n)
        .map(|i| LinkSpec(router_name(i - 1), router_name(i), cost))
        .collect();
    routers_only(n, links)
}

/// 三角拓扑：A-B=ab, B-C=bc, A-C=ac
pub fn triangle(ab: Cost, bc: Cost, ac: Cost) -> NetworkSpec {
    routers_only(
        3,
        vec![
            LinkSpec(router_name(0), router_name(1), ab),
            LinkSpec(router_name(1), router_name(2), bc),
            LinkSpec(router_name(0), router_name(2), ac),
        ],
    )
}

/// 环形拓扑：A - B - ... - A，每段代价 `cost`
pub fn ring(n: usize, cost: Cost) -> NetworkSpec {
    let links = (0..n)
        .map(|i| LinkSpec(router_name(i), router_name((i + 1) % n), cost))
        .collect();
    routers_only(n, links)
}

/// 给每个路由器挂一个同名小写的客户端（代价 1），例如 A 上挂 a。
pub fn with_clients(mut spec: NetworkSpec) -> NetworkSpec {
    for router in spec.routers.clone() {
        let client = Addr(router.0.to_lowercase());
        spec.links.push(LinkSpec(client.clone(), router, 1));
        spec.clients.push(client);
    }
    spec
}
