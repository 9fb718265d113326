use std::collections::BTreeMap;

use super::Sent;
use crate::net::{Addr, Packet, Port};
use crate::proto::dv::{DistanceVector, DvAdvert, DvEntry};
use crate::proto::{INFINITY, RoutingProtocol};

fn a(s: &str) -> Addr {
    Addr::from(s)
}

/// 构造邻居发来的距离向量：(目的地, 代价, 下一跳)
fn advert(from: &str, to: &str, routes: &[(&str, u32, Option<&str>)]) -> Packet {
    let routes = routes
        .iter()
        .map(|&(dest, cost, nh)| {
            let entry = DvEntry {
                cost,
                next_hop: nh.map(a),
                out_port: nh.map(|_| Port(9)),
            };
            (a(dest), entry)
        })
        .collect();
    let content = serde_json::to_vec(&DvAdvert { routes }).expect("encode advert");
    Packet::routing(a(from), a(to), content)
}

fn decode(pkt: &Packet) -> DvAdvert {
    serde_json::from_slice(&pkt.content).expect("decode advert")
}

fn assert_clamped(dv: &DistanceVector) {
    for (dest, e) in dv.table() {
        assert!(e.cost <= INFINITY, "{dest}: cost {} above infinity", e.cost);
        let unreachable = e.cost == INFINITY;
        assert_eq!(unreachable, e.next_hop.is_none(), "{dest}: {e:?}");
        assert_eq!(unreachable, e.out_port.is_none(), "{dest}: {e:?}");
    }
}

/// A 通过 p1 连 B（代价 1）、p2 连 C（代价 5）
fn a_with_b_and_c() -> (DistanceVector, Sent) {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_link_up(Port(2), &a("C"), 5, &mut io);
    io.clear();
    (dv, io)
}

#[test]
fn link_up_installs_direct_route_and_advertises() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 3, &mut io);

    assert_eq!(dv.entry(&a("B")), Some(&DvEntry::via(3, a("B"), Port(1))));
    assert_eq!(dv.neighbor_cost(&a("B")), Some(3));

    assert_eq!(io.ports(), vec![Port(1)]);
    let (_, pkt) = &io.0[0];
    assert!(pkt.is_routing());
    assert_eq!(pkt.src, a("A"));
    assert_eq!(pkt.dst, a("B"));

    let adv = decode(pkt);
    assert_eq!(adv.routes[&a("A")].cost, 0);
    // 经 B 的路由对 B 毒性逆转
    assert_eq!(adv.routes[&a("B")], DvEntry::unreachable());
}

#[test]
fn link_up_keeps_existing_route_unless_strictly_cheaper() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_packet(Port(1), advert("B", "A", &[("B", 0, None), ("C", 1, Some("C"))]), &mut io);
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(2, a("B"), Port(1))));

    dv.on_link_up(Port(2), &a("C"), 2, &mut io);
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(2, a("B"), Port(1))));
    assert_eq!(dv.neighbor_cost(&a("C")), Some(2));

    // 新链路只对 C 自己生效，其余邻居记录仍用各自端口
    dv.on_link_up(Port(3), &a("D"), 1, &mut io);
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::via(1, a("D"), Port(3))));
}

#[test]
fn advert_relaxes_through_neighbor_and_clamps() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 10, &mut io);
    io.clear();

    dv.on_packet(
        Port(1),
        advert("B", "A", &[("B", 0, None), ("C", 3, Some("C")), ("D", 7, Some("E"))]),
        &mut io,
    );

    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(13, a("B"), Port(1))));
    // 10 + 7 越过 INFINITY
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::unreachable()));
    assert_clamped(&dv);
    // 收到通告不触发广播
    assert!(io.is_empty());
}

#[test]
fn advert_from_unattached_sender_is_ignored() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_packet(Port(4), advert("X", "A", &[("X", 0, None), ("Y", 1, Some("Y"))]), &mut io);
    assert!(dv.table().is_empty());
    assert!(io.is_empty());
}

#[test]
fn own_address_in_advert_is_skipped() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_packet(Port(1), advert("B", "A", &[("A", 1, Some("A")), ("B", 0, None)]), &mut io);
    assert!(dv.entry(&a("A")).is_none());
}

#[test]
fn cheaper_path_replaces_direct_link() {
    let (mut dv, mut io) = a_with_b_and_c();
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(5, a("C"), Port(2))));

    dv.on_packet(Port(1), advert("B", "A", &[("B", 0, None), ("C", 1, Some("C"))]), &mut io);
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(2, a("B"), Port(1))));

    // 同代价的另一条路不替换
    dv.on_packet(Port(2), advert("C", "A", &[("C", 0, None), ("B", 0, Some("B"))]), &mut io);
    assert_eq!(dv.entry(&a("B")), Some(&DvEntry::via(1, a("B"), Port(1))));
}

#[test]
fn next_hop_poison_then_relearn_direct() {
    let (mut dv, mut io) = a_with_b_and_c();
    dv.on_packet(Port(1), advert("B", "A", &[("B", 0, None), ("C", 1, Some("C"))]), &mut io);

    dv.on_packet(Port(1), advert("B", "A", &[("B", 0, None), ("C", INFINITY, None)]), &mut io);
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::unreachable()));

    dv.on_packet(Port(2), advert("C", "A", &[("C", 0, None)]), &mut io);
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(5, a("C"), Port(2))));
    assert_clamped(&dv);
}

#[test]
fn poison_from_other_neighbor_leaves_route_alone() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_link_up(Port(2), &a("C"), 1, &mut io);
    dv.on_packet(Port(1), advert("B", "A", &[("D", 1, Some("D"))]), &mut io);
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::via(2, a("B"), Port(1))));

    dv.on_packet(Port(2), advert("C", "A", &[("D", INFINITY, None)]), &mut io);
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::via(2, a("B"), Port(1))));
}

#[test]
fn unreachable_claim_through_sender_poisons_entry() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_link_up(Port(2), &a("C"), 1, &mut io);
    dv.on_packet(Port(1), advert("B", "A", &[("D", 1, Some("D"))]), &mut io);

    // C 声称经由自己去 D 已断
    dv.on_packet(Port(2), advert("C", "A", &[("D", INFINITY, Some("C"))]), &mut io);
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::unreachable()));
}

#[test]
fn follows_next_hop_cost_increase() {
    let (mut dv, mut io) = a_with_b_and_c();
    dv.on_packet(Port(1), advert("B", "A", &[("C", 1, Some("C")), ("D", 2, Some("C"))]), &mut io);
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::via(3, a("B"), Port(1))));

    dv.on_packet(Port(1), advert("B", "A", &[("C", 1, Some("C")), ("D", 6, Some("C"))]), &mut io);
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::via(7, a("B"), Port(1))));
}

#[test]
fn link_down_poisons_routes_on_port_and_advertises() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_link_up(Port(2), &a("C"), 1, &mut io);
    dv.on_packet(Port(1), advert("B", "A", &[("D", 1, Some("D"))]), &mut io);
    io.clear();

    dv.on_link_down(Port(1), &mut io);

    assert_eq!(dv.entry(&a("B")), Some(&DvEntry::unreachable()));
    assert_eq!(dv.entry(&a("D")), Some(&DvEntry::unreachable()));
    assert_eq!(dv.entry(&a("C")), Some(&DvEntry::via(1, a("C"), Port(2))));
    assert_eq!(dv.neighbor_cost(&a("B")), None);
    assert_clamped(&dv);

    // 只剩 C 一个邻居
    assert_eq!(io.ports(), vec![Port(2)]);
    let adv = decode(&io.0[0].1);
    assert_eq!(adv.routes[&a("B")].cost, INFINITY);
    assert_eq!(adv.routes[&a("D")].cost, INFINITY);
    assert_eq!(adv.routes[&a("C")].cost, INFINITY);
}

#[test]
fn heartbeat_broadcasts_once_per_interval() {
    let mut dv = DistanceVector::new(a("A"), 1_000);
    let mut io = Sent::default();
    dv.on_link_up(Port(1), &a("B"), 1, &mut io);
    dv.on_link_up(Port(2), &a("C"), 1, &mut io);
    io.clear();

    dv.on_tick(500, &mut io);
    assert!(io.is_empty());

    dv.on_tick(1_000, &mut io);
    assert_eq!(io.ports(), vec![Port(1), Port(2)]);
    io.clear();

    dv.on_tick(1_500, &mut io);
    assert!(io.is_empty());

    dv.on_tick(2_000, &mut io);
    assert_eq!(io.0.len(), 2);
}

#[test]
fn traceroute_follows_table_or_is_dropped() {
    let (mut dv, mut io) = a_with_b_and_c();
    dv.on_packet(Port(1), advert("B", "A", &[("C", 1, Some("C")), ("D", INFINITY, None)]), &mut io);
    io.clear();

    let to_c = Packet::traceroute(a("x"), a("C"));
    dv.on_packet(Port(2), to_c, &mut io);
    assert_eq!(io.ports(), vec![Port(1)]);
    assert_eq!(io.0[0].1.route, vec![a("x")]);
    io.clear();

    dv.on_packet(Port(1), Packet::traceroute(a("x"), a("D")), &mut io);
    dv.on_packet(Port(1), Packet::traceroute(a("x"), a("Z")), &mut io);
    assert!(io.is_empty());
}

#[test]
fn undecodable_routing_packet_is_ignored() {
    let (mut dv, mut io) = a_with_b_and_c();
    let before: BTreeMap<Addr, DvEntry> = dv.table().clone();
    dv.on_packet(Port(1), Packet::routing(a("B"), a("A"), b"not json".to_vec()), &mut io);
    assert_eq!(dv.table(), &before);
    assert!(io.is_empty());
}
