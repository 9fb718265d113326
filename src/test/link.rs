use crate::net::{Addr, LinkId, LinkTable, Packet};
use crate::sim::SimTime;

fn ms(v: u64) -> SimTime {
    SimTime::from_millis(v)
}

fn table_with_ab() -> (LinkTable, LinkId) {
    let mut links = LinkTable::default();
    let id = links.insert(Addr::from("A"), Addr::from("B"), 1, ms(100));
    (links, id)
}

#[test]
fn link_delivers_after_latency_one_per_poll_in_order() {
    let (mut links, id) = table_with_ab();
    let (a, b) = (Addr::from("A"), Addr::from("B"));

    for n in 0..2u8 {
        let pkt = Packet::routing(a.clone(), b.clone(), vec![n]);
        assert!(links.send(id, &a, pkt, SimTime::ZERO));
    }
    assert_eq!(links.get(id).map(|l| l.in_flight()), Some(2));

    assert!(links.recv(id, &b, ms(50)).is_none());
    // 发送方自己收不到
    assert!(links.recv(id, &a, ms(100)).is_none());

    let first = links.recv(id, &b, ms(100)).expect("first packet");
    let second = links.recv(id, &b, ms(100)).expect("second packet");
    assert_eq!(first.content, vec![0]);
    assert_eq!(second.content, vec![1]);
    assert!(links.recv(id, &b, ms(100)).is_none());
}

#[test]
fn traceroute_records_far_end_on_send() {
    let (mut links, id) = table_with_ab();
    let (a, b) = (Addr::from("A"), Addr::from("B"));

    let pkt = Packet::traceroute(Addr::from("x"), Addr::from("y"));
    links.send(id, &b, pkt, SimTime::ZERO);
    let got = links.recv(id, &a, ms(100)).expect("traceroute arrives");
    assert_eq!(got.route, vec![Addr::from("x"), a]);
}

#[test]
fn removed_link_drops_in_flight_and_ids_are_not_reused() {
    let (mut links, id) = table_with_ab();
    let (a, b) = (Addr::from("A"), Addr::from("B"));
    links.send(id, &a, Packet::routing(a.clone(), b.clone(), Vec::new()), SimTime::ZERO);

    let removed = links.remove(id).expect("link existed");
    assert_eq!(removed.in_flight(), 1);
    assert!(links.get(id).is_none());
    assert!(links.recv(id, &b, ms(1_000)).is_none());
    assert!(!links.send(id, &a, Packet::routing(a.clone(), b.clone(), Vec::new()), ms(1_000)));
    assert_eq!(links.live().count(), 0);

    let again = links.insert(a.clone(), b.clone(), 2, ms(200));
    assert_ne!(again, id);
    assert_eq!(links.live().count(), 1);
}

#[test]
fn other_end_and_non_endpoint_sender() {
    let (mut links, id) = table_with_ab();
    let link = links.get(id).expect("link");
    assert_eq!(link.other_end(&Addr::from("A")), Some(&Addr::from("B")));
    assert_eq!(link.other_end(&Addr::from("B")), Some(&Addr::from("A")));
    assert_eq!(link.other_end(&Addr::from("C")), None);

    let c = Addr::from("C");
    links.send(id, &c, Packet::traceroute(c.clone(), Addr::from("A")), SimTime::ZERO);
    assert_eq!(links.get(id).map(|l| l.in_flight()), Some(0));
}
