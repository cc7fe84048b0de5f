use super::{Fabric, arp_request, floods, mac_of};
use crate::ctl::{Attachment, Fallback, PacketIn, Reaction};
use crate::net::{Dpid, NodeRole, PortNo, ipv4_frame};
use std::collections::HashMap;
use std::net::Ipv4Addr;

fn ipv4_packet_in(f: &Fabric, pod: usize, edge: usize, n: usize, dst: Ipv4Addr) -> PacketIn {
    let src = f.host(pod, edge, n);
    let data = ipv4_frame(mac_of(src.address), mac_of(dst), src.address, dst, b"probe")
        .expect("build ipv4");
    PacketIn::new(src.dpid, src.port, data)
}

#[test]
fn same_pod_unknown_destination_goes_through_a_known_edge_of_that_pod() {
    let f = Fabric::new(4);
    // pod 0 的另一台 edge 上有一个已知主机
    f.learn(&f.host(0, 1, 2));

    let pkt = ipv4_packet_in(&f, 0, 0, 2, Ipv4Addr::new(10, 0, 1, 3));
    let (reaction, out) = f.ctl.on_packet_in(&pkt);

    assert_eq!(
        reaction,
        Reaction::Fallback(Fallback::IntraPod { via: Dpid(101) })
    );
    // e0_0 -> a0_x -> e0_1，最后在 e0_1 泛洪
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|o| o.command.is_packet_out()));
    assert!(out.iter().all(|o| o.dpid.role() != Some(NodeRole::Core)));
    let flood = floods(&out);
    assert_eq!(flood.len(), 1);
    assert_eq!(flood[0].dpid, Dpid(101));
    assert_eq!(out[0].dpid, Dpid(100));
}

#[test]
fn same_pod_fallback_ignores_edges_of_other_pods_and_the_source_switch() {
    let f = Fabric::new(4);
    f.learn(&f.host(1, 0, 2));
    f.learn(&f.host(2, 1, 3));

    // 源主机自身会被学到 e0_0，但到自身的路径没有下一跳
    let pkt = ipv4_packet_in(&f, 0, 0, 2, Ipv4Addr::new(10, 0, 1, 3));
    let (reaction, out) = f.ctl.on_packet_in(&pkt);

    assert_eq!(reaction, Reaction::Fallback(Fallback::IntraPodUnreachable));
    assert!(out.is_empty());
}

#[test]
fn cross_pod_unknown_destination_floods_every_core_edge_pair() {
    let f = Fabric::new(4);
    let pkt = ipv4_packet_in(&f, 0, 0, 2, Ipv4Addr::new(10, 1, 0, 2));
    let (reaction, out) = f.ctl.on_packet_in(&pkt);

    assert_eq!(
        reaction,
        Reaction::Fallback(Fallback::CoreThenEdge { cores: 4, edges: 8 })
    );
    assert!(out.iter().all(|o| o.command.is_packet_out()));

    // 每个 (core, edge) 组合在 edge 上恰好泛洪一次
    let flood = floods(&out);
    assert_eq!(flood.len(), 4 * 8);
    let mut per_edge: HashMap<Dpid, usize> = HashMap::new();
    for ob in &flood {
        assert_eq!(ob.dpid.role(), Some(NodeRole::Edge));
        *per_edge.entry(ob.dpid).or_default() += 1;
    }
    assert_eq!(per_edge.len(), 8);
    assert!(per_edge.values().all(|&n| n == 4));

    // 上行：每台 core 从源 edge 出发两跳（edge、agg），下行：每对 (core, edge) 两跳加末跳
    assert_eq!(out.len(), 4 * 2 + 4 * 8 * 3);
    let from_src = out.iter().filter(|o| o.dpid == Dpid(100)).count();
    // 4 次上行第一跳 + 4 次泛洪
    assert_eq!(from_src, 8);
}

#[test]
fn arp_request_for_unknown_target_in_other_pod_escalates_to_core() {
    let f = Fabric::new(4);
    let requester = f.host(3, 1, 2);
    let pkt = PacketIn::new(
        requester.dpid,
        requester.port,
        arp_request(&requester, Ipv4Addr::new(10, 0, 0, 2)),
    );
    let (reaction, out) = f.ctl.on_packet_in(&pkt);

    assert_eq!(
        reaction,
        Reaction::Fallback(Fallback::CoreThenEdge { cores: 4, edges: 8 })
    );
    assert_eq!(floods(&out).len(), 32);
    assert_eq!(
        f.ctl.state().hosts.lookup(requester.address),
        Some(Attachment::new(requester.dpid, requester.port))
    );
}

#[test]
fn unresolvable_pod_escalates_like_cross_pod() {
    let f = Fabric::new(4);
    let pkt = ipv4_packet_in(&f, 0, 0, 2, Ipv4Addr::new(192, 168, 1, 1));
    let (reaction, out) = f.ctl.on_packet_in(&pkt);
    assert!(matches!(
        reaction,
        Reaction::Fallback(Fallback::CoreThenEdge { .. })
    ));
    assert_eq!(floods(&out).len(), 32);
}

#[test]
fn core_then_edge_uses_only_switches_that_joined() {
    let f = Fabric::new(2);
    // k=2：1 台 core，2 台 edge
    let pkt = ipv4_packet_in(&f, 0, 0, 2, Ipv4Addr::new(10, 1, 0, 2));
    let (reaction, out) = f.ctl.on_packet_in(&pkt);
    assert_eq!(
        reaction,
        Reaction::Fallback(Fallback::CoreThenEdge { cores: 1, edges: 2 })
    );
    let flood = floods(&out);
    assert_eq!(flood.len(), 2);
    assert!(flood.iter().all(|o| o.command.out_port() == PortNo::FLOOD));
}
