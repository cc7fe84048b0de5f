use crate::net::{Dpid, LinkObservation, PortNo, TopologyGraph, first_hop_port, shortest_path};
use crate::topo::fat_tree::build_fat_tree;
use std::collections::{HashMap, VecDeque};

fn fat_tree_graph(k: usize) -> TopologyGraph {
    let topo = build_fat_tree(k).expect("build fat-tree");
    TopologyGraph::from_links(&topo.switch_links())
}

fn bfs_hops(g: &TopologyGraph, src: Dpid) -> HashMap<Dpid, usize> {
    let mut dist = HashMap::from([(src, 0)]);
    let mut q = VecDeque::from([src]);
    while let Some(v) = q.pop_front() {
        let dv = dist[&v];
        for adj in g.neighbors(v) {
            if !dist.contains_key(&adj.neighbor) {
                dist.insert(adj.neighbor, dv + 1);
                q.push_back(adj.neighbor);
            }
        }
    }
    dist
}

#[test]
fn shortest_path_matches_bfs_hop_distance_on_fat_tree() {
    let g = fat_tree_graph(4);
    let switches = g.switches();

    for &src in &switches {
        let hops = bfs_hops(&g, src);
        for &dst in &switches {
            let path = shortest_path(&g, src, dst);
            assert_eq!(path.first().copied(), Some(src));
            assert_eq!(path.last().copied(), Some(dst));
            assert_eq!(path.len() - 1, hops[&dst], "{src} -> {dst}: {path:?}");
            for w in path.windows(2) {
                assert!(
                    g.output_port(w[0], w[1]).is_some(),
                    "non-adjacent hop in {path:?}"
                );
            }
        }
    }
}

#[test]
fn shortest_path_lengths_follow_fat_tree_structure() {
    let g = fat_tree_graph(4);
    // 同 pod 的两台 edge：edge-agg-edge
    assert_eq!(shortest_path(&g, Dpid(100), Dpid(101)).len(), 3);
    // 跨 pod：edge-agg-core-agg-edge
    let p = shortest_path(&g, Dpid(100), Dpid(130));
    assert_eq!(p.len(), 5);
    assert_eq!(p[2].role(), Some(crate::net::NodeRole::Core));
}

#[test]
fn shortest_path_to_self_is_a_single_node() {
    let g = fat_tree_graph(4);
    assert_eq!(shortest_path(&g, Dpid(100), Dpid(100)), vec![Dpid(100)]);
    assert_eq!(first_hop_port(&g, &[Dpid(100)]), None);
}

#[test]
fn shortest_path_is_empty_when_unreachable_or_unknown() {
    let g = TopologyGraph::from_links(&[
        LinkObservation::new(Dpid(100), PortNo(1), Dpid(200), PortNo(1)),
        LinkObservation::new(Dpid(110), PortNo(1), Dpid(210), PortNo(1)),
    ]);
    assert!(shortest_path(&g, Dpid(100), Dpid(110)).is_empty());
    assert!(shortest_path(&g, Dpid(999), Dpid(100)).is_empty());
    assert!(shortest_path(&g, Dpid(100), Dpid(999)).is_empty());
    assert!(shortest_path(&TopologyGraph::default(), Dpid(1), Dpid(2)).is_empty());
    assert_eq!(first_hop_port(&g, &[]), None);
}

#[test]
fn first_hop_port_reads_the_source_side_port() {
    let g = fat_tree_graph(4);
    let path = shortest_path(&g, Dpid(100), Dpid(101));
    let port = first_hop_port(&g, &path).expect("first hop");
    assert!(port == PortNo(3) || port == PortNo(4), "uplink port, got {port}");
}
