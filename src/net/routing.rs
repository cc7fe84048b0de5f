//! 最短路径
//!
//! 在 [`TopologyGraph`] 上做 Dijkstra。fat-tree 中所有边权重为 1，
//! 因此最短路径即最少跳数路径；多条等价路径中返回哪一条不作保证。

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::trace;

use super::graph::TopologyGraph;
use super::id::{Dpid, PortNo};

/// 交换机序列（含两端）；空序列表示不可达
pub type Path = Vec<Dpid>;

#[derive(Debug, PartialEq, Eq)]
struct Frontier {
    cost: u64,
    node: Dpid,
}

// BinaryHeap 是 max-heap；我们需要最小代价优先，因此反向比较。
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 计算 `source` 到 `destination` 的最小权重路径。
///
/// - `source == destination` 返回单元素路径；
/// - `source` 不在图中或 `destination` 不可达时返回空路径。
pub fn shortest_path(graph: &TopologyGraph, source: Dpid, destination: Dpid) -> Path {
    if source == destination {
        return vec![source];
    }
    if !graph.contains(source) {
        return Path::new();
    }

    let mut dist: HashMap<Dpid, u64> = HashMap::from([(source, 0)]);
    let mut prev: HashMap<Dpid, Dpid> = HashMap::new();
    let mut visited: HashSet<Dpid> = HashSet::new();
    let mut heap = BinaryHeap::from([Frontier {
        cost: 0,
        node: source,
    }]);

    while let Some(Frontier { cost, node }) = heap.pop() {
        if !visited.insert(node) {
            continue;
        }
        if node == destination {
            trace!(%source, %destination, cost, expanded = visited.len(), "找到最短路径");
            return unwind(&prev, source, destination);
        }
        for adj in graph.neighbors(node) {
            if visited.contains(&adj.neighbor) {
                continue;
            }
            let next = cost.saturating_add(u64::from(adj.weight));
            if dist.get(&adj.neighbor).is_none_or(|&d| next < d) {
                dist.insert(adj.neighbor, next);
                prev.insert(adj.neighbor, node);
                heap.push(Frontier {
                    cost: next,
                    node: adj.neighbor,
                });
            }
        }
    }

    trace!(%source, %destination, "不可达");
    Path::new()
}

fn unwind(prev: &HashMap<Dpid, Dpid>, source: Dpid, destination: Dpid) -> Path {
    let mut path = vec![destination];
    let mut cur = destination;
    while cur != source {
        match prev.get(&cur) {
            Some(&p) => {
                path.push(p);
                cur = p;
            }
            None => return Path::new(),
        }
    }
    path.reverse();
    path
}

/// 路径第一跳的出端口；路径少于两个节点时没有下一跳
pub fn first_hop_port(graph: &TopologyGraph, path: &[Dpid]) -> Option<PortNo> {
    match path {
        [src, next, ..] => graph.output_port(*src, *next),
        _ => None,
    }
}
