//! 运行时拓扑图
//!
//! 交换机之间的无向带权图：`dpid -> [(neighbor, weight, port)]`。
//! 每次链路通告都整体重建，不做增量 diff。

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::id::{Dpid, PortNo};
use super::link::LinkObservation;

/// 邻接项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    pub neighbor: Dpid,
    pub weight: u32,
    /// 本端朝向 `neighbor` 的出端口
    pub port: PortNo,
}

/// 交换机拓扑图（不可变快照）
#[derive(Debug, Default, Clone)]
pub struct TopologyGraph {
    adj: HashMap<Dpid, Vec<Adjacency>>,
}

impl TopologyGraph {
    /// 由一组链路观测构建新图。每条链路双向插入，权重为 1。
    pub fn from_links<'a>(links: impl IntoIterator<Item = &'a LinkObservation>) -> Self {
        let mut graph = Self::default();
        for link in links {
            graph.insert(link.src, link.dst, link.src_port);
            graph.insert(link.dst, link.src, link.dst_port);
        }
        graph
    }

    // 链路会在两个方向上各被发现一次，重复项只保留第一条
    fn insert(&mut self, from: Dpid, to: Dpid, port: PortNo) {
        let entries = self.adj.entry(from).or_default();
        if entries.iter().any(|a| a.neighbor == to && a.port == port) {
            return;
        }
        entries.push(Adjacency {
            neighbor: to,
            weight: 1,
            port,
        });
    }

    /// `node` 的有序邻接表；未知节点返回空切片
    pub fn neighbors(&self, node: Dpid) -> &[Adjacency] {
        self.adj.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `src` 上朝向直接邻居 `dst` 的端口
    pub fn output_port(&self, src: Dpid, dst: Dpid) -> Option<PortNo> {
        self.neighbors(src)
            .iter()
            .find(|a| a.neighbor == dst)
            .map(|a| a.port)
    }

    pub fn contains(&self, node: Dpid) -> bool {
        self.adj.contains_key(&node)
    }

    /// 图中出现过的交换机（按 dpid 排序）
    pub fn switches(&self) -> Vec<Dpid> {
        let mut out: Vec<Dpid> = self.adj.keys().copied().collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// 无向链路条数
    pub fn link_count(&self) -> usize {
        self.adj.values().map(Vec::len).sum::<usize>() / 2
    }
}

/// 进程级共享拓扑：单写者整体替换，读者拿到的总是完整的旧图或新图。
#[derive(Debug, Default)]
pub struct SharedTopology {
    current: RwLock<Arc<TopologyGraph>>,
}

impl SharedTopology {
    /// 用新的链路集合整体替换拓扑
    #[tracing::instrument(skip(self, links), fields(links = links.len()))]
    pub fn rebuild(&self, links: &[LinkObservation]) -> Arc<TopologyGraph> {
        // 锁外构建，写锁只覆盖一次指针替换
        let graph = Arc::new(TopologyGraph::from_links(links));
        debug!(switches = graph.len(), "新拓扑已构建");

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::clone(&graph);
        info!(
            switches = graph.len(),
            links = graph.link_count(),
            "🗺️  拓扑已替换"
        );
        graph
    }

    /// 当前拓扑快照
    pub fn snapshot(&self) -> Arc<TopologyGraph> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }
}
