//! Fat-tree 拓扑构建
//!
//! 生成给定端口数 `k` 的标准 fat-tree：`(k/2)²` 台 core，`k` 个 pod，
//! 每个 pod 有 `k/2` 台 aggregation 与 `k/2` 台 edge，每台 edge 下挂 `k/2` 台主机。
//!
//! 图以 arena 形式保存：节点与链路都用下标引用，链路只存两端下标，
//! 邻接表由下标查找得到。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use thiserror::Error;
use tracing::{debug, info};

use super::name::{FIRST_HOST_INDEX, NodeName};
use crate::net::{Dpid, LinkId, LinkObservation, NodeId, NodeRole, PortNo};

/// dpid 编码里 pod 只占一位十进制数
pub const MAX_PORTS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FatTreeError {
    #[error("fat-tree port count must be even and >= 2, got {0}")]
    InvalidPortCount(usize),
    #[error("fat-tree port count {0} exceeds the supported maximum of {MAX_PORTS}")]
    UnsupportedPortCount(usize),
    #[error("node {node} has degree {actual}, expected {expected}")]
    DegreeMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },
}

/// 拓扑节点
#[derive(Debug, Clone)]
pub struct FatTreeNode {
    pub name: NodeName,
    /// 按创建顺序排列的相邻链路；下标 + 1 即该节点上的端口号
    pub links: Vec<LinkId>,
}

/// 无向链路：两端节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatTreeLink {
    pub a: NodeId,
    pub b: NodeId,
}

impl FatTreeLink {
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.a == node { self.b } else { self.a }
    }
}

/// 主机接入点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostAttachment {
    pub name: NodeName,
    pub address: Ipv4Addr,
    pub dpid: Dpid,
    pub port: PortNo,
}

#[derive(Debug, Clone)]
pub struct FatTreeTopology {
    pub k: usize,
    nodes: Vec<FatTreeNode>,
    links: Vec<Option<FatTreeLink>>,
    index: HashMap<NodeName, NodeId>,
    pub hosts: Vec<NodeId>,
    pub edge_switches: Vec<NodeId>,
    pub agg_switches: Vec<NodeId>,
    pub core_switches: Vec<NodeId>,
}

impl FatTreeTopology {
    fn empty(k: usize) -> Self {
        Self {
            k,
            nodes: Vec::new(),
            links: Vec::new(),
            index: HashMap::new(),
            hosts: Vec::new(),
            edge_switches: Vec::new(),
            agg_switches: Vec::new(),
            core_switches: Vec::new(),
        }
    }

    fn half(&self) -> usize {
        self.k / 2
    }

    fn add_node(&mut self, name: NodeName) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(FatTreeNode {
            name,
            links: Vec::new(),
        });
        self.index.insert(name, id);
        id
    }

    /// 连接两个节点（无向链路，同时挂到两端的邻接表上）
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(Some(FatTreeLink { a, b }));
        self.nodes[a.0].links.push(id);
        self.nodes[b.0].links.push(id);
        id
    }

    /// 删除链路，并从两端的邻接表中摘除
    pub fn remove_link(&mut self, id: LinkId) -> Option<FatTreeLink> {
        let link = self.links.get_mut(id.0)?.take()?;
        self.nodes[link.a.0].links.retain(|l| *l != id);
        self.nodes[link.b.0].links.retain(|l| *l != id);
        Some(link)
    }

    pub fn node(&self, id: NodeId) -> &FatTreeNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &FatTreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn link(&self, id: LinkId) -> Option<FatTreeLink> {
        self.links.get(id.0).copied().flatten()
    }

    pub fn find(&self, name: &NodeName) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// 按邻接表顺序列出相邻节点
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .links
            .iter()
            .filter_map(move |l| self.link(*l).map(|link| link.other(id)))
    }

    pub fn is_neighbor(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).any(|n| n == b)
    }

    /// 相连链路数；重复连接同一邻居的平行链路各算一次
    pub fn degree(&self, id: NodeId) -> usize {
        self.nodes[id.0].links.len()
    }

    pub fn expected_degree(&self, role: NodeRole) -> usize {
        match role {
            NodeRole::Host => 1,
            NodeRole::Edge | NodeRole::Aggregation | NodeRole::Core => self.k,
        }
    }

    /// 校验每个节点的度数与其角色相符
    pub fn check_degrees(&self) -> Result<(), FatTreeError> {
        for (id, node) in self.nodes() {
            let expected = self.expected_degree(node.name.role());
            let actual = self.degree(id);
            debug!(node = %node.name, degree = actual, "度数检查");
            if actual != expected {
                return Err(FatTreeError::DegreeMismatch {
                    node: node.name.to_string(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// 按名字 `h{pod}_{edge}_{n}` 查找主机，`n` 从 [`FIRST_HOST_INDEX`] 开始
    pub fn host(&self, pod: usize, edge: usize, n: usize) -> Option<NodeId> {
        self.find(&NodeName::Host { pod, edge, host: n })
    }

    pub fn edge(&self, pod: usize, edge: usize) -> NodeId {
        let half = self.half();
        let idx = pod * half + edge;
        self.edge_switches[idx]
    }

    pub fn agg(&self, pod: usize, agg: usize) -> NodeId {
        let half = self.half();
        let idx = pod * half + agg;
        self.agg_switches[idx]
    }

    pub fn core(&self, row: usize, col: usize) -> NodeId {
        let half = self.half();
        let idx = row * half + col;
        self.core_switches[idx]
    }

    /// 交换机的 dpid（主机为 None）
    pub fn dpid(&self, id: NodeId) -> Option<Dpid> {
        self.nodes[id.0].name.dpid()
    }

    /// `node` 上连接 `link` 的端口
    pub fn port_of(&self, node: NodeId, link: LinkId) -> Option<PortNo> {
        let pos = self.nodes[node.0].links.iter().position(|l| *l == link)?;
        u32::try_from(pos + 1).ok().map(PortNo)
    }

    /// 所有交换机（core、edge、aggregation 顺序）
    pub fn switches(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.core_switches
            .iter()
            .chain(self.edge_switches.iter())
            .chain(self.agg_switches.iter())
            .copied()
    }

    /// 交换机之间的链路，按链路发现的形式双向各给出一条观测
    pub fn switch_links(&self) -> Vec<LinkObservation> {
        let mut out = Vec::new();
        for (i, link) in self.links.iter().enumerate() {
            let Some(link) = link else { continue };
            let id = LinkId(i);
            let (Some(a), Some(b)) = (self.dpid(link.a), self.dpid(link.b)) else {
                continue;
            };
            let (Some(pa), Some(pb)) = (self.port_of(link.a, id), self.port_of(link.b, id)) else {
                continue;
            };
            let obs = LinkObservation::new(a, pa, b, pb);
            out.push(obs);
            out.push(obs.reversed());
        }
        out
    }

    /// 每台主机所在的 edge 交换机端口
    pub fn host_attachments(&self) -> Vec<HostAttachment> {
        self.hosts
            .iter()
            .filter_map(|&h| self.host_attachment(h))
            .collect()
    }

    pub fn host_attachment(&self, host: NodeId) -> Option<HostAttachment> {
        let node = &self.nodes[host.0];
        let link_id = *node.links.first()?;
        let edge = self.link(link_id)?.other(host);
        Some(HostAttachment {
            name: node.name,
            address: node.name.host_address()?,
            dpid: self.dpid(edge)?,
            port: self.port_of(edge, link_id)?,
        })
    }
}

/// 生成 fat-tree 并校验度数
///
/// 度数不符说明下标计算有误，属于构建失败，调用方应直接放弃。
#[tracing::instrument]
pub fn build_fat_tree(k: usize) -> Result<FatTreeTopology, FatTreeError> {
    if k < 2 || k % 2 != 0 {
        return Err(FatTreeError::InvalidPortCount(k));
    }
    if k > MAX_PORTS {
        return Err(FatTreeError::UnsupportedPortCount(k));
    }

    let half = k / 2;
    let mut topo = FatTreeTopology::empty(k);

    topo.core_switches.reserve(half * half);
    for row in 0..half {
        for col in 0..half {
            let id = topo.add_node(NodeName::Core { col, row });
            topo.core_switches.push(id);
        }
    }

    for pod in 0..k {
        let edges: Vec<NodeId> = (0..half)
            .map(|index| topo.add_node(NodeName::Edge { pod, index }))
            .collect();
        let aggs: Vec<NodeId> = (0..half)
            .map(|index| topo.add_node(NodeName::Aggregation { pod, index }))
            .collect();

        for (edge_idx, &edge_id) in edges.iter().enumerate() {
            for n in 0..half {
                let host_id = topo.add_node(NodeName::Host {
                    pod,
                    edge: edge_idx,
                    host: n + FIRST_HOST_INDEX,
                });
                topo.connect(edge_id, host_id);
                topo.hosts.push(host_id);
            }
        }

        for &edge_id in &edges {
            for &agg_id in &aggs {
                topo.connect(edge_id, agg_id);
            }
        }

        // 位置 i 的 aggregation 连到第 i 行的全部 core，保证 k/2 条互不相交的上行路径
        for (agg_idx, &agg_id) in aggs.iter().enumerate() {
            for col in 0..half {
                let core_id = topo.core_switches[agg_idx * half + col];
                topo.connect(agg_id, core_id);
            }
        }

        topo.edge_switches.extend(edges);
        topo.agg_switches.extend(aggs);
    }

    topo.check_degrees()?;
    info!(
        k,
        core = topo.core_switches.len(),
        agg = topo.agg_switches.len(),
        edge = topo.edge_switches.len(),
        hosts = topo.hosts.len(),
        "🌲 fat-tree 构建完成"
    );
    Ok(topo)
}
