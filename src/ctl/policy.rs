//! 两级回退路由
//!
//! 目的主机的接入点尚未学到时使用。pod 由地址 `10.pod.edge.n` 推出：
//!
//! - 同 pod：在已知接入点里找一台属于目的 pod 的 edge 交换机，
//!   沿最短路径把帧送过去并在那里泛洪，找到第一台即停止；
//! - 跨 pod（或任一端 pod 无法判定）：对每台已知 core，先把帧逐跳送到 core，
//!   再从该 core 向每台已知 edge 各发一份。重复投递是可以接受的代价。
//!
//! 跨 pod 分支在 core × edge 的双重循环里逐对计算最短路径，
//! 每个未知目的的帧代价与交换机数的平方成正比。

use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::installer::FlowInstaller;
use super::southbound::Outbound;
use super::state::ControllerState;
use crate::net::{Dpid, NodeRole, PortNo, TopologyGraph, first_hop_port, shortest_path};
use crate::topo::address_pod;

/// 回退分支
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// 同 pod，经由给定 edge 交换机
    IntraPod { via: Dpid },
    /// 同 pod 但没有可用的 edge 交换机
    IntraPodUnreachable,
    /// core 向上再向所有 edge 泛洪
    CoreThenEdge { cores: usize, edges: usize },
}

pub struct TwoLevelPolicy<'a> {
    state: &'a ControllerState,
    graph: &'a TopologyGraph,
    installer: FlowInstaller<'a>,
}

impl<'a> TwoLevelPolicy<'a> {
    pub fn new(
        state: &'a ControllerState,
        graph: &'a TopologyGraph,
        installer: FlowInstaller<'a>,
    ) -> Self {
        Self {
            state,
            graph,
            installer,
        }
    }

    /// 为目的未知的帧选择回退分支并生成要发出的命令
    #[tracing::instrument(skip(self, data), fields(%src_dpid, %src_ip, %dst_ip))]
    pub fn route(
        &self,
        src_dpid: Dpid,
        src_ip: Ipv4Addr,
        dst_ip: Ipv4Addr,
        data: &[u8],
    ) -> (Fallback, Vec<Outbound>) {
        match (address_pod(src_ip), address_pod(dst_ip)) {
            (Some(src_pod), Some(dst_pod)) if src_pod == dst_pod => {
                info!(pod = dst_pod, "同 pod 回退");
                self.intra_pod(src_dpid, dst_pod, data)
            }
            (src_pod, dst_pod) => {
                info!(?src_pod, ?dst_pod, "跨 pod 回退：core 再 edge");
                self.core_then_edge(src_dpid, data)
            }
        }
    }

    fn intra_pod(&self, src_dpid: Dpid, dst_pod: usize, data: &[u8]) -> (Fallback, Vec<Outbound>) {
        // 候选顺序不定；目的 pod 内任意一台 edge 都能转发探测
        for (addr, attachment) in self.state.hosts.snapshot() {
            let candidate = attachment.dpid;
            if candidate.role() != Some(NodeRole::Edge) || candidate.pod() != Some(dst_pod) {
                continue;
            }
            let path = shortest_path(self.graph, src_dpid, candidate);
            if first_hop_port(self.graph, &path).is_none() {
                debug!(%candidate, %addr, ?path, "候选交换机没有可用的下一跳");
                continue;
            }
            debug!(%candidate, ?path, "经由同 pod edge 交换机转发");
            let out = self.installer.forward_along(data, &path, PortNo::FLOOD);
            return (Fallback::IntraPod { via: candidate }, out);
        }
        debug!(pod = dst_pod, "没有可用的同 pod edge 交换机");
        (Fallback::IntraPodUnreachable, Vec::new())
    }

    fn core_then_edge(&self, src_dpid: Dpid, data: &[u8]) -> (Fallback, Vec<Outbound>) {
        let cores = self.state.switches_with_role(NodeRole::Core);
        let edges = self.state.switches_with_role(NodeRole::Edge);
        let mut out = Vec::new();

        for &core in &cores {
            let up = shortest_path(self.graph, src_dpid, core);
            if first_hop_port(self.graph, &up).is_some() {
                out.extend(self.installer.forward_hops(data, &up));
            }

            for &edge in &edges {
                let down = shortest_path(self.graph, core, edge);
                if first_hop_port(self.graph, &down).is_some() {
                    out.extend(self.installer.forward_along(data, &down, PortNo::FLOOD));
                }
            }
        }

        debug!(
            cores = cores.len(),
            edges = edges.len(),
            commands = out.len(),
            "core/edge 泛洪完成"
        );
        (
            Fallback::CoreThenEdge {
                cores: cores.len(),
                edges: edges.len(),
            },
            out,
        )
    }
}
