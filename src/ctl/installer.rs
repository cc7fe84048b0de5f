//! 规则下发与沿路径发包
//!
//! 两种遍历方式相同：对路径上每一跳查出端口，然后在最后一台交换机
//! 使用给定的最终端口。查不到出端口的一跳直接跳过，不中断整条路径。

use std::net::Ipv4Addr;

use tracing::{debug, warn};

use super::southbound::{FlowMatch, Outbound};
use crate::net::{Dpid, PortNo, TopologyGraph};

#[derive(Debug, Clone, Copy)]
pub struct FlowInstaller<'a> {
    graph: &'a TopologyGraph,
    priority: u16,
}

impl<'a> FlowInstaller<'a> {
    pub fn new(graph: &'a TopologyGraph, priority: u16) -> Self {
        Self { graph, priority }
    }

    /// 逐跳 (交换机, 出端口)；缺失端口的跳被跳过
    fn hops(&self, path: &[Dpid]) -> impl Iterator<Item = (Dpid, PortNo)> {
        let graph = self.graph;
        path.windows(2).filter_map(move |w| {
            let (cur, next) = (w[0], w[1]);
            match graph.output_port(cur, next) {
                Some(port) => Some((cur, port)),
                None => {
                    warn!(%cur, %next, "没有朝向下一跳的端口，跳过");
                    None
                }
            }
        })
    }

    /// 为 `dst` 在路径每一跳安装转发规则，末跳指向 `final_port`
    pub fn install_path(&self, path: &[Dpid], dst: Ipv4Addr, final_port: PortNo) -> Vec<Outbound> {
        let Some(&last) = path.last() else {
            return Vec::new();
        };
        let matcher = FlowMatch::ipv4_dst(dst);
        let mut out: Vec<Outbound> = self
            .hops(path)
            .map(|(dpid, port)| Outbound::flow_mod(dpid, self.priority, matcher, port))
            .collect();
        out.push(Outbound::flow_mod(last, self.priority, matcher, final_port));
        debug!(?path, %dst, rules = out.len(), "生成路径规则");
        out
    }

    /// 沿路径每一跳立即发出 `data`，末跳从 `final_port` 发出；不留下任何规则
    pub fn forward_along(&self, data: &[u8], path: &[Dpid], final_port: PortNo) -> Vec<Outbound> {
        let Some(&last) = path.last() else {
            return Vec::new();
        };
        let mut out = self.forward_hops(data, path);
        out.push(Outbound::packet_out(last, final_port, data));
        out
    }

    /// 只发中间各跳，不在最后一台交换机发出
    pub fn forward_hops(&self, data: &[u8], path: &[Dpid]) -> Vec<Outbound> {
        self.hops(path)
            .map(|(dpid, port)| Outbound::packet_out(dpid, port, data))
            .collect()
    }
}
