//! Packet-In 处理
//!
//! 每个未命中规则、被上送到控制器的帧触发一次处理：先学习发送方，
//! 再按 ARP 请求 / ARP 应答 / IPv4 分派。其余类型的帧直接忽略。
//!
//! 处理本身是 (事件, 共享状态) -> 命令列表 的函数，不直接接触南向会话。

use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::config::ControllerConfig;
use super::installer::FlowInstaller;
use super::policy::{Fallback, TwoLevelPolicy};
use super::southbound::Outbound;
use super::state::ControllerState;
use super::store::Attachment;
use crate::net::{ArpMessage, ArpOp, Dpid, Frame, PortNo, TopologyGraph, arp_reply, shortest_path};

/// 上送控制器的帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub dpid: Dpid,
    pub in_port: PortNo,
    pub data: Vec<u8>,
}

impl PacketIn {
    pub fn new(dpid: Dpid, in_port: PortNo, data: Vec<u8>) -> Self {
        Self {
            dpid,
            in_port,
            data,
        }
    }
}

/// 一次处理的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// 目的已知，控制器直接代答 ARP
    ArpProxyReply,
    /// ARP 应答沿最短路径送回请求方
    ArpReplyForwarded,
    /// 请求方接入点未知，应答无处可送
    ArpReplyDropped,
    /// 目的已知，安装规则并转发
    Routed,
    /// 目的已知但两台交换机之间没有路径
    NoPath,
    /// 目的未知，走两级回退
    Fallback(Fallback),
    /// 非 ARP/IPv4 帧
    Ignored,
}

pub struct PacketInReactor<'a> {
    state: &'a ControllerState,
    config: &'a ControllerConfig,
    graph: &'a TopologyGraph,
}

impl<'a> PacketInReactor<'a> {
    pub fn new(
        state: &'a ControllerState,
        config: &'a ControllerConfig,
        graph: &'a TopologyGraph,
    ) -> Self {
        Self {
            state,
            config,
            graph,
        }
    }

    fn installer(&self) -> FlowInstaller<'a> {
        FlowInstaller::new(self.graph, self.config.flow_priority)
    }

    fn policy(&self) -> TwoLevelPolicy<'a> {
        TwoLevelPolicy::new(self.state, self.graph, self.installer())
    }

    #[tracing::instrument(skip(self, pkt), fields(dpid = %pkt.dpid, in_port = %pkt.in_port, len = pkt.data.len()))]
    pub fn handle(&self, pkt: &PacketIn) -> (Reaction, Vec<Outbound>) {
        match Frame::parse(&pkt.data) {
            Frame::Arp(arp) => {
                self.state
                    .hosts
                    .observe(arp.sender_ip, Attachment::new(pkt.dpid, pkt.in_port));
                self.state.arp.observe(arp.sender_ip, arp.sender_mac);
                match arp.op {
                    ArpOp::Request => self.on_arp_request(pkt, &arp),
                    ArpOp::Reply => self.on_arp_reply(pkt, &arp),
                }
            }
            Frame::Ipv4 { src, dst } => {
                self.state
                    .hosts
                    .observe(src, Attachment::new(pkt.dpid, pkt.in_port));
                self.on_ipv4(pkt, src, dst)
            }
            Frame::Other => {
                debug!("忽略非 ARP/IPv4 帧");
                (Reaction::Ignored, Vec::new())
            }
        }
    }

    fn on_arp_request(&self, pkt: &PacketIn, arp: &ArpMessage) -> (Reaction, Vec<Outbound>) {
        info!(src = %arp.sender_ip, dst = %arp.target_ip, "ARP 请求");
        let known = (
            self.state.arp.lookup(arp.target_ip),
            self.state.hosts.lookup(arp.target_ip),
        );
        let (Some(target_mac), Some(_)) = known else {
            let (fallback, out) = self
                .policy()
                .route(pkt.dpid, arp.sender_ip, arp.target_ip, &pkt.data);
            return (Reaction::Fallback(fallback), out);
        };

        // 请求方刚刚学到，接入点必定存在
        let requester = self
            .state
            .hosts
            .lookup(arp.sender_ip)
            .unwrap_or(Attachment::new(pkt.dpid, pkt.in_port));
        let frame = arp_reply(target_mac, arp.target_ip, arp.sender_mac, arp.sender_ip);
        info!(
            target = %arp.target_ip,
            requester = %arp.sender_ip,
            dpid = %requester.dpid,
            port = %requester.port,
            "↩️  代答 ARP"
        );
        (
            Reaction::ArpProxyReply,
            vec![Outbound::packet_out(requester.dpid, requester.port, &frame)],
        )
    }

    fn on_arp_reply(&self, pkt: &PacketIn, arp: &ArpMessage) -> (Reaction, Vec<Outbound>) {
        info!(src = %arp.sender_ip, dst = %arp.target_ip, "ARP 应答");
        let Some(requester) = self.state.hosts.lookup(arp.target_ip) else {
            debug!(requester = %arp.target_ip, "请求方接入点未知，丢弃应答");
            return (Reaction::ArpReplyDropped, Vec::new());
        };
        let path = shortest_path(self.graph, pkt.dpid, requester.dpid);
        if path.is_empty() {
            debug!(from = %pkt.dpid, to = %requester.dpid, "没有到请求方的路径");
            return (Reaction::NoPath, Vec::new());
        }
        debug!(?path, "沿路径送回 ARP 应答");
        let out = self
            .installer()
            .forward_along(&pkt.data, &path, requester.port);
        (Reaction::ArpReplyForwarded, out)
    }

    fn on_ipv4(&self, pkt: &PacketIn, src: Ipv4Addr, dst: Ipv4Addr) -> (Reaction, Vec<Outbound>) {
        debug!(%src, %dst, "IPv4 帧");
        let Some(target) = self.state.hosts.lookup(dst) else {
            let (fallback, out) = self.policy().route(pkt.dpid, src, dst, &pkt.data);
            return (Reaction::Fallback(fallback), out);
        };

        let path = shortest_path(self.graph, pkt.dpid, target.dpid);
        if path.is_empty() {
            debug!(from = %pkt.dpid, to = %target.dpid, "没有到目的的路径");
            return (Reaction::NoPath, Vec::new());
        }
        let installer = self.installer();
        let mut out = installer.install_path(&path, dst, target.port);
        out.extend(installer.forward_along(&pkt.data, &path, target.port));
        info!(%dst, ?path, "🛣️  目的已知，安装路径规则");
        (Reaction::Routed, out)
    }
}
