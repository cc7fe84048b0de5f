//! 控制器
//!
//! 接收南向事件（交换机上线、链路通告、Packet-In），更新共享状态，
//! 计算出要下发的命令并通过 datapath 句柄发出。某台交换机发送失败时
//! 只记录并跳过该条命令，其余命令照常下发。
//!
//! `Controller` 只需要 `&self`，可以放进 `Arc` 由宿主运行时并发调度。

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::ControllerConfig;
use super::reactor::{PacketIn, PacketInReactor, Reaction};
use super::southbound::{Datapath, FlowMatch, Outbound, SouthboundError};
use super::state::ControllerState;
use crate::net::{LinkObservation, PortNo};

/// 南向事件
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// 交换机完成会话建立
    SwitchJoin(Arc<dyn Datapath>),
    /// 全量链路通告
    LinkState(Vec<LinkObservation>),
    /// 未命中规则的帧
    PacketIn(PacketIn),
}

#[derive(Debug, Default)]
pub struct Controller {
    config: ControllerConfig,
    state: ControllerState,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: ControllerState::new(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// 处理一个事件，返回成功下发的命令
    pub fn handle(&self, event: ControllerEvent) -> Vec<Outbound> {
        match event {
            ControllerEvent::SwitchJoin(datapath) => self.on_switch_join(datapath),
            ControllerEvent::LinkState(links) => {
                self.on_link_state(&links);
                Vec::new()
            }
            ControllerEvent::PacketIn(pkt) => self.on_packet_in(&pkt).1,
        }
    }

    /// 登记句柄并安装 table-miss 规则（全部上送控制器）
    #[tracing::instrument(skip(self, datapath), fields(dpid = %datapath.dpid()))]
    pub fn on_switch_join(&self, datapath: Arc<dyn Datapath>) -> Vec<Outbound> {
        let dpid = datapath.dpid();
        self.state.register_datapath(datapath);
        info!(role = ?dpid.role(), "🔌 交换机上线");

        let table_miss = Outbound::flow_mod(
            dpid,
            self.config.table_miss_priority,
            FlowMatch::any(),
            PortNo::CONTROLLER,
        );
        self.dispatch(vec![table_miss])
    }

    pub fn on_link_state(&self, links: &[LinkObservation]) {
        self.state.topology.rebuild(links);
    }

    /// 处理 Packet-In，返回处理结论与成功下发的命令
    pub fn on_packet_in(&self, pkt: &PacketIn) -> (Reaction, Vec<Outbound>) {
        let graph = self.state.topology.snapshot();
        let reactor = PacketInReactor::new(&self.state, &self.config, &graph);
        let (reaction, out) = reactor.handle(pkt);
        debug!(?reaction, commands = out.len(), "Packet-In 处理完成");
        (reaction, self.dispatch(out))
    }

    /// 逐条下发；失败的命令被跳过
    pub fn dispatch(&self, outbound: Vec<Outbound>) -> Vec<Outbound> {
        let mut delivered = Vec::with_capacity(outbound.len());
        for ob in outbound {
            match self.send(&ob) {
                Ok(()) => {
                    debug!(dpid = %ob.dpid, command = ?ob.command, "命令已下发");
                    delivered.push(ob);
                }
                Err(err) => warn!(dpid = %ob.dpid, %err, "南向命令失败，跳过"),
            }
        }
        delivered
    }

    fn send(&self, ob: &Outbound) -> Result<(), SouthboundError> {
        let datapath = self
            .state
            .datapath(ob.dpid)
            .ok_or(SouthboundError::UnknownDatapath(ob.dpid))?;
        datapath.send(&ob.command)
    }
}
