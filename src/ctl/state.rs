//! 控制器共享状态
//!
//! 拓扑、学习表与 datapath 句柄表都归控制器进程所有，由所有事件处理共享。
//! 拓扑整体替换；学习表按键原地覆盖；句柄只增不删。

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::southbound::Datapath;
use super::store::{ArpTable, HostTable};
use crate::net::{Dpid, NodeRole, SharedTopology};

#[derive(Debug, Default)]
pub struct ControllerState {
    pub topology: SharedTopology,
    pub hosts: HostTable,
    pub arp: ArpTable,
    datapaths: RwLock<HashMap<Dpid, Arc<dyn Datapath>>>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记交换机会话；同一 dpid 重连时替换旧句柄
    pub fn register_datapath(&self, datapath: Arc<dyn Datapath>) {
        self.datapaths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(datapath.dpid(), datapath);
    }

    pub fn datapath(&self, dpid: Dpid) -> Option<Arc<dyn Datapath>> {
        self.datapaths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&dpid)
            .cloned()
    }

    /// 已登记的交换机（按 dpid 排序）
    pub fn known_switches(&self) -> Vec<Dpid> {
        let mut out: Vec<Dpid> = self
            .datapaths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        out.sort();
        out
    }

    /// 已登记且角色为 `role` 的交换机
    pub fn switches_with_role(&self, role: NodeRole) -> Vec<Dpid> {
        self.known_switches()
            .into_iter()
            .filter(|d| d.role() == Some(role))
            .collect()
    }
}
