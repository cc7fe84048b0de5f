//! 标识符类型
//!
//! 定义拓扑节点/链路的下标、交换机 datapath id、端口号与链路层地址。

use std::fmt;

use serde::{Serialize, Serializer};

/// 拓扑节点标识符（fat-tree 生成器中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// 链路标识符（fat-tree 生成器中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub usize);

/// 节点在 fat-tree 中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Core,
    Aggregation,
    Edge,
    Host,
}

pub(crate) const EDGE_DPID_BASE: u64 = 100;
pub(crate) const AGG_DPID_BASE: u64 = 200;
pub(crate) const CORE_DPID_BASE: u64 = 300;

/// 交换机 datapath 标识符
///
/// 取值区间编码了角色：`1xx` 为 edge，`2xx` 为 aggregation，`3xx` 为 core；
/// edge/aggregation 的十位是 pod 编号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Dpid(pub u64);

impl Dpid {
    /// 由 dpid 区间推导交换机角色
    pub fn role(self) -> Option<NodeRole> {
        match self.0 {
            100..=199 => Some(NodeRole::Edge),
            200..=299 => Some(NodeRole::Aggregation),
            300..=399 => Some(NodeRole::Core),
            _ => None,
        }
    }

    /// edge/aggregation 交换机所属的 pod；core 或未知区间返回 None
    pub fn pod(self) -> Option<usize> {
        match self.role()? {
            NodeRole::Edge | NodeRole::Aggregation => Some(((self.0 % 100) / 10) as usize),
            _ => None,
        }
    }
}

impl fmt::Display for Dpid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 交换机端口号（OpenFlow 1.3 编号，保留端口位于高位区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PortNo(pub u32);

impl PortNo {
    /// 除入端口外的所有端口
    pub const FLOOD: PortNo = PortNo(0xffff_fffb);
    /// 上送控制器
    pub const CONTROLLER: PortNo = PortNo(0xffff_fffd);

    const MAX_PHYSICAL: u32 = 0xffff_ff00;

    /// 物理端口：非 0 且不在保留区间
    pub fn is_physical(self) -> bool {
        self.0 != 0 && self.0 < Self::MAX_PHYSICAL
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PortNo::FLOOD => f.write_str("flood"),
            PortNo::CONTROLLER => f.write_str("controller"),
            PortNo(n) => write!(f, "{n}"),
        }
    }
}

/// 以太网 MAC 地址
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const ZERO: MacAddr = MacAddr([0; 6]);
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
