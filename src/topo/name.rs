//! 节点命名与编址
//!
//! 节点标识符是 (pod, position) 或 (core-row, core-col) 的纯函数，
//! 因此角色、pod、dpid 以及主机地址都能从名字直接推出，无需额外查表。
//!
//! | 角色 | 名字 | dpid | 地址 |
//! |------|------|------|------|
//! | core | `c{col}_{row}` | `300 + 10·row + col` | - |
//! | aggregation | `a{pod}_{i}` | `200 + 10·pod + i` | - |
//! | edge | `e{pod}_{i}` | `100 + 10·pod + i` | - |
//! | host | `h{pod}_{edge}_{n}` | - | `10.pod.edge.n` |

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

use crate::net::{AGG_DPID_BASE, CORE_DPID_BASE, Dpid, EDGE_DPID_BASE, NodeRole};

/// 主机编号从 2 开始（`.1` 留给网关）
pub const FIRST_HOST_INDEX: usize = 2;

/// dpid 编码中每个下标只占一位十进制数
const MAX_INDEX: usize = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("invalid node name `{0}`")]
    Invalid(String),
}

/// fat-tree 节点名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeName {
    Core { col: usize, row: usize },
    Aggregation { pod: usize, index: usize },
    Edge { pod: usize, index: usize },
    Host { pod: usize, edge: usize, host: usize },
}

impl NodeName {
    pub fn role(&self) -> NodeRole {
        match self {
            NodeName::Core { .. } => NodeRole::Core,
            NodeName::Aggregation { .. } => NodeRole::Aggregation,
            NodeName::Edge { .. } => NodeRole::Edge,
            NodeName::Host { .. } => NodeRole::Host,
        }
    }

    pub fn pod(&self) -> Option<usize> {
        match *self {
            NodeName::Core { .. } => None,
            NodeName::Aggregation { pod, .. }
            | NodeName::Edge { pod, .. }
            | NodeName::Host { pod, .. } => Some(pod),
        }
    }

    /// 交换机的 datapath id；主机或下标超出一位数时返回 None
    pub fn dpid(&self) -> Option<Dpid> {
        let (base, tens, ones) = match *self {
            NodeName::Core { col, row } => (CORE_DPID_BASE, row, col),
            NodeName::Aggregation { pod, index } => (AGG_DPID_BASE, pod, index),
            NodeName::Edge { pod, index } => (EDGE_DPID_BASE, pod, index),
            NodeName::Host { .. } => return None,
        };
        if tens > MAX_INDEX || ones > MAX_INDEX {
            return None;
        }
        Some(Dpid(base + 10 * tens as u64 + ones as u64))
    }

    /// `dpid` 的逆映射
    pub fn from_dpid(dpid: Dpid) -> Option<NodeName> {
        let tens = ((dpid.0 % 100) / 10) as usize;
        let ones = (dpid.0 % 10) as usize;
        match dpid.role()? {
            NodeRole::Core => Some(NodeName::Core { col: ones, row: tens }),
            NodeRole::Aggregation => Some(NodeName::Aggregation {
                pod: tens,
                index: ones,
            }),
            NodeRole::Edge => Some(NodeName::Edge {
                pod: tens,
                index: ones,
            }),
            NodeRole::Host => None,
        }
    }

    /// 主机的 IPv4 地址 `10.pod.edge.n`
    pub fn host_address(&self) -> Option<Ipv4Addr> {
        match *self {
            NodeName::Host { pod, edge, host } => Some(Ipv4Addr::new(
                10,
                u8::try_from(pod).ok()?,
                u8::try_from(edge).ok()?,
                u8::try_from(host).ok()?,
            )),
            _ => None,
        }
    }
}

/// 从主机地址中恢复 pod；不在 `10.0.0.0/8` 内的地址无法判定
pub fn address_pod(addr: Ipv4Addr) -> Option<usize> {
    match addr.octets() {
        [10, pod, _, _] => Some(pod as usize),
        _ => None,
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NodeName::Core { col, row } => write!(f, "c{col}_{row}"),
            NodeName::Aggregation { pod, index } => write!(f, "a{pod}_{index}"),
            NodeName::Edge { pod, index } => write!(f, "e{pod}_{index}"),
            NodeName::Host { pod, edge, host } => write!(f, "h{pod}_{edge}_{host}"),
        }
    }
}

/// 只接受规范形式的十进制下标：无符号、除 `0` 本身外无前导零，
/// 保证 `Display` 能原样还原
fn parse_index(part: &str) -> Option<usize> {
    let canonical = !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'));
    if !canonical {
        return None;
    }
    part.parse().ok()
}

impl FromStr for NodeName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NameError::Invalid(s.to_string());
        let mut chars = s.chars();
        let tag = chars.next().ok_or_else(invalid)?;
        let indices: Vec<usize> = chars
            .as_str()
            .split('_')
            .map(parse_index)
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;

        match (tag, indices.as_slice()) {
            ('c', &[col, row]) => Ok(NodeName::Core { col, row }),
            ('a', &[pod, index]) => Ok(NodeName::Aggregation { pod, index }),
            ('e', &[pod, index]) => Ok(NodeName::Edge { pod, index }),
            ('h', &[pod, edge, host]) => Ok(NodeName::Host { pod, edge, host }),
            _ => Err(invalid()),
        }
    }
}
