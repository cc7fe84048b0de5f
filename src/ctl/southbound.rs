//! 南向接口
//!
//! 控制器产出的命令（规则下发、定向发包）以及交换机会话句柄的抽象。
//! 真正的协议会话由宿主运行时实现 [`Datapath`]；这里只自带一个内存实现。

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::net::{Dpid, PortNo};

pub const ETH_TYPE_IPV4: u16 = 0x0800;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SouthboundError {
    #[error("datapath {0} is unreachable")]
    Unreachable(Dpid),
    #[error("no datapath handle registered for {0}")]
    UnknownDatapath(Dpid),
    #[error("datapath {dpid} rejected command: {reason}")]
    Rejected { dpid: Dpid, reason: String },
}

/// 规则匹配条件；`None` 字段为通配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlowMatch {
    pub eth_type: Option<u16>,
    pub ipv4_dst: Option<Ipv4Addr>,
}

impl FlowMatch {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn ipv4_dst(dst: Ipv4Addr) -> Self {
        Self {
            eth_type: Some(ETH_TYPE_IPV4),
            ipv4_dst: Some(dst),
        }
    }
}

/// 下发给单台交换机的命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SouthboundCommand {
    /// 插入转发规则
    FlowMod {
        priority: u16,
        matcher: FlowMatch,
        out_port: PortNo,
    },
    /// 从指定端口立即发出一帧
    PacketOut {
        out_port: PortNo,
        #[serde(rename = "len", serialize_with = "serialize_len")]
        data: Vec<u8>,
    },
}

fn serialize_len<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(data.len() as u64)
}

impl SouthboundCommand {
    pub fn is_flow_mod(&self) -> bool {
        matches!(self, SouthboundCommand::FlowMod { .. })
    }

    pub fn is_packet_out(&self) -> bool {
        matches!(self, SouthboundCommand::PacketOut { .. })
    }

    pub fn out_port(&self) -> PortNo {
        match self {
            SouthboundCommand::FlowMod { out_port, .. }
            | SouthboundCommand::PacketOut { out_port, .. } => *out_port,
        }
    }
}

/// 带目标交换机的命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outbound {
    pub dpid: Dpid,
    #[serde(flatten)]
    pub command: SouthboundCommand,
}

impl Outbound {
    pub fn flow_mod(dpid: Dpid, priority: u16, matcher: FlowMatch, out_port: PortNo) -> Self {
        Self {
            dpid,
            command: SouthboundCommand::FlowMod {
                priority,
                matcher,
                out_port,
            },
        }
    }

    pub fn packet_out(dpid: Dpid, out_port: PortNo, data: &[u8]) -> Self {
        Self {
            dpid,
            command: SouthboundCommand::PacketOut {
                out_port,
                data: data.to_vec(),
            },
        }
    }
}

/// 交换机会话句柄
pub trait Datapath: Send + Sync + fmt::Debug {
    fn dpid(&self) -> Dpid;

    fn send(&self, command: &SouthboundCommand) -> Result<(), SouthboundError>;
}

/// 内存中的 datapath：记录收到的命令，可以模拟不可达
#[derive(Debug)]
pub struct RecordingDatapath {
    dpid: Dpid,
    sent: Mutex<Vec<SouthboundCommand>>,
    unreachable: AtomicBool,
}

impl RecordingDatapath {
    pub fn new(dpid: Dpid) -> Self {
        Self {
            dpid,
            sent: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// 已收到的命令副本
    pub fn sent(&self) -> Vec<SouthboundCommand> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 取走并清空已收到的命令
    pub fn take(&self) -> Vec<SouthboundCommand> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Datapath for RecordingDatapath {
    fn dpid(&self) -> Dpid {
        self.dpid
    }

    fn send(&self, command: &SouthboundCommand) -> Result<(), SouthboundError> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(SouthboundError::Unreachable(self.dpid));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());
        Ok(())
    }
}
