//! 链路发现结果
//!
//! 南向层上报的单向链路观测：`src` 交换机的 `src_port` 连到 `dst` 交换机的 `dst_port`。

use serde::Serialize;

use super::id::{Dpid, PortNo};

/// 单向链路观测
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LinkObservation {
    pub src: Dpid,
    pub src_port: PortNo,
    pub dst: Dpid,
    pub dst_port: PortNo,
}

impl LinkObservation {
    pub fn new(src: Dpid, src_port: PortNo, dst: Dpid, dst_port: PortNo) -> Self {
        Self {
            src,
            src_port,
            dst,
            dst_port,
        }
    }

    /// 同一条物理链路的反方向观测
    pub fn reversed(&self) -> Self {
        Self::new(self.dst, self.dst_port, self.src, self.src_port)
    }
}
