//! 网络基础模块
//!
//! 此模块包含控制器依赖的网络基础组件：标识符、帧编解码、链路观测、
//! 运行时拓扑图与最短路径计算。

// 子模块声明
mod frame;
mod graph;
mod id;
mod link;
mod routing;

// 重新导出公共接口
pub use frame::{ArpMessage, ArpOp, Frame, FrameError, arp_frame, arp_reply, ipv4_frame};
pub use graph::{Adjacency, SharedTopology, TopologyGraph};
pub(crate) use id::{AGG_DPID_BASE, CORE_DPID_BASE, EDGE_DPID_BASE};
pub use id::{Dpid, LinkId, MacAddr, NodeId, NodeRole, PortNo};
pub use link::LinkObservation;
pub use routing::{Path, first_hop_port, shortest_path};
