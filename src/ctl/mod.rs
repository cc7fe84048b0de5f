//! 控制器模块
//!
//! 路由与拓扑状态引擎：共享状态、主机学习、Packet-In 处理、
//! 两级回退路由以及规则下发。

// 子模块声明
mod config;
mod controller;
mod installer;
mod policy;
mod reactor;
mod southbound;
mod state;
mod store;

// 重新导出公共接口
pub use config::{ConfigError, ControllerConfig};
pub use controller::{Controller, ControllerEvent};
pub use installer::FlowInstaller;
pub use policy::{Fallback, TwoLevelPolicy};
pub use reactor::{PacketIn, PacketInReactor, Reaction};
pub use southbound::{
    Datapath, ETH_TYPE_IPV4, FlowMatch, Outbound, RecordingDatapath, SouthboundCommand,
    SouthboundError,
};
pub use state::ControllerState;
pub use store::{ArpTable, Attachment, HostTable, LearnedTable};
