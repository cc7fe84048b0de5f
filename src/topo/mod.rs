//! 拓扑模块
//!
//! 参考 fat-tree 的生成，以及从节点名推导角色/pod/dpid/地址的编址规则。

pub mod fat_tree;
mod name;

pub use name::{FIRST_HOST_INDEX, NameError, NodeName, address_pod};
