//! 主机学习表
//!
//! 以网络地址为键、最近一次观察为准的表。用于主机接入点（dpid, port）
//! 与 ARP（IPv4 -> MAC）两类学习状态；没有老化，也不检测主机迁移。

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{PoisonError, RwLock};

use tracing::trace;

use crate::net::{Dpid, MacAddr, PortNo};

/// 主机接入点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
    pub dpid: Dpid,
    pub port: PortNo,
}

impl Attachment {
    pub fn new(dpid: Dpid, port: PortNo) -> Self {
        Self { dpid, port }
    }
}

/// 后写覆盖的学习表；每次写入在写锁内完成，单键上的更新不会交错
#[derive(Debug)]
pub struct LearnedTable<V> {
    entries: RwLock<HashMap<Ipv4Addr, V>>,
}

impl<V> Default for LearnedTable<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone + std::fmt::Debug> LearnedTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或覆盖；返回被覆盖的旧值
    pub fn observe(&self, addr: Ipv4Addr, value: V) -> Option<V> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        trace!(%addr, ?value, "学习");
        entries.insert(addr, value)
    }

    pub fn lookup(&self, addr: Ipv4Addr) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&addr)
            .cloned()
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&addr)
    }

    /// 当前全部条目的副本（顺序不定）
    pub fn snapshot(&self) -> Vec<(Ipv4Addr, V)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(addr, v)| (*addr, v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type HostTable = LearnedTable<Attachment>;
pub type ArpTable = LearnedTable<MacAddr>;
