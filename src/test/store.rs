use crate::ctl::{ArpTable, Attachment, HostTable};
use crate::net::{Dpid, MacAddr, PortNo};
use std::net::Ipv4Addr;
use std::sync::Arc;

#[test]
fn host_table_lookup_returns_latest_observation() {
    let table = HostTable::new();
    let addr = Ipv4Addr::new(10, 0, 0, 2);
    assert_eq!(table.lookup(addr), None);

    assert_eq!(table.observe(addr, Attachment::new(Dpid(100), PortNo(1))), None);
    assert_eq!(
        table.lookup(addr),
        Some(Attachment::new(Dpid(100), PortNo(1)))
    );

    let old = table.observe(addr, Attachment::new(Dpid(131), PortNo(2)));
    assert_eq!(old, Some(Attachment::new(Dpid(100), PortNo(1))));
    assert_eq!(
        table.lookup(addr),
        Some(Attachment::new(Dpid(131), PortNo(2)))
    );
    assert_eq!(table.len(), 1);
}

#[test]
fn arp_table_overwrites_mac_silently() {
    let table = ArpTable::new();
    let addr = Ipv4Addr::new(10, 1, 0, 3);
    table.observe(addr, MacAddr([2, 0, 0, 0, 0, 1]));
    table.observe(addr, MacAddr([2, 0, 0, 0, 0, 2]));
    assert_eq!(table.lookup(addr), Some(MacAddr([2, 0, 0, 0, 0, 2])));
    assert!(table.contains(addr));
    assert!(!table.contains(Ipv4Addr::new(10, 1, 0, 4)));
}

#[test]
fn concurrent_observations_leave_one_complete_entry_per_key() {
    let table = Arc::new(HostTable::new());
    std::thread::scope(|s| {
        for t in 0..8u32 {
            let table = Arc::clone(&table);
            s.spawn(move || {
                for i in 0..200u32 {
                    let addr = Ipv4Addr::new(10, 0, (i % 4) as u8, 2);
                    table.observe(addr, Attachment::new(Dpid(100 + u64::from(t)), PortNo(t + 1)));
                }
            });
        }
    });

    assert_eq!(table.len(), 4);
    for (_, att) in table.snapshot() {
        // 端口与 dpid 来自同一次写入
        assert_eq!(u64::from(att.port.0) + 99, att.dpid.0);
    }
}
