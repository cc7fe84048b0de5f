mod fallback;
mod routing;
mod store;

use std::net::Ipv4Addr;
use std::sync::Arc;

use etherparse::{EtherType, Ethernet2Header, IpNumber, Ipv4Header};

use crate::ctl::{Controller, ControllerConfig, ControllerEvent, Outbound, RecordingDatapath};
use crate::net::{ArpMessage, ArpOp, Dpid, MacAddr, PortNo, arp_frame};
use crate::topo::fat_tree::{FatTreeTopology, HostAttachment, build_fat_tree};

/// 所有交换机已上线、链路已通告的 fat-tree 控制器
pub(crate) struct Fabric {
    pub ctl: Controller,
    pub topo: FatTreeTopology,
    pub datapaths: Vec<Arc<RecordingDatapath>>,
}

impl Fabric {
    pub fn new(k: usize) -> Self {
        let topo = build_fat_tree(k).expect("valid k");
        let ctl = Controller::new(ControllerConfig {
            num_ports: k,
            ..ControllerConfig::default()
        });
        let mut datapaths = Vec::new();
        for sw in topo.switches() {
            let dp = Arc::new(RecordingDatapath::new(topo.dpid(sw).expect("switch dpid")));
            ctl.handle(ControllerEvent::SwitchJoin(dp.clone()));
            datapaths.push(dp);
        }
        ctl.handle(ControllerEvent::LinkState(topo.switch_links()));
        Self {
            ctl,
            topo,
            datapaths,
        }
    }

    pub fn datapath(&self, dpid: Dpid) -> &RecordingDatapath {
        self.datapaths
            .iter()
            .find(|d| crate::ctl::Datapath::dpid(d.as_ref()) == dpid)
            .expect("datapath registered")
    }

    pub fn host(&self, pod: usize, edge: usize, n: usize) -> HostAttachment {
        self.topo
            .host(pod, edge, n)
            .and_then(|h| self.topo.host_attachment(h))
            .expect("host attachment")
    }

    /// 直接写入学习表，相当于已经见过该主机
    pub fn learn(&self, host: &HostAttachment) {
        let state = self.ctl.state();
        state.hosts.observe(
            host.address,
            crate::ctl::Attachment::new(host.dpid, host.port),
        );
        state.arp.observe(host.address, mac_of(host.address));
    }
}

pub(crate) fn mac_of(addr: Ipv4Addr) -> MacAddr {
    let [_, b, c, d] = addr.octets();
    MacAddr([0x02, 0x00, 0x0a, b, c, d])
}

pub(crate) fn arp_request(src: &HostAttachment, target: Ipv4Addr) -> Vec<u8> {
    let msg = ArpMessage {
        op: ArpOp::Request,
        sender_mac: mac_of(src.address),
        sender_ip: src.address,
        target_mac: MacAddr::ZERO,
        target_ip: target,
    };
    arp_frame(&msg, MacAddr::BROADCAST)
}

pub(crate) fn count_where(out: &[Outbound], pred: impl Fn(&Outbound) -> bool) -> usize {
    out.iter().filter(|o| pred(o)).count()
}

pub(crate) fn floods(out: &[Outbound]) -> Vec<&Outbound> {
    out.iter()
        .filter(|o| o.command.is_packet_out() && o.command.out_port() == PortNo::FLOOD)
        .collect()
}

/// 以太网 + IPv4 帧，IPv4 负载只有 8 字节 TCP 头（完整 TCP 头至少 20 字节）
pub(crate) fn ipv4_with_truncated_tcp(
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src: Ipv4Addr,
    dst: Ipv4Addr,
) -> Vec<u8> {
    let eth = Ethernet2Header {
        source: src_mac.0,
        destination: dst_mac.0,
        ether_type: EtherType::IPV4,
    };
    let mut ip = Ipv4Header::new(8, 64, IpNumber::TCP, src.octets(), dst.octets())
        .expect("ipv4 header");
    ip.header_checksum = ip.calc_header_checksum();

    let mut data = eth.to_bytes().to_vec();
    data.extend_from_slice(&ip.to_bytes());
    // 源/目的端口与序号，之后截断
    data.extend_from_slice(&[0x9c, 0x40, 0x13, 0x89, 0, 0, 0, 1]);
    data
}
