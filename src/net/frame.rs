//! 帧解析与构造
//!
//! 控制器只区分两类帧：ARP 与 IPv4，其余都归为 [`Frame::Other`] 并被忽略。

use std::net::Ipv4Addr;

use etherparse::{
    ArpEthIpv4Packet, ArpOperation, ArpPacketSlice, EtherType, Ethernet2Header, LaxNetSlice,
    LaxSlicedPacket, PacketBuilder,
};
use thiserror::Error;

use super::id::MacAddr;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to build frame: {0}")]
    Build(String),
}

/// ARP 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request,
    Reply,
}

impl ArpOp {
    fn operation(self) -> ArpOperation {
        match self {
            ArpOp::Request => ArpOperation::REQUEST,
            ArpOp::Reply => ArpOperation::REPLY,
        }
    }
}

/// 以太网/IPv4 上的 ARP 报文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub op: ArpOp,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

/// 上送控制器的帧的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Arp(ArpMessage),
    Ipv4 { src: Ipv4Addr, dst: Ipv4Addr },
    Other,
}

impl Frame {
    /// 解析一个以太网帧；链路层或网络层截断、畸形以及不关心的类型都返回
    /// `Frame::Other`。传输层损坏不影响分类。
    pub fn parse(data: &[u8]) -> Frame {
        let Ok(pkt) = LaxSlicedPacket::from_ethernet(data) else {
            return Frame::Other;
        };
        match pkt.net {
            Some(LaxNetSlice::Ipv4(ipv4)) => {
                let header = ipv4.header();
                Frame::Ipv4 {
                    src: header.source_addr(),
                    dst: header.destination_addr(),
                }
            }
            Some(LaxNetSlice::Arp(arp)) => parse_arp(&arp).map_or(Frame::Other, Frame::Arp),
            _ => Frame::Other,
        }
    }
}

fn parse_arp(arp: &ArpPacketSlice<'_>) -> Option<ArpMessage> {
    let operation = arp.operation();
    let op = if operation == ArpOperation::REQUEST {
        ArpOp::Request
    } else if operation == ArpOperation::REPLY {
        ArpOp::Reply
    } else {
        return None;
    };
    Some(ArpMessage {
        op,
        sender_mac: MacAddr(<[u8; 6]>::try_from(arp.sender_hw_addr()).ok()?),
        sender_ip: Ipv4Addr::from(<[u8; 4]>::try_from(arp.sender_protocol_addr()).ok()?),
        target_mac: MacAddr(<[u8; 6]>::try_from(arp.target_hw_addr()).ok()?),
        target_ip: Ipv4Addr::from(<[u8; 4]>::try_from(arp.target_protocol_addr()).ok()?),
    })
}

/// 构造一个 ARP 帧。请求通常以广播地址为以太网目的地址。
pub fn arp_frame(msg: &ArpMessage, eth_dst: MacAddr) -> Vec<u8> {
    let eth = Ethernet2Header {
        source: msg.sender_mac.0,
        destination: eth_dst.0,
        ether_type: EtherType::ARP,
    };
    let arp = ArpEthIpv4Packet {
        operation: msg.op.operation(),
        sender_mac: msg.sender_mac.0,
        sender_ipv4: msg.sender_ip.octets(),
        target_mac: msg.target_mac.0,
        target_ipv4: msg.target_ip.octets(),
    };

    let mut buf = Vec::with_capacity(Ethernet2Header::LEN + ArpEthIpv4Packet::LEN);
    buf.extend_from_slice(&eth.to_bytes());
    buf.extend_from_slice(&arp.to_bytes());
    buf
}

/// 代答：以 `target` 的身份回复 `requester`
pub fn arp_reply(
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
    requester_mac: MacAddr,
    requester_ip: Ipv4Addr,
) -> Vec<u8> {
    let msg = ArpMessage {
        op: ArpOp::Reply,
        sender_mac: target_mac,
        sender_ip: target_ip,
        target_mac: requester_mac,
        target_ip: requester_ip,
    };
    arp_frame(&msg, requester_mac)
}

/// 构造一个承载 UDP 负载的 IPv4 帧
pub fn ipv4_frame(
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    payload: &[u8],
) -> Result<Vec<u8>, FrameError> {
    let builder = PacketBuilder::ethernet2(src_mac.0, dst_mac.0)
        .ipv4(src.octets(), dst.octets(), 64)
        .udp(40_000, 5_001);
    let mut buf = Vec::with_capacity(builder.size(payload.len()));
    builder
        .write(&mut buf, payload)
        .map_err(|e| FrameError::Build(e.to_string()))?;
    Ok(buf)
}
