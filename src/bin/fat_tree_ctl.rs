use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ftctl_rs::ctl::{
    Controller, ControllerConfig, ControllerEvent, Outbound, PacketIn, Reaction, RecordingDatapath,
};
use ftctl_rs::net::{ArpMessage, ArpOp, MacAddr, PortNo, arp_frame, ipv4_frame};
use ftctl_rs::topo::NodeName;
use ftctl_rs::topo::fat_tree::{HostAttachment, build_fat_tree};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "fat-tree-ctl",
    about = "Drive the fat-tree routing controller through an ARP + IPv4 exchange"
)]
struct Args {
    /// Path to controller config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override fat-tree port count k
    #[arg(long)]
    k: Option<usize>,

    /// Source host name
    #[arg(long, default_value = "h0_0_2")]
    src: String,

    /// Destination host name
    #[arg(long, default_value = "h1_0_2")]
    dst: String,

    /// Print every emitted command as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: &'static str,
    reaction: String,
    commands: Vec<Outbound>,
}

impl StepReport {
    fn new(step: &'static str, reaction: Reaction, commands: Vec<Outbound>) -> Self {
        Self {
            step,
            reaction: format!("{reaction:?}"),
            commands,
        }
    }

    fn count(&self, pred: impl Fn(&Outbound) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

/// 本地管理的 MAC：02:00:0a:pod:edge:n
fn host_mac(host: &HostAttachment) -> MacAddr {
    let [_, pod, edge, n] = host.address.octets();
    MacAddr([0x02, 0x00, 0x0a, pod, edge, n])
}

fn find_host(hosts: &[HostAttachment], raw: &str) -> Result<HostAttachment, Box<dyn Error>> {
    let name: NodeName = raw.parse()?;
    hosts
        .iter()
        .find(|h| h.name == name)
        .copied()
        .ok_or_else(|| format!("host {raw} is not part of the fat-tree").into())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ControllerConfig::from_json_file(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(k) = args.k {
        config.num_ports = k;
    }

    let topo = build_fat_tree(config.num_ports)?;
    let hosts = topo.host_attachments();
    let src = find_host(&hosts, &args.src)?;
    let dst = find_host(&hosts, &args.dst)?;
    let (src_mac, dst_mac) = (host_mac(&src), host_mac(&dst));

    let ctl = Controller::new(config);
    for sw in topo.switches() {
        let Some(dpid) = topo.dpid(sw) else { continue };
        let datapath = Arc::new(RecordingDatapath::new(dpid));
        ctl.handle(ControllerEvent::SwitchJoin(datapath));
    }
    ctl.handle(ControllerEvent::LinkState(topo.switch_links()));

    let mut reports = Vec::new();

    let request = ArpMessage {
        op: ArpOp::Request,
        sender_mac: src_mac,
        sender_ip: src.address,
        target_mac: MacAddr::ZERO,
        target_ip: dst.address,
    };
    let pkt = PacketIn::new(src.dpid, src.port, arp_frame(&request, MacAddr::BROADCAST));
    let (reaction, out) = ctl.on_packet_in(&pkt);
    reports.push(StepReport::new("arp_request", reaction, out));

    let reply = ArpMessage {
        op: ArpOp::Reply,
        sender_mac: dst_mac,
        sender_ip: dst.address,
        target_mac: src_mac,
        target_ip: src.address,
    };
    let pkt = PacketIn::new(dst.dpid, dst.port, arp_frame(&reply, src_mac));
    let (reaction, out) = ctl.on_packet_in(&pkt);
    reports.push(StepReport::new("arp_reply", reaction, out));

    let data = ipv4_frame(src_mac, dst_mac, src.address, dst.address, b"ping")?;
    let pkt = PacketIn::new(src.dpid, src.port, data);
    let (reaction, out) = ctl.on_packet_in(&pkt);
    reports.push(StepReport::new("ipv4", reaction, out));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for r in &reports {
        println!(
            "step={} reaction={} flow_mods={} packet_outs={} floods={}",
            r.step,
            r.reaction,
            r.count(|c| c.command.is_flow_mod()),
            r.count(|c| c.command.is_packet_out()),
            r.count(|c| c.command.out_port() == PortNo::FLOOD),
        );
    }
    Ok(())
}
