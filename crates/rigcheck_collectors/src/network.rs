//! Network quality probe.
//!
//! Times TCP connects against a small set of endpoints gamers depend on:
//! two public DNS resolvers and the Steam and Epic storefronts. Sampling a
//! real connect gives a figure close to what a game's own netcode sees and
//! needs no elevated privileges, unlike ICMP.

use rigcheck_core::snapshot::{LatencyProbe, LinkKind, NetworkReport};
use rigcheck_core::{Collector, CollectorContext, DiagError, SectionData, SectionKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use sysinfo::Networks;
use tracing::debug;

const ENDPOINTS: &[(&str, &str)] = &[
    ("8.8.8.8:443", "Google DNS"),
    ("1.1.1.1:443", "Cloudflare DNS"),
    ("steamcommunity.com:443", "Steam Community"),
    ("epicgames.com:443", "Epic Games"),
];

const DNS_CHECK_HOST: &str = "google.com";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const FULL_SAMPLES: usize = 5;
const QUICK_SAMPLES: usize = 2;

pub struct NetworkCollector;

impl Collector for NetworkCollector {
    fn name(&self) -> &'static str {
        "network"
    }

    fn kind(&self) -> SectionKind {
        SectionKind::Network
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    fn collect(&self, ctx: &CollectorContext) -> Result<SectionData, DiagError> {
        let samples = if ctx.quick { QUICK_SAMPLES } else { FULL_SAMPLES };

        let dns_latency_ms = time_resolution(DNS_CHECK_HOST);
        let mut probes = Vec::with_capacity(ENDPOINTS.len());
        for (target, label) in ENDPOINTS {
            if ctx.cancel.is_cancelled() {
                return Err(DiagError::collector(self.name(), "cancelled"));
            }
            probes.push(measure_endpoint(target, label, samples));
        }

        let (avg_latency_ms, max_latency_ms, packet_loss_percent) = aggregate(&probes);
        let is_connected =
            probes.iter().any(|p| p.loss_percent < 100.0) || dns_latency_ms.is_some();
        debug!(
            "{}/{} endpoints reachable, avg {:?} ms",
            probes.iter().filter(|p| p.loss_percent < 100.0).count(),
            probes.len(),
            avg_latency_ms
        );

        Ok(SectionData::Network(NetworkReport {
            is_connected,
            connection_type: detect_link_kind(),
            dns_latency_ms,
            probes,
            avg_latency_ms,
            max_latency_ms,
            packet_loss_percent,
        }))
    }
}

fn measure_endpoint(target: &str, label: &str, samples: usize) -> LatencyProbe {
    let mut timings = Vec::with_capacity(samples);
    for _ in 0..samples {
        timings.push(time_connect(target));
    }
    summarize_samples(target, label, &timings)
}

/// One timed connect. Name resolution happens before the clock starts so a
/// slow resolver does not masquerade as path latency.
fn time_connect(target: &str) -> Option<f64> {
    let addr = target.to_socket_addrs().ok()?.next()?;
    let start = Instant::now();
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).ok()?;
    Some(start.elapsed().as_secs_f64() * 1000.0)
}

fn time_resolution(host: &str) -> Option<f64> {
    let start = Instant::now();
    let resolved = (host, 443).to_socket_addrs().ok()?.next().is_some();
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
    if resolved {
        Some(round1(elapsed))
    } else {
        None
    }
}

fn summarize_samples(target: &str, label: &str, samples: &[Option<f64>]) -> LatencyProbe {
    let hits: Vec<f64> = samples.iter().flatten().copied().collect();
    let sent = samples.len().max(1);
    let loss_percent = ((sent - hits.len()) as f64 / sent as f64 * 1000.0).round() / 10.0;

    let mut probe = LatencyProbe {
        target: target.to_string(),
        label: label.to_string(),
        loss_percent,
        ..Default::default()
    };
    if hits.is_empty() {
        return probe;
    }

    probe.avg_ms = round1(hits.iter().sum::<f64>() / hits.len() as f64);
    probe.min_ms = round1(hits.iter().copied().fold(f64::INFINITY, f64::min));
    probe.max_ms = round1(hits.iter().copied().fold(0.0, f64::max));
    probe.jitter_ms = round1(jitter(&hits));
    probe
}

/// Mean absolute difference between consecutive samples.
fn jitter(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let total: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / (values.len() - 1) as f64
}

/// Roll the per-endpoint numbers up. A single dead endpoint is that
/// endpoint's problem, so worst loss is taken over hosts that answered at
/// all; with nothing reachable every aggregate stays unknown.
fn aggregate(probes: &[LatencyProbe]) -> (Option<f64>, Option<f64>, Option<f64>) {
    let reachable: Vec<&LatencyProbe> = probes.iter().filter(|p| p.loss_percent < 100.0).collect();
    if reachable.is_empty() {
        return (None, None, None);
    }

    let avg = reachable.iter().map(|p| p.avg_ms).sum::<f64>() / reachable.len() as f64;
    let max = reachable.iter().map(|p| p.max_ms).fold(0.0, f64::max);
    let loss = reachable.iter().map(|p| p.loss_percent).fold(0.0, f64::max);
    (Some(round1(avg)), Some(round1(max)), Some(loss))
}

/// Pick the link kind of the busiest recognizable interface.
fn detect_link_kind() -> Option<LinkKind> {
    let networks = Networks::new_with_refreshed_list();
    let mut best: Option<(u64, LinkKind)> = None;
    for (name, data) in networks.iter() {
        let Some(kind) = classify_interface(name) else {
            continue;
        };
        let traffic = data.total_received() + data.total_transmitted();
        if best.map_or(true, |(t, _)| traffic > t) {
            best = Some((traffic, kind));
        }
    }
    best.map(|(_, kind)| kind)
}

fn classify_interface(name: &str) -> Option<LinkKind> {
    let lower = name.to_lowercase();
    if ["wi-fi", "wifi", "wlan", "wireless"]
        .iter()
        .any(|p| lower.contains(p))
    {
        return Some(LinkKind::Wifi);
    }
    if ["ethernet", "eth", "enp", "local area connection"]
        .iter()
        .any(|p| lower.contains(p))
    {
        return Some(LinkKind::Ethernet);
    }
    None
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
