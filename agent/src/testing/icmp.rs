//! ICMP ping testing

use super::ConnectivityProber;
use records::{PingResult, TestError};
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use surge_ping::{Client, Config as PingConfig, ICMP, PingIdentifier, PingSequence};
use tracing::debug;

/// Gap between echo requests, matching `ping`'s default
const PING_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for each echo reply
const ECHO_TIMEOUT: Duration = Duration::from_secs(2);

/// Standard ping payload size
const PAYLOAD: [u8; 56] = [0u8; 56];

/// Raw-socket ICMP prober (CAP_NET_RAW required)
#[derive(Debug, Default)]
pub struct IcmpProber;

impl IcmpProber {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectivityProber for IcmpProber {
    async fn ping(&self, host: &str, count: u32) -> Result<PingResult, TestError> {
        let sequences = sequence_numbers(count)?;
        let target = resolve(host).await?;

        let config = match target {
            IpAddr::V4(_) => PingConfig::default(),
            IpAddr::V6(_) => PingConfig::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|source| TestError::Spawn {
            tool: "icmp socket",
            source,
        })?;

        let mut pinger = client.pinger(target, PingIdentifier(rand::random())).await;
        let mut interval = tokio::time::interval(PING_INTERVAL);
        let mut rtts = Vec::new();

        let started = Instant::now();

        for seq in sequences {
            interval.tick().await;

            match tokio::time::timeout(ECHO_TIMEOUT, pinger.ping(PingSequence(seq), &PAYLOAD))
                .await
            {
                Ok(Ok((_packet, rtt))) => {
                    let rtt_ms = rtt.as_secs_f64() * 1000.0;
                    debug!("ICMP {} seq={} -> {:.3}ms", target, seq, rtt_ms);
                    rtts.push(rtt_ms);
                }
                Ok(Err(e)) => debug!("ICMP {} seq={} -> error: {}", target, seq, e),
                Err(_) => debug!("ICMP {} seq={} -> timeout", target, seq),
            }
        }

        let test_time = started.elapsed().as_secs_f64() * 1000.0;

        summarize(host, count, &rtts, test_time)
    }
}

/// One echo per 16-bit sequence number, so at most 65536 per run
fn sequence_numbers(count: u32) -> Result<RangeInclusive<u16>, TestError> {
    let last = count
        .checked_sub(1)
        .and_then(|last| u16::try_from(last).ok())
        .ok_or(TestError::InvalidCount(count))?;

    Ok(0..=last)
}

async fn resolve(host: &str) -> Result<IpAddr, TestError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| TestError::Resolve {
            host: host.to_string(),
            detail: e.to_string(),
        })?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| TestError::Resolve {
            host: host.to_string(),
            detail: "no addresses found".to_string(),
        })
}

/// Reduce individual round-trip times (ms) to `ping`-style statistics.
/// `mdev` is the population standard deviation.
fn summarize(host: &str, sent: u32, rtts: &[f64], test_time: f64) -> Result<PingResult, TestError> {
    if rtts.is_empty() {
        return Err(TestError::NoReplies {
            host: host.to_string(),
            sent,
        });
    }

    let received = rtts.len() as u32;
    let n = rtts.len() as f64;

    let min = rtts.iter().copied().fold(f64::INFINITY, f64::min);
    let max = rtts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = rtts.iter().sum::<f64>() / n;
    let mean_sq = rtts.iter().map(|r| r * r).sum::<f64>() / n;
    let mdev = (mean_sq - avg * avg).max(0.0).sqrt();

    Ok(PingResult {
        host: host.to_string(),
        pkts_tx: sent,
        pkts_rx: received,
        pkt_loss: f64::from(sent - received) * 100.0 / f64::from(sent),
        test_time: test_time.round(),
        rtt_min: round3(min),
        rtt_avg: round3(avg),
        rtt_max: round3(max),
        rtt_mdev: round3(mdev),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
