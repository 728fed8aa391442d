//! iperf3 TCP/UDP client tests

use super::{Iperf3Client, run_tool};
use records::{TcpResult, TestError, UdpResult};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

const TOOL: &str = "iperf3";

#[derive(Debug, Default)]
pub struct Iperf3Cli;

impl Iperf3Cli {
    pub fn new() -> Self {
        Self
    }
}

impl Iperf3Client for Iperf3Cli {
    async fn tcp(&self, host: &str, port: u16, duration: u64) -> Result<TcpResult, TestError> {
        let args = client_args(host, port, duration);
        let output = run_tool(TOOL, &args).await?;

        let report: TcpReport = parse_report(&output.stdout).map_err(|e| match e {
            TestError::Parse { .. } if !output.status.success() => output.failure(),
            e => e,
        })?;

        let sent = report.end.sum_sent;
        let received = report.end.sum_received;

        Ok(TcpResult {
            sent_mbps: sent.bits_per_second / 1_000_000.0,
            received_mbps: received.bits_per_second / 1_000_000.0,
            sent_bytes: sent.bytes,
            received_bytes: received.bytes,
            retransmits: sent.retransmits,
        })
    }

    async fn udp(
        &self,
        host: &str,
        port: u16,
        duration: u64,
        bandwidth: u64,
    ) -> Result<UdpResult, TestError> {
        let mut args = client_args(host, port, duration);
        args.extend(["-u".to_string(), "-b".to_string(), bandwidth.to_string()]);
        let output = run_tool(TOOL, &args).await?;

        let report: UdpReport = parse_report(&output.stdout).map_err(|e| match e {
            TestError::Parse { .. } if !output.status.success() => output.failure(),
            e => e,
        })?;

        let sum = report.end.sum;

        Ok(UdpResult {
            bytes: sum.bytes,
            mbps: sum.bits_per_second / 1_000_000.0,
            jitter_ms: sum.jitter_ms,
            packets: sum.packets,
            lost_packets: sum.lost_packets,
            lost_percent: sum.lost_percent,
        })
    }
}

fn client_args(host: &str, port: u16, duration: u64) -> Vec<String> {
    vec![
        "-c".to_string(),
        host.to_string(),
        "-p".to_string(),
        port.to_string(),
        "-t".to_string(),
        duration.to_string(),
        "-J".to_string(),
    ]
}

#[derive(Debug, Deserialize)]
struct TcpReport {
    end: TcpEnd,
}

#[derive(Debug, Deserialize)]
struct TcpEnd {
    sum_sent: TcpSum,
    sum_received: TcpSum,
}

#[derive(Debug, Deserialize)]
struct TcpSum {
    bytes: u64,
    bits_per_second: f64,
    #[serde(default)]
    retransmits: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UdpReport {
    end: UdpEnd,
}

#[derive(Debug, Deserialize)]
struct UdpEnd {
    sum: UdpSum,
}

#[derive(Debug, Deserialize)]
struct UdpSum {
    bytes: u64,
    bits_per_second: f64,
    jitter_ms: f64,
    packets: u64,
    lost_packets: u64,
    lost_percent: f64,
}

/// Decode `iperf3 -J` output. A top-level `error` key is iperf3's own
/// failure report and wins over everything else.
fn parse_report<T: DeserializeOwned>(stdout: &str) -> Result<T, TestError> {
    let value: Value =
        serde_json::from_str(stdout).map_err(|e| TestError::parse(TOOL, e.to_string()))?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(TestError::Reported(error.to_string()));
    }

    serde_json::from_value(value).map_err(|e| TestError::parse(TOOL, e.to_string()))
}
