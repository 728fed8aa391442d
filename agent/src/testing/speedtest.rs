//! Speed test via the Ookla `speedtest` CLI

use super::{SpeedtestClient, run_tool};
use records::{SpeedtestResult, TestError};
use serde::Deserialize;
use serde_json::Value;

const TOOL: &str = "speedtest";

#[derive(Debug, Default)]
pub struct OoklaSpeedtest;

impl OoklaSpeedtest {
    pub fn new() -> Self {
        Self
    }
}

impl SpeedtestClient for OoklaSpeedtest {
    async fn run(&self) -> Result<SpeedtestResult, TestError> {
        let args = ["--accept-license", "--accept-gdpr", "--format=json"].map(String::from);
        let output = run_tool(TOOL, &args).await?;

        match parse_report(&output.stdout) {
            Ok(result) if output.status.success() => Ok(result),
            Ok(_) => Err(output.failure()),
            Err(TestError::Parse { .. }) if !output.status.success() => Err(output.failure()),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Report {
    ping: Latency,
    download: Transfer,
    upload: Transfer,
    server: Server,
}

#[derive(Debug, Deserialize)]
struct Latency {
    /// Milliseconds
    latency: f64,
}

#[derive(Debug, Deserialize)]
struct Transfer {
    /// Bytes per second
    bandwidth: f64,
}

#[derive(Debug, Deserialize)]
struct Server {
    name: String,
}

/// The CLI prints one JSON object per line: log entries while it runs and
/// a final object of type "result".
fn parse_report(stdout: &str) -> Result<SpeedtestResult, TestError> {
    let mut reported_error = None;

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let value: Value = serde_json::from_str(line).map_err(|e| TestError::parse(TOOL, e.to_string()))?;

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(TestError::Reported(error.to_string()));
        }

        match value.get("type").and_then(Value::as_str) {
            Some("result") => {
                let report: Report =
                    serde_json::from_value(value).map_err(|e| TestError::parse(TOOL, e.to_string()))?;
                return Ok(SpeedtestResult {
                    server_name: report.server.name,
                    ping_time: report.ping.latency,
                    download_rate: to_mbps(report.download.bandwidth),
                    upload_rate: to_mbps(report.upload.bandwidth),
                });
            }
            Some("log") if value.get("level").and_then(Value::as_str) == Some("error") => {
                reported_error = value.get("message").and_then(Value::as_str).map(str::to_string);
            }
            _ => {}
        }
    }

    Err(match reported_error {
        Some(message) => TestError::Reported(message),
        None => TestError::parse(TOOL, "no result in output"),
    })
}

/// Bytes per second to Mbit/s, two decimal places
fn to_mbps(bytes_per_sec: f64) -> f64 {
    (bytes_per_sec * 8.0 / 1_000_000.0 * 100.0).round() / 100.0
}
