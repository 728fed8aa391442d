//! Network test execution
//!
//! Each tester sits behind a small capability trait so the [`TestRunner`]
//! can be driven by in-memory fakes in tests. Production implementations
//! use raw ICMP for ping and shell out to the `speedtest` and `iperf3` CLIs.

mod icmp;
mod iperf;
mod runner;
mod speedtest;

pub use icmp::IcmpProber;
pub use iperf::Iperf3Cli;
pub use runner::{TestOutcome, TestRunner};
pub use speedtest::OoklaSpeedtest;

use records::{PingResult, SpeedtestResult, TcpResult, TestError, UdpResult};
use tokio::process::Command;
use tracing::debug;

/// Sends ICMP echo requests and reports their statistics
pub trait ConnectivityProber {
    async fn ping(&self, host: &str, count: u32) -> Result<PingResult, TestError>;
}

/// Runs one speed test against the public test-server network
pub trait SpeedtestClient {
    async fn run(&self) -> Result<SpeedtestResult, TestError>;
}

/// iperf3 client for TCP and UDP transfer tests
pub trait Iperf3Client {
    /// `duration` is in seconds
    async fn tcp(&self, host: &str, port: u16, duration: u64) -> Result<TcpResult, TestError>;

    /// `bandwidth` is the target rate in bits per second
    async fn udp(
        &self,
        host: &str,
        port: u16,
        duration: u64,
        bandwidth: u64,
    ) -> Result<UdpResult, TestError>;
}

/// Captured output of an external test tool
struct ToolOutput {
    tool: &'static str,
    status: std::process::ExitStatus,
    stdout: String,
    stderr: String,
}

impl ToolOutput {
    fn failure(&self) -> TestError {
        TestError::ToolFailed {
            tool: self.tool,
            status: self.status.to_string(),
            stderr: self.stderr.trim().to_string(),
        }
    }
}

/// Run `tool` to completion. A non-zero exit is not an error here: some
/// tools still print a machine-readable error report on stdout.
async fn run_tool(tool: &'static str, args: &[String]) -> Result<ToolOutput, TestError> {
    debug!("Running {} {}", tool, args.join(" "));

    let output = Command::new(tool)
        .args(args)
        .output()
        .await
        .map_err(|source| TestError::Spawn { tool, source })?;

    Ok(ToolOutput {
        tool,
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
