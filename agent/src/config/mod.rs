//! Configuration management
//!
//! The TOML file mirrors the agent's section layout (`[General]`,
//! `[Speedtest]`, `[Ping_Test]`, `[Iperf3_tcp_test]`, `[Iperf3_udp_test]`).
//! [`Config`] is the file as written; [`RunConfig`] is the validated,
//! immutable view the orchestrators work from.

use anyhow::{Context, Result, bail};
use records::TestKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Only this exact value enables a test
pub const ENABLED: &str = "yes";

/// ICMP sequence numbers are 16 bits wide
pub const MAX_PING_COUNT: u32 = u16::MAX as u32 + 1;

const MACHINE_ID_PATH: &str = "/etc/machine-id";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "General")]
    pub general: GeneralConfig,
    #[serde(rename = "Speedtest", default)]
    pub speedtest: SpeedtestSection,
    #[serde(rename = "Ping_Test", default)]
    pub ping: PingSection,
    #[serde(rename = "Iperf3_tcp_test", default)]
    pub iperf3_tcp: Iperf3TcpSection,
    #[serde(rename = "Iperf3_udp_test", default)]
    pub iperf3_udp: Iperf3UdpSection,
    #[serde(rename = "Logging", default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub wlan_if: String,
    pub platform: String,
    #[serde(default)]
    pub result_format: ResultFormat,
    #[serde(default = "default_dns_check_host")]
    pub dns_check_host: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeedtestSection {
    #[serde(default = "default_disabled")]
    pub enabled: String,
    pub speedtest_data_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingSection {
    #[serde(default = "default_disabled")]
    pub enabled: String,
    pub ping_data_file: Option<PathBuf>,
    pub ping_host: Option<String>,
    pub ping_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Iperf3TcpSection {
    #[serde(default = "default_disabled")]
    pub enabled: String,
    pub iperf3_tcp_data_file: Option<PathBuf>,
    pub server_hostname: Option<String>,
    pub port: Option<u16>,
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Iperf3UdpSection {
    #[serde(default = "default_disabled")]
    pub enabled: String,
    pub iperf3_udp_data_file: Option<PathBuf>,
    pub server_hostname: Option<String>,
    pub port: Option<u16>,
    pub duration: Option<u64>,
    /// Target bandwidth in bits per second
    pub bandwidth: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append log lines here instead of stderr
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            path: None,
        }
    }
}

fn default_dns_check_host() -> String {
    "bbc.co.uk".to_string()
}

fn default_disabled() -> String {
    "no".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse config file")
    }

    /// Validate into the immutable per-run view.
    ///
    /// A disabled section's parameters are never looked at; an enabled
    /// section must provide every key its test needs.
    pub fn into_run_config(self, machine_id: Option<String>) -> Result<RunConfig> {
        let speedtest = if is_enabled(&self.speedtest.enabled) {
            let section = TestKind::Speedtest.config_section();
            let s = self.speedtest;
            Some(SpeedtestSettings {
                output: require(section, "speedtest_data_file", s.speedtest_data_file)?,
            })
        } else {
            None
        };

        let ping = if is_enabled(&self.ping.enabled) {
            let section = TestKind::Ping.config_section();
            let s = self.ping;
            let count = require(section, "ping_count", s.ping_count)?;
            if !(1..=MAX_PING_COUNT).contains(&count) {
                bail!(
                    "[{}] 'ping_count' must be between 1 and {}, got {}",
                    section,
                    MAX_PING_COUNT,
                    count
                );
            }
            Some(PingSettings {
                output: require(section, "ping_data_file", s.ping_data_file)?,
                host: require(section, "ping_host", s.ping_host)?,
                count,
            })
        } else {
            None
        };

        let iperf3_tcp = if is_enabled(&self.iperf3_tcp.enabled) {
            let section = TestKind::Iperf3Tcp.config_section();
            let s = self.iperf3_tcp;
            Some(Iperf3TcpSettings {
                output: require(section, "iperf3_tcp_data_file", s.iperf3_tcp_data_file)?,
                server_hostname: require(section, "server_hostname", s.server_hostname)?,
                port: require(section, "port", s.port)?,
                duration: require(section, "duration", s.duration)?,
            })
        } else {
            None
        };

        let iperf3_udp = if is_enabled(&self.iperf3_udp.enabled) {
            let section = TestKind::Iperf3Udp.config_section();
            let s = self.iperf3_udp;
            Some(Iperf3UdpSettings {
                output: require(section, "iperf3_udp_data_file", s.iperf3_udp_data_file)?,
                server_hostname: require(section, "server_hostname", s.server_hostname)?,
                port: require(section, "port", s.port)?,
                duration: require(section, "duration", s.duration)?,
                bandwidth: require(section, "bandwidth", s.bandwidth)?,
            })
        } else {
            None
        };

        Ok(RunConfig {
            interface: self.general.wlan_if,
            platform: self.general.platform,
            result_format: self.general.result_format,
            dns_check_host: self.general.dns_check_host,
            machine_id,
            speedtest,
            ping,
            iperf3_tcp,
            iperf3_udp,
        })
    }
}

pub fn is_enabled(value: &str) -> bool {
    value == ENABLED
}

fn require<T>(section: &str, key: &str, value: Option<T>) -> Result<T> {
    value.with_context(|| format!("[{}] is enabled but '{}' is not set", section, key))
}

/// Unique device id, if the host has one
pub fn read_machine_id() -> Option<String> {
    match std::fs::read_to_string(MACHINE_ID_PATH) {
        Ok(id) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
        Err(e) => {
            debug!("No machine id available from {}: {}", MACHINE_ID_PATH, e);
            None
        }
    }
}

/// Validated configuration for a single run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub interface: String,
    pub platform: String,
    pub result_format: ResultFormat,
    pub dns_check_host: String,
    pub machine_id: Option<String>,
    /// `None` when the test is disabled
    pub speedtest: Option<SpeedtestSettings>,
    pub ping: Option<PingSettings>,
    pub iperf3_tcp: Option<Iperf3TcpSettings>,
    pub iperf3_udp: Option<Iperf3UdpSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedtestSettings {
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingSettings {
    pub output: PathBuf,
    pub host: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Iperf3TcpSettings {
    pub output: PathBuf,
    pub server_hostname: String,
    pub port: u16,
    /// Seconds
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Iperf3UdpSettings {
    pub output: PathBuf,
    pub server_hostname: String,
    pub port: u16,
    pub duration: u64,
    /// Bits per second
    pub bandwidth: u64,
}
