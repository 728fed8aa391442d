//! Linux wireless adapter probe using `iw` and `ip`

use super::{AdapterError, AdapterProbe, LinkInfo};
use records::NOT_AVAILABLE;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Pause between taking the interface down and bringing it back up
const RESET_SETTLE: Duration = Duration::from_secs(2);

pub struct IwAdapter {
    interface: String,
}

impl IwAdapter {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

impl AdapterProbe for IwAdapter {
    async fn query_link(&self) -> Result<LinkInfo, AdapterError> {
        let stdout = run("iw", &["dev", &self.interface, "link"]).await?;
        debug!("iw link output: {}", stdout);
        Ok(parse_iw_link(&stdout))
    }

    async fn query_ip(&self) -> Result<String, AdapterError> {
        let stdout = run("ip", &["-4", "-o", "addr", "show", "dev", &self.interface]).await?;
        debug!("ip addr output: {}", stdout);
        Ok(parse_ipv4_addr(&stdout).unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }

    async fn reset(&self) {
        info!("Bouncing interface {}", self.interface);

        if let Err(e) = run("ip", &["link", "set", "dev", &self.interface, "down"]).await {
            error!("Failed to bring {} down: {}", self.interface, e);
        }

        tokio::time::sleep(RESET_SETTLE).await;

        if let Err(e) = run("ip", &["link", "set", "dev", &self.interface, "up"]).await {
            error!("Failed to bring {} up: {}", self.interface, e);
        }
    }
}

async fn run(program: &str, args: &[&str]) -> Result<String, AdapterError> {
    let command = format!("{} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| AdapterError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(AdapterError::CommandFailed {
            command,
            detail: format!(
                "{} ({})",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `iw dev <if> link` output.
///
/// ```text
/// Connected to aa:bb:cc:dd:ee:ff (on wlan0)
///         SSID: home
///         freq: 5180
///         signal: -45 dBm
///         tx bitrate: 866.7 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 2
/// ```
fn parse_iw_link(output: &str) -> LinkInfo {
    let mut link = LinkInfo::not_associated();

    for line in output.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Connected to ") {
            if let Some(bssid) = rest.split_whitespace().next() {
                link.bssid = bssid.to_uppercase();
            }
        } else if let Some(ssid) = line.strip_prefix("SSID: ") {
            link.ssid = ssid.to_string();
        } else if let Some(freq) = line.strip_prefix("freq: ") {
            link.freq = freq.trim().to_string();
        } else if let Some(signal) = line.strip_prefix("signal: ") {
            link.signal_level = signal
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok());
        } else if let Some(rate) = line.strip_prefix("tx bitrate: ") {
            link.bit_rate = rate
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok());
        }
    }

    link
}

/// First `inet a.b.c.d/nn` address in `ip -4 -o addr show` output
fn parse_ipv4_addr(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let idx = parts.iter().position(|&p| p == "inet")?;
        let cidr = parts.get(idx + 1)?;
        cidr.split('/').next().map(str::to_string)
    })
}
