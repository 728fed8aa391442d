//! Wireless adapter access
//!
//! The preflight checks only talk to the adapter through [`AdapterProbe`];
//! [`IwAdapter`] is the Linux implementation backed by `iw` and `ip`.

mod iw;

pub use iw::IwAdapter;

use records::{AdapterSnapshot, NOT_AVAILABLE};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: {detail}")]
    CommandFailed { command: String, detail: String },
}

/// Association details of the wireless link, without the IP layer
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    pub ssid: String,
    pub bssid: String,
    pub freq: String,
    pub bit_rate: Option<f64>,
    pub signal_level: Option<i32>,
}

impl LinkInfo {
    /// Link info of an adapter that is up but not associated
    pub fn not_associated() -> Self {
        Self {
            ssid: NOT_AVAILABLE.to_string(),
            bssid: NOT_AVAILABLE.to_string(),
            freq: NOT_AVAILABLE.to_string(),
            bit_rate: None,
            signal_level: None,
        }
    }

    pub fn is_associated(&self) -> bool {
        self.bssid != NOT_AVAILABLE
    }

    /// Complete the snapshot with the interface address
    pub fn with_ip(self, ip_address: String) -> AdapterSnapshot {
        AdapterSnapshot {
            ssid: self.ssid,
            bssid: self.bssid,
            freq: self.freq,
            bit_rate: self.bit_rate,
            signal_level: self.signal_level,
            ip_address,
        }
    }
}

/// Capability to inspect and reset the wireless interface
pub trait AdapterProbe {
    /// Read SSID, BSSID, frequency, bit rate and signal level.
    /// An unassociated adapter reports a BSSID of "NA".
    async fn query_link(&self) -> Result<LinkInfo, AdapterError>;

    /// Read the interface's IPv4 address, "NA" when it has none
    async fn query_ip(&self) -> Result<String, AdapterError>;

    /// Bounce the interface. Fire-and-forget: the outcome is only logged.
    async fn reset(&self);
}
