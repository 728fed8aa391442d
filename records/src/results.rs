//! Raw test results and their normalized records
//!
//! Each tester produces its own result shape. [`TestResult`] closes over the
//! four shapes and turns any of them into a [`ResultRecord`] carrying the
//! kind's complete, fixed field set, so the write path never has to know
//! which test produced it.

use crate::constants::TestKind;
use serde_json::{Map, Value};

/// Point-in-time read of the wireless link
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSnapshot {
    /// Network name ("NA" when not associated)
    pub ssid: String,

    /// Access point MAC ("NA" when not associated)
    pub bssid: String,

    /// Channel centre frequency in MHz, as reported by the adapter
    pub freq: String,

    /// Transmit bit rate in Mbit/s
    pub bit_rate: Option<f64>,

    /// Signal level in dBm
    pub signal_level: Option<i32>,

    /// IPv4 address of the interface ("NA" when unset)
    pub ip_address: String,
}

/// Speed test measurement
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedtestResult {
    pub server_name: String,

    /// Latency to the test server in milliseconds
    pub ping_time: f64,

    /// Download rate in Mbit/s
    pub download_rate: f64,

    /// Upload rate in Mbit/s
    pub upload_rate: f64,
}

/// ICMP echo statistics
#[derive(Debug, Clone, PartialEq)]
pub struct PingResult {
    pub host: String,
    pub pkts_tx: u32,
    pub pkts_rx: u32,

    /// Packet loss percentage exactly as the prober reported it
    pub pkt_loss: f64,

    /// Total test duration in milliseconds
    pub test_time: f64,

    pub rtt_min: f64,
    pub rtt_avg: f64,
    pub rtt_max: f64,
    pub rtt_mdev: f64,
}

/// iperf3 TCP transfer summary
#[derive(Debug, Clone, PartialEq)]
pub struct TcpResult {
    pub sent_mbps: f64,
    pub received_mbps: f64,
    pub sent_bytes: u64,
    pub received_bytes: u64,

    /// Not reported by every platform's iperf3
    pub retransmits: Option<u64>,
}

/// iperf3 UDP transfer summary
#[derive(Debug, Clone, PartialEq)]
pub struct UdpResult {
    pub bytes: u64,
    pub mbps: f64,
    pub jitter_ms: f64,
    pub packets: u64,
    pub lost_packets: u64,
    pub lost_percent: f64,
}

/// A successful result of any test kind
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Speedtest {
        result: SpeedtestResult,
        /// Link state validated during preflight
        link: AdapterSnapshot,
        /// Unix epoch seconds
        timestamp: i64,
    },
    Ping(PingResult),
    Iperf3Tcp(TcpResult),
    Iperf3Udp(UdpResult),
}

impl TestResult {
    pub fn kind(&self) -> TestKind {
        match self {
            TestResult::Speedtest { .. } => TestKind::Speedtest,
            TestResult::Ping(_) => TestKind::Ping,
            TestResult::Iperf3Tcp(_) => TestKind::Iperf3Tcp,
            TestResult::Iperf3Udp(_) => TestKind::Iperf3Udp,
        }
    }

    /// Normalize into the kind's fixed field set
    pub fn to_record(&self) -> ResultRecord {
        let values: Vec<Value> = match self {
            TestResult::Speedtest {
                result,
                link,
                timestamp,
            } => vec![
                Value::from(*timestamp),
                Value::from(result.server_name.as_str()),
                Value::from(result.ping_time),
                Value::from(result.download_rate),
                Value::from(result.upload_rate),
                Value::from(link.ssid.as_str()),
                Value::from(link.bssid.as_str()),
                Value::from(link.freq.as_str()),
                Value::from(link.bit_rate),
                Value::from(link.signal_level),
                Value::from(link.ip_address.as_str()),
            ],
            TestResult::Ping(p) => vec![
                Value::from(p.host.as_str()),
                Value::from(p.pkts_tx),
                Value::from(p.pkts_rx),
                Value::from(p.pkt_loss),
                Value::from(p.test_time),
                Value::from(p.rtt_min),
                Value::from(p.rtt_avg),
                Value::from(p.rtt_max),
                Value::from(p.rtt_mdev),
            ],
            TestResult::Iperf3Tcp(t) => vec![
                Value::from(t.sent_mbps),
                Value::from(t.received_mbps),
                Value::from(t.sent_bytes),
                Value::from(t.received_bytes),
                Value::from(t.retransmits),
            ],
            TestResult::Iperf3Udp(u) => vec![
                Value::from(u.bytes),
                Value::from(u.mbps),
                Value::from(u.jitter_ms),
                Value::from(u.packets),
                Value::from(u.lost_packets),
                Value::from(u.lost_percent),
            ],
        };

        ResultRecord::new(self.kind(), values)
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        match self {
            TestResult::Speedtest { result, .. } => format!(
                "Speedtest results - server: {}, ping_time: {}, download_rate: {}, upload_rate: {}",
                result.server_name, result.ping_time, result.download_rate, result.upload_rate
            ),
            TestResult::Ping(p) => format!(
                "Ping results - host: {}, pkts_tx: {}, pkts_rx: {}, percent_loss: {}, rtt_avg: {}",
                p.host, p.pkts_tx, p.pkts_rx, p.pkt_loss, p.rtt_avg
            ),
            TestResult::Iperf3Tcp(t) => format!(
                "Iperf3 tcp results - rx_mbps: {}, tx_mbps: {}, retransmits: {}",
                t.received_mbps,
                t.sent_mbps,
                t.retransmits.map_or_else(|| "NA".to_string(), |r| r.to_string())
            ),
            TestResult::Iperf3Udp(u) => format!(
                "Iperf3 udp results - mbps: {}, packets: {}, lost_packets: {}, lost_percent: {}",
                u.mbps, u.packets, u.lost_packets, u.lost_percent
            ),
        }
    }
}

/// Sink-facing form of a result: the kind's field order plus one value per field
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    kind: TestKind,
    values: Map<String, Value>,
}

impl ResultRecord {
    /// Pair `values` positionally with the kind's field order.
    ///
    /// Panics if the number of values differs from the field set; every
    /// caller builds its values from a fixed-size list for its own kind.
    fn new(kind: TestKind, values: Vec<Value>) -> Self {
        let fields = kind.fields();
        assert_eq!(fields.len(), values.len(), "value count mismatch for {}", kind);

        let values = fields
            .iter()
            .map(|f| f.to_string())
            .zip(values)
            .collect::<Map<String, Value>>();

        Self { kind, values }
    }

    pub fn kind(&self) -> TestKind {
        self.kind
    }

    /// Column order
    pub fn fields(&self) -> &'static [&'static str] {
        self.kind.fields()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Values keyed by field name, iterating in column order
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}
