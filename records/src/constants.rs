//! Test kinds and their fixed record field sets

/// Column order of a Speedtest record
pub const SPEEDTEST_FIELDS: [&str; 11] = [
    "timestamp",
    "server_name",
    "ping_time",
    "download_rate",
    "upload_rate",
    "ssid",
    "bssid",
    "freq",
    "bit_rate",
    "signal_level",
    "ip_address",
];

/// Column order of a Ping record
pub const PING_FIELDS: [&str; 9] = [
    "ping_host",
    "pkts_tx",
    "pkts_rx",
    "percent_loss",
    "test_time",
    "rtt_min",
    "rtt_avg",
    "rtt_max",
    "rtt_mdev",
];

/// Column order of an iperf3 TCP record
pub const IPERF3_TCP_FIELDS: [&str; 5] = [
    "sent_mbps",
    "received_mbps",
    "sent_bytes",
    "received_bytes",
    "retransmits",
];

/// Column order of an iperf3 UDP record
pub const IPERF3_UDP_FIELDS: [&str; 6] = [
    "bytes",
    "mbps",
    "jitter_ms",
    "packets",
    "lost_packets",
    "lost_percent",
];

/// Test kinds, declared in the order the agent runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    /// Public speed test (download/upload/latency)
    Speedtest,

    /// ICMP echo test
    Ping,

    /// iperf3 TCP transfer
    Iperf3Tcp,

    /// iperf3 UDP transfer
    Iperf3Udp,
}

impl TestKind {
    /// Every kind in execution order
    pub const ALL: [TestKind; 4] = [
        TestKind::Speedtest,
        TestKind::Ping,
        TestKind::Iperf3Tcp,
        TestKind::Iperf3Udp,
    ];

    /// Fixed field set of this kind's record, in column order
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            TestKind::Speedtest => &SPEEDTEST_FIELDS,
            TestKind::Ping => &PING_FIELDS,
            TestKind::Iperf3Tcp => &IPERF3_TCP_FIELDS,
            TestKind::Iperf3Udp => &IPERF3_UDP_FIELDS,
        }
    }

    /// Human readable name used in log lines
    pub fn label(self) -> &'static str {
        match self {
            TestKind::Speedtest => "Speedtest",
            TestKind::Ping => "Ping test",
            TestKind::Iperf3Tcp => "Iperf3 tcp test",
            TestKind::Iperf3Udp => "Iperf3 udp test",
        }
    }

    /// Name of the config section that controls this kind
    pub fn config_section(self) -> &'static str {
        match self {
            TestKind::Speedtest => "Speedtest",
            TestKind::Ping => "Ping_Test",
            TestKind::Iperf3Tcp => "Iperf3_tcp_test",
            TestKind::Iperf3Udp => "Iperf3_udp_test",
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
