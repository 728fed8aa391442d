//! In-memory fakes for the adapter, resolver, testers and sink

use crate::adapter::{AdapterError, AdapterProbe, LinkInfo};
use crate::dns::Resolver;
use crate::storage::{ResultSink, SinkError};
use crate::testing::{ConnectivityProber, Iperf3Client, SpeedtestClient};
use records::{
    AdapterSnapshot, NOT_AVAILABLE, PingResult, ResultRecord, SpeedtestResult, TcpResult,
    TestError, UdpResult,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

pub fn healthy_link() -> LinkInfo {
    LinkInfo {
        ssid: "home".into(),
        bssid: "AA:BB".into(),
        freq: "5180".into(),
        bit_rate: Some(866.0),
        signal_level: Some(-45),
    }
}

pub fn scenario_snapshot() -> AdapterSnapshot {
    healthy_link().with_ip("192.168.1.5".into())
}

/// Ping statistics with a fixed 12.5ms average
pub fn ping_result(tx: u32, rx: u32) -> PingResult {
    PingResult {
        host: "192.168.1.1".into(),
        pkts_tx: tx,
        pkts_rx: rx,
        pkt_loss: f64::from(tx - rx) * 100.0 / f64::from(tx),
        test_time: f64::from(tx) * 1000.0,
        rtt_min: 10.0,
        rtt_avg: 12.5,
        rtt_max: 15.0,
        rtt_mdev: 1.2,
    }
}

fn command_failed(detail: &str) -> AdapterError {
    AdapterError::CommandFailed {
        command: "fake".into(),
        detail: detail.into(),
    }
}

pub struct FakeAdapter {
    link: Result<LinkInfo, String>,
    ip: Result<String, String>,
    calls: RefCell<Vec<&'static str>>,
    resets: Cell<u32>,
}

impl FakeAdapter {
    pub fn healthy() -> Self {
        Self {
            link: Ok(healthy_link()),
            ip: Ok("192.168.1.5".into()),
            calls: RefCell::new(Vec::new()),
            resets: Cell::new(0),
        }
    }

    pub fn not_associated() -> Self {
        Self {
            link: Ok(LinkInfo::not_associated()),
            ip: Ok(NOT_AVAILABLE.into()),
            ..Self::healthy()
        }
    }

    pub fn failing_link(mut self, detail: &str) -> Self {
        self.link = Err(detail.into());
        self
    }

    pub fn failing_ip(mut self, detail: &str) -> Self {
        self.ip = Err(detail.into());
        self
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = Ok(ip.into());
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn resets(&self) -> u32 {
        self.resets.get()
    }
}

impl AdapterProbe for FakeAdapter {
    async fn query_link(&self) -> Result<LinkInfo, AdapterError> {
        self.calls.borrow_mut().push("query_link");
        self.link.clone().map_err(|e| command_failed(&e))
    }

    async fn query_ip(&self) -> Result<String, AdapterError> {
        self.calls.borrow_mut().push("query_ip");
        self.ip.clone().map_err(|e| command_failed(&e))
    }

    async fn reset(&self) {
        self.calls.borrow_mut().push("reset");
        self.resets.set(self.resets.get() + 1);
    }
}

pub struct FakeResolver {
    error: Option<String>,
    lookups: RefCell<Vec<String>>,
}

impl FakeResolver {
    pub fn ok() -> Self {
        Self {
            error: None,
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            error: Some(detail.into()),
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

impl Resolver for FakeResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.lookups.borrow_mut().push(host.to_string());
        match &self.error {
            Some(detail) => Err(io::Error::other(detail.clone())),
            None => Ok(vec![IpAddr::from([151, 101, 0, 81])]),
        }
    }
}

/// Replays queued ping results; the last one repeats once the queue drains
pub struct FakeProber {
    responses: RefCell<VecDeque<Result<PingResult, String>>>,
    fallback: Result<PingResult, String>,
    calls: RefCell<Vec<(String, u32)>>,
}

impl FakeProber {
    pub fn replying(result: PingResult) -> Self {
        Self::sequence(vec![Ok(result)])
    }

    pub fn sequence(responses: Vec<Result<PingResult, String>>) -> Self {
        let fallback = responses
            .last()
            .cloned()
            .unwrap_or_else(|| Err("no response configured".into()));
        Self {
            responses: RefCell::new(responses.into()),
            fallback,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.borrow().clone()
    }
}

impl ConnectivityProber for FakeProber {
    async fn ping(&self, host: &str, count: u32) -> Result<PingResult, TestError> {
        self.calls.borrow_mut().push((host.to_string(), count));
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        response.map_err(TestError::Reported)
    }
}

pub struct FakeSpeedtest {
    result: Result<SpeedtestResult, String>,
    calls: Cell<u32>,
}

impl FakeSpeedtest {
    pub fn ok(result: SpeedtestResult) -> Self {
        Self {
            result: Ok(result),
            calls: Cell::new(0),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            result: Err(detail.into()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl SpeedtestClient for FakeSpeedtest {
    async fn run(&self) -> Result<SpeedtestResult, TestError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone().map_err(TestError::Reported)
    }
}

pub struct FakeIperf {
    tcp: Result<TcpResult, String>,
    udp: Result<UdpResult, String>,
    calls: RefCell<Vec<&'static str>>,
}

impl FakeIperf {
    pub fn ok(tcp: TcpResult, udp: UdpResult) -> Self {
        Self {
            tcp: Ok(tcp),
            udp: Ok(udp),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            tcp: Err(detail.into()),
            udp: Err(detail.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn tcp_failing(detail: &str, udp: UdpResult) -> Self {
        Self {
            tcp: Err(detail.into()),
            udp: Ok(udp),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl Iperf3Client for FakeIperf {
    async fn tcp(&self, _host: &str, _port: u16, _duration: u64) -> Result<TcpResult, TestError> {
        self.calls.borrow_mut().push("tcp");
        self.tcp.clone().map_err(TestError::Reported)
    }

    async fn udp(
        &self,
        _host: &str,
        _port: u16,
        _duration: u64,
        _bandwidth: u64,
    ) -> Result<UdpResult, TestError> {
        self.calls.borrow_mut().push("udp");
        self.udp.clone().map_err(TestError::Reported)
    }
}

/// Keeps written records in memory, or fails every write
#[derive(Default)]
pub struct MemorySink {
    fail: bool,
    writes: RefCell<Vec<(PathBuf, ResultRecord)>>,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(PathBuf, ResultRecord)> {
        self.writes.borrow().clone()
    }
}

impl ResultSink for MemorySink {
    fn write(&self, path: &Path, record: &ResultRecord) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Io {
                path: path.display().to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only filesystem"),
            });
        }
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), record.clone()));
        Ok(())
    }
}
