//! Test orchestration
//!
//! Runs every enabled test once, in the fixed order Speedtest, Ping,
//! Iperf3 TCP, Iperf3 UDP. A test's failure is logged and contained: no
//! record is written for it and the next test still runs.

use super::{ConnectivityProber, Iperf3Client, SpeedtestClient};
use crate::config::RunConfig;
use crate::storage::ResultSink;
use records::{AdapterSnapshot, TestError, TestKind, TestResult};
use std::path::Path;
use tracing::{debug, error, info};

/// What happened to a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// Not enabled in the config
    Skipped,
    /// Ran and its record was written
    Written,
    /// The tester reported an error
    Failed,
    /// Ran, but the sink could not write the record
    WriteFailed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<(TestKind, TestOutcome)>,
}

impl RunSummary {
    #[cfg(test)]
    pub fn outcome(&self, kind: TestKind) -> Option<TestOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| *outcome)
    }

    pub fn count(&self, outcome: TestOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Test orchestrator
pub struct TestRunner<'a, P, S, I> {
    config: &'a RunConfig,
    snapshot: &'a AdapterSnapshot,
    prober: &'a P,
    speedtest: &'a S,
    iperf: &'a I,
    sink: &'a dyn ResultSink,
}

impl<'a, P, S, I> TestRunner<'a, P, S, I>
where
    P: ConnectivityProber,
    S: SpeedtestClient,
    I: Iperf3Client,
{
    /// `snapshot` must be the link state validated by preflight
    pub fn new(
        config: &'a RunConfig,
        snapshot: &'a AdapterSnapshot,
        prober: &'a P,
        speedtest: &'a S,
        iperf: &'a I,
        sink: &'a dyn ResultSink,
    ) -> Self {
        Self {
            config,
            snapshot,
            prober,
            speedtest,
            iperf,
            sink,
        }
    }

    pub async fn run_all(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for kind in TestKind::ALL {
            let outcome = self.run_test(kind).await;
            summary.outcomes.push((kind, outcome));
        }

        summary
    }

    async fn run_test(&self, kind: TestKind) -> TestOutcome {
        let (output, result) = match kind {
            TestKind::Speedtest => {
                let Some(settings) = &self.config.speedtest else {
                    return skip(kind);
                };
                info!("Starting speedtest...");
                (&settings.output, self.run_speedtest().await)
            }
            TestKind::Ping => {
                let Some(settings) = &self.config.ping else {
                    return skip(kind);
                };
                info!("Starting ping test...");
                (&settings.output, self.run_ping(&settings.host, settings.count).await)
            }
            TestKind::Iperf3Tcp => {
                let Some(settings) = &self.config.iperf3_tcp else {
                    return skip(kind);
                };
                info!("Starting iperf3 tcp test...");
                let result = self
                    .iperf
                    .tcp(&settings.server_hostname, settings.port, settings.duration)
                    .await
                    .map(TestResult::Iperf3Tcp);
                (&settings.output, result)
            }
            TestKind::Iperf3Udp => {
                let Some(settings) = &self.config.iperf3_udp else {
                    return skip(kind);
                };
                info!("Starting iperf3 udp test...");
                let result = self
                    .iperf
                    .udp(
                        &settings.server_hostname,
                        settings.port,
                        settings.duration,
                        settings.bandwidth,
                    )
                    .await
                    .map(TestResult::Iperf3Udp);
                (&settings.output, result)
            }
        };

        match result {
            Ok(result) => self.persist(&result, output),
            Err(e) => {
                error!("Error with {}: {}", kind.label().to_lowercase(), e);
                TestOutcome::Failed
            }
        }
    }

    async fn run_speedtest(&self) -> Result<TestResult, TestError> {
        let result = self.speedtest.run().await?;

        Ok(TestResult::Speedtest {
            result,
            link: self.snapshot.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    async fn run_ping(&self, host: &str, count: u32) -> Result<TestResult, TestError> {
        // Warm the ARP cache so the first measured echo doesn't pay for resolution
        if let Err(e) = self.prober.ping(host, 1).await {
            debug!("Warm-up ping to {} failed: {}", host, e);
        }

        self.prober.ping(host, count).await.map(TestResult::Ping)
    }

    fn persist(&self, result: &TestResult, output: &Path) -> TestOutcome {
        let kind = result.kind();
        info!("{}", result.summary());

        match self.sink.write(output, &result.to_record()) {
            Ok(()) => {
                info!("{} ended.", kind);
                TestOutcome::Written
            }
            Err(e) => {
                error!("Failed to write {} results to {:?}: {}", kind.label().to_lowercase(), output, e);
                TestOutcome::WriteFailed
            }
        }
    }
}

fn skip(kind: TestKind) -> TestOutcome {
    info!("{} not enabled in config file, bypassing this test...", kind);
    TestOutcome::Skipped
}
