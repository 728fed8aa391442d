//! One probe run: preflight, then the test battery

use crate::adapter::AdapterProbe;
use crate::config::RunConfig;
use crate::dns::Resolver;
use crate::preflight::{self, Preflight, PreflightOutcome};
use crate::storage::ResultSink;
use crate::testing::{ConnectivityProber, Iperf3Client, SpeedtestClient, TestOutcome, TestRunner};
use std::process::ExitCode;
use tracing::info;

/// Run preflight and, if the link is healthy, every enabled test.
///
/// A failed preflight resets the adapter and ends the run with
/// `ExitCode::FAILURE` before any tester is touched. Test and write
/// failures never affect the exit status.
pub async fn run<A, R, P, S, I>(
    config: &RunConfig,
    adapter: &A,
    resolver: &R,
    prober: &P,
    speedtest: &S,
    iperf: &I,
    sink: &dyn ResultSink,
) -> ExitCode
where
    A: AdapterProbe,
    R: Resolver,
    P: ConnectivityProber,
    S: SpeedtestClient,
    I: Iperf3Client,
{
    let snapshot = match Preflight::new(adapter, resolver, &config.dns_check_host)
        .run()
        .await
    {
        PreflightOutcome::Healthy(snapshot) => snapshot,
        PreflightOutcome::Unhealthy(failure) => {
            preflight::recover(adapter, &failure).await;
            return ExitCode::FAILURE;
        }
    };

    let summary = TestRunner::new(config, &snapshot, prober, speedtest, iperf, sink)
        .run_all()
        .await;

    info!(
        "Run complete: {} written, {} failed, {} not written, {} skipped",
        summary.count(TestOutcome::Written),
        summary.count(TestOutcome::Failed),
        summary.count(TestOutcome::WriteFailed),
        summary.count(TestOutcome::Skipped)
    );

    ExitCode::SUCCESS
}
