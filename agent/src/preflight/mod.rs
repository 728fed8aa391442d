//! Preflight link checks
//!
//! Before any test runs, the link must pass, in order:
//!
//! 1. the adapter answers a link query
//! 2. it is associated (BSSID is not "NA")
//! 3. it answers an IP query
//! 4. it has an address (IP is not "NA")
//! 5. an external hostname resolves
//!
//! The first failing check ends preflight. Every failure gets the same
//! remedy from [`recover`]: reset the interface and end the run, leaving the
//! test battery to the next scheduled invocation.

use crate::adapter::AdapterProbe;
use crate::dns::Resolver;
use records::{AdapterSnapshot, NOT_AVAILABLE};
use std::fmt;
use tracing::{error, info};

/// Which check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AdapterQueryFailed,
    NotAssociated,
    NoIpAddress,
    DnsResolutionFailed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::AdapterQueryFailed => "adapter-query-failed",
            Stage::NotAssociated => "not-associated",
            Stage::NoIpAddress => "no-ip-address",
            Stage::DnsResolutionFailed => "dns-resolution-failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightFailure {
    pub stage: Stage,
    pub reason: String,
}

impl PreflightFailure {
    fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PreflightFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreflightOutcome {
    /// Link is usable; the snapshot is the state that was validated
    Healthy(AdapterSnapshot),
    Unhealthy(PreflightFailure),
}

pub struct Preflight<'a, A, R> {
    adapter: &'a A,
    resolver: &'a R,
    dns_check_host: &'a str,
}

impl<'a, A: AdapterProbe, R: Resolver> Preflight<'a, A, R> {
    pub fn new(adapter: &'a A, resolver: &'a R, dns_check_host: &'a str) -> Self {
        Self {
            adapter,
            resolver,
            dns_check_host,
        }
    }

    pub async fn run(&self) -> PreflightOutcome {
        match self.check().await {
            Ok(snapshot) => {
                info!(
                    "Preflight passed: ssid={}, bssid={}, ip={}",
                    snapshot.ssid, snapshot.bssid, snapshot.ip_address
                );
                PreflightOutcome::Healthy(snapshot)
            }
            Err(failure) => PreflightOutcome::Unhealthy(failure),
        }
    }

    async fn check(&self) -> Result<AdapterSnapshot, PreflightFailure> {
        let link = self.adapter.query_link().await.map_err(|e| {
            PreflightFailure::new(
                Stage::AdapterQueryFailed,
                format!("Unable to get wireless info: {}", e),
            )
        })?;

        if !link.is_associated() {
            return Err(PreflightFailure::new(
                Stage::NotAssociated,
                "Problem with wireless connection: not associated to network",
            ));
        }

        let ip_address = self.adapter.query_ip().await.map_err(|e| {
            PreflightFailure::new(
                Stage::AdapterQueryFailed,
                format!("Unable to get wireless adapter IP info: {}", e),
            )
        })?;

        if ip_address == NOT_AVAILABLE {
            return Err(PreflightFailure::new(
                Stage::NoIpAddress,
                "Problem with wireless connection: no valid IP address",
            ));
        }

        self.resolver
            .resolve(self.dns_check_host)
            .await
            .map_err(|e| {
                PreflightFailure::new(
                    Stage::DnsResolutionFailed,
                    format!("DNS seems to be failing ({}). Err msg: {}", self.dns_check_host, e),
                )
            })?;

        Ok(link.with_ip(ip_address))
    }
}

/// Reset-and-exit remedy for any preflight failure.
///
/// Resets the interface once without checking the outcome; the caller must
/// then end the run with a failure status.
pub async fn recover<A: AdapterProbe>(adapter: &A, failure: &PreflightFailure) {
    error!("Preflight failed ({})", failure);
    error!("Bouncing WLAN interface");

    adapter.reset().await;

    error!("Exiting...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeAdapter, FakeResolver, healthy_link};

    async fn run(adapter: &FakeAdapter, resolver: &FakeResolver) -> PreflightOutcome {
        Preflight::new(adapter, resolver, "bbc.co.uk").run().await
    }

    fn stage(outcome: &PreflightOutcome) -> Option<Stage> {
        match outcome {
            PreflightOutcome::Healthy(_) => None,
            PreflightOutcome::Unhealthy(f) => Some(f.stage),
        }
    }

    #[tokio::test]
    async fn test_healthy_link() {
        let adapter = FakeAdapter::healthy();
        let resolver = FakeResolver::ok();

        let outcome = run(&adapter, &resolver).await;

        let PreflightOutcome::Healthy(snapshot) = outcome else {
            panic!("expected healthy outcome");
        };
        assert_eq!(snapshot, healthy_link().with_ip("192.168.1.5".into()));
        assert_eq!(adapter.calls(), ["query_link", "query_ip"]);
        assert_eq!(resolver.lookups(), ["bbc.co.uk"]);
        assert_eq!(adapter.resets(), 0);
    }

    #[tokio::test]
    async fn test_link_query_failure_stops_checks() {
        let adapter = FakeAdapter::healthy().failing_link("iw: command not found");
        let resolver = FakeResolver::ok();

        let outcome = run(&adapter, &resolver).await;

        assert_eq!(stage(&outcome), Some(Stage::AdapterQueryFailed));
        assert_eq!(adapter.calls(), ["query_link"]);
        assert!(resolver.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_not_associated() {
        let adapter = FakeAdapter::not_associated();
        let resolver = FakeResolver::ok();

        let outcome = run(&adapter, &resolver).await;

        assert_eq!(stage(&outcome), Some(Stage::NotAssociated));
        assert_eq!(adapter.calls(), ["query_link"]);
        assert!(resolver.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_ip_query_failure() {
        let adapter = FakeAdapter::healthy().failing_ip("Device \"wlan0\" does not exist.");
        let resolver = FakeResolver::ok();

        let outcome = run(&adapter, &resolver).await;

        let PreflightOutcome::Unhealthy(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.stage, Stage::AdapterQueryFailed);
        assert!(failure.reason.contains("IP info"));
        assert!(resolver.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_no_ip_address() {
        let adapter = FakeAdapter::healthy().with_ip(NOT_AVAILABLE);
        let resolver = FakeResolver::ok();

        let outcome = run(&adapter, &resolver).await;

        assert_eq!(stage(&outcome), Some(Stage::NoIpAddress));
        assert_eq!(adapter.calls(), ["query_link", "query_ip"]);
        assert!(resolver.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_dns_failure_carries_error_text() {
        let adapter = FakeAdapter::healthy();
        let resolver = FakeResolver::failing("Temporary failure in name resolution");

        let outcome = run(&adapter, &resolver).await;

        let PreflightOutcome::Unhealthy(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.stage, Stage::DnsResolutionFailed);
        assert!(failure.reason.contains("Temporary failure in name resolution"));
        assert_eq!(
            failure.to_string(),
            "dns-resolution-failed: DNS seems to be failing (bbc.co.uk). Err msg: Temporary failure in name resolution"
        );
    }

    #[tokio::test]
    async fn test_recover_resets_once() {
        let adapter = FakeAdapter::not_associated();
        let failure = PreflightFailure::new(Stage::NotAssociated, "not associated");

        recover(&adapter, &failure).await;

        assert_eq!(adapter.resets(), 1);
        assert_eq!(adapter.calls(), ["reset"]);
    }
}
