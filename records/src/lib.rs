//! wiperf result records
//!
//! Shared result contract for the wiperf probe agent: the four test kinds,
//! their fixed field sets, the raw result shapes produced by each tester and
//! the normalized record handed to a result sink.

pub mod constants;
pub mod error;
pub mod results;

pub use constants::*;
pub use error::TestError;
pub use results::{
    AdapterSnapshot, PingResult, ResultRecord, SpeedtestResult, TcpResult, TestResult, UdpResult,
};

/// Sentinel reported by the adapter for any link attribute that is unset
/// (no association, no address, ...).
pub const NOT_AVAILABLE: &str = "NA";
