//! Per-test error types

use thiserror::Error;

/// Failure reported while running a single test.
///
/// A test error is always recovered by the orchestrator: it is logged, the
/// test's record is not written and the next test still runs.
#[derive(Error, Debug)]
pub enum TestError {
    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    /// Error text reported by the tester itself (e.g. iperf3's `error` key)
    #[error("{0}")]
    Reported(String),

    #[error("Unable to parse {tool} output: {detail}")]
    Parse { tool: &'static str, detail: String },

    #[error("Unable to resolve {host}: {detail}")]
    Resolve { host: String, detail: String },

    #[error("No replies received from {host} ({sent} sent)")]
    NoReplies { host: String, sent: u32 },

    #[error("Cannot send {0} echo requests in one run")]
    InvalidCount(u32),
}

impl TestError {
    pub fn parse<S: Into<String>>(tool: &'static str, detail: S) -> Self {
        Self::Parse {
            tool,
            detail: detail.into(),
        }
    }
}
