//! wiperf agent - wireless link probe
//!
//! One invocation: validate the wireless link, run the enabled tests once
//! and leave a result file per test for the collector.

mod adapter;
mod config;
mod dns;
mod logging;
mod preflight;
mod session;
mod storage;
mod testing;

#[cfg(test)]
mod testutil;

use adapter::IwAdapter;
use anyhow::Result;
use clap::Parser;
use dns::SystemResolver;
use std::path::PathBuf;
use std::process::ExitCode;
use testing::{IcmpProber, Iperf3Cli, OoklaSpeedtest};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "wiperf-agent")]
#[command(version)]
#[command(about = "Wireless network performance probe", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Append log output to this file (overrides [Logging] path)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = config::Config::load(&args.config)?;

    let log_file = args.log_file.as_deref().or(config.logging.path.as_deref());
    logging::init(&config.logging.level, log_file)?;

    info!("Starting wiperf agent v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {:?}", args.config);

    let run_config = config.into_run_config(config::read_machine_id())?;
    info!(
        "Platform: {}, interface: {}, machine id: {}",
        run_config.platform,
        run_config.interface,
        run_config.machine_id.as_deref().unwrap_or(records::NOT_AVAILABLE)
    );

    let adapter = IwAdapter::new(run_config.interface.as_str());
    let sink = storage::sink_for(run_config.result_format);

    let code = session::run(
        &run_config,
        &adapter,
        &SystemResolver,
        &IcmpProber::new(),
        &OoklaSpeedtest::new(),
        &Iperf3Cli::new(),
        sink.as_ref(),
    )
    .await;

    Ok(code)
}
