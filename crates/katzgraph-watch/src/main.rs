//! Binary entrypoint for the katzgraph update loop.
//!
//! Configuration comes from environment variables; see
//! [`katzgraph_watch::config`]. Runs until interrupted with Ctrl-C.

use std::process::ExitCode;

use katzgraph_watch::{UpdateLoop, WatchConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = match WatchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let mut update_loop = match UpdateLoop::from_config(&config) {
        Ok(update_loop) => update_loop,
        Err(e) => {
            tracing::error!("failed to start: {e}");
            return ExitCode::from(3);
        }
    };

    tracing::info!(
        signal = %config.signal.display(),
        poll_secs = config.poll_interval.as_secs(),
        "katzgraph-watch polling"
    );

    let stopped = tokio::select! {
        _ = update_loop.run(config.poll_interval) => Ok(()),
        result = tokio::signal::ctrl_c() => result,
    };
    if let Err(e) = stopped {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        return ExitCode::from(3);
    }
    tracing::info!(passes = update_loop.passes(), "stopping");

    ExitCode::SUCCESS
}
