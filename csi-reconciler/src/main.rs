// SPDX-License-Identifier: GPL-3.0-only

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use csi_reconciler::report::write_text;
use csi_reconciler::{DEGRADED_EXIT_CODE, KubePersistentVolumes, RunConfig, run};
use csi_sys::{ExecutionContext, HostExecutor};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let config = RunConfig::parse();

    // Logs go to stderr; stdout carries the report
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("csi_reconciler=info,csi_sys=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting csi-reconciler v{}", env!("CARGO_PKG_VERSION"));

    let context = ExecutionContext::detect(config.use_nsenter);
    tracing::info!(
        "Host commands run via {} (timeout {}s)",
        context.describe(),
        config.command_timeout_secs
    );

    let executor = HostExecutor::new(context, config.command_timeout());
    let report = run(&config, &executor, &KubePersistentVolumes).await;

    let mut stdout = std::io::stdout().lock();
    if config.json {
        serde_json::to_writer_pretty(&mut stdout, &report).context("Failed to encode report")?;
        writeln!(stdout)?;
    } else {
        write_text(&mut stdout, &report).context("Failed to write report")?;
    }

    if report.is_degraded() {
        tracing::warn!("Run completed in a degraded state");
        Ok(ExitCode::from(DEGRADED_EXIT_CODE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
