// SPDX-License-Identifier: GPL-3.0-only

//! Human-readable rendering of a [`RunReport`].

use std::io::{self, Write};

use csi_types::{
    ActionOutcome, CleanupStep, InventorySource, InventorySummary, RunReport, SourceStatus,
};

const RULE_WIDTH: usize = 72;

fn stat_line(summary: &InventorySummary) -> String {
    let label = format!("{} found:", summary.source.label());
    let mut line = format!("  - {:<28}{}", label, summary.count);
    match &summary.status {
        SourceStatus::Available => {}
        SourceStatus::Skipped => line.push_str(" (skipped)"),
        SourceStatus::Unavailable { reason } => {
            line.push_str(&format!(" (UNAVAILABLE: {reason})"));
        }
    }
    line
}

pub fn write_text(out: &mut impl Write, report: &RunReport) -> io::Result<()> {
    writeln!(
        out,
        "*** CSI iSCSI Reconciliation - {} ***",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(
        out,
        "Node: {}",
        report.node_name.as_deref().unwrap_or("Unknown (NODE_NAME not set)")
    )?;
    writeln!(
        out,
        "Mode: {}",
        if report.dry_run { "DRY RUN" } else { "LIVE EXECUTION" }
    )?;
    writeln!(
        out,
        "Host Access: {}",
        if report.host_access {
            "ENABLED (nsenter)"
        } else {
            "DISABLED"
        }
    )?;

    writeln!(out)?;
    writeln!(out, "Stats:")?;
    for source in [
        InventorySource::Iscsi,
        InventorySource::Zfs,
        InventorySource::Cluster,
    ] {
        if let Some(summary) = report.inventory(source) {
            writeln!(out, "{}", stat_line(summary))?;
        }
    }

    writeln!(out)?;
    if report.stale.is_empty() {
        writeln!(out, "[OK] No stale iSCSI configurations found.")?;
        return Ok(());
    }

    writeln!(
        out,
        "[!] FOUND {} STALE iSCSI CONFIGURATIONS",
        report.stale.len()
    )?;
    for volume in &report.stale {
        writeln!(out, "  * {volume}")?;
    }

    if let Some(reason) = &report.cleanup_withheld {
        writeln!(out)?;
        writeln!(out, "[!] Cleanup withheld: {reason}")?;
        return Ok(());
    }

    if report.actions.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "[ACTION] Cleaning up {} stale targets...",
        report
            .actions
            .iter()
            .filter(|action| action.step == CleanupStep::Delete)
            .count()
    )?;
    for action in &report.actions {
        writeln!(out, "  -> {}", action.command)?;
        match &action.outcome {
            ActionOutcome::DryRun if action.step == CleanupStep::Delete => {
                writeln!(out, "     (Dry Run: skipped)")?;
            }
            ActionOutcome::Failed { reason } => {
                writeln!(out, "     (failed: {reason})")?;
            }
            _ => {}
        }
    }

    let failed = report.failed_actions().count();
    if failed > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "[!] {failed} cleanup command(s) failed; the next run will retry"
        )?;
    }

    Ok(())
}
