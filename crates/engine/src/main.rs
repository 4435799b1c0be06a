//! `procura`: run the replenishment calculator over a JSON snapshot.
//!
//! Reads a `ReplenishmentSnapshot` from stdin and writes the resulting
//! `ReplenishmentRun` as JSON to stdout. Policy comes from `PROCURA_*`
//! environment variables.

use std::io::{self, Read, Write};

use anyhow::Context;
use tracing::info;

use procura_engine::{
    EngineConfig, JobScheduler, LocalJobScheduler, ReplenishmentJob, ReplenishmentSnapshot,
};

fn main() -> anyhow::Result<()> {
    procura_observability::init();

    let cfg = EngineConfig::from_env();
    info!(policy = ?cfg.policy, "procura starting");

    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read snapshot from stdin")?;
    let snapshot: ReplenishmentSnapshot =
        serde_json::from_str(&raw).context("stdin is not a valid replenishment snapshot")?;

    let tenant_id = snapshot.tenant_id;
    let scheduler = LocalJobScheduler::for_tenant(tenant_id);
    let run = scheduler
        .run(ReplenishmentJob::new(tenant_id, snapshot).with_policy(cfg.policy))
        .context("replenishment run failed")?;

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &run).context("failed to write suggestions")?;
    writeln!(out)?;
    Ok(())
}
