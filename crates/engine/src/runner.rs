use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use procura_core::TenantId;
use procura_replenishment::ReplenishmentPolicy;

use crate::config::EngineConfig;
use crate::job::{JobScheduler, LocalJobScheduler, TenantScope};
use crate::replenishment_job::ReplenishmentJob;
use crate::sources::{SnapshotReader, SuggestionSink};

/// Config for the scheduled replenishment runner.
#[derive(Debug, Clone)]
pub struct ReplenishmentRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub policy: ReplenishmentPolicy,
}

impl Default for ReplenishmentRunner {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Handle for a running replenishment runner (shutdown + trigger hook).
#[derive(Debug)]
pub struct ReplenishmentRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ReplenishmentRunnerHandle {
    /// Request a run now (e.g. after a stock movement was recorded).
    ///
    /// Triggers are coalesced: if a run is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the runner thread and wait for it.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl ReplenishmentRunner {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            interval: cfg.runner_interval,
            max_retries: cfg.max_retries,
            base_backoff: cfg.base_backoff,
            policy: cfg.policy,
        }
    }

    /// Spawn a tenant-scoped runner.
    ///
    /// Runs once on startup, then every `interval` and on `trigger()`.
    /// Reader and job failures are logged and retried with bounded
    /// exponential backoff; they never propagate.
    pub fn spawn_for_tenant<R, S>(
        &self,
        name: &'static str,
        tenant_id: TenantId,
        reader: Arc<R>,
        sink: Arc<S>,
    ) -> std::io::Result<ReplenishmentRunnerHandle>
    where
        R: SnapshotReader + 'static,
        S: SuggestionSink + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new().name(name.to_string()).spawn(move || {
            runner_loop(name, tenant_id, cfg, shutdown_rx, trigger_rx, reader, sink)
        })?;

        Ok(ReplenishmentRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        })
    }
}

fn runner_loop<R, S>(
    name: &'static str,
    tenant_id: TenantId,
    cfg: ReplenishmentRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    reader: Arc<R>,
    sink: Arc<S>,
) where
    R: SnapshotReader + 'static,
    S: SuggestionSink + 'static,
{
    info!(runner = name, tenant = %tenant_id, "replenishment runner started");

    let scheduler = LocalJobScheduler::new(TenantScope::Tenant(tenant_id));

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if let Some(until) = backoff_until {
            if Instant::now() < until {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            backoff_until = None;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        let snapshot = match reader.get_snapshot(tenant_id) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    runner = name,
                    tenant = %tenant_id,
                    error = ?e,
                    "failed to read replenishment snapshot"
                );
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    failures = 0;
                }
                continue;
            }
        };

        let job = ReplenishmentJob::new(tenant_id, snapshot).with_policy(cfg.policy);
        match scheduler.run(job) {
            Ok(run) => {
                failures = 0;
                sink.emit(run);
            }
            Err(e) => {
                warn!(runner = name, tenant = %tenant_id, error = ?e, "replenishment job failed");
                failures += 1;
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    failures = 0;
                }
            }
        }
    }

    info!(runner = name, tenant = %tenant_id, "replenishment runner stopped");
}

/// base * 2^(attempt-1), capped at 10s.
fn backoff(base: Duration, attempt: u32) -> Duration {
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(u128::from(pow));
    Duration::from_millis(ms.min(10_000) as u64)
}
