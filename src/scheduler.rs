//! Refresh scheduler: one independent repeating task per source.
//!
//! DESIGN
//! ======
//! Each active source gets its own task driven by `tokio::time::interval`.
//! The first tick fires immediately, which is the initial load. There is no
//! coordination between tasks.
//!
//! Every cycle runs in a child task so a panic inside a source is caught at
//! the join and logged; the loop carries on with the next tick. All tasks
//! share one `CancellationToken`, and `shutdown` cancels and joins them.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::sources::Source;

pub struct RefreshScheduler {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl RefreshScheduler {
    /// Spawn a refresh task for every active source.
    ///
    /// Sources whose segment is absent from the header get no task.
    pub async fn start(sources: Vec<Arc<dyn Source>>) -> Self {
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(sources.len());

        for source in sources {
            if !source.is_active().await {
                info!(source = source.name(), "segment absent; source inert");
                continue;
            }
            let name = source.name();
            info!(source = name, period_secs = source.period().as_secs_f64(), "refresh task armed");
            tasks.push((name, tokio::spawn(refresh_loop(source, cancel.child_token()))));
        }

        Self { cancel, tasks }
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn source_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|(name, _)| *name).collect()
    }

    /// Cancel every task, including in-flight cycles, and wait for them.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                error!(source = name, error = %e, "refresh task failed to join");
            }
        }
        info!("refresh scheduler stopped");
    }
}

async fn refresh_loop(source: Arc<dyn Source>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(source.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !run_cycle(&source, &cancel).await {
                    break;
                }
            }
            () = cancel.cancelled() => break,
        }
    }
}

/// Run one cycle in a child task. Returns `false` when cancelled mid-cycle.
async fn run_cycle(source: &Arc<dyn Source>, cancel: &CancellationToken) -> bool {
    let cycle_source = Arc::clone(source);
    let mut cycle = tokio::spawn(async move { cycle_source.refresh().await });

    tokio::select! {
        joined = &mut cycle => {
            if let Err(e) = joined {
                error!(source = source.name(), error = %e, "refresh cycle panicked");
            }
            true
        }
        () = cancel.cancelled() => {
            cycle.abort();
            false
        }
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
