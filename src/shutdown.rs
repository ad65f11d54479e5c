use crate::content::JsonContentStore;
use std::{fmt, sync::Arc, time::Duration};
use tokio::{signal, sync::watch, task::JoinHandle, time::timeout};
use tracing::{error, info, warn};

/// Broadcasts a one-way "stop" flag to the server loop and background tasks.
pub struct ShutdownCoordinator {
    tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Receiver whose value flips to `true` once shutdown starts.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Flip the flag. Only the first call notifies subscribers.
    pub fn initiate_shutdown(&self) {
        let first = self.tx.send_if_modified(|requested| {
            let changed = !*requested;
            *requested = true;
            changed
        });
        if first {
            info!("Initiating graceful shutdown");
        }
    }

    /// Block until SIGINT or SIGTERM arrives, then initiate shutdown.
    pub async fn wait_for_shutdown_signal(&self) {
        tokio::select! {
            _ = ctrl_c() => info!("Received Ctrl+C"),
            _ = terminate() => info!("Received SIGTERM"),
        }
        self.initiate_shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// One thing to wind down after the listener stops.
pub enum ShutdownStep {
    /// A spawned task that watches the shutdown channel; aborted after `grace`.
    Task {
        name: &'static str,
        handle: JoinHandle<()>,
        grace: Duration,
    },
    /// Wait for an in-flight content write to land.
    ContentStore(Arc<JsonContentStore>),
}

impl ShutdownStep {
    fn name(&self) -> &'static str {
        match self {
            ShutdownStep::Task { name, .. } => *name,
            ShutdownStep::ContentStore(_) => "content store",
        }
    }

    async fn run(self) -> StepOutcome {
        match self {
            ShutdownStep::Task {
                mut handle, grace, ..
            } => {
                if handle.is_finished() {
                    return StepOutcome::Finished;
                }
                match timeout(grace, &mut handle).await {
                    Ok(_) => StepOutcome::Finished,
                    Err(_) => {
                        handle.abort();
                        StepOutcome::Aborted
                    }
                }
            }
            ShutdownStep::ContentStore(store) => {
                store.wait_for_writers().await;
                StepOutcome::Finished
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Finished,
    Aborted,
    TimedOut,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepOutcome::Finished => "finished",
            StepOutcome::Aborted => "aborted",
            StepOutcome::TimedOut => "timed out",
        })
    }
}

/// Runs shutdown steps in registration order, each bounded by `step_timeout`.
pub struct ShutdownManager {
    steps: Vec<ShutdownStep>,
    step_timeout: Duration,
}

impl ShutdownManager {
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            steps: Vec::new(),
            step_timeout,
        }
    }

    pub fn register(&mut self, step: ShutdownStep) {
        self.steps.push(step);
    }

    pub fn register_background_task(
        &mut self,
        handle: JoinHandle<()>,
        name: &'static str,
        grace_seconds: u64,
    ) {
        self.register(ShutdownStep::Task {
            name,
            handle,
            grace: Duration::from_secs(grace_seconds),
        });
    }

    pub fn register_content_store(&mut self, store: Arc<JsonContentStore>) {
        self.register(ShutdownStep::ContentStore(store));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drain every step and report how each one ended.
    pub async fn shutdown_all(&mut self) -> Vec<(&'static str, StepOutcome)> {
        info!("Running {} shutdown steps", self.steps.len());

        let mut outcomes = Vec::with_capacity(self.steps.len());
        for step in self.steps.drain(..) {
            let name = step.name();
            let outcome = timeout(self.step_timeout, step.run())
                .await
                .unwrap_or(StepOutcome::TimedOut);
            match outcome {
                StepOutcome::Finished => info!(step = name, "Shutdown step finished"),
                other => warn!(step = name, outcome = %other, "Shutdown step did not finish cleanly"),
            }
            outcomes.push((name, outcome));
        }
        outcomes
    }
}
