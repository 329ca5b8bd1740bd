// src/watch/controller.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::compose::{Composer, GraphExpr};
use crate::context::BuildContext;
use crate::watch::binding::{WatchBinding, relative_str};
use crate::watch::hash::ContentHashes;
use crate::watch::watcher::ChangeEvent;

/// Lifecycle of one binding: `Idle` until a change arrives, `Running` while
/// at least one of its runs is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Running { in_flight: usize },
}

/// How a retriggered run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// The run settled with failed tasks.
    Failed(Vec<String>),
    /// The run was rejected by a fatal error.
    Aborted(String),
}

/// Progress notices, for callers that want to observe the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchNotice {
    RunStarted { binding: String, path: String },
    RunFinished { binding: String, outcome: RunOutcome },
}

type InFlight = Arc<Mutex<HashMap<String, usize>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, usize>> {
    in_flight.lock().unwrap_or_else(|p| p.into_inner())
}

/// Decrements a binding's in-flight count when the run ends, panics included.
struct RunGuard {
    in_flight: InFlight,
    binding: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut map = lock(&self.in_flight);
        if let Some(n) = map.get_mut(&self.binding) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                map.remove(&self.binding);
            }
        }
    }
}

/// Dispatches change events to composer runs.
///
/// Every change matching a binding starts a run of that binding's graph.
/// Runs are not debounced or serialized: a second change while a run is in
/// flight starts an overlapping run. Failed or aborted runs are logged and
/// the session keeps watching.
#[derive(Debug)]
pub struct WatchController {
    ctx: BuildContext,
    bindings: Vec<WatchBinding>,
    composer: Arc<Composer>,
    in_flight: InFlight,
    hashes: Option<ContentHashes>,
    notices: Option<mpsc::UnboundedSender<WatchNotice>>,
}

impl WatchController {
    pub fn new(ctx: BuildContext, bindings: Vec<WatchBinding>, composer: Arc<Composer>) -> Self {
        Self {
            ctx,
            bindings,
            composer,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            hashes: None,
            notices: None,
        }
    }

    /// Ignore changes that leave a file's content hash untouched.
    pub fn with_content_hashing(mut self, enabled: bool) -> Self {
        self.hashes = enabled.then(ContentHashes::new);
        self
    }

    pub fn with_notices(mut self, tx: mpsc::UnboundedSender<WatchNotice>) -> Self {
        self.notices = Some(tx);
        self
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    pub fn state(&self, binding: &str) -> BindingState {
        match lock(&self.in_flight).get(binding) {
            Some(&n) if n > 0 => BindingState::Running { in_flight: n },
            _ => BindingState::Idle,
        }
    }

    /// Consume change events until the channel closes.
    pub async fn run(mut self, mut changes: mpsc::UnboundedReceiver<ChangeEvent>) {
        info!(bindings = self.bindings.len(), "watching for changes");
        while let Some(change) = changes.recv().await {
            self.handle_change(&change.path);
        }
        debug!("change channel closed; watch loop finished");
    }

    /// Start one run per binding matching `path`.
    ///
    /// `path` is either absolute (as reported by the watcher) or already
    /// relative to the project root. Returns the spawned runs.
    pub fn handle_change(&mut self, path: &Path) -> Vec<JoinHandle<()>> {
        let rel = if path.is_absolute() {
            relative_str(self.ctx.root(), path)
        } else {
            Some(path.to_string_lossy().replace('\\', "/"))
        };
        let Some(rel) = rel else {
            debug!(path = ?path, "change outside project root; ignoring");
            return Vec::new();
        };

        let mut targets: Vec<(String, GraphExpr)> = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.matches(&rel)) {
            if targets.iter().any(|(_, t)| t == binding.target()) {
                continue;
            }
            targets.push((binding.name().to_string(), binding.target().clone()));
        }

        if targets.is_empty() {
            debug!(path = %rel, "no binding matches");
            return Vec::new();
        }

        if let Some(hashes) = self.hashes.as_mut() {
            let full = self.ctx.resolve(&rel);
            if !hashes.observe(self.ctx.fs(), &full) {
                debug!(path = %rel, "content unchanged; skipping");
                return Vec::new();
            }
        }

        targets
            .into_iter()
            .map(|(binding, target)| self.spawn_run(binding, target, &rel))
            .collect()
    }

    fn spawn_run(&self, binding: String, target: GraphExpr, path: &str) -> JoinHandle<()> {
        {
            let mut map = lock(&self.in_flight);
            let n = map.entry(binding.clone()).or_insert(0);
            *n += 1;
            if *n > 1 {
                debug!(binding = %binding, in_flight = *n, "overlapping run");
            }
        }
        info!(binding = %binding, path = %path, graph = %target, "change detected; rebuilding");
        self.notify(WatchNotice::RunStarted {
            binding: binding.clone(),
            path: path.to_string(),
        });

        let guard = RunGuard {
            in_flight: Arc::clone(&self.in_flight),
            binding: binding.clone(),
        };
        let composer = Arc::clone(&self.composer);
        let notices = self.notices.clone();

        tokio::spawn(async move {
            let outcome = match composer.execute(&target).await {
                Ok(summary) if summary.is_success() => RunOutcome::Succeeded,
                Ok(summary) => {
                    warn!(
                        binding = %binding,
                        failed = ?summary.failed_tasks(),
                        "rebuild failed; still watching"
                    );
                    RunOutcome::Failed(
                        summary.failed_tasks().into_iter().map(str::to_string).collect(),
                    )
                }
                Err(e) => {
                    error!(binding = %binding, error = %e, "rebuild aborted; still watching");
                    RunOutcome::Aborted(e.to_string())
                }
            };
            drop(guard);
            if let Some(tx) = notices {
                let _ = tx.send(WatchNotice::RunFinished { binding, outcome });
            }
        })
    }

    fn notify(&self, notice: WatchNotice) {
        if let Some(tx) = &self.notices {
            let _ = tx.send(notice);
        }
    }
}
