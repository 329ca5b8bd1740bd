use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use minibuild::errors::BuildError;
use minibuild::task::{Task, TaskFuture, TaskRegistry, TaskReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeed,
    Fail,
    Fatal,
}

/// Shared log of what fake tasks did, in order.
///
/// Entries are `"start:<name>"` and `"end:<name>"`.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that succeeds immediately.
    pub fn task(&self, name: &str) -> RecordingTask {
        RecordingTask {
            name: name.to_string(),
            outcome: Outcome::Succeed,
            delay: None,
            recorder: self.clone(),
        }
    }

    /// Register `task(name)` for every name.
    pub fn registry(&self, names: &[&str]) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for name in names {
            registry
                .register(self.task(name))
                .expect("duplicate name in test registry");
        }
        registry
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Task names in start order.
    pub fn started(&self) -> Vec<String> {
        self.with_prefix("start:")
    }

    /// Task names in completion order.
    pub fn finished(&self) -> Vec<String> {
        self.with_prefix("end:")
    }

    /// Largest number of tasks that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
        self.max_running.store(0, Ordering::SeqCst);
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    fn push(&self, entry: String) {
        self.events.lock().unwrap().push(entry);
    }
}

/// A fake task that records its start and end into a [`Recorder`].
#[derive(Debug, Clone)]
pub struct RecordingTask {
    name: String,
    outcome: Outcome,
    delay: Option<Duration>,
    recorder: Recorder,
}

impl RecordingTask {
    /// Settle with an ordinary task failure.
    pub fn failing(mut self) -> Self {
        self.outcome = Outcome::Fail;
        self
    }

    /// Settle with a fatal error.
    pub fn fatal(mut self) -> Self {
        self.outcome = Outcome::Fatal;
        self
    }

    /// Sleep before settling.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Task for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let rec = &self.recorder;
            rec.push(format!("start:{}", self.name));
            let now = rec.running.fetch_add(1, Ordering::SeqCst) + 1;
            rec.max_running.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            rec.running.fetch_sub(1, Ordering::SeqCst);
            rec.push(format!("end:{}", self.name));

            match self.outcome {
                Outcome::Succeed => Ok(TaskReport::Done),
                Outcome::Fail => Err(BuildError::task_failed(&self.name, "recorded failure")),
                Outcome::Fatal => Err(BuildError::Fatal(format!("{} blew up", self.name))),
            }
        })
    }
}
