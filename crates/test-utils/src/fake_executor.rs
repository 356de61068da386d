use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use corgi::engine::{JobOutcome, ScheduledNode};
use corgi::errors::Result;
use corgi::exec::Executor;

/// Something the fake executor observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
}

/// Shared handle onto what a [`ScriptedExecutor`] did.
#[derive(Debug, Clone, Default)]
pub struct ExecLog {
    events: Arc<Mutex<Vec<ExecEvent>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    max_active_per_resource: Arc<Mutex<HashMap<String, usize>>>,
    active_per_resource: Arc<Mutex<HashMap<String, usize>>>,
}

impl ExecLog {
    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(n) => Some(n),
                ExecEvent::Finished(_) => None,
            })
            .collect()
    }

    fn position(&self, event: &ExecEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// Whether `first` finished strictly before `second` started.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        match (
            self.position(&ExecEvent::Finished(first.to_string())),
            self.position(&ExecEvent::Started(second.to_string())),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Whether the executions of `a` and `b` overlapped in time.
    pub fn overlapped(&self, a: &str, b: &str) -> bool {
        !self.finished_before_started(a, b) && !self.finished_before_started(b, a)
    }

    pub fn was_started(&self, name: &str) -> bool {
        self.position(&ExecEvent::Started(name.to_string())).is_some()
    }

    /// Highest number of jobs observed running at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn max_active_for_resource(&self, resource: &str) -> usize {
        self.max_active_per_resource
            .lock()
            .unwrap()
            .get(resource)
            .copied()
            .unwrap_or(0)
    }

    fn enter(&self, node: &ScheduledNode) {
        self.events
            .lock()
            .unwrap()
            .push(ExecEvent::Started(node.name.clone()));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if !node.resource.is_empty() {
            let mut active = self.active_per_resource.lock().unwrap();
            let count = active.entry(node.resource.clone()).or_insert(0);
            *count += 1;
            let mut max = self.max_active_per_resource.lock().unwrap();
            let m = max.entry(node.resource.clone()).or_insert(0);
            *m = (*m).max(*count);
        }
    }

    fn leave(&self, node: &ScheduledNode) {
        if !node.resource.is_empty() {
            let mut active = self.active_per_resource.lock().unwrap();
            if let Some(count) = active.get_mut(&node.resource) {
                *count -= 1;
            }
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(ExecEvent::Finished(node.name.clone()));
    }
}

/// A fake executor that:
/// - records when each node starts and finishes
/// - sleeps for a configurable delay to simulate work
/// - returns scripted outcomes (success unless told otherwise)
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    outcomes: HashMap<String, JobOutcome>,
    errors: HashSet<String>,
    panics: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    log: ExecLog,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            default_delay: Duration::from_millis(10),
            ..Self::default()
        }
    }

    /// Make `node` exit with `code`.
    pub fn fail(mut self, node: &str, code: i32) -> Self {
        self.outcomes
            .insert(node.to_string(), JobOutcome::from_code(code));
        self
    }

    /// Make `node` fail to run at all (executor error).
    pub fn error(mut self, node: &str) -> Self {
        self.errors.insert(node.to_string());
        self
    }

    /// Make `node` panic inside `Executor::run`.
    pub fn panic(mut self, node: &str) -> Self {
        self.panics.insert(node.to_string());
        self
    }

    pub fn delay(mut self, node: &str, delay: Duration) -> Self {
        self.delays.insert(node.to_string(), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn log(&self) -> ExecLog {
        self.log.clone()
    }
}

impl Executor for ScriptedExecutor {
    fn run<'a>(
        &'a self,
        node: &'a ScheduledNode,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send + 'a>> {
        Box::pin(async move {
            self.log.enter(node);

            let delay = self
                .delays
                .get(&node.name)
                .copied()
                .unwrap_or(self.default_delay);
            tokio::time::sleep(delay).await;

            self.log.leave(node);

            if self.panics.contains(&node.name) {
                panic!("scripted executor panic for {}", node.name);
            }
            if self.errors.contains(&node.name) {
                return Err(anyhow::anyhow!("scripted executor error for {}", node.name).into());
            }
            Ok(self
                .outcomes
                .get(&node.name)
                .copied()
                .unwrap_or(JobOutcome::Success))
        })
    }
}
