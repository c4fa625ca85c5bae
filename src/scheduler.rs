use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Task = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

pub fn task<F, Fut>(f: F) -> Task
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as TaskFuture)
}

/// Owns a set of recurring timers keyed by label. `shutdown` (or drop) cancels
/// every task it spawned, including one that is mid-await.
pub struct Scheduler {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl Scheduler {
    pub fn new(name: &'static str) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            name,
            shutdown,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Runs `task` every `period`, first after `first_delay`. A zero delay
    /// fires immediately. A label that is already running is left alone.
    pub fn every(&self, label: &'static str, period: Duration, first_delay: Duration, task: Task) {
        self.spawn_loop(label, period, first_delay, None, task);
    }

    /// Like `every`, but `trigger.notify_one()` also fires the task out of
    /// cadence without shifting the regular ticks.
    pub fn every_or_triggered(
        &self,
        label: &'static str,
        period: Duration,
        first_delay: Duration,
        trigger: Arc<Notify>,
        task: Task,
    ) {
        self.spawn_loop(label, period, first_delay, Some(trigger), task);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn active_tasks(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|(_, handle)| !handle.is_finished()).count()
    }

    pub fn shutdown(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        let handles = {
            let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *handles)
        };
        for (_, handle) in &handles {
            handle.abort();
        }
        tracing::debug!(scheduler = self.name, tasks = handles.len(), "scheduler stopped");
    }

    fn spawn_loop(
        &self,
        label: &'static str,
        period: Duration,
        first_delay: Duration,
        trigger: Option<Arc<Notify>>,
        task: Task,
    ) {
        if self.is_shut_down() {
            tracing::warn!(scheduler = self.name, task = label, "ignoring task on stopped scheduler");
            return;
        }
        if period.is_zero() {
            tracing::warn!(scheduler = self.name, task = label, "ignoring task with a zero period");
            return;
        }

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|(_, handle)| !handle.is_finished());
        if handles.iter().any(|(running, _)| *running == label) {
            tracing::debug!(scheduler = self.name, task = label, "task already running");
            return;
        }

        let mut stop = self.shutdown.subscribe();
        let scheduler = self.name;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + first_delay, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let trigger = trigger.unwrap_or_else(|| Arc::new(Notify::new()));

            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = interval.tick() => {}
                    _ = trigger.notified() => {
                        tracing::debug!(scheduler, task = label, "triggered out of cadence");
                    }
                }
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = task() => {}
                }
            }
        });
        handles.push((label, handle));
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
