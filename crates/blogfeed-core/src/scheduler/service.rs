use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::models::{NewTaskLog, TaskLog};
use super::schedule::{Clock, SystemClock};
use super::tasks::ScheduledJob;
use crate::storage::{Database, TaskLogRepository};
use crate::{Error, Result};

/// What happened when a job was triggered
#[derive(Debug, Clone)]
pub enum JobRun {
    /// The job ran and its outcome was written to the task log
    Completed(TaskLog),
    /// A previous run of the same job was still in flight
    Skipped,
}

/// A registered job plus its in-flight flag
struct JobSlot {
    job: Arc<dyn ScheduledJob>,
    running: AtomicBool,
}

/// Clears the in-flight flag when dropped
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl JobSlot {
    fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            job,
            running: AtomicBool::new(false),
        }
    }

    fn try_acquire(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }
}

/// Shared state between the timer loops and the handle
struct Runner {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl Runner {
    /// Run `slot` unless it is already running, then record the outcome
    async fn run_guarded(&self, slot: &JobSlot) -> Result<JobRun> {
        let Some(_guard) = slot.try_acquire() else {
            warn!("Job '{}' is still running, skipping this trigger", slot.job.name());
            return Ok(JobRun::Skipped);
        };

        let log = execute_and_record(slot.job.clone(), &self.db, self.clock.as_ref()).await?;
        Ok(JobRun::Completed(log))
    }
}

/// Execute `job` once and append its outcome to the task log.
///
/// The job runs on its own task so that a panic is recorded as an ERROR row
/// instead of tearing down the caller.
pub async fn execute_and_record(
    job: Arc<dyn ScheduledJob>,
    db: &Database,
    clock: &dyn Clock,
) -> Result<TaskLog> {
    let name = job.name();
    let now = clock.now().with_timezone(&Utc);

    info!("Running job '{}'", name);

    let outcome = tokio::spawn(async move { job.execute(now).await })
        .await
        .unwrap_or_else(|e| Err(Error::Other(format!("job panicked: {}", e))));

    let entry = match &outcome {
        Ok(details) => {
            debug!("Job '{}' completed successfully", name);
            NewTaskLog::success(name, details)
        }
        Err(e) => {
            error!("Job '{}' failed: {}", name, e);
            NewTaskLog::error(name, e.to_string())
        }
    };

    let finished = clock.now().with_timezone(&Utc);
    TaskLogRepository::new(db).create_at(&entry, finished).await
}

/// Owns the scheduled jobs until [`start`](Self::start) hands them to timer tasks
pub struct SchedulerService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    jobs: Vec<Arc<JobSlot>>,
}

impl SchedulerService {
    /// Create a scheduler on the system clock with no jobs
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            jobs: Vec::new(),
        }
    }

    /// Replace the clock used to compute firing times
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_job<J: ScheduledJob + 'static>(mut self, job: J) -> Self {
        self.jobs.push(Arc::new(JobSlot::new(Arc::new(job))));
        self
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Spawn one timer task per job and return the handle controlling them
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = Arc::new(Runner {
            db: self.db,
            clock: self.clock,
        });

        let tasks = self
            .jobs
            .iter()
            .map(|slot| {
                let runner = runner.clone();
                let slot = slot.clone();
                let shutdown = shutdown_rx.clone();
                tokio::spawn(async move { run_job_loop(runner, slot, shutdown).await })
            })
            .collect();

        info!("Scheduler started with {} jobs", self.jobs.len());

        SchedulerHandle {
            shutdown_tx,
            tasks,
            jobs: self.jobs,
            runner,
        }
    }
}

async fn run_job_loop(runner: Arc<Runner>, slot: Arc<JobSlot>, mut shutdown: watch::Receiver<bool>) {
    let name = slot.job.name();
    let schedule = slot.job.schedule();

    // Slot most recently fired; a clock that reads slightly behind on wake-up
    // must not select it again
    let mut last_fired: Option<DateTime<Local>> = None;

    loop {
        let now = runner.clock.now();
        let from = last_fired.map_or(now, |last| last.max(now));
        let next = schedule.next_after_local(from);
        let delay = (next - now).to_std().unwrap_or_default();
        debug!(
            "Job '{}' ({}) next fires at {}",
            name,
            schedule,
            next.format("%Y-%m-%d %H:%M")
        );

        tokio::select! {
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(delay) => {
                last_fired = Some(next);
                if let Err(e) = runner.run_guarded(&slot).await {
                    error!("Failed to record outcome of job '{}': {}", name, e);
                }
            }
        }
    }

    debug!("Timer for job '{}' stopped", name);
}

/// Running scheduler. Dropping it without [`stop`](Self::stop) leaves the
/// timer tasks detached until the runtime shuts down.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    jobs: Vec<Arc<JobSlot>>,
    runner: Arc<Runner>,
}

impl SchedulerHandle {
    /// Names of the registered jobs
    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|s| s.job.name()).collect()
    }

    /// Trigger a job immediately, honouring the in-flight guard
    pub async fn run_now(&self, name: &str) -> Result<JobRun> {
        let slot = self
            .jobs
            .iter()
            .find(|s| s.job.name() == name)
            .ok_or_else(|| Error::Other(format!("unknown job '{}'", name)))?;

        self.runner.run_guarded(slot).await
    }

    /// Stop the timers. A run already in progress finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Scheduler task ended abnormally: {}", e);
            }
        }
        info!("Scheduler stopped");
    }
}
