//! File-processing task queue and its background worker.
//!
//! # Concurrency
//! ```text
//! TaskQueue
//!     Mutex ─┬─ HashMap<TaskId, Task>   (status lookups)
//!            └─ VecDeque<TaskId>        (pending order)
//!
//! submit / next / finish lock, mutate both, unlock.
//! The worker never holds the lock while the processor command runs.
//! Finished tasks are kept for lookups up to `max_finished`, oldest
//! evicted first.
//! ```
//!
//! Status moves Pending → Processing → Completed | Failed | TimedOut and
//! never backwards.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::guard::{Principal, SafePath, ValidContent};
use crate::observability::metrics;
use crate::services::commands::{self, CommandError, CommandRunner};
use crate::services::{unix_now, StoreError};

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    TimedOut,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::TimedOut
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub filename: String,
    pub owner_id: u64,
    pub status: TaskStatus,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    input: SafePath,
}

impl Task {
    /// Canonical input file inside the storage root.
    pub fn input(&self) -> &SafePath {
        &self.input
    }
}

#[derive(Debug, Default)]
struct QueueState {
    tasks: HashMap<TaskId, Task>,
    pending: VecDeque<TaskId>,
    finished: VecDeque<TaskId>,
}

#[derive(Debug)]
pub struct TaskQueue {
    state: Mutex<QueueState>,
    max_pending: usize,
    max_finished: usize,
}

impl TaskQueue {
    pub fn new(max_pending: usize, max_finished: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_pending,
            max_finished,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("task queue lock poisoned".to_string()))
    }

    /// Enqueue a task for `owner`. `filename` matched the filename pattern
    /// and `input` is the same name after the path guard.
    pub fn submit(
        &self,
        owner: &Principal,
        filename: ValidContent,
        input: SafePath,
    ) -> Result<Task, StoreError> {
        let now = unix_now();
        let task = Task {
            id: Uuid::new_v4(),
            filename: filename.into_string(),
            owner_id: owner.user_id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            message: None,
            input,
        };

        let mut state = self.lock()?;
        if state.pending.len() >= self.max_pending {
            return Err(StoreError::CapacityExceeded(self.max_pending));
        }
        state.pending.push_back(task.id);
        state.tasks.insert(task.id, task.clone());
        drop(state);

        metrics::record_task(TaskStatus::Pending.as_str());
        Ok(task)
    }

    pub fn get(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.lock()?.tasks.get(id).cloned())
    }

    /// Pop the oldest pending task and mark it Processing.
    pub fn next(&self) -> Result<Option<Task>, StoreError> {
        let mut state = self.lock()?;
        while let Some(id) = state.pending.pop_front() {
            if let Some(task) = state.tasks.get_mut(&id) {
                task.status = TaskStatus::Processing;
                task.updated_at = unix_now();
                let task = task.clone();
                drop(state);
                metrics::record_task(TaskStatus::Processing.as_str());
                return Ok(Some(task));
            }
        }
        Ok(None)
    }

    /// Record a terminal status. Ignored unless the task is Processing.
    pub fn finish(
        &self,
        id: &TaskId,
        status: TaskStatus,
        message: Option<String>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let Some(task) = state.tasks.get_mut(id) else {
            return Ok(());
        };
        if task.status != TaskStatus::Processing || !status.is_terminal() {
            return Ok(());
        }
        task.status = status;
        task.updated_at = unix_now();
        task.message = message;

        state.finished.push_back(*id);
        while state.finished.len() > self.max_finished {
            if let Some(evicted) = state.finished.pop_front() {
                state.tasks.remove(&evicted);
            }
        }
        drop(state);

        metrics::record_task(status.as_str());
        Ok(())
    }

    pub fn pending_len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.pending.len())
    }

    /// Tasks held in memory, pending and finished.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.tasks.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Background consumer of the [`TaskQueue`].
pub struct TaskWorker {
    queue: Arc<TaskQueue>,
    runner: Arc<dyn CommandRunner>,
    program: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl TaskWorker {
    pub fn new(
        queue: Arc<TaskQueue>,
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            queue,
            runner,
            program: program.into(),
            poll_interval,
            timeout,
        }
    }

    /// Run until the shutdown broadcast fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            program = %self.program,
            poll_ms = self.poll_interval.as_millis() as u64,
            "Task worker started"
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.drain().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Task worker shutting down");
                    break;
                }
            }
        }
    }

    /// Process every task currently pending.
    pub async fn drain(&self) {
        loop {
            match self.queue.next() {
                Ok(Some(task)) => self.process(task).await,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Task queue unavailable");
                    break;
                }
            }
        }
    }

    async fn process(&self, task: Task) {
        tracing::debug!(task_id = %task.id, "Processing task");

        let result = commands::process_file(
            self.runner.as_ref(),
            &self.program,
            task.input(),
            self.timeout,
        )
        .await;
        let (status, message) = match result {
            Ok(output) if output.success() => (TaskStatus::Completed, None),
            Ok(output) => {
                tracing::warn!(
                    task_id = %task.id,
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr,
                    "Processor failed"
                );
                (TaskStatus::Failed, Some("processing failed".to_string()))
            }
            Err(CommandError::Timeout(limit)) => {
                tracing::warn!(task_id = %task.id, timeout = ?limit, "Processor timed out");
                (TaskStatus::TimedOut, Some("processing timed out".to_string()))
            }
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Processor could not start");
                (TaskStatus::Failed, Some("processing failed".to_string()))
            }
        };

        if let Err(e) = self.queue.finish(&task.id, status, message) {
            tracing::error!(task_id = %task.id, error = %e, "Could not record task result");
        }
    }
}
