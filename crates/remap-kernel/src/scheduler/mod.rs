//! Cooperative Task Scheduler
//!
//! A fixed pool of worker threads drains a shared FIFO queue of tasks. The
//! distinguishing behavior is the *helping* wait: a thread blocked in
//! [`TaskHandle::get`] first pulls and runs other queued tasks itself, and
//! only parks once the queue is empty. A worker awaiting a peer task can
//! therefore never starve the pool.
//!
//! With zero workers the scheduler is fully synchronous: every task runs on
//! the submitting thread inside [`Scheduler::submit`].
//!
//! # Task lifecycle
//!
//! ```text
//! READY -> PROCESSING -> DONE | EXCEPTION
//!            |
//!            +-> WAITING (a get() caller parked) -> DONE | EXCEPTION
//! READY -> CANCELLED (only before processing starts)
//! ```

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const READY: u8 = 0;
const PROCESSING: u8 = 1;
const WAITING: u8 = 2;
const DONE: u8 = 3;
const EXCEPTION: u8 = 4;
const CANCELLED: u8 = 5;

/// Observable state of a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, not yet claimed
    Ready,
    /// Claimed by a thread and running
    Processing,
    /// Running, with a `get()` caller parked on it
    Waiting,
    /// Completed with a value
    Done,
    /// Completed with an error or panic
    Exception,
    /// Cancelled before it started
    Cancelled,
}

impl TaskState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            READY => Self::Ready,
            PROCESSING => Self::Processing,
            WAITING => Self::Waiting,
            DONE => Self::Done,
            EXCEPTION => Self::Exception,
            CANCELLED => Self::Cancelled,
            other => unreachable!("invalid task state {other}"),
        }
    }
}

/// Failure observed through [`TaskHandle::get`]
#[derive(Debug, thiserror::Error)]
pub enum TaskError<E> {
    /// The task returned an error
    #[error("task failed: {0}")]
    Failed(E),

    /// The task panicked
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The task was cancelled before it started
    #[error("task cancelled")]
    Cancelled,
}

/// Errors raised by the scheduler itself
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Submission after shutdown
    #[error("cannot submit tasks to a shut down scheduler")]
    Shutdown,

    /// A worker thread could not be started
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Error that escaped a worker thread outside any tracked task
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("uncaught failure in {thread}: {message}")]
pub struct WorkerFailure {
    /// Name of the worker thread
    pub thread: String,
    /// Description of the failure
    pub message: String,
}

/// Type-erased unit of queued work
trait Job: Send + Sync {
    /// Claim and run the task if nobody else has
    fn handle(&self);

    /// Cancel the task if it has not started
    fn cancel(&self) -> bool;
}

type Callable<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send>;

struct Task<T, E> {
    state: AtomicU8,
    callable: Mutex<Option<Callable<T, E>>>,
    outcome: Mutex<Option<Result<T, TaskError<E>>>>,
    monitor: Mutex<()>,
    parked: Condvar,
}

impl<T, E> Task<T, E> {
    fn new(callable: Callable<T, E>) -> Self {
        Self {
            state: AtomicU8::new(READY),
            callable: Mutex::new(Some(callable)),
            outcome: Mutex::new(None),
            monitor: Mutex::new(()),
            parked: Condvar::new(),
        }
    }

    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn calculate(&self) {
        let Some(callable) = self.callable.lock().take() else {
            return;
        };

        let (outcome, next) = match panic::catch_unwind(AssertUnwindSafe(callable)) {
            Ok(Ok(value)) => (Ok(value), DONE),
            Ok(Err(err)) => (Err(TaskError::Failed(err)), EXCEPTION),
            Err(payload) => (Err(TaskError::Panicked(panic_message(&*payload))), EXCEPTION),
        };
        *self.outcome.lock() = Some(outcome);

        // A failed transition means a get() caller moved us to WAITING.
        if !self.transition(PROCESSING, next) {
            self.notify_waiting(next);
        }
    }

    fn notify_waiting(&self, next: u8) {
        let _guard = self.monitor.lock();
        self.state.store(next, Ordering::Release);
        self.parked.notify_all();
    }

    fn patiently_wait(&self) {
        let mut guard = self.monitor.lock();
        while self.state() == WAITING {
            self.parked.wait(&mut guard);
        }
    }

    fn take_outcome(&self) -> Result<T, TaskError<E>> {
        match self.outcome.lock().take() {
            Some(outcome) => outcome,
            None => Err(TaskError::Cancelled),
        }
    }
}

impl<T, E> Job for Task<T, E>
where
    T: Send,
    E: Send,
{
    fn handle(&self) {
        if self.transition(READY, PROCESSING) {
            self.calculate();
        }
    }

    fn cancel(&self) -> bool {
        if self.transition(READY, CANCELLED) {
            self.callable.lock().take();
            true
        } else {
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle to the eventual result of a submitted task
pub struct TaskHandle<T, E> {
    task: Arc<Task<T, E>>,
    queue: Option<Receiver<Arc<dyn Job>>>,
}

impl<T, E> TaskHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Current state of the task
    #[inline]
    #[must_use]
    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.task.state())
    }

    /// Whether the task has finished (successfully, with an error, or by
    /// cancellation)
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.task.state(), DONE | EXCEPTION | CANCELLED)
    }

    /// Cancel the task if it has not started yet
    ///
    /// Returns false once processing has begun.
    pub fn cancel(&self) -> bool {
        self.task.cancel()
    }

    /// Block until the task completes and return its result
    ///
    /// While waiting, the calling thread runs other queued tasks. If the task
    /// itself is still queued, the caller runs it directly.
    ///
    /// # Errors
    /// Re-raises the task's error as [`TaskError::Failed`], a panic as
    /// [`TaskError::Panicked`], and reports [`TaskError::Cancelled`] for
    /// tasks cancelled before they started.
    pub fn get(self) -> Result<T, TaskError<E>> {
        loop {
            match self.task.state() {
                DONE | EXCEPTION => return self.task.take_outcome(),
                CANCELLED => return Err(TaskError::Cancelled),
                PROCESSING => {
                    if self.task.transition(PROCESSING, WAITING) {
                        self.impatiently_wait();
                    }
                }
                WAITING => self.impatiently_wait(),
                READY => self.task.handle(),
                other => unreachable!("invalid task state {other}"),
            }
        }
    }

    fn impatiently_wait(&self) {
        if let Some(queue) = &self.queue {
            while self.task.state() == WAITING {
                match queue.try_recv() {
                    Ok(job) => job.handle(),
                    Err(_) => break,
                }
            }
        }
        self.task.patiently_wait();
    }
}

impl<T, E> std::fmt::Debug for TaskHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("state", &TaskState::from_raw(self.task.state()))
            .finish()
    }
}

/// Fixed-size pool of cooperative workers
///
/// # Example
/// ```
/// use remap_kernel::Scheduler;
///
/// let scheduler = Scheduler::new(2).unwrap();
/// let handles: Vec<_> = (0..8u64)
///     .map(|n| scheduler.submit(move || Ok::<_, std::io::Error>(n * n)).unwrap())
///     .collect();
///
/// let squares: Vec<u64> = handles.into_iter().map(|h| h.get().unwrap()).collect();
/// assert_eq!(squares, vec![0, 1, 4, 9, 16, 25, 36, 49]);
/// assert!(scheduler.shutdown().is_empty());
/// ```
pub struct Scheduler {
    sender: Mutex<Option<Sender<Arc<dyn Job>>>>,
    receiver: Receiver<Arc<dyn Job>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    shutdown: Arc<AtomicBool>,
    failures: Arc<Mutex<Vec<WorkerFailure>>>,
}

impl Scheduler {
    /// Default worker thread name prefix
    pub const DEFAULT_THREAD_NAME: &'static str = "remap-processor";

    /// Create a scheduler with `workers` threads
    ///
    /// # Errors
    /// Returns [`SchedulerError::Spawn`] if a worker thread cannot be started.
    pub fn new(workers: usize) -> Result<Self, SchedulerError> {
        Self::with_thread_name(workers, Self::DEFAULT_THREAD_NAME)
    }

    /// Create a scheduler whose threads are named `{prefix}-{n}`
    ///
    /// # Errors
    /// Returns [`SchedulerError::Spawn`] if a worker thread cannot be started.
    pub fn with_thread_name(workers: usize, prefix: &str) -> Result<Self, SchedulerError> {
        let (sender, receiver) = channel::unbounded::<Arc<dyn Job>>();
        let scheduler = Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            workers: Mutex::new(Vec::with_capacity(workers)),
            worker_count: workers,
            shutdown: Arc::new(AtomicBool::new(false)),
            failures: Arc::new(Mutex::new(Vec::new())),
        };

        for index in 0..workers {
            let name = format!("{prefix}-{index}");
            let receiver = scheduler.receiver.clone();
            let shutdown = Arc::clone(&scheduler.shutdown);
            let failures = Arc::clone(&scheduler.failures);
            let thread_name = name.clone();

            let worker = thread::Builder::new()
                .name(name)
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job.handle();
                    }
                    if !shutdown.load(Ordering::Acquire) {
                        failures.lock().push(WorkerFailure {
                            thread: thread_name,
                            message: "task queue disconnected before shutdown".to_string(),
                        });
                    }
                })
                .map_err(SchedulerError::Spawn)?;
            scheduler.workers.lock().push(worker);
        }

        tracing::debug!(workers, "scheduler started");
        Ok(scheduler)
    }

    /// Number of worker threads (0 = synchronous)
    #[inline]
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Whether [`Scheduler::shutdown`] has been called
    #[inline]
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Queue a task
    ///
    /// # Errors
    /// Fails fast with [`SchedulerError::Shutdown`] after shutdown.
    pub fn submit<T, E, F>(&self, task: F) -> Result<TaskHandle<T, E>, SchedulerError>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            return Err(SchedulerError::Shutdown);
        };

        let task = Arc::new(Task::new(Box::new(task)));
        if self.worker_count == 0 {
            drop(guard);
            task.handle();
            return Ok(TaskHandle { task, queue: None });
        }

        let job: Arc<dyn Job> = Arc::clone(&task) as Arc<dyn Job>;
        sender.send(job).map_err(|_| SchedulerError::Shutdown)?;
        Ok(TaskHandle {
            task,
            queue: Some(self.receiver.clone()),
        })
    }

    /// Stop accepting work, cancel queued tasks and join the workers
    ///
    /// Tasks already running finish first. Returns every failure that
    /// escaped a worker outside a tracked task. Calling it again returns an
    /// empty list. Must not be called from inside a task.
    pub fn shutdown(&self) -> Vec<WorkerFailure> {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }

        let sender = self.sender.lock().take();
        let mut cancelled = 0usize;
        while let Ok(job) = self.receiver.try_recv() {
            if job.cancel() {
                cancelled += 1;
            }
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            let thread = worker.thread().name().unwrap_or("worker").to_string();
            if let Err(payload) = worker.join() {
                self.failures.lock().push(WorkerFailure {
                    thread,
                    message: panic_message(&*payload),
                });
            }
        }

        tracing::debug!(cancelled, "scheduler shut down");
        std::mem::take(&mut *self.failures.lock())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("worker_count", &self.worker_count)
            .field("queued", &self.receiver.len())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for failure in self.shutdown() {
            tracing::warn!("{failure}");
        }
    }
}
