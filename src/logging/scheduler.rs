// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot timers for performance-mark expiry.
//!
//! The facade never sleeps itself; it asks a [`Scheduler`] to run a callback
//! after a delay. [`ManualScheduler`] keeps a deadline-ordered queue and fires
//! it on demand (virtual time for tests, or the real clock polled by the
//! facade). [`TokioScheduler`] spawns one sleeping task per timer.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Identifies a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Monotonic time since the scheduler was created
    fn now(&self) -> Duration;

    /// Run `callback` once, `delay` from now
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a pending callback. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);

    /// Fire callbacks whose deadline has passed
    fn poll(&self) {}

    /// Number of timers still pending
    fn pending(&self) -> usize;
}

#[derive(Default)]
struct TimerQueue {
    // Equal deadlines fire in scheduling order
    timers: BTreeMap<(Duration, TimerId), TimerCallback>,
    deadlines: HashMap<TimerId, Duration>,
}

impl TimerQueue {
    fn insert(&mut self, fire_at: Duration, id: TimerId, callback: TimerCallback) {
        self.timers.insert((fire_at, id), callback);
        self.deadlines.insert(id, fire_at);
    }

    fn remove(&mut self, id: TimerId) {
        if let Some(fire_at) = self.deadlines.remove(&id) {
            self.timers.remove(&(fire_at, id));
        }
    }

    /// Pop the earliest timer due at or before `deadline`
    fn pop_due(&mut self, deadline: Duration) -> Option<(Duration, TimerCallback)> {
        let entry = self.timers.first_entry()?;
        let (fire_at, id) = *entry.key();
        if fire_at > deadline {
            return None;
        }
        let callback = entry.remove();
        self.deadlines.remove(&id);
        Some((fire_at, callback))
    }

    fn len(&self) -> usize {
        self.timers.len()
    }
}

enum Clock {
    Virtual(AtomicU64),
    System(Instant),
}

impl Clock {
    fn now(&self) -> Duration {
        match self {
            Clock::Virtual(nanos) => Duration::from_nanos(nanos.load(Ordering::SeqCst)),
            Clock::System(start) => start.elapsed(),
        }
    }

    fn set_virtual(&self, at: Duration) {
        if let Clock::Virtual(nanos) = self {
            let at = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
            nanos.fetch_max(at, Ordering::SeqCst);
        }
    }
}

/// Deadline-ordered timer queue fired on demand
pub struct ManualScheduler {
    clock: Clock,
    queue: Mutex<TimerQueue>,
    next_id: AtomicU64,
}

impl ManualScheduler {
    /// Virtual clock starting at zero; only [`advance`](Self::advance) moves it
    pub fn new() -> Self {
        Self::with_clock(Clock::Virtual(AtomicU64::new(0)))
    }

    /// Real monotonic clock; due timers fire on [`Scheduler::poll`]
    pub fn system() -> Self {
        Self::with_clock(Clock::System(Instant::now()))
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            queue: Mutex::new(TimerQueue::default()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.clock, Clock::Virtual(_))
    }

    /// Move virtual time forward by `by`, firing every timer that falls due
    /// in deadline order. On a system clock this only fires what is already
    /// due.
    ///
    /// Callbacks run without the queue lock held, so they may schedule or
    /// cancel timers; a timer scheduled inside the window also fires.
    pub fn advance(&self, by: Duration) {
        let target = match self.clock {
            Clock::Virtual(_) => self.clock.now().saturating_add(by),
            Clock::System(_) => self.clock.now(),
        };
        loop {
            let due = match self.queue.lock() {
                Ok(mut queue) => queue.pop_due(target),
                Err(_) => None,
            };
            let Some((fire_at, callback)) = due else {
                break;
            };
            self.clock.set_virtual(fire_at);
            callback();
        }
        self.clock.set_virtual(target);
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        // Overlong delays park at the end of time instead of overflowing
        let fire_at = self.clock.now().saturating_add(delay);
        if let Ok(mut queue) = self.queue.lock() {
            queue.insert(fire_at, id, callback);
        }
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.remove(id);
        }
    }

    fn poll(&self) {
        self.advance(Duration::ZERO);
    }

    fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

/// One tokio task per timer; cancelling aborts the task
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
    start: tokio::time::Instant,
    tasks: Arc<Mutex<HashMap<TimerId, tokio::task::JoinHandle<()>>>>,
    next_id: AtomicU64,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            start: tokio::time::Instant::now(),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Scheduler on the runtime the caller is running in, if any
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        tokio::time::Instant::now().duration_since(self.start)
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let tasks = Arc::clone(&self.tasks);

        // Held across spawn so the task cannot deregister before it is registered
        let Ok(mut registered) = self.tasks.lock() else {
            return id;
        };
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut tasks) = tasks.lock() {
                tasks.remove(&id);
            }
            callback();
        });
        registered.insert(id, task);
        id
    }

    fn cancel(&self, id: TimerId) {
        let task = self.tasks.lock().ok().and_then(|mut tasks| tasks.remove(&id));
        if let Some(task) = task {
            task.abort();
        }
    }

    fn pending(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}

/// Tokio-backed scheduler inside a runtime, polled system clock otherwise
pub fn default_scheduler() -> Arc<dyn Scheduler> {
    match TokioScheduler::current() {
        Some(scheduler) => Arc::new(scheduler),
        None => Arc::new(ManualScheduler::system()),
    }
}
