use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::agent::types::Transaction;

/// A web request tracked by the in-process [`Agent`](crate::agent::Agent).
#[derive(Debug)]
pub struct WebTransaction {
    url: Option<String>,
    verb: Option<String>,
    queue_time: Duration,
    start: Instant,
    state: Mutex<TransactionState>,
}

#[derive(Debug, Default)]
struct TransactionState {
    partial_name: Option<String>,
    force_ignore: Option<bool>,
    finished: Option<Duration>,
}

impl WebTransaction {
    /// Starts the timer immediately.
    pub fn new(url: Option<String>, verb: Option<String>) -> Self {
        Self::started_at(url, verb, Instant::now())
    }

    pub fn started_at(url: Option<String>, verb: Option<String>, start: Instant) -> Self {
        Self {
            url,
            verb,
            queue_time: Duration::ZERO,
            start,
            state: Mutex::new(TransactionState::default()),
        }
    }

    /// Time the request spent queued in front of the application (e.g. from a proxy header).
    pub fn with_queue_time(mut self, queue_time: Duration) -> Self {
        self.queue_time = queue_time;
        self
    }

    /// Stops the timer. Later calls keep the first measured duration.
    pub fn finish(&self) -> Duration {
        let mut state = self.lock_state();
        *state.finished.get_or_insert_with(|| self.start.elapsed())
    }

    pub fn is_finished(&self) -> bool {
        self.lock_state().finished.is_some()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, TransactionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transaction for WebTransaction {
    fn partial_name(&self) -> Option<String> {
        self.lock_state().partial_name.clone()
    }

    fn set_partial_name(&self, name: String) {
        self.lock_state().partial_name = Some(name);
    }

    fn force_ignore(&self) -> Option<bool> {
        self.lock_state().force_ignore
    }

    fn set_force_ignore(&self, ignore: bool) {
        self.lock_state().force_ignore = Some(ignore);
    }

    fn url(&self) -> Option<String> {
        self.url.clone()
    }

    fn verb(&self) -> Option<String> {
        self.verb.clone()
    }

    fn queue_time(&self) -> Duration {
        self.queue_time
    }

    fn elapsed(&self) -> Duration {
        match self.lock_state().finished {
            Some(duration) => duration,
            None => self.start.elapsed(),
        }
    }
}
