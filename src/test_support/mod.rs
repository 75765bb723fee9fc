//! Test doubles shared across the crate's unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::agent::{AgentConfig, AgentHandle, NoticedError, Transaction};
use crate::logger::{LogRecord, Logger};

/// A registration as seen by the agent, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisteredRule {
    Naming { pattern: String, replacement: String },
    Ignore { pattern: String },
}

/// Agent double whose current transaction is set explicitly by the test.
pub struct FakeAgent {
    config: Arc<AgentConfig>,
    transaction: Mutex<Option<Arc<dyn Transaction>>>,
    rules: Mutex<Vec<RegisteredRule>>,
    errors: Mutex<Vec<(Option<String>, NoticedError)>>,
}

impl FakeAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config: Arc::new(config),
            transaction: Mutex::new(None),
            rules: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn set_transaction(&self, transaction: Arc<dyn Transaction>) {
        *self.transaction.lock().unwrap() = Some(transaction);
    }

    pub fn registered_rules(&self) -> Vec<RegisteredRule> {
        self.rules.lock().unwrap().clone()
    }

    /// Reported errors paired with the URL of the transaction they were attached to.
    pub fn reported_errors(&self) -> Vec<(Option<String>, NoticedError)> {
        self.errors.lock().unwrap().clone()
    }
}

impl AgentHandle for FakeAgent {
    fn current_transaction(&self) -> Option<Arc<dyn Transaction>> {
        self.transaction.lock().unwrap().clone()
    }

    fn register_naming_rule(&self, pattern: &str, replacement: &str) {
        self.rules.lock().unwrap().push(RegisteredRule::Naming {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        });
    }

    fn register_ignore_rule(&self, pattern: &str) {
        self.rules.lock().unwrap().push(RegisteredRule::Ignore {
            pattern: pattern.to_string(),
        });
    }

    fn report_error(&self, transaction: Option<Arc<dyn Transaction>>, error: NoticedError) {
        let url = transaction.and_then(|transaction| transaction.url());
        self.errors.lock().unwrap().push((url, error));
    }

    fn configuration(&self) -> Arc<AgentConfig> {
        Arc::clone(&self.config)
    }
}

/// Transaction double with a settable timer.
#[derive(Debug, Default)]
pub struct FakeTransaction {
    url: Option<String>,
    verb: Option<String>,
    queue_time: Duration,
    elapsed: Mutex<Duration>,
    partial_name: Mutex<Option<String>>,
    force_ignore: Mutex<Option<bool>>,
}

impl FakeTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_verb(mut self, verb: &str) -> Self {
        self.verb = Some(verb.to_string());
        self
    }

    pub fn with_queue_time(mut self, queue_time: Duration) -> Self {
        self.queue_time = queue_time;
        self
    }

    pub fn with_elapsed(self, elapsed: Duration) -> Self {
        self.set_elapsed(elapsed);
        self
    }

    pub fn set_elapsed(&self, elapsed: Duration) {
        *self.elapsed.lock().unwrap() = elapsed;
    }
}

impl Transaction for FakeTransaction {
    fn partial_name(&self) -> Option<String> {
        self.partial_name.lock().unwrap().clone()
    }

    fn set_partial_name(&self, name: String) {
        *self.partial_name.lock().unwrap() = Some(name);
    }

    fn force_ignore(&self) -> Option<bool> {
        *self.force_ignore.lock().unwrap()
    }

    fn set_force_ignore(&self, ignore: bool) {
        *self.force_ignore.lock().unwrap() = Some(ignore);
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
        *self.elapsed.lock().unwrap()
    }
}

/// Replaces the handler of `logger` with one that records every emitted record.
pub fn capture_logs(logger: &Logger) -> Arc<Mutex<Vec<LogRecord>>> {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    logger.set_log_handler(move |_, record| {
        sink.lock().unwrap().push(record.clone());
    });
    records
}
