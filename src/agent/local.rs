use std::sync::{Arc, Mutex};

use crate::agent::config::AgentConfig;
use crate::agent::logger::LOGGER;
use crate::agent::rules::{NamingRules, RuleOutcome};
use crate::agent::tracer::Tracer;
use crate::agent::types::{AgentHandle, NoticedError, Transaction};

const WEB_TRANSACTION_PREFIX: &str = "WebTransaction";

/// In-process agent: configuration snapshot, tracer, user rules and an error collector.
#[derive(Debug)]
pub struct Agent {
    config: Arc<AgentConfig>,
    tracer: Tracer,
    rules: NamingRules,
    errors: Mutex<Vec<CollectedError>>,
}

/// An error as kept by the collector, with the name its transaction had when it was reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectedError {
    pub transaction_name: Option<String>,
    pub error: NoticedError,
}

/// Final reporting decision for a finished transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDecision {
    pub name: String,
    pub ignore: bool,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config: Arc::new(config),
            tracer: Tracer::new(),
            rules: NamingRules::new(),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn rules(&self) -> &NamingRules {
        &self.rules
    }

    pub fn errors(&self) -> Vec<CollectedError> {
        self.lock_errors().clone()
    }

    /// Resolves the reported name of `transaction` and whether it is dropped.
    ///
    /// An explicit partial name is used as-is. Otherwise the URL goes through the user rules.
    /// `force_ignore`, when set, overrides the rule outcome in either direction.
    pub fn finalize(&self, transaction: &dyn Transaction) -> TransactionDecision {
        let (name, rule_ignored) = match transaction.partial_name() {
            Some(partial) if !partial.is_empty() => {
                (format!("{WEB_TRANSACTION_PREFIX}/{partial}"), false)
            }
            _ => {
                let url = transaction.url().unwrap_or_else(|| "/".to_string());
                match self.rules.normalize(&url) {
                    RuleOutcome::Renamed(normalized) => (
                        format!("{WEB_TRANSACTION_PREFIX}/NormalizedUri{normalized}"),
                        false,
                    ),
                    RuleOutcome::Ignored => (format!("{WEB_TRANSACTION_PREFIX}/Uri{url}"), true),
                    RuleOutcome::Unmatched => {
                        (format!("{WEB_TRANSACTION_PREFIX}/Uri{url}"), false)
                    }
                }
            }
        };

        TransactionDecision {
            name,
            ignore: transaction.force_ignore().unwrap_or(rule_ignored),
        }
    }

    fn register(&self, pattern: &str, replacement: Option<String>) {
        if let Err(err) = self.rules.add(pattern, replacement) {
            LOGGER.error(err.to_string());
        }
    }

    fn lock_errors(&self) -> std::sync::MutexGuard<'_, Vec<CollectedError>> {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AgentHandle for Agent {
    fn current_transaction(&self) -> Option<Arc<dyn Transaction>> {
        self.tracer.current_transaction()
    }

    fn register_naming_rule(&self, pattern: &str, replacement: &str) {
        self.register(pattern, Some(replacement.to_string()));
    }

    fn register_ignore_rule(&self, pattern: &str) {
        self.register(pattern, None);
    }

    fn report_error(&self, transaction: Option<Arc<dyn Transaction>>, error: NoticedError) {
        let transaction_name = transaction.and_then(|transaction| transaction.partial_name());
        self.lock_errors().push(CollectedError {
            transaction_name,
            error,
        });
    }

    fn configuration(&self) -> Arc<AgentConfig> {
        Arc::clone(&self.config)
    }
}
