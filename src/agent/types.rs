use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::config::AgentConfig;

/// The agent-side capabilities the instrumentation surface relies on.
///
/// Implementations own the tracer, the rule store, the error collector and the configuration.
/// Every method must be cheap and must never block.
pub trait AgentHandle: Send + Sync {
    /// The transaction bound to the calling execution context, if any.
    fn current_transaction(&self) -> Option<Arc<dyn Transaction>>;

    /// Appends a rule that renames matching transactions to `replacement`.
    fn register_naming_rule(&self, pattern: &str, replacement: &str);

    /// Appends a rule that ignores matching transactions.
    fn register_ignore_rule(&self, pattern: &str);

    fn report_error(&self, transaction: Option<Arc<dyn Transaction>>, error: NoticedError);

    fn configuration(&self) -> Arc<AgentConfig>;
}

/// One in-flight unit of work, created and destroyed by the tracer.
///
/// Only the naming fields are writable. Implementations use interior mutability since a
/// transaction is shared between the tracer and whoever instruments the request.
pub trait Transaction: Send + Sync + Debug {
    fn partial_name(&self) -> Option<String>;

    fn set_partial_name(&self, name: String);

    fn force_ignore(&self) -> Option<bool>;

    fn set_force_ignore(&self, ignore: bool);

    fn url(&self) -> Option<String>;

    /// HTTP method of the request, when known.
    fn verb(&self) -> Option<String>;

    fn queue_time(&self) -> Duration;

    /// Time elapsed on the transaction timer, sampled at call time.
    fn elapsed(&self) -> Duration;
}

/// An application error handed to [`AgentHandle::report_error`].
///
/// No field is required; the error collector decides how to treat sparse values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NoticedError {
    pub name: Option<String>,
    pub message: Option<String>,
    pub stack: Option<String>,
}

impl NoticedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Captures the display message of `error`; its `source()` chain becomes the stack text.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            name: None,
            message: Some(error.to_string()),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

impl From<&str> for NoticedError {
    fn from(message: &str) -> Self {
        NoticedError::new(message)
    }
}

impl From<String> for NoticedError {
    fn from(message: String) -> Self {
        NoticedError::new(message)
    }
}

impl From<&(dyn std::error::Error + 'static)> for NoticedError {
    fn from(error: &(dyn std::error::Error + 'static)) -> Self {
        NoticedError::from_error(error)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for NoticedError {
    fn from(error: Box<dyn std::error::Error + Send + Sync>) -> Self {
        NoticedError::from_error(&*error)
    }
}
