//! Collaborators consumed by the instrumentation surface.
//!
//! [`AgentHandle`] and [`Transaction`] are the seams the [`InstrumentationApi`](crate::api::InstrumentationApi)
//! talks through. [`Agent`] is an in-process implementation built from a [`Tracer`] that scopes the
//! current transaction to the running task or thread, an append-only [`NamingRules`] store and an
//! in-memory error collector.

mod config;
mod error;
mod local;
mod logger;
mod rules;
mod tracer;
mod transaction;
mod types;

#[doc(inline)]
pub use config::{AgentConfig, BrowserMonitoringConfig};

#[doc(inline)]
pub use error::{invalid_rule, AgentError, AgentErrorCode, AgentResult};

#[doc(inline)]
pub use local::{Agent, CollectedError, TransactionDecision};

#[doc(inline)]
pub use rules::{NamingRule, NamingRules, RuleOutcome};

#[doc(inline)]
pub use tracer::{Tracer, TransactionGuard};

#[doc(inline)]
pub use transaction::WebTransaction;

#[doc(inline)]
pub use types::{AgentHandle, NoticedError, Transaction};
