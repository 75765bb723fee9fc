use std::sync::Arc;

use crate::agent::{AgentHandle, NoticedError, Transaction};
use crate::api::browser::browser_timing_header;
use crate::api::constants::{API_LOGGER_NAME, CONTROLLER_CATEGORY, CUSTOM_CATEGORY, DEFAULT_VERB};
use crate::api::error::{
    invalid_argument, no_transaction, InstrumentationError, InstrumentationErrorCode,
    InstrumentationResult,
};
use crate::logger::Logger;

/// Calls an instrumented application makes to name, filter and annotate its transactions.
///
/// Every method is best-effort: problems are reported through the logger and never surface to
/// the caller, so instrumentation cannot take the host application down.
#[derive(Clone)]
pub struct InstrumentationApi {
    agent: Arc<dyn AgentHandle>,
    logger: Logger,
}

impl std::fmt::Debug for InstrumentationApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentationApi")
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl InstrumentationApi {
    pub fn new(agent: Arc<dyn AgentHandle>) -> Self {
        Self::with_logger(agent, Logger::new(API_LOGGER_NAME))
    }

    pub fn with_logger(agent: Arc<dyn AgentHandle>, logger: Logger) -> Self {
        Self { agent, logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Names the current transaction `Custom/<name>`.
    pub fn set_transaction_name(&self, name: &str) {
        let result = self.name_transaction(name);
        self.absorb(result);
    }

    /// Names the current transaction `Controller/<name>/<action>`.
    ///
    /// Without an action the request's HTTP method is used, falling back to `GET`.
    pub fn set_controller_name(&self, name: &str, action: Option<&str>) {
        let result = self.name_controller(name, action);
        self.absorb(result);
    }

    /// Forces the current transaction to be ignored (`true`) or reported (`false`), overriding
    /// whatever the naming rules decide.
    pub fn set_ignore_transaction(&self, ignored: bool) {
        let result = self
            .require_transaction(|| no_transaction("No transaction found to ignore."))
            .map(|transaction| transaction.set_force_ignore(ignored));
        self.absorb(result);
    }

    /// Hands `error` to the agent's error collector, attached to the current transaction if any.
    ///
    /// Accepts messages and boxed errors. Borrowed concrete errors go through
    /// [`InstrumentationApi::notice_error_from`].
    pub fn notice_error(&self, error: impl Into<NoticedError>) {
        let transaction = self.agent.current_transaction();
        self.agent.report_error(transaction, error.into());
    }

    /// Reports a borrowed error value, recording its `source()` chain as the stack.
    pub fn notice_error_from(&self, error: &(dyn std::error::Error + 'static)) {
        self.notice_error(NoticedError::from_error(error));
    }

    /// Renames transactions whose URL matches `pattern` to `/<name>`.
    pub fn add_naming_rule(&self, pattern: &str, name: &str) {
        let result = Self::validate_naming_rule(pattern, name)
            .map(|()| self.agent.register_naming_rule(pattern, &format!("/{name}")));
        self.absorb(result);
    }

    /// Ignores transactions whose URL matches `pattern`.
    pub fn add_ignoring_rule(&self, pattern: &str) {
        let result = if pattern.is_empty() {
            Err(invalid_argument("Must include a URL pattern to ignore."))
        } else {
            self.agent.register_ignore_rule(pattern);
            Ok(())
        };
        self.absorb(result);
    }

    /// Returns the real user monitoring script for the current transaction.
    ///
    /// When the header cannot be generated an HTML comment carrying the reason's code is
    /// returned instead, so the result is always safe to embed in a page.
    pub fn get_browser_timing_header(&self) -> String {
        let config = self.agent.configuration();
        match browser_timing_header(&config, self.agent.current_transaction()) {
            Ok(header) => header,
            Err(err) => {
                self.logger.emit(err.to_log_record());
                match err.code {
                    InstrumentationErrorCode::BrowserHeader(issue) => issue.comment(),
                    _ => String::new(),
                }
            }
        }
    }

    fn name_transaction(&self, name: &str) -> InstrumentationResult<()> {
        let transaction = self.require_transaction(|| {
            no_transaction(format!("No transaction found when setting name to '{name}'."))
                .with_field("name", name)
        })?;
        Self::require_name(transaction.as_ref(), name, "set_transaction_name")?;
        transaction.set_partial_name(format!("{CUSTOM_CATEGORY}/{name}"));
        Ok(())
    }

    fn name_controller(&self, name: &str, action: Option<&str>) -> InstrumentationResult<()> {
        let transaction = self.require_transaction(|| {
            no_transaction(format!(
                "No transaction found when setting controller to '{name}'."
            ))
            .with_field("name", name)
        })?;
        Self::require_name(transaction.as_ref(), name, "set_controller_name")?;
        let action = match action.filter(|action| !action.is_empty()) {
            Some(action) => action.to_string(),
            None => transaction
                .verb()
                .filter(|verb| !verb.is_empty())
                .unwrap_or_else(|| DEFAULT_VERB.to_string()),
        };
        transaction.set_partial_name(format!("{CONTROLLER_CATEGORY}/{name}/{action}"));
        Ok(())
    }

    fn require_transaction<F>(&self, missing: F) -> InstrumentationResult<Arc<dyn Transaction>>
    where
        F: FnOnce() -> InstrumentationError,
    {
        self.agent.current_transaction().ok_or_else(missing)
    }

    fn require_name(
        transaction: &dyn Transaction,
        name: &str,
        operation: &str,
    ) -> InstrumentationResult<()> {
        if !name.is_empty() {
            return Ok(());
        }
        Err(match transaction.url() {
            Some(url) => invalid_argument(format!(
                "Must include name in {operation} call for URL {url}."
            ))
            .with_field("url", url),
            None => invalid_argument(format!("Must include name in {operation} call.")),
        })
    }

    fn validate_naming_rule(pattern: &str, name: &str) -> InstrumentationResult<()> {
        if name.is_empty() {
            return Err(invalid_argument(
                "Simple naming rules require a replacement name.",
            ));
        }
        if pattern.is_empty() {
            return Err(invalid_argument("Naming rules require a URL pattern.")
                .with_field("name", name));
        }
        Ok(())
    }

    fn absorb(&self, result: InstrumentationResult<()>) {
        if let Err(err) = result {
            self.logger.emit(err.to_log_record());
        }
    }
}
