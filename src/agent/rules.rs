use std::sync::Mutex;

use regex::Regex;

use crate::agent::error::{invalid_rule, AgentResult};

/// A compiled user rule. `replacement == None` marks an ignoring rule.
#[derive(Clone, Debug)]
pub struct NamingRule {
    pattern: Regex,
    replacement: Option<String>,
}

impl NamingRule {
    pub fn new(pattern: &str, replacement: Option<String>) -> AgentResult<Self> {
        let pattern = Regex::new(pattern).map_err(|err| {
            invalid_rule(format!("Invalid naming rule pattern {pattern:?}: {err}"))
        })?;
        Ok(Self {
            pattern,
            replacement,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    pub fn is_ignore(&self) -> bool {
        self.replacement.is_none()
    }

    fn apply(&self, input: &str) -> Option<RuleOutcome> {
        if !self.pattern.is_match(input) {
            return None;
        }
        Some(match &self.replacement {
            // Only the first match is rewritten; `$n` refers to capture groups.
            Some(replacement) => RuleOutcome::Renamed(
                self.pattern.replace(input, replacement.as_str()).into_owned(),
            ),
            None => RuleOutcome::Ignored,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleOutcome {
    Renamed(String),
    Ignored,
    Unmatched,
}

/// Append-only store of user naming rules.
///
/// Rules are evaluated in registration order and the first matching rule decides the outcome.
/// Rules cannot be removed or reordered once added.
#[derive(Debug, Default)]
pub struct NamingRules {
    rules: Mutex<Vec<NamingRule>>,
}

impl NamingRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, pattern: &str, replacement: Option<String>) -> AgentResult<()> {
        let rule = NamingRule::new(pattern, replacement)?;
        self.lock().push(rule);
        Ok(())
    }

    pub fn normalize(&self, input: &str) -> RuleOutcome {
        self.lock()
            .iter()
            .find_map(|rule| rule.apply(input))
            .unwrap_or(RuleOutcome::Unmatched)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<NamingRule> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NamingRule>> {
        self.rules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
