use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentErrorCode {
    InvalidRule,
}

impl AgentErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentErrorCode::InvalidRule => "agent/invalid-rule",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AgentError {
    pub code: AgentErrorCode,
    message: String,
}

impl AgentError {
    pub fn new(code: AgentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for AgentError {}

pub type AgentResult<T> = Result<T, AgentError>;

pub fn invalid_rule(message: impl Into<String>) -> AgentError {
    AgentError::new(AgentErrorCode::InvalidRule, message)
}
