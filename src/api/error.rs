use std::fmt::{Display, Formatter};

use crate::api::browser::BrowserHeaderIssue;
use crate::logger::{LogLevel, LogRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstrumentationErrorCode {
    NoTransaction,
    InvalidArgument,
    BrowserHeader(BrowserHeaderIssue),
    Serialization,
    Deobfuscation,
}

impl InstrumentationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentationErrorCode::NoTransaction => "api/no-transaction",
            InstrumentationErrorCode::InvalidArgument => "api/invalid-argument",
            InstrumentationErrorCode::BrowserHeader(_) => "api/browser-header",
            InstrumentationErrorCode::Serialization => "api/serialization",
            InstrumentationErrorCode::Deobfuscation => "api/deobfuscation",
        }
    }

    /// Missing context and incomplete configuration are expected at runtime; the rest is misuse.
    pub fn log_level(&self) -> LogLevel {
        match self {
            InstrumentationErrorCode::NoTransaction
            | InstrumentationErrorCode::BrowserHeader(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InstrumentationError {
    pub code: InstrumentationErrorCode,
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl InstrumentationError {
    pub fn new(code: InstrumentationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The single log line this error is reported as.
    pub fn to_log_record(&self) -> LogRecord {
        self.fields.iter().fold(
            LogRecord::new(self.code.log_level(), self.message.clone())
                .with_field("code", self.code_str()),
            |record, (key, value)| record.with_field(*key, value.clone()),
        )
    }
}

impl Display for InstrumentationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for InstrumentationError {}

pub type InstrumentationResult<T> = Result<T, InstrumentationError>;

pub fn no_transaction(message: impl Into<String>) -> InstrumentationError {
    InstrumentationError::new(InstrumentationErrorCode::NoTransaction, message)
}

pub fn invalid_argument(message: impl Into<String>) -> InstrumentationError {
    InstrumentationError::new(InstrumentationErrorCode::InvalidArgument, message)
}

pub fn browser_header(issue: BrowserHeaderIssue) -> InstrumentationError {
    InstrumentationError::new(InstrumentationErrorCode::BrowserHeader(issue), issue.message())
        .with_field("issue", issue.code().to_string())
}

pub fn serialization_error(message: impl Into<String>) -> InstrumentationError {
    InstrumentationError::new(InstrumentationErrorCode::Serialization, message)
}

pub fn deobfuscation_error(message: impl Into<String>) -> InstrumentationError {
    InstrumentationError::new(InstrumentationErrorCode::Deobfuscation, message)
}
