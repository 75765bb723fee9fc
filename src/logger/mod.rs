//! Named loggers used by the instrumentation surface and the reference agent.
//!
//! Every [`Logger`] carries its own level threshold and handler. The global level set through
//! [`set_log_level`] is applied to every live logger, and a user callback installed with
//! [`set_user_log_handler`] receives a [`LogCallbackParams`] for each record that passes the
//! threshold. Instrumentation never fails loudly, so these records are the only place where
//! misuse of the API becomes visible.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, Mutex, RwLock, Weak};

static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INSTANCES: LazyLock<Mutex<Vec<Weak<LoggerInner>>>> =
    LazyLock::new(|| Mutex::new(Vec::new()));

type SharedLogHandler = Arc<dyn Fn(&Logger, &LogRecord) + Send + Sync + 'static>;

/// A single emitted record, handed to log handlers.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub fields: Vec<(String, Value)>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("level", &self.log_level())
            .finish()
    }
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        let inner = Arc::new(LoggerInner::new(name.into()));
        track_instance(&inner);
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.log_level.load(Ordering::SeqCst))
    }

    pub fn set_log_level<L>(&self, level: L) -> Result<(), LogError>
    where
        L: IntoLogLevel,
    {
        let level = level.into_log_level()?;
        self.inner.log_level.store(level as u8, Ordering::SeqCst);
        Ok(())
    }

    /// Replaces the sink for this logger. The handler sees every record, regardless of level.
    pub fn set_log_handler<F>(&self, handler: F)
    where
        F: Fn(&Logger, &LogRecord) + Send + Sync + 'static,
    {
        *write_lock(&self.inner.log_handler) = Arc::new(handler);
    }

    pub fn reset_log_handler(&self) {
        *write_lock(&self.inner.log_handler) = default_log_handler_arc();
    }

    pub fn has_user_log_handler(&self) -> bool {
        read_lock(&self.inner.user_log_handler).is_some()
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LogRecord::new(LogLevel::Debug, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogRecord::new(LogLevel::Info, message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogRecord::new(LogLevel::Warn, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogRecord::new(LogLevel::Error, message));
    }

    /// Emits a fully built record, e.g. one carrying structured fields.
    pub fn emit(&self, record: LogRecord) {
        let user_handler = read_lock(&self.inner.user_log_handler).clone();
        if let Some(handler) = user_handler {
            handler(self, &record);
        }
        let handler = read_lock(&self.inner.log_handler).clone();
        handler(self, &record);
    }

    fn set_user_log_handler(&self, handler: Option<SharedLogHandler>) {
        *write_lock(&self.inner.user_log_handler) = handler;
    }

    fn from_inner(inner: Arc<LoggerInner>) -> Self {
        Self { inner }
    }
}

struct LoggerInner {
    name: String,
    log_level: AtomicU8,
    log_handler: RwLock<SharedLogHandler>,
    user_log_handler: RwLock<Option<SharedLogHandler>>,
}

impl LoggerInner {
    fn new(name: String) -> Self {
        let level = GLOBAL_LOG_LEVEL.load(Ordering::SeqCst);
        Self {
            name,
            log_level: AtomicU8::new(level),
            log_handler: RwLock::new(default_log_handler_arc()),
            user_log_handler: RwLock::new(None),
        }
    }
}

// A poisoned lock still holds a usable handler.
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn track_instance(inner: &Arc<LoggerInner>) {
    let mut instances = INSTANCES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    instances.push(Arc::downgrade(inner));
}

fn default_log_handler_arc() -> SharedLogHandler {
    Arc::new(default_log_handler)
}

fn default_log_handler(logger: &Logger, record: &LogRecord) {
    if record.level < logger.log_level() || record.level == LogLevel::Silent {
        return;
    }

    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let line = format_record(logger.name(), record);
    match record.level {
        LogLevel::Warn | LogLevel::Error => eprintln!("[{now}]  {line}"),
        _ => println!("[{now}]  {line}"),
    }
}

fn format_record(name: &str, record: &LogRecord) -> String {
    let mut line = format!("{name}: {} {}", record.level, record.message);
    for (key, value) in &record.fields {
        match value {
            Value::String(text) => line.push_str(&format!(" {key}={text}")),
            other => line.push_str(&format!(" {key}={other}")),
        }
    }
    line
}

fn with_instances<F>(mut f: F)
where
    F: FnMut(Logger),
{
    let mut instances = INSTANCES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut i = 0;
    while i < instances.len() {
        match instances[i].upgrade() {
            Some(inner) => {
                f(Logger::from_inner(inner));
                i += 1;
            }
            None => {
                instances.swap_remove(i);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Silent = 4,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Silent,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "fatal" => Ok(LogLevel::Error),
            "silent" | "off" => Ok(LogLevel::Silent),
            other => Err(LogError::InvalidLogLevel(other.to_string())),
        }
    }
}

pub trait IntoLogLevel {
    fn into_log_level(self) -> Result<LogLevel, LogError>;
}

impl IntoLogLevel for LogLevel {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        Ok(self)
    }
}

impl IntoLogLevel for &str {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        LogLevel::from_str(self)
    }
}

impl IntoLogLevel for String {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        LogLevel::from_str(&self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub level: Option<LogLevel>,
}

/// Payload delivered to a user log callback.
#[derive(Debug, Clone)]
pub struct LogCallbackParams {
    pub level: LogLevel,
    pub message: String,
    pub fields: Vec<(String, Value)>,
    pub logger_name: String,
}

pub type LogCallback = Arc<dyn Fn(LogCallbackParams) + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub enum LogError {
    InvalidLogLevel(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::InvalidLogLevel(level) => {
                write!(f, "Invalid value \"{level}\" assigned to `log_level`")
            }
        }
    }
}

impl std::error::Error for LogError {}

/// Sets the level of every live logger and of loggers created afterwards.
pub fn set_log_level<L>(level: L) -> Result<(), LogError>
where
    L: IntoLogLevel,
{
    let level = level.into_log_level()?;
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    with_instances(|logger| {
        let _ = logger.set_log_level(level);
    });
    Ok(())
}

/// Installs (or clears, with `None`) a callback on every live logger.
pub fn set_user_log_handler(callback: Option<LogCallback>, options: Option<LogOptions>) {
    let options = options.unwrap_or_default();

    match callback {
        Some(cb) => {
            let custom_level = options.level;
            with_instances(|logger| {
                let handler_cb = Arc::clone(&cb);
                let handler: SharedLogHandler =
                    Arc::new(move |instance: &Logger, record: &LogRecord| {
                        let threshold = custom_level.unwrap_or_else(|| instance.log_level());
                        if record.level < threshold {
                            return;
                        }
                        handler_cb(LogCallbackParams {
                            level: record.level,
                            message: record.message.clone(),
                            fields: record.fields.clone(),
                            logger_name: instance.name().to_owned(),
                        });
                    });
                logger.set_user_log_handler(Some(handler));
            });
        }
        None => {
            with_instances(|logger| {
                logger.set_user_log_handler(None);
            });
        }
    }
}

pub fn set_user_log_handler_fn<F>(callback: Option<F>, options: Option<LogOptions>)
where
    F: Fn(LogCallbackParams) + Send + Sync + 'static,
{
    let wrapped = callback.map(|cb| Arc::new(cb) as LogCallback);
    set_user_log_handler(wrapped, options);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    static TEST_GUARD: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    fn reset_logging() {
        set_log_level(LogLevel::Info).unwrap();
        set_user_log_handler(None, None);
    }

    #[test]
    fn handler_receives_structured_fields() {
        let logger = Logger::new("@apm/logger-fields-test");
        let records = Arc::new(Mutex::new(Vec::new()));
        let handler_records = Arc::clone(&records);
        logger.set_log_handler(move |_, record| {
            handler_records.lock().unwrap().push(record.clone());
        });

        logger.emit(
            LogRecord::new(LogLevel::Warn, "no transaction")
                .with_field("name", "Custom/Foo")
                .with_field("code", 3),
        );

        let stored = records.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].field("name"), Some(&Value::from("Custom/Foo")));
        assert_eq!(stored[0].field("code"), Some(&Value::from(3)));
        assert_eq!(stored[0].field("missing"), None);
    }

    #[test]
    fn global_level_filters_user_callbacks() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_logging();
        let logger = Logger::new("@apm/logger-level-test");
        let logger_name = logger.name().to_owned();
        set_log_level("warn").unwrap();

        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured_cb = Arc::clone(&captured);
        set_user_log_handler_fn(
            Some(move |params: LogCallbackParams| {
                if params.logger_name == logger_name {
                    captured_cb.lock().unwrap().push(params.level);
                }
            }),
            None,
        );
        assert!(logger.has_user_log_handler());

        logger.debug("debug message");
        logger.info("info message");
        logger.warn("warn message");
        logger.error("error message");

        let levels = captured.lock().unwrap().clone();
        assert_eq!(levels, [LogLevel::Warn, LogLevel::Error]);
        reset_logging();
    }

    #[test]
    fn user_handler_respects_custom_level() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_logging();
        let logger = Logger::new("@apm/logger-custom-level");
        let logger_name = logger.name().to_owned();

        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured_cb = Arc::clone(&captured);
        set_user_log_handler_fn(
            Some(move |params: LogCallbackParams| {
                if params.logger_name == logger_name {
                    captured_cb.lock().unwrap().push(params.message);
                }
            }),
            Some(LogOptions {
                level: Some(LogLevel::Error),
            }),
        );

        logger.warn("ignored");
        logger.error("kept");

        assert_eq!(captured.lock().unwrap().as_slice(), ["kept".to_string()]);
        reset_logging();
    }

    #[test]
    fn parses_level_aliases() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn formats_fields_after_message() {
        let record = LogRecord::new(LogLevel::Error, "bad rule").with_field("pattern", "^/a");
        assert_eq!(
            format_record("@apm/test", &record),
            "@apm/test: ERROR bad rule pattern=^/a"
        );
    }
}
