#![doc = include_str!("README.md")]
mod browser;
mod constants;
mod error;
mod instrumentation;
mod obfuscation;

#[doc(inline)]
pub use instrumentation::InstrumentationApi;

#[doc(inline)]
pub use browser::{browser_timing_header, rum_info, BrowserHeaderIssue, RumInfo};

#[doc(inline)]
pub use constants::{
    API_LOGGER_NAME,
    CONTROLLER_CATEGORY,
    CUSTOM_CATEGORY,
    DEFAULT_VERB,
    OBFUSCATION_KEY_LENGTH,
};

#[doc(inline)]
pub use error::{
    browser_header, deobfuscation_error, invalid_argument, no_transaction, serialization_error,
    InstrumentationError, InstrumentationErrorCode, InstrumentationResult,
};

#[doc(inline)]
pub use obfuscation::{deobfuscate, obfuscate};
