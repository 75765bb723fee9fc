pub const API_LOGGER_NAME: &str = "@apm/instrumentation";

pub const CUSTOM_CATEGORY: &str = "Custom";
pub const CONTROLLER_CATEGORY: &str = "Controller";
pub const DEFAULT_VERB: &str = "GET";

/// Only this many leading bytes of the license key take part in name obfuscation.
pub const OBFUSCATION_KEY_LENGTH: usize = 13;

pub const RUM_SCRIPT_OPEN: &str = "<script type='text/javascript'>window.NREUM||(NREUM={});NREUM.info = ";
pub const RUM_SCRIPT_CLOSE: &str = "</script>";
