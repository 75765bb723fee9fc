//! Real user monitoring header generation.
//!
//! The header is an inline script that hands the transaction's timing data to a separately
//! shipped browser loader. Its markup and JSON layout are consumed verbatim by that loader.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::{AgentConfig, Transaction};
use crate::api::constants::{RUM_SCRIPT_CLOSE, RUM_SCRIPT_OPEN};
use crate::api::error::{browser_header, serialization_error, InstrumentationResult};
use crate::api::obfuscation::obfuscate;
use crate::util::{stringify, stringify_pretty};

/// Reasons a browser timing header cannot be generated, in the order they are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BrowserHeaderIssue {
    MissingConfig,
    Disabled,
    MissingTransaction,
    MissingTransactionName,
    MissingApplicationId,
    MissingBrowserKey,
}

impl BrowserHeaderIssue {
    /// Stable numeric code embedded in the returned HTML comment.
    pub fn code(self) -> u8 {
        match self {
            BrowserHeaderIssue::Disabled => 0,
            BrowserHeaderIssue::MissingTransaction => 1,
            BrowserHeaderIssue::MissingConfig => 2,
            BrowserHeaderIssue::MissingTransactionName => 3,
            BrowserHeaderIssue::MissingApplicationId => 4,
            BrowserHeaderIssue::MissingBrowserKey => 5,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            BrowserHeaderIssue::Disabled => {
                "NREUM: no browser monitoring headers generated; disabled"
            }
            BrowserHeaderIssue::MissingTransaction => {
                "NREUM: transaction missing while generating browser monitoring headers"
            }
            BrowserHeaderIssue::MissingConfig => {
                "NREUM: config.browser_monitoring missing, something is probably wrong"
            }
            BrowserHeaderIssue::MissingTransactionName => {
                "NREUM: browser_monitoring headers need a transaction name"
            }
            BrowserHeaderIssue::MissingApplicationId => {
                "NREUM: browser_monitoring requires valid application_id"
            }
            BrowserHeaderIssue::MissingBrowserKey => {
                "NREUM: browser_monitoring requires valid browser_key"
            }
        }
    }

    /// Inert markup returned in place of the script.
    pub fn comment(self) -> String {
        format!("<!-- NREUM: ({}) -->", self.code())
    }
}

/// Data record assigned to `NREUM.info`. Field order is part of the wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RumInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon: Option<String>,
    #[serde(rename = "errorBeacon", skip_serializing_if = "Option::is_none")]
    pub error_beacon: Option<String>,
    #[serde(rename = "licenseKey")]
    pub license_key: String,
    #[serde(rename = "applicationID")]
    pub application_id: String,
    #[serde(rename = "applicationTime")]
    pub application_time: u64,
    #[serde(rename = "transactionName")]
    pub transaction_name: String,
    #[serde(rename = "queueTime")]
    pub queue_time: u64,
    #[serde(rename = "ttGuid")]
    pub tt_guid: String,
    #[serde(rename = "agentToken")]
    pub agent_token: Option<String>,
}

/// Runs the validation chain and builds the record for the current transaction.
///
/// The elapsed time is read from the transaction timer on every call.
pub fn rum_info(
    config: &AgentConfig,
    transaction: Option<Arc<dyn Transaction>>,
) -> InstrumentationResult<RumInfo> {
    let browser = config
        .browser_monitoring
        .as_ref()
        .ok_or_else(|| browser_header(BrowserHeaderIssue::MissingConfig))?;
    if !browser.enable {
        return Err(browser_header(BrowserHeaderIssue::Disabled));
    }
    let transaction =
        transaction.ok_or_else(|| browser_header(BrowserHeaderIssue::MissingTransaction))?;
    let name = transaction
        .partial_name()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| browser_header(BrowserHeaderIssue::MissingTransactionName))?;
    let application_id = config
        .application_id()
        .ok_or_else(|| browser_header(BrowserHeaderIssue::MissingApplicationId))?;
    let browser_key = browser
        .browser_key()
        .ok_or_else(|| browser_header(BrowserHeaderIssue::MissingBrowserKey))?;

    Ok(RumInfo {
        agent: browser.js_agent_file.clone(),
        beacon: browser.beacon.clone(),
        error_beacon: browser.error_beacon.clone(),
        license_key: browser_key.to_string(),
        application_id: application_id.to_string(),
        application_time: millis(transaction.elapsed()),
        transaction_name: obfuscate(&name, &config.license_key),
        queue_time: millis(transaction.queue_time()),
        tt_guid: String::new(),
        agent_token: None,
    })
}

/// Renders the inline script tag for the current transaction.
pub fn browser_timing_header(
    config: &AgentConfig,
    transaction: Option<Arc<dyn Transaction>>,
) -> InstrumentationResult<String> {
    let info = rum_info(config, transaction)?;
    let browser = config.browser_monitoring.as_ref();
    let debug = browser.is_some_and(|browser| browser.debug);
    let json = if debug {
        stringify_pretty(&info)
    } else {
        stringify(&info)
    }
    .map_err(|err| serialization_error(format!("Failed to serialize RUM info: {err}")))?;
    let loader = browser
        .and_then(|browser| browser.js_agent_loader.as_deref())
        .unwrap_or_default();

    Ok(format!("{RUM_SCRIPT_OPEN}{json}; {loader}{RUM_SCRIPT_CLOSE}"))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
