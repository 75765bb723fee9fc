use serde::{Deserialize, Serialize};

/// Immutable configuration snapshot handed out by an [`AgentHandle`](crate::agent::AgentHandle).
///
/// The crate never reads configuration from disk or the environment; hosts build this value from
/// whatever source they use and may deserialize it with `serde`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub license_key: String,
    pub application_id: Option<String>,
    pub browser_monitoring: Option<BrowserMonitoringConfig>,
}

/// Settings for real user monitoring (the browser timing header).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserMonitoringConfig {
    pub enable: bool,
    pub browser_key: Option<String>,
    pub js_agent_file: Option<String>,
    pub js_agent_loader: Option<String>,
    pub beacon: Option<String>,
    pub error_beacon: Option<String>,
    /// Pretty-prints the embedded JSON. Field content is unchanged.
    pub debug: bool,
}

impl AgentConfig {
    /// Returns the application id, treating an empty string as unset.
    pub fn application_id(&self) -> Option<&str> {
        non_empty(self.application_id.as_deref())
    }
}

impl BrowserMonitoringConfig {
    /// Returns the browser key, treating an empty string as unset.
    pub fn browser_key(&self) -> Option<&str> {
        non_empty(self.browser_key.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_documents_with_defaults() {
        let config: AgentConfig = serde_json::from_value(serde_json::json!({
            "license_key": "0123456789ABC",
            "browser_monitoring": { "enable": true, "browser_key": "abc123" }
        }))
        .unwrap();

        assert_eq!(config.license_key, "0123456789ABC");
        assert_eq!(config.application_id(), None);
        let browser = config.browser_monitoring.unwrap();
        assert!(browser.enable);
        assert!(!browser.debug);
        assert_eq!(browser.browser_key(), Some("abc123"));
        assert_eq!(browser.js_agent_loader, None);
    }

    #[test]
    fn empty_identifiers_count_as_unset() {
        let config = AgentConfig {
            application_id: Some(String::new()),
            browser_monitoring: Some(BrowserMonitoringConfig {
                browser_key: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(config.application_id(), None);
        assert_eq!(config.browser_monitoring.unwrap().browser_key(), None);
    }
}
