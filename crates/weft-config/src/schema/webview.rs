//! Webview defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebViewDefaults {
    /// IPC channel name bound when the host does not pass one.
    pub channel: String,
    pub devtools: bool,
    pub transparent: bool,
    pub user_agent: Option<String>,
}

impl Default for WebViewDefaults {
    fn default() -> Self {
        Self {
            channel: "main".into(),
            devtools: false,
            transparent: false,
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webview_defaults() {
        let config = WebViewDefaults::default();
        assert_eq!(config.channel, "main");
        assert!(!config.devtools);
        assert!(!config.transparent);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn webview_user_agent_from_toml() {
        let config: WebViewDefaults =
            toml::from_str("user_agent = \"weft-test/1.0\"\ndevtools = true").unwrap();
        assert_eq!(config.user_agent.as_deref(), Some("weft-test/1.0"));
        assert!(config.devtools);
    }
}
