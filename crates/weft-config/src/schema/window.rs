//! Defaults applied to windows the host does not configure explicitly.

use serde::{Deserialize, Serialize};
use weft_common::Theme;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowDefaults {
    pub title: String,
    /// Inner width in physical pixels (valid range: 1-16384).
    pub width: u32,
    /// Inner height in physical pixels (valid range: 1-16384).
    pub height: u32,
    pub resizable: bool,
    pub decorated: bool,
    pub visible: bool,
    /// Forced theme; `None` follows the system.
    pub theme: Option<Theme>,
}

impl Default for WindowDefaults {
    fn default() -> Self {
        Self {
            title: "weft".into(),
            width: 800,
            height: 600,
            resizable: true,
            decorated: true,
            visible: true,
            theme: None,
        }
    }
}
