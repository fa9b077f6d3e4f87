//! Pixel render path settings.

use serde::{Deserialize, Serialize};
use weft_common::{Color, ScaleMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub scale_mode: ScaleMode,
    /// Letterbox colour as `#rrggbb` or `#rrggbbaa`. Alpha is ignored on
    /// presentation.
    pub background_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale_mode: ScaleMode::Fit,
            background_color: "#000000".into(),
        }
    }
}

impl RenderConfig {
    /// Parsed letterbox colour, or black if the string is malformed.
    pub fn background(&self) -> Color {
        Color::from_hex(&self.background_color).unwrap_or(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.scale_mode, ScaleMode::Fit);
        assert_eq!(config.background(), Color::BLACK);
    }

    #[test]
    fn render_background_parses() {
        let config: RenderConfig = toml::from_str(
            r##"
scale_mode = "integer"
background_color = "#1e1e2e"
"##,
        )
        .unwrap();
        assert_eq!(config.scale_mode, ScaleMode::Integer);
        assert_eq!(config.background(), Color::from_rgba(0x1e, 0x1e, 0x2e, 0xff));
    }

    #[test]
    fn render_bad_background_falls_back_to_black() {
        let config = RenderConfig {
            background_color: "teal".into(),
            ..Default::default()
        };
        assert_eq!(config.background(), Color::BLACK);
    }
}
