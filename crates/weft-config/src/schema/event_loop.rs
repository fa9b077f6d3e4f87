//! Event loop configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use weft_common::ControlFlow;

/// Control-flow policy as written in config.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlFlowMode {
    Poll,
    #[default]
    Wait,
    WaitUntil,
}

/// Pump policy and stop behaviour of the event loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLoopConfig {
    pub control_flow: ControlFlowMode,
    /// Upper bound on one blocking pump when `control_flow = "wait_until"`
    /// (valid range: 1-60000).
    pub wait_until_ms: u64,
    /// Stop the loop once the last window has been destroyed.
    pub exit_on_last_window_closed: bool,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            control_flow: ControlFlowMode::Wait,
            wait_until_ms: 16,
            exit_on_last_window_closed: true,
        }
    }
}

impl EventLoopConfig {
    pub fn control_flow(&self) -> ControlFlow {
        match self.control_flow {
            ControlFlowMode::Poll => ControlFlow::Poll,
            ControlFlowMode::Wait => ControlFlow::Wait,
            ControlFlowMode::WaitUntil => {
                ControlFlow::WaitUntil(Duration::from_millis(self.wait_until_ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_loop_defaults() {
        let config = EventLoopConfig::default();
        assert_eq!(config.control_flow, ControlFlowMode::Wait);
        assert_eq!(config.wait_until_ms, 16);
        assert!(config.exit_on_last_window_closed);
        assert_eq!(config.control_flow(), ControlFlow::Wait);
    }

    #[test]
    fn wait_until_uses_millis() {
        let config: EventLoopConfig = toml::from_str(
            r#"
control_flow = "wait_until"
wait_until_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(
            config.control_flow(),
            ControlFlow::WaitUntil(Duration::from_millis(250))
        );
        assert!(config.exit_on_last_window_closed);
    }

    #[test]
    fn poll_ignores_wait_until_ms() {
        let config: EventLoopConfig = toml::from_str("control_flow = \"poll\"").unwrap();
        assert_eq!(config.control_flow(), ControlFlow::Poll);
    }
}
