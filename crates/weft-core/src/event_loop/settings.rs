use weft_common::ControlFlow;
use weft_config::WeftConfig;

use crate::render::RenderOptions;

/// Tunables of one event loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    pub control_flow: ControlFlow,
    /// Stop once the last window has been destroyed.
    pub exit_on_last_window_closed: bool,
    /// Capacity of each per-webview IPC queue.
    pub max_pending_messages: usize,
    pub max_message_bytes: usize,
    pub render: RenderOptions,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&WeftConfig::default())
    }
}

impl LoopSettings {
    pub fn from_config(config: &WeftConfig) -> Self {
        Self {
            control_flow: config.event_loop.control_flow(),
            exit_on_last_window_closed: config.event_loop.exit_on_last_window_closed,
            max_pending_messages: config.ipc.max_pending_messages,
            max_message_bytes: config.ipc.max_message_bytes,
            render: RenderOptions::from_config(&config.render),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use weft_config::schema::ControlFlowMode;

    #[test]
    fn defaults_follow_config_defaults() {
        let s = LoopSettings::default();
        assert_eq!(s.control_flow, ControlFlow::Wait);
        assert!(s.exit_on_last_window_closed);
        assert_eq!(s.max_pending_messages, 10_000);
        assert_eq!(s.max_message_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn from_config_maps_sections() {
        let mut config = WeftConfig::default();
        config.event_loop.control_flow = ControlFlowMode::WaitUntil;
        config.event_loop.wait_until_ms = 5;
        config.event_loop.exit_on_last_window_closed = false;
        config.ipc.max_pending_messages = 3;
        let s = LoopSettings::from_config(&config);
        assert_eq!(s.control_flow, ControlFlow::WaitUntil(Duration::from_millis(5)));
        assert!(!s.exit_on_last_window_closed);
        assert_eq!(s.max_pending_messages, 3);
    }
}
