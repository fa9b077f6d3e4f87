//! IPC queue limits.

use serde::{Deserialize, Serialize};

/// Capacity limits of the per-handle IPC queues.
///
/// Both directions share the same limits. A full host-to-webview queue
/// rejects `send`; a full webview-to-host queue drops the incoming message
/// and reports it on the loop's error channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Messages held per handle and direction (valid range: 1-1000000).
    pub max_pending_messages: usize,
    /// Largest accepted payload in bytes (valid range: 1-268435456).
    pub max_message_bytes: usize,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            max_pending_messages: 10_000,
            max_message_bytes: 10 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipc_defaults() {
        let config = IpcConfig::default();
        assert_eq!(config.max_pending_messages, 10_000);
        assert_eq!(config.max_message_bytes, 10_485_760);
    }
}
