//! Configuration schema types for weft.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod event_loop;
mod ipc;
mod logging;
mod render;
mod webview;
mod window;

pub use event_loop::*;
pub use ipc::*;
pub use logging::*;
pub use render::*;
pub use webview::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration. Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeftConfig {
    pub event_loop: EventLoopConfig,
    pub window: WindowDefaults,
    pub webview: WebViewDefaults,
    pub ipc: IpcConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}
