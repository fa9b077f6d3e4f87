//! Webview content and IPC plumbing for weft.
//!
//! - Frozen webview configuration and initial content selection
//! - The JSON envelope spoken between script and host
//! - The initialization script injected into every page
//! - Native child webviews on top of `wry` (feature `native`)

pub mod config;
pub mod events;
pub mod ipc;
#[cfg(feature = "native")]
pub mod native;

pub use config::{InitialContent, WebViewConfig};
pub use events::{PageLoadState, WebViewEvent};
pub use ipc::{Direction, Envelope, EnvelopeError, IpcMessage, IpcPayload};
#[cfg(feature = "native")]
pub use native::{full_bounds, webview_version, EventSink, NativeWebView};
