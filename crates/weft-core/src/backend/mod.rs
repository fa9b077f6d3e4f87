//! The seam between the event loop and a windowing system.
//!
//! The loop never talks to native APIs directly. Each pump cycle it hands
//! the queued [`NativeRequest`]s to a [`Backend`] and gets back every native
//! event that was available, already mapped onto weft types.

pub mod headless;
#[cfg(feature = "native")]
pub mod native;

use std::time::Duration;

use weft_common::{CoreError, Handle, MonitorInfo, Position, Size, Theme, WindowEvent};
use weft_webview::{IpcPayload, WebViewConfig, WebViewEvent};

use crate::render::Frame;
use crate::window::WindowConfig;

pub use headless::{HeadlessBackend, HeadlessController, HeadlessWindowState};
#[cfg(feature = "native")]
pub use native::NativeBackend;

/// A mutation the loop wants applied to a native resource.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeRequest {
    CreateWindow {
        handle: Handle,
        config: WindowConfig,
    },
    CreateWebView {
        handle: Handle,
        window: Handle,
        config: WebViewConfig,
        channel: String,
    },
    SetTitle { handle: Handle, title: String },
    SetInnerSize { handle: Handle, size: Size },
    SetPosition { handle: Handle, position: Position },
    SetResizable { handle: Handle, resizable: bool },
    SetDecorated { handle: Handle, decorated: bool },
    SetVisible { handle: Handle, visible: bool },
    SetFocused { handle: Handle, focused: bool },
    /// `None` follows the system theme.
    SetTheme { handle: Handle, theme: Option<Theme> },
    RequestRedraw { handle: Handle },
    /// Ask the window to close as if the user had clicked its close button.
    Close { handle: Handle },
    LoadUrl { handle: Handle, url: String },
    LoadHtml { handle: Handle, html: String },
    EvaluateScript { handle: Handle, script: String },
    DeliverIpc { handle: Handle, payload: IpcPayload },
    OpenDevtools { handle: Handle },
    CloseDevtools { handle: Handle },
}

impl NativeRequest {
    /// The resource this request targets.
    pub fn handle(&self) -> Handle {
        use NativeRequest::*;
        match self {
            CreateWindow { handle, .. }
            | CreateWebView { handle, .. }
            | SetTitle { handle, .. }
            | SetInnerSize { handle, .. }
            | SetPosition { handle, .. }
            | SetResizable { handle, .. }
            | SetDecorated { handle, .. }
            | SetVisible { handle, .. }
            | SetFocused { handle, .. }
            | SetTheme { handle, .. }
            | RequestRedraw { handle }
            | Close { handle }
            | LoadUrl { handle, .. }
            | LoadHtml { handle, .. }
            | EvaluateScript { handle, .. }
            | DeliverIpc { handle, .. }
            | OpenDevtools { handle }
            | CloseDevtools { handle } => *handle,
        }
    }
}

/// A native event, already translated.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Window { window: Handle, event: WindowEvent },
    WebView(WebViewEvent),
}

/// Everything one pump produced, in arrival order.
#[derive(Debug, Default)]
pub struct PumpOutput {
    pub events: Vec<BackendEvent>,
    /// Requests that could not be applied.
    pub failures: Vec<(Handle, CoreError)>,
    /// The native loop asked to terminate.
    pub exit: bool,
}

/// A windowing system the event loop can drive.
///
/// Implementations live on the loop thread and are never shared, so they
/// may hold thread-affine native objects.
pub trait Backend {
    fn name(&self) -> &'static str;

    /// Apply `requests` in order, then collect native events. Blocks for at
    /// most `timeout` when nothing is pending; `None` blocks until an event
    /// arrives.
    fn pump(&mut self, timeout: Option<Duration>, requests: Vec<NativeRequest>) -> PumpOutput;

    /// The native side of `window` exists and can be presented to.
    fn window_ready(&self, window: Handle) -> bool;

    /// Show `frame` in `window` before returning.
    fn present(&mut self, window: Handle, frame: &Frame) -> Result<(), CoreError>;

    /// Release the native resource behind `handle` immediately. Unknown
    /// handles are ignored.
    fn destroy(&mut self, handle: Handle);

    fn available_monitors(&self) -> Vec<MonitorInfo>;

    fn primary_monitor(&self) -> Option<MonitorInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_handle_is_target() {
        let h = Handle::from_raw(77);
        let requests = [
            NativeRequest::SetTitle {
                handle: h,
                title: "t".into(),
            },
            NativeRequest::Close { handle: h },
            NativeRequest::DeliverIpc {
                handle: h,
                payload: IpcPayload::Text("x".into()),
            },
            NativeRequest::CreateWebView {
                handle: h,
                window: Handle::from_raw(1),
                config: WebViewConfig::default(),
                channel: "main".into(),
            },
        ];
        assert!(requests.iter().all(|r| r.handle() == h));
    }
}
