//! Event loop, windows, webviews and pixel rendering for weft.
//!
//! Everything hangs off an [`EventLoop`] created on the host's thread:
//!
//! - [`WindowBuilder`] and [`WebViewBuilder`] register resources on a
//!   [`LoopHandle`] and return lightweight [`Window`] / [`WebView`] handles
//! - [`EventLoop::run_iteration`] performs one native pump cycle and
//!   dispatches window events and IPC messages to host listeners
//! - [`Window::render`] scales an RGBA buffer into a window
//! - [`platform_info`] reports what the windowing system supports
//!
//! The native backend (winit, softbuffer and wry) sits behind the `native`
//! feature. [`EventLoop::headless`] runs the same loop on an in-process
//! simulation.

pub mod backend;
pub mod event_loop;
mod ipc;
pub mod platform;
pub mod registry;
pub mod render;
mod resource;
#[cfg(test)]
mod testing;
mod thread_guard;
pub mod webview;
pub mod window;

pub use backend::{
    Backend, BackendEvent, HeadlessBackend, HeadlessController, NativeRequest, PumpOutput,
};
pub use event_loop::{
    EventListener, EventLoop, IpcListener, ListenerId, LoopHandle, LoopSettings, Phase,
};
pub use platform::{platform_info, DisplayServer, PlatformInfo};
pub use registry::HandleRegistry;
pub use render::{Frame, PixelRenderer, RenderOptions};
pub use webview::{WebView, WebViewBuilder};
pub use window::{Window, WindowBuilder, WindowConfig};

pub use weft_common::{
    ControlFlow, CoreError, DispatchError, Handle, ListenerResult, LoopEvent, MonitorInfo, Position,
    Result, ScaleMode, Size, Theme, WindowEvent,
};
pub use weft_webview::IpcPayload;

/// Version of the platform webview engine. Does not need an event loop.
#[cfg(feature = "native")]
pub fn webview_version() -> Result<String> {
    weft_webview::webview_version()
}

/// Version of the platform webview engine. Does not need an event loop.
#[cfg(not(feature = "native"))]
pub fn webview_version() -> Result<String> {
    Err(CoreError::Unsupported(
        "built without the `native` feature".into(),
    ))
}
