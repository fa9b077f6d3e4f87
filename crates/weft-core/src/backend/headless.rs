//! In-process simulation of a windowing system.
//!
//! Used by tests and by `--headless` demo runs. Requests are applied to a
//! plain model of windows and webviews and produce the events a real
//! system would report. A [`HeadlessController`] plays the part of the
//! user and of page script: it can inject events from any thread, wakes a
//! blocked pump, and exposes what was presented or delivered.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace};
use weft_common::{CoreError, Handle, MonitorInfo, Position, Size, Theme, WindowEvent};
use weft_webview::{Envelope, IpcPayload, PageLoadState, WebViewEvent};

use super::{Backend, BackendEvent, NativeRequest, PumpOutput};
use crate::render::Frame;

/// Observable state of one simulated window.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindowState {
    pub title: String,
    pub size: Size,
    pub position: Position,
    pub resizable: bool,
    pub decorated: bool,
    pub visible: bool,
    pub focused: bool,
    pub forced_theme: Option<Theme>,
    pub scale_factor: f64,
}

#[derive(Debug)]
struct SimWindow {
    state: HeadlessWindowState,
    last_frame: Option<Frame>,
    frames_presented: usize,
}

#[derive(Debug)]
struct SimWebView {
    window: Handle,
    channel: String,
    url: String,
    devtools_open: bool,
    delivered: Vec<IpcPayload>,
    scripts: Vec<String>,
}

#[derive(Debug)]
struct Sim {
    windows: BTreeMap<Handle, SimWindow>,
    webviews: BTreeMap<Handle, SimWebView>,
    injected: VecDeque<BackendEvent>,
    exit: bool,
    system_theme: Theme,
    monitors: Vec<MonitorInfo>,
    pumps: u64,
}

impl Default for Sim {
    fn default() -> Self {
        Self {
            windows: BTreeMap::new(),
            webviews: BTreeMap::new(),
            injected: VecDeque::new(),
            exit: false,
            system_theme: Theme::Light,
            monitors: vec![MonitorInfo {
                name: Some("headless-0".into()),
                position: Position::new(0, 0),
                size: Size::new(1920, 1080),
                scale_factor: 1.0,
            }],
            pumps: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    sim: Mutex<Sim>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Sim> {
        self.sim.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn inject(&self, event: BackendEvent) {
        self.lock().injected.push_back(event);
        self.wake.notify_all();
    }
}

fn missing(handle: Handle) -> CoreError {
    CoreError::Backend(format!("no native resource for {handle}"))
}

impl Sim {
    fn window_mut(&mut self, handle: Handle) -> Result<&mut SimWindow, CoreError> {
        self.windows.get_mut(&handle).ok_or_else(|| missing(handle))
    }

    fn webview_mut(&mut self, handle: Handle) -> Result<&mut SimWebView, CoreError> {
        self.webviews.get_mut(&handle).ok_or_else(|| missing(handle))
    }

    fn focused(&self) -> Option<Handle> {
        self.windows
            .iter()
            .find(|(_, w)| w.state.focused)
            .map(|(h, _)| *h)
    }

    fn focus(&mut self, handle: Handle, out: &mut Vec<BackendEvent>) {
        let previous = self.focused();
        if previous == Some(handle) {
            return;
        }
        if let Some(prev) = previous {
            if let Some(w) = self.windows.get_mut(&prev) {
                w.state.focused = false;
            }
            out.push(window_event(prev, WindowEvent::Unfocused));
        }
        if let Some(w) = self.windows.get_mut(&handle) {
            w.state.focused = true;
            out.push(window_event(handle, WindowEvent::Focused));
        }
    }

    fn apply(
        &mut self,
        request: NativeRequest,
        out: &mut Vec<BackendEvent>,
    ) -> Result<(), CoreError> {
        trace!(handle = %request.handle(), ?request, "applying request");
        match request {
            NativeRequest::CreateWindow { handle, config } => {
                let state = HeadlessWindowState {
                    title: config.title,
                    size: config.inner_size,
                    position: config.position.unwrap_or_default(),
                    resizable: config.resizable,
                    decorated: config.decorated,
                    visible: config.visible,
                    focused: false,
                    forced_theme: config.theme,
                    scale_factor: self
                        .monitors
                        .first()
                        .map(|m| m.scale_factor)
                        .unwrap_or(1.0),
                };
                self.windows.insert(
                    handle,
                    SimWindow {
                        state,
                        last_frame: None,
                        frames_presented: 0,
                    },
                );
                if config.focused && config.visible {
                    self.focus(handle, out);
                }
            }
            NativeRequest::CreateWebView {
                handle,
                window,
                config,
                channel,
            } => {
                if !self.windows.contains_key(&window) {
                    return Err(CoreError::Backend(format!(
                        "parent window {window} of {handle} does not exist"
                    )));
                }
                let url = config.content.url().to_owned();
                self.webviews.insert(
                    handle,
                    SimWebView {
                        window,
                        channel,
                        url: url.clone(),
                        devtools_open: false,
                        delivered: Vec::new(),
                        scripts: Vec::new(),
                    },
                );
                out.push(page_loaded(handle, url));
            }
            NativeRequest::SetTitle { handle, title } => {
                self.window_mut(handle)?.state.title = title;
            }
            NativeRequest::SetInnerSize { handle, size } => {
                let w = self.window_mut(handle)?;
                if w.state.size != size {
                    w.state.size = size;
                    out.push(window_event(
                        handle,
                        WindowEvent::Resized {
                            width: size.width,
                            height: size.height,
                        },
                    ));
                }
            }
            NativeRequest::SetPosition { handle, position } => {
                let w = self.window_mut(handle)?;
                if w.state.position != position {
                    w.state.position = position;
                    out.push(window_event(
                        handle,
                        WindowEvent::Moved {
                            x: position.x,
                            y: position.y,
                        },
                    ));
                }
            }
            NativeRequest::SetResizable { handle, resizable } => {
                self.window_mut(handle)?.state.resizable = resizable;
            }
            NativeRequest::SetDecorated { handle, decorated } => {
                self.window_mut(handle)?.state.decorated = decorated;
            }
            NativeRequest::SetVisible { handle, visible } => {
                self.window_mut(handle)?.state.visible = visible;
            }
            NativeRequest::SetFocused { handle, focused } => {
                let is_focused = self.window_mut(handle)?.state.focused;
                if focused {
                    self.focus(handle, out);
                } else if is_focused {
                    self.window_mut(handle)?.state.focused = false;
                    out.push(window_event(handle, WindowEvent::Unfocused));
                }
            }
            NativeRequest::SetTheme { handle, theme } => {
                let system = self.system_theme;
                let w = self.window_mut(handle)?;
                let before = w.state.forced_theme.unwrap_or(system);
                w.state.forced_theme = theme;
                let after = theme.unwrap_or(system);
                if before != after {
                    out.push(window_event(handle, WindowEvent::ThemeChanged(after)));
                }
            }
            NativeRequest::RequestRedraw { handle } => {
                self.window_mut(handle)?;
                out.push(window_event(handle, WindowEvent::RedrawRequested));
            }
            NativeRequest::Close { handle } => {
                self.window_mut(handle)?;
                out.push(window_event(handle, WindowEvent::CloseRequested));
            }
            NativeRequest::LoadUrl { handle, url } => {
                self.webview_mut(handle)?.url = url.clone();
                out.push(page_loaded(handle, url));
            }
            NativeRequest::LoadHtml { handle, .. } => {
                self.webview_mut(handle)?.url = "about:blank".into();
                out.push(page_loaded(handle, "about:blank".into()));
            }
            NativeRequest::EvaluateScript { handle, script } => {
                self.webview_mut(handle)?.scripts.push(script);
            }
            NativeRequest::DeliverIpc { handle, payload } => {
                self.webview_mut(handle)?.delivered.push(payload);
            }
            NativeRequest::OpenDevtools { handle } => {
                self.webview_mut(handle)?.devtools_open = true;
            }
            NativeRequest::CloseDevtools { handle } => {
                self.webview_mut(handle)?.devtools_open = false;
            }
        }
        Ok(())
    }
}

fn window_event(window: Handle, event: WindowEvent) -> BackendEvent {
    BackendEvent::Window { window, event }
}

fn page_loaded(handle: Handle, url: String) -> BackendEvent {
    BackendEvent::WebView(WebViewEvent::PageLoad {
        handle,
        state: PageLoadState::Finished,
        url,
    })
}

/// The simulated backend handed to the event loop.
#[derive(Debug)]
pub struct HeadlessBackend {
    shared: Arc<Shared>,
}

impl HeadlessBackend {
    pub fn new() -> (Self, HeadlessController) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            HeadlessController { shared },
        )
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn pump(&mut self, timeout: Option<Duration>, requests: Vec<NativeRequest>) -> PumpOutput {
        let mut out = PumpOutput::default();
        let mut sim = self.shared.lock();
        sim.pumps += 1;

        for request in requests {
            let handle = request.handle();
            if let Err(e) = sim.apply(request, &mut out.events) {
                debug!(%handle, error = %e, "request failed");
                out.failures.push((handle, e));
            }
        }

        let idle = |s: &mut Sim| s.injected.is_empty() && !s.exit;
        if out.events.is_empty() && out.failures.is_empty() && idle(&mut *sim) {
            sim = match timeout {
                Some(d) if d.is_zero() => sim,
                Some(d) => {
                    self.shared
                        .wake
                        .wait_timeout_while(sim, d, idle)
                        .unwrap_or_else(|e| e.into_inner())
                        .0
                }
                None => self
                    .shared
                    .wake
                    .wait_while(sim, idle)
                    .unwrap_or_else(|e| e.into_inner()),
            };
        }

        out.events.extend(sim.injected.drain(..));
        out.exit = std::mem::take(&mut sim.exit);
        out
    }

    fn window_ready(&self, window: Handle) -> bool {
        self.shared.lock().windows.contains_key(&window)
    }

    fn present(&mut self, window: Handle, frame: &Frame) -> Result<(), CoreError> {
        let mut sim = self.shared.lock();
        let w = sim.window_mut(window)?;
        w.last_frame = Some(frame.clone());
        w.frames_presented += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: Handle) {
        let mut sim = self.shared.lock();
        if sim.windows.remove(&handle).is_some() {
            debug!(%handle, "headless window destroyed");
        } else if sim.webviews.remove(&handle).is_some() {
            debug!(%handle, "headless webview destroyed");
        }
    }

    fn available_monitors(&self) -> Vec<MonitorInfo> {
        self.shared.lock().monitors.clone()
    }

    fn primary_monitor(&self) -> Option<MonitorInfo> {
        self.shared.lock().monitors.first().cloned()
    }
}

/// Drives and inspects a [`HeadlessBackend`]. Cheap to clone and usable
/// from any thread.
#[derive(Debug, Clone)]
pub struct HeadlessController {
    shared: Arc<Shared>,
}

impl HeadlessController {
    /// Queue an arbitrary window event for the next pump.
    pub fn inject(&self, window: Handle, event: WindowEvent) {
        self.shared.inject(window_event(window, event));
    }

    /// Simulate the user clicking the close button.
    pub fn request_close(&self, window: Handle) {
        self.inject(window, WindowEvent::CloseRequested);
    }

    /// Simulate the user resizing a window.
    pub fn resize(&self, window: Handle, width: u32, height: u32) {
        if let Some(w) = self.shared.lock().windows.get_mut(&window) {
            w.state.size = Size::new(width, height);
        }
        self.inject(window, WindowEvent::Resized { width, height });
    }

    pub fn set_scale_factor(&self, window: Handle, scale_factor: f64) {
        if let Some(w) = self.shared.lock().windows.get_mut(&window) {
            w.state.scale_factor = scale_factor;
        }
        self.inject(window, WindowEvent::ScaleFactorChanged(scale_factor));
    }

    /// Change the system theme. Windows without a forced theme report the
    /// change.
    pub fn set_system_theme(&self, theme: Theme) {
        let mut sim = self.shared.lock();
        if sim.system_theme == theme {
            return;
        }
        sim.system_theme = theme;
        let affected: Vec<Handle> = sim
            .windows
            .iter()
            .filter(|(_, w)| w.state.forced_theme.is_none())
            .map(|(h, _)| *h)
            .collect();
        for window in affected {
            sim.injected
                .push_back(window_event(window, WindowEvent::ThemeChanged(theme)));
        }
        drop(sim);
        self.shared.wake.notify_all();
    }

    /// Have page script in `webview` call `postMessage(payload)`. Returns
    /// false if the webview does not exist natively.
    pub fn post_message(&self, webview: Handle, payload: impl Into<IpcPayload>) -> bool {
        let mut sim = self.shared.lock();
        let Some(wv) = sim.webviews.get(&webview) else {
            return false;
        };
        let body = Envelope::from_payload(wv.channel.clone(), &payload.into()).encode();
        sim.injected
            .push_back(BackendEvent::WebView(WebViewEvent::IpcMessage {
                handle: webview,
                body,
            }));
        drop(sim);
        self.shared.wake.notify_all();
        true
    }

    /// Hand a raw, possibly malformed IPC body to the loop.
    pub fn post_raw(&self, webview: Handle, body: impl Into<String>) {
        self.shared
            .inject(BackendEvent::WebView(WebViewEvent::IpcMessage {
                handle: webview,
                body: body.into(),
            }));
    }

    /// Simulate the document title changing in `webview`.
    pub fn set_document_title(&self, webview: Handle, title: impl Into<String>) {
        self.shared
            .inject(BackendEvent::WebView(WebViewEvent::TitleChanged {
                handle: webview,
                title: title.into(),
            }));
    }

    /// Make the native loop report termination on the next pump.
    pub fn exit_native_loop(&self) {
        self.shared.lock().exit = true;
        self.shared.wake.notify_all();
    }

    pub fn set_monitors(&self, monitors: Vec<MonitorInfo>) {
        self.shared.lock().monitors = monitors;
    }

    pub fn window(&self, window: Handle) -> Option<HeadlessWindowState> {
        self.shared
            .lock()
            .windows
            .get(&window)
            .map(|w| w.state.clone())
    }

    /// Last frame presented to `window`.
    pub fn frame(&self, window: Handle) -> Option<Frame> {
        self.shared
            .lock()
            .windows
            .get(&window)
            .and_then(|w| w.last_frame.clone())
    }

    pub fn frames_presented(&self, window: Handle) -> usize {
        self.shared
            .lock()
            .windows
            .get(&window)
            .map_or(0, |w| w.frames_presented)
    }

    /// Host-to-webview messages the page has received, in order.
    pub fn delivered(&self, webview: Handle) -> Vec<IpcPayload> {
        self.shared
            .lock()
            .webviews
            .get(&webview)
            .map(|w| w.delivered.clone())
            .unwrap_or_default()
    }

    pub fn scripts(&self, webview: Handle) -> Vec<String> {
        self.shared
            .lock()
            .webviews
            .get(&webview)
            .map(|w| w.scripts.clone())
            .unwrap_or_default()
    }

    pub fn webview_url(&self, webview: Handle) -> Option<String> {
        self.shared
            .lock()
            .webviews
            .get(&webview)
            .map(|w| w.url.clone())
    }

    pub fn webview_parent(&self, webview: Handle) -> Option<Handle> {
        self.shared
            .lock()
            .webviews
            .get(&webview)
            .map(|w| w.window)
    }

    pub fn devtools_open(&self, webview: Handle) -> bool {
        self.shared
            .lock()
            .webviews
            .get(&webview)
            .is_some_and(|w| w.devtools_open)
    }

    /// Whether a native window or webview currently exists for `handle`.
    pub fn is_alive(&self, handle: Handle) -> bool {
        let sim = self.shared.lock();
        sim.windows.contains_key(&handle) || sim.webviews.contains_key(&handle)
    }

    pub fn pump_count(&self) -> u64 {
        self.shared.lock().pumps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowConfig;
    use std::time::Instant;

    fn create(handle: Handle) -> NativeRequest {
        NativeRequest::CreateWindow {
            handle,
            config: WindowConfig::default(),
        }
    }

    #[test]
    fn create_window_focuses_it() {
        let (mut backend, ctl) = HeadlessBackend::new();
        let h = Handle::next();
        let out = backend.pump(Some(Duration::ZERO), vec![create(h)]);
        assert_eq!(
            out.events,
            vec![window_event(h, WindowEvent::Focused)]
        );
        assert!(ctl.window(h).unwrap().focused);
    }

    #[test]
    fn focus_moves_between_windows() {
        let (mut backend, _ctl) = HeadlessBackend::new();
        let a = Handle::next();
        let b = Handle::next();
        backend.pump(Some(Duration::ZERO), vec![create(a)]);
        let out = backend.pump(Some(Duration::ZERO), vec![create(b)]);
        assert_eq!(
            out.events,
            vec![
                window_event(a, WindowEvent::Unfocused),
                window_event(b, WindowEvent::Focused),
            ]
        );
    }

    #[test]
    fn unknown_handle_fails_request() {
        let (mut backend, _ctl) = HeadlessBackend::new();
        let h = Handle::next();
        let out = backend.pump(
            Some(Duration::ZERO),
            vec![NativeRequest::SetTitle {
                handle: h,
                title: "x".into(),
            }],
        );
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].0, h);
    }

    #[test]
    fn resize_only_reports_changes() {
        let (mut backend, _ctl) = HeadlessBackend::new();
        let h = Handle::next();
        backend.pump(Some(Duration::ZERO), vec![create(h)]);
        let same = NativeRequest::SetInnerSize {
            handle: h,
            size: WindowConfig::default().inner_size,
        };
        assert!(backend.pump(Some(Duration::ZERO), vec![same]).events.is_empty());
    }

    #[test]
    fn wait_until_times_out() {
        let (mut backend, _ctl) = HeadlessBackend::new();
        let start = Instant::now();
        let out = backend.pump(Some(Duration::from_millis(30)), Vec::new());
        assert!(out.events.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn injection_wakes_blocked_pump() {
        let (mut backend, ctl) = HeadlessBackend::new();
        let h = Handle::next();
        let remote = ctl.clone();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.request_close(h);
        });
        let out = backend.pump(None, Vec::new());
        t.join().unwrap();
        assert_eq!(out.events, vec![window_event(h, WindowEvent::CloseRequested)]);
    }

    #[test]
    fn post_message_uses_webview_channel() {
        let (mut backend, ctl) = HeadlessBackend::new();
        let w = Handle::next();
        let v = Handle::next();
        assert!(!ctl.post_message(v, "early"));
        backend.pump(
            Some(Duration::ZERO),
            vec![
                create(w),
                NativeRequest::CreateWebView {
                    handle: v,
                    window: w,
                    config: Default::default(),
                    channel: "chat".into(),
                },
            ],
        );
        assert!(ctl.post_message(v, "hi"));
        let out = backend.pump(Some(Duration::ZERO), Vec::new());
        let expected = Envelope::from_payload("chat", &IpcPayload::from("hi")).encode();
        assert_eq!(
            out.events,
            vec![BackendEvent::WebView(WebViewEvent::IpcMessage {
                handle: v,
                body: expected
            })]
        );
    }

    #[test]
    fn present_keeps_last_frame() {
        let (mut backend, ctl) = HeadlessBackend::new();
        let h = Handle::next();
        backend.pump(Some(Duration::ZERO), vec![create(h)]);
        let frame = Frame {
            width: 1,
            height: 1,
            pixels: vec![0x00ff_0000],
        };
        backend.present(h, &frame).unwrap();
        assert_eq!(ctl.frame(h), Some(frame));
        assert_eq!(ctl.frames_presented(h), 1);
        backend.destroy(h);
        assert!(!ctl.is_alive(h));
        assert!(backend.present(h, &Frame::default()).is_err());
    }

    #[test]
    fn exit_is_reported_once() {
        let (mut backend, ctl) = HeadlessBackend::new();
        ctl.exit_native_loop();
        assert!(backend.pump(None, Vec::new()).exit);
        assert!(!backend.pump(Some(Duration::ZERO), Vec::new()).exit);
    }

    #[test]
    fn default_monitor() {
        let (backend, _ctl) = HeadlessBackend::new();
        let primary = backend.primary_monitor().unwrap();
        assert_eq!(primary.size, Size::new(1920, 1080));
        assert_eq!(backend.available_monitors().len(), 1);
    }
}
