//! winit application handler: applies queued requests and collects events.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use softbuffer::{Context, Surface};
use tracing::{debug, info, trace, warn};
use weft_common::{CoreError, Handle, MonitorInfo, Size, WindowEvent};
use weft_webview::{EventSink, NativeWebView};
use winit::application::ApplicationHandler;
use winit::event::{StartCause, WindowEvent as WinitEvent};
use winit::event_loop::{ActiveEventLoop, OwnedDisplayHandle};
use winit::window::{Window, WindowId};

use super::translate;
use crate::backend::{BackendEvent, NativeRequest, PumpOutput};
use crate::render::Frame;
use crate::window::WindowConfig;

type NativeSurface = Surface<OwnedDisplayHandle, Arc<Window>>;

fn backend_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::Backend(e.to_string())
}

fn missing(handle: Handle) -> CoreError {
    CoreError::Backend(format!("no native resource for {handle}"))
}

struct NativeWindow {
    window: Arc<Window>,
    /// Created on first present.
    surface: Option<NativeSurface>,
}

struct AttachedWebView {
    window: Handle,
    webview: NativeWebView,
}

pub(super) struct NativeApp {
    windows: BTreeMap<Handle, NativeWindow>,
    by_id: HashMap<WindowId, Handle>,
    webviews: BTreeMap<Handle, AttachedWebView>,
    webview_events: EventSink,
    pending: VecDeque<NativeRequest>,
    output: PumpOutput,
    resumed: bool,
    monitors: Vec<MonitorInfo>,
    primary: Option<MonitorInfo>,
    // Outlives every surface above.
    context: Context<OwnedDisplayHandle>,
}

impl NativeApp {
    pub(super) fn new(context: Context<OwnedDisplayHandle>) -> Self {
        Self {
            windows: BTreeMap::new(),
            by_id: HashMap::new(),
            webviews: BTreeMap::new(),
            webview_events: Arc::new(Mutex::new(Vec::new())),
            pending: VecDeque::new(),
            output: PumpOutput::default(),
            resumed: false,
            monitors: Vec::new(),
            primary: None,
            context,
        }
    }

    pub(super) fn queue(&mut self, requests: Vec<NativeRequest>) {
        self.pending.extend(requests);
    }

    pub(super) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(super) fn has_window(&self, handle: Handle) -> bool {
        self.windows.contains_key(&handle)
    }

    /// Everything collected since the last call: window events first, then
    /// webview events, then failed requests.
    pub(super) fn take_output(&mut self) -> PumpOutput {
        let mut output = std::mem::take(&mut self.output);
        let webview_events = match self.webview_events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        output
            .events
            .extend(webview_events.into_iter().map(BackendEvent::WebView));
        output
    }

    pub(super) fn monitors(&self) -> &[MonitorInfo] {
        &self.monitors
    }

    pub(super) fn primary(&self) -> Option<MonitorInfo> {
        self.primary.clone().or_else(|| self.monitors.first().cloned())
    }

    pub(super) fn present(&mut self, handle: Handle, frame: &Frame) -> Result<(), CoreError> {
        let native = self.windows.get_mut(&handle).ok_or_else(|| missing(handle))?;
        let (Some(width), Some(height)) =
            (NonZeroU32::new(frame.width), NonZeroU32::new(frame.height))
        else {
            trace!(%handle, "skipping present of empty frame");
            return Ok(());
        };

        if native.surface.is_none() {
            let surface =
                Surface::new(&self.context, Arc::clone(&native.window)).map_err(backend_err)?;
            native.surface = Some(surface);
        }
        let Some(surface) = native.surface.as_mut() else {
            return Err(CoreError::Backend("surface unavailable".into()));
        };

        surface.resize(width, height).map_err(backend_err)?;
        let mut buffer = surface.buffer_mut().map_err(backend_err)?;
        let n = buffer.len().min(frame.pixels.len());
        buffer[..n].copy_from_slice(&frame.pixels[..n]);
        buffer.present().map_err(backend_err)
    }

    pub(super) fn destroy(&mut self, handle: Handle) {
        if self.webviews.remove(&handle).is_some() {
            debug!(%handle, "native webview released");
            return;
        }
        if let Some(native) = self.windows.remove(&handle) {
            self.webviews.retain(|_, attached| attached.window != handle);
            self.by_id.remove(&native.window.id());
            debug!(%handle, "native window released");
        }
    }

    fn refresh_monitors(&mut self, event_loop: &ActiveEventLoop) {
        self.monitors = event_loop
            .available_monitors()
            .map(|m| translate::monitor(&m))
            .collect();
        self.primary = event_loop.primary_monitor().map(|m| translate::monitor(&m));
    }

    fn apply_pending(&mut self, event_loop: &ActiveEventLoop) {
        if !self.resumed {
            return;
        }
        while let Some(request) = self.pending.pop_front() {
            let handle = request.handle();
            if let Err(e) = self.apply(event_loop, request) {
                warn!(%handle, error = %e, "native request failed");
                self.output.failures.push((handle, e));
            }
        }
    }

    fn window(&self, handle: Handle) -> Result<&Arc<Window>, CoreError> {
        self.windows
            .get(&handle)
            .map(|n| &n.window)
            .ok_or(CoreError::InvalidHandle(handle))
    }

    fn webview(&self, handle: Handle) -> Result<&NativeWebView, CoreError> {
        self.webviews
            .get(&handle)
            .map(|a| &a.webview)
            .ok_or(CoreError::InvalidHandle(handle))
    }

    fn push_window_event(&mut self, window: Handle, event: WindowEvent) {
        self.output.events.push(BackendEvent::Window { window, event });
    }

    fn fit_webviews(&self, window: Handle, size: Size) {
        for (handle, attached) in self.webviews.iter().filter(|(_, a)| a.window == window) {
            if let Err(e) = attached.webview.fit_to(size) {
                warn!(%handle, error = %e, "failed to resize webview");
            }
        }
    }

    fn create_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        handle: Handle,
        config: &WindowConfig,
    ) -> Result<(), CoreError> {
        let mut attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(translate::size_to(config.inner_size))
            .with_resizable(config.resizable)
            .with_decorations(config.decorated)
            .with_visible(config.visible)
            .with_active(config.focused)
            .with_theme(config.theme.map(translate::theme_to));
        if let Some(position) = config.position {
            attrs = attrs.with_position(translate::position_to(position));
        }

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| CoreError::Backend(format!("failed to create window: {e}")))?;
        let window = Arc::new(window);
        self.by_id.insert(window.id(), handle);
        self.windows.insert(
            handle,
            NativeWindow {
                window,
                surface: None,
            },
        );
        info!(%handle, title = %config.title, "native window created");
        Ok(())
    }

    fn apply(
        &mut self,
        event_loop: &ActiveEventLoop,
        request: NativeRequest,
    ) -> Result<(), CoreError> {
        use NativeRequest::*;
        match request {
            CreateWindow { handle, config } => self.create_window(event_loop, handle, &config)?,
            CreateWebView {
                handle,
                window,
                config,
                channel,
            } => {
                let parent = self.window(window)?;
                let size = translate::size_from(parent.inner_size());
                let webview = NativeWebView::create(
                    handle,
                    &**parent,
                    size,
                    &config,
                    &channel,
                    Arc::clone(&self.webview_events),
                )?;
                self.webviews.insert(handle, AttachedWebView { window, webview });
            }
            SetTitle { handle, title } => self.window(handle)?.set_title(&title),
            SetInnerSize { handle, size } => {
                let requested = translate::size_to(size);
                if let Some(actual) = self.window(handle)?.request_inner_size(requested) {
                    let actual = translate::size_from(actual);
                    self.fit_webviews(handle, actual);
                    self.push_window_event(
                        handle,
                        WindowEvent::Resized {
                            width: actual.width,
                            height: actual.height,
                        },
                    );
                }
            }
            SetPosition { handle, position } => self
                .window(handle)?
                .set_outer_position(translate::position_to(position)),
            SetResizable { handle, resizable } => self.window(handle)?.set_resizable(resizable),
            SetDecorated { handle, decorated } => self.window(handle)?.set_decorations(decorated),
            SetVisible { handle, visible } => self.window(handle)?.set_visible(visible),
            SetFocused { handle, focused } => {
                let window = self.window(handle)?;
                if focused {
                    window.focus_window();
                } else {
                    debug!(%handle, "windows cannot be unfocused natively");
                }
            }
            SetTheme { handle, theme } => self
                .window(handle)?
                .set_theme(theme.map(translate::theme_to)),
            RequestRedraw { handle } => self.window(handle)?.request_redraw(),
            Close { handle } => {
                self.window(handle)?;
                self.push_window_event(handle, WindowEvent::CloseRequested);
            }
            LoadUrl { handle, url } => self.webview(handle)?.load_url(&url)?,
            LoadHtml { handle, html } => self.webview(handle)?.load_html(&html)?,
            EvaluateScript { handle, script } => self.webview(handle)?.evaluate_script(&script)?,
            DeliverIpc { handle, payload } => self.webview(handle)?.deliver(&payload)?,
            OpenDevtools { handle } => self.webview(handle)?.open_devtools(),
            CloseDevtools { handle } => self.webview(handle)?.close_devtools(),
        }
        Ok(())
    }
}

impl ApplicationHandler for NativeApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        trace!(?cause, "native cycle");
        self.apply_pending(event_loop);
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.resumed {
            info!("native event loop resumed");
        }
        self.resumed = true;
        self.refresh_monitors(event_loop);
        self.apply_pending(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WinitEvent,
    ) {
        let Some(&handle) = self.by_id.get(&window_id) else {
            trace!(?window_id, "event for unknown native window");
            return;
        };
        if let WinitEvent::Resized(size) = &event {
            self.fit_webviews(handle, translate::size_from(*size));
        }
        self.push_window_event(handle, translate::window_event(&event));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.refresh_monitors(event_loop);
        self.apply_pending(event_loop);
    }
}
