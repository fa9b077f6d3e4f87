//! Event loop core.
//!
//! An [`EventLoop`] owns the native message pump (through a [`Backend`])
//! and every resource created on it. It is bound to the thread that
//! created it. [`LoopHandle`]s, windows and webviews can be sent anywhere,
//! but every operation on them checks the calling thread and fails with
//! `WrongThread` off the loop thread.

mod dispatch;
mod pump;
mod settings;


pub use dispatch::{EventListener, IpcListener, ListenerId};
pub use settings::LoopSettings;

use std::cell::{RefCell, RefMut};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use weft_common::{
    ControlFlow, CoreError, DispatchError, Handle, ListenerResult, LoopEvent, LoopId, MonitorInfo,
    Result, WindowEvent,
};

use crate::backend::{Backend, HeadlessBackend, HeadlessController, NativeRequest};
use crate::ipc::IpcBridge;
use crate::registry::HandleRegistry;
use crate::render::PixelRenderer;
use crate::resource::{Resource, WebViewRecord, WindowRecord};
use crate::thread_guard::{check_thread, ThreadBound};
use crate::webview::WebView;
use crate::window::Window;

use dispatch::Callbacks;

/// Lifecycle of a loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Running,
    Stopped,
}

/// Mutable loop state. Only touched on the loop thread, under the lock,
/// and never while a listener runs.
pub(crate) struct LoopState {
    pub phase: Phase,
    pub exit_requested: bool,
    pub registry: HandleRegistry<Resource>,
    pub requests: VecDeque<NativeRequest>,
    pub ipc: IpcBridge,
    pub settings: LoopSettings,
    /// Events the loop raised itself, dispatched at the next opportunity.
    pub pending_events: VecDeque<LoopEvent>,
    /// A destroy left the loop without windows.
    pub windows_closed: bool,
    /// Windows rendered before their native window existed. Their cached
    /// frame is presented right after the pump that creates them.
    pub deferred_frames: BTreeSet<Handle>,
}

/// Handles removed by one destroy, children first.
#[derive(Debug, Default)]
pub(crate) struct Removed {
    pub webviews: Vec<Handle>,
    pub windows: Vec<Handle>,
}

impl LoopState {
    fn new(settings: LoopSettings) -> Self {
        Self {
            phase: Phase::Created,
            exit_requested: false,
            registry: HandleRegistry::new(),
            requests: VecDeque::new(),
            ipc: IpcBridge::new(settings.max_pending_messages, settings.max_message_bytes),
            settings,
            pending_events: VecDeque::new(),
            windows_closed: false,
            deferred_frames: BTreeSet::new(),
        }
    }

    pub(crate) fn window(&self, handle: Handle) -> Result<&WindowRecord> {
        self.registry
            .resolve(handle)?
            .as_window()
            .ok_or(CoreError::InvalidHandle(handle))
    }

    pub(crate) fn window_mut(&mut self, handle: Handle) -> Result<&mut WindowRecord> {
        match self.registry.resolve_mut(handle)? {
            Resource::Window(w) => Ok(w),
            Resource::WebView(_) => Err(CoreError::InvalidHandle(handle)),
        }
    }

    pub(crate) fn webview(&self, handle: Handle) -> Result<&WebViewRecord> {
        self.registry
            .resolve(handle)?
            .as_webview()
            .ok_or(CoreError::InvalidHandle(handle))
    }

    pub(crate) fn webview_mut(&mut self, handle: Handle) -> Result<&mut WebViewRecord> {
        match self.registry.resolve_mut(handle)? {
            Resource::WebView(v) => Ok(v),
            Resource::Window(_) => Err(CoreError::InvalidHandle(handle)),
        }
    }

    pub(crate) fn register_window(&mut self, record: WindowRecord) -> Handle {
        self.windows_closed = false;
        self.registry.register(Resource::Window(record))
    }

    /// The native window for `window` has not been requested from the
    /// backend yet.
    pub(crate) fn creation_pending(&self, window: Handle) -> bool {
        self.requests.iter().any(|r| {
            matches!(r, NativeRequest::CreateWindow { handle, .. } if *handle == window)
        })
    }

    fn has_windows(&self) -> bool {
        self.registry.iter().any(|(_, r)| r.as_window().is_some())
    }

    /// The loop should stop because its last window is gone.
    fn last_window_gone(&self) -> bool {
        self.windows_closed && self.settings.exit_on_last_window_closed && !self.has_windows()
    }

    /// Update cached state that changes as soon as a request is handed to
    /// the backend.
    fn commit(&mut self, request: &NativeRequest) {
        let handle = request.handle();
        match request {
            NativeRequest::SetTitle { title, .. } => {
                if let Ok(w) = self.window_mut(handle) {
                    w.title = title.clone();
                }
            }
            NativeRequest::SetResizable { resizable, .. } => {
                if let Ok(w) = self.window_mut(handle) {
                    w.resizable = *resizable;
                }
            }
            NativeRequest::SetDecorated { decorated, .. } => {
                if let Ok(w) = self.window_mut(handle) {
                    w.decorated = *decorated;
                }
            }
            NativeRequest::SetVisible { visible, .. } => {
                if let Ok(w) = self.window_mut(handle) {
                    w.visible = *visible;
                }
            }
            NativeRequest::LoadUrl { url, .. } => {
                if let Ok(v) = self.webview_mut(handle) {
                    v.url = url.clone();
                }
            }
            NativeRequest::LoadHtml { .. } => {
                if let Ok(v) = self.webview_mut(handle) {
                    v.url = "about:blank".into();
                }
            }
            NativeRequest::OpenDevtools { .. } => {
                if let Ok(v) = self.webview_mut(handle) {
                    v.devtools_open = true;
                }
            }
            NativeRequest::CloseDevtools { .. } => {
                if let Ok(v) = self.webview_mut(handle) {
                    v.devtools_open = false;
                }
            }
            _ => {}
        }
    }

    /// Remove `handle` and everything that goes with it: a window takes its
    /// webviews along, a webview takes the window that was created for it.
    fn remove_cascade(&mut self, handle: Handle) -> Result<Removed> {
        let mut windows = BTreeSet::new();
        let mut webviews = BTreeSet::new();
        match self.registry.resolve(handle)? {
            Resource::Window(_) => {
                windows.insert(handle);
            }
            Resource::WebView(v) => {
                webviews.insert(handle);
                if v.owns_window {
                    windows.insert(v.window);
                }
            }
        }
        for (h, r) in self.registry.iter() {
            if let Resource::WebView(v) = r {
                if windows.contains(&v.window) {
                    webviews.insert(h);
                }
            }
        }

        let mut removed = Removed::default();
        for wv in webviews {
            if let Ok(Resource::WebView(v)) = self.registry.destroy(wv) {
                if let Ok(parent) = self.window_mut(v.window) {
                    parent.release_webview(wv);
                }
            }
            let lost = self.ipc.close(wv);
            if lost > 0 {
                debug!(handle = %wv, lost, "dropped queued ipc messages");
            }
            removed.webviews.push(wv);
        }
        for w in windows {
            if self.registry.destroy(w).is_ok() {
                self.pending_events.push_back(LoopEvent {
                    window_id: w,
                    event: WindowEvent::Destroyed,
                });
                removed.windows.push(w);
            }
        }

        let gone: BTreeSet<Handle> = removed
            .webviews
            .iter()
            .chain(&removed.windows)
            .copied()
            .collect();
        self.requests.retain(|r| !gone.contains(&r.handle()));
        self.deferred_frames.retain(|w| !gone.contains(w));
        if !removed.windows.is_empty() && !self.has_windows() {
            self.windows_closed = true;
        }
        Ok(removed)
    }
}

/// Everything one loop owns. Shared by the loop and its handles.
pub(crate) struct LoopShared {
    id: LoopId,
    owner: ThreadId,
    state: Mutex<LoopState>,
    backend: ThreadBound<RefCell<Box<dyn Backend>>>,
    renderer: ThreadBound<RefCell<PixelRenderer>>,
    callbacks: ThreadBound<RefCell<Callbacks>>,
    errors: mpsc::UnboundedSender<DispatchError>,
}

impl LoopShared {
    pub(crate) fn check_thread(&self) -> Result<()> {
        check_thread(self.owner)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` on the state after checking the thread.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut LoopState) -> Result<T>) -> Result<T> {
        self.check_thread()?;
        f(&mut self.lock())
    }

    /// Like [`with_state`](Self::with_state), but fails once the loop has
    /// stopped.
    pub(crate) fn with_runnable_state<T>(
        &self,
        f: impl FnOnce(&mut LoopState) -> Result<T>,
    ) -> Result<T> {
        self.with_state(|state| {
            if state.phase == Phase::Stopped {
                return Err(CoreError::LoopNotRunnable);
            }
            f(state)
        })
    }

    pub(crate) fn backend(&self) -> Result<RefMut<'_, Box<dyn Backend>>> {
        self.backend
            .get()?
            .try_borrow_mut()
            .map_err(|_| CoreError::Backend("backend is busy".into()))
    }

    pub(crate) fn renderer(&self) -> Result<RefMut<'_, PixelRenderer>> {
        self.renderer
            .get()?
            .try_borrow_mut()
            .map_err(|_| CoreError::Backend("renderer is busy".into()))
    }

    pub(crate) fn report(&self, err: DispatchError) {
        warn!(loop_id = %self.id, error = %err, "dispatch error");
        let _ = self.errors.send(err);
    }

    /// Destroy a resource and its dependents, releasing the native objects
    /// before returning.
    pub(crate) fn destroy_resource(&self, handle: Handle) -> Result<()> {
        let removed = self.with_state(|state| state.remove_cascade(handle))?;
        self.release_native(&removed);
        info!(
            loop_id = %self.id,
            %handle,
            windows = removed.windows.len(),
            webviews = removed.webviews.len(),
            "resource destroyed"
        );
        Ok(())
    }

    fn release_native(&self, removed: &Removed) {
        match self.backend() {
            Ok(mut backend) => {
                for h in removed.webviews.iter().chain(&removed.windows) {
                    backend.destroy(*h);
                }
            }
            Err(e) => warn!(error = %e, "could not release native resources"),
        }
        if let Ok(mut renderer) = self.renderer() {
            for w in &removed.windows {
                renderer.release(*w);
            }
        }
        let unbound: Vec<_> = match self.callbacks_mut() {
            Ok(mut callbacks) => removed
                .webviews
                .iter()
                .filter_map(|wv| callbacks.unbind_ipc(*wv))
                .collect(),
            _ => Vec::new(),
        };
        drop(unbound);
    }

    /// Enter `Stopped`: destroy every resource and drop every listener.
    /// Later calls do nothing.
    pub(crate) fn shutdown(&self) {
        let drained = {
            let mut state = self.lock();
            if state.phase == Phase::Stopped {
                return;
            }
            state.phase = Phase::Stopped;
            state.requests.clear();
            state.ipc.clear();
            state.pending_events.clear();
            state.deferred_frames.clear();
            state.registry.drain()
        };

        let (webviews, windows): (Vec<_>, Vec<_>) = drained
            .into_iter()
            .partition(|(_, r)| matches!(r, Resource::WebView(_)));
        let removed = Removed {
            webviews: webviews.into_iter().map(|(h, _)| h).collect(),
            windows: windows.into_iter().map(|(h, _)| h).collect(),
        };
        if let Ok(mut backend) = self.backend() {
            for h in removed.webviews.iter().chain(&removed.windows) {
                backend.destroy(*h);
            }
        }
        if let Ok(mut renderer) = self.renderer() {
            renderer.clear();
        }
        let callbacks = match self.callbacks_mut() {
            Ok(mut callbacks) => std::mem::take(&mut *callbacks),
            _ => Callbacks::default(),
        };
        drop(callbacks);

        info!(
            loop_id = %self.id,
            windows = removed.windows.len(),
            webviews = removed.webviews.len(),
            "event loop stopped"
        );
    }
}

/// Cloneable, `Send + Sync` reference to an event loop.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Arc<LoopShared>,
}

impl fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle")
            .field("id", &self.shared.id)
            .finish_non_exhaustive()
    }
}

impl LoopHandle {
    pub(crate) fn shared(&self) -> &LoopShared {
        &self.shared
    }

    pub fn id(&self) -> &LoopId {
        &self.shared.id
    }

    pub fn phase(&self) -> Result<Phase> {
        self.shared.with_state(|s| Ok(s.phase))
    }

    /// Stop the loop at the end of the current (or next) pump cycle.
    pub fn exit(&self) -> Result<()> {
        self.shared.with_state(|s| {
            if !s.exit_requested {
                debug!(loop_id = %self.shared.id, "exit requested");
            }
            s.exit_requested = true;
            Ok(())
        })
    }

    pub fn control_flow(&self) -> Result<ControlFlow> {
        self.shared.with_state(|s| Ok(s.settings.control_flow))
    }

    pub fn set_control_flow(&self, control_flow: ControlFlow) -> Result<()> {
        self.shared.with_state(|s| {
            s.settings.control_flow = control_flow;
            Ok(())
        })
    }

    /// Register a listener for every window event. Listeners run in
    /// registration order.
    pub fn on_event<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: FnMut(&LoopHandle, &LoopEvent) -> ListenerResult + 'static,
    {
        self.shared.check_thread()?;
        Ok(self.shared.callbacks_mut()?.add_event(Box::new(listener)))
    }

    /// Remove an event listener. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> Result<bool> {
        self.shared.check_thread()?;
        let removed = self.shared.callbacks_mut()?.remove_event(id);
        Ok(removed.is_some())
    }

    pub fn available_monitors(&self) -> Result<Vec<MonitorInfo>> {
        self.shared.check_thread()?;
        Ok(self.shared.backend()?.available_monitors())
    }

    pub fn primary_monitor(&self) -> Result<Option<MonitorInfo>> {
        self.shared.check_thread()?;
        Ok(self.shared.backend()?.primary_monitor())
    }

    /// Every live window and webview handle, in creation order.
    pub fn live_handles(&self) -> Result<Vec<Handle>> {
        self.shared.with_state(|s| Ok(s.registry.handles()))
    }

    /// Typed access to a live window, e.g. from a [`LoopEvent`].
    pub fn window(&self, handle: Handle) -> Result<Window> {
        self.shared.with_state(|s| s.window(handle).map(|_| ()))?;
        Ok(Window::new(handle, self.clone()))
    }

    pub fn webview(&self, handle: Handle) -> Result<WebView> {
        self.shared.with_state(|s| s.webview(handle).map(|_| ()))?;
        Ok(WebView::new(handle, self.clone()))
    }

    /// Drop the frame kept for `window`, including one still waiting for
    /// its window to be created. The next render allocates a fresh one.
    /// Returns whether a frame was cached.
    pub fn clear_render_cache(&self, window: Handle) -> Result<bool> {
        self.shared.with_state(|s| {
            s.deferred_frames.remove(&window);
            Ok(())
        })?;
        let released = self.shared.renderer()?.release(window);
        if released {
            debug!(%window, "render cache cleared");
        }
        Ok(released)
    }

    /// Drop the frames of every window.
    pub fn clear_render_caches(&self) -> Result<()> {
        self.shared.with_state(|s| {
            s.deferred_frames.clear();
            Ok(())
        })?;
        let mut renderer = self.shared.renderer()?;
        debug!(windows = renderer.cached_windows(), "render caches cleared");
        renderer.clear();
        Ok(())
    }

    /// Replace the loop settings. Queue limits apply to new messages only.
    pub fn set_settings(&self, settings: LoopSettings) -> Result<()> {
        self.shared.with_state(|s| {
            s.ipc
                .set_limits(settings.max_pending_messages, settings.max_message_bytes);
            s.settings = settings.clone();
            Ok(())
        })?;
        self.shared.renderer()?.set_options(settings.render);
        Ok(())
    }
}

/// The loop itself. Owned by the host on the thread that created it.
pub struct EventLoop {
    handle: LoopHandle,
    errors: Option<mpsc::UnboundedReceiver<DispatchError>>,
    _not_send: PhantomData<Rc<()>>,
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("id", self.handle.id())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl EventLoop {
    /// A loop on the native windowing system.
    #[cfg(feature = "native")]
    pub fn new() -> Result<Self> {
        let backend = crate::backend::NativeBackend::new()?;
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// A loop on the native windowing system.
    #[cfg(not(feature = "native"))]
    pub fn new() -> Result<Self> {
        Err(CoreError::Unsupported(
            "built without the `native` feature; use EventLoop::headless".into(),
        ))
    }

    /// A loop on the simulated backend, plus the controller that drives it.
    pub fn headless() -> (Self, HeadlessController) {
        let (backend, controller) = HeadlessBackend::new();
        (Self::with_backend(Box::new(backend)), controller)
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self::with_settings(backend, LoopSettings::default())
    }

    pub fn with_settings(backend: Box<dyn Backend>, settings: LoopSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = LoopId::new();
        info!(loop_id = %id, backend = backend.name(), "event loop created");
        let shared = LoopShared {
            id,
            owner: thread::current().id(),
            renderer: ThreadBound::new(RefCell::new(PixelRenderer::new(settings.render))),
            state: Mutex::new(LoopState::new(settings)),
            backend: ThreadBound::new(RefCell::new(backend)),
            callbacks: ThreadBound::new(RefCell::new(Callbacks::default())),
            errors: tx,
        };
        Self {
            handle: LoopHandle {
                shared: Arc::new(shared),
            },
            errors: Some(rx),
            _not_send: PhantomData,
        }
    }

    pub fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    pub fn id(&self) -> &LoopId {
        self.handle.id()
    }

    pub fn phase(&self) -> Phase {
        self.handle.shared.lock().phase
    }

    /// Receiver for failures reported during dispatch. Can be taken once.
    pub fn take_error_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<DispatchError>> {
        self.errors.take()
    }

    pub fn on_event<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: FnMut(&LoopHandle, &LoopEvent) -> ListenerResult + 'static,
    {
        self.handle.on_event(listener)
    }

    pub fn exit(&self) -> Result<()> {
        self.handle.exit()
    }

    /// Run one pump cycle. Returns `false` in the cycle that stops the loop
    /// and on every call after that.
    pub fn run_iteration(&mut self) -> bool {
        self.handle.shared.pump_cycle(&self.handle)
    }

    /// Pump until the loop stops.
    pub fn run(mut self) {
        while self.run_iteration() {}
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.handle.shared.shutdown();
    }
}
