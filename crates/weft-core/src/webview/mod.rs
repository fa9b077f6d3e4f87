//! Webviews hosted in windows, and their IPC endpoint.

mod builder;


pub use builder::WebViewBuilder;

use std::fmt;

use tracing::{debug, trace};
use weft_common::{CoreError, Handle, ListenerResult, Result};
use weft_webview::IpcPayload;

use crate::backend::NativeRequest;
use crate::event_loop::LoopHandle;
use crate::resource::WebViewRecord;
use crate::window::Window;

#[derive(Clone)]
pub struct WebView {
    id: Handle,
    event_loop: LoopHandle,
}

impl fmt::Debug for WebView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebView").field("id", &self.id).finish()
    }
}

impl PartialEq for WebView {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WebView {}

impl WebView {
    pub(crate) fn new(id: Handle, event_loop: LoopHandle) -> Self {
        Self { id, event_loop }
    }

    pub fn id(&self) -> Handle {
        self.id
    }

    pub fn event_loop(&self) -> &LoopHandle {
        &self.event_loop
    }

    fn read<T>(&self, f: impl FnOnce(&WebViewRecord) -> T) -> Result<T> {
        self.event_loop
            .shared()
            .with_state(|state| state.webview(self.id).map(f))
    }

    fn request(&self, request: NativeRequest) -> Result<()> {
        self.event_loop.shared().with_state(|state| {
            state.webview(self.id)?;
            trace!(webview = %self.id, ?request, "queued");
            state.requests.push_back(request);
            Ok(())
        })
    }

    /// The window this webview is drawn in.
    pub fn window(&self) -> Result<Window> {
        let window = self.read(|v| v.window)?;
        Ok(Window::new(window, self.event_loop.clone()))
    }

    pub fn channel(&self) -> Result<String> {
        self.read(|v| v.channel.clone())
    }

    /// URL of the last finished navigation, or of the last one requested.
    pub fn url(&self) -> Result<String> {
        self.read(|v| v.url.clone())
    }

    /// Queue a message for the page. Messages reach the page in send order
    /// on the next pump cycle.
    pub fn send(&self, payload: impl Into<IpcPayload>) -> Result<()> {
        let payload = payload.into();
        self.event_loop.shared().with_state(|state| {
            state.webview(self.id)?;
            state.ipc.send(self.id, payload)
        })
    }

    /// Bind the listener for messages from the page. Messages that arrived
    /// before binding are delivered first, in order.
    pub fn on<F>(&self, listener: F) -> Result<()>
    where
        F: FnMut(&LoopHandle, &IpcPayload) -> ListenerResult + 'static,
    {
        let shared = self.event_loop.shared();
        shared.with_state(|state| state.webview(self.id).map(|_| ()))?;
        shared.bind_ipc(self.id, Box::new(listener))?;
        debug!(webview = %self.id, "ipc listener bound");
        Ok(())
    }

    /// Unbind the IPC listener. Returns whether one was bound. Later
    /// messages queue until a new listener is bound.
    pub fn off(&self) -> Result<bool> {
        let shared = self.event_loop.shared();
        shared.with_state(|state| state.webview(self.id).map(|_| ()))?;
        shared.unbind_ipc(self.id)
    }

    pub fn load_url(&self, url: impl Into<String>) -> Result<()> {
        self.request(NativeRequest::LoadUrl {
            handle: self.id,
            url: url.into(),
        })
    }

    pub fn load_html(&self, html: impl Into<String>) -> Result<()> {
        self.request(NativeRequest::LoadHtml {
            handle: self.id,
            html: html.into(),
        })
    }

    /// Run script in the page. Fire and forget.
    pub fn evaluate_script(&self, script: impl Into<String>) -> Result<()> {
        self.request(NativeRequest::EvaluateScript {
            handle: self.id,
            script: script.into(),
        })
    }

    pub fn open_devtools(&self) -> Result<()> {
        if !self.read(|v| v.devtools_enabled)? {
            return Err(CoreError::Unsupported(format!(
                "devtools are disabled for {}",
                self.id
            )));
        }
        self.request(NativeRequest::OpenDevtools { handle: self.id })
    }

    pub fn close_devtools(&self) -> Result<()> {
        self.request(NativeRequest::CloseDevtools { handle: self.id })
    }

    pub fn is_devtools_open(&self) -> Result<bool> {
        self.read(|v| v.devtools_open)
    }

    /// Destroy the webview now. A window created for it goes too.
    pub fn destroy(&self) -> Result<()> {
        let shared = self.event_loop.shared();
        shared.with_state(|state| state.webview(self.id).map(|_| ()))?;
        shared.destroy_resource(self.id)
    }
}

impl From<&WebView> for Handle {
    fn from(webview: &WebView) -> Self {
        webview.id
    }
}
