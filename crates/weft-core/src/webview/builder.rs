use tracing::debug;
use weft_common::{CoreError, Handle, Result, Size};
use weft_config::schema::{WebViewDefaults, WindowDefaults};
use weft_webview::{InitialContent, WebViewConfig};

use super::WebView;
use crate::backend::NativeRequest;
use crate::event_loop::LoopHandle;
use crate::resource::{Resource, SurfaceOwner, WebViewRecord, WindowRecord};
use crate::window::{Window, WindowConfig};

/// Accumulates webview options and creates the webview on a loop.
///
/// Without [`with_window`](Self::with_window) the webview gets a window of
/// its own, titled and sized from the builder, which is destroyed with it.
#[derive(Debug, Clone)]
pub struct WebViewBuilder {
    url: Option<String>,
    html: Option<String>,
    config: WebViewConfig,
    window: Option<Handle>,
    window_defaults: WindowDefaults,
}

impl Default for WebViewBuilder {
    fn default() -> Self {
        Self {
            url: None,
            html: None,
            config: WebViewConfig::default(),
            window: None,
            window_defaults: WindowDefaults::default(),
        }
    }
}

impl WebViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from configured defaults.
    pub fn from_defaults(webview: &WebViewDefaults, window: &WindowDefaults) -> Self {
        let mut builder = Self {
            window_defaults: window.clone(),
            ..Self::default()
        };
        builder.config.title = window.title.clone();
        builder.config.width = window.width;
        builder.config.height = window.height;
        builder.config.devtools = webview.devtools;
        builder.config.transparent = webview.transparent;
        builder.config.user_agent = webview.user_agent.clone();
        builder
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Title of the implicit window.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.config.width = width;
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.config.height = height;
        self
    }

    pub fn with_devtools(mut self, devtools: bool) -> Self {
        self.config.devtools = devtools;
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.config.transparent = transparent;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Attach to an existing window instead of creating one.
    pub fn with_window(mut self, window: &Window) -> Self {
        self.window = Some(window.id());
        self
    }

    /// Register the webview on `event_loop`, bound to IPC `channel`. The
    /// native webview appears after the next pump cycle.
    pub fn build(self, event_loop: &LoopHandle, channel: &str) -> Result<WebView> {
        let shared = event_loop.shared();
        shared.check_thread()?;

        let Self {
            url,
            html,
            mut config,
            window,
            window_defaults,
        } = self;
        config.content = InitialContent::from_parts(url, html)?;

        let handle = shared.with_runnable_state(|state| {
            let (window, owns_window) = match window {
                Some(window) => {
                    let record = state.window(window)?;
                    if record.surface == SurfaceOwner::Pixels {
                        return Err(CoreError::SurfaceOwnershipConflict {
                            window,
                            owner: record.surface.describe(),
                        });
                    }
                    (window, false)
                }
                None => {
                    let window_config = WindowConfig {
                        title: config.title.clone(),
                        inner_size: Size::new(config.width, config.height),
                        ..WindowConfig::from_defaults(&window_defaults)
                    };
                    let window = state.register_window(WindowRecord::new(&window_config));
                    state.requests.push_back(NativeRequest::CreateWindow {
                        handle: window,
                        config: window_config,
                    });
                    (window, true)
                }
            };

            let handle = state.registry.register(Resource::WebView(WebViewRecord {
                window,
                channel: channel.to_owned(),
                url: config.content.url().to_owned(),
                devtools_enabled: config.devtools,
                devtools_open: false,
                owns_window,
            }));
            state.window_mut(window)?.claim_webview(window, handle)?;
            state.ipc.open(handle);
            state.requests.push_back(NativeRequest::CreateWebView {
                handle,
                window,
                config,
                channel: channel.to_owned(),
            });
            debug!(%handle, %window, owns_window, channel, "webview registered");
            Ok(handle)
        })?;

        Ok(WebView::new(handle, event_loop.clone()))
    }
}
