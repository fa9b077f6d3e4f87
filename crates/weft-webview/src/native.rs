//! Child webviews backed by `wry`.

use std::sync::{Arc, Mutex};

use tracing::debug;
use wry::raw_window_handle::HasWindowHandle;
use wry::{WebView, WebViewBuilder};
use weft_common::{CoreError, Handle, Size};

use crate::config::{InitialContent, WebViewConfig};
use crate::events::{PageLoadState, WebViewEvent};
use crate::ipc::{init_script, js_deliver_message, IpcPayload};

/// Shared sink the native handlers push into; drained by the backend after
/// each pump.
pub type EventSink = Arc<Mutex<Vec<WebViewEvent>>>;

/// A live `wry` webview attached to a parent window.
pub struct NativeWebView {
    webview: WebView,
    handle: Handle,
}

fn backend_err(e: wry::Error) -> CoreError {
    CoreError::Backend(e.to_string())
}

/// Bounds covering the whole client area of a window of `size` physical
/// pixels.
pub fn full_bounds(size: Size) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Logical(wry::dpi::LogicalPosition::new(0.0, 0.0)),
        size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(size.width, size.height)),
    }
}

impl NativeWebView {
    /// Build a webview as a child of `window`, filling its `size` client area.
    pub fn create<W: HasWindowHandle>(
        handle: Handle,
        window: &W,
        size: Size,
        config: &WebViewConfig,
        channel: &str,
        events: EventSink,
    ) -> Result<Self, CoreError> {
        let mut builder = WebViewBuilder::new()
            .with_bounds(full_bounds(size))
            .with_transparent(config.transparent)
            .with_devtools(config.devtools)
            .with_initialization_script(&init_script(channel));

        if let Some(ua) = &config.user_agent {
            builder = builder.with_user_agent(ua);
        }

        builder = attach_ipc_handler(builder, Arc::clone(&events), handle);
        builder = attach_page_load_handler(builder, Arc::clone(&events), handle);
        builder = attach_title_handler(builder, events, handle);

        builder = match &config.content {
            InitialContent::Url(url) => builder.with_url(url),
            InitialContent::Html(html) => builder.with_html(html),
            InitialContent::Blank => builder.with_html("<html><body></body></html>"),
        };

        let webview = builder.build_as_child(window).map_err(backend_err)?;
        debug!(%handle, url = %config.content.url(), "webview created");
        Ok(Self { webview, handle })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn load_url(&self, url: &str) -> Result<(), CoreError> {
        self.webview.load_url(url).map_err(backend_err)
    }

    pub fn load_html(&self, html: &str) -> Result<(), CoreError> {
        self.webview.load_html(html).map_err(backend_err)
    }

    pub fn evaluate_script(&self, js: &str) -> Result<(), CoreError> {
        self.webview.evaluate_script(js).map_err(backend_err)
    }

    /// Hand one host-to-webview message to the page.
    pub fn deliver(&self, payload: &IpcPayload) -> Result<(), CoreError> {
        self.evaluate_script(&js_deliver_message(payload))
    }

    /// Follow a resize of the parent window.
    pub fn fit_to(&self, size: Size) -> Result<(), CoreError> {
        self.webview.set_bounds(full_bounds(size)).map_err(backend_err)
    }

    pub fn open_devtools(&self) {
        self.webview.open_devtools();
    }

    pub fn close_devtools(&self) {
        self.webview.close_devtools();
    }
}

/// Version of the platform webview engine.
pub fn webview_version() -> Result<String, CoreError> {
    wry::webview_version().map_err(backend_err)
}

fn push(events: &EventSink, event: WebViewEvent) {
    match events.lock() {
        Ok(mut evts) => evts.push(event),
        Err(poisoned) => poisoned.into_inner().push(event),
    }
}

fn attach_ipc_handler(
    builder: WebViewBuilder<'_>,
    events: EventSink,
    handle: Handle,
) -> WebViewBuilder<'_> {
    builder.with_ipc_handler(move |request| {
        let body = request.body().to_string();
        debug!(%handle, body_len = body.len(), "ipc message from script");
        push(&events, WebViewEvent::IpcMessage { handle, body });
    })
}

fn attach_page_load_handler(
    builder: WebViewBuilder<'_>,
    events: EventSink,
    handle: Handle,
) -> WebViewBuilder<'_> {
    builder.with_on_page_load_handler(move |event, url| {
        let state = PageLoadState::from(event);
        debug!(%handle, ?state, url = %url, "page load");
        push(&events, WebViewEvent::PageLoad { handle, state, url });
    })
}

fn attach_title_handler(
    builder: WebViewBuilder<'_>,
    events: EventSink,
    handle: Handle,
) -> WebViewBuilder<'_> {
    builder.with_document_title_changed_handler(move |title| {
        debug!(%handle, title = %title, "title changed");
        push(&events, WebViewEvent::TitleChanged { handle, title });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bounds_start_at_origin() {
        let rect = full_bounds(Size::new(800, 600));
        match rect.position {
            wry::dpi::Position::Logical(pos) => {
                assert_eq!((pos.x, pos.y), (0.0, 0.0));
            }
            _ => panic!("expected logical position"),
        }
        match rect.size {
            wry::dpi::Size::Physical(size) => {
                assert_eq!((size.width, size.height), (800, 600));
            }
            _ => panic!("expected physical size"),
        }
    }
}
