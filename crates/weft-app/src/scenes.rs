//! Demo scenes: an animated pixel window and an echoing webview.

use tracing::{debug, info};
use weft_common::{LoopEvent, Result, WindowEvent};
use weft_config::WeftConfig;
use weft_core::{IpcPayload, LoopHandle, WebView, WebViewBuilder, Window, WindowBuilder};

use crate::cli::Args;

pub const CHANNEL: &str = "weft-demo";

/// Source resolution of the pixel scene; the renderer scales it to fit.
pub const PIXEL_WIDTH: u32 = 160;
pub const PIXEL_HEIGHT: u32 = 90;

const DEMO_PAGE: &str = r#"<!doctype html>
<html>
<body style="font-family: sans-serif; background: #1e1e2e; color: #cdd6f4">
  <h1>weft</h1>
  <p id="reply">waiting for the host...</p>
  <script>
    window.__webview_on_message__ = function (msg) {
      document.getElementById('reply').textContent = msg;
    };
    window.__webview__.postMessage('hello from the page');
  </script>
</body>
</html>"#;

pub struct Scene {
    pub pixels: Option<Window>,
    pub webview: Option<WebView>,
}

impl Scene {
    pub fn build(event_loop: &LoopHandle, config: &WeftConfig, args: &Args) -> Result<Self> {
        let pixels = if args.scene.pixels() {
            let defaults = weft_core::WindowConfig::from_defaults(&config.window);
            let window = WindowBuilder::from_config(defaults)
                .with_title("weft: pixels")
                .build(event_loop)?;
            info!(window = %window.id(), "pixel scene ready");
            Some(window)
        } else {
            None
        };

        let webview = if args.scene.webview() {
            let mut builder = WebViewBuilder::from_defaults(&config.webview, &config.window)
                .with_title("weft: webview");
            builder = match (&args.url, &args.html) {
                (Some(url), _) => builder.with_url(url.clone()),
                (None, Some(html)) => builder.with_html(html.clone()),
                (None, None) => builder.with_html(DEMO_PAGE),
            };
            let webview = builder.build(event_loop, CHANNEL)?;
            let id = webview.id();
            webview.on(move |handle, payload| {
                debug!(webview = %id, len = payload.len(), "message from page");
                let reply = match payload {
                    IpcPayload::Text(text) => IpcPayload::Text(format!("echo: {text}")),
                    IpcPayload::Binary(bytes) => IpcPayload::Binary(bytes.clone()),
                };
                handle.webview(id)?.send(reply)?;
                Ok(())
            })?;
            info!(webview = %id, "webview scene ready");
            Some(webview)
        } else {
            None
        };

        event_loop.on_event(|_, event: &LoopEvent| {
            match &event.event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    let name = event.event.name();
                    info!(window = %event.window_id, event = name, "window lifecycle");
                }
                WindowEvent::Other(_) => {}
                other => debug!(window = %event.window_id, event = other.name(), "window event"),
            }
            Ok(())
        })?;

        Ok(Self { pixels, webview })
    }

    /// Draw frame number `tick` into the pixel window while it is open.
    pub fn tick(&mut self, tick: u64) -> Result<()> {
        let Some(window) = &self.pixels else {
            return Ok(());
        };
        match window.render(PIXEL_WIDTH, PIXEL_HEIGHT, &gradient(PIXEL_WIDTH, PIXEL_HEIGHT, tick)) {
            Ok(()) => Ok(()),
            Err(weft_common::CoreError::InvalidHandle(_)) => {
                debug!("pixel window is gone");
                self.pixels = None;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// RGBA gradient that drifts horizontally with `tick`.
pub fn gradient(width: u32, height: u32, tick: u64) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    let shift = (tick % 256) as u32;
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255 / width.max(1) + shift) % 256) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            rgba.extend_from_slice(&[r, g, 0x80, 0xff]);
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SceneKind;
    use clap::Parser;
    use weft_core::EventLoop;

    fn args(scene: &str) -> Args {
        Args::parse_from(["weft", "--headless", "--scene", scene])
    }

    #[test]
    fn gradient_has_one_rgba_pixel_per_cell() {
        let rgba = gradient(4, 3, 0);
        assert_eq!(rgba.len(), 4 * 3 * 4);
        assert!(rgba.chunks(4).all(|px| px[3] == 0xff));
        assert_ne!(gradient(4, 3, 0), gradient(4, 3, 10));
    }

    #[test]
    fn both_scenes_get_their_own_windows() {
        let (mut event_loop, controller) = EventLoop::headless();
        let scene =
            Scene::build(event_loop.handle(), &WeftConfig::default(), &args("both")).unwrap();
        assert!(event_loop.run_iteration());

        let pixels = scene.pixels.as_ref().unwrap();
        let webview = scene.webview.as_ref().unwrap();
        assert_ne!(webview.window().unwrap().id(), pixels.id());
        assert!(controller.is_alive(pixels.id()));
        assert!(controller.is_alive(webview.id()));
    }

    #[test]
    fn pixel_scene_presents_frames() {
        let (mut event_loop, controller) = EventLoop::headless();
        let mut scene =
            Scene::build(event_loop.handle(), &WeftConfig::default(), &args("pixels")).unwrap();
        assert!(event_loop.run_iteration());
        scene.tick(0).unwrap();
        scene.tick(1).unwrap();
        let window = scene.pixels.as_ref().unwrap().id();
        assert_eq!(controller.frames_presented(window), 2);
    }

    #[test]
    fn tick_after_close_drops_the_window() {
        let (mut event_loop, controller) = EventLoop::headless();
        let mut scene =
            Scene::build(event_loop.handle(), &WeftConfig::default(), &args("both")).unwrap();
        assert!(event_loop.run_iteration());
        let window = scene.pixels.as_ref().unwrap().id();
        controller.request_close(window);
        assert!(event_loop.run_iteration());
        scene.tick(0).unwrap();
        assert!(scene.pixels.is_none());
    }

    #[test]
    fn webview_echoes_page_messages() {
        let (mut event_loop, controller) = EventLoop::headless();
        let scene =
            Scene::build(event_loop.handle(), &WeftConfig::default(), &args("webview")).unwrap();
        assert_eq!(args("webview").scene, SceneKind::Webview);
        assert!(event_loop.run_iteration());

        let webview = scene.webview.as_ref().unwrap().id();
        assert!(controller.post_message(webview, "ping"));
        assert!(event_loop.run_iteration());
        assert!(event_loop.run_iteration());
        assert_eq!(controller.delivered(webview), vec![IpcPayload::Text("echo: ping".into())]);
    }
}
