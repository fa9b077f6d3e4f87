//! Native top-level windows.
//!
//! A [`Window`] is a handle plus the loop it lives on. Setters queue a
//! request for the next pump cycle; getters read the loop's cached state.
//! Title and flags read back immediately once the request has been handed
//! to the backend. Geometry, focus, theme and scale read back after the
//! backend reports the matching event.

mod builder;

#[cfg(test)]
mod tests;

pub use builder::{WindowBuilder, WindowConfig};

use std::fmt;

use tracing::trace;
use weft_common::{Handle, Position, Result, Size, Theme};

use crate::backend::NativeRequest;
use crate::event_loop::LoopHandle;
use crate::render::validate_buffer;
use crate::resource::WindowRecord;

#[derive(Clone)]
pub struct Window {
    id: Handle,
    event_loop: LoopHandle,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window").field("id", &self.id).finish()
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Window {}

impl Window {
    pub(crate) fn new(id: Handle, event_loop: LoopHandle) -> Self {
        Self { id, event_loop }
    }

    pub fn id(&self) -> Handle {
        self.id
    }

    pub fn event_loop(&self) -> &LoopHandle {
        &self.event_loop
    }

    fn read<T>(&self, f: impl FnOnce(&WindowRecord) -> T) -> Result<T> {
        self.event_loop
            .shared()
            .with_state(|state| state.window(self.id).map(f))
    }

    fn request(&self, request: NativeRequest) -> Result<()> {
        self.event_loop.shared().with_state(|state| {
            state.window(self.id)?;
            trace!(window = %self.id, ?request, "queued");
            state.requests.push_back(request);
            Ok(())
        })
    }

    pub fn title(&self) -> Result<String> {
        self.read(|w| w.title.clone())
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.request(NativeRequest::SetTitle {
            handle: self.id,
            title: title.into(),
        })
    }

    /// Last size reported by the windowing system, in physical pixels.
    pub fn inner_size(&self) -> Result<Size> {
        self.read(|w| w.inner_size)
    }

    pub fn set_inner_size(&self, width: u32, height: u32) -> Result<()> {
        self.request(NativeRequest::SetInnerSize {
            handle: self.id,
            size: Size::new(width, height),
        })
    }

    pub fn position(&self) -> Result<Position> {
        self.read(|w| w.position)
    }

    pub fn set_position(&self, x: i32, y: i32) -> Result<()> {
        self.request(NativeRequest::SetPosition {
            handle: self.id,
            position: Position::new(x, y),
        })
    }

    pub fn is_resizable(&self) -> Result<bool> {
        self.read(|w| w.resizable)
    }

    pub fn set_resizable(&self, resizable: bool) -> Result<()> {
        self.request(NativeRequest::SetResizable {
            handle: self.id,
            resizable,
        })
    }

    pub fn is_decorated(&self) -> Result<bool> {
        self.read(|w| w.decorated)
    }

    pub fn set_decorated(&self, decorated: bool) -> Result<()> {
        self.request(NativeRequest::SetDecorated {
            handle: self.id,
            decorated,
        })
    }

    pub fn is_visible(&self) -> Result<bool> {
        self.read(|w| w.visible)
    }

    pub fn set_visible(&self, visible: bool) -> Result<()> {
        self.request(NativeRequest::SetVisible {
            handle: self.id,
            visible,
        })
    }

    pub fn is_focused(&self) -> Result<bool> {
        self.read(|w| w.focused)
    }

    /// Ask for focus. The window manager may refuse.
    pub fn set_focused(&self, focused: bool) -> Result<()> {
        self.request(NativeRequest::SetFocused {
            handle: self.id,
            focused,
        })
    }

    /// Last known theme, `None` until the system reports one.
    pub fn theme(&self) -> Result<Option<Theme>> {
        self.read(|w| w.theme)
    }

    pub fn set_theme(&self, theme: Option<Theme>) -> Result<()> {
        self.request(NativeRequest::SetTheme {
            handle: self.id,
            theme,
        })
    }

    pub fn scale_factor(&self) -> Result<f64> {
        self.read(|w| w.scale_factor)
    }

    pub fn request_redraw(&self) -> Result<()> {
        self.request(NativeRequest::RequestRedraw { handle: self.id })
    }

    /// Behave as if the user closed the window: listeners see
    /// `CloseRequested`, then the window is destroyed.
    pub fn close(&self) -> Result<()> {
        self.request(NativeRequest::Close { handle: self.id })
    }

    /// Destroy the window and every webview attached to it now.
    pub fn destroy(&self) -> Result<()> {
        let shared = self.event_loop.shared();
        shared.with_state(|state| state.window(self.id).map(|_| ()))?;
        shared.destroy_resource(self.id)
    }

    /// Draw an RGBA8 buffer of `width` x `height` pixels into the window,
    /// scaled to its current size. The frame is on screen when this returns,
    /// or, for a window whose native side is still being created, right
    /// after the next pump cycle creates it.
    ///
    /// The first presented frame claims the window for pixels; a window
    /// that hosts a webview cannot be rendered into.
    pub fn render(&self, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
        let shared = self.event_loop.shared();
        shared.check_thread()?;
        validate_buffer(width, height, rgba.len())?;

        let (target, pending) = shared.with_state(|state| {
            let record = state.window(self.id)?;
            record.check_pixels(self.id)?;
            Ok((record.inner_size, state.creation_pending(self.id)))
        })?;
        let deferred = pending || !shared.backend()?.window_ready(self.id);

        let mut renderer = shared.renderer()?;
        let frame = renderer.render(self.id, target, width, height, rgba)?;
        if deferred {
            drop(renderer);
            shared.with_state(|state| {
                state.deferred_frames.insert(self.id);
                Ok(())
            })?;
            trace!(window = %self.id, "frame deferred until the window exists");
            return Ok(());
        }
        shared.backend()?.present(self.id, frame)?;
        drop(renderer);

        shared.with_state(|state| {
            state.deferred_frames.remove(&self.id);
            state.window_mut(self.id)?.claim_pixels(self.id)
        })?;
        trace!(
            window = %self.id,
            src = %Size::new(width, height),
            dst = %target,
            "frame presented"
        );
        Ok(())
    }
}

impl From<&Window> for Handle {
    fn from(window: &Window) -> Self {
        window.id
    }
}
