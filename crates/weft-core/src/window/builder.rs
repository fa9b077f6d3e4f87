use weft_common::{CoreError, Position, Size, Theme};
use weft_config::schema::WindowDefaults;

use super::Window;
use crate::backend::NativeRequest;
use crate::event_loop::LoopHandle;
use crate::resource::WindowRecord;

/// Frozen window configuration consumed by [`WindowBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub inner_size: Size,
    /// `None` lets the system place the window.
    pub position: Option<Position>,
    pub resizable: bool,
    pub decorated: bool,
    pub visible: bool,
    pub focused: bool,
    /// `None` follows the system theme.
    pub theme: Option<Theme>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::from_defaults(&WindowDefaults::default())
    }
}

impl WindowConfig {
    pub fn from_defaults(defaults: &WindowDefaults) -> Self {
        Self {
            title: defaults.title.clone(),
            inner_size: Size::new(defaults.width, defaults.height),
            position: None,
            resizable: defaults.resizable,
            decorated: defaults.decorated,
            visible: defaults.visible,
            focused: true,
            theme: defaults.theme,
        }
    }
}

/// Accumulates a [`WindowConfig`] and creates the window on a loop.
#[derive(Debug, Clone, Default)]
pub struct WindowBuilder {
    config: WindowConfig,
}

impl WindowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: WindowConfig) -> Self {
        Self { config }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn with_inner_size(mut self, width: u32, height: u32) -> Self {
        self.config.inner_size = Size::new(width, height);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.config.position = Some(Position::new(x, y));
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.config.resizable = resizable;
        self
    }

    pub fn with_decorated(mut self, decorated: bool) -> Self {
        self.config.decorated = decorated;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.config.visible = visible;
        self
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.config.focused = focused;
        self
    }

    pub fn with_theme(mut self, theme: Option<Theme>) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Register the window and queue its native creation. It appears after
    /// the next pump cycle.
    pub fn build(self, event_loop: &LoopHandle) -> Result<Window, CoreError> {
        let shared = event_loop.shared();
        let handle = shared.with_runnable_state(|state| {
            let handle = state.register_window(WindowRecord::new(&self.config));
            state.requests.push_back(NativeRequest::CreateWindow {
                handle,
                config: self.config.clone(),
            });
            Ok(handle)
        })?;
        tracing::debug!(%handle, title = %self.config.title, "window registered");
        Ok(Window::new(handle, event_loop.clone()))
    }
}
