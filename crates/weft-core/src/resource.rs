//! Records the registry keeps for live windows and webviews.

use std::collections::BTreeSet;

use weft_common::{CoreError, Handle, Position, Size, Theme};

use crate::window::WindowConfig;

/// Who draws into a window's client area.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum SurfaceOwner {
    #[default]
    Unclaimed,
    Pixels,
    WebViews(BTreeSet<Handle>),
}

impl SurfaceOwner {
    pub(crate) fn describe(&self) -> String {
        match self {
            SurfaceOwner::Unclaimed => "nothing".into(),
            SurfaceOwner::Pixels => "the pixel renderer".into(),
            SurfaceOwner::WebViews(views) => {
                let names: Vec<String> = views.iter().map(|h| h.to_string()).collect();
                format!("webview {}", names.join(", "))
            }
        }
    }
}

/// Cached state of a window. Title and flags change when their request is
/// handed to the backend; geometry, focus, theme and scale change when the
/// backend reports them.
#[derive(Debug, Clone)]
pub(crate) struct WindowRecord {
    pub title: String,
    pub inner_size: Size,
    pub position: Position,
    pub resizable: bool,
    pub decorated: bool,
    pub visible: bool,
    pub focused: bool,
    pub theme: Option<Theme>,
    pub scale_factor: f64,
    pub surface: SurfaceOwner,
}

impl WindowRecord {
    pub(crate) fn new(config: &WindowConfig) -> Self {
        Self {
            title: config.title.clone(),
            inner_size: config.inner_size,
            position: config.position.unwrap_or_default(),
            resizable: config.resizable,
            decorated: config.decorated,
            visible: config.visible,
            focused: false,
            theme: config.theme,
            scale_factor: 1.0,
            surface: SurfaceOwner::Unclaimed,
        }
    }

    /// Fails if webviews own the surface.
    pub(crate) fn check_pixels(&self, window: Handle) -> Result<(), CoreError> {
        match self.surface {
            SurfaceOwner::WebViews(_) => Err(CoreError::SurfaceOwnershipConflict {
                window,
                owner: self.surface.describe(),
            }),
            _ => Ok(()),
        }
    }

    /// Claim the surface for pixel rendering.
    pub(crate) fn claim_pixels(&mut self, window: Handle) -> Result<(), CoreError> {
        self.check_pixels(window)?;
        self.surface = SurfaceOwner::Pixels;
        Ok(())
    }

    /// Attach a webview to the surface.
    pub(crate) fn claim_webview(
        &mut self,
        window: Handle,
        webview: Handle,
    ) -> Result<(), CoreError> {
        match &mut self.surface {
            SurfaceOwner::Pixels => Err(CoreError::SurfaceOwnershipConflict {
                window,
                owner: self.surface.describe(),
            }),
            SurfaceOwner::WebViews(views) => {
                views.insert(webview);
                Ok(())
            }
            SurfaceOwner::Unclaimed => {
                self.surface = SurfaceOwner::WebViews(BTreeSet::from([webview]));
                Ok(())
            }
        }
    }

    pub(crate) fn release_webview(&mut self, webview: Handle) {
        if let SurfaceOwner::WebViews(views) = &mut self.surface {
            views.remove(&webview);
            if views.is_empty() {
                self.surface = SurfaceOwner::Unclaimed;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WebViewRecord {
    pub window: Handle,
    pub channel: String,
    pub url: String,
    pub devtools_enabled: bool,
    pub devtools_open: bool,
    /// The window was created for this webview and goes away with it.
    pub owns_window: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Resource {
    Window(WindowRecord),
    WebView(WebViewRecord),
}

impl Resource {
    pub(crate) fn as_window(&self) -> Option<&WindowRecord> {
        match self {
            Resource::Window(w) => Some(w),
            Resource::WebView(_) => None,
        }
    }

    pub(crate) fn as_webview(&self) -> Option<&WebViewRecord> {
        match self {
            Resource::WebView(v) => Some(v),
            Resource::Window(_) => None,
        }
    }
}
