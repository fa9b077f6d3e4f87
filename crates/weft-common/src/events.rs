use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::types::Theme;

/// A native window event after translation by the event loop.
///
/// Anything the loop does not model is carried as `Other` with a short
/// description instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WindowEvent {
    CloseRequested,
    Resized { width: u32, height: u32 },
    Moved { x: i32, y: i32 },
    Focused,
    Unfocused,
    Destroyed,
    ScaleFactorChanged(f64),
    ThemeChanged(Theme),
    RedrawRequested,
    Other(String),
}

impl WindowEvent {
    /// Short, stable name used in logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            WindowEvent::CloseRequested => "close-requested",
            WindowEvent::Resized { .. } => "resized",
            WindowEvent::Moved { .. } => "moved",
            WindowEvent::Focused => "focused",
            WindowEvent::Unfocused => "unfocused",
            WindowEvent::Destroyed => "destroyed",
            WindowEvent::ScaleFactorChanged(_) => "scale-factor-changed",
            WindowEvent::ThemeChanged(_) => "theme-changed",
            WindowEvent::RedrawRequested => "redraw-requested",
            WindowEvent::Other(_) => "other",
        }
    }
}

/// What a loop listener receives: the event and the window it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopEvent {
    pub window_id: Handle,
    pub event: WindowEvent,
}
