use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Physical pixel size of a window's inner area or a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Physical pixel position of a window's outer frame or a monitor origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// A display attached to the system, as reported by the windowing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub name: Option<String>,
    pub position: Position,
    pub size: Size,
    pub scale_factor: f64,
}

/// What the loop does when no native events are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlFlow {
    /// Return immediately.
    Poll,
    /// Block until the next native event.
    #[default]
    Wait,
    /// Block for at most the given duration.
    WaitUntil(Duration),
}

impl ControlFlow {
    /// Pump timeout for this policy; `None` means wait indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            ControlFlow::Poll => Some(Duration::ZERO),
            ControlFlow::Wait => None,
            ControlFlow::WaitUntil(d) => Some(*d),
        }
    }
}

/// How a pixel buffer is fitted into a window whose size differs from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Largest uniform scale that fits, letterboxed.
    #[default]
    Fit,
    /// Smallest uniform scale that covers the window, cropped.
    Fill,
    /// Independent x/y scale to the full window.
    Stretch,
    /// Largest whole-number scale that fits (at least 1x).
    Integer,
    /// No scaling, centred.
    None,
}
