//! What the windowing system underneath can do.
//!
//! Detection only reads the environment. Picking a display server is left to
//! winit, which prefers Wayland whenever `WAYLAND_DISPLAY` is set.

use std::env;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    Windows,
    MacOs,
    X11,
    Wayland,
    Unknown,
}

impl fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayServer::Windows => "windows",
            DisplayServer::MacOs => "macos",
            DisplayServer::X11 => "x11",
            DisplayServer::Wayland => "wayland",
            DisplayServer::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    pub display_server: DisplayServer,
    /// Transparent windows and webviews.
    pub supports_transparency: bool,
    /// Windows can be placed at absolute screen positions.
    pub supports_positioning: bool,
    /// [`Window::render`](crate::Window::render) can reach the screen.
    pub supports_direct_rendering: bool,
}

impl PlatformInfo {
    fn for_server(display_server: DisplayServer) -> Self {
        let known = display_server != DisplayServer::Unknown;
        Self {
            display_server,
            supports_transparency: known,
            // Wayland clients never learn or choose their global position.
            supports_positioning: display_server != DisplayServer::Wayland,
            supports_direct_rendering: known,
        }
    }
}

/// Describe the platform the current process runs on.
pub fn platform_info() -> PlatformInfo {
    detect(env::consts::OS, |name| env::var(name).ok())
}

fn detect(os: &str, var: impl Fn(&str) -> Option<String>) -> PlatformInfo {
    let set = |name: &str| var(name).is_some_and(|v| !v.is_empty());
    let server = match os {
        "windows" => DisplayServer::Windows,
        "macos" => DisplayServer::MacOs,
        "linux" | "freebsd" | "dragonfly" | "netbsd" | "openbsd" => {
            if set("WAYLAND_DISPLAY") {
                DisplayServer::Wayland
            } else if set("DISPLAY") {
                DisplayServer::X11
            } else {
                match var("XDG_SESSION_TYPE").as_deref() {
                    Some("wayland") => DisplayServer::Wayland,
                    Some("x11") => DisplayServer::X11,
                    _ => DisplayServer::Unknown,
                }
            }
        }
        _ => DisplayServer::Unknown,
    };
    PlatformInfo::for_server(server)
}
