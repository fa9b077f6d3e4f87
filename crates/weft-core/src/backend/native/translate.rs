//! winit types to weft types.

use weft_common::{MonitorInfo, Position, Size, Theme, WindowEvent};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent as WinitEvent;
use winit::monitor::MonitorHandle;

pub(super) fn window_event(event: &WinitEvent) -> WindowEvent {
    match event {
        WinitEvent::CloseRequested => WindowEvent::CloseRequested,
        WinitEvent::Resized(size) => WindowEvent::Resized {
            width: size.width,
            height: size.height,
        },
        WinitEvent::Moved(pos) => WindowEvent::Moved { x: pos.x, y: pos.y },
        WinitEvent::Focused(true) => WindowEvent::Focused,
        WinitEvent::Focused(false) => WindowEvent::Unfocused,
        WinitEvent::Destroyed => WindowEvent::Destroyed,
        WinitEvent::ScaleFactorChanged { scale_factor, .. } => {
            WindowEvent::ScaleFactorChanged(*scale_factor)
        }
        WinitEvent::ThemeChanged(theme) => WindowEvent::ThemeChanged(theme_from(*theme)),
        WinitEvent::RedrawRequested => WindowEvent::RedrawRequested,
        other => WindowEvent::Other(other_name(other).to_string()),
    }
}

fn other_name(event: &WinitEvent) -> &'static str {
    match event {
        WinitEvent::KeyboardInput { .. } => "keyboard-input",
        WinitEvent::ModifiersChanged(_) => "modifiers-changed",
        WinitEvent::Ime(_) => "ime",
        WinitEvent::CursorMoved { .. } => "cursor-moved",
        WinitEvent::CursorEntered { .. } => "cursor-entered",
        WinitEvent::CursorLeft { .. } => "cursor-left",
        WinitEvent::MouseWheel { .. } => "mouse-wheel",
        WinitEvent::MouseInput { .. } => "mouse-input",
        WinitEvent::DroppedFile(_) => "dropped-file",
        WinitEvent::HoveredFile(_) => "hovered-file",
        WinitEvent::HoveredFileCancelled => "hovered-file-cancelled",
        WinitEvent::Occluded(_) => "occluded",
        WinitEvent::Touch(_) => "touch",
        _ => "native",
    }
}

pub(super) fn theme_from(theme: winit::window::Theme) -> Theme {
    match theme {
        winit::window::Theme::Light => Theme::Light,
        winit::window::Theme::Dark => Theme::Dark,
    }
}

pub(super) fn theme_to(theme: Theme) -> winit::window::Theme {
    match theme {
        Theme::Light => winit::window::Theme::Light,
        Theme::Dark => winit::window::Theme::Dark,
    }
}

pub(super) fn size_from(size: PhysicalSize<u32>) -> Size {
    Size::new(size.width, size.height)
}

pub(super) fn size_to(size: Size) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width, size.height)
}

pub(super) fn position_to(position: Position) -> PhysicalPosition<i32> {
    PhysicalPosition::new(position.x, position.y)
}

pub(super) fn monitor(handle: &MonitorHandle) -> MonitorInfo {
    let pos = handle.position();
    MonitorInfo {
        name: handle.name(),
        position: Position::new(pos.x, pos.y),
        size: size_from(handle.size()),
        scale_factor: handle.scale_factor(),
    }
}
