use std::thread;

use weft_common::{
    ControlFlow, CoreError, DispatchError, Position, ScaleMode, Size, Theme, WindowEvent,
};
use weft_config::schema::WindowDefaults;

use super::*;
use crate::event_loop::{EventLoop, LoopSettings};
use crate::render::RenderOptions;
use crate::testing::{
    drain_errors, kinds, polling_loop, polling_loop_with, record_events, Lagging, Refusing,
};
use crate::webview::WebViewBuilder;

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((width * height) as usize)
}

#[test]
fn config_follows_defaults() {
    let defaults = WindowDefaults {
        title: "from config".into(),
        width: 320,
        height: 240,
        resizable: false,
        theme: Some(Theme::Dark),
        ..WindowDefaults::default()
    };
    let config = WindowConfig::from_defaults(&defaults);
    assert_eq!(config.title, "from config");
    assert_eq!(config.inner_size, Size::new(320, 240));
    assert!(!config.resizable);
    assert!(config.focused);
    assert_eq!(config.position, None);
    assert_eq!(config.theme, Some(Theme::Dark));

    let builder = WindowBuilder::from_config(config.clone()).with_position(10, 20);
    assert_eq!(builder.config().position, Some(Position::new(10, 20)));
    assert_eq!(builder.config().title, config.title);
}

#[test]
fn builder_options_reach_the_backend() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new()
        .with_title("tool")
        .with_inner_size(300, 200)
        .with_position(40, 50)
        .with_resizable(false)
        .with_decorated(false)
        .with_theme(Some(Theme::Dark))
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());

    let native = ctl.window(window.id()).unwrap();
    assert_eq!(native.title, "tool");
    assert_eq!(native.size, Size::new(300, 200));
    assert_eq!(native.position, Position::new(40, 50));
    assert!(!native.resizable);
    assert!(!native.decorated);
    assert_eq!(native.forced_theme, Some(Theme::Dark));

    assert_eq!(window.position().unwrap(), Position::new(40, 50));
    assert!(!window.is_resizable().unwrap());
    assert!(!window.is_decorated().unwrap());
    assert_eq!(window.theme().unwrap(), Some(Theme::Dark));
}

#[test]
fn geometry_updates_after_the_event() {
    let (mut event_loop, ctl) = polling_loop();
    let seen = record_events(&event_loop);
    let window = WindowBuilder::new()
        .with_inner_size(100, 100)
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());

    window.set_inner_size(640, 480).unwrap();
    window.set_position(5, 6).unwrap();
    assert_eq!(window.inner_size().unwrap(), Size::new(100, 100));
    assert!(event_loop.run_iteration());
    assert_eq!(window.inner_size().unwrap(), Size::new(640, 480));
    assert_eq!(window.position().unwrap(), Position::new(5, 6));
    assert_eq!(
        &kinds(&seen)[1..],
        &[
            WindowEvent::Resized {
                width: 640,
                height: 480
            },
            WindowEvent::Moved { x: 5, y: 6 }
        ]
    );

    // Same size again: nothing to report.
    window.set_inner_size(640, 480).unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(seen.borrow().len(), 3);

    ctl.resize(window.id(), 800, 600);
    assert!(event_loop.run_iteration());
    assert_eq!(window.inner_size().unwrap(), Size::new(800, 600));
}

#[test]
fn flags_apply_on_the_next_cycle() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());

    window.set_visible(false).unwrap();
    window.set_resizable(false).unwrap();
    window.set_decorated(false).unwrap();
    assert!(window.is_visible().unwrap());
    assert!(event_loop.run_iteration());

    assert!(!window.is_visible().unwrap());
    assert!(!window.is_resizable().unwrap());
    assert!(!window.is_decorated().unwrap());
    let native = ctl.window(window.id()).unwrap();
    assert!(!native.visible);
    assert!(!native.resizable);
    assert!(!native.decorated);
}

#[test]
fn focus_moves_between_windows() {
    let (mut event_loop, _ctl) = polling_loop();
    let a = WindowBuilder::new().build(event_loop.handle()).unwrap();
    let b = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());
    assert!(!a.is_focused().unwrap());
    assert!(b.is_focused().unwrap());

    a.set_focused(true).unwrap();
    assert!(event_loop.run_iteration());
    assert!(a.is_focused().unwrap());
    assert!(!b.is_focused().unwrap());

    a.set_focused(false).unwrap();
    assert!(event_loop.run_iteration());
    assert!(!a.is_focused().unwrap());
}

#[test]
fn unfocused_windows_start_unfocused() {
    let (mut event_loop, _ctl) = polling_loop();
    let window = WindowBuilder::new()
        .with_focused(false)
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());
    assert!(!window.is_focused().unwrap());
}

#[test]
fn theme_follows_events() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(window.theme().unwrap(), None);

    window.set_theme(Some(Theme::Dark)).unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(window.theme().unwrap(), Some(Theme::Dark));

    // A forced theme ignores the system.
    ctl.set_system_theme(Theme::Dark);
    window.set_theme(None).unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(window.theme().unwrap(), Some(Theme::Dark));

    ctl.set_system_theme(Theme::Light);
    assert!(event_loop.run_iteration());
    assert_eq!(window.theme().unwrap(), Some(Theme::Light));
}

#[test]
fn scale_factor_follows_events() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(window.scale_factor().unwrap(), 1.0);

    ctl.set_scale_factor(window.id(), 2.0);
    assert!(event_loop.run_iteration());
    assert_eq!(window.scale_factor().unwrap(), 2.0);
}

#[test]
fn redraw_and_close_requests() {
    let (mut event_loop, _ctl) = polling_loop();
    let seen = record_events(&event_loop);
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());

    window.request_redraw().unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(kinds(&seen).last(), Some(&WindowEvent::RedrawRequested));

    window.close().unwrap();
    assert!(!event_loop.run_iteration());
    assert_eq!(
        &kinds(&seen)[2..],
        &[WindowEvent::CloseRequested, WindowEvent::Destroyed]
    );
}

#[test]
fn destroy_takes_webviews_along() {
    let (mut event_loop, ctl) = polling_loop_with(|s| s.exit_on_last_window_closed = false);
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    let a = WebViewBuilder::new()
        .with_window(&window)
        .build(event_loop.handle(), "a")
        .unwrap();
    let b = WebViewBuilder::new()
        .with_window(&window)
        .build(event_loop.handle(), "b")
        .unwrap();
    assert!(event_loop.run_iteration());

    window.destroy().unwrap();
    for handle in [window.id(), a.id(), b.id()] {
        assert!(!ctl.is_alive(handle));
    }
    assert_eq!(a.url(), Err(CoreError::InvalidHandle(a.id())));
    assert_eq!(b.send("late"), Err(CoreError::InvalidHandle(b.id())));
}

// ---- rendering ----

#[test]
fn render_validates_buffer_size() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new()
        .with_inner_size(10, 10)
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());

    assert_eq!(
        window.render(10, 10, &[0; 399]),
        Err(CoreError::BufferSizeMismatch {
            width: 10,
            height: 10,
            expected: 400,
            actual: 399
        })
    );
    assert_eq!(ctl.frames_presented(window.id()), 0);
    assert!(window.render(10, 10, &[0; 400]).is_ok());
    assert_eq!(ctl.frames_presented(window.id()), 1);
}

#[test]
fn surface_shows_last_rendered_buffer() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new()
        .with_inner_size(10, 10)
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());

    window.render(10, 10, &solid(10, 10, [255, 0, 0, 255])).unwrap();
    assert_eq!(ctl.frame(window.id()).unwrap().pixel(0, 0), Some(0x00ff_0000));

    window.render(10, 10, &solid(10, 10, [0, 0, 255, 128])).unwrap();
    let frame = ctl.frame(window.id()).unwrap();
    assert_eq!(frame.size(), Size::new(10, 10));
    assert!(frame.pixels.iter().all(|&p| p == 0x0000_00ff));
    assert_eq!(ctl.frames_presented(window.id()), 2);
}

#[test]
fn render_before_first_pump() {
    let (mut event_loop, ctl) = polling_loop();
    let mut errors = event_loop.take_error_receiver().unwrap();
    let window = WindowBuilder::new()
        .with_inner_size(10, 10)
        .build(event_loop.handle())
        .unwrap();
    window.render(10, 10, &solid(10, 10, [255, 0, 0, 255])).unwrap();
    assert_eq!(ctl.frames_presented(window.id()), 0);

    assert!(event_loop.run_iteration());
    assert!(drain_errors(&mut errors).is_empty());
    assert_eq!(ctl.frames_presented(window.id()), 1);
    let frame = ctl.frame(window.id()).unwrap();
    assert_eq!(frame.size(), Size::new(10, 10));
    assert_eq!(frame.pixel(9, 9), Some(0x00ff_0000));

    // Presented once; later cycles do not repeat it.
    assert!(event_loop.run_iteration());
    assert_eq!(ctl.frames_presented(window.id()), 1);
    assert!(matches!(
        WebViewBuilder::new().with_window(&window).build(event_loop.handle(), "late"),
        Err(CoreError::SurfaceOwnershipConflict { .. })
    ));
}

#[test]
fn early_frame_waits_for_a_late_native_window() {
    let (backend, ctl) = Lagging::new();
    let settings = LoopSettings {
        control_flow: ControlFlow::Poll,
        ..LoopSettings::default()
    };
    let mut event_loop = EventLoop::with_settings(Box::new(backend), settings);
    let mut errors = event_loop.take_error_receiver().unwrap();
    let window = WindowBuilder::new()
        .with_inner_size(1, 1)
        .build(event_loop.handle())
        .unwrap();
    window.render(1, 1, &[0, 255, 0, 255]).unwrap();

    assert!(event_loop.run_iteration());
    assert!(ctl.window(window.id()).is_none());
    // Still no native window, so this one waits too.
    window.render(1, 1, &[0, 0, 255, 255]).unwrap();
    assert_eq!(ctl.frames_presented(window.id()), 0);

    assert!(event_loop.run_iteration());
    assert_eq!(ctl.frames_presented(window.id()), 1);
    assert_eq!(ctl.frame(window.id()).unwrap().pixel(0, 0), Some(0x0000_00ff));
    assert!(drain_errors(&mut errors).is_empty());
}

#[test]
fn latest_early_frame_wins() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new()
        .with_inner_size(1, 1)
        .build(event_loop.handle())
        .unwrap();
    window.render(1, 1, &[255, 0, 0, 255]).unwrap();
    window.render(1, 1, &[0, 0, 255, 255]).unwrap();
    assert!(event_loop.run_iteration());
    assert_eq!(ctl.frames_presented(window.id()), 1);
    assert_eq!(ctl.frame(window.id()).unwrap().pixel(0, 0), Some(0x0000_00ff));
}

#[test]
fn webview_attached_before_the_early_frame_keeps_the_window() {
    let (mut event_loop, ctl) = polling_loop();
    let mut errors = event_loop.take_error_receiver().unwrap();
    let window = WindowBuilder::new()
        .with_inner_size(2, 2)
        .build(event_loop.handle())
        .unwrap();
    window.render(2, 2, &[0; 16]).unwrap();
    let webview = WebViewBuilder::new()
        .with_window(&window)
        .build(event_loop.handle(), "main")
        .unwrap();

    assert!(event_loop.run_iteration());
    assert_eq!(ctl.frames_presented(window.id()), 0);
    assert_eq!(ctl.webview_parent(webview.id()), Some(window.id()));
    let errors = drain_errors(&mut errors);
    assert!(matches!(
        errors.as_slice(),
        [DispatchError::Request { handle, source: CoreError::SurfaceOwnershipConflict { .. } }]
            if *handle == window.id()
    ));
}

#[test]
fn failed_present_leaves_the_surface_unclaimed() {
    let mut event_loop = EventLoop::with_backend(Box::new(Refusing));
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());

    assert!(window.render(1, 1, &[0; 4]).is_err());
    assert!(WebViewBuilder::new()
        .with_window(&window)
        .build(event_loop.handle(), "main")
        .is_ok());
}

#[test]
fn early_frame_of_a_window_that_failed_is_dropped() {
    let mut event_loop = EventLoop::with_backend(Box::new(Refusing));
    let mut errors = event_loop.take_error_receiver().unwrap();
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    window.render(1, 1, &[0; 4]).unwrap();

    assert!(event_loop.run_iteration());
    // Only the creation failure; the frame goes with the window.
    assert_eq!(drain_errors(&mut errors).len(), 1);
    assert!(WebViewBuilder::new()
        .with_window(&window)
        .build(event_loop.handle(), "main")
        .is_ok());
}

#[test]
fn render_scales_to_the_window() {
    let (mut event_loop, ctl) = polling_loop();
    let window = WindowBuilder::new()
        .with_inner_size(4, 4)
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());

    window.render(2, 2, &solid(2, 2, [0, 255, 0, 255])).unwrap();
    let frame = ctl.frame(window.id()).unwrap();
    assert_eq!(frame.size(), Size::new(4, 4));
    assert!(frame.pixels.iter().all(|&p| p == 0x0000_ff00));

    // After a resize the next frame follows the new size.
    ctl.resize(window.id(), 8, 4);
    assert!(event_loop.run_iteration());
    window.render(2, 2, &solid(2, 2, [0, 255, 0, 255])).unwrap();
    let frame = ctl.frame(window.id()).unwrap();
    assert_eq!(frame.size(), Size::new(8, 4));
    assert_eq!(frame.pixel(0, 0), Some(0));
    assert_eq!(frame.pixel(4, 2), Some(0x0000_ff00));
}

#[test]
fn render_options_come_from_settings() {
    let (mut event_loop, ctl) = polling_loop_with(|s| {
        s.render = RenderOptions {
            scale_mode: ScaleMode::None,
            background: weft_common::Color::from_hex("#102030").unwrap(),
        }
    });
    let window = WindowBuilder::new()
        .with_inner_size(4, 4)
        .build(event_loop.handle())
        .unwrap();
    assert!(event_loop.run_iteration());

    window.render(2, 2, &solid(2, 2, [255, 255, 255, 255])).unwrap();
    let frame = ctl.frame(window.id()).unwrap();
    assert_eq!(frame.pixel(0, 0), Some(0x0010_2030));
    assert_eq!(frame.pixel(1, 1), Some(0x00ff_ffff));
    assert_eq!(frame.pixel(3, 3), Some(0x0010_2030));
}

#[test]
fn render_rejects_destroyed_windows() {
    let (mut event_loop, _ctl) = polling_loop_with(|s| s.exit_on_last_window_closed = false);
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());
    window.destroy().unwrap();
    assert_eq!(
        window.render(1, 1, &[0; 4]),
        Err(CoreError::InvalidHandle(window.id()))
    );
}

#[test]
fn render_rejects_webview_windows() {
    let (mut event_loop, _ctl) = polling_loop();
    let webview = WebViewBuilder::new().build(event_loop.handle(), "main").unwrap();
    assert!(event_loop.run_iteration());
    let window = webview.window().unwrap();
    assert!(matches!(
        window.render(1, 1, &[0; 4]),
        Err(CoreError::SurfaceOwnershipConflict { window: w, .. }) if w == window.id()
    ));
}

#[test]
fn render_off_thread_fails() {
    let (mut event_loop, _ctl) = polling_loop();
    let window = WindowBuilder::new().build(event_loop.handle()).unwrap();
    assert!(event_loop.run_iteration());
    let remote = window.clone();
    let result = thread::spawn(move || remote.render(1, 1, &[0; 4]).map_err(|e| e.to_string()))
        .join()
        .unwrap();
    assert!(result.unwrap_err().starts_with("wrong thread"));
    assert!(window.render(1, 1, &[0; 4]).is_ok());
}
