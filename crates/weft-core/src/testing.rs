//! Shared fixtures for scenario tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use weft_common::{
    ControlFlow, CoreError, DispatchError, Handle, LoopEvent, MonitorInfo, Result, WindowEvent,
};

use crate::backend::{Backend, HeadlessBackend, HeadlessController, NativeRequest, PumpOutput};
use crate::event_loop::{EventLoop, LoopSettings};
use crate::render::Frame;

/// A headless loop that never blocks.
pub(crate) fn polling_loop() -> (EventLoop, HeadlessController) {
    polling_loop_with(|_| {})
}

pub(crate) fn polling_loop_with(
    tweak: impl FnOnce(&mut LoopSettings),
) -> (EventLoop, HeadlessController) {
    let (backend, controller) = HeadlessBackend::new();
    let mut settings = LoopSettings {
        control_flow: ControlFlow::Poll,
        ..LoopSettings::default()
    };
    tweak(&mut settings);
    (EventLoop::with_settings(Box::new(backend), settings), controller)
}

/// Refuses every request and every frame.
pub(crate) struct Refusing;

impl Backend for Refusing {
    fn name(&self) -> &'static str {
        "refusing"
    }

    fn pump(&mut self, _timeout: Option<Duration>, requests: Vec<NativeRequest>) -> PumpOutput {
        PumpOutput {
            failures: requests
                .iter()
                .map(|r| (r.handle(), CoreError::Backend("refused".into())))
                .collect(),
            ..PumpOutput::default()
        }
    }

    fn window_ready(&self, _window: Handle) -> bool {
        true
    }

    fn present(&mut self, window: Handle, _frame: &Frame) -> Result<()> {
        Err(CoreError::Backend(format!("cannot present {window}")))
    }

    fn destroy(&mut self, _handle: Handle) {}

    fn available_monitors(&self) -> Vec<MonitorInfo> {
        Vec::new()
    }

    fn primary_monitor(&self) -> Option<MonitorInfo> {
        None
    }
}

/// Headless backend that applies each batch of requests one pump late,
/// the way a native loop that has not resumed yet holds them back.
pub(crate) struct Lagging {
    inner: HeadlessBackend,
    held: Vec<NativeRequest>,
}

impl Lagging {
    pub(crate) fn new() -> (Self, HeadlessController) {
        let (inner, controller) = HeadlessBackend::new();
        let backend = Self {
            inner,
            held: Vec::new(),
        };
        (backend, controller)
    }
}

impl Backend for Lagging {
    fn name(&self) -> &'static str {
        "lagging"
    }

    fn pump(&mut self, timeout: Option<Duration>, requests: Vec<NativeRequest>) -> PumpOutput {
        let due = std::mem::replace(&mut self.held, requests);
        self.inner.pump(timeout, due)
    }

    fn window_ready(&self, window: Handle) -> bool {
        self.inner.window_ready(window)
    }

    fn present(&mut self, window: Handle, frame: &Frame) -> Result<()> {
        self.inner.present(window, frame)
    }

    fn destroy(&mut self, handle: Handle) {
        self.inner.destroy(handle);
    }

    fn available_monitors(&self) -> Vec<MonitorInfo> {
        self.inner.available_monitors()
    }

    fn primary_monitor(&self) -> Option<MonitorInfo> {
        self.inner.primary_monitor()
    }
}

pub(crate) type Seen = Rc<RefCell<Vec<LoopEvent>>>;

/// Record every dispatched event.
pub(crate) fn record_events(event_loop: &EventLoop) -> Seen {
    let seen: Seen = Rc::default();
    let sink = Rc::clone(&seen);
    event_loop
        .on_event(move |_, event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        })
        .unwrap();
    seen
}

/// Just the event kinds, in dispatch order.
pub(crate) fn kinds(seen: &Seen) -> Vec<WindowEvent> {
    seen.borrow().iter().map(|e| e.event.clone()).collect()
}

/// Everything reported on the error channel so far.
pub(crate) fn drain_errors(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<DispatchError>,
) -> Vec<DispatchError> {
    let mut errors = Vec::new();
    while let Ok(err) = rx.try_recv() {
        errors.push(err);
    }
    errors
}
