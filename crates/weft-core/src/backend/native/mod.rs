//! Native backend: winit windows, softbuffer surfaces and wry webviews.
//!
//! winit is driven with `pump_app_events`, so the host keeps ownership of
//! the thread and each [`Backend::pump`] is one bounded native iteration.
//! Monitors are known once the first pump has resumed the native loop.

mod handler;
mod translate;

use std::time::Duration;

use tracing::{debug, info};
use weft_common::{CoreError, Handle, MonitorInfo};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};

use super::{Backend, NativeRequest, PumpOutput};
use crate::render::Frame;
use handler::NativeApp;

pub struct NativeBackend {
    // Webviews and windows go before the event loop that owns them.
    app: NativeApp,
    event_loop: EventLoop<()>,
}

impl NativeBackend {
    pub fn new() -> Result<Self, CoreError> {
        let event_loop = EventLoop::new()
            .map_err(|e| CoreError::Backend(format!("failed to create event loop: {e}")))?;
        let context = softbuffer::Context::new(event_loop.owned_display_handle())
            .map_err(|e| CoreError::Backend(format!("failed to create softbuffer context: {e}")))?;
        info!("native backend ready");
        Ok(Self {
            app: NativeApp::new(context),
            event_loop,
        })
    }
}

impl std::fmt::Debug for NativeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBackend").finish_non_exhaustive()
    }
}

impl Backend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn pump(&mut self, timeout: Option<Duration>, requests: Vec<NativeRequest>) -> PumpOutput {
        self.app.queue(requests);
        let timeout = if self.app.has_pending() {
            Some(Duration::ZERO)
        } else {
            timeout
        };

        let status = self.event_loop.pump_app_events(timeout, &mut self.app);
        let mut output = self.app.take_output();
        if let PumpStatus::Exit(code) = status {
            debug!(code, "native loop exited");
            output.exit = true;
        }
        output
    }

    fn window_ready(&self, window: Handle) -> bool {
        self.app.has_window(window)
    }

    fn present(&mut self, window: Handle, frame: &Frame) -> Result<(), CoreError> {
        self.app.present(window, frame)
    }

    fn destroy(&mut self, handle: Handle) {
        self.app.destroy(handle);
    }

    fn available_monitors(&self) -> Vec<MonitorInfo> {
        self.app.monitors().to_vec()
    }

    fn primary_monitor(&self) -> Option<MonitorInfo> {
        self.app.primary()
    }
}
