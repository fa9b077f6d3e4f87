//! One cycle of the event loop.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, info, trace, warn};
use weft_common::{DispatchError, Handle, LoopEvent, Position, Result, Size, WindowEvent};
use weft_webview::{Envelope, PageLoadState, WebViewEvent};

use super::{LoopHandle, LoopShared, Phase};
use crate::backend::{BackendEvent, NativeRequest, PumpOutput};

impl LoopShared {
    /// Apply queued requests, wait for native events according to the
    /// control flow, and dispatch everything that arrived. Returns whether
    /// the loop is still running afterwards.
    pub(crate) fn pump_cycle(&self, handle: &LoopHandle) -> bool {
        {
            let mut state = self.lock();
            match state.phase {
                Phase::Stopped => return false,
                Phase::Created => {
                    state.phase = Phase::Running;
                    info!(loop_id = %self.id, "event loop running");
                }
                Phase::Running => {}
            }
        }

        // Leftovers from calls made between cycles.
        self.dispatch_pending(handle);
        self.flush_inbound(handle);

        let (requests, timeout) = {
            let mut state = self.lock();
            let mut requests: Vec<NativeRequest> = state.requests.drain(..).collect();
            requests.extend(
                state
                    .ipc
                    .drain_outbound()
                    .into_iter()
                    .map(|message| NativeRequest::DeliverIpc {
                        handle: message.handle,
                        payload: message.payload,
                    }),
            );
            for request in &requests {
                state.commit(request);
            }
            let busy = !requests.is_empty()
                || state.exit_requested
                || !state.pending_events.is_empty()
                || state.last_window_gone();
            let timeout = if busy {
                Some(Duration::ZERO)
            } else {
                state.settings.control_flow.timeout()
            };
            (requests, timeout)
        };

        trace!(loop_id = %self.id, requests = requests.len(), ?timeout, "pump");
        let output = match self.backend() {
            Ok(mut backend) => backend.pump(timeout, requests),
            Err(e) => {
                warn!(loop_id = %self.id, error = %e, "backend unavailable, skipping pump");
                PumpOutput::default()
            }
        };

        let failed: BTreeSet<Handle> = output.failures.iter().map(|(h, _)| *h).collect();
        for (target, source) in output.failures {
            self.report(DispatchError::Request {
                handle: target,
                source,
            });
        }
        self.present_deferred(&failed);
        for event in output.events {
            match event {
                BackendEvent::Window { window, event } => {
                    self.handle_window_event(handle, window, event)
                }
                BackendEvent::WebView(event) => self.handle_webview_event(handle, event),
            }
        }
        self.dispatch_pending(handle);
        self.flush_inbound(handle);

        let reason = {
            let state = self.lock();
            if state.phase == Phase::Stopped {
                return false;
            }
            if state.exit_requested {
                Some("exit requested")
            } else if output.exit {
                Some("native loop exited")
            } else if state.last_window_gone() {
                Some("last window closed")
            } else {
                None
            }
        };
        match reason {
            Some(reason) => {
                info!(loop_id = %self.id, reason, "stopping event loop");
                self.shutdown();
                false
            }
            None => true,
        }
    }

    /// Present frames rendered before their window existed. Windows whose
    /// creation just failed lose their frame; windows the backend has not
    /// created yet keep it for the next cycle.
    fn present_deferred(&self, failed: &BTreeSet<Handle>) {
        let deferred = std::mem::take(&mut self.lock().deferred_frames);
        for window in deferred {
            if failed.contains(&window) {
                debug!(%window, "dropping frame of a window that was never created");
                continue;
            }
            let ready = self.backend().is_ok_and(|b| b.window_ready(window));
            if !ready {
                self.lock().deferred_frames.insert(window);
                continue;
            }
            if let Err(source) = self.present_cached(window) {
                self.report(DispatchError::Request {
                    handle: window,
                    source,
                });
            }
        }
    }

    fn present_cached(&self, window: Handle) -> Result<()> {
        self.with_state(|state| state.window(window)?.check_pixels(window))?;
        let renderer = self.renderer()?;
        let Some(frame) = renderer.frame(window) else {
            return Ok(());
        };
        self.backend()?.present(window, frame)?;
        drop(renderer);
        self.with_state(|state| state.window_mut(window)?.claim_pixels(window))?;
        trace!(%window, "deferred frame presented");
        Ok(())
    }

    fn handle_window_event(&self, handle: &LoopHandle, window: Handle, event: WindowEvent) {
        {
            let mut state = self.lock();
            let Ok(record) = state.window_mut(window) else {
                debug!(%window, event = event.name(), "event for unknown window dropped");
                return;
            };
            match &event {
                WindowEvent::Resized { width, height } => {
                    record.inner_size = Size::new(*width, *height)
                }
                WindowEvent::Moved { x, y } => record.position = Position::new(*x, *y),
                WindowEvent::Focused => record.focused = true,
                WindowEvent::Unfocused => record.focused = false,
                WindowEvent::ScaleFactorChanged(scale) => record.scale_factor = *scale,
                WindowEvent::ThemeChanged(theme) => record.theme = Some(*theme),
                _ => {}
            }
        }

        // The native window went away on its own; tear down our side, which
        // queues the `Destroyed` event.
        if event == WindowEvent::Destroyed {
            if let Err(e) = self.destroy_resource(window) {
                debug!(%window, error = %e, "window already gone");
            }
            self.dispatch_pending(handle);
            return;
        }

        let close = event == WindowEvent::CloseRequested;
        self.dispatch_event(
            handle,
            &LoopEvent {
                window_id: window,
                event,
            },
        );
        if close {
            let alive = self.lock().registry.contains(window);
            if alive {
                if let Err(e) = self.destroy_resource(window) {
                    warn!(%window, error = %e, "failed to destroy closed window");
                }
            }
            self.dispatch_pending(handle);
        }
    }

    fn handle_webview_event(&self, handle: &LoopHandle, event: WebViewEvent) {
        match event {
            WebViewEvent::IpcMessage { handle: webview, body } => {
                self.receive_ipc(handle, webview, &body)
            }
            WebViewEvent::PageLoad {
                handle: webview,
                state,
                url,
            } => {
                debug!(%webview, ?state, %url, "page load");
                if state == PageLoadState::Finished {
                    if let Ok(record) = self.lock().webview_mut(webview) {
                        record.url = url;
                    }
                }
            }
            WebViewEvent::TitleChanged {
                handle: webview,
                title,
            } => debug!(%webview, %title, "document title changed"),
        }
    }

    fn receive_ipc(&self, handle: &LoopHandle, webview: Handle, body: &str) {
        let dropped = |reason: String| DispatchError::MessageDropped {
            handle: webview,
            reason,
        };
        let envelope = match Envelope::decode(body) {
            Ok(envelope) => envelope,
            Err(e) => return self.report(dropped(e.to_string())),
        };

        let expected = match self.lock().webview(webview) {
            Ok(record) => record.channel.clone(),
            Err(_) => return self.report(dropped("webview no longer exists".into())),
        };
        if envelope.channel != expected {
            return self.report(dropped(format!(
                "channel {:?} does not match {:?}",
                envelope.channel, expected
            )));
        }

        let payload = match envelope.into_payload() {
            Ok(payload) => payload,
            Err(e) => return self.report(dropped(e.to_string())),
        };
        let queued = self.lock().ipc.push_inbound(webview, payload);
        if let Err(rejection) = queued {
            return self.report(dropped(rejection.to_string()));
        }
        self.deliver_inbound(handle, webview);
    }
}
