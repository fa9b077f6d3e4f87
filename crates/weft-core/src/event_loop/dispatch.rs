//! Listener storage and invocation.
//!
//! Listeners are taken out of their slot while they run, so the callback
//! table is never borrowed across user code. A listener may register or
//! remove listeners, bind IPC handlers or destroy resources from inside
//! its own call.

use std::any::Any;
use std::cell::RefMut;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::trace;
use weft_common::{CoreError, DispatchError, Handle, ListenerResult, LoopEvent};
use weft_webview::IpcPayload;

use super::{LoopHandle, LoopShared};

pub type EventListener = Box<dyn FnMut(&LoopHandle, &LoopEvent) -> ListenerResult>;
pub type IpcListener = Box<dyn FnMut(&LoopHandle, &IpcPayload) -> ListenerResult>;

/// Identifies a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct Slot<F> {
    id: u64,
    /// `None` while the listener is running.
    callback: Option<F>,
}

#[derive(Default)]
pub(crate) struct Callbacks {
    next_id: u64,
    events: Vec<Slot<EventListener>>,
    ipc: BTreeMap<Handle, Slot<IpcListener>>,
}

impl Callbacks {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn add_event(&mut self, listener: EventListener) -> ListenerId {
        let id = self.next_id();
        self.events.push(Slot {
            id,
            callback: Some(listener),
        });
        ListenerId(id)
    }

    /// Remove a listener. The outer `Option` is whether it was registered;
    /// the callback itself is absent if it is running right now.
    pub(crate) fn remove_event(&mut self, id: ListenerId) -> Option<Option<EventListener>> {
        let pos = self.events.iter().position(|s| s.id == id.0)?;
        Some(self.events.remove(pos).callback)
    }

    fn event_ids(&self) -> Vec<u64> {
        self.events.iter().map(|s| s.id).collect()
    }

    fn take_event(&mut self, id: u64) -> Option<EventListener> {
        self.events
            .iter_mut()
            .find(|s| s.id == id)
            .and_then(|s| s.callback.take())
    }

    /// Put a listener back. Hands it back if its slot was removed meanwhile.
    fn restore_event(&mut self, id: u64, listener: EventListener) -> Option<EventListener> {
        match self.events.iter_mut().find(|s| s.id == id) {
            Some(slot) => {
                slot.callback = Some(listener);
                None
            }
            None => Some(listener),
        }
    }

    pub(crate) fn bind_ipc(
        &mut self,
        webview: Handle,
        listener: IpcListener,
    ) -> Result<(), CoreError> {
        if self.ipc.contains_key(&webview) {
            return Err(CoreError::ListenerAlreadyBound(webview));
        }
        let id = self.next_id();
        self.ipc.insert(
            webview,
            Slot {
                id,
                callback: Some(listener),
            },
        );
        Ok(())
    }

    /// Unbind the IPC listener of `webview`, handing back whatever was bound.
    pub(crate) fn unbind_ipc(&mut self, webview: Handle) -> Option<Option<IpcListener>> {
        self.ipc.remove(&webview).map(|s| s.callback)
    }

    fn take_ipc(&mut self, webview: Handle) -> Option<(u64, IpcListener)> {
        let slot = self.ipc.get_mut(&webview)?;
        let callback = slot.callback.take()?;
        Some((slot.id, callback))
    }

    fn restore_ipc(
        &mut self,
        webview: Handle,
        id: u64,
        listener: IpcListener,
    ) -> Option<IpcListener> {
        match self.ipc.get_mut(&webview) {
            Some(slot) if slot.id == id => {
                slot.callback = Some(listener);
                None
            }
            _ => Some(listener),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl LoopShared {
    pub(crate) fn callbacks_mut(&self) -> Result<RefMut<'_, Callbacks>, CoreError> {
        self.callbacks
            .get()?
            .try_borrow_mut()
            .map_err(|_| CoreError::Backend("listener table is busy".into()))
    }

    pub(crate) fn bind_ipc(&self, webview: Handle, listener: IpcListener) -> Result<(), CoreError> {
        self.callbacks_mut()?.bind_ipc(webview, listener)
    }

    /// Returns whether a listener was bound.
    pub(crate) fn unbind_ipc(&self, webview: Handle) -> Result<bool, CoreError> {
        let removed = self.callbacks_mut()?.unbind_ipc(webview);
        Ok(removed.is_some())
    }

    /// Run every event listener for `event`, in registration order.
    /// Listeners registered during dispatch first see the next event.
    pub(crate) fn dispatch_event(&self, handle: &LoopHandle, event: &LoopEvent) {
        let Ok(cell) = self.callbacks.get() else {
            return;
        };
        let ids = match cell.try_borrow() {
            Ok(callbacks) => callbacks.event_ids(),
            Err(_) => return,
        };
        trace!(
            window = %event.window_id,
            event = event.event.name(),
            listeners = ids.len(),
            "dispatch"
        );

        for id in ids {
            let taken = cell.try_borrow_mut().ok().and_then(|mut c| c.take_event(id));
            let Some(mut listener) = taken else {
                continue;
            };
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(handle, event)));
            let orphan = match cell.try_borrow_mut() {
                Ok(mut callbacks) => callbacks.restore_event(id, listener),
                Err(_) => Some(listener),
            };
            drop(orphan);

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.report(DispatchError::Listener {
                    listener: id,
                    window: event.window_id,
                    event: event.event.name(),
                    message: e.to_string(),
                }),
                Err(panic) => self.report(DispatchError::Panicked(panic_message(&*panic))),
            }
        }
    }

    /// Hand queued inbound messages of `webview` to its listener, oldest
    /// first. Messages stay queued while no listener is bound.
    pub(crate) fn deliver_inbound(&self, handle: &LoopHandle, webview: Handle) {
        let Ok(cell) = self.callbacks.get() else {
            return;
        };
        loop {
            let taken = cell.try_borrow_mut().ok().and_then(|mut c| c.take_ipc(webview));
            let Some((id, mut listener)) = taken else {
                return;
            };
            let next = self.lock().ipc.pop_inbound(webview);
            let outcome = next.map(|message| {
                catch_unwind(AssertUnwindSafe(|| listener(handle, &message.payload)))
            });
            let orphan = match cell.try_borrow_mut() {
                Ok(mut callbacks) => callbacks.restore_ipc(webview, id, listener),
                Err(_) => Some(listener),
            };
            drop(orphan);

            match outcome {
                None => return,
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(e))) => self.report(DispatchError::IpcListener {
                    handle: webview,
                    message: e.to_string(),
                }),
                Some(Err(panic)) => self.report(DispatchError::Panicked(panic_message(&*panic))),
            }
        }
    }

    /// Deliver to every webview that has inbound messages waiting.
    pub(crate) fn flush_inbound(&self, handle: &LoopHandle) {
        let pending = self.lock().ipc.pending_inbound();
        for webview in pending {
            self.deliver_inbound(handle, webview);
        }
    }

    /// Dispatch events the loop raised itself, e.g. `Destroyed`.
    pub(crate) fn dispatch_pending(&self, handle: &LoopHandle) {
        loop {
            let next = self.lock().pending_events.pop_front();
            match next {
                Some(event) => self.dispatch_event(handle, &event),
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> EventListener {
        Box::new(|_, _| Ok(()))
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut callbacks = Callbacks::default();
        let a = callbacks.add_event(noop());
        let b = callbacks.add_event(noop());
        assert!(a < b);
        assert_eq!(callbacks.event_ids(), vec![a.raw(), b.raw()]);
    }

    #[test]
    fn restore_after_removal_hands_listener_back() {
        let mut callbacks = Callbacks::default();
        let id = callbacks.add_event(noop());
        let taken = callbacks.take_event(id.raw()).unwrap();
        assert!(matches!(callbacks.remove_event(id), Some(None)));
        assert!(callbacks.restore_event(id.raw(), taken).is_some());
        assert!(callbacks.event_ids().is_empty());
    }

    #[test]
    fn running_listener_is_not_taken_twice() {
        let mut callbacks = Callbacks::default();
        let id = callbacks.add_event(noop());
        let _running = callbacks.take_event(id.raw()).unwrap();
        assert!(callbacks.take_event(id.raw()).is_none());
    }

    #[test]
    fn ipc_binding_is_exclusive() {
        let mut callbacks = Callbacks::default();
        let wv = Handle::from_raw(5);
        callbacks.bind_ipc(wv, Box::new(|_, _| Ok(()))).unwrap();
        assert_eq!(
            callbacks.bind_ipc(wv, Box::new(|_, _| Ok(()))),
            Err(CoreError::ListenerAlreadyBound(wv))
        );
        assert!(callbacks.unbind_ipc(wv).is_some());
        assert!(callbacks.unbind_ipc(wv).is_none());
        assert!(callbacks.bind_ipc(wv, Box::new(|_, _| Ok(()))).is_ok());
    }

    #[test]
    fn rebinding_while_running_keeps_new_listener() {
        let mut callbacks = Callbacks::default();
        let wv = Handle::from_raw(6);
        callbacks.bind_ipc(wv, Box::new(|_, _| Ok(()))).unwrap();
        let (id, old) = callbacks.take_ipc(wv).unwrap();
        callbacks.unbind_ipc(wv);
        callbacks.bind_ipc(wv, Box::new(|_, _| Ok(()))).unwrap();
        assert!(callbacks.restore_ipc(wv, id, old).is_some());
        assert!(callbacks.take_ipc(wv).is_some());
    }

    #[test]
    fn panic_messages() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*payload), "boom");
        let payload = std::panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(&*payload), "formatted 1");
    }
}
