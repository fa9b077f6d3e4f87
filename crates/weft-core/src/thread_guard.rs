//! Confinement of thread-affine values to the loop thread.

use std::thread::{self, ThreadId};

use send_wrapper::SendWrapper;
use tracing::warn;
use weft_common::CoreError;

pub(crate) fn check_thread(owner: ThreadId) -> Result<(), CoreError> {
    let actual = thread::current().id();
    if actual == owner {
        Ok(())
    } else {
        Err(CoreError::WrongThread {
            expected: owner,
            actual,
        })
    }
}

/// A value that may only be touched on the thread that created it.
///
/// The wrapper can be shared across threads, but every access checks the
/// calling thread first. Dropping it anywhere else leaks the value instead
/// of running its destructor on the wrong thread.
pub(crate) struct ThreadBound<T> {
    owner: ThreadId,
    /// `None` only while dropping.
    value: Option<SendWrapper<T>>,
}

impl<T> ThreadBound<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            owner: thread::current().id(),
            value: Some(SendWrapper::new(value)),
        }
    }

    pub(crate) fn get(&self) -> Result<&T, CoreError> {
        check_thread(self.owner)?;
        self.value
            .as_deref()
            .ok_or_else(|| CoreError::Backend("thread-bound value already dropped".into()))
    }
}

impl<T> Drop for ThreadBound<T> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        if !value.valid() {
            warn!(
                owner = ?self.owner,
                "thread-bound value dropped off its thread; leaking it"
            );
            std::mem::forget(value);
        }
    }
}
