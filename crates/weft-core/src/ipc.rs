//! Per-webview IPC queues.
//!
//! Every bound webview has one FIFO per direction. Outbound messages wait
//! for the next pump cycle; inbound messages wait for a listener. There is
//! no ordering between different webviews.

use std::collections::{BTreeMap, VecDeque};

use weft_common::{CoreError, Handle};
use weft_webview::{Direction, IpcMessage, IpcPayload};

#[derive(Debug, Default)]
struct Queues {
    outbound: VecDeque<IpcPayload>,
    inbound: VecDeque<IpcPayload>,
}

/// Why an inbound message was not queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InboundRejection {
    UnknownWebView,
    TooLarge { size: usize, limit: usize },
    QueueFull { capacity: usize },
}

impl std::fmt::Display for InboundRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownWebView => write!(f, "webview has no ipc channel"),
            Self::TooLarge { size, limit } => {
                write!(f, "{size} bytes exceeds the {limit} byte limit")
            }
            Self::QueueFull { capacity } => write!(f, "inbound queue full ({capacity} messages)"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct IpcBridge {
    capacity: usize,
    max_bytes: usize,
    queues: BTreeMap<Handle, Queues>,
}

impl IpcBridge {
    pub(crate) fn new(capacity: usize, max_bytes: usize) -> Self {
        Self {
            capacity,
            max_bytes,
            queues: BTreeMap::new(),
        }
    }

    pub(crate) fn set_limits(&mut self, capacity: usize, max_bytes: usize) {
        self.capacity = capacity;
        self.max_bytes = max_bytes;
    }

    pub(crate) fn open(&mut self, handle: Handle) {
        self.queues.entry(handle).or_default();
    }

    /// Drop both queues of `handle`, returning how many messages were lost.
    pub(crate) fn close(&mut self, handle: Handle) -> usize {
        self.queues
            .remove(&handle)
            .map_or(0, |q| q.inbound.len() + q.outbound.len())
    }

    pub(crate) fn clear(&mut self) {
        self.queues.clear();
    }

    /// Queue a host-to-webview message.
    pub(crate) fn send(&mut self, handle: Handle, payload: IpcPayload) -> Result<(), CoreError> {
        if payload.len() > self.max_bytes {
            return Err(CoreError::MessageTooLarge {
                size: payload.len(),
                limit: self.max_bytes,
            });
        }
        let queues = self
            .queues
            .get_mut(&handle)
            .ok_or(CoreError::InvalidHandle(handle))?;
        if queues.outbound.len() >= self.capacity {
            return Err(CoreError::QueueFull {
                handle,
                capacity: self.capacity,
            });
        }
        queues.outbound.push_back(payload);
        Ok(())
    }

    /// Take every pending outbound message, FIFO within each handle.
    pub(crate) fn drain_outbound(&mut self) -> Vec<IpcMessage> {
        let mut out = Vec::new();
        for (&handle, q) in &mut self.queues {
            out.extend(
                q.outbound
                    .drain(..)
                    .map(|payload| IpcMessage::new(handle, Direction::HostToWebView, payload)),
            );
        }
        out
    }

    /// Queue a webview-to-host message.
    pub(crate) fn push_inbound(
        &mut self,
        handle: Handle,
        payload: IpcPayload,
    ) -> Result<(), InboundRejection> {
        if payload.len() > self.max_bytes {
            return Err(InboundRejection::TooLarge {
                size: payload.len(),
                limit: self.max_bytes,
            });
        }
        let queues = self
            .queues
            .get_mut(&handle)
            .ok_or(InboundRejection::UnknownWebView)?;
        if queues.inbound.len() >= self.capacity {
            return Err(InboundRejection::QueueFull {
                capacity: self.capacity,
            });
        }
        queues.inbound.push_back(payload);
        Ok(())
    }

    pub(crate) fn pop_inbound(&mut self, handle: Handle) -> Option<IpcMessage> {
        let payload = self.queues.get_mut(&handle)?.inbound.pop_front()?;
        Some(IpcMessage::new(handle, Direction::WebViewToHost, payload))
    }

    pub(crate) fn pending_inbound(&self) -> Vec<Handle> {
        self.queues
            .iter()
            .filter(|(_, q)| !q.inbound.is_empty())
            .map(|(h, _)| *h)
            .collect()
    }
}
