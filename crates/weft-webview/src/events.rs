//! Events raised by native webviews.

use serde::{Deserialize, Serialize};
use weft_common::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLoadState {
    Started,
    Finished,
}

#[cfg(feature = "native")]
impl From<wry::PageLoadEvent> for PageLoadState {
    fn from(e: wry::PageLoadEvent) -> Self {
        match e {
            wry::PageLoadEvent::Started => Self::Started,
            wry::PageLoadEvent::Finished => Self::Finished,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebViewEvent {
    PageLoad {
        handle: Handle,
        state: PageLoadState,
        url: String,
    },
    TitleChanged {
        handle: Handle,
        title: String,
    },
    /// Raw envelope posted by script, not yet decoded.
    IpcMessage {
        handle: Handle,
        body: String,
    },
}

impl WebViewEvent {
    pub fn handle(&self) -> Handle {
        match self {
            Self::PageLoad { handle, .. }
            | Self::TitleChanged { handle, .. }
            | Self::IpcMessage { handle, .. } => *handle,
        }
    }
}
