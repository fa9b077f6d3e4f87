//! IPC protocol between the host and script running in a webview.
//!
//! - **Script -> host**: `postMessage(message)` (or
//!   `window.__webview__.postMessage`) wraps the message in a JSON
//!   [`Envelope`] and hands it to the native IPC handler.
//! - **Host -> script**: the host evaluates the snippet built by
//!   [`js_deliver_message`], which calls the page's
//!   `__webview_on_message__(message)` handler. Messages that arrive before
//!   the page installs a handler are buffered and flushed on assignment.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use weft_common::Handle;

/// Body of one IPC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcPayload {
    Text(String),
    Binary(Vec<u8>),
}

impl IpcPayload {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }
}

impl From<String> for IpcPayload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for IpcPayload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for IpcPayload {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    HostToWebView,
    WebViewToHost,
}

/// A payload tagged with the webview it belongs to and its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcMessage {
    pub handle: Handle,
    pub direction: Direction,
    pub payload: IpcPayload,
}

impl IpcMessage {
    pub fn new(handle: Handle, direction: Direction, payload: IpcPayload) -> Self {
        Self {
            handle,
            direction,
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Text,
    Binary,
}

/// Wire form of a script-to-host message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: String,
    pub kind: EnvelopeKind,
    pub data: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed ipc envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary ipc payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Envelope {
    pub fn from_payload(channel: impl Into<String>, payload: &IpcPayload) -> Self {
        let (kind, data) = match payload {
            IpcPayload::Text(s) => (EnvelopeKind::Text, s.clone()),
            IpcPayload::Binary(b) => (EnvelopeKind::Binary, STANDARD.encode(b)),
        };
        Self {
            channel: channel.into(),
            kind,
            data,
        }
    }

    /// Parse the raw body handed to the native IPC handler.
    pub fn decode(raw: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn encode(&self) -> String {
        // Three string fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn into_payload(self) -> Result<IpcPayload, EnvelopeError> {
        match self.kind {
            EnvelopeKind::Text => Ok(IpcPayload::Text(self.data)),
            EnvelopeKind::Binary => Ok(IpcPayload::Binary(STANDARD.decode(self.data)?)),
        }
    }
}

/// Initialization script injected into every page of a webview bound to
/// `channel`.
pub fn init_script(channel: &str) -> String {
    let channel = serde_json::to_string(channel).unwrap_or_else(|_| "\"\"".to_string());
    INIT_SCRIPT_TEMPLATE.replace("__CHANNEL__", &channel)
}

const INIT_SCRIPT_TEMPLATE: &str = r#"
(function() {
    if (window.__webview__) { return; }

    var channel = __CHANNEL__;
    var handler = null;
    var pending = [];

    function toBase64(bytes) {
        var binary = '';
        for (var i = 0; i < bytes.length; i += 0x8000) {
            binary += String.fromCharCode.apply(null, bytes.subarray(i, i + 0x8000));
        }
        return btoa(binary);
    }

    function fromBase64(data) {
        var binary = atob(data);
        var bytes = new Uint8Array(binary.length);
        for (var i = 0; i < binary.length; i++) {
            bytes[i] = binary.charCodeAt(i);
        }
        return bytes;
    }

    function post(message) {
        var kind = 'text';
        var data;
        if (message instanceof ArrayBuffer) {
            message = new Uint8Array(message);
        }
        if (ArrayBuffer.isView(message)) {
            kind = 'binary';
            data = toBase64(new Uint8Array(message.buffer, message.byteOffset, message.byteLength));
        } else if (typeof message === 'string') {
            data = message;
        } else {
            data = JSON.stringify(message);
        }
        window.ipc.postMessage(JSON.stringify({ channel: channel, kind: kind, data: data }));
    }

    function deliver(message) {
        if (typeof handler === 'function') {
            handler(message);
        } else {
            pending.push(message);
        }
    }

    Object.defineProperty(window, '__webview_on_message__', {
        configurable: true,
        get: function() { return handler; },
        set: function(fn) {
            handler = fn;
            if (typeof fn === 'function') {
                var queued = pending;
                pending = [];
                for (var i = 0; i < queued.length; i++) { fn(queued[i]); }
            }
        }
    });

    window.__webview__ = {
        channel: channel,
        postMessage: post,
        _receive: function(kind, data) {
            deliver(kind === 'binary' ? fromBase64(data) : data);
        }
    };

    var browserPostMessage = window.postMessage.bind(window);
    window.postMessage = function(message, targetOrigin, transfer) {
        if (arguments.length > 1) {
            return browserPostMessage(message, targetOrigin, transfer);
        }
        post(message);
    };
})();
"#;

/// Script that delivers one host-to-webview message.
pub fn js_deliver_message(payload: &IpcPayload) -> String {
    let (kind, data) = match payload {
        IpcPayload::Text(s) => ("text", s.clone()),
        IpcPayload::Binary(b) => ("binary", STANDARD.encode(b)),
    };
    let data = serde_json::to_string(&data).unwrap_or_else(|_| "\"\"".to_string());
    format!("window.__webview__ && window.__webview__._receive(\"{kind}\", {data});")
}
