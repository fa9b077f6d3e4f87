use std::path::PathBuf;
use std::thread::ThreadId;

use crate::handle::Handle;

/// Errors returned synchronously by core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid handle: {0}")]
    InvalidHandle(Handle),

    #[error("wrong thread: loop is bound to {expected:?}, called from {actual:?}")]
    WrongThread { expected: ThreadId, actual: ThreadId },

    #[error("event loop is stopped")]
    LoopNotRunnable,

    #[error("conflicting content source: both url and html were given")]
    ConflictingContentSource,

    #[error("buffer size mismatch: got {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("surface of {window} is owned by {owner}")]
    SurfaceOwnershipConflict { window: Handle, owner: String },

    #[error("ipc listener already bound for {0}")]
    ListenerAlreadyBound(Handle),

    #[error("ipc queue for {handle} is full ({capacity} messages)")]
    QueueFull { handle: Handle, capacity: usize },

    #[error("ipc message of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("native backend error: {0}")]
    Backend(String),

    #[error("not supported: {0}")]
    Unsupported(String),
}

/// Boxed error a listener may return; anything implementing `Error` converts.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of event and IPC listeners.
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Failures observed while the loop was dispatching. These are reported on
/// the loop's error channel; none of them stops the pump.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("event listener {listener} failed on {event} for {window}: {message}")]
    Listener {
        listener: u64,
        window: Handle,
        event: &'static str,
        message: String,
    },

    #[error("ipc listener for {handle} failed: {message}")]
    IpcListener { handle: Handle, message: String },

    #[error("listener panicked: {0}")]
    Panicked(String),

    #[error("ipc message for {handle} dropped: {reason}")]
    MessageDropped { handle: Handle, reason: String },

    #[error("native request for {handle} failed: {source}")]
    Request {
        handle: Handle,
        #[source]
        source: CoreError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WeftError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
