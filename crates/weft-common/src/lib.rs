//! Types shared by every weft crate: resource handles, geometry and
//! appearance values, translated window events, and the error taxonomy.

pub mod errors;
pub mod events;
pub mod handle;
pub mod types;

pub use errors::{ConfigError, CoreError, DispatchError, ListenerError, ListenerResult, WeftError};
pub use events::{LoopEvent, WindowEvent};
pub use handle::{Handle, LoopId};
pub use types::{Color, ControlFlow, MonitorInfo, Position, ScaleMode, Size, Theme};

pub type Result<T> = std::result::Result<T, CoreError>;
