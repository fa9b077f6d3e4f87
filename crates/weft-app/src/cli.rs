use clap::{Parser, ValueEnum};

/// weft: windows, webviews and pixel buffers from one event loop.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// What to put on screen.
    #[arg(long, value_enum, default_value_t = SceneKind::Both)]
    pub scene: SceneKind,

    /// Page to open in the webview scene.
    #[arg(long, conflicts_with = "html")]
    pub url: Option<String>,

    /// Inline HTML for the webview scene.
    #[arg(long)]
    pub html: Option<String>,

    /// Run against the in-process simulation instead of native windows.
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many loop iterations.
    #[arg(long)]
    pub frames: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    Pixels,
    Webview,
    Both,
}

impl SceneKind {
    pub fn pixels(&self) -> bool {
        matches!(self, SceneKind::Pixels | SceneKind::Both)
    }

    pub fn webview(&self) -> bool {
        matches!(self, SceneKind::Webview | SceneKind::Both)
    }
}

pub fn parse() -> Args {
    Args::parse()
}
