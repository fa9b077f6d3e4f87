use weft_common::CoreError;

/// What a webview shows when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitialContent {
    Url(String),
    Html(String),
    #[default]
    Blank,
}

impl InitialContent {
    /// Pick the initial content from optional builder inputs. URL and HTML
    /// are mutually exclusive.
    pub fn from_parts(url: Option<String>, html: Option<String>) -> Result<Self, CoreError> {
        match (url, html) {
            (Some(_), Some(_)) => Err(CoreError::ConflictingContentSource),
            (Some(url), None) => Ok(Self::Url(url)),
            (None, Some(html)) => Ok(Self::Html(html)),
            (None, None) => Ok(Self::Blank),
        }
    }

    /// URL reported for this content. Inline HTML and blank pages report
    /// `about:blank`.
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Html(_) | Self::Blank => "about:blank",
        }
    }
}

/// Frozen webview configuration produced by a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebViewConfig {
    pub content: InitialContent,
    /// Title of the implicit window, if one is created.
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub devtools: bool,
    pub transparent: bool,
    pub user_agent: Option<String>,
}

impl Default for WebViewConfig {
    fn default() -> Self {
        Self {
            content: InitialContent::Blank,
            title: "weft".into(),
            width: 800,
            height: 600,
            devtools: cfg!(debug_assertions),
            transparent: false,
            user_agent: None,
        }
    }
}
