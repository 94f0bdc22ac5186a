use thiserror::Error;

#[derive(Debug, Error)]
pub enum UncookieError {
    #[error("schema parse failed: {0}")]
    Parse(String),

    #[error("failed to fetch schema from {url}: HTTP {status}")]
    RemoteLoad { url: String, status: u16 },

    #[error("unsupported selector: {0}")]
    Selector(String),

    #[error("action failed: {0}")]
    Action(String),

    #[error("action chain exceeded depth {0}")]
    ChainTooDeep(usize),

    #[error("injected stylesheet is not attached")]
    StyleSheetDetached,

    #[error("handler index out of range: {0}")]
    HandlerNotFound(usize),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UncookieError>;
