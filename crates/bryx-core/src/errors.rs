/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the router can
/// pick the right user-facing reply (remote status vs transport failure).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The CRM answered with a non-success status.
    #[error("crm api returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The CRM answered 2xx with a `null` body.
    #[error("crm api returned an empty body")]
    EmptyBody,

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True when the remote side answered, but with a non-success status.
    pub fn is_api_status(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
