use thiserror::Error;

/// Fatal failures. Anything that only spoils one paragraph or embed is logged
/// and rendered as an empty string instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("page state is missing `{key}`")]
    MissingState { key: &'static str },

    #[error("could not decode `{key}` from page script")]
    ScriptEvaluation {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no Post record with a canonical url in page state")]
    PostNotFound,

    #[error("`{host}` is not a supported host")]
    NotMedium { host: String },

    #[error("invalid url `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("status code {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;
