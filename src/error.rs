use crate::transport::Method;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    //
    // Invalid user input
    //
    #[error("Invalid repository name: {0}")]
    InvalidRepoName(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    //
    // Error from Quay API
    //
    #[error("Failed to login using API token, please verify validity of API token.")]
    AuthenticationFailed,
    #[error("Unexpected response from {method} {path}: status {status}")]
    UnexpectedResponse {
        method: Method,
        path: String,
        status: u16,
        body: Option<serde_json::Value>,
    },
    #[error("{0}")]
    VerificationFailed(&'static str),
    #[error("Repository Missing: {0}")]
    RepositoryMissing(String),

    //
    // Transport error
    //
    #[error(transparent)]
    Network(Box<ureq::Transport>),
    #[error(transparent)]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<ureq::Transport> for Error {
    fn from(e: ureq::Transport) -> Self {
        Error::Network(Box::new(e))
    }
}
