//! Error handling and custom error types
//!
//! Every failure the generation core can produce maps onto one of the kinds
//! below. They all propagate to the conversation-turn boundary, where the
//! chat layer turns them into a user-facing reply.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The core was invoked without the credentials it needs.
    #[error("Incorrect use: {0}")]
    IncorrectUse(String),

    /// Caller-supplied input is invalid (empty prompt, unknown style).
    #[error("Wrong parameters: {0}")]
    WrongParameters(String),

    /// Bad status code, connection failure or an unparsable body.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The service answered, but not in the shape it promised.
    #[error("Wrong response body: {0}")]
    WrongResponseBody(String),

    /// The service reported that the job failed, or never created one.
    #[error("Image generation error: {0}")]
    ImageGeneration(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Chat transport error: {0}")]
    Chat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Only transport-level failures are worth repeating the surrounding
    /// operation for.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::RequestFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
