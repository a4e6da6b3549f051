//! Error taxonomy for a single autopost run.
//!
//! Only [`GenerationError`] is recovered locally (placeholder content is used instead);
//! configuration, authentication and publishing errors abort the run.

use std::time::Duration;

use crate::contract::RemoteArticle;

/// Pre-flight configuration failures. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Failures talking to the text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation API key is empty")]
    MissingApiKey,

    #[error("no topics configured")]
    NoTopics,

    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service returned an empty response")]
    EmptyResponse,

    #[error("malformed generation response: {0}")]
    Malformed(String),
}

/// Any failure while driving the login flow or loading a saved session.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{field} field not found (tried {tried})")]
    ElementNotFound { field: &'static str, tried: String },

    #[error("browser interaction failed: {0}")]
    Interaction(String),

    #[error("login did not complete within {0:?}")]
    Timeout(Duration),

    #[error("login was not accepted, still on {url}")]
    Rejected { url: String },

    #[error("login task aborted: {0}")]
    Task(String),

    #[error("failed to load session file {path}: {reason}")]
    SessionFile { path: String, reason: String },
}

/// Failures calling the platform's draft/status endpoints.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Fatal outcome of the workflow.
#[derive(Debug, thiserror::Error)]
pub enum AutopostError {
    #[error("login failed: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("draft creation failed: {0}")]
    CreateDraft(#[source] PublishError),

    #[error("saving draft {} failed: {source}", article.id)]
    SetStatus {
        article: RemoteArticle,
        #[source]
        source: PublishError,
    },
}
