//! # contract: the seams between the autopost workflow and the outside world
//!
//! Every external collaborator of a run sits behind one trait here:
//! - [`ContentGenerator`]: the text-generation service
//! - [`SessionAcquirer`]: whatever produces authenticated platform credentials (browser login, saved session)
//! - [`Publisher`]: the platform's draft/status API
//!
//! The traits are annotated for `mockall` so tests can swap in deterministic doubles, exactly the
//! way the workflow is driven in production with real clients.
//!
//! Plain data exchanged across the seams (articles, credentials, remote identifiers) also lives here.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::{AuthenticationError, GenerationError, PublishError};

/// Title and markup body split out of a raw generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    pub title: String,
    pub body_markup: String,
}

/// Login identity for the platform.
#[derive(Clone)]
pub struct AccountCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication state harvested from a logged-in browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub cookies: BTreeMap<String, String>,
    /// Anti-forgery token; empty when the platform did not set one.
    #[serde(default)]
    pub xsrf_token: String,
}

impl SessionCredentials {
    /// Builds credentials from harvested `(name, value)` cookie pairs, pulling the
    /// anti-forgery token out of the cookie called `xsrf_cookie` (empty if absent).
    pub fn from_cookies<I>(cookies: I, xsrf_cookie: &str) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let cookies: BTreeMap<String, String> = cookies.into_iter().collect();
        let xsrf_token = cookies.get(xsrf_cookie).cloned().unwrap_or_default();
        Self {
            cookies,
            xsrf_token,
        }
    }

    /// `Cookie` header value: `name=value` pairs joined by `; `.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Identifiers of a draft created on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArticle {
    /// Used for the status-update call.
    pub id: String,
    /// Public URL slug.
    pub key: String,
}

/// Target status for the update call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Public,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Draft => "draft",
            PublishStatus::Public => "public",
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PublishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PublishStatus::Draft),
            "public" | "published" => Ok(PublishStatus::Public),
            other => Err(format!("unknown publish status `{other}` (expected draft or public)")),
        }
    }
}

/// Text-generation service: one prompt in, free-form text out.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Issue exactly one generation request for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Produces authenticated platform credentials.
///
/// Implementations that hold external resources (a browser process) must release them on
/// every exit path before returning.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SessionAcquirer: Send + Sync {
    async fn acquire(
        &self,
        account: &AccountCredentials,
    ) -> Result<SessionCredentials, AuthenticationError>;
}

/// The platform's article API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create a draft carrying `title` and `html`.
    async fn create_draft(
        &self,
        session: &SessionCredentials,
        title: &str,
        html: &str,
    ) -> Result<RemoteArticle, PublishError>;

    /// Save the draft `id` with the given content and status.
    async fn set_status(
        &self,
        session: &SessionCredentials,
        id: &str,
        title: &str,
        html: &str,
        status: PublishStatus,
    ) -> Result<(), PublishError>;
}
