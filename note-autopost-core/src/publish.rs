//! note.com article API client.
//!
//! Two calls per run: `POST /api/v1/text_notes` creates a draft and yields `{id, key}`,
//! `PUT /api/v1/text_notes/{id}` saves content and status. Authentication is the harvested cookie
//! jar plus an `X-XSRF-TOKEN` header when the session carries a token. Any 2xx counts as success.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, info};

use crate::config::PlatformConfig;
use crate::contract::{Publisher, PublishStatus, RemoteArticle, SessionCredentials};
use crate::error::PublishError;

pub const XSRF_HEADER: &str = "x-xsrf-token";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDraftRequest<'a> {
    body: &'a str,
    name: &'a str,
    template_key: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    body: &'a str,
    name: &'a str,
    status: PublishStatus,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreateDraftResponse {
    data: Option<CreatedNote>,
}

#[derive(Debug, Deserialize)]
struct CreatedNote {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Public URL of an article: `{base_url}/{author}/n/{key}`.
pub fn article_url(base_url: &str, author: &str, key: &str) -> String {
    format!("{}/{}/n/{}", base_url.trim_end_matches('/'), author, key)
}

/// reqwest-backed [`Publisher`] for note.com.
pub struct NoteClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl NoteClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }

    fn notes_url(&self) -> String {
        format!("{}/api/v1/text_notes", self.base_url)
    }

    fn headers(&self, session: &SessionCredentials) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        match HeaderValue::from_str(&session.cookie_header()) {
            Ok(cookie) if !session.cookies.is_empty() => {
                headers.insert(COOKIE, cookie);
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Session cookies are not a valid header value, sending none"),
        }
        if !session.xsrf_token.is_empty() {
            match HeaderValue::from_str(&session.xsrf_token) {
                Ok(token) => {
                    headers.insert(XSRF_HEADER, token);
                }
                Err(e) => error!(error = %e, "Anti-forgery token is not a valid header value"),
            }
        }
        headers
    }
}

async fn status_error(response: reqwest::Response) -> PublishError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    PublishError::Status { status, body }
}

#[async_trait]
impl Publisher for NoteClient {
    async fn create_draft(
        &self,
        session: &SessionCredentials,
        title: &str,
        html: &str,
    ) -> Result<RemoteArticle, PublishError> {
        let url = self.notes_url();
        info!(title = %title, "Creating draft");
        debug!(url = %url, html_len = html.len(), "Draft creation request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers(session))
            .json(&CreateDraftRequest {
                body: html,
                name: title,
                template_key: None,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            error!(error = %err, "Draft creation rejected");
            return Err(err);
        }

        let created: CreateDraftResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Decode(e.to_string()))?;
        let note = created.data.ok_or(PublishError::MissingField("data"))?;
        let id = note
            .id
            .filter(|id| !id.is_empty())
            .ok_or(PublishError::MissingField("data.id"))?;
        let key = note
            .key
            .filter(|key| !key.is_empty())
            .ok_or(PublishError::MissingField("data.key"))?;
        info!(id = %id, key = %key, "Draft created");
        Ok(RemoteArticle { id, key })
    }

    async fn set_status(
        &self,
        session: &SessionCredentials,
        id: &str,
        title: &str,
        html: &str,
        status: PublishStatus,
    ) -> Result<(), PublishError> {
        let url = format!("{}/{}", self.notes_url(), id);
        info!(id = %id, status = %status, "Saving article");

        let response = self
            .http
            .put(&url)
            .headers(self.headers(session))
            .json(&UpdateRequest {
                body: html,
                name: title,
                status,
                tags: Vec::new(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            error!(id = %id, error = %err, "Saving article rejected");
            return Err(err);
        }
        info!(id = %id, status = %status, "Article saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_uses_camel_case_template_key() {
        let json = serde_json::to_value(CreateDraftRequest {
            body: "<p>x</p>",
            name: "t",
            template_key: None,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"body": "<p>x</p>", "name": "t", "templateKey": null})
        );
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let parsed: CreateDraftResponse =
            serde_json::from_str(r#"{"data":{"id":12345,"key":"n1a2b3"}}"#).unwrap();
        let note = parsed.data.unwrap();
        assert_eq!(note.id.as_deref(), Some("12345"));
        assert_eq!(note.key.as_deref(), Some("n1a2b3"));
    }

    #[test]
    fn article_url_trims_trailing_slash() {
        assert_eq!(
            article_url("https://note.com/", "any", "abc"),
            "https://note.com/any/n/abc"
        );
    }

    #[test]
    fn headers_carry_cookie_and_xsrf() {
        let client = NoteClient::new(&PlatformConfig::default()).unwrap();
        let session = SessionCredentials::from_cookies(
            vec![
                ("_note_session".to_string(), "s".to_string()),
                ("XSRF-TOKEN".to_string(), "tok".to_string()),
            ],
            "XSRF-TOKEN",
        );
        let headers = client.headers(&session);
        assert_eq!(headers[COOKIE], "XSRF-TOKEN=tok; _note_session=s");
        assert_eq!(headers[XSRF_HEADER], "tok");

        let bare = client.headers(&SessionCredentials::default());
        assert!(bare.get(COOKIE).is_none());
        assert!(bare.get(XSRF_HEADER).is_none());
    }
}
