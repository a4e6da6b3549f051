//! Content generation: topic selection, prompt template, Gemini client and response parsing.
//!
//! [`generate_article`] is the entrypoint used by the workflow. It never fails: any error from the
//! generation service is logged, reported on stdout, and replaced by a fixed placeholder article so
//! the rest of the run can proceed.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::GenerationConfig;
use crate::contract::{ContentGenerator, GeneratedArticle};
use crate::error::GenerationError;

pub const FALLBACK_TITLE: &str = "テスト記事";
pub const FALLBACK_BODY: &str = "これはテスト投稿です。";

/// The placeholder used whenever generation fails.
pub fn fallback_article() -> GeneratedArticle {
    GeneratedArticle {
        title: FALLBACK_TITLE.to_string(),
        body_markup: FALLBACK_BODY.to_string(),
    }
}

/// Uniform pick; `None` for an empty list.
pub fn choose_topic<'a, R: Rng + ?Sized>(topics: &'a [String], rng: &mut R) -> Option<&'a str> {
    topics.choose(rng).map(String::as_str)
}

/// Fixed prompt: title on the first line, a three-section markup body below it.
pub fn build_prompt(topic: &str) -> String {
    format!(
        "note.comに投稿するためのブログ記事を書いてください。\n\
         テーマ: {topic}\n\
         \n\
         出力形式:\n\
         1行目: タイトル\n\
         2行目以降: Markdown形式の本文（見出しやリストを活用して読みやすく）\n\
         \n\
         本文は「はじめに」「メインコンテンツ」「まとめ」の構成にしてください。\n"
    )
}

/// Split a raw response into title (first line, `#` stripped) and body (the rest, trimmed).
pub fn parse_article(raw: &str) -> Result<GeneratedArticle, GenerationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    let mut lines = raw.lines();
    let title = lines
        .next()
        .unwrap_or_default()
        .replace('#', "")
        .trim()
        .to_string();
    let body_markup = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Ok(GeneratedArticle { title, body_markup })
}

/// Pick a topic, ask `generator` once, and parse the answer; falls back to the placeholder on any error.
pub async fn generate_article<G>(generator: &G, topics: &[String]) -> GeneratedArticle
where
    G: ContentGenerator + ?Sized,
{
    match try_generate(generator, topics).await {
        Ok(article) => {
            info!(title = %article.title, body_len = article.body_markup.len(), "Article generated");
            println!("Article generated: {}", article.title);
            article
        }
        Err(e) => {
            error!(error = %e, "Article generation failed, using placeholder content");
            println!("Generation failed: {e}");
            fallback_article()
        }
    }
}

async fn try_generate<G>(
    generator: &G,
    topics: &[String],
) -> Result<GeneratedArticle, GenerationError>
where
    G: ContentGenerator + ?Sized,
{
    let topic = choose_topic(topics, &mut rand::thread_rng())
        .map(str::to_owned)
        .ok_or(GenerationError::NoTopics)?;
    info!(topic = %topic, "Selected topic");
    let raw = generator.complete(&build_prompt(&topic)).await?;
    parse_article(&raw)
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model_id: String,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let http = build_http(config.request_timeout)?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model_id
        )
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, GenerationError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        let url = self.endpoint();
        info!(model_id = %self.model_id, "Requesting article from generation service");
        debug!(url = %url, prompt_len = prompt.len(), "Generation request");

        let body = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Generation service returned an error status");
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        debug!(response_len = text.len(), "Generation response received");
        Ok(text)
    }
}
