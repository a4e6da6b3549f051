//! High-level pipeline: generate → render → log in → create draft → set status.
//!
//! One linear run per invocation. Generation failures degrade to placeholder content; every other
//! failure stops the run and is returned to the caller. Nothing is retried, and a draft whose status
//! update fails is left on the platform as-is (the error carries its identifiers).
//!
//! # Major Types
//! - [`AutopostReport`]: what got posted and where
//! - [`AutopostError`]: the fatal outcomes
//!
//! # Callable From
//! - The CLI `post` command and the integration tests, with real clients or `mockall` doubles.

use tracing::{error, info, info_span, Instrument};

use crate::config::AutopostConfig;
use crate::contract::{ContentGenerator, Publisher, PublishStatus, RemoteArticle, SessionAcquirer};
use crate::error::AutopostError;
use crate::generate::generate_article;
use crate::publish::article_url;
use crate::render::render_with;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutopostReport {
    pub article: RemoteArticle,
    pub title: String,
    pub status: PublishStatus,
    pub url: String,
}

pub async fn autopost<G, S, P>(
    config: &AutopostConfig,
    generator: &G,
    acquirer: &S,
    publisher: &P,
) -> Result<AutopostReport, AutopostError>
where
    G: ContentGenerator + ?Sized,
    S: SessionAcquirer + ?Sized,
    P: Publisher + ?Sized,
{
    run_stages(config, generator, acquirer, publisher)
        .instrument(info_span!("autopost", status = %config.publish_status))
        .await
}

async fn run_stages<G, S, P>(
    config: &AutopostConfig,
    generator: &G,
    acquirer: &S,
    publisher: &P,
) -> Result<AutopostReport, AutopostError>
where
    G: ContentGenerator + ?Sized,
    S: SessionAcquirer + ?Sized,
    P: Publisher + ?Sized,
{
    info!("[AUTOPOST] Starting run");

    // --- Step 1: Generate + render ---
    println!("1. Generating article...");
    let article = generate_article(generator, &config.generation.topics).await;
    let html = render_with(&article.body_markup, &config.render);
    info!(title = %article.title, html_len = html.len(), "[AUTOPOST] Article rendered");

    // --- Step 2: Log in ---
    println!("2. Logging in...");
    let session = match acquirer.acquire(&config.account).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "[AUTOPOST][ERROR] Login failed");
            return Err(e.into());
        }
    };

    // --- Step 3: Create draft ---
    println!("3. Creating draft...");
    let remote = match publisher.create_draft(&session, &article.title, &html).await {
        Ok(remote) => remote,
        Err(e) => {
            error!(error = %e, "[AUTOPOST][ERROR] Draft creation failed");
            return Err(AutopostError::CreateDraft(e));
        }
    };

    // --- Step 4: Save with target status ---
    println!(
        "4. Saving article (id {}, status {})...",
        remote.id, config.publish_status
    );
    if let Err(e) = publisher
        .set_status(&session, &remote.id, &article.title, &html, config.publish_status)
        .await
    {
        error!(
            id = %remote.id,
            key = %remote.key,
            error = %e,
            "[AUTOPOST][ERROR] Status update failed, draft left in place"
        );
        return Err(AutopostError::SetStatus {
            article: remote,
            source: e,
        });
    }

    let url = article_url(&config.platform.base_url, &config.platform.author, &remote.key);
    info!(id = %remote.id, url = %url, "[AUTOPOST] Run complete");
    Ok(AutopostReport {
        article: remote,
        title: article.title,
        status: config.publish_status,
        url,
    })
}
