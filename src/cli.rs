///
/// This module implements the CLI interface for note-autopost: command parsing, wiring real
/// clients into the core pipeline, and user-visible progress/error output.
///
/// All business logic (generation, rendering, login, publishing) lives in `note-autopost-core`;
/// this module is strictly glue.
///
/// ## How To Use
/// - Command-line users: `note-autopost --help`.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
use crate::load_config::{load_config, Overrides};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use note_autopost_core::autopost::autopost;
use note_autopost_core::contract::{PublishStatus, SessionAcquirer};
use note_autopost_core::error::AutopostError;
use note_autopost_core::generate::GeminiClient;
use note_autopost_core::publish::NoteClient;
use note_autopost_core::render::{render_with, RenderOptions};
use note_autopost_core::session::{write_session_file, BrowserSessionAcquirer, StaticSessionAcquirer};
use std::path::PathBuf;

/// CLI for note-autopost: generate an article and publish it to note.
#[derive(Parser)]
#[clap(
    name = "note-autopost",
    version,
    about = "Generate a blog article with Gemini and post it to note.com"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an article, log in, and post it
    Post {
        /// Path to an optional YAML settings file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Status to save the article with (draft or public)
        #[clap(long)]
        status: Option<PublishStatus>,
        /// Generation model identifier
        #[clap(long)]
        model: Option<String>,
        /// Show the browser window during login
        #[clap(long)]
        headed: bool,
        /// Wait for a human to finish the login in a visible browser
        #[clap(long)]
        interactive: bool,
        /// Reuse a session saved by `login` instead of opening a browser
        #[clap(long)]
        session_file: Option<PathBuf>,
    },
    /// Log in through the browser and save the session cookies to a file
    Login {
        /// Path to an optional YAML settings file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Where to write the session JSON
        #[clap(long)]
        output: PathBuf,
        /// Show the browser window during login
        #[clap(long)]
        headed: bool,
        /// Wait for a human to finish the login in a visible browser
        #[clap(long)]
        interactive: bool,
    },
    /// Render a markup file to HTML on stdout
    Render {
        /// Markup file to convert
        input: PathBuf,
        /// Leave `# ` lines untouched
        #[clap(long)]
        no_h1: bool,
        /// Leave fenced code untouched
        #[clap(long)]
        no_code_blocks: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Post {
            config,
            status,
            model,
            headed,
            interactive,
            session_file,
        } => {
            let overrides = Overrides {
                publish_status: status,
                model_id: model,
                headed,
                interactive,
            };
            post(config, overrides, session_file).await
        }
        Commands::Login {
            config,
            output,
            headed,
            interactive,
        } => {
            let overrides = Overrides {
                headed,
                interactive,
                ..Overrides::default()
            };
            login(config, overrides, output).await
        }
        Commands::Render {
            input,
            no_h1,
            no_code_blocks,
        } => {
            let markup = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read markup file {}", input.display()))?;
            let options = RenderOptions {
                h1: !no_h1,
                code_blocks: !no_code_blocks,
                ..RenderOptions::default()
            };
            println!("{}", render_with(&markup, &options));
            Ok(())
        }
    }
}

async fn post(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    session_file: Option<PathBuf>,
) -> Result<()> {
    println!("--- note autopost starting ---");
    let config = load_config(config_path.as_deref(), &overrides).context("Configuration error")?;
    tracing::info!(command = "post", "Starting autopost run");

    let generator = GeminiClient::new(&config.generation).context("Failed to build generation client")?;
    let publisher = NoteClient::new(&config.platform).context("Failed to build platform client")?;
    let acquirer: Box<dyn SessionAcquirer> = match session_file {
        Some(path) => Box::new(StaticSessionAcquirer::from_file(&path)?),
        None => Box::new(BrowserSessionAcquirer::new(config.browser.clone())),
    };

    match autopost(&config, &generator, acquirer.as_ref(), &publisher).await {
        Ok(report) => {
            tracing::info!(command = "post", id = %report.article.id, url = %report.url, "Autopost complete");
            println!("Posted successfully! URL: {}", report.url);
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "post", error = %e, "Autopost failed");
            match &e {
                AutopostError::SetStatus { article, .. } => {
                    eprintln!("[ERROR] Saving the article failed; draft {} was left in place", article.id)
                }
                AutopostError::CreateDraft(_) => eprintln!("[ERROR] Creating the draft failed"),
                AutopostError::Authentication(_) => eprintln!("[ERROR] Login failed"),
            }
            Err(anyhow::Error::new(e))
        }
    }
}

async fn login(config_path: Option<PathBuf>, overrides: Overrides, output: PathBuf) -> Result<()> {
    let config = load_config(config_path.as_deref(), &overrides).context("Configuration error")?;
    tracing::info!(command = "login", output = %output.display(), "Harvesting session");

    let acquirer = BrowserSessionAcquirer::new(config.browser.clone());
    let session = acquirer.acquire(&config.account).await?;
    write_session_file(&output, &session)
        .with_context(|| format!("Failed to write session file {}", output.display()))?;
    println!(
        "Session saved to {} ({} cookies)",
        output.display(),
        session.cookies.len()
    );
    Ok(())
}
