use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::contract::{AccountCredentials, PublishStatus};
use crate::render::RenderOptions;

pub const DEFAULT_NOTE_BASE_URL: &str = "https://note.com";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL_ID: &str = "gemini-3-flash-preview";
pub const DEFAULT_AUTHOR: &str = "any";
pub const DEFAULT_XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub const DEFAULT_TOPICS: [&str; 5] = [
    "最新のテクノロジートレンド",
    "効率的なプログラミング学習法",
    "AIツールの活用術",
    "リモートワークのコツ",
    "日々の生活ハック",
];

/// Everything one run needs, validated once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct AutopostConfig {
    pub account: AccountCredentials,
    pub generation: GenerationConfig,
    pub browser: BrowserConfig,
    pub platform: PlatformConfig,
    pub publish_status: PublishStatus,
    pub render: RenderOptions,
}

impl AutopostConfig {
    pub fn trace_loaded(&self) {
        info!(
            email = %self.account.email,
            model_id = %self.generation.model_id,
            topics = self.generation.topics.len(),
            base_url = %self.platform.base_url,
            publish_status = %self.publish_status,
            headless = self.browser.headless,
            interactive_login = self.browser.interactive_login,
            "Loaded AutopostConfig"
        );
        debug!(?self, "AutopostConfig loaded (full debug)");
    }
}

#[derive(Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub api_base: String,
    pub model_id: String,
    pub topics: Vec<String>,
    pub request_timeout: Duration,
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model_id", &self.model_id)
            .field("topics", &self.topics)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Browser-driven login settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub login_url: String,
    pub headless: bool,
    /// Visible browser with a long wait so a human can clear bot checks.
    pub interactive_login: bool,
    /// Persistent Chrome profile; lets a previous login be reused.
    pub profile_dir: Option<PathBuf>,
    /// Where a PNG is written when login fails.
    pub screenshot_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub element_timeout: Duration,
    pub settle_timeout: Duration,
    pub interactive_timeout: Duration,
    pub xsrf_cookie: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            login_url: format!("{DEFAULT_NOTE_BASE_URL}/login"),
            headless: true,
            interactive_login: false,
            profile_dir: None,
            screenshot_dir: None,
            user_agent: None,
            window_width: 1920,
            window_height: 1080,
            element_timeout: Duration::from_secs(20),
            settle_timeout: Duration::from_secs(10),
            interactive_timeout: Duration::from_secs(300),
            xsrf_cookie: DEFAULT_XSRF_COOKIE.to_string(),
        }
    }
}

/// Platform API settings.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    /// Path segment used when echoing the article URL.
    pub author: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOTE_BASE_URL.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}
