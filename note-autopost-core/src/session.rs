//! Session acquisition: log into the platform and harvest cookies plus the anti-forgery token.
//!
//! [`BrowserSessionAcquirer`] drives headless Chrome through the login form. headless_chrome is a
//! blocking API, so the whole browser lifetime lives inside one `spawn_blocking` task: the browser
//! is created there and dropped there, which terminates the Chrome process on success, on error and
//! while unwinding from a panic.
//!
//! [`StaticSessionAcquirer`] hands back credentials that were harvested earlier (or canned ones in
//! tests) without touching a browser.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{error, info, warn};

use crate::config::BrowserConfig;
use crate::contract::{AccountCredentials, SessionAcquirer, SessionCredentials};
use crate::error::AuthenticationError;

pub const EMAIL_SELECTORS: [&str; 4] = [
    r#"input[name="email"]"#,
    r#"input[type="email"]"#,
    "input#email",
    r#"input[autocomplete="username"]"#,
];
pub const PASSWORD_SELECTORS: [&str; 2] = [r#"input[name="password"]"#, r#"input[type="password"]"#];
pub const SUBMIT_SELECTORS: [&str; 2] = [r#"button[type="submit"]"#, "form button"];
pub const NEW_POST_SELECTORS: [&str; 2] = [r#"a[href*="/notes/new"]"#, r#"a[href*="new_note"]"#];

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// CSS selector list matching any of `selectors`.
pub fn selector_list(selectors: &[&str]) -> String {
    selectors.join(", ")
}

/// Whether `url` is still the login page.
pub fn is_login_url(url: &str) -> bool {
    url.split(['?', '#'])
        .next()
        .is_some_and(|path| path.trim_end_matches('/').ends_with("/login"))
}

/// After the settle wait, the credentials were rejected if the tab is still on the login page.
pub fn check_login_settled(url: &str) -> Result<(), AuthenticationError> {
    if is_login_url(url) {
        return Err(AuthenticationError::Rejected {
            url: url.to_string(),
        });
    }
    Ok(())
}

/// Logs in with a real Chrome instance.
pub struct BrowserSessionAcquirer {
    config: BrowserConfig,
}

impl BrowserSessionAcquirer {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionAcquirer for BrowserSessionAcquirer {
    async fn acquire(
        &self,
        account: &AccountCredentials,
    ) -> Result<SessionCredentials, AuthenticationError> {
        let config = self.config.clone();
        let account = account.clone();
        info!(login_url = %config.login_url, headless = config.headless, "Starting browser login");

        let outcome = tokio::task::spawn_blocking(move || login_blocking(&config, &account)).await;
        match outcome {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Browser login task did not complete");
                Err(AuthenticationError::Task(e.to_string()))
            }
        }
    }
}

/// Owns the Chrome process for the duration of one login.
struct LoginBrowser {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl LoginBrowser {
    fn launch(config: &BrowserConfig) -> Result<Self, AuthenticationError> {
        let user_agent_arg = config.user_agent.as_ref().map(|ua| format!("--user-agent={ua}"));
        let mut args = vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        let idle = config.interactive_timeout.max(config.settle_timeout) + Duration::from_secs(60);
        let options = LaunchOptions::default_builder()
            .headless(config.headless && !config.interactive_login)
            .sandbox(false)
            .window_size(Some((config.window_width, config.window_height)))
            .user_data_dir(config.profile_dir.clone())
            .idle_browser_timeout(idle)
            .args(args)
            .build()
            .map_err(|e| AuthenticationError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| AuthenticationError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AuthenticationError::Launch(format!("failed to open tab: {e}")))?;
        info!("Browser launched");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

fn login_blocking(
    config: &BrowserConfig,
    account: &AccountCredentials,
) -> Result<SessionCredentials, AuthenticationError> {
    let browser = LoginBrowser::launch(config)?;
    let result = drive_login(&browser.tab, config, account);
    if let Err(e) = &result {
        error!(error = %e, url = %browser.tab.get_url(), "Browser login failed");
        if let Some(dir) = &config.screenshot_dir {
            save_failure_screenshot(&browser.tab, dir);
        }
    }
    drop(browser);
    info!("Browser closed");
    result
}

fn drive_login(
    tab: &Arc<Tab>,
    config: &BrowserConfig,
    account: &AccountCredentials,
) -> Result<SessionCredentials, AuthenticationError> {
    println!("Opening login page...");
    tab.navigate_to(&config.login_url)
        .and_then(|t| t.wait_until_navigated())
        .map_err(|e| AuthenticationError::Navigation(format!("{}: {e}", config.login_url)))?;

    if !is_login_url(&tab.get_url()) {
        info!(url = %tab.get_url(), "Already logged in, skipping login form");
        return harvest(tab, config);
    }

    match fill_login_form(tab, config, account) {
        Ok(()) => {}
        Err(e) if config.interactive_login => {
            warn!(error = %e, "Could not fill login form automatically, waiting for manual login");
        }
        Err(e) => return Err(e),
    }

    if config.interactive_login {
        println!(
            "Complete the login in the browser window (waiting up to {}s)...",
            config.interactive_timeout.as_secs()
        );
        wait_for_login(tab, config.interactive_timeout)?;
    } else {
        println!("Waiting for login to complete...");
        if wait_for_login(tab, config.settle_timeout).is_err() {
            warn!(timeout = ?config.settle_timeout, "No login success signal observed");
            check_login_settled(&tab.get_url())?;
        }
    }

    harvest(tab, config)
}

fn fill_login_form(
    tab: &Arc<Tab>,
    config: &BrowserConfig,
    account: &AccountCredentials,
) -> Result<(), AuthenticationError> {
    let email = tab
        .wait_for_element_with_custom_timeout(&selector_list(&EMAIL_SELECTORS), config.element_timeout)
        .map_err(|_| AuthenticationError::ElementNotFound {
            field: "email",
            tried: selector_list(&EMAIL_SELECTORS),
        })?;
    email
        .click()
        .and_then(|e| e.type_into(&account.email))
        .map_err(|e| AuthenticationError::Interaction(format!("typing email: {e}")))?;

    let password = tab
        .find_element(&selector_list(&PASSWORD_SELECTORS))
        .map_err(|_| AuthenticationError::ElementNotFound {
            field: "password",
            tried: selector_list(&PASSWORD_SELECTORS),
        })?;
    password
        .click()
        .and_then(|e| e.type_into(&account.password))
        .map_err(|e| AuthenticationError::Interaction(format!("typing password: {e}")))?;

    let submit = tab
        .find_element(&selector_list(&SUBMIT_SELECTORS))
        .map_err(|_| AuthenticationError::ElementNotFound {
            field: "submit",
            tried: selector_list(&SUBMIT_SELECTORS),
        })?;
    submit
        .click()
        .map_err(|e| AuthenticationError::Interaction(format!("clicking submit: {e}")))?;
    info!("Login form submitted");
    Ok(())
}

/// Polls until the tab leaves the login page or a new-post link shows up.
fn wait_for_login(tab: &Arc<Tab>, timeout: Duration) -> Result<(), AuthenticationError> {
    let deadline = Instant::now() + timeout;
    let new_post = selector_list(&NEW_POST_SELECTORS);
    loop {
        let url = tab.get_url();
        if !is_login_url(&url) || tab.find_element(&new_post).is_ok() {
            info!(url = %url, "Login success signal observed");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(AuthenticationError::Timeout(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn harvest(tab: &Arc<Tab>, config: &BrowserConfig) -> Result<SessionCredentials, AuthenticationError> {
    let cookies = tab
        .get_cookies()
        .map_err(|e| AuthenticationError::Interaction(format!("reading cookies: {e}")))?;
    let session = SessionCredentials::from_cookies(
        cookies.into_iter().map(|c| (c.name, c.value)),
        &config.xsrf_cookie,
    );
    info!(
        cookies = session.cookies.len(),
        has_xsrf_token = !session.xsrf_token.is_empty(),
        "Harvested session cookies"
    );
    Ok(session)
}

fn save_failure_screenshot(tab: &Arc<Tab>, dir: &Path) {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = dir.join(format!("login-failure-{stamp}.png"));
    let written = tab
        .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        .map_err(|e| e.to_string())
        .and_then(|png| {
            std::fs::create_dir_all(dir)
                .and_then(|_| std::fs::write(&path, png))
                .map_err(|e| e.to_string())
        });
    match written {
        Ok(()) => info!(path = %path.display(), "Saved login failure screenshot"),
        Err(e) => warn!(error = %e, "Could not save login failure screenshot"),
    }
}

/// Returns credentials it was given, e.g. a session saved by an earlier login.
#[derive(Debug, Clone)]
pub struct StaticSessionAcquirer {
    session: SessionCredentials,
}

impl StaticSessionAcquirer {
    pub fn new(session: SessionCredentials) -> Self {
        Self { session }
    }

    /// Load a JSON session file written by [`write_session_file`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthenticationError> {
        let path = path.as_ref();
        let session_file_error = |reason: String| AuthenticationError::SessionFile {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| session_file_error(e.to_string()))?;
        let session: SessionCredentials =
            serde_json::from_str(&raw).map_err(|e| session_file_error(e.to_string()))?;
        info!(path = %path.display(), cookies = session.cookies.len(), "Loaded saved session");
        Ok(Self::new(session))
    }
}

#[async_trait]
impl SessionAcquirer for StaticSessionAcquirer {
    async fn acquire(
        &self,
        _account: &AccountCredentials,
    ) -> Result<SessionCredentials, AuthenticationError> {
        Ok(self.session.clone())
    }
}

/// Persist harvested credentials as pretty JSON.
pub fn write_session_file(path: impl AsRef<Path>, session: &SessionCredentials) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(session).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_detection() {
        assert!(is_login_url("https://note.com/login"));
        assert!(is_login_url("https://note.com/login/"));
        assert!(is_login_url("https://note.com/login?redirectPath=%2F"));
        assert!(!is_login_url("https://note.com/"));
        assert!(!is_login_url("https://note.com/notes/new"));
        assert!(!is_login_url("https://note.com/loginhelp"));
    }

    #[test]
    fn staying_on_login_page_is_a_rejection() {
        let err = check_login_settled("https://note.com/login?redirectPath=%2F").unwrap_err();
        assert!(matches!(err, AuthenticationError::Rejected { ref url } if url.ends_with("%2F")));
        assert!(check_login_settled("https://note.com/").is_ok());
        assert!(check_login_settled("https://note.com/notes/new").is_ok());
    }

    #[test]
    fn selectors_are_joined_as_css_list() {
        assert_eq!(
            selector_list(&PASSWORD_SELECTORS),
            r#"input[name="password"], input[type="password"]"#
        );
    }
}
