use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::config::BrowserConfig;
use crate::utils::error::{AppError, Result};

/// The page-retrieval contract adapters program against. One implementor
/// drives a real browser; tests substitute a scripted double. Callers must
/// serialize access: every navigation replaces the page state the other
/// methods read.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load a URL, waiting up to `timeout` for the page to finish.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Block until an element matching `selector` appears.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Fully rendered markup of the current page.
    async fn current_markup(&self) -> Result<String>;

    /// URL the browser actually landed on, after any redirects.
    async fn current_url(&self) -> String;

    async fn current_title(&self) -> Result<String>;
}

/// One long-lived automated browser shared by all adapters for a run.
/// The Chrome process dies with this value.
pub struct BrowserSession {
    // Held so the process outlives the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch the browser per configuration. Any failure here is fatal to
    /// the whole run: no adapter can operate without a browser.
    pub fn acquire(config: &BrowserConfig) -> Result<Self> {
        let flags = launch_flags(config);
        let proxy_url = config.proxy.as_ref().map(|p| p.server_url());
        let options = build_launch_options(config, &flags, proxy_url.as_deref())?;

        let browser =
            Browser::new(options).map_err(|e| AppError::BrowserInit(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::BrowserInit(format!("failed to open tab: {e}")))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| AppError::BrowserInit(format!("failed to set user agent: {e}")))?;

        if let Some((username, password)) = config.proxy.as_ref().and_then(|p| p.credentials()) {
            tab.authenticate(Some(username), Some(password))
                .map_err(|e| AppError::BrowserInit(format!("proxy authentication: {e}")))?;
        }

        debug!(headless = config.headless, stealth = config.stealth, "browser session ready");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub fn shutdown(self) -> Result<()> {
        // The Chrome process is killed when the Browser handle drops;
        // the headless_chrome crate handles cleanup internally.
        Ok(())
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(url)
            .map_err(|e| AppError::Navigation(e.to_string()))?;
        self.tab.wait_until_navigated().map_err(|e| {
            if is_timeout(&e) {
                AppError::NavigationTimeout(timeout)
            } else {
                AppError::Navigation(e.to_string())
            }
        })?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|e| {
                if is_timeout(&e) {
                    AppError::WaitTimeout {
                        selector: selector.to_string(),
                    }
                } else {
                    AppError::Protocol(e.to_string())
                }
            })?;
        Ok(())
    }

    async fn current_markup(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| AppError::Protocol(e.to_string()))
    }

    async fn current_url(&self) -> String {
        self.tab.get_url()
    }

    async fn current_title(&self) -> Result<String> {
        self.tab
            .get_title()
            .map_err(|e| AppError::Protocol(e.to_string()))
    }
}

fn launch_flags(config: &BrowserConfig) -> Vec<OsString> {
    let mut flags: Vec<OsString> = [
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--disable-extensions",
        "--disable-background-timer-throttling",
        "--disable-backgrounding-occluded-windows",
        "--disable-renderer-backgrounding",
    ]
    .iter()
    .map(OsString::from)
    .collect();

    if config.stealth {
        flags.push(OsString::from(
            "--disable-blink-features=AutomationControlled",
        ));
        flags.push(OsString::from("--no-first-run"));
        flags.push(OsString::from("--no-default-browser-check"));
    }

    flags
}

fn build_launch_options<'a>(
    config: &BrowserConfig,
    flags: &'a [OsString],
    proxy_url: Option<&'a str>,
) -> Result<LaunchOptions<'a>> {
    let args: Vec<&OsStr> = flags.iter().map(OsString::as_os_str).collect();

    let mut options = LaunchOptions::default_builder()
        .headless(config.headless)
        .sandbox(false) // Often needed in containerized environments
        .args(args)
        .proxy_server(proxy_url)
        .build()
        .map_err(|e| AppError::BrowserInit(format!("failed to build launch options: {e}")))?;

    // Set Chrome path if provided
    if let Some(chrome_path) = &config.chrome_path {
        options.path = Some(PathBuf::from(chrome_path));
    }

    Ok(options)
}

fn is_timeout(err: &anyhow::Error) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("timeout") || message.contains("timed out") || message.contains("never came")
}
