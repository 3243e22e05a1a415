use std::sync::Arc;
use std::thread;

use anyhow::anyhow;
use headless_chrome::protocol::cdp::Target::DisposeBrowserContext;
use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::render::{RenderRequest, Renderer};

/// Renders pages in a fresh headless Chrome, one browser per call.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    user_agent: String,
    headless: bool,
    sandbox: bool,
}

impl ChromeRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            headless: config.headless,
            sandbox: config.sandbox,
        }
    }

    fn launch(&self, request: &RenderRequest) -> Result<Browser, RenderError> {
        let options = LaunchOptions::default_builder()
            .headless(self.headless)
            .sandbox(self.sandbox)
            .idle_browser_timeout(request.timeout + request.idle_wait)
            .build()
            .map_err(|e| RenderError::Launch(anyhow!("{e}")))?;
        Browser::new(options).map_err(RenderError::Launch)
    }

    fn drive(&self, tab: &Tab, request: &RenderRequest) -> Result<String, RenderError> {
        let url = &request.url;
        let nav_err = |source| RenderError::Navigation {
            url: url.clone(),
            source,
        };

        tab.set_default_timeout(request.timeout);
        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(nav_err)?;

        log::info!("Navigating to {url}...");
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(nav_err)?;
        log::info!("Initial page load complete");

        match &request.wait_for_selector {
            Some(selector) => {
                let timeout = request.selector_timeout();
                log::info!("Waiting for selector '{selector}' (up to {timeout:?})");
                tab.wait_for_element_with_custom_timeout(selector, timeout)
                    .map_err(|_| RenderError::Selector {
                        url: url.clone(),
                        selector: selector.clone(),
                        timeout,
                    })?;
                log::info!("Selector '{selector}' found");
            }
            None => {
                log::info!("Waiting {:?} for dynamic content...", request.idle_wait);
                thread::sleep(request.idle_wait);
            }
        }

        tab.get_content().map_err(|source| RenderError::Content {
            url: url.clone(),
            source,
        })
    }
}

impl Renderer for ChromeRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        log::info!("Rendering page via headless Chrome: {}", request.url);

        let browser = self.launch(request)?;
        let page = render_in_context(&browser, |tab| self.drive(tab, request));
        drop(browser);

        if let Ok(html) = &page {
            log::info!("Rendered {} ({} bytes)", request.url, html.len());
        }
        page
    }
}

/// Runs `f` on a tab of an isolated browser context, then closes the tab and
/// disposes the context whatever `f` returned. Each release is attempted on
/// its own, failures are only logged.
fn render_in_context<F>(browser: &Browser, f: F) -> Result<String, RenderError>
where
    F: FnOnce(&Tab) -> Result<String, RenderError>,
{
    let context = browser.new_context().map_err(RenderError::Launch)?;
    let context_id = context.get_id().to_string();

    let page = match context.new_tab() {
        Ok(tab) => {
            let page = f(&tab);
            close_tab(tab);
            page
        }
        Err(e) => Err(RenderError::Launch(e)),
    };

    if let Err(e) = browser.call_method(DisposeBrowserContext {
        browser_context_id: context_id,
    }) {
        log::error!("Error closing browser context: {e}");
    }

    page
}

fn close_tab(tab: Arc<Tab>) {
    if let Err(e) = tab.close(true) {
        log::error!("Error closing page: {e}");
    }
}
