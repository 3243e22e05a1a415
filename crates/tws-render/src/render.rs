use std::time::Duration;

use crate::config::{RenderConfig, RendererKind};
use crate::error::RenderError;
use crate::http::HttpRenderer;

/// Produces the HTML of a page, one call per page, no retry.
pub trait Renderer {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        (**self).render(request)
    }
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        (**self).render(request)
    }
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    /// CSS selector that must appear before the page is considered ready
    pub wait_for_selector: Option<String>,
    /// Fixed delay used when no selector is given
    pub idle_wait: Duration,
    pub timeout: Duration,
}

impl RenderRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            wait_for_selector: None,
            idle_wait: Duration::from_secs(5),
            timeout,
        }
    }

    pub fn wait_for(mut self, selector: Option<String>) -> Self {
        self.wait_for_selector = selector;
        self
    }

    pub fn idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// How long to wait for `wait_for_selector` once the page is loaded.
    pub fn selector_timeout(&self) -> Duration {
        self.timeout / 2
    }
}

/// Builds the renderer selected in `config`.
pub fn from_config(config: &RenderConfig) -> Result<Box<dyn Renderer>, RenderError> {
    match config.renderer {
        RendererKind::Http => Ok(Box::new(HttpRenderer::new(config)?)),
        #[cfg(feature = "chrome")]
        RendererKind::Chrome => Ok(Box::new(crate::chrome::ChromeRenderer::new(config))),
        #[cfg(not(feature = "chrome"))]
        RendererKind::Chrome => Err(RenderError::Unavailable(RendererKind::Chrome)),
    }
}
