use reqwest::blocking::Client;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::render::{RenderRequest, Renderer};

/// Fetches the server-side HTML only, client-side scripts are not executed.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(RenderError::Client)?;
        Ok(Self { client })
    }
}

impl Renderer for HttpRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        let url = &request.url;
        log::info!("Downloading page: {url}");

        let http_err = |source| RenderError::Http {
            url: url.clone(),
            source,
        };
        let page = self
            .client
            .get(url)
            .timeout(request.timeout)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(http_err)?;

        if let Some(selector) = &request.wait_for_selector {
            log::debug!("Ignoring wait selector '{selector}', HTTP pages are static");
        }
        log::info!("Downloaded {url} ({} bytes)", page.len());

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_user_agent_fails_client_build() {
        let config = RenderConfig {
            user_agent: "bad\nagent".into(),
            ..Default::default()
        };
        let err = HttpRenderer::new(&config).unwrap_err();
        assert!(matches!(err, RenderError::Client(_)));
        assert!(err.to_string().starts_with("Couldn't build HTTP client"));
    }
}
