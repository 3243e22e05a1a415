use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Couldn't launch browser: {0}")]
    Launch(#[source] anyhow::Error),

    #[error("Couldn't load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Selector '{selector}' not found on {url} within {timeout:?}")]
    Selector {
        url: String,
        selector: String,
        timeout: Duration,
    },

    #[error("Couldn't read rendered content of {url}: {source}")]
    Content {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Couldn't build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Renderer {0:?} is not available in this build")]
    Unavailable(crate::RendererKind),
}
