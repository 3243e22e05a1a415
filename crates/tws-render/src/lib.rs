pub mod cache;
#[cfg(feature = "chrome")]
mod chrome;
mod config;
mod error;
mod http;
mod render;

pub use cache::{load_or_fetch, Snapshot};
#[cfg(feature = "chrome")]
pub use chrome::ChromeRenderer;
pub use config::{RenderConfig, RendererKind, DEFAULT_USER_AGENT};
pub use error::RenderError;
pub use http::HttpRenderer;
pub use render::{from_config, RenderRequest, Renderer};

pub use anyhow;
