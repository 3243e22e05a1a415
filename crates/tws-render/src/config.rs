use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser-like identity sent with every page request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    #[serde(default = "default_renderer")]
    pub renderer: RendererKind,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page timeout in seconds, also bounds the wait for a selector (half of it)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_sandbox")]
    pub sandbox: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            renderer: default_renderer(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            headless: default_headless(),
            sandbox: default_sandbox(),
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_renderer() -> RendererKind {
    RendererKind::Chrome
}

fn default_user_agent() -> String {
    String::from(DEFAULT_USER_AGENT)
}

fn default_timeout() -> u64 {
    60
}

fn default_headless() -> bool {
    true
}

fn default_sandbox() -> bool {
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum RendererKind {
    /// Headless Chrome, executes client-side scripts
    Chrome,
    /// Plain HTTP GET, no script execution
    Http,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let conf: RenderConfig = serde_yaml::from_str("renderer: http\ntimeout: 10\n").unwrap();
        assert_eq!(conf.renderer, RendererKind::Http);
        assert_eq!(conf.timeout(), Duration::from_secs(10));
        assert_eq!(conf.user_agent, DEFAULT_USER_AGENT);
        assert!(conf.headless);
        assert!(!conf.sandbox);
    }
}
