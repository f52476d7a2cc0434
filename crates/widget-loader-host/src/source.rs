//! Widget URL sources.

use std::time::Duration;

use async_trait::async_trait;
use widget_loader_core::{UrlSourceError, WidgetUrl, WidgetUrlSource};

/// URL handed out by [`StaticUrlSource::mock`].
pub const MOCK_WIDGET_URL: &str = "https://int-widgets.moneydesktop.com/md/abc123";

/// Latency of [`StaticUrlSource::mock`].
const MOCK_LATENCY: Duration = Duration::from_millis(500);

/// Hands out a fixed URL, optionally after a delay.
#[derive(Debug, Clone)]
pub struct StaticUrlSource {
    url: String,
    delay: Duration,
}

impl StaticUrlSource {
    /// Source answering immediately with `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            delay: Duration::ZERO,
        }
    }

    /// Stand-in for the backend: a fake widget URL after half a second.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(MOCK_WIDGET_URL).with_delay(MOCK_LATENCY)
    }

    /// Answer only after `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl WidgetUrlSource for StaticUrlSource {
    async fn widget_url(&self) -> Result<WidgetUrl, UrlSourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(WidgetUrl {
            url: self.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_url() {
        let source = StaticUrlSource::new("https://w.example.com/x");
        assert_eq!(source.widget_url().await.unwrap().url, "https://w.example.com/x");
    }

    #[tokio::test]
    async fn test_delay_is_honoured() {
        let source = StaticUrlSource::new("https://w.example.com/x").with_delay(Duration::from_millis(20));
        let started = tokio::time::Instant::now();
        source.widget_url().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_mock_url() {
        let source = StaticUrlSource::mock();
        assert_eq!(source.url, MOCK_WIDGET_URL);
        assert_eq!(source.delay, MOCK_LATENCY);
    }
}
