use crate::domain::ports::{PageRenderer, RenderSession};
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Renders directory pages by fetching their server-side markup over HTTP.
///
/// Each session owns its own client, so connections never outlive one scrape.
#[derive(Debug, Clone)]
pub struct HttpPageRenderer {
    timeout: Duration,
    user_agent: String,
}

impl HttpPageRenderer {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            timeout,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, DirectoryError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| DirectoryError::NavigationError {
                url: String::new(),
                message: format!("could not start render session: {}", e),
            })?;

        tracing::debug!("Render session opened");
        Ok(Box::new(HttpRenderSession {
            client,
            timeout: self.timeout,
        }))
    }
}

struct HttpRenderSession {
    client: Client,
    timeout: Duration,
}

impl HttpRenderSession {
    fn map_error(&self, url: &Url, e: reqwest::Error) -> DirectoryError {
        if e.is_timeout() {
            DirectoryError::RenderTimeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            DirectoryError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl RenderSession for HttpRenderSession {
    async fn load(&mut self, url: &Url) -> Result<String, DirectoryError> {
        tracing::debug!("Loading directory page: {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        tracing::debug!("Directory page status: {}", status);
        if !status.is_success() {
            return Err(DirectoryError::NavigationError {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(|e| self.map_error(url, e))
    }

    async fn close(self: Box<Self>) {
        drop(self.client);
        tracing::debug!("Render session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn renderer(timeout: Duration) -> HttpPageRenderer {
        HttpPageRenderer::new(timeout, "faculty-match-test")
    }

    #[tokio::test]
    async fn test_load_returns_page_body() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/people").header("user-agent", "faculty-match-test");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<div class=\"faculty-card\"></div>");
        });

        let url = Url::parse(&server.url("/people")).unwrap();
        let mut session = renderer(Duration::from_secs(5)).open().await.unwrap();
        let page = session.load(&url).await;
        session.close().await;

        page_mock.assert();
        assert!(page.unwrap().contains("faculty-card"));
    }

    #[tokio::test]
    async fn test_http_error_is_navigation_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let url = Url::parse(&server.url("/missing")).unwrap();
        let mut session = renderer(Duration::from_secs(5)).open().await.unwrap();
        let result = session.load(&url).await;
        session.close().await;

        assert!(matches!(result, Err(DirectoryError::NavigationError { .. })));
    }

    #[tokio::test]
    async fn test_slow_page_is_render_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(3)).body("late");
        });

        let url = Url::parse(&server.url("/slow")).unwrap();
        let mut session = renderer(Duration::from_secs(1)).open().await.unwrap();
        let result = session.load(&url).await;
        session.close().await;

        assert!(matches!(result, Err(DirectoryError::RenderTimeout { .. })));
    }
}
