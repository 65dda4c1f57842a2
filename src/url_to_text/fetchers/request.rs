use crate::config::FetchConfig;
use crate::error::IngestError;
use reqwest::Client;
use std::time::Duration;

/// Plain HTTP page fetcher, used when rendering fails
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, IngestError> {
        Self::new(Duration::from_secs(config.timeout), &config.user_agent)
    }

    pub async fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Fetch(format!("unexpected HTTP status: {}", status)));
        }
        let html = response.text().await?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_html() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipe")
            .match_header("user-agent", "TestAgent/1.0")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body>Soup</body></html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(Duration::from_secs(5), "TestAgent/1.0").unwrap();
        let html = fetcher
            .fetch(&format!("{}/recipe", server.url()))
            .await
            .unwrap();
        assert!(html.contains("Soup"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = RequestFetcher::from_config(&FetchConfig::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Fetch(ref msg) if msg.contains("404")));
    }
}
