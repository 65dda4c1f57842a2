pub mod fetchers;
pub mod html;

pub use html::PageSummary;

use crate::config::{BrowserConfig, FetchConfig};
use crate::error::IngestError;
use fetchers::{ChromeFetcher, RequestFetcher};
use log::{debug, warn};

/// Loads page HTML: headless render first, plain HTTP as the fallback
pub struct PageLoader {
    browser: BrowserConfig,
    request: RequestFetcher,
}

impl PageLoader {
    pub fn new(browser: BrowserConfig, fetch: &FetchConfig) -> Result<Self, IngestError> {
        Ok(Self {
            browser,
            request: RequestFetcher::from_config(fetch)?,
        })
    }

    /// Fetch the HTML of `url`.
    ///
    /// Without a browser binary this fails with
    /// [`IngestError::BrowserUnavailable`] and no HTTP request is made. When
    /// every render attempt fails the page is fetched over plain HTTP; if that
    /// fails as well the error names both failures.
    pub async fn load(&self, url: &str) -> Result<String, IngestError> {
        // Located per call so a browser installed after startup is picked up
        let chrome = ChromeFetcher::from_config(&self.browser)?;
        debug!("Rendering {} with {}", url, chrome.binary().display());

        let render_error = match chrome.fetch(url).await {
            Ok(html) => return Ok(html),
            Err(e) => e,
        };

        warn!("Rendering {} failed, falling back to HTTP: {}", url, render_error);
        self.request.fetch(url).await.map_err(|fetch_error| {
            IngestError::Fetch(format!(
                "render failed: {}; http fallback failed: {}",
                render_error, fetch_error
            ))
        })
    }
}
