//! Async ToC fetcher wrapping reqwest.
//!
//! Fetches `{toc_base}/{kind}/{id}/toc.xml` as raw text. Retries on 5xx
//! with exponential backoff; a 404 means the manual does not exist.

use super::ManualRef;
use crate::error::TocError;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const MAX_RETRIES: u32 = 2;

/// HTTP client for the remote table of contents.
#[derive(Clone)]
pub struct TocClient {
    client: reqwest::Client,
    base: Url,
}

impl TocClient {
    /// Create a client rooted at `base` with a per-request timeout.
    pub fn new(base: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("manual-mirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self::with_client(client, base)
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client, mut base: Url) -> Self {
        // Url::join drops the last segment unless the base ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    /// URL of a manual's ToC document.
    pub fn toc_url(&self, manual: &ManualRef) -> Result<Url, TocError> {
        Ok(self
            .base
            .join(&format!("{}/{}/toc.xml", manual.kind, manual.id))?)
    }

    /// Fetch the raw ToC XML. The body is returned unparsed.
    pub async fn fetch(&self, manual: &ManualRef) -> Result<String, TocError> {
        let url = self.toc_url(manual)?;
        let mut retries = 0u32;

        loop {
            debug!("GET {url}");
            let resp = self.client.get(url.clone()).send().await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();

                    if status >= 500 && retries < MAX_RETRIES {
                        retries += 1;
                        warn!("ToC fetch returned HTTP {status}, retrying ({retries}/{MAX_RETRIES})");
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }
                    if status == 404 {
                        return Err(TocError::NotFound(manual.id.clone()));
                    }
                    if !r.status().is_success() {
                        return Err(TocError::Status {
                            manual: manual.to_string(),
                            status,
                        });
                    }

                    return r.text().await.map_err(|source| TocError::Request {
                        manual: manual.to_string(),
                        source,
                    });
                }
                Err(e) => {
                    if retries < MAX_RETRIES && !e.is_builder() {
                        retries += 1;
                        warn!("ToC fetch failed: {e}, retrying ({retries}/{MAX_RETRIES})");
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }
                    return Err(TocError::Request {
                        manual: manual.to_string(),
                        source: e,
                    });
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(250 * 2u64.pow(attempt - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual() -> ManualRef {
        "RM/RM12345".parse().unwrap()
    }

    #[test]
    fn test_toc_url_with_and_without_trailing_slash() {
        let a = TocClient::new(
            Url::parse("https://example.com/api").unwrap(),
            Duration::from_secs(5),
        );
        let b = TocClient::new(
            Url::parse("https://example.com/api/").unwrap(),
            Duration::from_secs(5),
        );
        assert_eq!(
            a.toc_url(&manual()).unwrap().as_str(),
            "https://example.com/api/RM/RM12345/toc.xml"
        );
        assert_eq!(a.toc_url(&manual()).unwrap(), b.toc_url(&manual()).unwrap());
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(250));
        assert_eq!(backoff(2), Duration::from_millis(500));
    }
}
