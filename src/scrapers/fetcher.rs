use crate::error::ScrapeError;
use crate::scrapers::headers::browser_headers;
use crate::scrapers::traits::PageSource;
use crate::scrapers::types::{FetchConfig, SearchParams};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

/// Live fetcher for the search-results page
pub struct ListingFetcher {
    client: Client,
    config: FetchConfig,
    params: SearchParams,
}

impl ListingFetcher {
    /// Create a fetcher for the configured search area
    pub fn new(config: FetchConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(ScrapeError::Client)?;
        let params = SearchParams::for_area(&config.area);

        Ok(Self {
            client,
            config,
            params,
        })
    }

    /// Fetch the results page, retrying failed requests up to `max_retries` times.
    ///
    /// A status other than 200 is returned as [`ScrapeError::Blocked`] once the
    /// attempts run out; callers treat it as the end of the run.
    pub async fn fetch_page(&self) -> Result<String, ScrapeError> {
        info!("Fetching site data...");

        let mut attempt: u32 = 0;
        loop {
            match self.try_fetch().await {
                Ok(html) => return Ok(html),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff
                        .saturating_mul(1u32 << attempt.min(16));
                    attempt += 1;
                    warn!(
                        "Attempt {} of {} failed: {}. Retrying in {:?}",
                        attempt,
                        self.config.max_retries + 1,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_fetch(&self) -> Result<String, ScrapeError> {
        let query = self.params.query_pairs()?;
        debug!("Fetching URL: {}", self.config.search_url);

        let response = self
            .client
            .get(&self.config.search_url)
            .headers(browser_headers())
            .query(&query)
            .send()
            .await
            .map_err(ScrapeError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Something went wrong. HTTP status code: {}", status);
            warn!("This could be the site's captcha service detecting suspicious activity");
            return Err(ScrapeError::Blocked { status });
        }

        info!("{} Success", status);
        let html = response.text().await.map_err(ScrapeError::Transport)?;
        debug!("Downloaded {} bytes of HTML", html.len());

        Ok(html)
    }
}

#[async_trait]
impl PageSource for ListingFetcher {
    async fn load_page(&self) -> Result<String, ScrapeError> {
        self.fetch_page().await
    }

    fn source_name(&self) -> &'static str {
        "live"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers one connection per canned response and records each request head.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for (code, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).into_owned());

                let reply = format!(
                    "HTTP/1.1 {} Canned\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    code,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("http://{}/homes/for_sale/", addr), requests)
    }

    fn config_for(url: String, max_retries: u32) -> FetchConfig {
        FetchConfig {
            search_url: url,
            timeout: Duration::from_secs(5),
            max_retries,
            retry_backoff: Duration::from_millis(10),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn returns_body_on_200() {
        let (url, requests) = serve(vec![(200, "<ul class=\"photo-cards\"></ul>")]).await;
        let fetcher = ListingFetcher::new(config_for(url, 0)).unwrap();

        let html = fetcher.fetch_page().await.unwrap();

        assert_eq!(html, "<ul class=\"photo-cards\"></ul>");
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let head = requests[0].to_lowercase();
        assert!(head.starts_with("get /homes/for_sale/?searchquerystate="));
        assert!(head.contains("sec-fetch-user: 71"));
        assert!(head.contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test]
    async fn non_200_is_blocked_without_retry() {
        let (url, requests) = serve(vec![(403, "captcha")]).await;
        let fetcher = ListingFetcher::new(config_for(url, 0)).unwrap();

        let err = fetcher.fetch_page().await.unwrap_err();

        assert!(matches!(err, ScrapeError::Blocked { status } if status == StatusCode::FORBIDDEN));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_success_codes_are_not_200() {
        let (url, _) = serve(vec![(202, "queued")]).await;
        let fetcher = ListingFetcher::new(config_for(url, 0)).unwrap();

        let err = fetcher.fetch_page().await.unwrap_err();

        assert!(matches!(err, ScrapeError::Blocked { status } if status == StatusCode::ACCEPTED));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let (url, requests) = serve(vec![(503, "busy"), (200, "ok")]).await;
        let fetcher = ListingFetcher::new(config_for(url, 1)).unwrap();

        let html = fetcher.fetch_page().await.unwrap();

        assert_eq!(html, "ok");
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn persistent_block_aborts_after_retries() {
        let (url, requests) = serve(vec![(403, "no"), (403, "no"), (403, "no")]).await;
        let fetcher = ListingFetcher::new(config_for(url, 2)).unwrap();

        let err = fetcher.fetch_page().await.unwrap_err();

        assert!(matches!(err, ScrapeError::Blocked { .. }));
        assert_eq!(requests.lock().unwrap().len(), 3);
    }
}
