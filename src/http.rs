//! Remote user lookups against the Kick REST API.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use crate::error::{KickError, Result};
use crate::models::User;
use crate::resolver::UserFetcher;

#[derive(Debug, Clone)]
pub struct HttpUserFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/api/v2/channels/{slug}`, with the slug percent-encoded as a
    /// single path segment.
    fn channel_url(&self, slug: &str) -> Result<Url> {
        let invalid_base = || {
            KickError::Configuration(format!("invalid API base URL: {}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .extend(["api", "v2", "channels", slug]);
        Ok(url)
    }
}

#[async_trait]
impl UserFetcher for HttpUserFetcher {
    async fn fetch_user(&self, slug: &str) -> Result<User> {
        let url = self.channel_url(slug)?;
        tracing::debug!(
            target: "kick::http::fetch_user",
            "Fetching user {} from {}",
            slug,
            url
        );

        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(KickError::NotFound {
                slug: slug.to_string(),
            }),
            status if !status.is_success() => Err(KickError::RequestFailed(format!(
                "GET {} returned {}",
                url, status
            ))),
            _ => {
                let body: serde_json::Value = response.json().await?;
                User::try_from(body)
            }
        }
    }
}
