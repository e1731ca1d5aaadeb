use crate::{Error, FilterRequest, Result, ServiceConfig};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Client,
    header::{ACCEPT, CACHE_CONTROL, HeaderMap},
};
use std::time::Duration;

/// Something that turns a [`FilterRequest`] into processed image bytes.
#[async_trait]
pub trait FilterService: Send + Sync {
    async fn apply(&self, request: FilterRequest) -> Result<Bytes>;
}

#[derive(Debug, Clone)]
pub struct FilterClient {
    pub config: ServiceConfig,
    client: Client,
}

impl FilterClient {
    pub fn new(config: ServiceConfig) -> FilterClient {
        FilterClient {
            config,
            client: Client::new(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, "image/*".parse().unwrap());
        headers.insert(CACHE_CONTROL, "no-cache".parse().unwrap());
        headers
    }
}

#[async_trait]
impl FilterService for FilterClient {
    async fn apply(&self, request: FilterRequest) -> Result<Bytes> {
        let url = request.url.clone();
        let upload_size = request.image.len();
        let form = request.into_form()?;

        log::debug!("POST {url} with {upload_size} bytes");

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .multipart(form)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Request {
                url: url.clone(),
                error: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("{url} responded with {status}");
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::Request {
            url: url.clone(),
            error: e,
        })?;

        log::debug!("{url} returned {} bytes", body.len());
        Ok(body)
    }
}
