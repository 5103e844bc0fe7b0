use crate::config::Config;
use crate::id::validate_set_id;
use crate::schema::{Catalog, CatalogResponse, ListingType, SalesPage, SalesRequest};
use crate::transport::{HttpTransport, Transport};
use crate::{Error, ProductId, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const CATALOG_ROWS: u32 = 5000;

#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    sales_base_url: String,
    catalog_base_url: String,
    mpfev: String,
    listing_type: ListingType,
    max_retries: u32,
    retry_backoff: Duration,
    cancel: CancellationToken,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout, config.user_agent.as_deref())?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            sales_base_url: config.sales_base_url.trim_end_matches('/').to_string(),
            catalog_base_url: config.catalog_base_url.trim_end_matches('/').to_string(),
            mpfev: config.mpfev.clone(),
            listing_type: config.listing_type,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
            cancel: CancellationToken::new(),
        }
    }

    /// Lets retry backoff be cut short when the run is shut down.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn sales_url(&self, id: &ProductId) -> String {
        format!(
            "{}/v2/product/{id}/latestsales?mpfev={}",
            self.sales_base_url, self.mpfev
        )
    }

    fn catalog_url(&self, set_id: &str) -> String {
        format!(
            "{}/priceguide/set/{set_id}/cards/?rows={CATALOG_ROWS}",
            self.catalog_base_url
        )
    }

    /// Fetches one page of a product's latest sales. The request body, and
    /// with it the timestamp, is rebuilt for every attempt.
    pub async fn fetch_sales_page(&self, id: &ProductId, page: u32) -> Result<SalesPage> {
        let url = self.sales_url(id);
        let url = url.as_str();

        self.with_retry(url, move || async move {
            let body = serde_json::to_value(SalesRequest::page(self.listing_type, page))?;
            log::debug!("POST {url} offset {}", body["offset"]);
            decode(self.transport.post_json(url, &body).await?)
        })
        .await
    }

    pub async fn fetch_catalog(&self, set_id: &str) -> Result<Catalog> {
        let url = self.catalog_url(validate_set_id(set_id)?);
        let url = url.as_str();

        let raw = self
            .with_retry(url, move || async move {
                log::debug!("GET {url}");
                self.transport.get_json(url).await
            })
            .await?;

        let entries = CatalogResponse::deserialize(&raw)
            .map_err(|e| Error::MalformedResponse(format!("catalog for set {set_id}: {e}")))?
            .result;

        Ok(Catalog { raw, entries })
    }

    async fn with_retry<R, F, T>(&self, url: &str, request: R) -> Result<T>
    where
        R: Fn() -> F,
        F: Future<Output = Result<T>>,
    {
        let mut backoff = self.retry_backoff;
        let mut attempt = 0;

        loop {
            match request().await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Request to {url} failed ({e}). Retry {attempt}/{} in {backoff:?}",
                        self.max_retries
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                        _ = sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2);
                }
                result => return result,
            }
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(&value).map_err(|e| Error::MalformedResponse(e.to_string()))
}
