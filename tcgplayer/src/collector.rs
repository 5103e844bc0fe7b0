use crate::config::Config;
use crate::rate_limiter::DelayPolicy;
use crate::schema::{Sale, SalesHistory};
use crate::{Error, HttpClient, ProductId, Result};
use tokio_util::sync::CancellationToken;

/// Walks a product's `latestsales` pages until the server says there are no
/// more, or the caller's page cap is hit.
#[derive(Clone)]
pub struct SalesCollector {
    client: HttpClient,
    delay: DelayPolicy,
    first_page: u32,
    cancel: CancellationToken,
}

/// What was gathered before a collection failed, together with the failure.
#[derive(Debug)]
pub struct PartialHistory {
    pub history: SalesHistory,
    pub error: Option<Error>,
}

impl SalesCollector {
    pub fn new(client: HttpClient, config: &Config) -> Self {
        Self {
            client,
            delay: config.delay,
            first_page: config.first_page,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validates a caller supplied id before touching the network.
    pub async fn collect_sales_for(
        &self,
        raw_id: &str,
        page_cap: Option<u32>,
    ) -> Result<SalesHistory> {
        let id = ProductId::parse(raw_id)?;
        self.collect_sales(&id, page_cap).await
    }

    /// Returns every sale in the order the pages arrived. Any page failure
    /// (after the client's retries) discards the partial result.
    pub async fn collect_sales(
        &self,
        id: &ProductId,
        page_cap: Option<u32>,
    ) -> Result<SalesHistory> {
        let mut sales = Vec::new();
        self.collect_into(id, page_cap, &mut sales).await?;
        Ok(SalesHistory { sales })
    }

    /// Like [`collect_sales`](Self::collect_sales) but keeps the pages that
    /// were fetched before a failure.
    pub async fn collect_sales_partial(
        &self,
        id: &ProductId,
        page_cap: Option<u32>,
    ) -> PartialHistory {
        let mut sales = Vec::new();
        let error = self.collect_into(id, page_cap, &mut sales).await.err();
        if let Some(e) = &error {
            log::error!(
                "Collecting sales for {id} stopped after {} records: {e}",
                sales.len()
            );
        }

        PartialHistory {
            history: SalesHistory { sales },
            error,
        }
    }

    async fn collect_into(
        &self,
        id: &ProductId,
        page_cap: Option<u32>,
        sales: &mut Vec<Sale>,
    ) -> Result<()> {
        let mut page = self.first_page;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let response = self.client.fetch_sales_page(id, page).await?;
            let has_next = response.has_next();
            sales.extend(response.data);

            // The cap is compared against the raw page number, not the number
            // of pages fetched so far.
            if !has_next || page_cap == Some(page) {
                log::debug!(
                    "Product {id}: {} sales over pages {}..={page}",
                    sales.len(),
                    self.first_page
                );
                return Ok(());
            }

            self.delay.wait(&self.cancel).await?;
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PAGE_SIZE;
    use crate::transport::FakeTransport;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            sales_base_url: "http://sales.test".into(),
            delay: DelayPolicy::fixed(Duration::from_millis(1)).unwrap(),
            max_retries: 0,
            retry_backoff: Duration::from_millis(1),
            ..Config::default()
        }
    }

    fn collector(transport: &Arc<FakeTransport>, config: &Config) -> SalesCollector {
        SalesCollector::new(HttpClient::with_transport(transport.clone(), config), config)
    }

    fn page_number(body: Option<&Value>) -> u64 {
        body.unwrap()["offset"].as_u64().unwrap() / PAGE_SIZE as u64
    }

    /// Two sales per page, titled after the page they came from.
    fn page(page: u64, next: &str) -> Value {
        json!({
            "data": [
                {"title": format!("p{page}-a"), "purchasePrice": 1.5},
                {"title": format!("p{page}-b"), "purchasePrice": 2.5},
            ],
            "nextPage": next,
        })
    }

    fn titles(history: &SalesHistory) -> Vec<String> {
        history
            .sales
            .iter()
            .map(|s| s.title().unwrap().to_string())
            .collect()
    }

    fn id() -> ProductId {
        ProductId::parse("527404").unwrap()
    }

    #[tokio::test]
    async fn single_page_when_server_says_no() {
        let transport = Arc::new(FakeTransport::new(|_, body| Ok(page(page_number(body), "No"))));

        let history = collector(&transport, &test_config())
            .collect_sales(&id(), None)
            .await
            .unwrap();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(titles(&history), ["p1-a", "p1-b"]);
    }

    #[tokio::test]
    async fn follows_next_page_until_exhausted() {
        let k = 3;
        let transport = Arc::new(FakeTransport::new(move |_, body| {
            let n = page_number(body);
            Ok(page(n, if n <= k { "Yes" } else { "No" }))
        }));

        let history = collector(&transport, &test_config())
            .collect_sales(&id(), None)
            .await
            .unwrap();

        assert_eq!(transport.request_count(), k as usize + 1);
        assert_eq!(
            titles(&history),
            ["p1-a", "p1-b", "p2-a", "p2-b", "p3-a", "p3-b", "p4-a", "p4-b"]
        );
    }

    #[tokio::test]
    async fn page_cap_stops_when_page_number_matches() {
        let transport = Arc::new(FakeTransport::new(|_, body| Ok(page(page_number(body), "Yes"))));

        let history = collector(&transport, &test_config())
            .collect_sales(&id(), Some(4))
            .await
            .unwrap();

        let pages: Vec<u64> = transport
            .requests()
            .iter()
            .map(|(_, body)| page_number(body.as_ref()))
            .collect();
        assert_eq!(pages, [1, 2, 3, 4]);
        assert_eq!(history.len(), 8);
    }

    #[tokio::test]
    async fn page_cap_of_one_fetches_only_the_first_page() {
        let transport = Arc::new(FakeTransport::new(|_, body| Ok(page(page_number(body), "Yes"))));

        collector(&transport, &test_config())
            .collect_sales(&id(), Some(1))
            .await
            .unwrap();

        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn first_request_skips_the_most_recent_page() {
        let transport = Arc::new(FakeTransport::new(|_, _| Ok(json!({"data": [], "nextPage": "No"}))));

        collector(&transport, &test_config())
            .collect_sales(&id(), None)
            .await
            .unwrap();

        let body = transport.requests()[0].1.clone().unwrap();
        // Records [0, 25) are never requested.
        assert_eq!(body["offset"], 25);
        assert_eq!(body["limit"], 25);
        assert_eq!(body["listingType"], "All");
    }

    #[tokio::test]
    async fn first_page_can_be_moved_to_zero() {
        let transport = Arc::new(FakeTransport::new(|_, _| Ok(json!({"data": [], "nextPage": "No"}))));
        let config = Config {
            first_page: 0,
            ..test_config()
        };

        collector(&transport, &config)
            .collect_sales(&id(), None)
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].1.as_ref().unwrap()["offset"], 0);
    }

    #[tokio::test]
    async fn invalid_identifier_makes_no_request() {
        let transport = Arc::new(FakeTransport::new(|_, body| Ok(page(page_number(body), "No"))));
        let collector = collector(&transport, &test_config());

        for raw in ["12A456", "1234567", ""] {
            assert!(matches!(
                collector.collect_sales_for(raw, None).await,
                Err(Error::InvalidIdentifier(_))
            ));
        }
        assert_eq!(transport.request_count(), 0);

        assert!(collector.collect_sales_for("123456", None).await.is_ok());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn failure_propagates_or_keeps_partial_pages() {
        let transport = Arc::new(FakeTransport::new(|_, body| match page_number(body) {
            1 => Ok(page(1, "Yes")),
            _ => Err(Error::Response(StatusCode::SERVICE_UNAVAILABLE, String::new())),
        }));
        let collector = collector(&transport, &test_config());

        assert!(matches!(
            collector.collect_sales(&id(), None).await,
            Err(Error::Response(StatusCode::SERVICE_UNAVAILABLE, _))
        ));

        let partial = collector.collect_sales_partial(&id(), None).await;
        assert_eq!(titles(&partial.history), ["p1-a", "p1-b"]);
        assert!(partial.error.unwrap().is_transport());
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_page_requests() {
        let sent_at = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = sent_at.clone();
        let transport = Arc::new(FakeTransport::new(move |_, body| {
            record.lock().unwrap().push(tokio::time::Instant::now());
            let n = page_number(body);
            Ok(page(n, if n < 3 { "Yes" } else { "No" }))
        }));
        let config = Config {
            delay: DelayPolicy::fixed(Duration::from_secs(5)).unwrap(),
            ..test_config()
        };
        let start = tokio::time::Instant::now();

        let history = collector(&transport, &config)
            .collect_sales(&id(), None)
            .await
            .unwrap();

        assert_eq!(history.len(), 6);
        let sent_at = sent_at.lock().unwrap();
        assert_eq!(sent_at.len(), 3);
        for pair in sent_at.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(5));
        }
        // No delay after the last page.
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(15));
    }

    #[tokio::test]
    async fn cancelled_before_start_sends_nothing() {
        let transport = Arc::new(FakeTransport::new(|_, body| Ok(page(page_number(body), "Yes"))));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = collector(&transport, &test_config())
            .with_cancellation(cancel)
            .collect_sales(&id(), None)
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_stops_at_the_next_page_boundary() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let transport = Arc::new(FakeTransport::new(move |_, body| {
            let n = page_number(body);
            trigger.cancel();
            Ok(page(n, "Yes"))
        }));
        let config = Config {
            delay: DelayPolicy::fixed(Duration::from_secs(60)).unwrap(),
            ..test_config()
        };

        let partial = collector(&transport, &config)
            .with_cancellation(cancel.clone())
            .collect_sales_partial(&id(), None)
            .await;

        // The 60s page delay is cut short and page 2 is never requested.
        assert!(matches!(partial.error, Some(Error::Cancelled)));
        assert_eq!(transport.request_count(), 1);
        assert_eq!(partial.history.len(), 2);
    }
}
