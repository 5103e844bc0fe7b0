use crate::config::{Config, Target};
use crate::lister::extract_ids;
use crate::store::JsonFileStore;
use crate::{Error, HttpClient, ProductId, Result, SalesCollector};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// Directory used for runs over an explicit id list rather than a set.
const PRODUCTS_DIR: &str = "products";

/// Outcome of a batch run, one entry per product.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Product and number of sales stored for it.
    pub succeeded: Vec<(ProductId, usize)>,
    pub failed: Vec<(ProductId, String)>,
    pub cancelled: Vec<ProductId>,
}

impl BatchReport {
    fn record(&mut self, id: ProductId, result: Result<usize>) {
        match result {
            Ok(count) => self.succeeded.push((id, count)),
            Err(Error::Cancelled) => self.cancelled.push(id),
            Err(e) => self.failed.push((id, e.to_string())),
        }
    }

    fn sort(&mut self) {
        self.succeeded.sort();
        self.failed.sort();
        self.cancelled.sort();
    }

    pub fn total_sales(&self) -> usize {
        self.succeeded.iter().map(|(_, count)| count).sum()
    }

    pub fn log_summary(&self) {
        log::info!(
            "Stored {} sales for {} products",
            self.total_sales(),
            self.succeeded.len()
        );

        if !self.failed.is_empty() {
            let ids: Vec<&str> = self.failed.iter().map(|(id, _)| id.as_str()).collect();
            log::warn!("Failed to collect {} products: {}", ids.len(), ids.join(", "));
        }

        if !self.cancelled.is_empty() {
            log::warn!("Run was cancelled before {} products", self.cancelled.len());
        }
    }
}

pub struct Updater {
    client: HttpClient,
    collector: SalesCollector,
    store: JsonFileStore,
    page_cap: Option<u32>,
    concurrency: usize,
}

impl Updater {
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self> {
        Ok(Self::with_client(HttpClient::new(config)?, config, cancel))
    }

    pub fn with_client(client: HttpClient, config: &Config, cancel: CancellationToken) -> Self {
        let client = client.with_cancellation(cancel.clone());
        let collector = SalesCollector::new(client.clone(), config).with_cancellation(cancel);

        Self {
            client,
            collector,
            store: JsonFileStore::new(&config.output_dir),
            page_cap: config.page_cap,
            concurrency: config.concurrency.max(1),
        }
    }

    pub async fn sync(&self, target: &Target) -> Result<BatchReport> {
        match target {
            Target::Set(set_id) => self.sync_set(set_id).await,
            Target::Products(ids) => Ok(self
                .sync_ids(ids.iter().cloned(), &self.store.subdir(PRODUCTS_DIR))
                .await),
        }
    }

    /// Fetches a set's catalog, archives it, and collects every product in it.
    /// Only catalog problems fail the call; product failures end up in the
    /// report.
    pub async fn sync_set(&self, set_id: &str) -> Result<BatchReport> {
        let catalog = self.client.fetch_catalog(set_id).await?;
        let store = self.store.subdir(set_id);
        store.save_catalog(&catalog.raw).await?;

        let ids = extract_ids(&catalog.entries)?;
        log::info!("Set {set_id}: {} products to collect", ids.len());

        Ok(self.sync_ids(ids, &store).await)
    }

    pub async fn sync_ids<I>(&self, ids: I, store: &JsonFileStore) -> BatchReport
    where
        I: IntoIterator<Item = ProductId>,
    {
        let outcomes = futures::stream::iter(ids)
            .map(|id| async move {
                let result = self.sync_product(&id, store).await;
                (id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut report = BatchReport::default();
        for (id, result) in outcomes {
            report.record(id, result);
        }
        report.sort();
        report
    }

    async fn sync_product(&self, id: &ProductId, store: &JsonFileStore) -> Result<usize> {
        match self.collector.collect_sales(id, self.page_cap).await {
            Ok(history) => {
                store.save_sales(id, &history).await?;
                log::info!("Product {id}: stored {} sales", history.len());
                Ok(history.len())
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                log::error!("Failed to collect sales for product {id}: {e}");
                Err(e)
            }
        }
    }
}
