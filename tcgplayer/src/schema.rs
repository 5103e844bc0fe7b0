use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumString};

pub const PAGE_SIZE: u32 = 25;

/// Value of `nextPage` that means another page exists. Anything else ends
/// the pagination.
const NEXT_PAGE_YES: &str = "Yes";

#[derive(Serialize, Deserialize, Display, EnumString, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListingType {
    #[default]
    All,
    ListingWithPhotos,
    ListingWithoutPhotos,
}

/// Body of one `latestsales` POST.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesRequest {
    pub listing_type: ListingType,
    pub offset: u32,
    pub limit: u32,
    /// Milliseconds since the epoch at send time. The server uses it for cache
    /// busting only.
    pub time: i64,
}

impl SalesRequest {
    pub fn page(listing_type: ListingType, page: u32) -> Self {
        Self {
            listing_type,
            offset: page * PAGE_SIZE,
            limit: PAGE_SIZE,
            time: now_millis(),
        }
    }
}

fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// One completed order, kept exactly as the server sent it. Nulls, number
/// formatting and fields of unexpected types all survive a save.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Sale(Map<String, Value>);

impl Sale {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    pub fn order_date(&self) -> Option<&str> {
        self.get("orderDate").and_then(Value::as_str)
    }

    pub fn purchase_price(&self) -> Option<f64> {
        self.get("purchasePrice").and_then(Value::as_f64)
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SalesPage {
    pub data: Vec<Sale>,
    pub next_page: Value,
}

impl SalesPage {
    pub fn has_next(&self) -> bool {
        self.next_page.as_str() == Some(NEXT_PAGE_YES)
    }
}

/// Stored form of a product's complete sales history.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct SalesHistory {
    pub sales: Vec<Sale>,
}

impl SalesHistory {
    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CatalogEntry {
    #[serde(rename = "productID", default)]
    pub product_id: Option<Value>,
    #[serde(flatten)]
    pub remaining: Map<String, Value>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CatalogResponse {
    pub result: Vec<CatalogEntry>,
}

/// A set's card listing: the raw body for archiving next to the sales, and
/// the parsed entries.
#[derive(Debug)]
pub struct Catalog {
    pub raw: Value,
    pub entries: Vec<CatalogEntry>,
}
