use crate::schema::CatalogEntry;
use crate::{Error, ProductId, Result};
use std::collections::BTreeSet;

/// Collects the distinct product ids of a catalog listing.
///
/// Fails fast: the first entry without a usable `productID` aborts the whole
/// extraction with [`Error::MalformedCatalogEntry`], so a partially broken
/// catalog never yields a plausible looking but incomplete id set.
pub fn extract_ids(entries: &[CatalogEntry]) -> Result<BTreeSet<ProductId>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let value = entry
                .product_id
                .as_ref()
                .ok_or_else(|| Error::MalformedCatalogEntry {
                    index,
                    reason: "missing productID".to_string(),
                })?;

            ProductId::from_catalog_value(value)
                .map_err(|reason| Error::MalformedCatalogEntry { index, reason })
        })
        .collect()
}
