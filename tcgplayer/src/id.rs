use crate::{Error, Result};
use derive_more::{Deref, Display, Into};
use serde_json::Value;
use std::str::FromStr;

const PRODUCT_ID_WIDTH: usize = 6;

/// A TCGPlayer product id in its canonical decimal form, as it appears in
/// the `latestsales` URL path.
#[derive(Clone, Debug, Display, Deref, Into, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductId(String);

impl ProductId {
    /// Validates a caller-supplied id. Only six ASCII digits are accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() == PRODUCT_ID_WIDTH && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::InvalidIdentifier(raw.to_string()))
        }
    }

    /// Coerces a catalog `productID` value (integer or numeric string).
    ///
    /// Catalog ids are not held to the six digit width; anything that is not
    /// a non-negative integer is rejected with a human readable reason.
    pub(crate) fn from_catalog_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(|n| Self(n.to_string()))
                .ok_or_else(|| format!("productID {n} is not a non-negative integer")),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(format!("productID {s:?} is not numeric"));
                }
                // Leading zeros are dropped so "0527404" and 527404 are one id.
                s.parse::<u64>()
                    .map(|n| Self(n.to_string()))
                    .map_err(|e| format!("productID {s:?} is out of range: {e}"))
            }
            Value::Null => Err("productID is null".to_string()),
            other => Err(format!("productID has unsupported type: {other}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProductId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s.trim())
    }
}

/// Set ids end up in URLs and directory names, so they must be plain digits.
pub(crate) fn validate_set_id(set_id: &str) -> Result<&str> {
    if !set_id.is_empty() && set_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(set_id)
    } else {
        Err(Error::InvalidIdentifier(set_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_six_digit_ids() {
        let id = ProductId::parse("123456").unwrap();
        assert_eq!(id.as_str(), "123456");
        assert_eq!(id.to_string(), "123456");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["12A456", "1234567", "", "12345", " 123456", "１２３４５６"] {
            match ProductId::parse(raw) {
                Err(Error::InvalidIdentifier(s)) => assert_eq!(s, raw),
                other => panic!("expected InvalidIdentifier for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_str_trims_whitespace() {
        let id: ProductId = " 527404\n".parse().unwrap();
        assert_eq!(id.as_str(), "527404");
    }

    #[test]
    fn coerces_catalog_values() {
        assert_eq!(
            ProductId::from_catalog_value(&json!(527404)).unwrap().as_str(),
            "527404"
        );
        assert_eq!(
            ProductId::from_catalog_value(&json!("88")).unwrap().as_str(),
            "88"
        );
        assert!(ProductId::from_catalog_value(&json!(-1)).is_err());
        assert!(ProductId::from_catalog_value(&json!(1.5)).is_err());
        assert!(ProductId::from_catalog_value(&json!("")).is_err());
        assert!(ProductId::from_catalog_value(&json!(null)).is_err());
        assert!(ProductId::from_catalog_value(&json!(true)).is_err());
    }

    #[test]
    fn numeric_strings_are_normalised() {
        let from_int = ProductId::from_catalog_value(&json!(527404)).unwrap();
        let padded = ProductId::from_catalog_value(&json!(" 0527404")).unwrap();

        assert_eq!(padded, from_int);
        assert_eq!(
            ProductId::from_catalog_value(&json!("000")).unwrap().as_str(),
            "0"
        );
        assert!(ProductId::from_catalog_value(&json!("+527404")).is_err());
        assert!(ProductId::from_catalog_value(&json!("99999999999999999999999")).is_err());
    }

    #[test]
    fn set_ids_must_be_digits() {
        assert_eq!(validate_set_id("23228").unwrap(), "23228");
        assert!(validate_set_id("../etc").is_err());
        assert!(validate_set_id("").is_err());
    }
}
