use crate::core::error::SourceError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A currency identifier in its canonical lower-case form.
///
/// Every raw string entering the system (configuration, query parameters,
/// rate source payload keys) goes through [`Currency::new`], so `"USD"`,
/// `" usd "` and `"usd"` are the same value and the same map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Currency {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Currency {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl FromStr for Currency {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// Deserialization normalizes too, including when the currency is a map key.
impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

/// One unit of `base` equals `rate` units of `currency` on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub date: NaiveDate,
    pub base: Currency,
    pub currency: Currency,
    pub rate: f64,
}

impl CurrencyRate {
    pub fn new(date: NaiveDate, base: Currency, currency: Currency, rate: f64) -> Self {
        Self {
            date,
            base,
            currency,
            rate,
        }
    }
}

/// An upstream feed of daily exchange rates.
///
/// Implementations return exactly one rate per requested target, each with a
/// positive rate and the requested `base` and `date`. A response missing any
/// target is an error, never a partial result.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn get_rates(
        &self,
        base: &Currency,
        targets: &[Currency],
        date: NaiveDate,
    ) -> Result<Vec<CurrencyRate>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_currency_is_case_insensitive() {
        assert_eq!(Currency::new("USD"), Currency::new("usd"));
        assert_eq!(Currency::new(" Eur "), Currency::new("eur"));
        assert_eq!(Currency::new("JPY").as_str(), "jpy");
    }

    #[test]
    fn test_currency_as_map_key() {
        let mut rates = HashMap::new();
        rates.insert(Currency::new("USD"), 1.0);

        assert_eq!(rates.get(&Currency::new("usd")), Some(&1.0));
        rates.insert(Currency::new("usd"), 2.0);
        assert_eq!(rates.len(), 1);
    }

    #[test]
    fn test_currency_deserialization_normalizes_keys() {
        let parsed: HashMap<Currency, f64> = serde_json::from_str(r#"{"EUR": 0.92}"#).unwrap();
        assert_eq!(parsed.get(&Currency::new("eur")), Some(&0.92));
    }

    #[test]
    fn test_rate_serializes_as_flat_object() {
        let rate = CurrencyRate::new(
            NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            Currency::new("USD"),
            Currency::new("EUR"),
            0.92,
        );

        let json = serde_json::to_value(&rate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2025-01-13",
                "base": "usd",
                "currency": "eur",
                "rate": 0.92
            })
        );
    }
}
