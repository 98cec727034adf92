//! In-memory metrics cache
//!
//! Values are stored as text under string keys. Every numeric metric has a
//! companion `<key>Height` entry; both are written through a [`CacheBatch`]
//! under a single write lock so readers never pair a value from one refresh
//! with the height from another.

use crate::error::{Result, StatsError};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Well-known cache keys
pub mod keys {
    pub const SUPPLY: &str = "supply";
    pub const SUPPLY_HEIGHT: &str = "supplyHeight";
    pub const INFLATION: &str = "inflation";
    pub const INFLATION_HEIGHT: &str = "inflationHeight";
    pub const ALL_TOKENS_SUPPLY: &str = "allTokensSupply";
    pub const CUDOS_NETWORK_TOTAL_SUPPLY: &str = "cudosNetworkTotalSupply";
    pub const APR: &str = "apr";
    pub const APR_HEIGHT: &str = "aprHeight";
    pub const ANNUAL_PROVISIONS: &str = "annualProvisions";
}

/// Companion height key of a metric
pub fn height_key(key: &str) -> String {
    format!("{}Height", key)
}

/// A metric value together with the height it was computed at
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricEntry {
    pub key: String,
    pub value: String,
    pub height: i64,
}

/// Set of writes applied atomically by [`MetricsCache::commit`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheBatch {
    entries: Vec<(String, String)>,
}

impl CacheBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value plus its `<key>Height` companion
    pub fn metric(mut self, key: &str, value: impl ToString, height: i64) -> Self {
        self.entries.push((key.to_string(), value.to_string()));
        self.entries.push((height_key(key), height.to_string()));
        self
    }

    /// Plain value without a height
    pub fn value(mut self, key: &str, value: impl ToString) -> Self {
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keyed store shared between the refresh pipelines and the HTTP handlers
#[derive(Debug, Default)]
pub struct MetricsCache {
    values: RwLock<HashMap<String, String>>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: impl ToString) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Result<String> {
        self.values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StatsError::NotFound(key.to_string()))
    }

    pub fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|_| default.to_string())
    }

    pub fn set_int(&self, key: &str, value: i64) {
        self.set(key, value);
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        let raw = self.get(key)?;
        raw.parse().map_err(|_| StatsError::InvalidCachedValue {
            key: key.to_string(),
            value: raw,
        })
    }

    /// Write several keys in one critical section
    pub fn set_many<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = self.values.write();
        for (key, value) in entries {
            values.insert(key.into(), value.into());
        }
    }

    /// Read several keys from one consistent view
    pub fn get_many(&self, keys: &[&str]) -> Result<Vec<String>> {
        let values = self.values.read();
        keys.iter()
            .map(|key| {
                values
                    .get(*key)
                    .cloned()
                    .ok_or_else(|| StatsError::NotFound(key.to_string()))
            })
            .collect()
    }

    /// Apply a batch atomically
    pub fn commit(&self, batch: CacheBatch) {
        self.set_many(batch.entries);
    }

    /// Value and height of a metric, read together
    pub fn metric(&self, key: &str) -> Result<MetricEntry> {
        let height_key = height_key(key);
        let mut pair = self.get_many(&[key, height_key.as_str()])?.into_iter();
        let (value, height) = match (pair.next(), pair.next()) {
            (Some(value), Some(height)) => (value, height),
            _ => return Err(StatsError::NotFound(key.to_string())),
        };
        let height = height.parse().map_err(|_| StatsError::InvalidCachedValue {
            key: height_key.clone(),
            value: height,
        })?;

        Ok(MetricEntry {
            key: key.to_string(),
            value,
            height,
        })
    }

    /// Ordered copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}
