use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove_item(&mut self, key: &str);
}

#[derive(Debug)]
pub enum StoreError {
    QuotaExceeded { key: String, needed: usize, quota: usize },
    Serialize(serde_json::Error),
    Corrupt { key: String, source: serde_json::Error },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded { key, needed, quota } => write!(
                f,
                "storage quota exceeded writing `{key}`: {needed} bytes needed, quota is {quota}"
            ),
            Self::Serialize(err) => write!(f, "failed to serialize record: {err}"),
            Self::Corrupt { key, source } => write!(f, "record `{key}` is unreadable: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::QuotaExceeded { .. } => None,
            Self::Serialize(err) => Some(err),
            Self::Corrupt { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryKv {
    records: BTreeMap<String, String>,
    #[serde(skip)]
    quota: Option<usize>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn records(&self) -> &BTreeMap<String, String> {
        &self.records
    }

    pub fn used_bytes(&self) -> usize {
        self.records
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryKv {
    fn get_item(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let current = self
                .records
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let needed = self.used_bytes() - current + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        self.records.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        self.records.remove(key);
    }
}
