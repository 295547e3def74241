use crate::{error::StudiaError, retry::RetryPolicy};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::PathBuf,
    sync::{Arc, Mutex},
};
use toml::value::Table;

/// Global static variable to hold the config provider.
pub static CONFIG_PROVIDER: OnceCell<Mutex<Arc<dyn StudiaConfigProvider>>> = OnceCell::new();

/// Tuning for the keyed resource cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct CacheRecord {
    /// Seconds before a cached entry is treated as stale; `None` disables
    /// staleness checks.
    pub ttl_seconds: Option<u64>,
}

#[uniffi::export(with_foreign)]
pub trait StudiaConfigProvider: Send + Sync {
    fn get_retry(&self) -> Result<RetryPolicy, StudiaError>;
    fn set_retry(&self, policy: RetryPolicy) -> Result<(), StudiaError>;
    fn get_cache(&self) -> Result<CacheRecord, StudiaError>;
    fn set_cache(&self, cache: CacheRecord) -> Result<(), StudiaError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    fn read_table(&self) -> Result<Table, StudiaError> {
        if !self.path.exists() {
            return Ok(Table::new());
        }
        let content = read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn write_section<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StudiaError> {
        let mut table = self.read_table()?;
        table.insert(key.to_string(), toml::Value::try_from(value)?);
        write(&self.path, toml::to_string(&table)?)?;
        Ok(())
    }
}

impl StudiaConfigProvider for TomlConfigProvider {
    fn get_retry(&self) -> Result<RetryPolicy, StudiaError> {
        tracing::debug!("Attempting to read retry policy from: {:?}", &self.path);
        let table = self.read_table()?;
        match table.get("retry") {
            Some(value) => Ok(value.clone().try_into()?),
            None => {
                tracing::debug!("No retry section in config, using defaults.");
                Ok(RetryPolicy::default())
            }
        }
    }

    fn set_retry(&self, policy: RetryPolicy) -> Result<(), StudiaError> {
        tracing::debug!("Attempting to write retry policy to: {:?}", &self.path);
        self.write_section("retry", &policy)
    }

    fn get_cache(&self) -> Result<CacheRecord, StudiaError> {
        let table = self.read_table()?;
        match table.get("cache") {
            Some(value) => Ok(value.clone().try_into()?),
            None => Err(StudiaError::NotFound("cache not found in config".to_string())),
        }
    }

    fn set_cache(&self, cache: CacheRecord) -> Result<(), StudiaError> {
        self.write_section("cache", &cache)
    }
}
