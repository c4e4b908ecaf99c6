use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Token;

/// Save a serializable object to a JSON file.
pub fn save_to_file<T: Serialize>(data: &T, path: &str) -> Result<()> {
    let file =
        File::create(path).map_err(|e| anyhow!("Failed to create cache file {}: {}", path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, data)
        .map_err(|e| anyhow!("Failed to write cache to {}: {}", path, e))?;
    Ok(())
}

/// Load a deserializable object from a JSON file.
pub fn load_from_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let file =
        File::open(path).map_err(|e| anyhow!("Failed to open cache file {}: {}", path, e))?;
    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader)
        .map_err(|e| anyhow!("Failed to parse cache file {}: {}", path, e))?;
    Ok(data)
}

/// Snapshot of discovered tokens, so search works without a round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenCatalog {
    pub tokens: Vec<Token>,
    /// Unix seconds when the snapshot was taken.
    pub fetched_at: u64,
}

impl TokenCatalog {
    pub fn new(tokens: Vec<Token>) -> Self {
        let fetched_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self { tokens, fetched_at }
    }

    pub fn save(&self, path: &str) -> Result<()> {
        save_to_file(self, path)
    }

    /// Load a snapshot, dropping entries that fail validation.
    pub fn load(path: &str) -> Result<Self> {
        let mut catalog: TokenCatalog = load_from_file(path)?;
        catalog.tokens.retain(|t| t.validate().is_ok());
        Ok(catalog)
    }
}
