use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::inventory::InventoryRecord;

/// File-backed record store: one pretty-printed JSON array per file.
///
/// Every operation reads the whole file and writes it back; a missing or
/// empty file behaves as an empty list. No durability guarantees beyond
/// what a plain file write offers.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record and return it.
    pub async fn create(&self, record: InventoryRecord) -> Result<InventoryRecord, StoreError> {
        let mut records = self.load().await?;
        records.push(record.clone());
        self.save(&records).await?;

        info!("Stored record {} ({})", record.id, record.barcode);
        Ok(record)
    }

    /// All records, in insertion order.
    pub async fn list(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        self.load().await
    }

    /// Replace the record with the given id. The replacement keeps the id.
    pub async fn update(
        &self,
        id: Uuid,
        mut record: InventoryRecord,
    ) -> Result<InventoryRecord, StoreError> {
        let mut records = self.load().await?;

        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;

        record.id = id;
        records[index] = record.clone();
        self.save(&records).await?;

        info!("Updated record {}", id);
        Ok(record)
    }

    /// Remove the record with the given id and return it.
    pub async fn delete(&self, id: Uuid) -> Result<InventoryRecord, StoreError> {
        let mut records = self.load().await?;

        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound { id })?;

        let removed = records.remove(index);
        self.save(&records).await?;

        info!("Deleted record {}", id);
        Ok(removed)
    }

    async fn load(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store file {} absent; treating as empty", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, records: &[InventoryRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).await?;

        debug!("Wrote {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}
