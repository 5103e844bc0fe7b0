//! JSON file storage: one `{id}.json` per product plus the raw `cards.json`
//! of the set it came from.
use crate::schema::SalesHistory;
use crate::{ProductId, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

const CATALOG_FILE: &str = "cards.json";

#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn subdir(&self, name: &str) -> Self {
        Self::new(self.dir.join(name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sales_path(&self, id: &ProductId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub async fn save_sales(&self, id: &ProductId, history: &SalesHistory) -> Result<PathBuf> {
        self.write_json(&format!("{id}.json"), history).await
    }

    pub async fn load_sales(&self, id: &ProductId) -> Result<SalesHistory> {
        let bytes = fs::read(self.sales_path(id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn save_catalog(&self, raw: &Value) -> Result<PathBuf> {
        self.write_json(CATALOG_FILE, raw).await
    }

    /// Writes next to the target and renames over it, so a reader never sees
    /// a half written file even with several collectors running.
    async fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(file_name);
        let tmp = self.dir.join(format!(".{file_name}.tmp"));

        fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
        fs::rename(&tmp, &path).await?;

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}
