use super::{PersistenceGateway, record_id, upsert_value};
use crate::core::{CollectionKind, Result, SyncError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const SETTINGS_FILE: &str = "settings.json";

/// Persistence gateway over a data directory: one JSON array per collection
/// plus a settings object. Writes go through a temp file and a rename.
pub struct FileGateway {
    root: PathBuf,
    // read-modify-write of one document must not interleave with another
    write_lock: Mutex<()>,
}

impl FileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, kind: CollectionKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.as_str()))
    }

    async fn read_collection(&self, kind: CollectionKind) -> Result<Vec<Value>> {
        match read_json(&self.collection_path(kind)).await? {
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(SyncError::Serialization(format!(
                "collection document '{}' is not an array",
                kind
            ))),
            None => Ok(Vec::new()),
        }
    }

    async fn write_collection(&self, kind: CollectionKind, records: Vec<Value>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&Value::Array(records))?;
        atomic_write(&self.collection_path(kind), &bytes).await
    }

    async fn read_settings(&self) -> Result<Map<String, Value>> {
        match read_json(&self.root.join(SETTINGS_FILE)).await? {
            Some(Value::Object(settings)) => Ok(settings),
            Some(_) => Err(SyncError::Serialization(
                "settings document is not an object".into(),
            )),
            None => Ok(Map::new()),
        }
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn fetch(&self, kind: CollectionKind) -> Result<Vec<Value>> {
        self.read_collection(kind).await
    }

    async fn save(&self, kind: CollectionKind, record: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_collection(kind).await?;
        upsert_value(&mut records, record);
        self.write_collection(kind, records).await
    }

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_collection(kind).await?;
        records.retain(|record| record_id(record) != Some(id));
        self.write_collection(kind, records).await
    }

    async fn save_bulk(&self, kind: CollectionKind, records: Vec<Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_collection(kind, records).await
    }

    async fn fetch_setting(&self, key: &str, default: Value) -> Result<Value> {
        let settings = self.read_settings().await?;
        Ok(settings.get(key).cloned().unwrap_or(default))
    }

    async fn save_setting(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.read_settings().await?;
        settings.insert(key.to_string(), value);
        let bytes = serde_json::to_vec_pretty(&Value::Object(settings))?;
        atomic_write(&self.root.join(SETTINGS_FILE), &bytes).await
    }
}

async fn read_json(path: &Path) -> Result<Option<Value>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(SyncError::Io(format!(
            "Failed to read '{}': {}",
            path.display(),
            err
        ))),
    }
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|err| {
            SyncError::Io(format!(
                "Failed to create data directory '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await.map_err(|err| {
        SyncError::Io(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    fs::rename(&tmp, path).await.map_err(|err| {
        SyncError::Io(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_documents_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::new(dir.path());
        assert!(gateway.fetch(CollectionKind::Animals).await.unwrap().is_empty());
        let value = gateway.fetch_setting("absent", json!(7)).await.unwrap();
        assert_eq!(value, json!(7));
    }

    #[tokio::test]
    async fn test_save_delete_and_settings_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::new(dir.path().join("nested"));
        gateway
            .save(CollectionKind::Tasks, json!({"id": "t1", "title": "Clean aviary"}))
            .await
            .unwrap();
        gateway
            .save(CollectionKind::Tasks, json!({"id": "t2", "title": "Order mice"}))
            .await
            .unwrap();
        gateway.delete(CollectionKind::Tasks, "t1").await.unwrap();
        gateway
            .save_setting("last_iucn_sync", json!("2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let reopened = FileGateway::new(dir.path().join("nested"));
        let tasks = reopened.fetch(CollectionKind::Tasks).await.unwrap();
        assert_eq!(tasks, vec![json!({"id": "t2", "title": "Order mice"})]);
        assert_eq!(
            reopened.fetch_setting("last_iucn_sync", Value::Null).await.unwrap(),
            json!("2024-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("animals.json"), b"{\"not\": \"an array\"}").unwrap();
        let gateway = FileGateway::new(dir.path());
        assert!(matches!(
            gateway.fetch(CollectionKind::Animals).await,
            Err(SyncError::Serialization(_))
        ));
    }
}
