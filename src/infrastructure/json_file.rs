use crate::domain::account::MainAccount;
use crate::domain::ports::LedgerStore;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Persists the ledger as a single JSON document.
///
/// Each save writes a temporary file next to the target and renames it over the
/// previous document, so a crash mid-write never leaves a truncated state file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| LedgerError::IoError(e.error))?;
    Ok(())
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Option<MainAccount>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let account = serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::StorageError(format!(
                "Failed to parse state file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(account))
    }

    async fn save(&self, account: MainAccount) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&account)
            .map_err(|e| LedgerError::StorageError(format!("Serialization error: {}", e)))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| LedgerError::InternalError(Box::new(e)))?
    }
}
