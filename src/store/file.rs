use crate::error::{PrepcallError, Result};
use crate::store::{DocumentStore, StoredDocument, ensure_object};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Store that keeps one pretty-printed JSON file per document at
/// `<root>/<collection>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        validate_name("collection", collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> Result<PathBuf> {
        validate_name("document id", id)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", id)))
    }
}

/// Names become path components, so only a conservative alphabet is allowed.
fn validate_name(what: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PrepcallError::Storage {
            message: format!("invalid {} '{}'", what, name),
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let path = self.document_path(collection, id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        ensure_object(collection, id, &document)?;
        let path = self.document_path(collection, id)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Write then rename so readers never see a half-written document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&document)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::debug!("stored {}", path.display());
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let content = tokio::fs::read_to_string(&path).await?;
            let data = serde_json::from_str(&content).map_err(|e| PrepcallError::Storage {
                message: format!("{}: {}", path.display(), e),
            })?;
            documents.push(StoredDocument {
                id: id.to_string(),
                data,
            });
        }
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
