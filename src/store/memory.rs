use crate::error::Result;
use crate::store::{DocumentStore, StoredDocument, ensure_object};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        ensure_object(collection, id, &document)?;
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Query;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let store = MemoryStore::new();
        assert_eq!(store.get("feedback", "f1").await.unwrap(), None);

        store.set("feedback", "f1", json!({"v": 1})).await.unwrap();
        store.set("feedback", "f1", json!({"v": 2})).await.unwrap();

        assert_eq!(
            store.get("feedback", "f1").await.unwrap(),
            Some(json!({"v": 2}))
        );
        assert_eq!(store.count("feedback"), 1);
    }

    #[tokio::test]
    async fn test_add_allocates_ids() {
        let store = MemoryStore::new();
        let a = store.add("interviews", json!({"n": 1})).await.unwrap();
        let b = store.add("interviews", json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("interviews"), 2);
        assert_eq!(store.count("feedback"), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_objects() {
        let store = MemoryStore::new();
        assert!(store.set("c", "x", json!("text")).await.is_err());
        assert_eq!(store.count("c"), 0);
    }

    #[tokio::test]
    async fn test_query_uses_list() {
        let store = MemoryStore::new();
        store.set("c", "1", json!({"k": "a"})).await.unwrap();
        store.set("c", "2", json!({"k": "b"})).await.unwrap();

        let found = store
            .query("c", &Query::new().where_eq("k", "b"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }
}
