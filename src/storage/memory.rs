//! In-process case store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CaseStore, StorageError};
use crate::agents::types::{Case, CaseConfig};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    cases: HashMap<i64, Case>,
}

/// Case store kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCaseStore {
    inner: RwLock<Inner>,
}

impl MemoryCaseStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cases.
    pub async fn len(&self) -> usize {
        self.inner.read().await.cases.len()
    }

    /// Returns true if no case has been created.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn create_case(&self, query: &str, config: &CaseConfig) -> Result<Case, StorageError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let case = Case::new(inner.next_id, query, config.clone());
        inner.cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn load_case(&self, id: i64) -> Result<Option<Case>, StorageError> {
        Ok(self.inner.read().await.cases.get(&id).cloned())
    }

    async fn save_case(&self, case: &Case) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        match inner.cases.get_mut(&case.id) {
            Some(stored) => {
                *stored = case.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(case.id)),
        }
    }

    async fn find_completed_by_query(&self, query: &str) -> Result<Option<Case>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .cases
            .values()
            .filter(|c| c.query == query && c.is_completed())
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Case>, StorageError> {
        let inner = self.inner.read().await;
        let mut cases: Vec<Case> = inner.cases.values().cloned().collect();
        cases.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        cases.truncate(limit);
        Ok(cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryCaseStore::new();
        let a = store.create_case("a", &CaseConfig::default()).await.unwrap();
        let b = store.create_case("b", &CaseConfig::default()).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let store = MemoryCaseStore::new();
        let mut case = store.create_case("q", &CaseConfig::default()).await.unwrap();
        case.final_verdict = Some("done".to_string());
        store.save_case(&case).await.unwrap();

        let loaded = store.load_case(case.id).await.unwrap().unwrap();
        assert_eq!(loaded.final_verdict.as_deref(), Some("done"));
        assert_eq!(
            store.find_completed_by_query("q").await.unwrap().map(|c| c.id),
            Some(case.id)
        );
    }

    #[tokio::test]
    async fn test_save_unknown_case() {
        let store = MemoryCaseStore::new();
        let ghost = Case::new(5, "q", CaseConfig::default());
        assert!(matches!(
            store.save_case(&ghost).await,
            Err(StorageError::NotFound(5))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_recent_limit_and_order() {
        let store = MemoryCaseStore::new();
        for query in ["first", "second", "third"] {
            store.create_case(query, &CaseConfig::default()).await.unwrap();
        }
        let queries: Vec<String> = store
            .list_recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.query)
            .collect();
        assert_eq!(queries, vec!["third", "second"]);
    }
}
