// * Community Alias Store
// * Async boundary to wherever learned aliases live. The parse path only ever
// * sees an already-fetched `CommunityAliases`; transport failures degrade to
// * "no community aliases" through `CommunityAliasClient`.

use crate::engine::alias_index::CommunityAliases;
use crate::engine::normalization::normalize;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Type alias for async result
pub type AsyncResult<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send>>;

/// Errors raised by alias store implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Alias store transport error: {0}")]
    Transport(String),

    #[error("Invalid alias payload: {0}")]
    Payload(String),

    #[error("Rejected alias observation: {0}")]
    Rejected(String),
}

/// Persistence for community-learned aliases
pub trait CommunityAliasStore: Send + Sync {
    /// Aliases whose usage count is at least `min_usage`
    fn fetch(&self, min_usage: u32) -> AsyncResult<CommunityAliases>;

    /// Records one human-confirmed (raw key -> spec) mapping
    fn record(&self, source_key: &str, spec_name: &str, category: &str) -> AsyncResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredAlias {
    category: String,
    usage_count: u32,
}

/// In-memory store; usage is counted per (normalized key, spec) and the most
/// used spec wins a key on fetch.
#[derive(Debug, Default)]
pub struct InMemoryAliasStore {
    entries: RwLock<BTreeMap<(String, String), StoredAlias>>,
}

impl InMemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usage count for one (key, spec) pair
    pub fn usage(&self, source_key: &str, spec_name: &str) -> u32 {
        self.entries
            .read()
            .ok()
            .and_then(|e| e.get(&(normalize(source_key), spec_name.to_string())).map(|a| a.usage_count))
            .unwrap_or(0)
    }

    /// Last non-empty category an observation carried
    pub fn category(&self, source_key: &str, spec_name: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|e| e.get(&(normalize(source_key), spec_name.to_string())).map(|a| a.category.clone()))
            .filter(|c| !c.is_empty())
    }

    fn snapshot(&self, min_usage: u32) -> Result<CommunityAliases, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Transport("alias store lock poisoned".to_string()))?;

        // * key -> (spec, usage); strictly greater usage replaces, so ties keep spec order
        let mut best: BTreeMap<&str, (&str, u32)> = BTreeMap::new();
        for ((key, spec), alias) in entries.iter() {
            if alias.usage_count < min_usage {
                continue;
            }
            let slot = best.entry(key.as_str()).or_insert((spec.as_str(), alias.usage_count));
            if alias.usage_count > slot.1 {
                *slot = (spec.as_str(), alias.usage_count);
            }
        }

        let mut aliases = CommunityAliases::new();
        for (key, (spec, usage)) in best {
            aliases.insert(key, spec, usage);
        }
        Ok(aliases)
    }

    fn observe(&self, source_key: &str, spec_name: &str, category: &str) -> Result<(), StoreError> {
        let key = normalize(source_key);
        if key.is_empty() || spec_name.trim().is_empty() {
            return Err(StoreError::Rejected(format!("{:?} -> {:?}", source_key, spec_name)));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Transport("alias store lock poisoned".to_string()))?;
        let alias = entries
            .entry((key, spec_name.to_string()))
            .or_insert_with(|| StoredAlias {
                category: category.to_string(),
                usage_count: 0,
            });
        alias.usage_count += 1;
        if !category.is_empty() {
            alias.category = category.to_string();
        }
        Ok(())
    }
}

impl CommunityAliasStore for InMemoryAliasStore {
    fn fetch(&self, min_usage: u32) -> AsyncResult<CommunityAliases> {
        let result = self.snapshot(min_usage);
        Box::pin(async move { result })
    }

    fn record(&self, source_key: &str, spec_name: &str, category: &str) -> AsyncResult<()> {
        let result = self.observe(source_key, spec_name, category);
        Box::pin(async move { result })
    }
}

// * Shared ownership
impl CommunityAliasStore for Arc<InMemoryAliasStore> {
    fn fetch(&self, min_usage: u32) -> AsyncResult<CommunityAliases> {
        (**self).fetch(min_usage)
    }

    fn record(&self, source_key: &str, spec_name: &str, category: &str) -> AsyncResult<()> {
        (**self).record(source_key, spec_name, category)
    }
}

/// Store backed by a JSON file in `CommunityAliases` format. A missing file
/// reads as empty. One spec per key: a conflicting observation wears the
/// current mapping down one use at a time and replaces it once it reaches zero.
///
/// Clones share one lock, so reads and read-modify-write cycles through the
/// same store never interleave. Writes go to a sibling temp file that is then
/// renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonFileAliasStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }

    async fn save(path: &Path, aliases: &CommunityAliases) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(aliases).map_err(|e| StoreError::Payload(e.to_string()))?;
        let temp = Self::temp_path(path);
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        tokio::fs::rename(&temp, path)
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }

    async fn load(path: &Path) -> Result<CommunityAliases, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => CommunityAliases::from_json(&json).map_err(|e| StoreError::Payload(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CommunityAliases::new()),
            Err(e) => Err(StoreError::Transport(e.to_string())),
        }
    }
}

impl CommunityAliasStore for JsonFileAliasStore {
    fn fetch(&self, min_usage: u32) -> AsyncResult<CommunityAliases> {
        let path = self.path.clone();
        let lock = Arc::clone(&self.lock);
        Box::pin(async move {
            let _guard = lock.lock().await;
            let mut aliases = Self::load(&path).await?;
            aliases.retain_min_usage(min_usage);
            Ok(aliases)
        })
    }

    fn record(&self, source_key: &str, spec_name: &str, _category: &str) -> AsyncResult<()> {
        let path = self.path.clone();
        let key = normalize(source_key);
        let spec_name = spec_name.to_string();
        let lock = Arc::clone(&self.lock);

        Box::pin(async move {
            if key.is_empty() || spec_name.trim().is_empty() {
                return Err(StoreError::Rejected(format!("{:?} -> {:?}", key, spec_name)));
            }

            let _guard = lock.lock().await;
            let mut aliases = Self::load(&path).await?;
            match aliases.get(&key).cloned() {
                Some(existing) if existing.spec_name == spec_name => {
                    aliases.insert(&key, &spec_name, existing.usage_count.saturating_add(1));
                }
                Some(existing) if existing.usage_count > 1 => {
                    aliases.insert(&key, &existing.spec_name, existing.usage_count - 1);
                }
                _ => aliases.insert(&key, &spec_name, 1),
            }

            Self::save(&path, &aliases).await
        })
    }
}

/// Wraps a store so nothing it does can fail the caller: fetch failures become
/// an empty alias map, record failures become a no-op. Both log at `warn`.
#[derive(Debug, Clone)]
pub struct CommunityAliasClient<S> {
    store: S,
}

impl<S: CommunityAliasStore> CommunityAliasClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn fetch(&self, min_usage: u32) -> CommunityAliases {
        match self.store.fetch(min_usage).await {
            Ok(aliases) => {
                tracing::debug!(aliases = aliases.len(), min_usage, "Community aliases fetched");
                aliases
            }
            Err(e) => {
                tracing::warn!(error = %e, "Community alias fetch failed; continuing without");
                CommunityAliases::new()
            }
        }
    }

    /// Returns whether the observation was stored
    pub async fn record(&self, source_key: &str, spec_name: &str, category: &str) -> bool {
        match self.store.record(source_key, spec_name, category).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, source_key, spec_name, "Community alias record failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnreachableStore;

    impl CommunityAliasStore for UnreachableStore {
        fn fetch(&self, _min_usage: u32) -> AsyncResult<CommunityAliases> {
            Box::pin(async { Err(StoreError::Transport("connection refused".to_string())) })
        }

        fn record(&self, _: &str, _: &str, _: &str) -> AsyncResult<()> {
            Box::pin(async { Err(StoreError::Transport("connection refused".to_string())) })
        }
    }

    #[tokio::test]
    async fn test_in_memory_record_and_fetch() {
        let store = InMemoryAliasStore::new();
        for _ in 0..4 {
            store.record("Heft", "Weight", "Cameras").await.unwrap();
        }
        store.record("heft ", "Mass", "Cameras").await.unwrap();

        assert_eq!(store.usage("HEFT", "Weight"), 4);
        assert_eq!(store.len(), 2);
        assert_eq!(store.category("heft", "Weight").as_deref(), Some("Cameras"));

        let aliases = store.fetch(3).await.unwrap();
        assert_eq!(aliases.len(), 1);
        let alias = aliases.get("heft").unwrap();
        assert_eq!(alias.spec_name, "Weight");
        assert_eq!(alias.usage_count, 4);

        assert!(store.fetch(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_rejects_blank() {
        let store = InMemoryAliasStore::new();
        let err = store.record("  ", "Weight", "").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_client_degrades_on_failure() {
        let client = CommunityAliasClient::new(UnreachableStore);
        assert!(client.fetch(1).await.is_empty());
        assert!(!client.record("Heft", "Weight", "Cameras").await);
    }

    #[tokio::test]
    async fn test_client_with_shared_store() {
        let store = Arc::new(InMemoryAliasStore::new());
        let client = CommunityAliasClient::new(Arc::clone(&store));
        assert!(client.record("Filter Thread Dia", "Filter Size", "Lenses").await);
        assert_eq!(store.usage("filter thread dia", "Filter Size"), 1);
        assert_eq!(client.fetch(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let store = JsonFileAliasStore::new(&path);

        // * Missing file reads as empty
        assert!(store.fetch(0).await.unwrap().is_empty());

        store.record("Heft", "Weight", "").await.unwrap();
        store.record("Heft", "Weight", "").await.unwrap();
        let aliases = store.fetch(1).await.unwrap();
        assert_eq!(aliases.get("heft").unwrap().usage_count, 2);

        // * A conflicting observation wears the mapping down before replacing it
        store.record("Heft", "Mass", "").await.unwrap();
        assert_eq!(store.fetch(0).await.unwrap().get("heft").unwrap().spec_name, "Weight");
        store.record("Heft", "Mass", "").await.unwrap();
        let alias = store.fetch(0).await.unwrap().get("heft").cloned().unwrap();
        assert_eq!(alias.spec_name, "Mass");
        assert_eq!(alias.usage_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_json_file_store_concurrent_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let store = JsonFileAliasStore::new(&path);

        let handles: Vec<_> = (0..20)
            .map(|_| tokio::spawn(store.clone().record("Heft", "Weight", "Cameras")))
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let alias = store.fetch(0).await.unwrap().get("heft").cloned().unwrap();
        assert_eq!(alias.usage_count, 20);
        // * Temp file is renamed away after every write
        assert!(!dir.path().join("aliases.json.tmp").exists());
        assert!(CommunityAliases::from_json(&std::fs::read_to_string(&path).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_json_file_store_bad_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = JsonFileAliasStore::new(&path);
        assert!(matches!(store.fetch(0).await, Err(StoreError::Payload(_))));

        let client = CommunityAliasClient::new(store);
        assert!(client.fetch(0).await.is_empty());
    }
}
