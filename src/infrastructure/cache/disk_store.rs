//! Disk-backed cache store for persistence across sessions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::MediaUrl;
use crate::domain::errors::{PreloadError, PreloadResult};
use crate::domain::ports::{CACHE_NAMESPACE, CacheStorePort};

/// Maximum store size in bytes (200 MB default).
pub const DEFAULT_MAX_STORE_SIZE: u64 = 200 * 1024 * 1024;

/// Disk-backed cache store keyed by hashed URL.
///
/// Entries live under the shared namespace directory so that every
/// consumer of the engine sees consistent membership.
pub struct DiskCacheStore {
    store_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskCacheStore {
    /// Creates a store in the specified directory.
    ///
    /// # Errors
    /// Returns error if the store directory cannot be created.
    pub async fn open(store_dir: PathBuf, max_size: u64) -> PreloadResult<Self> {
        fs::create_dir_all(&store_dir)
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to create store dir: {e}")))?;

        let mut total_size = 0u64;
        let mut count = 0usize;

        let mut entries = fs::read_dir(&store_dir)
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to read store dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "bin")
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        let store = Self {
            store_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
        };

        store.cleanup_if_needed().await;

        Ok(store)
    }

    /// Opens the store in the default location
    /// (the platform cache dir under the shared namespace).
    ///
    /// # Errors
    /// Returns error if the store directory cannot be created.
    pub async fn default_location() -> PreloadResult<Self> {
        Self::open(default_store_path(), DEFAULT_MAX_STORE_SIZE).await
    }

    fn entry_path(&self, url: &MediaUrl) -> PathBuf {
        self.store_dir.join(format!("{}.bin", url.cache_key()))
    }

    /// Reads an entry's raw bytes.
    pub async fn get_bytes(&self, url: &MediaUrl) -> Option<Vec<u8>> {
        let path = self.entry_path(url);
        if let Ok(bytes) = fs::read(&path).await {
            trace!(url = %url, path = %path.display(), "disk store hit");
            Some(bytes)
        } else {
            trace!(url = %url, "disk store miss");
            None
        }
    }

    /// Removes an entry.
    pub async fn evict(&self, url: &MediaUrl) {
        let path = self.entry_path(url);
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(url = %url, error = %e, "failed to evict store entry");
            }
        } else if let Some(s) = size {
            self.current_size.fetch_sub(s, Ordering::Relaxed);
            self.item_count.fetch_sub(1, Ordering::Relaxed);
            debug!(url = %url, "evicted store entry");
        }
    }

    /// Removes every entry.
    ///
    /// # Errors
    /// Returns error if the store directory cannot be read.
    pub async fn clear(&self) -> PreloadResult<()> {
        let mut entries = fs::read_dir(&self.store_dir)
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to read store dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to read entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "bin")
                && fs::remove_file(&path).await.is_err()
            {
                warn!(path = %path.display(), "failed to remove store file");
            }
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("cleared disk store");
        Ok(())
    }

    /// Current store size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts least-recently-accessed entries when over the size limit.
    async fn cleanup_if_needed(&self) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "disk store over limit, cleaning up"
        );

        let Ok(mut entries) = fs::read_dir(&self.store_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, std::time::SystemTime, u64)> = Vec::new();

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "bin") {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let accessed = meta.accessed().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                files.push((path, accessed, meta.len()));
            }
        }

        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove old store file");
            } else {
                freed_size += size;
                freed_count += 1;
            }
        }
        self.current_size.fetch_sub(freed_size, Ordering::Relaxed);
        self.item_count.fetch_sub(freed_count, Ordering::Relaxed);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "disk store cleanup complete"
        );
    }
}

#[async_trait::async_trait]
impl CacheStorePort for DiskCacheStore {
    async fn contains(&self, url: &MediaUrl) -> PreloadResult<bool> {
        let path = self.entry_path(url);
        fs::try_exists(&path)
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to stat store entry: {e}")))
    }

    async fn insert(&self, url: &MediaUrl, bytes: &[u8]) -> PreloadResult<()> {
        let path = self.entry_path(url);

        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to create store file: {e}")))?;

        file.write_all(bytes)
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to write store file: {e}")))?;

        file.flush()
            .await
            .map_err(|e| PreloadError::CacheAccess(format!("failed to flush store file: {e}")))?;

        let new_size = bytes.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size
                    .fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size
                    .fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(url = %url, path = %path.display(), size = bytes.len(), "stored entry on disk");

        self.cleanup_if_needed().await;

        Ok(())
    }
}

/// Default store directory: platform cache dir plus the shared
/// namespace, falling back to the temp dir.
fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("com", "linuxmobile", "image-preloader").map_or_else(
        || std::env::temp_dir().join(CACHE_NAMESPACE),
        |dirs| dirs.cache_dir().join(CACHE_NAMESPACE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url(s: &str) -> MediaUrl {
        MediaUrl::parse(s).unwrap()
    }

    async fn create_test_store() -> (DiskCacheStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskCacheStore::open(temp_dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_insert_and_contains() {
        let (store, _temp) = create_test_store().await;
        let target = url("https://x/1.png");

        assert!(!store.contains(&target).await.unwrap());
        store.insert(&target, b"image data").await.unwrap();
        assert!(store.contains(&target).await.unwrap());
        assert_eq!(store.get_bytes(&target).await.unwrap(), b"image data");
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let (store, _temp) = create_test_store().await;
        assert!(store.get_bytes(&url("https://x/missing.png")).await.is_none());
    }

    #[tokio::test]
    async fn test_evict() {
        let (store, _temp) = create_test_store().await;
        let target = url("https://x/1.png");

        store.insert(&target, b"data").await.unwrap();
        assert!(store.contains(&target).await.unwrap());

        store.evict(&target).await;
        assert!(!store.contains(&target).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let (store, _temp) = create_test_store().await;

        store.insert(&url("https://x/1.png"), b"one").await.unwrap();
        store.insert(&url("https://x/2.png"), b"two").await.unwrap();
        assert_eq!(store.len(), 2);

        store.clear().await.unwrap();
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_size_accounting_across_overwrites() {
        let (store, _temp) = create_test_store().await;

        store
            .insert(&url("https://x/1.png"), b"hello")
            .await
            .unwrap();
        store
            .insert(&url("https://x/2.png"), b"world!")
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.current_size(), 11);

        store.insert(&url("https://x/1.png"), b"hey").await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.current_size(), 9);

        store.evict(&url("https://x/2.png")).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_size(), 3);
    }

    #[tokio::test]
    async fn test_cleanup_evicts_oldest_over_limit() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskCacheStore::open(temp_dir.path().to_path_buf(), 10)
            .await
            .unwrap();

        store
            .insert(&url("https://x/1.png"), b"123456")
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        store
            .insert(&url("https://x/2.png"), b"123456")
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_size(), 6);
    }

    #[tokio::test]
    async fn test_reopen_recovers_accounting() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = DiskCacheStore::open(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            store.insert(&url("https://x/1.png"), b"12345").await.unwrap();
        }

        let reopened = DiskCacheStore::open(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.current_size(), 5);
    }
}
