use crate::models::FoodEntry;
use crate::storage::{Storage, StorageError};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const FOOD_LOG_KEY: &str = "foodLog";

const ID_SUFFIX_LEN: usize = 11;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Time-ordered id: base-36 milliseconds followed by a random base-36 suffix.
pub fn generate_id(now_ms: i64) -> String {
    let mut id = to_base36(now_ms.max(0) as u64);
    let mut rng = rand::rng();
    for _ in 0..ID_SUFFIX_LEN {
        id.push(BASE36[rng.random_range(0..BASE36.len())] as char);
    }
    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

pub struct FoodLogStore<S> {
    storage: S,
    append_lock: Mutex<()>,
}

impl<S: Storage> FoodLogStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            append_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Newest-first entries. Missing, undecodable or unreadable state reads
    /// as empty.
    pub async fn load(&self) -> Vec<FoodEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("failed to read food log: {err}");
                Vec::new()
            }
        }
    }

    /// Like `load`, but a failed storage read is an error rather than an
    /// empty log.
    async fn try_load(&self) -> Result<Vec<FoodEntry>, StorageError> {
        let Some(raw) = self.storage.get(FOOD_LOG_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!("discarding undecodable food log: {err}");
                Ok(Vec::new())
            }
        }
    }

    /// Prepends `entry` and writes the whole log back.
    ///
    /// On error the previously persisted log is left as it was.
    pub async fn append(&self, entry: FoodEntry) -> Result<(), StorageError> {
        let _guard = self.append_lock.lock().await;

        let id = entry.id.clone();
        let mut log = match self.try_load().await {
            Ok(log) => log,
            Err(err) => {
                warn!("food entry {id} not saved, log unreadable: {err}");
                return Err(err);
            }
        };
        log.insert(0, entry);

        let payload = serde_json::to_string(&log).map_err(StorageError::Encode)?;
        if let Err(err) = self.storage.set(FOOD_LOG_KEY, payload).await {
            warn!("failed to save food entry {id}: {err}");
            return Err(err);
        }

        info!("logged food entry {id} ({} total)", log.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use crate::storage::MemoryStorage;

    const T: i64 = 1_760_000_000_000;

    fn entry(id: &str, rating: Rating, timestamp: i64) -> FoodEntry {
        FoodEntry {
            id: id.to_string(),
            image: format!("data:image/jpeg;base64,{id}"),
            rating,
            timestamp,
        }
    }

    #[tokio::test]
    async fn load_is_empty_without_state() {
        let store = FoodLogStore::new(MemoryStorage::new());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn append_prepends_newest_first() {
        let store = FoodLogStore::new(MemoryStorage::new());
        let a = entry("a", Rating::Good, T);
        let b = entry("b", Rating::Bad, T + 1000);

        store.append(a.clone()).await.unwrap();
        assert_eq!(store.load().await, vec![a.clone()]);

        store.append(b.clone()).await.unwrap();
        assert_eq!(store.load().await, vec![b, a]);
    }

    #[tokio::test]
    async fn n_appends_load_in_reverse_insertion_order() {
        let store = FoodLogStore::new(MemoryStorage::new());
        for i in 0..10 {
            store
                .append(entry(&format!("e{i}"), Rating::Good, T + i))
                .await
                .unwrap();
        }

        let ids: Vec<_> = store.load().await.into_iter().map(|e| e.id).collect();
        let expected: Vec<_> = (0..10).rev().map(|i| format!("e{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let store = FoodLogStore::new(MemoryStorage::new());
        store.append(entry("a", Rating::Good, T)).await.unwrap();
        assert_eq!(store.load().await, store.load().await);
    }

    #[tokio::test]
    async fn failed_write_keeps_prior_log() {
        let store = FoodLogStore::new(MemoryStorage::new());
        let a = entry("a", Rating::Good, T);
        store.append(a.clone()).await.unwrap();

        store.storage().set_fail_writes(true);
        let result = store.append(entry("b", Rating::Bad, T + 1000)).await;
        assert!(result.is_err());

        assert_eq!(store.load().await, vec![a]);
    }

    #[tokio::test]
    async fn failed_read_during_append_keeps_prior_log() {
        let store = FoodLogStore::new(MemoryStorage::new());
        for i in 0..5 {
            store
                .append(entry(&format!("e{i}"), Rating::Good, T + i))
                .await
                .unwrap();
        }
        let before = store.load().await;

        store.storage().set_fail_reads(true);
        let result = store.append(entry("new", Rating::Bad, T + 10)).await;
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(store.load().await.is_empty());

        store.storage().set_fail_reads(false);
        let after = store.load().await;
        assert_eq!(after.len(), 5);
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn quota_failure_keeps_prior_log() {
        let store = FoodLogStore::new(MemoryStorage::with_quota(200));
        let a = entry("a", Rating::Good, T);
        store.append(a.clone()).await.unwrap();

        let mut big = entry("b", Rating::Bad, T + 1000);
        big.image = "x".repeat(500);
        let err = store.append(big).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        assert_eq!(store.load().await, vec![a]);
    }

    #[tokio::test]
    async fn corrupt_state_loads_as_empty_and_is_replaced() {
        let storage = MemoryStorage::new();
        storage
            .set(FOOD_LOG_KEY, "{\"oops\":".to_string())
            .await
            .unwrap();
        let store = FoodLogStore::new(storage);
        assert!(store.load().await.is_empty());

        let a = entry("a", Rating::Good, T);
        store.append(a.clone()).await.unwrap();
        assert_eq!(store.load().await, vec![a]);
    }

    #[tokio::test]
    async fn persisted_log_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FoodLogStore::new(crate::storage::FileStorage::new(&path, None));
        store.append(entry("a", Rating::Good, T)).await.unwrap();
        store.append(entry("b", Rating::Bad, T + 5)).await.unwrap();
        let written = store.load().await;

        let reopened = FoodLogStore::new(crate::storage::FileStorage::new(&path, None));
        assert_eq!(reopened.load().await, written);
    }

    #[test]
    fn generated_ids_start_with_base36_time() {
        let id = generate_id(36 * 36);
        assert!(id.starts_with("100"));
        assert_eq!(id.len(), 3 + ID_SUFFIX_LEN);
        assert!(id.bytes().all(|b| BASE36.contains(&b)));
        assert_ne!(generate_id(T), generate_id(T));
    }
}
