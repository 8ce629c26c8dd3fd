use std::{
    collections::BTreeMap,
    ffi::OsString,
    future::Future,
    io,
    path::{Path, PathBuf},
    sync::{
        Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{fs, sync::Mutex};
use tracing::{error, warn};

#[derive(Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    Io(io::Error),
    /// The key map could not be serialized.
    Encode(serde_json::Error),
    /// The write would push the store past its capacity.
    QuotaExceeded { needed: u64, quota: u64 },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "storage I/O error: {err}"),
            StorageError::Encode(err) => write!(f, "failed to encode storage: {err}"),
            StorageError::QuotaExceeded { needed, quota } => write!(
                f,
                "storage quota exceeded: {needed} bytes needed, {quota} bytes allowed"
            ),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err),
            StorageError::Encode(err) => Some(err),
            StorageError::QuotaExceeded { .. } => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

fn used_bytes(map: &BTreeMap<String, String>) -> u64 {
    map.iter()
        .map(|(key, value)| (key.len() + value.len()) as u64)
        .sum()
}

fn check_quota(map: &BTreeMap<String, String>, quota: Option<u64>) -> Result<(), StorageError> {
    if let Some(quota) = quota {
        let needed = used_bytes(map);
        if needed > quota {
            return Err(StorageError::QuotaExceeded { needed, quota });
        }
    }
    Ok(())
}

/// A single JSON object file holding every key.
///
/// Reads always hit the disk. Writes go to a sibling temporary file that is
/// renamed over the original, so a failed write never leaves a torn file.
pub struct FileStorage {
    path: PathBuf,
    quota_bytes: Option<u64>,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Self {
        Self {
            path: path.into(),
            quota_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    pub fn quota_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }

    /// A missing or unparsable file holds no keys; any other read error is
    /// returned so that a write never replaces state it could not see.
    async fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => Ok(map),
                Err(err) => {
                    warn!("failed to parse storage file {}: {err}", self.path.display());
                    Ok(BTreeMap::new())
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => {
                error!("failed to read storage file {}: {err}", self.path.display());
                Err(err.into())
            }
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        check_quota(map, self.quota_bytes)?;

        let payload = serde_json::to_vec_pretty(map).map_err(StorageError::Encode)?;
        let temp = self.temp_path();
        if let Err(err) = fs::write(&temp, payload).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value);
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map).await
    }
}

/// In-process storage with the same capacity and atomicity rules.
#[derive(Default)]
pub struct MemoryStorage {
    values: StdMutex<BTreeMap<String, String>>,
    quota_bytes: Option<u64>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Makes every following write fail with an I/O error until switched off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every following read fail with an I/O error until switched off.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, key: &str, value: Option<String>) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("simulated write failure")));
        }

        let mut values = self.lock();
        let mut next = values.clone();
        match value {
            Some(value) => {
                next.insert(key.to_string(), value);
            }
            None => {
                next.remove(key);
            }
        }
        check_quota(&next, self.quota_bytes)?;
        *values = next;
        Ok(())
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("simulated read failure")));
        }
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.write(key, Some(value))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(key, None)
    }
}
