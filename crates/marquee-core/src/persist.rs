//! Persistence Store
//!
//! Keyed read/write of last known playback position, volume, and speed,
//! scoped by content identity. Writes merge into the stored record so a
//! volume change never clobbers a previously stored position. Position
//! writes are throttled; volume/speed writes happen on user change only.

use crate::{PersistedPlaybackState, PersistedUpdate, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Durable key-value store for playback state.
///
/// `set` merges: fields absent from the update keep their stored value.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<PersistedPlaybackState>>;
    async fn set(&self, key: &str, update: PersistedUpdate) -> Result<()>;
}

/// In-memory store; state survives for the process lifetime only
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, PersistedPlaybackState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<PersistedPlaybackState>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, update: PersistedUpdate) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries
            .entry(key.to_string())
            .or_default()
            .apply(&update);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileContents {
    entries: HashMap<String, PersistedPlaybackState>,
}

/// JSON-file-backed store used by the CLI; one file holds all keys
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    async fn read_contents(&self) -> Result<FileContents> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Corrupt state file, starting fresh");
                FileContents::default()
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileContents::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<PersistedPlaybackState>> {
        let _guard = self.lock.read().await;
        Ok(self.read_contents().await?.entries.remove(key))
    }

    async fn set(&self, key: &str, update: PersistedUpdate) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut contents = self.read_contents().await?;
        contents.entries.entry(key.to_string()).or_default().apply(&update);
        let bytes = serde_json::to_vec_pretty(&contents)
            .map_err(|e| crate::Error::Persistence(e.to_string()))?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Per-session persistence frontend: binds a store to one content key and
/// throttles position writes
pub struct PlaybackStateStore {
    store: Arc<dyn PersistenceStore>,
    key: String,
    min_interval: Duration,
    last_position_write: RwLock<Option<Instant>>,
}

impl PlaybackStateStore {
    pub fn new(store: Arc<dyn PersistenceStore>, key: String, min_interval: Duration) -> Self {
        Self {
            store,
            key,
            min_interval,
            last_position_write: RwLock::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read once at session start to seed UI and engine state
    pub async fn load(&self) -> Option<PersistedPlaybackState> {
        match self.store.get(&self.key).await {
            Ok(state) => state,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load persisted state");
                None
            }
        }
    }

    /// Throttled position write; drops ticks arriving inside the
    /// minimum interval. Best-effort, last write wins.
    pub async fn record_position(&self, seconds: f64, now: Instant) {
        {
            let last = self.last_position_write.read().await;
            if let Some(last) = *last {
                if now.duration_since(last) < self.min_interval {
                    return;
                }
            }
        }
        *self.last_position_write.write().await = Some(now);
        self.write(PersistedUpdate::position(seconds)).await;
    }

    /// Unthrottled position write, for pause/seek boundaries
    pub async fn record_position_now(&self, seconds: f64) {
        *self.last_position_write.write().await = Some(Instant::now());
        self.write(PersistedUpdate::position(seconds)).await;
    }

    pub async fn record_volume(&self, volume: f64) {
        self.write(PersistedUpdate::volume(volume)).await;
    }

    pub async fn record_speed(&self, multiplier: f64) {
        self.write(PersistedUpdate::speed(multiplier)).await;
    }

    pub async fn record_preferred_variant(&self, index: usize) {
        self.write(PersistedUpdate::preferred_variant(index)).await;
    }

    async fn write(&self, update: PersistedUpdate) {
        if let Err(e) = self.store.set(&self.key, update).await {
            warn!(key = %self.key, error = %e, "Failed to persist playback state");
        } else {
            debug!(key = %self.key, "Persisted playback state");
        }
    }
}

/// Restoration policy: resume from a stored position only when it is not
/// within the guard window of the end, so a finished video restarts from
/// zero instead of its final seconds.
pub fn resume_position(
    stored: Option<&PersistedPlaybackState>,
    duration: Option<f64>,
    guard_seconds: f64,
) -> Option<f64> {
    let position = stored.map(|s| s.position_seconds).filter(|p| *p > 0.0)?;
    match duration {
        Some(total) if position >= total - guard_seconds => None,
        _ => Some(position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_merges_partial_writes() {
        let store = MemoryStore::new();
        store.set("movie:603", PersistedUpdate::position(95.0)).await.unwrap();
        store.set("movie:603", PersistedUpdate::volume(0.4)).await.unwrap();
        store.set("movie:603", PersistedUpdate::speed(1.5)).await.unwrap();

        let state = store.get("movie:603").await.unwrap().unwrap();
        assert_eq!(state.position_seconds, 95.0);
        assert_eq!(state.volume, 0.4);
        assert_eq!(state.speed_multiplier, 1.5);
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let store = MemoryStore::new();
        store.set("tv:1399:s1e1", PersistedUpdate::position(10.0)).await.unwrap();
        store.set("tv:1399:s1e2", PersistedUpdate::position(20.0)).await.unwrap();

        let e1 = store.get("tv:1399:s1e1").await.unwrap().unwrap();
        let e2 = store.get("tv:1399:s1e2").await.unwrap().unwrap();
        assert_eq!(e1.position_seconds, 10.0);
        assert_eq!(e2.position_seconds, 20.0);
    }

    #[tokio::test]
    async fn position_writes_are_throttled() {
        let store = Arc::new(MemoryStore::new());
        let frontend = PlaybackStateStore::new(
            store.clone(),
            "movie:603".into(),
            Duration::from_secs(5),
        );

        let t0 = Instant::now();
        frontend.record_position(10.0, t0).await;
        // Inside the interval: dropped
        frontend.record_position(11.0, t0 + Duration::from_secs(1)).await;
        let state = store.get("movie:603").await.unwrap().unwrap();
        assert_eq!(state.position_seconds, 10.0);

        // Past the interval: written
        frontend.record_position(17.0, t0 + Duration::from_secs(6)).await;
        let state = store.get("movie:603").await.unwrap().unwrap();
        assert_eq!(state.position_seconds, 17.0);
    }

    #[test]
    fn near_end_positions_are_not_restored() {
        let stored = PersistedPlaybackState {
            position_seconds: 117.0,
            ..Default::default()
        };
        assert_eq!(resume_position(Some(&stored), Some(120.0), 5.0), None);

        let stored = PersistedPlaybackState {
            position_seconds: 60.0,
            ..Default::default()
        };
        assert_eq!(resume_position(Some(&stored), Some(120.0), 5.0), Some(60.0));

        // Unknown duration: trust the stored position
        assert_eq!(resume_position(Some(&stored), None, 5.0), Some(60.0));
        assert_eq!(resume_position(None, Some(120.0), 5.0), None);
    }

    #[tokio::test]
    async fn json_file_store_round_trips() {
        let dir = std::env::temp_dir().join(format!("marquee-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let store = JsonFileStore::new(dir.join("state.json"));

        assert!(store.get("movie:603").await.unwrap().is_none());
        store.set("movie:603", PersistedUpdate::position(42.0)).await.unwrap();
        store.set("movie:603", PersistedUpdate::volume(0.5)).await.unwrap();

        let state = store.get("movie:603").await.unwrap().unwrap();
        assert_eq!(state.position_seconds, 42.0);
        assert_eq!(state.volume, 0.5);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
