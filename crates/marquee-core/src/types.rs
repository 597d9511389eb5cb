//! Core types for the Marquee session manager

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of catalog content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Movie,
    Series,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "tv"),
        }
    }
}

/// Season/episode coordinates within a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonEpisode {
    pub season: u32,
    pub episode: u32,
}

impl std::fmt::Display for SeasonEpisode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}e{}", self.season, self.episode)
    }
}

/// External content identity: catalog id plus optional season/episode.
///
/// Scopes both source resolution and persisted playback state. Two
/// different episodes must never share a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId {
    pub kind: ContentKind,
    pub id: String,
    pub episode: Option<SeasonEpisode>,
}

impl ContentId {
    pub fn movie(id: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Movie,
            id: id.into(),
            episode: None,
        }
    }

    pub fn episode(id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            kind: ContentKind::Series,
            id: id.into(),
            episode: Some(SeasonEpisode { season, episode }),
        }
    }

    /// Composite key used to scope persisted playback state
    pub fn storage_key(&self) -> String {
        match self.episode {
            Some(se) => format!("{}:{}:{}", self.kind, self.id, se),
            None => format!("{}:{}", self.kind, self.id),
        }
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// One candidate stream as returned by a resolver, immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Playable manifest URL (empty = unusable descriptor)
    pub url: String,
    /// Audio language as reported by the provider
    pub language: Option<String>,
    /// Custom request headers the stream host requires
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Which resolver produced this descriptor
    pub source_tag: String,
}

/// A deduplicated, ranked playable candidate held by the variant registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamVariant {
    /// Position in merge order (stable across the registry's lifetime)
    pub index: usize,
    pub language: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub source_tag: String,
}

impl StreamVariant {
    /// Human-readable menu label
    pub fn label(&self) -> String {
        if self.language.is_empty() {
            format!("Stream {}", self.index + 1)
        } else {
            self.language.clone()
        }
    }
}

/// Aggregated resolver output for one content item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedContent {
    pub title: Option<String>,
    pub poster: Option<String>,
    pub sources: Vec<SourceDescriptor>,
}

/// Audio track as reported by the playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineAudioTrack {
    pub index: usize,
    pub name: String,
    pub language: Option<String>,
}

impl EngineAudioTrack {
    /// Menu label, falling back to a positional name
    pub fn label(&self) -> String {
        let base = if self.name.is_empty() {
            format!("Audio {}", self.index + 1)
        } else {
            self.name.clone()
        };
        match &self.language {
            Some(lang) if !lang.is_empty() => format!("{} ({})", base, lang),
            _ => base,
        }
    }
}

/// Quality level as reported by the playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLevel {
    pub index: usize,
    /// Vertical resolution, when the manifest declares one
    pub height: Option<u32>,
    /// Bandwidth in bits per second
    pub bitrate: u64,
}

impl QualityLevel {
    /// Menu label: "1080p" when the height is known, else a bitrate
    pub fn label(&self) -> String {
        match self.height {
            Some(h) => format!("{}p", h),
            None => format!("{:.1} Mbps", self.bitrate as f64 / 1_000_000.0),
        }
    }
}

/// One row of a rebuilt track/quality/speed menu.
///
/// Ephemeral: always derived wholesale from current engine/variant state,
/// never persisted or patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMenuEntry {
    pub index: usize,
    pub label: String,
    pub meta: String,
    pub is_active: bool,
}

/// Durable playback state, keyed by content identity. Last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPlaybackState {
    pub position_seconds: f64,
    /// In `[0, 1]`
    pub volume: f64,
    pub speed_multiplier: f64,
    pub preferred_variant_index: Option<usize>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Default for PersistedPlaybackState {
    fn default() -> Self {
        Self {
            position_seconds: 0.0,
            volume: 1.0,
            speed_multiplier: 1.0,
            preferred_variant_index: None,
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Partial write into a [`PersistedPlaybackState`]. Fields left `None`
/// keep their stored value: writing volume never clobbers position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedUpdate {
    pub position_seconds: Option<f64>,
    pub volume: Option<f64>,
    pub speed_multiplier: Option<f64>,
    pub preferred_variant_index: Option<usize>,
}

impl PersistedUpdate {
    pub fn position(seconds: f64) -> Self {
        Self {
            position_seconds: Some(seconds),
            ..Default::default()
        }
    }

    pub fn volume(volume: f64) -> Self {
        Self {
            volume: Some(volume),
            ..Default::default()
        }
    }

    pub fn speed(multiplier: f64) -> Self {
        Self {
            speed_multiplier: Some(multiplier),
            ..Default::default()
        }
    }

    pub fn preferred_variant(index: usize) -> Self {
        Self {
            preferred_variant_index: Some(index),
            ..Default::default()
        }
    }
}

impl PersistedPlaybackState {
    /// Merge a partial update, refreshing the write timestamp
    pub fn apply(&mut self, update: &PersistedUpdate) {
        if let Some(pos) = update.position_seconds {
            self.position_seconds = pos;
        }
        if let Some(vol) = update.volume {
            self.volume = vol.clamp(0.0, 1.0);
        }
        if let Some(speed) = update.speed_multiplier {
            self.speed_multiplier = speed;
        }
        if let Some(idx) = update.preferred_variant_index {
            self.preferred_variant_index = Some(idx);
        }
        self.updated_at = chrono::Utc::now();
    }
}

/// Playback session state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No content loaded
    Idle,
    /// Engine handle created, waiting for manifest
    Loading,
    /// Manifest ready, not yet playing
    Ready,
    /// Media is playing
    Playing,
    /// Playback paused
    Paused,
    /// Fatal engine failure on the active variant; terminal unless the
    /// user retries via an explicit switch or reload
    Error,
}

impl SessionState {
    /// Check if a transition to the target state is valid
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, Loading)
                | (Loading, Ready)
                | (Loading, Error)
                // A variant switch re-enters Loading from any settled state
                | (Ready, Playing)
                | (Ready, Paused)
                | (Ready, Loading)
                | (Ready, Error)
                | (Playing, Paused)
                | (Playing, Loading)
                | (Playing, Error)
                | (Paused, Playing)
                | (Paused, Loading)
                | (Paused, Error)
                | (Error, Loading)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Loading => write!(f, "loading"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Playing => write!(f, "playing"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Error => write!(f, "error"),
        }
    }
}

/// Platform capabilities probed once at session start
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformCapabilities {
    /// Runtime supports the adaptive-streaming engine (MSE available)
    pub engine_supported: bool,
    /// Media element can play HLS natively (canPlayType)
    pub native_hls: bool,
    /// Touch-capable device
    pub touch: bool,
}

/// How this session will drive playback, decided once and never re-checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStrategy {
    /// Adaptive engine attached to the media element
    EngineBased,
    /// Media element plays the manifest URL directly
    NativeElement,
    /// Neither path available; terminal capability failure
    Unsupported,
}

/// Capability negotiation: engine first, native element second
pub fn select_playback_strategy(caps: &PlatformCapabilities) -> PlaybackStrategy {
    if caps.engine_supported {
        PlaybackStrategy::EngineBased
    } else if caps.native_hls {
        PlaybackStrategy::NativeElement
    } else {
        PlaybackStrategy::Unsupported
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Relative skip distance for skip buttons and gesture seeks
    pub skip_seconds: f64,
    /// Stored positions closer than this to the end are not restored
    pub resume_guard_seconds: f64,
    /// Minimum spacing between throttled position writes
    pub persist_min_interval: Duration,
    /// Idle interval before control chrome hides (pointer)
    pub autohide_idle: Duration,
    /// Idle interval before control chrome hides (touch)
    pub autohide_idle_touch: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            skip_seconds: 10.0,
            resume_guard_seconds: 5.0,
            persist_min_interval: Duration::from_secs(5),
            autohide_idle: Duration::from_secs(3),
            autohide_idle_touch: Duration::from_secs(2),
        }
    }
}
