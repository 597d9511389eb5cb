//! Playback Engine boundary
//!
//! The adaptive-streaming runtime (segment fetching, ABR, demuxing) lives
//! outside this crate. The session drives it through [`PlaybackEngine`] and
//! consumes its events as [`EngineEventEnvelope`] values stamped with the
//! issuing handle, so events from a detached handle can be discarded.

use crate::{EngineAudioTrack, QualityLevel, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Opaque identifier for one engine instance. Handle ids are never reused
/// within a session, which is what makes stale-event discard sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandleId(pub u64);

impl std::fmt::Display for EngineHandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// Events reported by the playback engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Manifest parsed and media attached; playback may begin
    ManifestReady {
        audio_tracks: Vec<EngineAudioTrack>,
        levels: Vec<QualityLevel>,
        duration: Option<f64>,
    },
    /// Audio track inventory replaced wholesale
    AudioTracksUpdated(Vec<EngineAudioTrack>),
    /// Active audio track changed
    AudioTrackSwitched { index: usize },
    /// Quality level inventory replaced wholesale
    LevelsUpdated(Vec<QualityLevel>),
    /// Active quality level changed (None = auto)
    LevelSwitched { index: Option<usize> },
    /// Unrecoverable decode/network failure for the loaded variant
    FatalError { message: String },
}

/// An engine event tagged with the handle that produced it
#[derive(Debug, Clone)]
pub struct EngineEventEnvelope {
    pub handle: EngineHandleId,
    pub event: EngineEvent,
}

/// Command surface of the adaptive-streaming engine.
///
/// Per-variant custom headers passed to [`create_handle`] must be applied
/// to every network request the engine issues for that handle.
///
/// [`create_handle`]: PlaybackEngine::create_handle
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Create an engine instance loading the given manifest URL
    async fn create_handle(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<EngineHandleId>;

    /// Attach the handle to the session's media element
    async fn attach_media(&self, handle: EngineHandleId) -> Result<()>;

    /// Detach and destroy the handle; it must issue no further commands
    async fn detach(&self, handle: EngineHandleId) -> Result<()>;

    async fn set_audio_track(&self, handle: EngineHandleId, index: usize) -> Result<()>;

    /// `None` disables subtitles
    async fn set_subtitle_track(&self, handle: EngineHandleId, index: Option<usize>) -> Result<()>;

    /// `None` returns level selection to automatic ABR
    async fn set_quality_level(&self, handle: EngineHandleId, index: Option<usize>) -> Result<()>;
}

/// Command surface of the on-page media element.
///
/// Mirrors the platform element: `play` is asynchronous and may be
/// rejected by autoplay policy, which callers treat as a state reversion
/// rather than a failure.
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Request playback; fails with [`crate::Error::AutoplayRejected`]
    /// when the platform blocks unattended playback
    async fn play(&self) -> Result<()>;

    async fn pause(&self);

    async fn set_current_time(&self, seconds: f64);

    async fn current_time(&self) -> f64;

    /// Known once metadata is loaded
    async fn duration(&self) -> Option<f64>;

    /// Volume in `[0, 1]`
    async fn set_volume(&self, volume: f64);

    async fn set_playback_rate(&self, rate: f64);

    /// Point the element directly at a manifest URL (native strategy)
    async fn set_source(&self, url: &str);

    async fn clear_source(&self);
}
