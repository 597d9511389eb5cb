//! Playback Session - owns the engine lifecycle for one media element
//!
//! Coordinates:
//! - Capability negotiation (engine vs. native element playback)
//! - Engine handle lifecycle: load, attach, detach, reload on switch
//! - Track/level inventory republication from engine events
//! - Playback-state persistence keyed by content identity
//! - The session state machine

use crate::{
    engine::{EngineEvent, EngineEventEnvelope, EngineHandleId, MediaElement, PlaybackEngine},
    persist::{resume_position, PersistenceStore, PlaybackStateStore},
    registry::VariantRegistry,
    ContentId, EngineAudioTrack, Error, PersistedPlaybackState, PlatformCapabilities,
    PlaybackStrategy, QualityLevel, Result, SessionConfig, SessionId, SessionState,
    SourceDescriptor, StreamVariant, select_playback_strategy,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Current audio-track and quality-level inventories.
///
/// Replaced wholesale on every relevant engine event; consumers must not
/// patch it incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackInventory {
    pub audio: Vec<EngineAudioTrack>,
    pub levels: Vec<QualityLevel>,
    pub active_audio: Option<usize>,
    /// `None` = automatic level selection
    pub active_level: Option<usize>,
}

/// Playback session managing one adaptive stream bound to one media element
pub struct PlaybackSession {
    id: SessionId,
    config: SessionConfig,
    content: ContentId,
    strategy: PlaybackStrategy,
    engine: Arc<dyn PlaybackEngine>,
    media: Arc<dyn MediaElement>,
    registry: RwLock<VariantRegistry>,
    state: RwLock<SessionState>,
    state_tx: watch::Sender<SessionState>,
    inventory_tx: watch::Sender<TrackInventory>,
    /// At most one live engine handle at any instant
    handle: RwLock<Option<EngineHandleId>>,
    /// Whether media was (or should be) playing across async boundaries
    desired_playing: RwLock<bool>,
    duration: RwLock<Option<f64>>,
    last_known_time: RwLock<f64>,
    /// Seed state, consumed by the one-shot position restore
    stored: RwLock<Option<PersistedPlaybackState>>,
    last_error: RwLock<Option<String>>,
    persist: PlaybackStateStore,
}

impl PlaybackSession {
    /// Create a session over a pre-built registry.
    ///
    /// The playback strategy is negotiated here, once; a platform with
    /// neither engine nor native manifest support is a terminal
    /// capability failure.
    pub fn new(
        content: ContentId,
        registry: VariantRegistry,
        engine: Arc<dyn PlaybackEngine>,
        media: Arc<dyn MediaElement>,
        store: Arc<dyn PersistenceStore>,
        caps: &PlatformCapabilities,
        config: SessionConfig,
    ) -> Result<Self> {
        let strategy = select_playback_strategy(caps);
        if strategy == PlaybackStrategy::Unsupported {
            return Err(Error::PlaybackUnsupported);
        }

        let (state_tx, _) = watch::channel(SessionState::Idle);
        let (inventory_tx, _) = watch::channel(TrackInventory::default());
        let persist = PlaybackStateStore::new(
            store,
            content.storage_key(),
            config.persist_min_interval,
        );

        Ok(Self {
            id: SessionId::new(),
            config,
            content,
            strategy,
            engine,
            media,
            registry: RwLock::new(registry),
            state: RwLock::new(SessionState::Idle),
            state_tx,
            inventory_tx,
            handle: RwLock::new(None),
            desired_playing: RwLock::new(false),
            duration: RwLock::new(None),
            last_known_time: RwLock::new(0.0),
            stored: RwLock::new(None),
            last_error: RwLock::new(None),
            persist,
        })
    }

    /// Build the registry from resolver batches, seeding the default
    /// selection from the persisted variant preference, then create the
    /// session.
    pub async fn from_batches(
        content: ContentId,
        batches: &[Vec<SourceDescriptor>],
        engine: Arc<dyn PlaybackEngine>,
        media: Arc<dyn MediaElement>,
        store: Arc<dyn PersistenceStore>,
        caps: &PlatformCapabilities,
        config: SessionConfig,
    ) -> Result<Self> {
        let preferred = store
            .get(&content.storage_key())
            .await
            .ok()
            .flatten()
            .and_then(|s| s.preferred_variant_index);
        let registry = VariantRegistry::build(batches, preferred)?;
        Self::new(content, registry, engine, media, store, caps, config)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn content(&self) -> &ContentId {
        &self.content
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn strategy(&self) -> PlaybackStrategy {
        self.strategy
    }

    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub async fn inventory(&self) -> TrackInventory {
        self.inventory_tx.borrow().clone()
    }

    pub fn subscribe_inventory(&self) -> watch::Receiver<TrackInventory> {
        self.inventory_tx.subscribe()
    }

    pub async fn active_variant(&self) -> StreamVariant {
        self.registry.read().await.active().clone()
    }

    pub async fn variants(&self) -> Vec<StreamVariant> {
        self.registry.read().await.variants().to_vec()
    }

    pub async fn active_variant_index(&self) -> usize {
        self.registry.read().await.active_index()
    }

    /// Whether the UI should build a variant menu instead of an
    /// embedded audio-track menu
    pub async fn is_multi_variant(&self) -> bool {
        self.registry.read().await.is_multi_variant()
    }

    pub async fn duration(&self) -> Option<f64> {
        *self.duration.read().await
    }

    pub async fn position(&self) -> f64 {
        *self.last_known_time.read().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    async fn set_state(&self, new_state: SessionState) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: state.to_string(),
                to: new_state.to_string(),
            });
        }
        let from = *state;
        *state = new_state;
        drop(state);
        // send_replace updates the channel value even with no receivers
        self.state_tx.send_replace(new_state);
        info!(from = %from, to = %new_state, session = %self.id, "State transition");
        Ok(())
    }

    fn publish_inventory(&self, inventory: TrackInventory) {
        self.inventory_tx.send_replace(inventory);
    }

    /// Start playback of the registry's active variant.
    ///
    /// Restores persisted volume and speed immediately; the position
    /// restore waits for the manifest so the near-end guard can apply.
    pub async fn start(&self) -> Result<()> {
        let stored = self.persist.load().await;
        if let Some(s) = &stored {
            self.media.set_volume(s.volume).await;
            self.media.set_playback_rate(s.speed_multiplier).await;
        }
        *self.stored.write().await = stored;

        self.set_state(SessionState::Loading).await?;
        let variant = self.registry.read().await.active().clone();
        self.load_variant(variant).await
    }

    async fn load_variant(&self, variant: StreamVariant) -> Result<()> {
        match self.strategy {
            PlaybackStrategy::EngineBased => {
                let handle = self
                    .engine
                    .create_handle(&variant.url, &variant.headers)
                    .await?;
                self.engine.attach_media(handle).await?;
                *self.handle.write().await = Some(handle);
                info!(
                    session = %self.id,
                    variant = variant.index,
                    %handle,
                    "Engine handle attached"
                );
                Ok(())
            }
            PlaybackStrategy::NativeElement => self.load_variant_native(variant).await,
            PlaybackStrategy::Unsupported => Err(Error::PlaybackUnsupported),
        }
    }

    /// Native element playback cannot inject per-request headers, so
    /// header-gated variants are skipped in favor of the next candidate
    /// rather than silently attempted without them.
    async fn load_variant_native(&self, variant: StreamVariant) -> Result<()> {
        let variant = if variant.headers.is_empty() {
            variant
        } else {
            warn!(
                variant = variant.index,
                "Variant requires custom headers; skipping for native playback"
            );
            let mut registry = self.registry.write().await;
            let fallback = registry
                .variants()
                .iter()
                .find(|v| v.headers.is_empty())
                .map(|v| v.index)
                .ok_or(Error::NoVariantsAvailable)?;
            registry.select(fallback)?.clone()
        };

        self.media.set_source(&variant.url).await;
        self.set_state(SessionState::Ready).await?;
        self.restore_position().await;
        if *self.desired_playing.read().await {
            self.resume_after_load().await?;
        }
        Ok(())
    }

    /// Handle an engine event. Events from a handle that is no longer
    /// current (detached during a variant switch) are discarded.
    pub async fn handle_event(&self, envelope: EngineEventEnvelope) -> Result<()> {
        if *self.handle.read().await != Some(envelope.handle) {
            debug!(handle = %envelope.handle, "Discarding event from stale engine handle");
            return Ok(());
        }

        match envelope.event {
            EngineEvent::ManifestReady {
                audio_tracks,
                levels,
                duration,
            } => {
                *self.duration.write().await = duration;
                self.publish_inventory(TrackInventory {
                    audio: audio_tracks,
                    levels,
                    active_audio: None,
                    active_level: None,
                });

                if self.state().await == SessionState::Loading {
                    self.set_state(SessionState::Ready).await?;
                    self.restore_position().await;
                    if *self.desired_playing.read().await {
                        self.resume_after_load().await?;
                    }
                }
                Ok(())
            }
            EngineEvent::AudioTracksUpdated(audio) => {
                let mut inventory = self.inventory_tx.borrow().clone();
                inventory.audio = audio;
                self.publish_inventory(inventory);
                Ok(())
            }
            EngineEvent::AudioTrackSwitched { index } => {
                let mut inventory = self.inventory_tx.borrow().clone();
                inventory.active_audio = Some(index);
                self.publish_inventory(inventory);
                Ok(())
            }
            EngineEvent::LevelsUpdated(levels) => {
                let mut inventory = self.inventory_tx.borrow().clone();
                inventory.levels = levels;
                self.publish_inventory(inventory);
                Ok(())
            }
            EngineEvent::LevelSwitched { index } => {
                let mut inventory = self.inventory_tx.borrow().clone();
                inventory.active_level = index;
                self.publish_inventory(inventory);
                Ok(())
            }
            EngineEvent::FatalError { message } => {
                warn!(session = %self.id, error = %message, "Fatal engine error");
                *self.last_error.write().await = Some(message);
                *self.desired_playing.write().await = false;
                // No automatic failover to another variant; the user
                // retries through an explicit switch or reload.
                self.set_state(SessionState::Error).await
            }
        }
    }

    /// One-shot restore of the persisted position, guarded so a nearly
    /// finished video restarts from zero
    async fn restore_position(&self) {
        let stored = self.stored.write().await.take();
        let duration = *self.duration.read().await;
        let duration = match duration {
            Some(d) => Some(d),
            None => self.media.duration().await,
        };
        if let Some(position) =
            resume_position(stored.as_ref(), duration, self.config.resume_guard_seconds)
        {
            info!(session = %self.id, position, "Restoring persisted position");
            self.media.set_current_time(position).await;
            *self.last_known_time.write().await = position;
        }
    }

    async fn resume_after_load(&self) -> Result<()> {
        match self.media.play().await {
            Ok(()) => self.set_state(SessionState::Playing).await,
            Err(Error::AutoplayRejected) => {
                info!(session = %self.id, "Autoplay rejected; staying paused");
                *self.desired_playing.write().await = false;
                self.set_state(SessionState::Paused).await
            }
            Err(e) => Err(e),
        }
    }

    /// Request playback. An autoplay rejection reverts to the paused
    /// state without surfacing an error; the user retries by gesture.
    pub async fn play(&self) -> Result<()> {
        let state = self.state().await;
        match state {
            SessionState::Loading => {
                // Manifest not ready yet; resume once it is
                *self.desired_playing.write().await = true;
                return Ok(());
            }
            SessionState::Playing => return Ok(()),
            _ => {}
        }
        // Reject before touching the media element; Idle and Error never
        // start playback
        if !state.can_transition_to(SessionState::Playing) {
            return Err(Error::InvalidStateTransition {
                from: state.to_string(),
                to: SessionState::Playing.to_string(),
            });
        }
        match self.media.play().await {
            Ok(()) => {
                *self.desired_playing.write().await = true;
                self.set_state(SessionState::Playing).await
            }
            Err(Error::AutoplayRejected) => {
                info!(session = %self.id, "Play request rejected by platform");
                *self.desired_playing.write().await = false;
                if self.state().await == SessionState::Ready {
                    self.set_state(SessionState::Paused).await?;
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn pause(&self) -> Result<()> {
        self.media.pause().await;
        *self.desired_playing.write().await = false;
        if self.state().await == SessionState::Playing {
            self.set_state(SessionState::Paused).await?;
        }
        let position = *self.last_known_time.read().await;
        self.persist.record_position_now(position).await;
        Ok(())
    }

    pub async fn toggle_play(&self) -> Result<()> {
        if self.state().await == SessionState::Playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Absolute seek, clamped into `[0, duration]`
    pub async fn seek(&self, seconds: f64) -> Result<()> {
        let clamped = match *self.duration.read().await {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        };
        debug!(session = %self.id, to = clamped, "Seeking");
        self.media.set_current_time(clamped).await;
        *self.last_known_time.write().await = clamped;
        self.persist.record_position_now(clamped).await;
        Ok(())
    }

    /// Relative seek by the configured skip distance
    pub async fn skip(&self, forward: bool) -> Result<()> {
        let delta = if forward {
            self.config.skip_seconds
        } else {
            -self.config.skip_seconds
        };
        let position = *self.last_known_time.read().await;
        self.seek(position + delta).await
    }

    /// Set volume (clamped to `[0, 1]`); persisted immediately as a
    /// user-driven change
    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.media.set_volume(volume).await;
        self.persist.record_volume(volume).await;
        Ok(())
    }

    pub async fn set_speed(&self, multiplier: f64) -> Result<()> {
        self.media.set_playback_rate(multiplier).await;
        self.persist.record_speed(multiplier).await;
        Ok(())
    }

    async fn current_handle(&self) -> Result<EngineHandleId> {
        (*self.handle.read().await).ok_or(Error::NoEngineHandle)
    }

    pub async fn set_audio_track(&self, index: usize) -> Result<()> {
        let handle = self.current_handle().await?;
        self.engine.set_audio_track(handle, index).await
    }

    pub async fn set_subtitle_track(&self, index: Option<usize>) -> Result<()> {
        let handle = self.current_handle().await?;
        self.engine.set_subtitle_track(handle, index).await
    }

    /// `None` returns level selection to automatic ABR
    pub async fn set_quality_level(&self, index: Option<usize>) -> Result<()> {
        let handle = self.current_handle().await?;
        self.engine.set_quality_level(handle, index).await
    }

    /// Switch the active stream variant.
    ///
    /// Destroys the existing engine handle exactly once, creates a new
    /// one against the new variant, and resumes playback after
    /// manifest-ready only if media was playing before the switch.
    /// Playback of the new variant starts from time zero.
    pub async fn switch_variant(&self, index: usize) -> Result<()> {
        let was_playing = self.state().await == SessionState::Playing;
        let variant = self.registry.write().await.select(index)?.clone();
        info!(
            session = %self.id,
            variant = index,
            was_playing,
            "Switching stream variant"
        );
        self.persist.record_preferred_variant(index).await;

        // Take-then-detach releases the old handle exactly once; any
        // event it still emits fails the handle match and is dropped.
        let old = self.handle.write().await.take();
        if let Some(old) = old {
            if let Err(e) = self.engine.detach(old).await {
                warn!(session = %self.id, %old, error = %e, "Detach of old handle failed");
            }
        }

        *self.last_error.write().await = None;
        *self.desired_playing.write().await = was_playing;
        *self.stored.write().await = None;
        // The new variant starts from time zero
        *self.last_known_time.write().await = 0.0;
        self.media.set_current_time(0.0).await;
        *self.duration.write().await = None;
        self.publish_inventory(TrackInventory::default());
        self.set_state(SessionState::Loading).await?;

        self.load_variant(variant).await
    }

    /// Periodic time update from the media element; feeds the throttled
    /// position persistence
    pub async fn update_position(&self, position: f64) {
        *self.last_known_time.write().await = position;
        self.persist.record_position(position, Instant::now()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_default_is_empty() {
        let inventory = TrackInventory::default();
        assert!(inventory.audio.is_empty());
        assert!(inventory.levels.is_empty());
        assert_eq!(inventory.active_audio, None);
        assert_eq!(inventory.active_level, None);
    }
}
