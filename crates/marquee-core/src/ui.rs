//! UI Controller state machine
//!
//! Single-threaded and event-driven: user input, engine/session events,
//! and platform events are serialized into [`UiEvent`] values; the
//! controller folds them into visible control state and emits
//! [`UiCommand`] effects for the host to execute. No live media engine is
//! needed to exercise any transition.

use crate::fullscreen::{FullscreenAction, FullscreenMachine, FullscreenMode};
use crate::{EngineAudioTrack, QualityLevel, SessionState, StreamVariant, TrackMenuEntry};
use std::time::{Duration, Instant};
use tracing::debug;

/// Playback-rate presets offered by the speed menu
pub const SPEED_PRESETS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// How long the gesture-seek acknowledgement stays visible
const SEEK_FEEDBACK_DURATION: Duration = Duration::from_millis(700);

/// Where user activity came from; touch gets a shorter hide window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Pointer,
    Touch,
    Key,
}

/// Horizontal third of the video surface a double-tap landed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Center,
    Right,
}

/// Which control menu is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    /// Stream variants or embedded audio tracks, depending on flavor
    Tracks,
    Quality,
    Speed,
}

/// Which flavor the Tracks menu has for this session. Decided once from
/// whether the registry resolved more than one variant; only one flavor
/// exists per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuFlavor {
    /// Selecting an entry switches the stream variant
    Variants,
    /// Selecting an entry switches the engine's audio track
    EmbeddedAudio,
}

/// Tagged input to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Any pointer/touch/key activity over the player surface
    Activity { source: InputSource },
    /// Timer pulse; drives auto-hide and feedback dismissal
    Tick,

    PlayPauseToggle,
    /// The host's play() promise resolved
    PlayResolved,
    /// The host's play() promise was rejected (autoplay policy)
    PlayRejected,
    /// Session state broadcast
    SessionStateChanged(SessionState),
    TimeUpdate { position: f64, duration: f64 },

    /// Absolute seek: click position as a fraction of the track width
    SeekClick { fraction: f64 },
    DragStart,
    DragMove { fraction: f64 },
    DragEnd,
    SkipForward,
    SkipBack,
    DoubleTap { zone: TapZone },

    MenuToggle(MenuKind),
    MenuSelect { index: usize },
    MenuClose,
    VolumeInput { volume: f64 },

    FullscreenToggle,
    FullscreenGranted,
    FullscreenDenied,
    NativeFullscreenExited,
    OrientationLockDenied,
    OrientationChanged { portrait: bool },
}

/// Effects the host must carry out
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Play,
    Pause,
    Seek { seconds: f64 },
    SetVolume(f64),
    SetSpeed(f64),
    SetAudioTrack(usize),
    /// `None` = automatic level selection
    SetQualityLevel(Option<usize>),
    SwitchVariant(usize),
    RequestNativeFullscreen,
    ExitNativeFullscreen,
    LockLandscape,
    ReleaseOrientationLock,
}

/// Transient gesture-seek acknowledgement; auto-dismisses, never persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekFeedback {
    pub forward: bool,
    pub shown_at: Instant,
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub skip_seconds: f64,
    /// Idle window before the chrome hides after pointer/key activity
    pub autohide_idle: Duration,
    /// Shorter convenience window for touch
    pub autohide_idle_touch: Duration,
    pub touch_device: bool,
    pub portrait: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            skip_seconds: 10.0,
            autohide_idle: Duration::from_secs(3),
            autohide_idle_touch: Duration::from_secs(2),
            touch_device: false,
            portrait: false,
        }
    }
}

/// Visible control state, recomputed from events only
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub controls_visible: bool,
    pub playing: bool,
    pub error: bool,
    pub position: f64,
    pub duration: f64,
    pub volume: f64,
    pub speed: f64,
    pub dragging: bool,
    pub open_menu: Option<MenuKind>,
    pub seek_feedback: Option<SeekFeedback>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            controls_visible: true,
            playing: false,
            error: false,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            speed: 1.0,
            dragging: false,
            open_menu: None,
            seek_feedback: None,
        }
    }
}

/// The UI state machine for one playback session
pub struct UiController {
    config: UiConfig,
    flavor: MenuFlavor,
    state: UiState,
    fullscreen: FullscreenMachine,
    hide_deadline: Option<Instant>,
    /// Last activity was touch; picks the hide window length
    last_touch: bool,
}

impl UiController {
    pub fn new(config: UiConfig, flavor: MenuFlavor) -> Self {
        let fullscreen = FullscreenMachine::new(config.touch_device, config.portrait);
        let last_touch = config.touch_device;
        Self {
            config,
            flavor,
            state: UiState::default(),
            fullscreen,
            hide_deadline: None,
            last_touch,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn flavor(&self) -> MenuFlavor {
        self.flavor
    }

    pub fn fullscreen_mode(&self) -> FullscreenMode {
        self.fullscreen.mode()
    }

    /// The "rotate your device" prompt is up and playback is blocked
    pub fn portrait_blocked(&self) -> bool {
        self.fullscreen.is_portrait_blocked()
    }

    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_deadline
    }

    /// While any of these hold, the hide timer is cleared, not delayed
    fn hide_suppressed(&self) -> bool {
        !self.state.playing
            || self.state.open_menu.is_some()
            || self.fullscreen.is_pending()
    }

    fn idle_window(&self) -> Duration {
        if self.last_touch {
            self.config.autohide_idle_touch
        } else {
            self.config.autohide_idle
        }
    }

    fn arm_hide_timer(&mut self, now: Instant) {
        if self.hide_suppressed() {
            self.hide_deadline = None;
        } else {
            self.hide_deadline = Some(now + self.idle_window());
        }
    }

    fn clamp_seek(&self, seconds: f64) -> f64 {
        if self.state.duration > 0.0 {
            seconds.clamp(0.0, self.state.duration)
        } else {
            seconds.max(0.0)
        }
    }

    fn gesture_skip(&mut self, forward: bool, now: Instant) -> Vec<UiCommand> {
        let delta = if forward {
            self.config.skip_seconds
        } else {
            -self.config.skip_seconds
        };
        let target = self.clamp_seek(self.state.position + delta);
        self.state.position = target;
        self.state.seek_feedback = Some(SeekFeedback {
            forward,
            shown_at: now,
        });
        vec![UiCommand::Seek { seconds: target }]
    }

    fn apply_fullscreen_actions(&mut self, actions: Vec<FullscreenAction>) -> Vec<UiCommand> {
        actions
            .into_iter()
            .map(|action| match action {
                FullscreenAction::RequestNative => UiCommand::RequestNativeFullscreen,
                FullscreenAction::ExitNative => UiCommand::ExitNativeFullscreen,
                FullscreenAction::LockLandscape => UiCommand::LockLandscape,
                FullscreenAction::ReleaseOrientationLock => UiCommand::ReleaseOrientationLock,
                FullscreenAction::PausePlayback => {
                    self.state.playing = false;
                    UiCommand::Pause
                }
                FullscreenAction::ResumePlayback => {
                    self.state.playing = true;
                    UiCommand::Play
                }
            })
            .collect()
    }

    /// Fold one event into the state machine, returning the effects the
    /// host must execute
    pub fn handle(&mut self, event: UiEvent, now: Instant) -> Vec<UiCommand> {
        let commands = self.transition(event, now);
        // Suppression conditions may have changed under this event
        if self.hide_suppressed() {
            self.hide_deadline = None;
            if !self.state.playing || self.state.open_menu.is_some() {
                self.state.controls_visible = true;
            }
        }
        commands
    }

    fn transition(&mut self, event: UiEvent, now: Instant) -> Vec<UiCommand> {
        match event {
            UiEvent::Activity { source } => {
                self.last_touch = source == InputSource::Touch;
                self.state.controls_visible = true;
                self.arm_hide_timer(now);
                Vec::new()
            }

            UiEvent::Tick => {
                if let Some(feedback) = self.state.seek_feedback {
                    if now.duration_since(feedback.shown_at) >= SEEK_FEEDBACK_DURATION {
                        self.state.seek_feedback = None;
                    }
                }
                if let Some(deadline) = self.hide_deadline {
                    if now >= deadline && !self.hide_suppressed() {
                        debug!("Auto-hiding control chrome");
                        self.state.controls_visible = false;
                        self.hide_deadline = None;
                    }
                }
                Vec::new()
            }

            UiEvent::PlayPauseToggle => {
                if self.state.playing {
                    self.state.playing = false;
                    vec![UiCommand::Pause]
                } else {
                    // Optimistic flip; PlayRejected reverts it
                    self.state.playing = true;
                    self.arm_hide_timer(now);
                    vec![UiCommand::Play]
                }
            }
            UiEvent::PlayResolved => {
                self.state.playing = true;
                self.arm_hide_timer(now);
                Vec::new()
            }
            UiEvent::PlayRejected => {
                // Autoplay refusal restores the paused affordance
                self.state.playing = false;
                self.state.controls_visible = true;
                Vec::new()
            }
            UiEvent::SessionStateChanged(state) => {
                self.state.playing = state == SessionState::Playing;
                self.state.error = state == SessionState::Error;
                if self.state.error {
                    self.state.controls_visible = true;
                }
                if self.state.playing {
                    self.arm_hide_timer(now);
                }
                Vec::new()
            }
            UiEvent::TimeUpdate { position, duration } => {
                if !self.state.dragging {
                    self.state.position = position;
                }
                self.state.duration = duration;
                Vec::new()
            }

            UiEvent::SeekClick { fraction } => {
                let target = self.clamp_seek(fraction.clamp(0.0, 1.0) * self.state.duration);
                self.state.position = target;
                vec![UiCommand::Seek { seconds: target }]
            }
            UiEvent::DragStart => {
                self.state.dragging = true;
                self.state.controls_visible = true;
                self.arm_hide_timer(now);
                Vec::new()
            }
            UiEvent::DragMove { fraction } => {
                if !self.state.dragging {
                    return Vec::new();
                }
                let target = self.clamp_seek(fraction.clamp(0.0, 1.0) * self.state.duration);
                self.state.position = target;
                vec![UiCommand::Seek { seconds: target }]
            }
            UiEvent::DragEnd => {
                if !std::mem::take(&mut self.state.dragging) {
                    return Vec::new();
                }
                self.arm_hide_timer(now);
                // Commit the last dragged position
                vec![UiCommand::Seek {
                    seconds: self.state.position,
                }]
            }
            UiEvent::SkipForward => self.gesture_skip(true, now),
            UiEvent::SkipBack => self.gesture_skip(false, now),
            UiEvent::DoubleTap { zone } => match zone {
                TapZone::Right => self.gesture_skip(true, now),
                TapZone::Left => self.gesture_skip(false, now),
                TapZone::Center => self.transition(UiEvent::PlayPauseToggle, now),
            },

            UiEvent::MenuToggle(kind) => {
                if self.state.open_menu == Some(kind) {
                    self.state.open_menu = None;
                    self.arm_hide_timer(now);
                } else {
                    self.state.open_menu = Some(kind);
                    self.state.controls_visible = true;
                    self.hide_deadline = None;
                }
                Vec::new()
            }
            UiEvent::MenuClose => {
                self.state.open_menu = None;
                self.arm_hide_timer(now);
                Vec::new()
            }
            UiEvent::MenuSelect { index } => {
                let Some(menu) = self.state.open_menu.take() else {
                    return Vec::new();
                };
                self.arm_hide_timer(now);
                match menu {
                    MenuKind::Tracks => match self.flavor {
                        MenuFlavor::Variants => {
                            // A variant switch clears any fatal-error state
                            self.state.error = false;
                            vec![UiCommand::SwitchVariant(index)]
                        }
                        MenuFlavor::EmbeddedAudio => vec![UiCommand::SetAudioTrack(index)],
                    },
                    MenuKind::Quality => {
                        // Entry 0 is "Auto"
                        let level = index.checked_sub(1);
                        vec![UiCommand::SetQualityLevel(level)]
                    }
                    MenuKind::Speed => match SPEED_PRESETS.get(index) {
                        Some(&rate) => {
                            self.state.speed = rate;
                            vec![UiCommand::SetSpeed(rate)]
                        }
                        None => Vec::new(),
                    },
                }
            }
            UiEvent::VolumeInput { volume } => {
                let volume = volume.clamp(0.0, 1.0);
                self.state.volume = volume;
                vec![UiCommand::SetVolume(volume)]
            }

            UiEvent::FullscreenToggle => {
                let actions = self.fullscreen.toggle();
                self.apply_fullscreen_actions(actions)
            }
            UiEvent::FullscreenGranted => {
                let actions = self.fullscreen.on_granted();
                let commands = self.apply_fullscreen_actions(actions);
                self.arm_hide_timer(now);
                commands
            }
            UiEvent::FullscreenDenied => {
                let actions = self.fullscreen.on_denied();
                let commands = self.apply_fullscreen_actions(actions);
                self.arm_hide_timer(now);
                commands
            }
            UiEvent::NativeFullscreenExited => {
                let actions = self.fullscreen.on_native_exited();
                self.apply_fullscreen_actions(actions)
            }
            UiEvent::OrientationLockDenied => {
                let playing = self.state.playing;
                let actions = self.fullscreen.on_lock_denied(playing);
                self.apply_fullscreen_actions(actions)
            }
            UiEvent::OrientationChanged { portrait } => {
                let actions = self.fullscreen.on_orientation_changed(portrait);
                self.apply_fullscreen_actions(actions)
            }
        }
    }
}

/// Variant menu: one entry per resolvable stream variant
pub fn variant_menu(variants: &[StreamVariant], active: usize) -> Vec<TrackMenuEntry> {
    variants
        .iter()
        .map(|v| TrackMenuEntry {
            index: v.index,
            label: v.label(),
            meta: v.source_tag.clone(),
            is_active: v.index == active,
        })
        .collect()
}

/// Audio menu: one entry per engine-reported embedded audio track
pub fn audio_menu(tracks: &[EngineAudioTrack], active: Option<usize>) -> Vec<TrackMenuEntry> {
    tracks
        .iter()
        .map(|t| TrackMenuEntry {
            index: t.index,
            label: t.label(),
            meta: t.language.clone().unwrap_or_default(),
            is_active: Some(t.index) == active,
        })
        .collect()
}

/// Quality menu: "Auto" first, then one entry per level
pub fn quality_menu(levels: &[QualityLevel], active: Option<usize>) -> Vec<TrackMenuEntry> {
    let mut entries = vec![TrackMenuEntry {
        index: 0,
        label: "Auto".to_string(),
        meta: String::new(),
        is_active: active.is_none(),
    }];
    entries.extend(levels.iter().map(|l| TrackMenuEntry {
        index: l.index + 1,
        label: l.label(),
        meta: format!("{:.1} Mbps", l.bitrate as f64 / 1_000_000.0),
        is_active: Some(l.index) == active,
    }));
    entries
}

/// Speed menu over the fixed presets
pub fn speed_menu(current: f64) -> Vec<TrackMenuEntry> {
    SPEED_PRESETS
        .iter()
        .enumerate()
        .map(|(index, &rate)| TrackMenuEntry {
            index,
            label: if rate == 1.0 {
                "Normal".to_string()
            } else {
                format!("{}x", rate)
            },
            meta: String::new(),
            is_active: rate == current,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(flavor: MenuFlavor) -> UiController {
        UiController::new(UiConfig::default(), flavor)
    }

    fn playing_controller(flavor: MenuFlavor) -> (UiController, Instant) {
        let mut ui = controller(flavor);
        let now = Instant::now();
        ui.handle(UiEvent::SessionStateChanged(SessionState::Playing), now);
        ui.handle(
            UiEvent::TimeUpdate {
                position: 50.0,
                duration: 120.0,
            },
            now,
        );
        (ui, now)
    }

    #[test]
    fn double_tap_right_skips_forward_with_feedback() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);

        let commands = ui.handle(UiEvent::DoubleTap { zone: TapZone::Right }, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 60.0 }]);
        let feedback = ui.state().seek_feedback.expect("feedback shown");
        assert!(feedback.forward);

        // Acknowledgement dismisses on its own
        let later = now + Duration::from_secs(1);
        ui.handle(UiEvent::Tick, later);
        assert!(ui.state().seek_feedback.is_none());
    }

    #[test]
    fn skips_clamp_to_duration() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(
            UiEvent::TimeUpdate {
                position: 115.0,
                duration: 120.0,
            },
            now,
        );
        let commands = ui.handle(UiEvent::SkipForward, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 120.0 }]);

        ui.handle(
            UiEvent::TimeUpdate {
                position: 4.0,
                duration: 120.0,
            },
            now,
        );
        let commands = ui.handle(UiEvent::SkipBack, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 0.0 }]);
    }

    #[test]
    fn seek_click_clamps_fraction() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        let commands = ui.handle(UiEvent::SeekClick { fraction: 1.7 }, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 120.0 }]);
        let commands = ui.handle(UiEvent::SeekClick { fraction: -0.3 }, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 0.0 }]);
    }

    #[test]
    fn drag_seeks_continuously_and_commits_on_release() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::DragStart, now);
        assert!(ui.state().dragging);

        let commands = ui.handle(UiEvent::DragMove { fraction: 0.5 }, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 60.0 }]);

        // Time updates do not fight the drag preview
        ui.handle(
            UiEvent::TimeUpdate {
                position: 51.0,
                duration: 120.0,
            },
            now,
        );
        assert_eq!(ui.state().position, 60.0);

        let commands = ui.handle(UiEvent::DragEnd, now);
        assert_eq!(commands, vec![UiCommand::Seek { seconds: 60.0 }]);
        assert!(!ui.state().dragging);
    }

    #[test]
    fn autohide_fires_only_while_playing_and_unobstructed() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::Activity { source: InputSource::Pointer }, now);
        assert!(ui.state().controls_visible);

        // Before the idle window: still visible
        ui.handle(UiEvent::Tick, now + Duration::from_secs(1));
        assert!(ui.state().controls_visible);

        // After: hidden
        ui.handle(UiEvent::Tick, now + Duration::from_secs(4));
        assert!(!ui.state().controls_visible);
    }

    #[test]
    fn autohide_suppressed_while_paused() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::Activity { source: InputSource::Pointer }, now);
        ui.handle(UiEvent::SessionStateChanged(SessionState::Paused), now);
        assert_eq!(ui.hide_deadline(), None);

        ui.handle(UiEvent::Tick, now + Duration::from_secs(10));
        assert!(ui.state().controls_visible);
    }

    #[test]
    fn autohide_suppressed_while_menu_open() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::Activity { source: InputSource::Pointer }, now);
        ui.handle(UiEvent::MenuToggle(MenuKind::Quality), now);
        assert_eq!(ui.hide_deadline(), None);

        ui.handle(UiEvent::Tick, now + Duration::from_secs(10));
        assert!(ui.state().controls_visible);

        // Closing the menu re-arms the timer
        ui.handle(UiEvent::MenuClose, now + Duration::from_secs(10));
        assert!(ui.hide_deadline().is_some());
    }

    #[test]
    fn touch_uses_shorter_idle_window() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::Activity { source: InputSource::Touch }, now);
        ui.handle(UiEvent::Tick, now + Duration::from_millis(2500));
        assert!(!ui.state().controls_visible);
    }

    #[test]
    fn rejected_play_restores_paused_visuals() {
        let mut ui = controller(MenuFlavor::Variants);
        let now = Instant::now();

        let commands = ui.handle(UiEvent::PlayPauseToggle, now);
        assert_eq!(commands, vec![UiCommand::Play]);
        assert!(ui.state().playing);

        ui.handle(UiEvent::PlayRejected, now);
        assert!(!ui.state().playing);
        assert!(ui.state().controls_visible);
    }

    #[test]
    fn variant_flavor_menu_switches_variants() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::MenuToggle(MenuKind::Tracks), now);
        let commands = ui.handle(UiEvent::MenuSelect { index: 2 }, now);
        assert_eq!(commands, vec![UiCommand::SwitchVariant(2)]);
        assert_eq!(ui.state().open_menu, None);
    }

    #[test]
    fn audio_flavor_menu_switches_engine_track() {
        let (mut ui, now) = playing_controller(MenuFlavor::EmbeddedAudio);
        ui.handle(UiEvent::MenuToggle(MenuKind::Tracks), now);
        let commands = ui.handle(UiEvent::MenuSelect { index: 1 }, now);
        assert_eq!(commands, vec![UiCommand::SetAudioTrack(1)]);
    }

    #[test]
    fn quality_menu_entry_zero_is_auto() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::MenuToggle(MenuKind::Quality), now);
        let commands = ui.handle(UiEvent::MenuSelect { index: 0 }, now);
        assert_eq!(commands, vec![UiCommand::SetQualityLevel(None)]);

        ui.handle(UiEvent::MenuToggle(MenuKind::Quality), now);
        let commands = ui.handle(UiEvent::MenuSelect { index: 3 }, now);
        assert_eq!(commands, vec![UiCommand::SetQualityLevel(Some(2))]);
    }

    #[test]
    fn error_persists_through_play_toggle() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::SessionStateChanged(SessionState::Error), now);
        assert!(ui.state().error);

        // Only a variant switch recovers from a fatal error
        ui.handle(UiEvent::PlayPauseToggle, now);
        assert!(ui.state().error);
    }

    #[test]
    fn error_clears_on_variant_switch() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::SessionStateChanged(SessionState::Error), now);
        assert!(ui.state().error);
        assert!(ui.state().controls_visible);

        ui.handle(UiEvent::MenuToggle(MenuKind::Tracks), now);
        ui.handle(UiEvent::MenuSelect { index: 1 }, now);
        assert!(!ui.state().error);
    }

    #[test]
    fn portrait_block_scenario() {
        let mut config = UiConfig::default();
        config.touch_device = true;
        config.portrait = true;
        let mut ui = UiController::new(config, MenuFlavor::Variants);
        let now = Instant::now();
        ui.handle(UiEvent::SessionStateChanged(SessionState::Playing), now);

        // Native refused on this device: degrade to pseudo-fullscreen
        let commands = ui.handle(UiEvent::FullscreenToggle, now);
        assert_eq!(commands, vec![UiCommand::RequestNativeFullscreen]);
        let commands = ui.handle(UiEvent::FullscreenDenied, now);
        assert_eq!(ui.fullscreen_mode(), FullscreenMode::Pseudo);
        assert_eq!(commands, vec![UiCommand::LockLandscape]);

        // Lock denied while portrait: rotate prompt plus pause
        let commands = ui.handle(UiEvent::OrientationLockDenied, now);
        assert!(ui.portrait_blocked());
        assert_eq!(commands, vec![UiCommand::Pause]);
        assert!(!ui.state().playing);

        // Rotating to landscape clears the prompt and resumes
        let commands = ui.handle(UiEvent::OrientationChanged { portrait: false }, now);
        assert!(!ui.portrait_blocked());
        assert_eq!(commands, vec![UiCommand::Play]);
    }

    #[test]
    fn fullscreen_pending_suppresses_autohide() {
        let (mut ui, now) = playing_controller(MenuFlavor::Variants);
        ui.handle(UiEvent::Activity { source: InputSource::Pointer }, now);
        ui.handle(UiEvent::FullscreenToggle, now);
        assert_eq!(ui.hide_deadline(), None);

        // Grant settles the transition and re-arms the timer
        ui.handle(UiEvent::FullscreenGranted, now);
        assert!(ui.hide_deadline().is_some());
    }

    #[test]
    fn menus_are_rebuilt_wholesale() {
        let levels = vec![
            QualityLevel { index: 0, height: Some(720), bitrate: 2_500_000 },
            QualityLevel { index: 1, height: Some(1080), bitrate: 5_000_000 },
        ];
        let menu = quality_menu(&levels, Some(1));
        assert_eq!(menu.len(), 3);
        assert_eq!(menu[0].label, "Auto");
        assert!(!menu[0].is_active);
        assert_eq!(menu[2].label, "1080p");
        assert!(menu[2].is_active);

        let menu = quality_menu(&levels, None);
        assert!(menu[0].is_active);

        let menu = speed_menu(1.0);
        assert_eq!(menu.len(), SPEED_PRESETS.len());
        assert_eq!(menu[3].label, "Normal");
        assert!(menu[3].is_active);
    }

    #[test]
    fn audio_menu_labels_fall_back() {
        let tracks = vec![
            EngineAudioTrack { index: 0, name: String::new(), language: Some("hi".into()) },
            EngineAudioTrack { index: 1, name: "English".into(), language: Some("en".into()) },
        ];
        let menu = audio_menu(&tracks, Some(0));
        assert_eq!(menu[0].label, "Audio 1 (hi)");
        assert!(menu[0].is_active);
        assert_eq!(menu[1].label, "English (en)");
        assert!(!menu[1].is_active);
    }
}
