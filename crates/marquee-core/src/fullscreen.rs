//! Fullscreen / orientation state machine
//!
//! `None -> Native` when the platform grants native fullscreen,
//! `None -> Pseudo` (CSS full-viewport) when it refuses — notably many
//! mobile browsers on video elements. Entering either mode on a touch
//! device attempts a landscape orientation lock; a denied lock while the
//! viewport is portrait blocks playback behind a rotate prompt until the
//! device rotates or fullscreen exits.

use serde::{Deserialize, Serialize};

/// Presentation mode of the player surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FullscreenMode {
    #[default]
    None,
    /// Native Fullscreen API
    Native,
    /// CSS-driven full-viewport fallback
    Pseudo,
}

/// Effects the host must perform for the fullscreen machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullscreenAction {
    /// Call the native Fullscreen API; the result comes back as a
    /// granted/denied event
    RequestNative,
    ExitNative,
    /// Attempt a landscape orientation lock
    LockLandscape,
    ReleaseOrientationLock,
    /// Pause playback while portrait-blocked
    PausePlayback,
    /// Resume playback that the portrait block interrupted
    ResumePlayback,
}

/// Tracks fullscreen mode, the pending native transition, and the
/// portrait playback block
#[derive(Debug, Default)]
pub struct FullscreenMachine {
    mode: FullscreenMode,
    /// Native request issued, response not yet received. Auto-hide is
    /// suppressed while this is set.
    pending: bool,
    portrait_blocked: bool,
    /// Whether playback should resume once the block lifts
    resume_after_block: bool,
    touch: bool,
    portrait: bool,
}

impl FullscreenMachine {
    pub fn new(touch: bool, portrait: bool) -> Self {
        Self {
            touch,
            portrait,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> FullscreenMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_portrait_blocked(&self) -> bool {
        self.portrait_blocked
    }

    pub fn is_portrait(&self) -> bool {
        self.portrait
    }

    /// User toggled the fullscreen control
    pub fn toggle(&mut self) -> Vec<FullscreenAction> {
        match self.mode {
            FullscreenMode::None => {
                self.pending = true;
                vec![FullscreenAction::RequestNative]
            }
            FullscreenMode::Native => {
                let mut actions = vec![FullscreenAction::ExitNative];
                actions.extend(self.leave());
                actions
            }
            FullscreenMode::Pseudo => self.leave(),
        }
    }

    /// Native fullscreen granted
    pub fn on_granted(&mut self) -> Vec<FullscreenAction> {
        self.pending = false;
        self.mode = FullscreenMode::Native;
        self.enter_actions()
    }

    /// Native fullscreen refused: degrade to pseudo-fullscreen instead
    /// of failing the action visibly
    pub fn on_denied(&mut self) -> Vec<FullscreenAction> {
        self.pending = false;
        self.mode = FullscreenMode::Pseudo;
        self.enter_actions()
    }

    fn enter_actions(&self) -> Vec<FullscreenAction> {
        if self.touch {
            vec![FullscreenAction::LockLandscape]
        } else {
            Vec::new()
        }
    }

    /// Orientation lock denied by the platform. A usability guard, not
    /// a hard requirement: block playback only while actually portrait.
    pub fn on_lock_denied(&mut self, playing: bool) -> Vec<FullscreenAction> {
        if !self.portrait || self.mode == FullscreenMode::None {
            return Vec::new();
        }
        self.portrait_blocked = true;
        self.resume_after_block = playing;
        if playing {
            vec![FullscreenAction::PausePlayback]
        } else {
            Vec::new()
        }
    }

    /// Viewport orientation changed
    pub fn on_orientation_changed(&mut self, portrait: bool) -> Vec<FullscreenAction> {
        self.portrait = portrait;
        if !portrait && self.portrait_blocked {
            self.portrait_blocked = false;
            if std::mem::take(&mut self.resume_after_block) {
                return vec![FullscreenAction::ResumePlayback];
            }
        }
        Vec::new()
    }

    /// Platform reported native fullscreen exit (Esc key, system UI)
    pub fn on_native_exited(&mut self) -> Vec<FullscreenAction> {
        self.leave()
    }

    /// Exiting fullscreen always returns to `None`, releases any
    /// orientation lock, and lifts the portrait block.
    fn leave(&mut self) -> Vec<FullscreenAction> {
        self.mode = FullscreenMode::None;
        self.pending = false;
        let mut actions = Vec::new();
        if self.touch {
            actions.push(FullscreenAction::ReleaseOrientationLock);
        }
        if self.portrait_blocked {
            self.portrait_blocked = false;
            if std::mem::take(&mut self.resume_after_block) {
                actions.push(FullscreenAction::ResumePlayback);
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_enters_native_mode() {
        let mut fs = FullscreenMachine::new(false, false);
        assert_eq!(fs.toggle(), vec![FullscreenAction::RequestNative]);
        assert!(fs.is_pending());

        // Non-touch devices do not lock orientation
        assert_eq!(fs.on_granted(), Vec::new());
        assert_eq!(fs.mode(), FullscreenMode::Native);
        assert!(!fs.is_pending());
    }

    #[test]
    fn denial_degrades_to_pseudo() {
        let mut fs = FullscreenMachine::new(true, true);
        fs.toggle();
        let actions = fs.on_denied();
        assert_eq!(fs.mode(), FullscreenMode::Pseudo);
        assert_eq!(actions, vec![FullscreenAction::LockLandscape]);
    }

    #[test]
    fn portrait_block_pauses_and_resumes_on_rotate() {
        let mut fs = FullscreenMachine::new(true, true);
        fs.toggle();
        fs.on_denied();

        let actions = fs.on_lock_denied(true);
        assert!(fs.is_portrait_blocked());
        assert_eq!(actions, vec![FullscreenAction::PausePlayback]);

        // Rotating to landscape lifts the block and resumes
        let actions = fs.on_orientation_changed(false);
        assert!(!fs.is_portrait_blocked());
        assert_eq!(actions, vec![FullscreenAction::ResumePlayback]);
    }

    #[test]
    fn block_does_not_resume_if_was_paused() {
        let mut fs = FullscreenMachine::new(true, true);
        fs.toggle();
        fs.on_denied();
        assert_eq!(fs.on_lock_denied(false), Vec::new());
        assert!(fs.is_portrait_blocked());
        assert_eq!(fs.on_orientation_changed(false), Vec::new());
        assert!(!fs.is_portrait_blocked());
    }

    #[test]
    fn lock_denied_in_landscape_is_ignored() {
        let mut fs = FullscreenMachine::new(true, false);
        fs.toggle();
        fs.on_granted();
        assert_eq!(fs.on_lock_denied(true), Vec::new());
        assert!(!fs.is_portrait_blocked());
    }

    #[test]
    fn exit_releases_lock_and_block() {
        let mut fs = FullscreenMachine::new(true, true);
        fs.toggle();
        fs.on_granted();
        fs.on_lock_denied(true);

        let actions = fs.toggle();
        assert_eq!(fs.mode(), FullscreenMode::None);
        assert!(actions.contains(&FullscreenAction::ExitNative));
        assert!(actions.contains(&FullscreenAction::ReleaseOrientationLock));
        assert!(actions.contains(&FullscreenAction::ResumePlayback));
        assert!(!fs.is_portrait_blocked());
    }

    #[test]
    fn native_exit_event_resets() {
        let mut fs = FullscreenMachine::new(true, false);
        fs.toggle();
        fs.on_granted();
        let actions = fs.on_native_exited();
        assert_eq!(fs.mode(), FullscreenMode::None);
        assert!(actions.contains(&FullscreenAction::ReleaseOrientationLock));
    }
}
