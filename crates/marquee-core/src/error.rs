//! Error types for Marquee Core

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session error types
#[derive(Error, Debug)]
pub enum Error {
    // Resolution errors
    #[error("No playable variants available")]
    NoVariantsAvailable,

    #[error("Resolver {tag} failed: {message}")]
    ResolverFailed { tag: String, message: String },

    #[error("Variant index {index} out of range ({len} variants)")]
    VariantOutOfRange { index: usize, len: usize },

    // Playback errors
    #[error("Variant load failed: {0}")]
    VariantLoadFailed(String),

    #[error("Autoplay rejected by the platform")]
    AutoplayRejected,

    #[error("No supported playback path on this platform")]
    PlaybackUnsupported,

    #[error("Variant requires custom headers unsupported by native playback")]
    HeadersUnsupported,

    #[error("Invalid session state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("No live engine handle")]
    NoEngineHandle,

    // Presentation errors (soft; callers degrade instead of failing)
    #[error("Fullscreen request denied")]
    FullscreenRequestDenied,

    #[error("Orientation lock denied")]
    OrientationLockDenied,

    // Parsing errors
    #[error("Failed to parse master playlist: {0}")]
    PlaylistParse(String),

    // Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    // Passthroughs
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Soft errors degrade the presentation but leave controls interactive
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::AutoplayRejected
                | Error::FullscreenRequestDenied
                | Error::OrientationLockDenied
        )
    }
}
