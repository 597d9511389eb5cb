//! Marquee Core - Adaptive Stream Session Manager
//!
//! This crate provides the core of a web video player page:
//! - Variant registry: merge, dedupe, and rank resolver outputs
//! - Playback session: engine handle lifecycle, track inventories,
//!   variant switching, the session state machine
//! - UI controller: a serialized event-driven state machine for the
//!   control surface (seek, menus, auto-hide, fullscreen/orientation)
//! - Persistence: position/volume/speed keyed by content identity
//!
//! # Architecture
//!
//! ```text
//! content id -> Source Resolvers -> Variant Registry -> Playback Session
//!                                                           |
//!                    Persistence Store  <----  UI Controller (events)
//!                                                           |
//!                                         Fallback Presenter (no variants)
//! ```
//!
//! The adaptive-streaming engine, the media element, and the platform
//! fullscreen/orientation APIs are consumed through traits; tests inject
//! scripted fakes emitting the same event taxonomy.

pub mod engine;
pub mod error;
pub mod fallback;
pub mod fullscreen;
pub mod persist;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod types;
pub mod ui;

pub use engine::{
    EngineEvent, EngineEventEnvelope, EngineHandleId, MediaElement, PlaybackEngine,
};
pub use error::{Error, Result};
pub use fallback::FallbackPresenter;
pub use fullscreen::{FullscreenAction, FullscreenMachine, FullscreenMode};
pub use persist::{
    resume_position, JsonFileStore, MemoryStore, PersistenceStore, PlaybackStateStore,
};
pub use probe::{parse_master, probe_master, AudioRendition, MasterProbe};
pub use registry::VariantRegistry;
pub use resolver::{
    resolve_all, AggregatedSources, SourceResolver, UpstreamApiResolver, BROWSER_USER_AGENT,
};
pub use session::{PlaybackSession, TrackInventory};
pub use types::*;
pub use ui::{
    audio_menu, quality_menu, speed_menu, variant_menu, InputSource, MenuFlavor, MenuKind,
    TapZone, UiCommand, UiConfig, UiController, UiEvent, UiState, SPEED_PRESETS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
