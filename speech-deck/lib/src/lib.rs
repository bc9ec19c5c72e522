//! Speech Deck
//!
//! A playback controller for text-to-speech: type text, pick a voice,
//! adjust rate and volume, then play, pause, resume or reset.
//!
//! ## Features
//!
//! - **Service-agnostic**: synthesis is delegated to any [`SpeechService`];
//!   a host backend over `say` / `espeak` is included
//! - **Event-driven**: voice catalog changes and utterance completion arrive
//!   through an explicit subscription, so the controller can be driven by
//!   synthetic events in tests
//! - **No globals**: every controller owns its own panel and voice cache
//!
//! ## Quick Start
//!
//! ```ignore
//! use speech_deck::{HostSpeechService, PlaybackController};
//!
//! let service = HostSpeechService::detect();
//! let mut controller = PlaybackController::new(service.clone());
//! service.load_voices().await?;
//! controller.pump();
//!
//! controller.set_text("Hello, world!");
//! controller.set_rate(1.5)?;
//! controller.play();
//! ```
//!
//! ## Module Structure
//!
//! - [`controller`] - The `PlaybackController` and its `ControlPanel` model
//! - [`registry`] - The cached voice enumeration
//! - [`readout`] - Rate and volume readout formatting
//! - [`traits`] - The `SpeechService` trait and `EventSink`
//! - [`host`] - `HostSpeechService` over host command-line engines
//! - [`types`] - Voice descriptors, utterances, states and events
//! - [`config`] - Slider defaults and bounds
//! - [`errors`] - Error types

pub mod config;
pub mod controller;
pub mod errors;
pub mod host;
pub mod readout;
pub mod registry;
pub mod traits;
pub mod types;

pub use config::DeckConfig;
pub use controller::{ControlLock, ControlPanel, PlaybackController};
pub use errors::{ControlError, SpeechError};
pub use host::{Engine, HostSpeechService};
pub use readout::{format_rate, format_volume};
pub use registry::VoiceRegistry;
pub use traits::{EventSink, SpeechService};
pub use types::{
    Control, ControlState, PlayOutcome, PlaybackState, SpeechEvent, Utterance, UtteranceId,
    VoiceDescriptor, VoiceOption,
};
