//! The playback controller.
//!
//! [`PlaybackController`] owns the control panel model, the voice registry
//! and a [`SpeechService`]. Front-end input mutates the panel or calls into
//! the service; service events flow back through [`PlaybackController::pump`]
//! or [`PlaybackController::next_event`] and update the panel.
//!
//! ## Lifecycle
//!
//! ```text
//!            play (non-empty text)
//!   Idle ───────────────────────────▶ Speaking ◀──┐ pause / resume / play
//!    ▲                                   │  └─────┘
//!    └───── utterance ended / reset ─────┘
//! ```
//!
//! The controller only tracks whether the controls are locked; paused speech
//! is still `Speaking`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, trace, warn};

use crate::config::DeckConfig;
use crate::errors::ControlError;
use crate::readout::{format_rate, format_volume};
use crate::registry::VoiceRegistry;
use crate::traits::{EventSink, SpeechService};
use crate::types::{
    Control, ControlState, PlayOutcome, PlaybackState, SpeechEvent, Utterance, UtteranceId,
    VoiceDescriptor, VoiceOption,
};

// ============================================================================
// Control Panel
// ============================================================================

/// Everything a front-end needs to render the controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanel {
    /// Contents of the text field.
    pub text: String,
    /// Voice dropdown entries.
    pub voice_options: Vec<VoiceOption>,
    /// Selected dropdown entry, `None` when nothing is selectable.
    pub selected_voice: Option<usize>,
    /// Rate slider value.
    pub rate: f64,
    /// Rate readout, e.g. `"1.0x"`.
    pub rate_readout: String,
    /// Volume slider value on the 0-100 scale.
    pub volume: f64,
    /// Volume readout, e.g. `"50"`.
    pub volume_readout: String,
    /// Shared enablement of the voice, rate and volume controls.
    pub controls: ControlState,
}

impl ControlPanel {
    fn new(config: &DeckConfig) -> Self {
        Self {
            text: String::new(),
            voice_options: Vec::new(),
            selected_voice: None,
            rate: config.default_rate,
            rate_readout: String::new(),
            volume: config.default_volume,
            volume_readout: String::new(),
            controls: ControlState::Unlocked,
        }
    }

    /// Label of the selected voice, if any.
    pub fn selected_label(&self) -> Option<&str> {
        let selected = self.selected_voice?;
        self.voice_options
            .iter()
            .find(|option| option.value == selected)
            .map(|option| option.label.as_str())
    }
}

/// Shared view of the controls' enablement.
///
/// Every clone observes each lock and unlock the owning controller makes,
/// so a front-end on another thread can disable its widgets without going
/// through the controller.
#[derive(Debug, Clone, Default)]
pub struct ControlLock(Arc<AtomicBool>);

impl ControlLock {
    pub fn state(&self) -> ControlState {
        if self.0.load(Ordering::Acquire) {
            ControlState::Locked
        } else {
            ControlState::Unlocked
        }
    }

    fn set(&self, state: ControlState) {
        self.0.store(state.is_locked(), Ordering::Release);
    }
}

// ============================================================================
// Playback Controller
// ============================================================================

/// UI-side controller wrapping a [`SpeechService`].
///
/// ## Examples
///
/// ```ignore
/// use speech_deck::{HostSpeechService, PlaybackController};
///
/// let mut controller = PlaybackController::new(HostSpeechService::detect());
/// controller.set_text("Hello there");
/// controller.play();
/// ```
pub struct PlaybackController<S: SpeechService> {
    service: S,
    events: UnboundedReceiver<SpeechEvent>,
    registry: VoiceRegistry,
    panel: ControlPanel,
    config: DeckConfig,
    lock: ControlLock,
    active: Option<UtteranceId>,
}

impl<S: SpeechService> PlaybackController<S> {
    /// Build a controller with default slider settings.
    pub fn new(service: S) -> Self {
        Self::with_config(service, DeckConfig::default())
    }

    /// Build a controller, subscribe to the service and reach the initial
    /// `Idle` state through the reset path.
    pub fn with_config(mut service: S, config: DeckConfig) -> Self {
        let (sink, events) = EventSink::channel();
        service.subscribe(sink);

        let panel = ControlPanel::new(&config);
        let mut controller = Self {
            service,
            events,
            registry: VoiceRegistry::new(),
            panel,
            config,
            lock: ControlLock::default(),
            active: None,
        };

        controller.refresh_voices();
        controller.reset();
        controller.sync_rate_readout();
        controller.sync_volume_readout();
        controller
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// `Speaking` while the controls are locked, `Idle` otherwise.
    pub fn state(&self) -> PlaybackState {
        if self.panel.controls.is_locked() {
            PlaybackState::Speaking
        } else {
            PlaybackState::Idle
        }
    }

    /// A handle that follows the lock state of this controller.
    pub fn control_lock(&self) -> ControlLock {
        self.lock.clone()
    }

    /// The utterance most recently submitted and not yet reported finished.
    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active
    }

    /// The voice the next utterance would use.
    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        self.panel
            .selected_voice
            .and_then(|index| self.registry.lookup(index))
    }

    // ------------------------------------------------------------------------
    // Control input
    // ------------------------------------------------------------------------

    /// Replace the text field contents. The text field is never locked.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.panel.text = text.into();
    }

    /// Select a voice by dropdown value.
    ///
    /// An index that names no option clears the selection, so the next
    /// utterance falls back to the service's default voice.
    ///
    /// ## Errors
    ///
    /// Returns `ControlError::Locked` while speech is active.
    pub fn select_voice(&mut self, index: usize) -> Result<Option<&VoiceDescriptor>, ControlError> {
        self.ensure_unlocked(Control::Voice)?;

        if self.registry.lookup(index).is_some() {
            self.panel.selected_voice = Some(index);
        } else {
            debug!(index, voice_count = self.registry.len(), "Voice index out of range");
            self.panel.selected_voice = None;
        }

        Ok(self.selected_voice())
    }

    /// Move the rate slider. Returns the clamped value.
    ///
    /// ## Errors
    ///
    /// Returns `ControlError::Locked` while speech is active and
    /// `ControlError::NotFinite` for NaN or infinite input. The slider keeps
    /// its value in both cases.
    pub fn set_rate(&mut self, rate: f64) -> Result<f64, ControlError> {
        self.ensure_unlocked(Control::Rate)?;
        ensure_finite(Control::Rate, rate)?;
        self.panel.rate = self.config.clamp_rate(rate);
        self.sync_rate_readout();
        Ok(self.panel.rate)
    }

    /// Move the volume slider (0-100 scale). Returns the clamped value.
    ///
    /// ## Errors
    ///
    /// Same as [`set_rate`](Self::set_rate).
    pub fn set_volume(&mut self, volume: f64) -> Result<f64, ControlError> {
        self.ensure_unlocked(Control::Volume)?;
        ensure_finite(Control::Volume, volume)?;
        self.panel.volume = self.config.clamp_volume(volume);
        self.sync_volume_readout();
        Ok(self.panel.volume)
    }

    // ------------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------------

    /// Speak the current text with the current voice, rate and volume.
    ///
    /// Whitespace-only text is ignored. Otherwise any prior speech is
    /// cancelled first, so calling this while speaking restarts playback.
    pub fn play(&mut self) -> PlayOutcome {
        let text = self.panel.text.trim();
        if text.is_empty() {
            trace!("Ignoring play with empty text");
            return PlayOutcome::Ignored;
        }
        let text = text.to_string();

        self.service.cancel();
        self.lock();

        let voice = self.selected_voice().cloned();
        if voice.is_none() {
            debug!("No voice selected, using service default");
        }

        let utterance = Utterance::new(text)
            .with_voice(voice)
            .with_rate(self.panel.rate as f32)
            .with_volume((self.panel.volume / 100.0) as f32);

        match self.service.speak(utterance) {
            Ok(id) => {
                info!(utterance = %id, rate = self.panel.rate, volume = self.panel.volume, "Submitted utterance");
                self.active = Some(id);
                PlayOutcome::Submitted(id)
            }
            Err(e) => {
                warn!(error = %e, "Speech service refused utterance");
                self.active = None;
                self.unlock();
                PlayOutcome::Failed
            }
        }
    }

    /// Pause active speech. Lock state is unchanged.
    pub fn pause(&mut self) {
        trace!(utterance = ?self.active, "Pause");
        self.service.pause();
    }

    /// Resume paused speech. Lock state is unchanged.
    pub fn resume(&mut self) {
        trace!(utterance = ?self.active, "Resume");
        self.service.resume();
    }

    /// Stop all speech and restore every control to its default.
    ///
    /// Idempotent.
    pub fn reset(&mut self) {
        self.service.cancel();
        self.active = None;

        self.panel.text.clear();
        self.panel.rate = self.config.default_rate;
        self.sync_rate_readout();
        self.panel.volume = self.config.default_volume;
        self.sync_volume_readout();
        self.select_first_voice();
        self.unlock();
    }

    // ------------------------------------------------------------------------
    // Service events
    // ------------------------------------------------------------------------

    /// Apply one service event.
    pub fn handle_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::VoicesChanged => self.refresh_voices(),
            SpeechEvent::UtteranceEnded(id) => {
                if self.active == Some(id) {
                    self.active = None;
                } else {
                    debug!(utterance = %id, active = ?self.active, "Stale utterance completion");
                }
                self.unlock();
            }
        }
    }

    /// Apply every queued service event without waiting. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Wait for the next service event and apply it.
    ///
    /// Returns `None` once the service has dropped every sink.
    pub async fn next_event(&mut self) -> Option<SpeechEvent> {
        let event = self.events.recv().await?;
        self.handle_event(event);
        Some(event)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn refresh_voices(&mut self) {
        self.registry.refresh(self.service.voices());
        self.panel.voice_options = self.registry.options();
        self.select_first_voice();
    }

    fn select_first_voice(&mut self) {
        self.panel.selected_voice = if self.registry.is_empty() {
            None
        } else {
            Some(0)
        };
    }

    fn sync_rate_readout(&mut self) {
        self.panel.rate_readout = format_rate(self.panel.rate);
    }

    fn sync_volume_readout(&mut self) {
        self.panel.volume_readout = format_volume(self.panel.volume);
    }

    fn lock(&mut self) {
        self.panel.controls = ControlState::Locked;
        self.lock.set(ControlState::Locked);
    }

    fn unlock(&mut self) {
        self.panel.controls = ControlState::Unlocked;
        self.lock.set(ControlState::Unlocked);
    }

    fn ensure_unlocked(&self, control: Control) -> Result<(), ControlError> {
        if self.panel.controls.is_locked() {
            Err(ControlError::Locked { control })
        } else {
            Ok(())
        }
    }
}

fn ensure_finite(control: Control, value: f64) -> Result<(), ControlError> {
    if value.is_finite() {
        Ok(())
    } else {
        debug!(%control, value, "Rejected non-finite slider value");
        Err(ControlError::NotFinite { control })
    }
}

// ============================================================================
// Tests
// ============================================================================
