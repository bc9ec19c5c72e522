//! Core types for the speech-deck playback controller.
//!
//! This module defines the values that flow between the controller, the
//! front-end and the speech service:
//! - Voice descriptors as enumerated by the speech service
//! - Utterances submitted for synthesis
//! - Control enablement and playback lifecycle states
//! - Events the speech service reports back

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Voice Descriptor
// ============================================================================

/// A named, language-tagged synthetic voice reported by the speech service.
///
/// Descriptors are immutable once enumerated. The whole set is replaced each
/// time the service announces a catalog change, so an `index` is only
/// meaningful against the enumeration it came from.
///
/// ## Examples
///
/// ```
/// use speech_deck::types::VoiceDescriptor;
///
/// let voice = VoiceDescriptor::new("Ava", "en-US");
/// assert_eq!(voice.label(), "Ava(en-US)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// The display name of the voice.
    pub name: String,
    /// Language identifier (BCP-47 style, e.g. `en-US`).
    pub lang: String,
    /// Position in the enumeration order returned by the service.
    pub index: usize,
    /// Backend-specific handle used to select this voice.
    ///
    /// Some engines select voices by something other than the display name
    /// (eSpeak uses the language code, e.g. `en-us`). When `None` the name is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl VoiceDescriptor {
    /// Create a descriptor with index 0 and no identifier.
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            index: 0,
            identifier: None,
        }
    }

    /// Set the enumeration index.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Set the backend-specific identifier.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// The dropdown label: `"<name>(<lang>)"`.
    pub fn label(&self) -> String {
        format!("{}({})", self.name, self.lang)
    }

    /// The handle a backend should pass to its engine.
    pub fn selector(&self) -> &str {
        self.identifier.as_deref().unwrap_or(&self.name)
    }
}

/// One selectable entry in the voice dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOption {
    /// Text shown to the user.
    pub label: String,
    /// Index into the current voice enumeration.
    pub value: usize,
}

// ============================================================================
// Utterance
// ============================================================================

/// Identifier the speech service assigns to each submitted utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One discrete speech-synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// The text to speak (already trimmed).
    pub text: String,
    /// The voice to use, or `None` for the service default.
    pub voice: Option<VoiceDescriptor>,
    /// Speech rate multiplier where 1.0 is normal speed.
    pub rate: f32,
    /// Output volume in the range 0.0 to 1.0.
    pub volume: f32,
}

impl Utterance {
    /// Create an utterance at normal rate and full volume with the default voice.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            rate: 1.0,
            volume: 1.0,
        }
    }

    #[must_use]
    pub fn with_voice(mut self, voice: Option<VoiceDescriptor>) -> Self {
        self.voice = voice;
        self
    }

    #[must_use]
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Set the volume, clamped to 0.0-1.0.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }
}

// ============================================================================
// Control + Playback State
// ============================================================================

/// Shared enablement of the voice selector, rate slider and volume slider.
///
/// The three controls always transition together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlState {
    /// Controls accept input.
    #[default]
    Unlocked,
    /// Controls are disabled while speech is active.
    Locked,
}

impl ControlState {
    pub fn is_locked(&self) -> bool {
        matches!(self, ControlState::Locked)
    }
}

/// Logical playback lifecycle as seen by the controller.
///
/// Paused speech is still `Speaking`; the controller does not track the
/// pause sub-state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
}

/// Which lockable control an input was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Voice,
    Rate,
    Volume,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Control::Voice => "voice selector",
            Control::Rate => "rate slider",
            Control::Volume => "volume slider",
        };
        f.write_str(name)
    }
}

/// Result of a play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// An utterance was handed to the speech service.
    Submitted(UtteranceId),
    /// The text was empty or whitespace; nothing happened.
    Ignored,
    /// The speech service refused the utterance; controls were unlocked.
    Failed,
}

// ============================================================================
// Speech Events
// ============================================================================

/// Notifications the speech service delivers to its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The service's voice catalog changed; re-enumerate.
    VoicesChanged,
    /// An utterance finished speaking naturally.
    UtteranceEnded(UtteranceId),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_label() {
        let voice = VoiceDescriptor::new("Samantha", "en-US");
        assert_eq!(voice.label(), "Samantha(en-US)");
    }

    #[test]
    fn test_voice_selector_prefers_identifier() {
        let voice = VoiceDescriptor::new("English_(America)", "en-us").with_identifier("en-us");
        assert_eq!(voice.selector(), "en-us");

        let voice = VoiceDescriptor::new("Alex", "en-US");
        assert_eq!(voice.selector(), "Alex");
    }

    #[test]
    fn test_voice_serializes_without_empty_identifier() {
        let voice = VoiceDescriptor::new("Ava", "en-US").with_index(3);
        let json = serde_json::to_string(&voice).unwrap();
        assert_eq!(json, r#"{"name":"Ava","lang":"en-US","index":3}"#);
    }

    #[test]
    fn test_utterance_volume_clamped() {
        assert_eq!(Utterance::new("hi").with_volume(1.5).volume, 1.0);
        assert_eq!(Utterance::new("hi").with_volume(-0.2).volume, 0.0);
        assert_eq!(Utterance::new("hi").with_volume(0.5).volume, 0.5);
    }

    #[test]
    fn test_control_state_default_unlocked() {
        assert_eq!(ControlState::default(), ControlState::Unlocked);
        assert!(!ControlState::Unlocked.is_locked());
        assert!(ControlState::Locked.is_locked());
    }

    #[test]
    fn test_utterance_id_display() {
        assert_eq!(UtteranceId(7).to_string(), "#7");
    }
}
