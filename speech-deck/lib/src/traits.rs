//! Traits for the speech-deck service boundary.
//!
//! This module defines the trait every speech backend implements and the
//! sink through which a backend reports events to its subscriber.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::trace;

use crate::errors::SpeechError;
use crate::types::{SpeechEvent, Utterance, UtteranceId, VoiceDescriptor};

/// Sending half of a speech service's event subscription.
///
/// Cloning is cheap; a backend may hand clones to the tasks that watch its
/// utterances. Sending never blocks and silently drops the event once the
/// subscriber is gone.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<SpeechEvent>,
}

impl EventSink {
    /// Create a connected sink / receiver pair.
    pub fn channel() -> (EventSink, UnboundedReceiver<SpeechEvent>) {
        let (tx, rx) = unbounded_channel();
        (EventSink { tx }, rx)
    }

    /// Deliver an event to the subscriber.
    pub fn emit(&self, event: SpeechEvent) {
        if self.tx.send(event).is_err() {
            trace!(?event, "Dropping event, subscriber is gone");
        }
    }
}

/// The platform capability performing voice synthesis and audio playback.
///
/// The controller never blocks on a service: `speak` returns as soon as the
/// utterance is queued and completion arrives later as
/// [`SpeechEvent::UtteranceEnded`] through the subscribed [`EventSink`].
///
/// ## Examples
///
/// ```
/// use speech_deck::{EventSink, SpeechError, SpeechService, Utterance, UtteranceId, VoiceDescriptor};
///
/// struct Silent;
///
/// impl SpeechService for Silent {
///     fn voices(&self) -> Vec<VoiceDescriptor> { Vec::new() }
///     fn subscribe(&mut self, _sink: EventSink) {}
///     fn speak(&mut self, _utterance: Utterance) -> Result<UtteranceId, SpeechError> {
///         Ok(UtteranceId(1))
///     }
///     fn pause(&mut self) {}
///     fn resume(&mut self) {}
///     fn cancel(&mut self) {}
/// }
/// ```
pub trait SpeechService {
    /// Snapshot of the voices currently known to the service.
    fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Register the sink that receives catalog and completion events.
    ///
    /// A later call replaces the earlier sink.
    fn subscribe(&mut self, sink: EventSink);

    /// Queue an utterance for synthesis.
    ///
    /// ## Errors
    ///
    /// Returns `SpeechError` if the service cannot accept the utterance.
    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId, SpeechError>;

    /// Pause active speech. A no-op when nothing is speaking.
    fn pause(&mut self);

    /// Resume paused speech. A no-op when nothing is paused.
    fn resume(&mut self);

    /// Stop and discard any active or queued speech.
    ///
    /// A cancelled utterance does not report completion.
    fn cancel(&mut self);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_delivers_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(SpeechEvent::VoicesChanged);
        sink.clone().emit(SpeechEvent::UtteranceEnded(UtteranceId(3)));

        assert_eq!(rx.try_recv().unwrap(), SpeechEvent::VoicesChanged);
        assert_eq!(
            rx.try_recv().unwrap(),
            SpeechEvent::UtteranceEnded(UtteranceId(3))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(SpeechEvent::VoicesChanged);
    }
}
