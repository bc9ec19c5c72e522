use crate::types::Control;

/// Errors raised by a speech service backend.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// No usable synthesis engine was found on the host.
    #[error("No speech engine found (looked for say, espeak-ng, espeak)")]
    NoEngine,

    /// Failed to spawn the engine process.
    #[error("Failed to spawn {engine}")]
    ProcessSpawnFailed {
        /// The engine binary that failed to spawn.
        engine: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The engine's stdin could not be opened or written.
    #[error("Failed to write text to {engine} stdin")]
    StdinWriteError {
        /// The engine binary.
        engine: String,
    },

    /// Listing the engine's voices failed.
    #[error("Voice enumeration failed for {engine}: {message}")]
    VoiceEnumerationFailed {
        /// The engine binary.
        engine: String,
        /// Details about the failure.
        message: String,
    },
}

/// Errors raised when input reaches a control that does not accept it.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The control is disabled while speech is active.
    #[error("The {control} is locked while speaking")]
    Locked {
        /// The control the input was aimed at.
        control: Control,
    },

    /// The value is NaN or infinite.
    #[error("The {control} needs a finite number")]
    NotFinite {
        /// The control the input was aimed at.
        control: Control,
    },
}
