//! The cached voice enumeration backing the voice selector.

use tracing::debug;

use crate::types::{VoiceDescriptor, VoiceOption};

/// The current enumeration of available voices.
///
/// The registry is replaced wholesale on every refresh; indices from an
/// earlier enumeration are not carried over.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list with a fresh enumeration.
    ///
    /// Descriptors are re-indexed so each `index` matches its position.
    pub fn refresh(&mut self, voices: Vec<VoiceDescriptor>) {
        self.voices = voices
            .into_iter()
            .enumerate()
            .map(|(index, voice)| voice.with_index(index))
            .collect();

        debug!(voice_count = self.voices.len(), "Refreshed voice registry");
    }

    /// The voice at `index`, or `None` when the index is out of range.
    pub fn lookup(&self, index: usize) -> Option<&VoiceDescriptor> {
        self.voices.get(index)
    }

    /// Find a voice by name, ignoring ASCII case.
    pub fn find_by_name(&self, name: &str) -> Option<&VoiceDescriptor> {
        self.voices
            .iter()
            .find(|voice| voice.name.eq_ignore_ascii_case(name))
    }

    /// Dropdown entries in enumeration order.
    pub fn options(&self) -> Vec<VoiceOption> {
        self.voices
            .iter()
            .map(|voice| VoiceOption {
                label: voice.label(),
                value: voice.index,
            })
            .collect()
    }

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("Ava", "en-US"),
            VoiceDescriptor::new("Thomas", "fr-FR"),
            VoiceDescriptor::new("Anna", "de-DE"),
        ]
    }

    #[test]
    fn test_refresh_reindexes() {
        let mut registry = VoiceRegistry::new();
        registry.refresh(vec![
            VoiceDescriptor::new("Ava", "en-US").with_index(9),
            VoiceDescriptor::new("Thomas", "fr-FR").with_index(4),
        ]);

        assert_eq!(registry.lookup(0).unwrap().index, 0);
        assert_eq!(registry.lookup(1).unwrap().index, 1);
    }

    #[test]
    fn test_refresh_replaces_wholesale() {
        let mut registry = VoiceRegistry::new();
        registry.refresh(sample());
        assert_eq!(registry.len(), 3);

        registry.refresh(vec![VoiceDescriptor::new("Ava", "en-US")]);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(2).is_none());
    }

    #[test]
    fn test_lookup_empty_registry() {
        let registry = VoiceRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup(0).is_none());
    }

    #[test]
    fn test_options_labels_in_order() {
        let mut registry = VoiceRegistry::new();
        registry.refresh(sample());

        let options = registry.options();
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Ava(en-US)", "Thomas(fr-FR)", "Anna(de-DE)"]);
        assert_eq!(options[2].value, 2);
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let mut registry = VoiceRegistry::new();
        registry.refresh(sample());

        assert_eq!(registry.find_by_name("thomas").unwrap().index, 1);
        assert!(registry.find_by_name("Nobody").is_none());
    }
}
