//! Slider defaults and bounds for the playback controller.

use serde::{Deserialize, Serialize};

/// Configuration for a [`PlaybackController`](crate::PlaybackController).
///
/// Use the builder pattern to construct:
///
/// ```
/// use speech_deck::DeckConfig;
///
/// let config = DeckConfig::new()
///     .with_default_rate(1.5)
///     .with_default_volume(80.0);
/// assert_eq!(config.default_rate, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Rate restored on reset.
    pub default_rate: f64,
    /// Volume (0-100 scale) restored on reset.
    pub default_volume: f64,
    /// Lowest accepted rate.
    pub min_rate: f64,
    /// Highest accepted rate.
    pub max_rate: f64,
    /// Lowest accepted volume.
    pub min_volume: f64,
    /// Highest accepted volume.
    pub max_volume: f64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            default_rate: 1.0,
            default_volume: 50.0,
            min_rate: 0.1,
            max_rate: 10.0,
            min_volume: 0.0,
            max_volume: 100.0,
        }
    }
}

impl DeckConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rate restored on reset (clamped to the rate bounds).
    #[must_use]
    pub fn with_default_rate(mut self, rate: f64) -> Self {
        self.default_rate = rate.clamp(self.min_rate, self.max_rate);
        self
    }

    /// Set the volume restored on reset (clamped to the volume bounds).
    #[must_use]
    pub fn with_default_volume(mut self, volume: f64) -> Self {
        self.default_volume = volume.clamp(self.min_volume, self.max_volume);
        self
    }

    /// Set the rate slider bounds. Swapped bounds are reordered.
    #[must_use]
    pub fn with_rate_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_rate = min.min(max);
        self.max_rate = max.max(min);
        self.default_rate = self.default_rate.clamp(self.min_rate, self.max_rate);
        self
    }

    pub fn clamp_rate(&self, rate: f64) -> f64 {
        rate.clamp(self.min_rate, self.max_rate)
    }

    pub fn clamp_volume(&self, volume: f64) -> f64 {
        volume.clamp(self.min_volume, self.max_volume)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeckConfig::default();
        assert_eq!(config.default_rate, 1.0);
        assert_eq!(config.default_volume, 50.0);
        assert_eq!(config.min_rate, 0.1);
        assert_eq!(config.max_rate, 10.0);
        assert_eq!(config.min_volume, 0.0);
        assert_eq!(config.max_volume, 100.0);
    }

    #[test]
    fn test_clamp_rate() {
        let config = DeckConfig::default();
        assert_eq!(config.clamp_rate(0.0), 0.1);
        assert_eq!(config.clamp_rate(25.0), 10.0);
        assert_eq!(config.clamp_rate(1.5), 1.5);
    }

    #[test]
    fn test_clamp_volume() {
        let config = DeckConfig::default();
        assert_eq!(config.clamp_volume(-5.0), 0.0);
        assert_eq!(config.clamp_volume(150.0), 100.0);
    }

    #[test]
    fn test_builder_clamps_defaults() {
        let config = DeckConfig::new()
            .with_default_rate(50.0)
            .with_default_volume(300.0);
        assert_eq!(config.default_rate, 10.0);
        assert_eq!(config.default_volume, 100.0);
    }

    #[test]
    fn test_rate_bounds_reordered() {
        let config = DeckConfig::new().with_rate_bounds(4.0, 0.5);
        assert_eq!(config.min_rate, 0.5);
        assert_eq!(config.max_rate, 4.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DeckConfig = serde_json::from_str(r#"{"default_volume": 70}"#).unwrap();
        assert_eq!(config.default_volume, 70.0);
        assert_eq!(config.default_rate, 1.0);
    }
}
