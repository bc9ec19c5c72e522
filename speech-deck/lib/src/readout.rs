//! Readout formatting for the rate and volume sliders.
//!
//! Both projections are stateless and run on every slider movement.
//! Half-way values round away from zero.

/// Format a rate slider value with one decimal place and an `x` suffix.
///
/// ## Examples
///
/// ```
/// use speech_deck::readout::format_rate;
///
/// assert_eq!(format_rate(0.5), "0.5x");
/// assert_eq!(format_rate(2.0), "2.0x");
/// ```
pub fn format_rate(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{rounded:.1}x")
}

/// Format a volume slider value as an integer string.
///
/// ## Examples
///
/// ```
/// use speech_deck::readout::format_volume;
///
/// assert_eq!(format_volume(75.0), "75");
/// ```
pub fn format_volume(value: f64) -> String {
    format!("{:.0}", value.round())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rate_half() {
        assert_eq!(format_rate(0.5), "0.5x");
    }

    #[test]
    fn test_format_rate_integer_gets_decimal() {
        assert_eq!(format_rate(2.0), "2.0x");
        assert_eq!(format_rate(1.0), "1.0x");
        assert_eq!(format_rate(10.0), "10.0x");
    }

    #[test]
    fn test_format_rate_rounds_to_one_decimal() {
        assert_eq!(format_rate(1.26), "1.3x");
        assert_eq!(format_rate(0.14), "0.1x");
    }

    #[test]
    fn test_format_volume_integer() {
        assert_eq!(format_volume(75.0), "75");
        assert_eq!(format_volume(0.0), "0");
        assert_eq!(format_volume(100.0), "100");
    }

    #[test]
    fn test_format_volume_rounds_half_up() {
        assert_eq!(format_volume(49.5), "50");
        assert_eq!(format_volume(2.5), "3");
        assert_eq!(format_volume(12.4), "12");
    }
}
