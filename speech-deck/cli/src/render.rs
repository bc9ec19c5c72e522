//! Terminal rendering of the control panel.

use owo_colors::OwoColorize;
use speech_deck::{ControlPanel, ControlState, VoiceDescriptor};

/// Text shown for an empty text field.
const EMPTY_TEXT: &str = "(empty)";

/// Longest text preview before truncation, in characters.
const PREVIEW_CHARS: usize = 60;

/// Print the panel above the next prompt.
pub fn print_panel(panel: &ControlPanel) {
    println!();
    println!("{}", "── speech deck ──".bold());
    println!("  {:<9} {}", "Text".dimmed(), text_preview(&panel.text));
    println!(
        "  {:<9} {}",
        "Voice".dimmed(),
        panel.selected_label().unwrap_or("(engine default)").cyan()
    );
    println!("  {:<9} {}", "Rate".dimmed(), panel.rate_readout.yellow());
    println!("  {:<9} {}", "Volume".dimmed(), panel.volume_readout.yellow());
    match panel.controls {
        ControlState::Unlocked => println!("  {:<9} {}", "Controls".dimmed(), "unlocked".green()),
        ControlState::Locked => println!("  {:<9} {}", "Controls".dimmed(), "locked (speaking)".red()),
    }
}

/// Print the voice list for `--list-voices`.
pub fn print_voices(voices: &[VoiceDescriptor]) {
    if voices.is_empty() {
        println!("No voices available.");
        return;
    }

    println!("{} voices:\n", voices.len());
    for voice in voices {
        println!("  [{:>3}] {}", voice.index, voice.label());
    }
}

/// Single-line, length-limited preview of the text field.
fn text_preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return EMPTY_TEXT.to_string();
    }

    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("\"{cut}…\"")
    } else {
        format!("\"{flat}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_empty() {
        assert_eq!(text_preview(""), "(empty)");
        assert_eq!(text_preview("  \n "), "(empty)");
    }

    #[test]
    fn test_preview_flattens_whitespace() {
        assert_eq!(text_preview("Hello\n  world"), "\"Hello world\"");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "a".repeat(80);
        let preview = text_preview(&long);
        assert!(preview.ends_with("…\""));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }
}
