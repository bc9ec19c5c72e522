//! List Voices Example
//!
//! This example loads the host engine's voices and prints the dropdown
//! entries a front-end would show.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p speech-deck --example list_voices
//! ```

use speech_deck::{HostSpeechService, PlaybackController};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = HostSpeechService::detect();
    let Some(engine) = service.engine() else {
        println!("No speech engine found (install espeak-ng, or use macOS `say`).");
        return Ok(());
    };
    println!("Engine: {}", engine.binary());

    let mut controller = PlaybackController::new(service.clone());
    println!("Voices before loading: {}", controller.panel().voice_options.len());

    service.load_voices().await?;
    controller.pump();

    let options = &controller.panel().voice_options;
    println!("Voices after loading: {}\n", options.len());
    for option in options.iter().take(40) {
        println!("  [{:>3}] {}", option.value, option.label);
    }
    if options.len() > 40 {
        println!("  ... and {} more", options.len() - 40);
    }

    Ok(())
}
