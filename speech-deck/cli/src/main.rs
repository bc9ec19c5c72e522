mod console;
mod render;

use clap::{ArgAction, Parser};
use speech_deck::{HostSpeechService, PlaybackController, SpeechService};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive text-to-speech console
///
/// # Examples
///
/// ```no_run
/// // Open the console with some text ready to play
/// // speech-deck Hello world
///
/// // List the host's voices as JSON
/// // speech-deck --list-voices --json
/// ```
#[derive(Parser)]
#[command(name = "speech-deck")]
#[command(about = "Type text, pick a voice and control speech playback", long_about = None)]
#[command(version)]
struct Cli {
    /// Initial text for the text field
    text: Vec<String>,

    /// Preselect a voice by name (case-insensitive)
    #[arg(long, value_name = "NAME")]
    voice: Option<String>,

    /// Initial speech rate (0.1-10)
    #[arg(long, value_name = "RATE")]
    rate: Option<f64>,

    /// Initial volume (0-100)
    #[arg(long, value_name = "VOLUME")]
    volume: Option<f64>,

    /// Print the available voices and exit
    #[arg(long)]
    list_voices: bool,

    /// Print the voice list as JSON
    #[arg(long, requires = "list_voices")]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Joins the positional words into the initial text
fn join_args(args: Vec<String>) -> String {
    args.join(" ")
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Apply command-line presets to a freshly built controller.
fn apply_presets<S: SpeechService>(controller: &mut PlaybackController<S>, cli: &Cli) {
    if !cli.text.is_empty() {
        controller.set_text(join_args(cli.text.clone()));
    }

    if let Some(name) = &cli.voice {
        match controller.registry().find_by_name(name).map(|voice| voice.index) {
            Some(index) => {
                if let Err(e) = controller.select_voice(index) {
                    warn!(error = %e, "Could not preselect voice");
                }
            }
            None => warn!(voice = %name, "Voice not found, using the first voice"),
        }
    }

    if let Some(rate) = cli.rate
        && let Err(e) = controller.set_rate(rate)
    {
        warn!(error = %e, "Could not preset rate");
    }

    if let Some(volume) = cli.volume
        && let Err(e) = controller.set_volume(volume)
    {
        warn!(error = %e, "Could not preset volume");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let service = HostSpeechService::detect();
    let mut controller = PlaybackController::new(service.clone());

    if service.engine().is_some()
        && let Err(e) = service.load_voices().await
    {
        warn!(error = %e, "Failed to load voices");
    }
    controller.pump();

    if cli.list_voices {
        let voices = controller.registry().voices();
        if cli.json {
            println!("{}", serde_json::to_string_pretty(voices)?);
        } else {
            render::print_voices(voices);
        }
        return Ok(());
    }

    apply_presets(&mut controller, &cli);
    console::run(&mut controller)?;

    Ok(())
}
