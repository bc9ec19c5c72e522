//! The interactive prompt loop.

use std::fmt;

use inquire::{CustomType, InquireError, Select, Text};
use owo_colors::OwoColorize;
use speech_deck::{ControlError, PlayOutcome, PlaybackController, SpeechService};

use crate::render::print_panel;

/// One entry in the action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EditText,
    ChooseVoice,
    SetRate,
    SetVolume,
    Play,
    Pause,
    Resume,
    Reset,
    Quit,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Play,
        Action::Pause,
        Action::Resume,
        Action::EditText,
        Action::ChooseVoice,
        Action::SetRate,
        Action::SetVolume,
        Action::Reset,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::EditText => "Edit text",
            Action::ChooseVoice => "Choose voice",
            Action::SetRate => "Set rate",
            Action::SetVolume => "Set volume",
            Action::Play => "Play",
            Action::Pause => "Pause",
            Action::Resume => "Resume",
            Action::Reset => "Reset",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Treat `Esc` on a prompt as "skip" rather than an error.
fn skippable<T>(result: Result<T, InquireError>) -> Result<Option<T>, InquireError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Explain why a control ignored the input.
fn report_rejected(error: &ControlError) {
    println!("{}", error.to_string().yellow());
}

/// Run the menu until the user quits, then stop any speech.
///
/// ## Errors
///
/// Returns `InquireError` when the terminal cannot be prompted.
pub fn run<S: SpeechService>(controller: &mut PlaybackController<S>) -> Result<(), InquireError> {
    loop {
        controller.pump();
        print_panel(controller.panel());

        let action = match Select::new("Action:", Action::ALL.to_vec())
            .with_page_size(Action::ALL.len())
            .prompt()
        {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e),
        };

        // completion may have arrived while the menu was open
        controller.pump();

        match action {
            Action::Quit => break,
            Action::EditText => edit_text(controller)?,
            Action::ChooseVoice => choose_voice(controller)?,
            Action::SetRate => set_rate(controller)?,
            Action::SetVolume => set_volume(controller)?,
            Action::Play => play(controller),
            Action::Pause => controller.pause(),
            Action::Resume => controller.resume(),
            Action::Reset => controller.reset(),
        }
    }

    controller.reset();
    Ok(())
}

fn edit_text<S: SpeechService>(controller: &mut PlaybackController<S>) -> Result<(), InquireError> {
    let current = controller.panel().text.clone();
    if let Some(text) = skippable(Text::new("Text:").with_initial_value(&current).prompt())? {
        controller.set_text(text);
    }
    Ok(())
}

fn choose_voice<S: SpeechService>(
    controller: &mut PlaybackController<S>,
) -> Result<(), InquireError> {
    if controller.panel().controls.is_locked() {
        println!("{}", "The voice selector is locked while speaking".yellow());
        return Ok(());
    }

    let labels: Vec<String> = controller
        .panel()
        .voice_options
        .iter()
        .map(|option| option.label.clone())
        .collect();
    if labels.is_empty() {
        println!("{}", "No voices available; the engine default will be used".dimmed());
        return Ok(());
    }

    let cursor = controller.panel().selected_voice.unwrap_or(0);
    let choice = Select::new("Voice:", labels)
        .with_starting_cursor(cursor)
        .raw_prompt();

    if let Some(choice) = skippable(choice)? {
        // the catalog may have changed while the prompt was open
        controller.pump();
        if let Err(e) = controller.select_voice(choice.index) {
            report_rejected(&e);
        }
    }
    Ok(())
}

fn set_rate<S: SpeechService>(controller: &mut PlaybackController<S>) -> Result<(), InquireError> {
    if controller.panel().controls.is_locked() {
        println!("{}", "The rate slider is locked while speaking".yellow());
        return Ok(());
    }

    let config = controller.config();
    let message = format!("Rate ({}-{}):", config.min_rate, config.max_rate);
    let value = CustomType::<f64>::new(&message)
        .with_default(controller.panel().rate)
        .with_error_message("Please enter a number")
        .prompt();

    if let Some(value) = skippable(value)? {
        controller.pump();
        if let Err(e) = controller.set_rate(value) {
            report_rejected(&e);
        }
    }
    Ok(())
}

fn set_volume<S: SpeechService>(
    controller: &mut PlaybackController<S>,
) -> Result<(), InquireError> {
    if controller.panel().controls.is_locked() {
        println!("{}", "The volume slider is locked while speaking".yellow());
        return Ok(());
    }

    let config = controller.config();
    let message = format!("Volume ({}-{}):", config.min_volume, config.max_volume);
    let value = CustomType::<f64>::new(&message)
        .with_default(controller.panel().volume)
        .with_error_message("Please enter a number")
        .prompt();

    if let Some(value) = skippable(value)? {
        controller.pump();
        if let Err(e) = controller.set_volume(value) {
            report_rejected(&e);
        }
    }
    Ok(())
}

fn play<S: SpeechService>(controller: &mut PlaybackController<S>) {
    match controller.play() {
        PlayOutcome::Submitted(id) => println!("{} {}", "Speaking".green(), id.dimmed()),
        PlayOutcome::Ignored => println!("{}", "Nothing to say; enter some text first".dimmed()),
        PlayOutcome::Failed => println!("{}", "The speech engine refused the utterance".red()),
    }
}
