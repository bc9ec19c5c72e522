//! Speech service backed by the host's command-line synthesizers.
//!
//! Uses macOS `say` when present, otherwise `espeak-ng` or `espeak`. Each
//! utterance runs as a child process with the text piped on stdin; a
//! watcher task reports completion through the subscribed [`EventSink`].
//!
//! Voices load lazily: [`HostSpeechService::voices`] is empty until
//! [`HostSpeechService::load_voices`] has run, which then announces
//! [`SpeechEvent::VoicesChanged`].

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::sys::wait::waitpid;
#[cfg(unix)]
use nix::unistd::Pid;

use crate::errors::SpeechError;
use crate::traits::{EventSink, SpeechService};
use crate::types::{SpeechEvent, Utterance, UtteranceId, VoiceDescriptor};

/// Speaking rate both engines use at 1.0x, in words per minute.
const BASE_RATE_WPM: f32 = 175.0;

// ============================================================================
// Engine
// ============================================================================

/// A host synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Engine {
    /// macOS built-in `say`.
    Say,
    /// eSpeak or eSpeak-NG, by binary name.
    ESpeak { binary: String },
}

impl Engine {
    /// Find the preferred engine installed on this host.
    pub fn detect() -> Option<Engine> {
        if cfg!(target_os = "macos") && which::which("say").is_ok() {
            return Some(Engine::Say);
        }

        ["espeak-ng", "espeak"]
            .into_iter()
            .find(|binary| which::which(binary).is_ok())
            .map(|binary| Engine::ESpeak {
                binary: binary.to_string(),
            })
    }

    pub fn binary(&self) -> &str {
        match self {
            Engine::Say => "say",
            Engine::ESpeak { binary } => binary,
        }
    }

    /// Command-line arguments for speaking `utterance`. Text goes on stdin.
    fn speak_args(&self, utterance: &Utterance) -> Vec<String> {
        let wpm = (BASE_RATE_WPM * utterance.rate).round().max(1.0) as u32;
        let mut args = Vec::new();

        if let Some(voice) = &utterance.voice {
            args.push("-v".to_string());
            args.push(voice.selector().to_string());
        }

        match self {
            Engine::Say => {
                args.push("-r".to_string());
                args.push(wpm.to_string());
            }
            Engine::ESpeak { .. } => {
                args.push("-s".to_string());
                args.push(wpm.to_string());
                // eSpeak amplitude: 0-200, 100 is the engine default
                let amplitude = (utterance.volume * 100.0).round() as u32;
                args.push("-a".to_string());
                args.push(amplitude.to_string());
            }
        }

        args
    }

    /// Text written to the engine's stdin.
    ///
    /// `say` has no volume flag, so volume is set with an embedded
    /// `[[volm]]` command instead.
    fn speak_input(&self, utterance: &Utterance) -> String {
        match self {
            Engine::Say => format!("[[volm {:.2}]] {}", utterance.volume, utterance.text),
            Engine::ESpeak { .. } => utterance.text.clone(),
        }
    }

    fn list_args(&self) -> &'static [&'static str] {
        match self {
            Engine::Say => &["-v", "?"],
            Engine::ESpeak { .. } => &["--voices"],
        }
    }

    fn parse_voices(&self, listing: &str) -> Vec<VoiceDescriptor> {
        let parse: fn(&str) -> Option<VoiceDescriptor> = match self {
            Engine::Say => parse_say_voice_line,
            Engine::ESpeak { .. } => parse_espeak_voice_line,
        };

        listing
            .lines()
            .filter_map(|line| {
                let voice = parse(line);
                if voice.is_none() {
                    trace!(engine = self.binary(), line, "Skipping unparseable voice line");
                }
                voice
            })
            .enumerate()
            .map(|(index, voice)| voice.with_index(index))
            .collect()
    }
}

/// Parse one line of `say -v '?'` output.
///
/// ```text
/// Samantha            en_US    # Hello! My name is Samantha.
/// Eddy (English (US)) en_US    # Hello! My name is Eddy.
/// ```
fn parse_say_voice_line(line: &str) -> Option<VoiceDescriptor> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let metadata = line.split('#').next()?.trim();
    let locale = metadata.split_whitespace().last()?;
    let name_end = metadata.rfind(locale)?;
    let name = metadata[..name_end].trim();

    if name.is_empty() {
        return None;
    }

    Some(VoiceDescriptor::new(name, locale.replace('_', "-")))
}

/// Parse one line of `espeak --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  2  en-us              --/M      English_(America)  gmw/en-US            (en 3)
/// ```
///
/// The language code doubles as the identifier passed to `-v`.
fn parse_espeak_voice_line(line: &str) -> Option<VoiceDescriptor> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    // Pty, Language, Age/Gender, VoiceName, File
    if parts.len() < 5 {
        return None;
    }

    // skips the header row
    parts[0].parse::<u32>().ok()?;

    let lang = parts[1];
    let name = parts[3];
    if lang.is_empty() || name.is_empty() {
        return None;
    }

    Some(VoiceDescriptor::new(name, lang).with_identifier(lang))
}

// ============================================================================
// Host Speech Service
// ============================================================================

#[derive(Debug)]
struct ActiveUtterance {
    id: UtteranceId,
    pid: Option<u32>,
    cancel: oneshot::Sender<()>,
}

#[derive(Debug)]
struct Inner {
    engine: Option<Engine>,
    voices: RwLock<Vec<VoiceDescriptor>>,
    sink: Mutex<Option<EventSink>>,
    active: Mutex<Option<ActiveUtterance>>,
    next_id: AtomicU64,
}

impl Inner {
    fn emit(&self, event: SpeechEvent) {
        let sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sink) = sink.as_ref() {
            sink.emit(event);
        }
    }

    fn take_active(&self) -> Option<ActiveUtterance> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Clear the active slot if it still belongs to `id`.
    ///
    /// Returns `false` when `id` was cancelled or superseded.
    fn finish(&self, id: UtteranceId) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|current| current.id == id) {
            *active = None;
            true
        } else {
            false
        }
    }

    /// Stop the active utterance. The engine process is dead and reaped
    /// when this returns (Unix).
    fn cancel_active(&self) {
        let Some(active) = self.take_active() else {
            return;
        };

        if active.cancel.send(()).is_err() {
            trace!(utterance = %active.id, "Watcher already finished");
        }

        #[cfg(unix)]
        {
            if let Some(pid) = active.pid {
                terminate(pid);
            }
        }

        debug!(utterance = %active.id, "Cancelled utterance");
    }

    fn active_pid(&self) -> Option<u32> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|active| active.pid)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel_active();
    }
}

// ============================================================================
// Signals
// ============================================================================

/// Send `signal` to `pid`. Returns `false` if the process is gone or the
/// signal could not be delivered.
#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) -> bool {
    match signal::kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => true,
        Err(Errno::ESRCH) => {
            trace!(pid, ?signal, "Speech process already exited");
            false
        }
        Err(e) => {
            warn!(pid, ?signal, error = %e, "Failed to signal speech process");
            false
        }
    }
}

/// Kill `pid` and reap it before returning.
///
/// SIGKILL also ends a process stopped by SIGSTOP.
#[cfg(unix)]
fn terminate(pid: u32) {
    if !send_signal(pid, Signal::SIGKILL) {
        return;
    }

    loop {
        match waitpid(Pid::from_raw(pid as i32), None) {
            Ok(status) => {
                trace!(pid, ?status, "Reaped cancelled speech process");
                return;
            }
            Err(Errno::EINTR) => continue,
            // reaped by the runtime first
            Err(Errno::ECHILD) => return,
            Err(e) => {
                warn!(pid, error = %e, "Failed to reap speech process");
                return;
            }
        }
    }
}

/// [`SpeechService`] over the host's `say` / `espeak` binaries.
///
/// Cloning yields another handle to the same service, so a front-end can
/// keep one to call [`load_voices`](Self::load_voices) after handing the
/// other to the controller.
///
/// `speak` must be called from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct HostSpeechService {
    inner: Arc<Inner>,
}

impl HostSpeechService {
    /// Use the preferred engine installed on this host, if any.
    pub fn detect() -> Self {
        let engine = Engine::detect();
        match &engine {
            Some(engine) => debug!(engine = engine.binary(), "Detected speech engine"),
            None => warn!("No speech engine found on this host"),
        }
        Self::with_engine(engine)
    }

    /// Use a specific engine, or none at all.
    pub fn with_engine(engine: Option<Engine>) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                voices: RwLock::new(Vec::new()),
                sink: Mutex::new(None),
                active: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.inner.engine.as_ref()
    }

    /// Enumerate the engine's voices, replace the snapshot and announce the
    /// change. Returns the number of voices found.
    ///
    /// ## Errors
    ///
    /// Returns `SpeechError` when there is no engine or listing fails.
    pub async fn load_voices(&self) -> Result<usize, SpeechError> {
        let engine = self.inner.engine.as_ref().ok_or(SpeechError::NoEngine)?;
        let binary = engine.binary();

        let output = tokio::process::Command::new(binary)
            .args(engine.list_args())
            .output()
            .await
            .map_err(|e| SpeechError::VoiceEnumerationFailed {
                engine: binary.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SpeechError::VoiceEnumerationFailed {
                engine: binary.to_string(),
                message: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let voices = engine.parse_voices(&String::from_utf8_lossy(&output.stdout));
        let count = voices.len();
        *self
            .inner
            .voices
            .write()
            .unwrap_or_else(PoisonError::into_inner) = voices;

        info!(engine = binary, voice_count = count, "Loaded voices");
        self.inner.emit(SpeechEvent::VoicesChanged);
        Ok(count)
    }

    #[cfg(unix)]
    fn signal_active(&self, signal: Signal) {
        match self.inner.active_pid() {
            Some(pid) => {
                if send_signal(pid, signal) {
                    trace!(pid, ?signal, "Signalled speech process");
                }
            }
            None => trace!(?signal, "No active utterance to signal"),
        }
    }
}

impl SpeechService for HostSpeechService {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.inner
            .voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe(&mut self, sink: EventSink) {
        *self.inner.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId, SpeechError> {
        let engine = self.inner.engine.as_ref().ok_or(SpeechError::NoEngine)?;
        let binary = engine.binary().to_string();

        let mut child = tokio::process::Command::new(&binary)
            .args(engine.speak_args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // on Unix the process is killed and reaped by `cancel` instead
            .kill_on_drop(cfg!(not(unix)))
            .spawn()
            .map_err(|e| SpeechError::ProcessSpawnFailed {
                engine: binary.clone(),
                source: e,
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| SpeechError::StdinWriteError {
            engine: binary.clone(),
        })?;

        let id = UtteranceId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (cancel, mut cancelled) = oneshot::channel();
        *self.inner.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveUtterance {
            id,
            pid: child.id(),
            cancel,
        });

        let input = engine.speak_input(&utterance);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                debug!(engine = %binary, utterance = %id, error = %e, "Failed to write text");
            }
            // EOF tells the engine the text is complete
            drop(stdin);

            tokio::select! {
                biased;

                _ = &mut cancelled => {
                    #[cfg(not(unix))]
                    {
                        if let Err(e) = child.kill().await {
                            debug!(utterance = %id, error = %e, "Engine already gone");
                        }
                    }
                    trace!(utterance = %id, "Utterance cancelled");
                }
                status = child.wait() => {
                    if !inner.finish(id) {
                        trace!(utterance = %id, "Engine exit after cancel");
                        return;
                    }
                    match status {
                        Ok(status) if status.success() => debug!(utterance = %id, "Utterance finished"),
                        Ok(status) => warn!(engine = %binary, utterance = %id, %status, "Engine exited with failure"),
                        Err(e) => warn!(engine = %binary, utterance = %id, error = %e, "Failed waiting on engine"),
                    }
                    inner.emit(SpeechEvent::UtteranceEnded(id));
                }
            }
        });

        Ok(id)
    }

    fn pause(&mut self) {
        #[cfg(unix)]
        self.signal_active(Signal::SIGSTOP);

        #[cfg(not(unix))]
        warn!("Pause is not supported on this platform");
    }

    fn resume(&mut self) {
        #[cfg(unix)]
        self.signal_active(Signal::SIGCONT);

        #[cfg(not(unix))]
        warn!("Resume is not supported on this platform");
    }

    fn cancel(&mut self) {
        self.inner.cancel_active();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn espeak() -> Engine {
        Engine::ESpeak {
            binary: "espeak-ng".into(),
        }
    }

    // ========================================================================
    // Argument construction
    // ========================================================================

    #[test]
    fn test_say_args() {
        let utterance = Utterance::new("Hello")
            .with_voice(Some(VoiceDescriptor::new("Samantha", "en-US")))
            .with_rate(2.0);
        assert_eq!(
            Engine::Say.speak_args(&utterance),
            vec!["-v", "Samantha", "-r", "350"]
        );
    }

    #[test]
    fn test_say_input_embeds_volume() {
        let utterance = Utterance::new("Hello").with_volume(0.5);
        assert_eq!(Engine::Say.speak_input(&utterance), "[[volm 0.50]] Hello");
    }

    #[test]
    fn test_espeak_args_use_identifier() {
        let voice = VoiceDescriptor::new("English_(America)", "en-us").with_identifier("en-us");
        let utterance = Utterance::new("Hello")
            .with_voice(Some(voice))
            .with_rate(0.5)
            .with_volume(0.75);
        assert_eq!(
            espeak().speak_args(&utterance),
            vec!["-v", "en-us", "-s", "88", "-a", "75"]
        );
        assert_eq!(espeak().speak_input(&utterance), "Hello");
    }

    #[test]
    fn test_args_without_voice() {
        let utterance = Utterance::new("Hello");
        assert_eq!(espeak().speak_args(&utterance), vec!["-s", "175", "-a", "100"]);
    }

    #[test]
    fn test_engine_binary() {
        assert_eq!(Engine::Say.binary(), "say");
        assert_eq!(espeak().binary(), "espeak-ng");
    }

    // ========================================================================
    // Voice listing parsing
    // ========================================================================

    #[test]
    fn test_parse_say_simple() {
        let voice =
            parse_say_voice_line("Albert              en_US    # Hello! My name is Albert.").unwrap();
        assert_eq!(voice.name, "Albert");
        assert_eq!(voice.lang, "en-US");
        assert_eq!(voice.label(), "Albert(en-US)");
    }

    #[test]
    fn test_parse_say_qualified_name() {
        let voice =
            parse_say_voice_line("Eddy (English (US)) en_US    # Hello! My name is Eddy.").unwrap();
        assert_eq!(voice.name, "Eddy (English (US))");
        assert_eq!(voice.lang, "en-US");
    }

    #[test]
    fn test_parse_say_rejects_blank() {
        assert!(parse_say_voice_line("").is_none());
        assert!(parse_say_voice_line("   ").is_none());
        assert!(parse_say_voice_line("en_US # only a locale").is_none());
    }

    #[test]
    fn test_parse_espeak_line() {
        let voice = parse_espeak_voice_line(
            " 2  en-us              --/M      English_(America)  gmw/en-US            (en 3)",
        )
        .unwrap();
        assert_eq!(voice.name, "English_(America)");
        assert_eq!(voice.lang, "en-us");
        assert_eq!(voice.selector(), "en-us");
    }

    #[test]
    fn test_parse_espeak_skips_header() {
        assert!(parse_espeak_voice_line(
            "Pty Language       Age/Gender VoiceName          File                 Other Languages"
        )
        .is_none());
        assert!(parse_espeak_voice_line(" 5  af").is_none());
    }

    #[test]
    fn test_parse_voices_indexes_in_order() {
        let listing = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af                 --/M      Afrikaans          gmw/af
 2  en-us              --/M      English_(America)  gmw/en-US            (en 3)
";
        let voices = espeak().parse_voices(listing);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].index, 0);
        assert_eq!(voices[1].index, 1);
        assert_eq!(voices[1].label(), "English_(America)(en-us)");
    }

    // ========================================================================
    // Service behaviour
    // ========================================================================

    #[test]
    fn test_no_engine_refuses_speech() {
        let mut service = HostSpeechService::with_engine(None);
        assert!(service.voices().is_empty());
        assert!(matches!(
            service.speak(Utterance::new("Hello")),
            Err(SpeechError::NoEngine)
        ));
        service.pause();
        service.resume();
        service.cancel();
    }

    #[tokio::test]
    async fn test_load_voices_without_engine() {
        let service = HostSpeechService::with_engine(None);
        assert!(matches!(
            service.load_voices().await,
            Err(SpeechError::NoEngine)
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_spawn() {
        let mut service = HostSpeechService::with_engine(Some(Engine::ESpeak {
            binary: "speech-deck-no-such-binary".into(),
        }));
        assert!(matches!(
            service.speak(Utterance::new("Hello")),
            Err(SpeechError::ProcessSpawnFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_completion_event_reaches_subscriber() {
        // `true` ignores its arguments and exits immediately
        let mut service = HostSpeechService::with_engine(Some(Engine::ESpeak {
            binary: "true".into(),
        }));
        let (sink, mut rx) = EventSink::channel();
        service.subscribe(sink);

        let id = service.speak(Utterance::new("Hello")).unwrap();
        let event = rx.recv().await.unwrap();

        assert_eq!(event, SpeechEvent::UtteranceEnded(id));
        assert_eq!(service.inner.active_pid(), None);
    }

    /// Write an engine script that ignores its input and keeps running.
    #[cfg(unix)]
    fn long_running_engine(name: &str) -> Engine {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!(
            "speech-deck-{name}-{}.sh",
            std::process::id()
        ));
        std::fs::write(&path, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Engine::ESpeak {
            binary: path.display().to_string(),
        }
    }

    #[cfg(unix)]
    fn is_alive(pid: u32) -> bool {
        signal::kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_engine_before_returning() {
        let mut service = HostSpeechService::with_engine(Some(long_running_engine("cancel")));
        let (sink, mut rx) = EventSink::channel();
        service.subscribe(sink);

        service.speak(Utterance::new("Hello")).unwrap();
        let pid = service.inner.active_pid().unwrap();
        assert!(is_alive(pid));

        service.cancel();

        assert!(!is_alive(pid));
        assert_eq!(service.inner.active_pid(), None);

        // the watcher runs to completion without reporting the cancelled utterance
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_paused_engine() {
        let mut service = HostSpeechService::with_engine(Some(long_running_engine("paused")));

        service.speak(Utterance::new("Hello")).unwrap();
        let pid = service.inner.active_pid().unwrap();

        service.pause();
        assert!(is_alive(pid));
        service.resume();
        service.pause();

        service.cancel();
        assert!(!is_alive(pid));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_without_active_utterance_is_noop() {
        let mut service = HostSpeechService::with_engine(Some(long_running_engine("idle")));
        service.cancel();
        service.pause();
        service.resume();
        assert_eq!(service.inner.active_pid(), None);
    }
}
