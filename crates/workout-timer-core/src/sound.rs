//! Phase-boundary sounds.
//!
//! Playback is fire-and-forget. The sound for a phase is chosen only by its
//! kind: an explicitly configured file wins, then `<sounds_dir>/<kind>.wav`.
//! Files are decoded and played in-process with rodio; an external player
//! is only tried when no audio device can be opened. Any failure is logged
//! and replaced by the fallback alert (a terminal bell by default) so the
//! countdown never waits on audio.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::PlaybackError;
use crate::protocol::PhaseKind;
use crate::storage::SoundConfig;

/// Something that can start playing a sound file.
pub trait SoundBackend {
    /// Begin playback and return without waiting for it to finish.
    fn play(&self, path: &Path, volume: f64) -> Result<(), PlaybackError>;
}

/// In-process playback on the default output device.
///
/// The output stream is opened on first use and kept for the lifetime of
/// the backend; detached sinks stop when it is dropped.
#[derive(Default)]
pub struct RodioBackend {
    output: RefCell<Option<(OutputStream, OutputStreamHandle)>>,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
        let file = File::open(path).map_err(|source| PlaybackError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn sink(&self) -> Result<Sink, PlaybackError> {
        let mut output = self.output.borrow_mut();
        if output.is_none() {
            let opened =
                OutputStream::try_default().map_err(|e| PlaybackError::Device(e.to_string()))?;
            tracing::debug!("audio output stream opened");
            *output = Some(opened);
        }
        let (_, handle) = output.as_ref().ok_or(PlaybackError::NoPlayer)?;
        Sink::try_new(handle).map_err(|e| PlaybackError::Device(e.to_string()))
    }
}

impl SoundBackend for RodioBackend {
    fn play(&self, path: &Path, volume: f64) -> Result<(), PlaybackError> {
        // Decode first so a bad file is reported without touching the device.
        let source = Self::decode(path)?;
        let sink = self.sink()?;
        sink.set_volume(volume.clamp(0.0, 1.0) as f32);
        sink.append(source);
        sink.detach();
        Ok(())
    }
}

/// Tries `primary`, then `secondary` when the primary cannot play at all.
///
/// A file the primary cannot open or decode is not retried.
pub struct WithFallback<P, S> {
    pub primary: P,
    pub secondary: S,
}

impl<P: SoundBackend, S: SoundBackend> SoundBackend for WithFallback<P, S> {
    fn play(&self, path: &Path, volume: f64) -> Result<(), PlaybackError> {
        match self.primary.play(path, volume) {
            Err(err @ (PlaybackError::Open { .. } | PlaybackError::Decode { .. })) => Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "primary audio backend failed, trying secondary");
                self.secondary.play(path, volume)
            }
            ok => ok,
        }
    }
}

/// rodio first, external players when there is no usable output device.
pub type DefaultBackend = WithFallback<RodioBackend, CommandBackend>;

/// External command-line players, probed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerProgram {
    Afplay,
    Paplay,
    Aplay,
}

impl PlayerProgram {
    const ALL: [PlayerProgram; 3] = [
        PlayerProgram::Afplay,
        PlayerProgram::Paplay,
        PlayerProgram::Aplay,
    ];

    pub fn binary(self) -> &'static str {
        match self {
            PlayerProgram::Afplay => "afplay",
            PlayerProgram::Paplay => "paplay",
            PlayerProgram::Aplay => "aplay",
        }
    }

    /// Arguments for playing `path` at `volume` (0.0 .. 1.0).
    pub fn args(self, path: &Path, volume: f64) -> Vec<String> {
        let file = path.display().to_string();
        match self {
            PlayerProgram::Afplay => vec!["-v".into(), format!("{volume:.2}"), file],
            // PulseAudio volume is linear with 65536 as 100%.
            PlayerProgram::Paplay => {
                vec![format!("--volume={}", (volume * 65536.0).round() as u32), file]
            }
            // aplay has no volume control.
            PlayerProgram::Aplay => vec!["-q".into(), file],
        }
    }
}

/// Plays sounds by spawning the first available [`PlayerProgram`].
///
/// Finished players are reaped on every `play` and on drop.
#[derive(Debug, Default)]
pub struct CommandBackend {
    player: Option<(PathBuf, PlayerProgram)>,
    children: RefCell<Vec<Child>>,
}

impl CommandBackend {
    /// Find a player on `PATH`.
    pub fn detect() -> Self {
        let search = std::env::var_os("PATH").unwrap_or_default();
        for kind in PlayerProgram::ALL {
            if let Some(found) = std::env::split_paths(&search)
                .map(|dir| dir.join(kind.binary()))
                .find(|candidate| candidate.is_file())
            {
                tracing::debug!(player = %found.display(), "audio player found");
                return Self::with_program(found, kind);
            }
        }
        tracing::debug!("no audio player on PATH");
        Self::none()
    }

    /// Use `program`, invoked with the arguments of `kind`.
    pub fn with_program(program: impl Into<PathBuf>, kind: PlayerProgram) -> Self {
        Self {
            player: Some((program.into(), kind)),
            children: RefCell::default(),
        }
    }

    /// A backend that never plays anything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn player(&self) -> Option<PlayerProgram> {
        self.player.as_ref().map(|(_, kind)| *kind)
    }

    /// Collect exited players. Returns how many are still running.
    pub fn reap(&self) -> usize {
        let mut children = self.children.borrow_mut();
        children.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        children.len()
    }
}

impl SoundBackend for CommandBackend {
    fn play(&self, path: &Path, volume: f64) -> Result<(), PlaybackError> {
        let Some((program, kind)) = &self.player else {
            return Err(PlaybackError::NoPlayer);
        };
        self.reap();
        let child = Command::new(program)
            .args(kind.args(path, volume))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                program: program.display().to_string(),
                source,
            })?;
        self.children.borrow_mut().push(child);
        Ok(())
    }
}

impl Drop for CommandBackend {
    fn drop(&mut self) {
        let running = self.reap();
        if running > 0 {
            tracing::debug!(running, "audio players still running at shutdown");
        }
    }
}

/// What happened when a cue was requested.
#[derive(Debug)]
pub enum PlayOutcome {
    Played(PathBuf),
    /// Sound is disabled or the volume is zero.
    Muted,
    /// The kind has no sound at all (e.g. `other`).
    Skipped,
    /// Playback failed and the fallback alert was used instead.
    Fallback(PlaybackError),
}

type Alert = Box<dyn FnMut()>;

/// Chooses and plays the sound for a phase kind.
pub struct SoundPlayer<B = DefaultBackend> {
    backend: B,
    config: SoundConfig,
    sounds_dir: PathBuf,
    on_fail: Alert,
}

impl SoundPlayer<DefaultBackend> {
    /// In-process playback, with any external player found on `PATH` as
    /// the secondary backend.
    pub fn detect(config: SoundConfig, sounds_dir: impl Into<PathBuf>) -> Self {
        let backend = WithFallback {
            primary: RodioBackend::new(),
            secondary: CommandBackend::detect(),
        };
        Self::new(backend, config, sounds_dir)
    }
}

impl<B: SoundBackend> SoundPlayer<B> {
    pub fn new(backend: B, config: SoundConfig, sounds_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            config,
            sounds_dir: sounds_dir.into(),
            on_fail: Box::new(terminal_bell),
        }
    }

    /// Replace the alert used when playback fails.
    pub fn with_fallback(mut self, on_fail: impl FnMut() + 'static) -> Self {
        self.on_fail = Box::new(on_fail);
        self
    }

    pub fn update_settings(&mut self, config: SoundConfig) {
        self.config = config;
    }

    /// File that would be played for `kind`.
    ///
    /// A configured file that does not exist falls back to the default.
    pub fn resolve(&self, kind: PhaseKind) -> Option<PathBuf> {
        if let Some(path) = self.config.sound_for(kind).filter(|p| p.is_file()) {
            return Some(path);
        }
        match kind {
            PhaseKind::Other => None,
            kind => Some(self.sounds_dir.join(format!("{}.wav", kind.as_str()))),
        }
    }

    pub fn play(&mut self, kind: PhaseKind) -> PlayOutcome {
        let volume = self.config.normalized_volume();
        if !self.config.enabled || volume <= 0.0 {
            return PlayOutcome::Muted;
        }
        let Some(path) = self.resolve(kind) else {
            return PlayOutcome::Skipped;
        };

        let result = if path.is_file() {
            self.backend.play(&path, volume)
        } else {
            Err(PlaybackError::MissingFile(path.clone()))
        };

        match result {
            Ok(()) => PlayOutcome::Played(path),
            Err(err) => {
                tracing::warn!(kind = %kind, error = %err, "sound playback failed, using fallback");
                (self.on_fail)();
                PlayOutcome::Fallback(err)
            }
        }
    }
}

fn terminal_bell() {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder {
        played: Rc<RefCell<Vec<(PathBuf, f64)>>>,
        fail: bool,
    }

    impl SoundBackend for Recorder {
        fn play(&self, path: &Path, volume: f64) -> Result<(), PlaybackError> {
            if self.fail {
                return Err(PlaybackError::NoPlayer);
            }
            self.played.borrow_mut().push((path.to_path_buf(), volume));
            Ok(())
        }
    }

    fn sounds_dir_with(kinds: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for kind in kinds {
            std::fs::write(dir.path().join(format!("{kind}.wav")), b"RIFF").unwrap();
        }
        dir
    }

    #[test]
    fn plays_default_file_for_kind() {
        let dir = sounds_dir_with(&["work"]);
        let backend = Recorder::default();
        let mut player = SoundPlayer::new(backend.clone(), SoundConfig::default(), dir.path());

        let outcome = player.play(PhaseKind::Work);
        assert!(matches!(outcome, PlayOutcome::Played(_)));
        let played = backend.played.borrow();
        assert_eq!(played[0].0, dir.path().join("work.wav"));
        assert_eq!(played[0].1, 0.8);
    }

    #[test]
    fn configured_file_wins() {
        let dir = sounds_dir_with(&["rest", "custom"]);
        let mut config = SoundConfig::default();
        config.phase_sounds.insert(
            "rest".into(),
            dir.path().join("custom.wav").display().to_string(),
        );
        let player = SoundPlayer::new(Recorder::default(), config, dir.path());
        assert_eq!(
            player.resolve(PhaseKind::Rest),
            Some(dir.path().join("custom.wav"))
        );
    }

    #[test]
    fn missing_configured_file_uses_default() {
        let dir = sounds_dir_with(&["rest"]);
        let mut config = SoundConfig::default();
        config
            .phase_sounds
            .insert("rest".into(), "/definitely/not/here.wav".into());
        let player = SoundPlayer::new(Recorder::default(), config, dir.path());
        assert_eq!(player.resolve(PhaseKind::Rest), Some(dir.path().join("rest.wav")));
    }

    #[test]
    fn muted_when_disabled_or_silent() {
        let dir = sounds_dir_with(&["work"]);
        let mut config = SoundConfig::default();
        config.volume = 0.0;
        let mut player = SoundPlayer::new(Recorder::default(), config.clone(), dir.path());
        assert!(matches!(player.play(PhaseKind::Work), PlayOutcome::Muted));

        config.volume = 1.0;
        config.enabled = false;
        player.update_settings(config);
        assert!(matches!(player.play(PhaseKind::Work), PlayOutcome::Muted));
    }

    #[test]
    fn other_kind_is_silent() {
        let dir = sounds_dir_with(&[]);
        let mut player = SoundPlayer::new(Recorder::default(), SoundConfig::default(), dir.path());
        assert!(matches!(player.play(PhaseKind::Other), PlayOutcome::Skipped));
    }

    #[test]
    fn failures_ring_the_fallback() {
        let dir = sounds_dir_with(&["work"]);
        let rang = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&rang);
        let backend = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut player = SoundPlayer::new(backend, SoundConfig::default(), dir.path())
            .with_fallback(move || *counter.borrow_mut() += 1);

        assert!(matches!(
            player.play(PhaseKind::Work),
            PlayOutcome::Fallback(PlaybackError::NoPlayer)
        ));
        assert!(matches!(
            player.play(PhaseKind::Finish),
            PlayOutcome::Fallback(PlaybackError::MissingFile(_))
        ));
        assert_eq!(*rang.borrow(), 2);
    }

    struct Failing(fn() -> PlaybackError);

    impl SoundBackend for Failing {
        fn play(&self, _path: &Path, _volume: f64) -> Result<(), PlaybackError> {
            Err((self.0)())
        }
    }

    /// Minimal 16-bit mono PCM WAV with `samples` silent frames.
    fn write_wav(path: &Path, samples: u32) {
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&16000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn rodio_reports_unreadable_files() {
        let dir = sounds_dir_with(&["work"]);
        let backend = RodioBackend::new();
        assert!(matches!(
            backend.play(&dir.path().join("missing.wav"), 1.0),
            Err(PlaybackError::Open { .. })
        ));
        assert!(matches!(
            backend.play(&dir.path().join("work.wav"), 1.0),
            Err(PlaybackError::Decode { .. })
        ));
    }

    #[test]
    fn valid_wav_plays_without_external_players() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("work.wav"), 800);
        // rodio plays it directly; hosts without an output device hand it
        // to the secondary, never to a missing command-line player.
        let secondary = Recorder::default();
        let backend = WithFallback {
            primary: RodioBackend::new(),
            secondary: secondary.clone(),
        };
        let mut player = SoundPlayer::new(backend, SoundConfig::default(), dir.path())
            .with_fallback(|| panic!("fallback alert used for a valid file"));
        assert!(matches!(player.play(PhaseKind::Work), PlayOutcome::Played(_)));
        assert!(secondary.played.borrow().len() <= 1);
    }

    #[test]
    fn secondary_backend_used_when_device_missing() {
        let secondary = Recorder::default();
        let backend = WithFallback {
            primary: Failing(|| PlaybackError::Device("no output".into())),
            secondary: secondary.clone(),
        };
        backend.play(Path::new("work.wav"), 0.5).unwrap();
        assert_eq!(secondary.played.borrow().len(), 1);
    }

    #[test]
    fn undecodable_file_is_not_retried() {
        let secondary = Recorder::default();
        let backend = WithFallback {
            primary: Failing(|| PlaybackError::Decode {
                path: PathBuf::from("work.wav"),
                message: "bad header".into(),
            }),
            secondary: secondary.clone(),
        };
        assert!(matches!(
            backend.play(Path::new("work.wav"), 0.5),
            Err(PlaybackError::Decode { .. })
        ));
        assert!(secondary.played.borrow().is_empty());
    }

    #[cfg(target_os = "linux")]
    fn zombie_children() -> usize {
        let me = std::process::id().to_string();
        std::fs::read_dir("/proc")
            .unwrap()
            .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path().join("stat")).ok())
            .filter(|stat| {
                // "pid (comm) state ppid ..."
                let Some((_, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let mut fields = rest.split_whitespace();
                fields.next() == Some("Z") && fields.next() == Some(me.as_str())
            })
            .count()
    }

    #[cfg(unix)]
    #[test]
    fn finished_players_are_reaped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("aplay");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let backend = CommandBackend::with_program(&script, PlayerProgram::Aplay);
        for _ in 0..20 {
            backend.play(Path::new("work.wav"), 1.0).unwrap();
        }

        let mut running = backend.reap();
        for _ in 0..100 {
            if running == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
            running = backend.reap();
        }
        assert_eq!(running, 0);
        #[cfg(target_os = "linux")]
        assert_eq!(zombie_children(), 0);
    }

    #[test]
    fn command_backend_without_player_reports_it() {
        let backend = CommandBackend::none();
        assert!(matches!(
            backend.play(Path::new("x.wav"), 1.0),
            Err(PlaybackError::NoPlayer)
        ));
    }

    #[test]
    fn player_arguments() {
        let path = Path::new("/s/work.wav");
        assert_eq!(
            PlayerProgram::Afplay.args(path, 0.5),
            vec!["-v", "0.50", "/s/work.wav"]
        );
        assert_eq!(
            PlayerProgram::Paplay.args(path, 0.5),
            vec!["--volume=32768", "/s/work.wav"]
        );
        assert_eq!(PlayerProgram::Aplay.args(path, 0.5), vec!["-q", "/s/work.wav"]);
    }
}
