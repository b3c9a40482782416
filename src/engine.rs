use crate::timing::{DEFAULT_CLOCK_RATE_HZ, MasterClock};
use crate::{Actuator, Note, Player, PlayerError, SongLibrary};
use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, RecvError, Sender, TryRecvError};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum EngineCommand {
    Start,
    Stop,
    Toggle,
    SetTempo(f64),
    SelectSong(usize),
    LoadLibrary(PathBuf),
    ReloadLibrary(SongLibrary),
}

#[derive(Debug, Clone)]
pub enum EngineUpdate {
    /// `path` is set when the library came from a file picked by the user.
    LibraryLoaded { path: Option<PathBuf> },
    SongSelected { index: usize, tempo: f64 },
    TempoChanged { tempo: f64 },
    PlaybackState { playing: bool },
    NoteChanged { index: usize, note: Note },
    Error { message: String },
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub clock_rate_hz: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clock_rate_hz: DEFAULT_CLOCK_RATE_HZ,
        }
    }
}

pub struct EngineHandle {
    pub command_tx: Sender<EngineCommand>,
    pub update_rx: Receiver<EngineUpdate>,
    /// Current library, readable without going through the engine thread.
    pub library: Arc<ArcSwap<SongLibrary>>,
}

/// Spawns the clock thread. It owns the player; every control command is
/// applied there, between ticks. The thread exits once all command senders
/// are dropped.
pub fn spawn_engine<A>(
    library: SongLibrary,
    actuator: A,
    config: EngineConfig,
) -> Result<EngineHandle, PlayerError>
where
    A: Actuator + Send + 'static,
{
    let clock = MasterClock::new(config.clock_rate_hz)?;
    let library = Arc::new(library);
    let player = Player::new(library.clone(), clock.rate_hz())?;
    let shared_library = Arc::new(ArcSwap::new(library));

    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();

    let state = EngineState {
        player,
        clock,
        actuator,
        library: shared_library.clone(),
        update_tx,
    };

    std::thread::spawn(move || {
        engine_thread(state, command_rx);
    });

    tracing::info!(clock_rate_hz = config.clock_rate_hz, "engine started");

    Ok(EngineHandle {
        command_tx,
        update_rx,
        library: shared_library,
    })
}

struct EngineState<A> {
    player: Player<Arc<SongLibrary>>,
    clock: MasterClock,
    actuator: A,
    library: Arc<ArcSwap<SongLibrary>>,
    update_tx: Sender<EngineUpdate>,
}

fn engine_thread<A: Actuator>(mut state: EngineState<A>, command_rx: Receiver<EngineCommand>) {
    loop {
        // Nothing to tick while idle, so park on the channel.
        if !state.player.is_playing() {
            match command_rx.recv() {
                Ok(command) => state.handle_command(command, Instant::now()),
                Err(RecvError) => break,
            }
            continue;
        }

        let mut disconnected = false;
        let clock = state.clock;
        clock.run(|now| {
            loop {
                match command_rx.try_recv() {
                    Ok(command) => state.handle_command(command, now),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        return ControlFlow::Break(());
                    }
                }
            }

            state.tick(now);

            if state.player.is_playing() {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });

        if disconnected {
            break;
        }
    }

    tracing::info!("engine stopped");
}

impl<A: Actuator> EngineState<A> {
    fn handle_command(&mut self, command: EngineCommand, now: Instant) {
        match command {
            EngineCommand::Start => match self.player.start(now) {
                Ok(()) => self.publish_position(),
                Err(e) => self.report(e),
            },
            EngineCommand::Stop => {
                self.player.stop();
                self.publish_position();
            }
            EngineCommand::Toggle => match self.player.toggle(now) {
                Ok(_) => self.publish_position(),
                Err(e) => self.report(e),
            },
            EngineCommand::SetTempo(bpm) => match self.player.set_tempo(bpm) {
                Ok(()) => self.send(EngineUpdate::TempoChanged {
                    tempo: self.player.tempo().bpm(),
                }),
                Err(e) => self.report(e),
            },
            EngineCommand::SelectSong(index) => match self.player.set_song_index(index) {
                Ok(()) => {
                    self.send(EngineUpdate::SongSelected {
                        index,
                        tempo: self.player.tempo().bpm(),
                    });
                    self.publish_position();
                }
                Err(e) => self.report(e),
            },
            EngineCommand::LoadLibrary(path) => match SongLibrary::load(&path) {
                Ok(library) => {
                    tracing::info!(path = %path.display(), songs = library.songs.len(), "library loaded");
                    self.install_library(library, Some(path));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to load library: {}", e);
                    self.send(EngineUpdate::Error {
                        message: format!("Failed to load library: {}", e),
                    });
                }
            },
            EngineCommand::ReloadLibrary(library) => {
                tracing::info!(songs = library.songs.len(), "library reloaded");
                self.install_library(library, None);
            }
        }
    }

    fn install_library(&mut self, library: SongLibrary, path: Option<PathBuf>) {
        let library = Arc::new(library);
        self.library.store(library.clone());
        self.player.replace_songs(library);
        self.send(EngineUpdate::LibraryLoaded { path });
        self.send(EngineUpdate::SongSelected {
            index: self.player.config().song_index,
            tempo: self.player.tempo().bpm(),
        });
        self.publish_position();
    }

    fn tick(&mut self, now: Instant) {
        let outcome = self.player.on_tick(now, &mut self.actuator);
        if outcome.advanced {
            self.publish_position();
        }
    }

    fn publish_position(&self) {
        self.send(EngineUpdate::PlaybackState {
            playing: self.player.is_playing(),
        });
        if let Some((index, note)) = self.player.current_note() {
            self.send(EngineUpdate::NoteChanged { index, note });
        }
    }

    fn report(&self, error: PlayerError) {
        self.send(EngineUpdate::Error {
            message: error.to_string(),
        });
    }

    fn send(&self, update: EngineUpdate) {
        // The UI may already be gone; updates are informational.
        let _ = self.update_tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PulseMeter, Song};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn library() -> SongLibrary {
        SongLibrary::new(vec![
            Song {
                name: "Short".into(),
                default_tempo: 600.0,
                notes: vec![Note::new(500.0, 1.0), Note::rest(1.0)],
            },
            Song {
                name: "Long".into(),
                default_tempo: 60.0,
                notes: vec![Note::new(100.0, 60.0)],
            },
        ])
        .unwrap()
    }

    fn wait_for<F>(handle: &EngineHandle, mut matches: F) -> Vec<EngineUpdate>
    where
        F: FnMut(&EngineUpdate) -> bool,
    {
        let mut seen = Vec::new();
        loop {
            let update = handle
                .update_rx
                .recv_timeout(TIMEOUT)
                .unwrap_or_else(|_| panic!("timed out, saw {:?}", seen));
            let done = matches(&update);
            seen.push(update);
            if done {
                return seen;
            }
        }
    }

    #[test]
    fn plays_a_song_to_the_end() {
        let meter = PulseMeter::new();
        let handle = spawn_engine(library(), meter.clone(), EngineConfig::default()).unwrap();

        handle.command_tx.send(EngineCommand::SelectSong(0)).unwrap();
        handle.command_tx.send(EngineCommand::Start).unwrap();

        let mut reached_rest = false;
        wait_for(&handle, |u| {
            if let EngineUpdate::NoteChanged { index: 1, note } = u {
                assert!(note.is_rest());
                reached_rest = true;
            }
            reached_rest && matches!(u, EngineUpdate::PlaybackState { playing: false })
        });

        assert!(meter.count() > 0);
    }

    #[test]
    fn stop_takes_effect_immediately() {
        let meter = PulseMeter::new();
        let handle = spawn_engine(library(), meter.clone(), EngineConfig::default()).unwrap();

        handle.command_tx.send(EngineCommand::SelectSong(1)).unwrap();
        handle.command_tx.send(EngineCommand::Start).unwrap();
        wait_for(&handle, |u| matches!(u, EngineUpdate::PlaybackState { playing: true }));

        handle.command_tx.send(EngineCommand::Stop).unwrap();
        wait_for(&handle, |u| matches!(u, EngineUpdate::PlaybackState { playing: false }));

        let after_stop = meter.count();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(meter.count(), after_stop);
    }

    #[test]
    fn rejects_bad_input_with_error_updates() {
        let handle = spawn_engine(library(), PulseMeter::new(), EngineConfig::default()).unwrap();

        handle.command_tx.send(EngineCommand::SetTempo(0.0)).unwrap();
        wait_for(&handle, |u| matches!(u, EngineUpdate::Error { .. }));

        handle.command_tx.send(EngineCommand::SelectSong(9)).unwrap();
        wait_for(&handle, |u| matches!(u, EngineUpdate::Error { .. }));

        handle.command_tx.send(EngineCommand::SetTempo(100.0)).unwrap();
        wait_for(&handle, |u| {
            matches!(u, EngineUpdate::TempoChanged { tempo } if *tempo == 100.0)
        });
    }

    #[test]
    fn reload_swaps_the_shared_library() {
        let handle = spawn_engine(library(), PulseMeter::new(), EngineConfig::default()).unwrap();
        assert_eq!(handle.library.load().songs.len(), 2);

        let replacement = SongLibrary::new(vec![Song {
            name: "Replacement".into(),
            default_tempo: 100.0,
            notes: vec![Note::new(200.0, 1.0)],
        }])
        .unwrap();
        handle
            .command_tx
            .send(EngineCommand::ReloadLibrary(replacement))
            .unwrap();
        wait_for(&handle, |u| matches!(u, EngineUpdate::LibraryLoaded { path: None }));

        assert_eq!(handle.library.load().names(), vec!["Replacement".to_string()]);
    }

    #[test]
    fn rejects_invalid_clock_rate() {
        let result = spawn_engine(
            library(),
            PulseMeter::new(),
            EngineConfig { clock_rate_hz: -1.0 },
        );
        assert!(matches!(result, Err(PlayerError::InvalidClockRate(_))));
    }
}
