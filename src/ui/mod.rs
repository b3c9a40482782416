use crate::{EngineCommand, EngineHandle, EngineUpdate, Note, PulseMeter, watch_library};
use eframe::egui;
use notify::RecommendedWatcher;
use std::path::PathBuf;

const TEMPO_RANGE: std::ops::RangeInclusive<f64> = 40.0..=200.0;
const TEMPO_STEP: f64 = 4.0;

pub struct PlayerApp {
    engine: EngineHandle,
    meter: PulseMeter,
    _watcher: Option<RecommendedWatcher>,
    library_path: Option<PathBuf>,
    error_message: Option<String>,
    selected_song: usize,
    tempo: f64,
    playing: bool,
    current_note: Option<(usize, Note)>,
    last_pulse_count: u64,
}

impl PlayerApp {
    pub fn new(engine: EngineHandle, meter: PulseMeter, tempo: f64) -> Self {
        Self {
            engine,
            meter,
            _watcher: None,
            library_path: None,
            error_message: None,
            selected_song: 0,
            tempo,
            playing: false,
            current_note: None,
            last_pulse_count: 0,
        }
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.engine.command_tx.send(command);
    }

    fn process_engine_updates(&mut self) {
        while let Ok(update) = self.engine.update_rx.try_recv() {
            match update {
                EngineUpdate::LibraryLoaded { path } => {
                    self.error_message = None;
                    if let Some(path) = path {
                        self.watch(path);
                    }
                }
                EngineUpdate::SongSelected { index, tempo } => {
                    self.selected_song = index;
                    self.tempo = tempo;
                }
                EngineUpdate::TempoChanged { tempo } => {
                    self.tempo = tempo;
                }
                EngineUpdate::PlaybackState { playing } => {
                    self.playing = playing;
                    if !playing {
                        self.current_note = None;
                    }
                }
                EngineUpdate::NoteChanged { index, note } => {
                    self.current_note = Some((index, note));
                }
                EngineUpdate::Error { message } => {
                    self.error_message = Some(message);
                }
            }
        }
    }

    fn watch(&mut self, path: PathBuf) {
        // Replacing the watcher drops the previous one, which unwatches.
        match watch_library(&path, self.engine.command_tx.clone()) {
            Ok(watcher) => self._watcher = Some(watcher),
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot watch library: {}", e);
                self._watcher = None;
            }
        }
        self.library_path = Some(path);
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Library...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title("Open Song Library")
                        .add_filter("RON", &["ron"])
                        .pick_file()
                    {
                        self.send(EngineCommand::LoadLibrary(path));
                    }
                    ui.close();
                }

                ui.separator();

                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn song_picker(&mut self, ui: &mut egui::Ui) {
        let library = self.engine.library.load();
        let selected_name = library
            .songs
            .get(self.selected_song)
            .map(|s| s.name.as_str())
            .unwrap_or("No songs");

        let mut choice = self.selected_song;
        egui::ComboBox::from_label("Song")
            .selected_text(selected_name)
            .show_ui(ui, |ui| {
                for (i, song) in library.songs.iter().enumerate() {
                    ui.selectable_value(&mut choice, i, song.name.as_str());
                }
            });

        if choice != self.selected_song {
            self.selected_song = choice;
            self.send(EngineCommand::SelectSong(choice));
        }
    }

    fn tempo_slider(&mut self, ui: &mut egui::Ui) {
        let slider = egui::Slider::new(&mut self.tempo, TEMPO_RANGE)
            .step_by(TEMPO_STEP)
            .fixed_decimals(1)
            .text("BPM");
        if ui.add(slider).changed() {
            self.send(EngineCommand::SetTempo(self.tempo));
        }
    }

    fn pulse_indicator(&mut self, ui: &mut egui::Ui) {
        let count = self.meter.count();
        let pulsed = count != self.last_pulse_count;
        self.last_pulse_count = count;

        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(egui::Vec2::splat(18.0), egui::Sense::hover());
            let color = if pulsed {
                egui::Color32::from_rgb(60, 180, 100)
            } else {
                egui::Color32::from_rgb(40, 40, 40)
            };
            ui.painter().circle_filled(rect.center(), 8.0, color);
            ui.label(format!("{} pulses", count));
        });
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_engine_updates();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ui);
        });

        if let Some(ref error) = self.error_message {
            egui::TopBottomPanel::top("error").show(ctx, |ui| {
                ui.colored_label(egui::Color32::RED, error);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                self.song_picker(ui);
                self.tempo_slider(ui);
                ui.add_space(16.0);

                let label = if self.playing { "⏹ Stop" } else { "▶ Play" };
                if ui.button(label).clicked() {
                    self.send(EngineCommand::Toggle);
                }

                ui.add_space(16.0);
                match self.current_note {
                    Some((index, note)) if note.is_rest() => {
                        ui.label(format!("Note {}: rest", index + 1));
                    }
                    Some((index, note)) => {
                        ui.label(format!("Note {}: {:.2} Hz", index + 1, note.frequency));
                    }
                    None => {
                        ui.label("Stopped");
                    }
                }
                self.pulse_indicator(ui);

                if let Some(path) = &self.library_path {
                    ui.small(format!("Library: {}", path.display()));
                }
            });
        });

        ctx.request_repaint();
    }
}
