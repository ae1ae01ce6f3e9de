//! Main application state and control flow for the player.
//!
//! The app owns the transport and everything that feeds it: the audio
//! engine, the status notification receiver, the position poller and the
//! waveform thumbnail. Key presses, source notifications and poller ticks
//! are all handled on this one thread, in the order the loop sees them.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use super::audio::{AudioEngine, PlaybackSource};
use super::thumbnail::{Thumbnail, ThumbnailReady};
use super::ui;
use tapedeck::config::Config;
use tapedeck::poller::{PositionPoller, ZERO_POSITION};
use tapedeck::transport::{AudioSource, SourceEvent, Transport, Trigger};

#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub waveform: bool,
    pub repeat: bool,
    pub tick_interval: Duration,
    pub thumbnail_peaks: usize,
}

impl PlayerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            waveform: config.waveform,
            repeat: config.repeat,
            tick_interval: config.tick_interval(),
            thumbnail_peaks: config.thumbnail_peaks,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub files: Vec<PathBuf>,
    selected: Option<usize>,
    pub transport: Transport<PlaybackSource>,
    audio_engine: Option<AudioEngine>,
    events_rx: Option<mpsc::Receiver<SourceEvent>>,
    pub poller: PositionPoller,
    pub position_label: String,
    pub waveform: bool,
    pub thumbnail: Option<Thumbnail>,
    thumbnail_rx: Option<mpsc::Receiver<ThumbnailReady>>,
    thumbnail_peaks: usize,
    pub message: Option<String>,
    needs_redraw: bool,
}

impl App {
    pub fn new(files: Vec<PathBuf>, options: &PlayerOptions) -> Self {
        let mut transport = Transport::new();
        transport.set_looping(options.repeat);

        Self {
            should_quit: false,
            files,
            selected: None,
            transport,
            audio_engine: None,
            events_rx: None,
            poller: PositionPoller::new(options.tick_interval, options.waveform, Instant::now()),
            position_label: ZERO_POSITION.to_string(),
            waveform: options.waveform,
            thumbnail: None,
            thumbnail_rx: None,
            thumbnail_peaks: options.thumbnail_peaks,
            message: None,
            needs_redraw: true,
        }
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.transport.source().map(PlaybackSource::path)
    }

    /// Playback position for the playhead, if a file is loaded.
    pub fn playhead(&self) -> Option<Duration> {
        self.transport.source().map(AudioSource::current_position)
    }

    /// Open a file and hand it to the transport.
    ///
    /// A file that cannot be opened leaves the current source and state
    /// untouched; the failure is only reported in the status line.
    pub fn open_file(&mut self, path: &Path) -> bool {
        self.needs_redraw = true;

        let source = match self.ensure_engine().and_then(|engine| engine.open(path)) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Could not open {}: {e}", path.display());
                self.message = Some(format!("Could not open {}: {e}", path.display()));
                return false;
            }
        };

        info!("Loaded {} ({:?})", path.display(), source.duration());

        let audio = source.audio();
        // The outgoing source stops its sink when dropped
        drop(self.transport.load(source));

        self.position_label = ZERO_POSITION.to_string();
        self.message = None;
        self.thumbnail = None;
        self.thumbnail_rx = self
            .waveform
            .then(|| Thumbnail::spawn(path.to_path_buf(), audio, self.thumbnail_peaks));

        true
    }

    fn ensure_engine(&mut self) -> Result<&AudioEngine, Box<dyn Error>> {
        if self.audio_engine.is_none() {
            let (engine, events_rx) = AudioEngine::new()?;
            self.audio_engine = Some(engine);
            self.events_rx = Some(events_rx);
        }
        self.audio_engine
            .as_ref()
            .ok_or_else(|| "Audio engine unavailable".into())
    }

    pub fn open_selected(&mut self, index: usize) -> bool {
        let Some(path) = self.files.get(index).cloned() else {
            return false;
        };
        self.selected = Some(index);
        self.open_file(&path)
    }

    pub fn next_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let index = self.selected.map_or(0, |i| (i + 1) % self.files.len());
        self.open_selected(index);
    }

    pub fn previous_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let len = self.files.len();
        let index = self.selected.map_or(len - 1, |i| (i + len - 1) % len);
        self.open_selected(index);
    }

    pub fn play_pressed(&mut self) {
        self.transport.request_transition(Trigger::Play);
        self.needs_redraw = true;
    }

    /// The stop key behaves like the stop button: it does nothing while
    /// the button is disabled.
    pub fn stop_pressed(&mut self) {
        if !self.transport.controls().stop_enabled {
            return;
        }
        self.transport.request_transition(Trigger::Stop);
        self.position_label = ZERO_POSITION.to_string();
        self.needs_redraw = true;
    }

    pub fn toggle_repeat(&mut self) {
        let looping = !self.transport.looping();
        self.transport.set_looping(looping);
        info!("Repeat {}", if looping { "enabled" } else { "disabled" });
        self.needs_redraw = true;
    }

    /// Deliver pending source notifications and background results.
    pub fn process_events(&mut self) {
        let mut status_changed = false;
        if let Some(rx) = &self.events_rx {
            while let Ok(SourceEvent::StatusChanged) = rx.try_recv() {
                status_changed = true;
            }
        }
        // Reconciliation is idempotent, so a burst collapses into one check
        if status_changed {
            self.transport.handle_status_change();
            self.needs_redraw = true;
        }

        let ready = match &self.thumbnail_rx {
            Some(rx) => match rx.try_recv() {
                Ok(ready) => Some(ready),
                Err(mpsc::TryRecvError::Empty) => return,
                Err(mpsc::TryRecvError::Disconnected) => None,
            },
            None => return,
        };
        self.thumbnail_rx = None;

        if let Some(ready) = ready
            && self.current_file() == Some(ready.path.as_path())
        {
            self.thumbnail = Some(ready.thumbnail);
            self.needs_redraw = true;
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        let tick = self.poller.tick(now, self.transport.source());

        if let Some(label) = tick.position
            && label != self.position_label
        {
            self.position_label = label;
            self.needs_redraw = true;
        }
        if tick.redraw {
            self.needs_redraw = true;
        }
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}

pub fn run_with_files(files: Vec<PathBuf>, options: PlayerOptions) -> Result<(), Box<dyn Error>> {
    info!("Starting tapedeck with {} file(s)", files.len());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(files, &options);
    if !app.files.is_empty() {
        app.open_selected(0);
    }

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        log::error!("Player exited with error: {e}");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        app.process_events();

        let now = Instant::now();
        if app.poller.is_due(now) {
            app.on_tick(now);
        }

        if app.take_redraw() {
            terminal.draw(|f| ui::draw(f, app))?;
        }

        // Block on input only until the next poller tick
        let timeout = app.poller.time_until_next(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key.code),
                Event::Resize(_, _) => app.request_redraw(),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char(' ') => app.play_pressed(),
        KeyCode::Char('s') => app.stop_pressed(),
        KeyCode::Char('l') => app.toggle_repeat(),
        KeyCode::Char('n') | KeyCode::Right => app.next_file(),
        KeyCode::Char('p') | KeyCode::Left => app.previous_file(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::decoder::DecodedAudio;
    use tapedeck::transport::{PLAY_LABEL, TransportState};

    fn options() -> PlayerOptions {
        PlayerOptions::from_config(&Config::new())
    }

    #[test]
    fn test_new_app_initial_state() {
        let app = App::new(Vec::new(), &options());

        assert!(!app.should_quit);
        assert!(app.current_file().is_none());
        assert!(app.playhead().is_none());
        assert_eq!(app.transport.state(), TransportState::Stopped);
        assert!(!app.transport.controls().play_enabled);
        assert_eq!(app.transport.controls().play_label, PLAY_LABEL);
        assert_eq!(app.position_label, ZERO_POSITION);
        assert!(app.waveform);
        assert!(app.thumbnail.is_none());
        assert!(app.message.is_none());
    }

    #[test]
    fn test_repeat_option_sets_loop_flag() {
        let mut opts = options();
        opts.repeat = true;
        let app = App::new(Vec::new(), &opts);
        assert!(app.transport.looping());
    }

    #[test]
    fn test_controls_without_source_do_nothing() {
        let mut app = App::new(Vec::new(), &options());

        app.play_pressed();
        app.stop_pressed();
        app.toggle_repeat();
        app.next_file();
        app.previous_file();

        assert_eq!(app.transport.state(), TransportState::Stopped);
        assert!(app.transport.looping());
        assert!(app.current_file().is_none());
    }

    #[test]
    fn test_open_failure_is_recovered() {
        let mut app = App::new(vec![PathBuf::from("/nonexistent/file.wav")], &options());

        assert!(!app.open_selected(0));
        assert!(app.current_file().is_none());
        assert!(!app.transport.controls().play_enabled);
        assert!(app.message.is_some());
        assert_eq!(app.transport.state(), TransportState::Stopped);
    }

    #[test]
    fn test_open_out_of_range_index() {
        let mut app = App::new(Vec::new(), &options());
        assert!(!app.open_selected(3));
        assert!(app.message.is_none());
    }

    #[test]
    fn test_tick_without_source_keeps_label() {
        let mut app = App::new(Vec::new(), &options());
        app.take_redraw();

        let later = Instant::now() + Duration::from_secs(1);
        app.on_tick(later);
        assert_eq!(app.position_label, ZERO_POSITION);
        // Waveform view repaints on every tick
        assert!(app.take_redraw());
    }

    #[test]
    fn test_tick_without_waveform_stays_idle() {
        let mut opts = options();
        opts.waveform = false;
        let mut app = App::new(Vec::new(), &opts);
        app.take_redraw();

        app.on_tick(Instant::now() + Duration::from_secs(1));
        assert!(!app.take_redraw());
    }

    /// An app with a one-second mono file loaded on a detached sink.
    fn app_with_source() -> (App, mpsc::Receiver<SourceEvent>) {
        let (events_tx, events_rx) = mpsc::channel();
        let audio = DecodedAudio {
            samples: vec![0.0; 8],
            channels: 1,
            sample_rate: 8,
        };
        let mut app = App::new(Vec::new(), &options());
        app.transport.load(PlaybackSource::detached(Path::new("a.wav"), audio, events_tx));
        (app, events_rx)
    }

    #[test]
    fn test_stop_key_ignored_while_stop_disabled() {
        let (mut app, events_rx) = app_with_source();
        app.position_label = "00:01:000".to_string();

        handle_key(&mut app, KeyCode::Char('s'));

        assert_eq!(app.transport.state(), TransportState::Stopped);
        assert_eq!(app.position_label, "00:01:000");
        assert!(events_rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_key_while_playing() {
        let (mut app, events_rx) = app_with_source();
        app.events_rx = Some(events_rx);

        handle_key(&mut app, KeyCode::Char(' '));
        app.process_events();
        assert_eq!(app.transport.state(), TransportState::Playing);

        handle_key(&mut app, KeyCode::Char('s'));
        assert_eq!(app.transport.state(), TransportState::Stopping);
        assert_eq!(app.position_label, ZERO_POSITION);

        app.process_events();
        assert_eq!(app.transport.state(), TransportState::Stopped);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new(Vec::new(), &options());
        handle_key(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = App::new(Vec::new(), &options());
        handle_key(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }
}
