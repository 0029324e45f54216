//! Main application state and control flow for the player.
//!
//! The presentation thread owns the terminal, the browser and the latest render
//! snapshot. It turns key presses into [`Session`] commands, redraws when the
//! audio thread publishes something new (or on the refresh tick), and on exit
//! raises quit and joins the audio thread.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    error::Error,
    io,
    path::Path,
    time::{Duration, Instant},
};
use wavetty::config::Config;
use wavetty::constants::INPUT_POLL_MS;
use wavetty::playback::{
    PlaybackSupervisor, RenderState, Session, SystemBackend, VisualizationMode,
};

use super::browser::{Browser, EntryKind, is_playable};
use super::ui;

pub struct App {
    pub should_quit: bool,
    pub needs_relayout: bool,
    pub browser: Browser,
    pub session: Session,
    pub snapshot: RenderState,
    pub seek_seconds: i32,
    /// One-off status text shown in place of the key help
    pub message: Option<String>,
}

impl App {
    pub fn new(session: Session, start_dir: &Path, seek_seconds: i32) -> Self {
        Self {
            should_quit: false,
            needs_relayout: false,
            browser: Browser::new(start_dir),
            snapshot: session.render.snapshot(),
            session,
            seek_seconds,
            message: None,
        }
    }

    /// Pull the latest snapshot. Returns true when it changed; `force` takes a
    /// copy even when the audio thread has published nothing new.
    pub fn refresh_snapshot(&mut self, force: bool) -> bool {
        if let Some(snapshot) = self.session.render.consume_if_dirty() {
            self.snapshot = snapshot;
            true
        } else {
            if force {
                self.snapshot = self.session.render.snapshot();
            }
            false
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.message = None;

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Up => self.browser.select_previous(),
            KeyCode::Down => self.browser.select_next(),
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Char('a') => {
                let added = self.session.enqueue_all(self.browser.playable_files());
                self.message = Some(format!("Queued {added} tracks"));
            }
            KeyCode::Char('s') => {
                debug!("Skip");
                self.session.skip();
            }
            KeyCode::Char('x') => {
                debug!("Clear queue and stop");
                self.session.clear_and_stop();
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                let paused = self.session.toggle_pause();
                debug!("Paused: {paused}");
            }
            KeyCode::Char('1') => self.session.set_mode(VisualizationMode::Waveform),
            KeyCode::Char('2') => self.session.set_mode(VisualizationMode::Spectrum),
            KeyCode::Left => self.session.seek(-self.seek_seconds),
            KeyCode::Right => self.session.seek(self.seek_seconds),
            _ => {}
        }
    }

    fn activate_selected(&mut self) {
        let Some(entry) = self.browser.selected_entry().cloned() else {
            return;
        };

        match entry.kind {
            EntryKind::Parent | EntryKind::Directory => {
                if let Err(e) = self.browser.scan_directory(&entry.path) {
                    error!("Could not open {}: {e}", entry.path.display());
                    self.message = Some(format!("Cannot open {}: {e}", entry.name));
                }
            }
            EntryKind::File if entry.is_playable() => {
                info!("Play now: {}", entry.path.display());
                self.session.play_now(entry.path);
            }
            EntryKind::File => {
                self.message = Some(format!("Not a playable file: {}", entry.name));
            }
        }
    }

    fn quit(&mut self) {
        self.should_quit = true;
        self.session.quit();
    }
}

/// Start the audio thread and the terminal UI. `initial` may be a directory to
/// browse or a playable file to start right away.
pub fn run(config: &Config, initial: Option<&Path>) -> Result<(), Box<dyn Error>> {
    init_logging(&config.log_file, config.log_level_filter())?;
    info!("Starting wavetty");

    let session = Session::new(config.visualization);

    let signal_session = session.clone();
    ctrlc::set_handler(move || signal_session.quit())?;

    let start_dir = match initial {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.start_dir_path()),
        None => config.start_dir_path(),
    };
    if let Some(path) = initial.filter(|p| p.is_file() && is_playable(p)) {
        session.play_now(path);
    }

    let supervisor = PlaybackSupervisor::new(
        session.clone(),
        Box::new(SystemBackend),
        config.controller_settings(),
    );
    let audio = supervisor.spawn()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session.clone(), &start_dir, config.seek_seconds);
    let result = run_app(&mut terminal, &mut app, config.refresh_interval());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.quit();
    if audio.join().is_err() {
        error!("Audio thread panicked");
    }
    info!("Exiting wavetty");

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut last_draw: Option<Instant> = None;

    loop {
        let tick_due = last_draw.is_none_or(|t| t.elapsed() >= refresh_interval);
        let changed = app.refresh_snapshot(tick_due);

        if changed || tick_due || app.needs_relayout {
            if app.needs_relayout {
                terminal.autoresize()?;
                app.needs_relayout = false;
            }
            terminal.draw(|f| ui::draw(f, app))?;
            last_draw = Some(Instant::now());
        }

        // Poll for events with a short timeout to allow continuous rendering
        if event::poll(Duration::from_millis(INPUT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Resize(..) => app.needs_relayout = true,
                _ => {}
            }
        }

        if app.should_quit || app.session.control.should_quit() {
            return Ok(());
        }
    }
}

fn init_logging(log_file: &str, level: log::LevelFilter) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};
    use std::fs::File;

    let log_file = shellexpand::tilde(log_file);
    CombinedLogger::init(vec![WriteLogger::new(
        level,
        simplelog::Config::default(),
        File::create(log_file.as_ref())?,
    )])?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wavetty::playback::PlaybackState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("set")).unwrap();
        fs::write(dir.path().join("one.mp3"), b"").unwrap();
        fs::write(dir.path().join("two.wav"), b"").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"").unwrap();
        let app = App::new(Session::default(), dir.path(), 5);
        (dir, app)
    }

    fn select(app: &mut App, name: &str) {
        app.browser.selected = app
            .browser
            .entries
            .iter()
            .position(|e| e.name == name)
            .unwrap();
    }

    #[test]
    fn test_new_app_initial_state() {
        let (_dir, app) = test_app();
        assert!(!app.should_quit);
        assert!(app.snapshot.track.is_none());
        assert_eq!(app.session.state(), PlaybackState::Idle);
        assert_eq!(app.browser.entries[0].kind, EntryKind::Parent);
    }

    #[test]
    fn test_enter_plays_file_now() {
        let (_dir, mut app) = test_app();
        app.session.enqueue_all([PathBuf::from("old.mp3")]);

        select(&mut app, "one.mp3");
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.session.queued(), 1);
        let next = app.session.queue.take_next(&app.session.control).unwrap();
        assert!(next.ends_with("one.mp3"));
    }

    #[test]
    fn test_enter_opens_directory() {
        let (_dir, mut app) = test_app();
        select(&mut app, "set");
        app.handle_key(press(KeyCode::Enter));
        assert!(app.browser.dir.ends_with("set"));
    }

    #[test]
    fn test_enter_on_unplayable_file_does_nothing() {
        let (_dir, mut app) = test_app();
        select(&mut app, "cover.jpg");
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(app.session.queued(), 0);
        assert!(app.message.is_some());
    }

    #[test]
    fn test_queue_all_and_clear() {
        let (_dir, mut app) = test_app();
        app.handle_key(press(KeyCode::Char('a')));
        assert_eq!(app.session.queued(), 2);

        app.handle_key(press(KeyCode::Char('x')));
        assert_eq!(app.session.queued(), 0);
    }

    #[test]
    fn test_mode_keys() {
        let (_dir, mut app) = test_app();
        app.handle_key(press(KeyCode::Char('2')));
        assert_eq!(app.session.mode(), VisualizationMode::Spectrum);
        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(app.session.mode(), VisualizationMode::Waveform);
        assert!(app.refresh_snapshot(false));
    }

    #[test]
    fn test_seek_keys_use_configured_step() {
        let (_dir, mut app) = test_app();
        app.session.control.begin_track();

        app.handle_key(press(KeyCode::Right));
        assert_eq!(app.session.control.take_seek(), 5);
        app.handle_key(press(KeyCode::Left));
        assert_eq!(app.session.control.take_seek(), -5);
    }

    #[test]
    fn test_pause_toggles() {
        let (_dir, mut app) = test_app();
        app.handle_key(press(KeyCode::Char('p')));
        assert!(app.session.control.is_paused());
        app.handle_key(press(KeyCode::Char(' ')));
        assert!(!app.session.control.is_paused());
    }

    #[test]
    fn test_quit_keys() {
        let (_dir, mut app) = test_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.session.control.should_quit());

        let (_dir, mut app) = test_app();
        app.handle_key(press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_refresh_snapshot() {
        let (_dir, mut app) = test_app();
        assert!(!app.refresh_snapshot(false));

        app.session.render.update(|s| s.elapsed_secs = 3.0);
        assert!(app.refresh_snapshot(false));
        assert_eq!(app.snapshot.elapsed_secs, 3.0);
        assert!(!app.refresh_snapshot(true));
    }
}
