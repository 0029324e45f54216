//! Shared command register between the presentation thread and the audio thread.
//!
//! Every command is a last-write-wins register rather than a queued event: the
//! audio thread polls the flags once per chunk, and a newer seek request simply
//! overwrites an older one that was never consumed. Blocking waits (the pause
//! wait here, the playlist wait in [`super::queue`]) re-check the stop and quit
//! flags on every wake so neither can be swallowed.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::constants::DEFAULT_DISPLAY_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Waveform,
    Spectrum,
}

impl VisualizationMode {
    pub fn label(self) -> &'static str {
        match self {
            VisualizationMode::Waveform => "Waveform",
            VisualizationMode::Spectrum => "Spectrum",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            VisualizationMode::Waveform => 1,
            VisualizationMode::Spectrum => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            2 => VisualizationMode::Spectrum,
            _ => VisualizationMode::Waveform,
        }
    }
}

impl std::str::FromStr for VisualizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "waveform" | "wave" => Ok(VisualizationMode::Waveform),
            "spectrum" | "spec" => Ok(VisualizationMode::Spectrum),
            other => Err(format!("Unknown visualization mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "IDLE",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Paused => "PAUSED",
        }
    }
}

pub struct PlaybackControl {
    quit: AtomicBool,
    stop: AtomicBool,
    paused: AtomicBool,
    active: AtomicBool,
    playing: AtomicBool,
    seek_delta: AtomicI32,
    mode: AtomicU8,
    display_width: AtomicUsize,
    pause_lock: Mutex<()>,
    pause_changed: Condvar,
}

impl Default for PlaybackControl {
    fn default() -> Self {
        Self::new(VisualizationMode::default())
    }
}

impl PlaybackControl {
    pub fn new(mode: VisualizationMode) -> Self {
        Self {
            quit: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            active: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            seek_delta: AtomicI32::new(0),
            mode: AtomicU8::new(mode.to_u8()),
            display_width: AtomicUsize::new(DEFAULT_DISPLAY_WIDTH),
            pause_lock: Mutex::new(()),
            pause_changed: Condvar::new(),
        }
    }

    fn lock_pause(&self) -> MutexGuard<'_, ()> {
        self.pause_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Flag changes that a pause waiter depends on are made under the pause lock,
    // so a waiter can never check the predicate and then miss the notification.
    fn set_and_wake(&self, flag: &AtomicBool, value: bool) {
        {
            let _guard = self.lock_pause();
            flag.store(value, Ordering::SeqCst);
        }
        self.pause_changed.notify_all();
    }

    pub fn set_paused(&self, paused: bool) {
        if self.paused.load(Ordering::SeqCst) == paused {
            return;
        }
        self.set_and_wake(&self.paused, paused);
    }

    pub fn toggle_pause(&self) -> bool {
        let paused = !self.is_paused();
        self.set_paused(paused);
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Request a relative seek. Overwrites any request not yet consumed.
    pub fn request_seek(&self, delta_seconds: i32) {
        self.seek_delta.store(delta_seconds, Ordering::SeqCst);
    }

    /// Consume the pending seek delta, leaving zero behind.
    pub fn take_seek(&self) -> i32 {
        self.seek_delta.swap(0, Ordering::SeqCst)
    }

    /// Abandon the current track. The queue and the process stay alive.
    pub fn stop(&self) {
        self.set_and_wake(&self.stop, true);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Abandon the current track and end the supervisor.
    pub fn quit(&self) {
        self.set_and_wake(&self.quit, true);
    }

    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    /// Reset the per-track registers and mark a track as handed to a
    /// controller. Called from [`super::queue::PlaylistQueue::take_next`] under
    /// the queue lock, so it is ordered against queue edits.
    pub fn begin_track(&self) {
        self.stop.store(false, Ordering::SeqCst);
        self.seek_delta.store(0, Ordering::SeqCst);
        self.set_paused(false);
        self.active.store(true, Ordering::SeqCst);
    }

    /// The dequeued track's controller has returned.
    pub fn end_track(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// True from dequeue until the controller returns, Opening included.
    /// Stop and seek are only meaningful while this holds.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PlaybackState {
        match (self.is_playing(), self.is_paused()) {
            (false, _) => PlaybackState::Idle,
            (true, true) => PlaybackState::Paused,
            (true, false) => PlaybackState::Playing,
        }
    }

    pub fn mode(&self) -> VisualizationMode {
        VisualizationMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    pub fn set_mode(&self, mode: VisualizationMode) {
        self.mode.store(mode.to_u8(), Ordering::Relaxed);
    }

    pub fn display_width(&self) -> usize {
        self.display_width.load(Ordering::Relaxed)
    }

    pub fn set_display_width(&self, width: usize) {
        self.display_width.store(width.max(1), Ordering::Relaxed);
    }

    /// Block while paused. Returns as soon as pause clears or a stop or quit
    /// arrives; spurious wakes re-check all three flags.
    pub fn wait_while_paused(&self) {
        let guard = self.lock_pause();
        let _guard = self
            .pause_changed
            .wait_while(guard, |_| {
                self.paused.load(Ordering::SeqCst)
                    && !self.stop.load(Ordering::SeqCst)
                    && !self.quit.load(Ordering::SeqCst)
            })
            .unwrap_or_else(PoisonError::into_inner);
    }
}
