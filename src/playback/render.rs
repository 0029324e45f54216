//! Published playback snapshot shared with the presentation thread.
//!
//! The audio thread overwrites the snapshot under a short lock and raises the
//! dirty flag; the presentation thread copies it out. Readers never hold a
//! reference into the live value, so the producer can keep reusing its own
//! working buffers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::control::VisualizationMode;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub track: Option<PathBuf>,
    pub elapsed_secs: f64,
    pub total_secs: f64,
    pub mode: VisualizationMode,
    pub paused: bool,
    /// First-channel samples resampled to a fixed window
    pub mono: Vec<i16>,
    /// Bar heights in `[0, 1]`, one per display column; spectrum mode only
    pub magnitudes: Vec<f64>,
    pub left_level: f32,
    pub right_level: f32,
}

impl RenderState {
    /// Playback progress in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.total_secs > 0.0 {
            (self.elapsed_secs / self.total_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Zero the progress and visualization while keeping the track name, so a
    /// finished track does not leave stale data on screen.
    pub fn reset(&mut self) {
        self.elapsed_secs = 0.0;
        self.total_secs = 0.0;
        self.paused = false;
        self.mono.clear();
        self.magnitudes.clear();
        self.left_level = 0.0;
        self.right_level = 0.0;
    }
}

#[derive(Default)]
pub struct RenderStateChannel {
    state: Mutex<RenderState>,
    dirty: AtomicBool,
}

impl RenderStateChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, snapshot: RenderState) {
        *self.lock() = snapshot;
        self.dirty.store(true, Ordering::Release);
    }

    /// Mutate the held snapshot in place and mark it dirty.
    pub fn update(&self, f: impl FnOnce(&mut RenderState)) {
        f(&mut self.lock());
        self.dirty.store(true, Ordering::Release);
    }

    /// Copy of the latest snapshot if it changed since the last call.
    pub fn consume_if_dirty(&self) -> Option<RenderState> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.lock().clone())
        } else {
            None
        }
    }

    /// Unconditional copy, used by the fallback refresh tick.
    pub fn snapshot(&self) -> RenderState {
        self.lock().clone()
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> RenderState {
        RenderState {
            track: Some(PathBuf::from("song.mp3")),
            elapsed_secs: 30.0,
            total_secs: 120.0,
            mode: VisualizationMode::Spectrum,
            paused: false,
            mono: vec![1, 2, 3],
            magnitudes: vec![0.5, 0.25],
            left_level: 0.4,
            right_level: 0.3,
        }
    }

    #[test]
    fn test_consume_only_when_dirty() {
        let channel = RenderStateChannel::new();
        assert!(channel.consume_if_dirty().is_none());

        channel.publish(sample_state());
        let snap = channel.consume_if_dirty().expect("dirty after publish");
        assert_eq!(snap, sample_state());

        assert!(channel.consume_if_dirty().is_none());
    }

    #[test]
    fn test_publish_overwrites() {
        let channel = RenderStateChannel::new();
        channel.publish(sample_state());

        let mut newer = sample_state();
        newer.elapsed_secs = 31.0;
        channel.publish(newer);

        assert_eq!(channel.consume_if_dirty().unwrap().elapsed_secs, 31.0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let channel = RenderStateChannel::new();
        channel.publish(sample_state());

        let mut copy = channel.snapshot();
        copy.mono.push(99);

        assert_eq!(channel.snapshot().mono, vec![1, 2, 3]);
        // Unconditional reads leave the dirty flag alone
        assert!(channel.is_dirty());
    }

    #[test]
    fn test_update_marks_dirty() {
        let channel = RenderStateChannel::new();
        channel.update(|s| s.paused = true);
        let snap = channel.consume_if_dirty().unwrap();
        assert!(snap.paused);
    }

    #[test]
    fn test_progress_and_reset() {
        let mut state = sample_state();
        assert_eq!(state.progress(), 0.25);

        state.elapsed_secs = 500.0;
        assert_eq!(state.progress(), 1.0);

        state.reset();
        assert_eq!(state.progress(), 0.0);
        assert!(state.mono.is_empty());
        assert!(state.magnitudes.is_empty());
        assert_eq!(state.track, Some(PathBuf::from("song.mp3")));
    }
}
