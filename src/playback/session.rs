//! Command surface shared by the presentation thread and the audio thread.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use super::control::{PlaybackControl, PlaybackState, VisualizationMode};
use super::queue::PlaylistQueue;
use super::render::RenderStateChannel;

/// Handles to the three shared objects, cheap to clone into each thread.
#[derive(Clone, Default)]
pub struct Session {
    pub control: Arc<PlaybackControl>,
    pub queue: Arc<PlaylistQueue>,
    pub render: Arc<RenderStateChannel>,
}

impl Session {
    pub fn new(mode: VisualizationMode) -> Self {
        Self {
            control: Arc::new(PlaybackControl::new(mode)),
            queue: Arc::new(PlaylistQueue::new()),
            render: Arc::new(RenderStateChannel::new()),
        }
    }

    // Only called inside a queue edit: the supervisor marks a track active
    // under the same lock, so the stop lands on the track that was current
    // when the queue changed, even while it is still opening.
    fn stop_current(&self) {
        if self.control.is_active() {
            self.control.stop();
        }
    }

    /// Replace the queue with `track` and cut whatever is playing.
    pub fn play_now(&self, track: impl Into<PathBuf>) {
        let track = track.into();
        debug!("Play now: {}", track.display());
        self.queue.edit(|queue| {
            queue.clear();
            queue.push_back(track);
            self.stop_current();
        });
        self.control.set_paused(false);
    }

    pub fn enqueue_all<I, P>(&self, tracks: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let added = self.queue.enqueue_all(tracks);
        debug!("Queued {added} tracks");
        added
    }

    /// Move on to the next queued track.
    pub fn skip(&self) {
        self.queue.edit(|_| self.stop_current());
        self.control.set_paused(false);
    }

    pub fn clear_and_stop(&self) {
        self.queue.edit(|queue| {
            queue.clear();
            self.stop_current();
        });
        self.control.set_paused(false);
    }

    /// Returns the new paused state.
    pub fn toggle_pause(&self) -> bool {
        self.control.toggle_pause()
    }

    /// Ignored when nothing is dequeued. A seek made while the track is still
    /// opening applies from its first chunk.
    pub fn seek(&self, delta_seconds: i32) {
        if self.control.is_active() {
            self.control.request_seek(delta_seconds);
        }
    }

    pub fn set_mode(&self, mode: VisualizationMode) {
        self.control.set_mode(mode);
        self.render.update(|s| s.mode = mode);
    }

    pub fn mode(&self) -> VisualizationMode {
        self.control.mode()
    }

    pub fn state(&self) -> PlaybackState {
        self.control.state()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Stop playback and release the supervisor, wherever it is blocked.
    pub fn quit(&self) {
        self.control.quit();
        self.queue.wake_all();
    }
}
