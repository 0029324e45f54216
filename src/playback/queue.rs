//! Thread-safe FIFO of pending tracks.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::control::PlaybackControl;

#[derive(Default)]
pub struct PlaylistQueue {
    tracks: Mutex<VecDeque<PathBuf>>,
    available: Condvar,
}

impl PlaylistQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PathBuf>> {
        self.tracks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, track: impl Into<PathBuf>) {
        self.lock().push_back(track.into());
        self.available.notify_one();
    }

    pub fn enqueue_all<I, P>(&self, tracks: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let added = {
            let mut queue = self.lock();
            let before = queue.len();
            queue.extend(tracks.into_iter().map(Into::into));
            queue.len() - before
        };
        if added > 0 {
            self.available.notify_one();
        }
        added
    }

    /// Empty the queue. A track already handed to a controller keeps playing.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Clear and enqueue in a single critical section.
    pub fn replace(&self, track: impl Into<PathBuf>) {
        self.edit(|queue| {
            queue.clear();
            queue.push_back(track.into());
        });
    }

    /// Run `f` on the pending tracks inside the queue's critical section, then
    /// wake a waiting consumer. `take_next` marks its track active under the
    /// same lock, so `f` also sees a consistent answer to "is a track playing".
    pub fn edit<R>(&self, f: impl FnOnce(&mut VecDeque<PathBuf>) -> R) -> R {
        let result = f(&mut self.lock());
        self.available.notify_one();
        result
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Block until a track is available or quit is raised. Returns `None` only
    /// when woken by quit; a track is removed exactly once, here, and the
    /// control registers are reset for it before the lock is released.
    pub fn take_next(&self, control: &PlaybackControl) -> Option<PathBuf> {
        let mut queue = self.lock();
        loop {
            if control.should_quit() {
                return None;
            }
            if let Some(track) = queue.pop_front() {
                control.begin_track();
                return Some(track);
            }
            queue = self
                .available
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wake every blocked `take_next` so it can re-check the quit flag.
    pub fn wake_all(&self) {
        let _guard = self.lock();
        self.available.notify_all();
    }
}
