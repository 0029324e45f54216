//! Audio-thread loop: take a track, play it, repeat until quit.

use std::io;
use std::thread::{self, JoinHandle};

use log::{error, info};

use super::backend::AudioBackend;
use super::controller::{ControllerSettings, PlaybackController, TrackOutcome};
use super::session::Session;

pub struct PlaybackSupervisor {
    session: Session,
    backend: Box<dyn AudioBackend>,
    settings: ControllerSettings,
}

impl PlaybackSupervisor {
    pub fn new(
        session: Session,
        backend: Box<dyn AudioBackend>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            session,
            backend,
            settings,
        }
    }

    /// Play queued tracks one at a time until quit. A track that fails to
    /// open or decode is logged and skipped.
    pub fn run(self) {
        let Session {
            control,
            queue,
            render,
        } = &self.session;

        info!("Audio thread started");
        // take_next has already marked the track active
        while let Some(track) = queue.take_next(control) {
            let controller = PlaybackController::new(
                &track,
                self.backend.as_ref(),
                control,
                render,
                self.settings,
            );
            let result = controller.run();
            control.end_track();
            match result {
                Ok(TrackOutcome::Quit) => break,
                Ok(outcome) => info!("{}: {outcome:?}", track.display()),
                Err(e) => error!("Skipping {}: {e}", track.display()),
            }
        }
        info!("Audio thread exiting");
    }

    /// Run on a dedicated thread named `audio`.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || self.run())
    }
}
