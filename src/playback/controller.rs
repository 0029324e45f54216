//! One track's lifecycle, end to end.
//!
//! The controller is an explicit state machine:
//!
//! ```text
//! Opening -> Streaming <-> Paused
//!               |
//!               v
//!           Draining -> Closed
//! ```
//!
//! A failure while opening goes straight to `Closed`; a failure while streaming
//! goes through `Draining` so the published state is reset. [`PlaybackController::step`]
//! performs exactly one transition, which lets tests walk the machine without
//! real timing; [`PlaybackController::run`] loops it until `Closed`.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::backend::AudioBackend;
use super::control::{PlaybackControl, VisualizationMode};
use super::decoder::{ChunkRead, Decoder, TrackFormat, seek_target};
use super::error::PlaybackError;
use super::reducer::{SpectrumScale, channel_levels, reduce_spectrum, reduce_waveform};
use super::render::{RenderState, RenderStateChannel};
use super::sink::OutputSink;
use super::spectrum::SpectrumPlan;
use crate::constants::SAMPLE_SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Frames pulled from the decoder per loop iteration
    pub chunk_frames: usize,
    /// Frame size the output stream is opened with
    pub frames_per_buffer: usize,
    /// Transform window; also the length of the published waveform
    pub fft_size: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            chunk_frames: 2048,
            frames_per_buffer: 512,
            fft_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Opening,
    Streaming,
    Paused,
    Draining,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Played to end-of-stream
    Finished,
    Stopped,
    Quit,
}

enum Exit {
    Finished,
    Stopped,
    Quit,
    Failed(PlaybackError),
}

// Field order is release order: transform plan, output stream, decoder.
struct TrackResources {
    plan: SpectrumPlan,
    sink: Box<dyn OutputSink>,
    decoder: Box<dyn Decoder>,
    format: TrackFormat,
}

pub struct PlaybackController<'a> {
    track: PathBuf,
    backend: &'a dyn AudioBackend,
    control: &'a PlaybackControl,
    render: &'a RenderStateChannel,
    settings: ControllerSettings,
    state: ControllerState,
    resources: Option<TrackResources>,
    exit: Option<Exit>,
    chunk: Vec<i16>,
    scale: SpectrumScale,
}

impl<'a> PlaybackController<'a> {
    pub fn new(
        track: impl Into<PathBuf>,
        backend: &'a dyn AudioBackend,
        control: &'a PlaybackControl,
        render: &'a RenderStateChannel,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            track: track.into(),
            backend,
            control,
            render,
            settings,
            state: ControllerState::Opening,
            resources: None,
            exit: None,
            chunk: Vec::with_capacity(settings.chunk_frames * 2),
            scale: SpectrumScale::new(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn track(&self) -> &Path {
        &self.track
    }

    /// Perform one state transition and return the new state.
    pub fn step(&mut self) -> ControllerState {
        self.state = match self.state {
            ControllerState::Opening => self.open(),
            ControllerState::Streaming => self.stream_chunk(),
            ControllerState::Paused => self.wait_for_resume(),
            ControllerState::Draining => self.drain(),
            ControllerState::Closed => ControllerState::Closed,
        };
        self.state
    }

    /// Drive the track to `Closed`. Every resource is released by the time
    /// this returns, whatever the outcome.
    pub fn run(mut self) -> Result<TrackOutcome, PlaybackError> {
        while self.step() != ControllerState::Closed {}
        self.finish()
    }

    fn finish(self) -> Result<TrackOutcome, PlaybackError> {
        match self.exit {
            None | Some(Exit::Finished) => Ok(TrackOutcome::Finished),
            Some(Exit::Stopped) => Ok(TrackOutcome::Stopped),
            Some(Exit::Quit) => Ok(TrackOutcome::Quit),
            Some(Exit::Failed(e)) => Err(e),
        }
    }

    fn acquire(&self) -> Result<TrackResources, PlaybackError> {
        let decoder = self
            .backend
            .open_decoder(&self.track, self.settings.chunk_frames)?;
        let format = decoder.format();
        if format.sample_rate == 0 || format.channels == 0 {
            return Err(PlaybackError::FormatNegotiation(format!(
                "{} Hz, {} channels",
                format.sample_rate, format.channels
            )));
        }

        // Anything acquired above is dropped if a later step fails
        let mut sink = self.backend.open_sink(
            format.sample_rate,
            format.channels,
            self.settings.frames_per_buffer,
        )?;
        sink.start()?;
        let plan = SpectrumPlan::new(self.settings.fft_size)?;

        Ok(TrackResources {
            plan,
            sink,
            decoder,
            format,
        })
    }

    fn open(&mut self) -> ControllerState {
        match self.acquire() {
            Ok(resources) => {
                info!(
                    "Playing {} ({:.1}s)",
                    self.track.display(),
                    resources.format.total_seconds()
                );
                self.render.publish(RenderState {
                    track: Some(self.track.clone()),
                    total_secs: resources.format.total_seconds(),
                    mode: self.control.mode(),
                    mono: vec![0; resources.plan.window_size()],
                    ..RenderState::default()
                });
                self.resources = Some(resources);
                self.control.set_playing(true);
                ControllerState::Streaming
            }
            Err(e) => {
                warn!("Could not start {}: {e}", self.track.display());
                self.exit = Some(Exit::Failed(e));
                ControllerState::Closed
            }
        }
    }

    fn begin_drain(&mut self, exit: Exit) -> ControllerState {
        self.exit = Some(exit);
        ControllerState::Draining
    }

    fn stream_chunk(&mut self) -> ControllerState {
        if self.control.should_quit() {
            return self.begin_drain(Exit::Quit);
        }
        if self.control.stop_requested() {
            return self.begin_drain(Exit::Stopped);
        }

        let Some(res) = self.resources.as_mut() else {
            return self.begin_drain(Exit::Finished);
        };

        if self.control.is_paused() {
            if !res.sink.is_stopped()
                && let Err(e) = res.sink.stop()
            {
                return self.begin_drain(Exit::Failed(e));
            }
            self.render.update(|s| s.paused = true);
            debug!("Paused at {:.1}s", res.format.seconds_at(res.decoder.position()));
            return ControllerState::Paused;
        }

        let delta = self.control.take_seek();
        if delta != 0 {
            let target = seek_target(
                res.decoder.position(),
                delta,
                res.format.sample_rate,
                res.format.total_frames,
            );
            debug!("Seek {delta:+}s -> frame {target}");
            if let Err(e) = res.decoder.seek(target) {
                warn!("Seek failed, continuing from current position: {e}");
            }
        }

        let frames = match res.decoder.read_chunk(&mut self.chunk) {
            Ok(ChunkRead::Frames(0)) => return ControllerState::Streaming,
            Ok(ChunkRead::Frames(n)) => n,
            Ok(ChunkRead::EndOfStream) => return self.begin_drain(Exit::Finished),
            Err(e) => return self.begin_drain(Exit::Failed(e)),
        };

        if let Err(e) = res.sink.write(&self.chunk, frames) {
            return self.begin_drain(Exit::Failed(e));
        }

        let elapsed = res.format.seconds_at(res.decoder.position());
        let snapshot = chunk_snapshot(
            &self.track,
            &self.chunk,
            res.format,
            elapsed,
            &mut res.plan,
            &mut self.scale,
            self.control,
        );
        self.render.publish(snapshot);

        ControllerState::Streaming
    }

    fn wait_for_resume(&mut self) -> ControllerState {
        self.control.wait_while_paused();

        if !self.control.is_paused()
            && let Some(res) = self.resources.as_mut()
            && res.sink.is_stopped()
            && let Err(e) = res.sink.start()
        {
            self.render.update(|s| s.paused = false);
            return self.begin_drain(Exit::Failed(e));
        }

        self.render.update(|s| s.paused = false);
        ControllerState::Streaming
    }

    fn drain(&mut self) -> ControllerState {
        if let Some(TrackResources {
            plan,
            mut sink,
            decoder,
            ..
        }) = self.resources.take()
        {
            drop(plan);
            if matches!(self.exit, Some(Exit::Finished)) {
                sink.drain();
            }
            drop(sink);
            drop(decoder);
        }

        match &self.exit {
            Some(Exit::Failed(e)) => warn!("{} ended early: {e}", self.track.display()),
            Some(Exit::Stopped) => info!("Stopped {}", self.track.display()),
            _ => debug!("Closed {}", self.track.display()),
        }

        self.scale.reset();
        self.render.update(RenderState::reset);
        self.control.set_playing(false);
        ControllerState::Closed
    }
}

fn chunk_snapshot(
    track: &Path,
    chunk: &[i16],
    format: TrackFormat,
    elapsed_secs: f64,
    plan: &mut SpectrumPlan,
    scale: &mut SpectrumScale,
    control: &PlaybackControl,
) -> RenderState {
    let channels = format.channels as usize;
    let mode = control.mode();
    let mono = reduce_waveform(chunk, channels, plan.window_size());

    let magnitudes = match mode {
        VisualizationMode::Spectrum => {
            let input: Vec<f64> = mono.iter().map(|&s| s as f64 / SAMPLE_SCALE).collect();
            let bins = plan.execute(&input);
            let max = scale.observe(bins);
            reduce_spectrum(bins, control.display_width(), max)
        }
        VisualizationMode::Waveform => Vec::new(),
    };

    let (left_level, right_level) = channel_levels(chunk, channels);

    RenderState {
        track: Some(track.to_path_buf()),
        elapsed_secs,
        total_secs: format.total_seconds(),
        mode,
        paused: control.is_paused(),
        mono,
        magnitudes,
        left_level,
        right_level,
    }
}
