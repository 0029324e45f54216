//! Playback orchestration and visualization pipeline.
//!
//! The audio thread runs a [`PlaybackSupervisor`] that pops tracks from the
//! [`PlaylistQueue`] and drives each one through a [`PlaybackController`]. The
//! controller streams decoded PCM into an [`OutputSink`], reduces every chunk to
//! small display arrays, and publishes them through the [`RenderStateChannel`]
//! for the presentation thread. Commands flow the other way through the shared
//! [`PlaybackControl`] register.

pub mod backend;
pub mod control;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod queue;
pub mod reducer;
pub mod render;
pub mod session;
pub mod sink;
pub mod spectrum;
pub mod supervisor;

pub use backend::{AudioBackend, SystemBackend};
pub use control::{PlaybackControl, PlaybackState, VisualizationMode};
pub use controller::{ControllerSettings, ControllerState, PlaybackController, TrackOutcome};
pub use decoder::{ChunkRead, Decoder, SymphoniaDecoder, TrackFormat};
pub use error::PlaybackError;
pub use queue::PlaylistQueue;
pub use render::{RenderState, RenderStateChannel};
pub use session::Session;
pub use sink::OutputSink;
pub use spectrum::SpectrumPlan;
pub use supervisor::PlaybackSupervisor;
