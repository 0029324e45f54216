//! Factory for the per-track decoder and output stream.
//!
//! The controller asks the backend for fresh resources every time a track is
//! opened, so each controller exclusively owns what it plays through. Tests
//! swap in their own backend to run the state machine without a sound card.

use std::path::Path;

use super::decoder::{Decoder, SymphoniaDecoder};
use super::error::PlaybackError;
use super::sink::OutputSink;

pub trait AudioBackend: Send {
    fn open_decoder(
        &self,
        path: &Path,
        chunk_frames: usize,
    ) -> Result<Box<dyn Decoder>, PlaybackError>;

    fn open_sink(
        &self,
        sample_rate: u32,
        channels: u16,
        frames_per_buffer: usize,
    ) -> Result<Box<dyn OutputSink>, PlaybackError>;
}

/// Symphonia decoding into the default output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl AudioBackend for SystemBackend {
    fn open_decoder(
        &self,
        path: &Path,
        chunk_frames: usize,
    ) -> Result<Box<dyn Decoder>, PlaybackError> {
        Ok(Box::new(SymphoniaDecoder::open(path, chunk_frames)?))
    }

    #[cfg(feature = "player")]
    fn open_sink(
        &self,
        sample_rate: u32,
        channels: u16,
        frames_per_buffer: usize,
    ) -> Result<Box<dyn OutputSink>, PlaybackError> {
        use super::sink::RodioSink;
        Ok(Box::new(RodioSink::open(
            sample_rate,
            channels,
            frames_per_buffer,
        )?))
    }

    #[cfg(not(feature = "player"))]
    fn open_sink(
        &self,
        _sample_rate: u32,
        _channels: u16,
        _frames_per_buffer: usize,
    ) -> Result<Box<dyn OutputSink>, PlaybackError> {
        Err(PlaybackError::OutputDeviceUnavailable(
            "built without the 'player' feature".to_string(),
        ))
    }
}
