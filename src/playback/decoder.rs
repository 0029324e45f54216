//! Decoder stage.
//!
//! The [`Decoder`] trait is the seam between the controller and the bitstream
//! decoder; [`SymphoniaDecoder`] is the production implementation. It probes the
//! container, picks the default track, and hands out interleaved `i16` chunks of
//! a fixed frame count. Positions are in frames (one sample per channel).

use std::fs::File;
use std::path::Path;

use log::{debug, info};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::error::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Total length in frames; 0 when the container does not say
    pub total_frames: u64,
}

impl TrackFormat {
    pub fn total_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_frames as f64 / self.sample_rate as f64
    }

    pub fn seconds_at(&self, frame: u64) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frame as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRead {
    Frames(usize),
    EndOfStream,
}

pub trait Decoder {
    fn format(&self) -> TrackFormat;

    /// Replace `buf` with the next chunk of interleaved samples.
    fn read_chunk(&mut self, buf: &mut Vec<i16>) -> Result<ChunkRead, PlaybackError>;

    /// Current position in frames.
    fn position(&self) -> u64;

    /// Move to an absolute frame. Targets past the end leave the decoder at
    /// end-of-stream.
    fn seek(&mut self, frame: u64) -> Result<(), PlaybackError>;
}

/// Absolute frame for a relative seek of `delta_seconds` from `position`,
/// clamped to `[0, total_frames]`. An unknown length (0) only clamps below.
pub fn seek_target(position: u64, delta_seconds: i32, sample_rate: u32, total_frames: u64) -> u64 {
    let target = position as i64 + delta_seconds as i64 * sample_rate as i64;
    let target = target.max(0) as u64;
    if total_frames > 0 {
        target.min(total_frames)
    } else {
        target
    }
}

pub struct SymphoniaDecoder {
    reader: Box<dyn FormatReader>,
    codec: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    info: TrackFormat,
    chunk_frames: usize,
    pending: Vec<i16>,
    position: u64,
    skip_frames: u64,
    at_end: bool,
}

impl SymphoniaDecoder {
    pub fn open(path: &Path, chunk_frames: usize) -> Result<Self, PlaybackError> {
        let file = File::open(path).map_err(|e| PlaybackError::decode_open(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::decode_open(path, e))?;

        let reader = probed.format;
        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlaybackError::FormatNegotiation("no audio track".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| PlaybackError::FormatNegotiation("unknown sample rate".to_string()))?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| PlaybackError::FormatNegotiation("unknown channel layout".to_string()))?;
        if sample_rate == 0 || channels == 0 {
            return Err(PlaybackError::FormatNegotiation(format!(
                "{sample_rate} Hz, {channels} channels"
            )));
        }

        let info = TrackFormat {
            sample_rate,
            channels: channels as u16,
            total_frames: track.codec_params.n_frames.unwrap_or(0),
        };
        let track_id = track.id;

        let codec = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::FormatNegotiation(e.to_string()))?;

        info!(
            "Opened {}: {} Hz, {} channels, {} frames",
            path.display(),
            info.sample_rate,
            info.channels,
            info.total_frames
        );

        Ok(Self {
            reader,
            codec,
            track_id,
            info,
            chunk_frames: chunk_frames.max(1),
            pending: Vec::new(),
            position: 0,
            skip_frames: 0,
            at_end: false,
        })
    }

    /// Decode packets into `pending` until a full chunk is buffered or the
    /// stream ends.
    fn fill_pending(&mut self) -> Result<(), PlaybackError> {
        let channels = self.info.channels as usize;
        let wanted = self.chunk_frames * channels;

        while self.pending.len() < wanted && !self.at_end {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    self.at_end = true;
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    debug!("Stream reset required, treating as end of track");
                    self.at_end = true;
                    break;
                }
                Err(e) => return Err(PlaybackError::DecodeRead(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.codec.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // A corrupt packet is dropped; the stream carries on
                    debug!("Skipping undecodable packet: {e}");
                    continue;
                }
                Err(e) => return Err(PlaybackError::DecodeRead(e.to_string())),
            };

            let mut sample_buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, *decoded.spec());
            sample_buf.copy_interleaved_ref(decoded);
            let samples = sample_buf.samples();

            let frames = (samples.len() / channels) as u64;
            let skip = self.skip_frames.min(frames);
            self.skip_frames -= skip;
            self.pending
                .extend_from_slice(&samples[skip as usize * channels..]);
        }

        Ok(())
    }
}

impl Decoder for SymphoniaDecoder {
    fn format(&self) -> TrackFormat {
        self.info
    }

    fn read_chunk(&mut self, buf: &mut Vec<i16>) -> Result<ChunkRead, PlaybackError> {
        self.fill_pending()?;

        let channels = self.info.channels as usize;
        let take = self.pending.len().min(self.chunk_frames * channels);
        let take = take - take % channels;
        if take == 0 {
            return Ok(ChunkRead::EndOfStream);
        }

        buf.clear();
        buf.extend(self.pending.drain(..take));

        let frames = take / channels;
        self.position += frames as u64;
        Ok(ChunkRead::Frames(frames))
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, frame: u64) -> Result<(), PlaybackError> {
        let total = self.info.total_frames;
        self.pending.clear();
        self.skip_frames = 0;

        if total > 0 && frame >= total {
            self.position = total;
            self.at_end = true;
            return Ok(());
        }

        let seeked = self
            .reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: frame,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| PlaybackError::DecodeRead(format!("seek to frame {frame}: {e}")))?;

        self.codec.reset();
        self.at_end = false;
        self.position = seeked.required_ts;
        self.skip_frames = seeked.required_ts.saturating_sub(seeked.actual_ts);
        Ok(())
    }
}
