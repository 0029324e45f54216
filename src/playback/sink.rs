//! Output sink stage.
//!
//! [`OutputSink`] accepts interleaved PCM and blocks until the device has room,
//! which is what paces the audio thread to real time. [`RodioSink`] plays through
//! the default device; it keeps a bounded number of fixed-size buffers queued in
//! a rodio `Sink` and sleeps while the queue is full.

use super::error::PlaybackError;

pub trait OutputSink {
    /// Start (or restart) the stream.
    fn start(&mut self) -> Result<(), PlaybackError>;

    /// Queue `frames` frames of interleaved samples, blocking for pacing.
    fn write(&mut self, samples: &[i16], frames: usize) -> Result<(), PlaybackError>;

    /// Suspend the stream without closing it.
    fn stop(&mut self) -> Result<(), PlaybackError>;

    fn is_stopped(&self) -> bool;

    /// Let already-queued audio play out before the sink is dropped.
    fn drain(&mut self);
}

#[cfg(feature = "player")]
pub use rodio_sink::RodioSink;

#[cfg(feature = "player")]
mod rodio_sink {
    use std::thread;
    use std::time::Duration;

    use log::debug;
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamBuilder, Sink};

    use super::OutputSink;
    use crate::constants::{SAMPLE_SCALE, SINK_QUEUE_DEPTH};
    use crate::playback::error::PlaybackError;

    const PACING_SLEEP: Duration = Duration::from_millis(2);

    pub struct RodioSink {
        // Dropped after the sink so queued sources are released first
        sink: Sink,
        _stream: OutputStream,
        sample_rate: u32,
        channels: u16,
        frames_per_buffer: usize,
        stopped: bool,
    }

    impl RodioSink {
        pub fn open(
            sample_rate: u32,
            channels: u16,
            frames_per_buffer: usize,
        ) -> Result<Self, PlaybackError> {
            let mut stream = OutputStreamBuilder::from_default_device()
                .map_err(|e| PlaybackError::OutputDeviceUnavailable(e.to_string()))?
                .open_stream_or_fallback()
                .map_err(|e| PlaybackError::OutputStream(e.to_string()))?;
            // The terminal belongs to the UI; don't print on teardown
            stream.log_on_drop(false);

            let sink = Sink::connect_new(stream.mixer());
            sink.pause();

            debug!("Output stream open: {sample_rate} Hz, {channels} channels, {frames_per_buffer} frames/buffer");

            Ok(Self {
                sink,
                _stream: stream,
                sample_rate,
                channels,
                frames_per_buffer: frames_per_buffer.max(1),
                stopped: true,
            })
        }
    }

    impl OutputSink for RodioSink {
        fn start(&mut self) -> Result<(), PlaybackError> {
            self.sink.play();
            self.stopped = false;
            Ok(())
        }

        fn write(&mut self, samples: &[i16], frames: usize) -> Result<(), PlaybackError> {
            let channels = self.channels as usize;
            let len = (frames * channels).min(samples.len());

            for buffer in samples[..len].chunks(self.frames_per_buffer * channels) {
                let data: Vec<f32> = buffer
                    .iter()
                    .map(|&s| (s as f64 / SAMPLE_SCALE) as f32)
                    .collect();
                self.sink
                    .append(SamplesBuffer::new(self.channels, self.sample_rate, data));
            }

            while !self.stopped && self.sink.len() > SINK_QUEUE_DEPTH {
                thread::sleep(PACING_SLEEP);
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), PlaybackError> {
            self.sink.pause();
            self.stopped = true;
            Ok(())
        }

        fn is_stopped(&self) -> bool {
            self.stopped
        }

        fn drain(&mut self) {
            if !self.stopped {
                self.sink.sleep_until_end();
            }
        }
    }

    impl Drop for RodioSink {
        fn drop(&mut self) {
            self.sink.stop();
        }
    }
}
