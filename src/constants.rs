//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency between the audio thread and the terminal front end.

/// File extensions the decoder stage can open
pub const PLAYABLE_EXTENSIONS: &[&str] = &["mp3", "wav", "flac"];

/// Full-scale value of a signed 16-bit sample, used to normalize PCM to [-1.0, 1.0]
pub const SAMPLE_SCALE: f64 = 32768.0;

/// Number of output-sink buffers allowed to sit in the device queue before a write blocks
pub const SINK_QUEUE_DEPTH: usize = 8;

/// Display width assumed by the reducer until the front end reports a real one
pub const DEFAULT_DISPLAY_WIDTH: usize = 80;

/// Timeout for a single input poll on the presentation thread (ms)
pub const INPUT_POLL_MS: u64 = 30;
