//! Visualization reductions.
//!
//! Both reductions collapse a large buffer into an array sized by the display,
//! so the per-chunk cost tracks the terminal width instead of the sample count.
//! Empty chunks reduce to silence, and under-filled chunks (the tail of a
//! track) are stretched over the full width without reading out of bounds.

use crate::constants::SAMPLE_SCALE;

/// Magnitudes at or below this are treated as silence.
const SILENCE_FLOOR: f64 = 1e-12;

/// Source frame for output column `col` when spreading `frames` frames over
/// `width` columns: `round(col * (frames - 1) / max(1, width - 1))`, clamped.
pub fn column_source_index(col: usize, frames: usize, width: usize) -> usize {
    if frames == 0 {
        return 0;
    }
    let last = frames - 1;
    let span = width.saturating_sub(1).max(1) as f64;
    let idx = (col as f64 * last as f64 / span).round() as usize;
    idx.min(last)
}

/// Pick the first-channel sample nearest each of `width` columns from an
/// interleaved chunk.
pub fn reduce_waveform(chunk: &[i16], channels: usize, width: usize) -> Vec<i16> {
    let channels = channels.max(1);
    let frames = chunk.len() / channels;
    if frames == 0 {
        return vec![0; width];
    }

    (0..width)
        .map(|col| chunk[column_source_index(col, frames, width) * channels])
        .collect()
}

/// Average `magnitudes` into `bars` bars and log-compress each against
/// `max_magnitude`: `ln(avg + 1) / ln(max + 1)`, clamped to `[0, 1]`.
///
/// A bar with no contributing bins (more bars than bins) is 0, and a silent
/// maximum yields all-zero bars.
pub fn reduce_spectrum(magnitudes: &[f64], bars: usize, max_magnitude: f64) -> Vec<f64> {
    let mut out = vec![0.0; bars];
    if bars == 0 || magnitudes.is_empty() || max_magnitude <= SILENCE_FLOOR {
        return out;
    }

    let denom = (max_magnitude + 1.0).ln();
    let bins = magnitudes.len();
    let bins_per_bar = (bins / bars).max(1);

    for (bar, height) in out.iter_mut().enumerate() {
        let start = bar * bins_per_bar;
        if start >= bins {
            break;
        }
        let end = (start + bins_per_bar).min(bins);
        let avg = magnitudes[start..end].iter().sum::<f64>() / (end - start) as f64;
        let ratio = (avg.max(0.0) + 1.0).ln() / denom;
        *height = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    out
}

/// Running maximum magnitude across the chunks of one track.
#[derive(Debug, Default, Clone)]
pub struct SpectrumScale {
    max: f64,
}

impl SpectrumScale {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, magnitudes: &[f64]) -> f64 {
        for &m in magnitudes {
            if m.is_finite() && m > self.max {
                self.max = m;
            }
        }
        self.max
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn reset(&mut self) {
        self.max = 0.0;
    }
}

/// RMS level of the left and right channels, boosted for display and
/// clamped to `[0, 1]`. Mono chunks report the same level on both sides.
pub fn channel_levels(chunk: &[i16], channels: usize) -> (f32, f32) {
    let channels = channels.max(1);
    let frames = chunk.len() / channels;
    if frames == 0 {
        return (0.0, 0.0);
    }

    let rms = |channel: usize| -> f32 {
        let sum: f64 = chunk
            .chunks_exact(channels)
            .map(|frame| {
                let s = frame[channel] as f64 / SAMPLE_SCALE;
                s * s
            })
            .sum();
        ((sum / frames as f64).sqrt() * 2.0).min(1.0) as f32
    };

    let left = rms(0);
    let right = if channels > 1 { rms(1) } else { left };
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_width_is_exact() {
        let chunk: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        for width in [1, 2, 7, 80, 999, 1000, 4096] {
            assert_eq!(reduce_waveform(&chunk, 1, width).len(), width);
        }
    }

    #[test]
    fn test_column_index_is_monotonic_and_in_range() {
        for frames in [1, 2, 3, 10, 511, 2048] {
            for width in [1, 2, 5, 80, 300] {
                let mut prev = 0;
                for col in 0..width {
                    let idx = column_source_index(col, frames, width);
                    assert!(idx < frames);
                    assert!(idx >= prev);
                    prev = idx;
                }
            }
        }
    }

    #[test]
    fn test_waveform_endpoints_hit_first_and_last_frame() {
        let chunk: Vec<i16> = (0..100).map(|i| i as i16 * 10).collect();
        let reduced = reduce_waveform(&chunk, 1, 10);
        assert_eq!(reduced[0], 0);
        assert_eq!(reduced[9], 990);
    }

    #[test]
    fn test_waveform_uses_first_channel() {
        // Left is positive, right is negative
        let chunk: Vec<i16> = (0..64)
            .flat_map(|i| [i as i16 + 1, -(i as i16) - 1])
            .collect();
        let reduced = reduce_waveform(&chunk, 2, 16);
        assert!(reduced.iter().all(|&s| s > 0));
    }

    #[test]
    fn test_waveform_empty_chunk_is_silence() {
        assert_eq!(reduce_waveform(&[], 2, 8), vec![0; 8]);
        // A lone right-channel sample is not a whole frame
        assert_eq!(reduce_waveform(&[5], 2, 3), vec![0; 3]);
    }

    #[test]
    fn test_waveform_upsamples_short_chunk() {
        let reduced = reduce_waveform(&[100, 200], 1, 5);
        assert_eq!(reduced, vec![100, 100, 200, 200, 200]);
    }

    #[test]
    fn test_spectrum_bar_count_and_range() {
        let mags: Vec<f64> = (0..512).map(|i| (i % 37) as f64 * 3.0).collect();
        let max = mags.iter().cloned().fold(0.0, f64::max);
        for bars in [1, 3, 64, 512, 700] {
            let out = reduce_spectrum(&mags, bars, max);
            assert_eq!(out.len(), bars);
            assert!(out.iter().all(|&b| (0.0..=1.0).contains(&b)));
        }
    }

    #[test]
    fn test_spectrum_silence_is_all_zero() {
        let silent = vec![0.0; 512];
        let out = reduce_spectrum(&silent, 40, 0.0);
        assert!(out.iter().all(|&b| b == 0.0));

        // Silent chunk after a loud one: bars stay at zero
        let out = reduce_spectrum(&silent, 40, 250.0);
        assert!(out.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_spectrum_more_bars_than_bins() {
        let mags = vec![10.0; 4];
        let out = reduce_spectrum(&mags, 10, 10.0);
        assert_eq!(out.len(), 10);
        assert!(out[..4].iter().all(|&b| (b - 1.0).abs() < 1e-9));
        assert!(out[4..].iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_spectrum_log_ratio() {
        let mags = vec![0.0, 0.0, 99.0, 99.0];
        let out = reduce_spectrum(&mags, 2, 99.0);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 1.0).abs() < 1e-9);

        let half = reduce_spectrum(&[9.0], 1, 99.0);
        assert!((half[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_spectrum_zero_bars() {
        assert!(reduce_spectrum(&[1.0, 2.0], 0, 2.0).is_empty());
    }

    #[test]
    fn test_spectrum_scale_tracks_running_max() {
        let mut scale = SpectrumScale::new();
        assert_eq!(scale.observe(&[1.0, 5.0, 2.0]), 5.0);
        assert_eq!(scale.observe(&[3.0]), 5.0);
        assert_eq!(scale.observe(&[8.0, f64::NAN]), 8.0);
        scale.reset();
        assert_eq!(scale.max(), 0.0);
    }

    #[test]
    fn test_channel_levels() {
        assert_eq!(channel_levels(&[], 2), (0.0, 0.0));

        // Full-scale left, silent right
        let chunk: Vec<i16> = (0..32).flat_map(|_| [i16::MAX, 0]).collect();
        let (left, right) = channel_levels(&chunk, 2);
        assert_eq!(left, 1.0);
        assert_eq!(right, 0.0);

        let mono = vec![8192i16; 16];
        let (l, r) = channel_levels(&mono, 1);
        assert_eq!(l, r);
        assert!((l - 0.5).abs() < 1e-6);
    }
}
