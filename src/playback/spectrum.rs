//! Fixed-size forward transform used by the spectrum visualizer.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::error::PlaybackError;

pub struct SpectrumPlan {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    magnitudes: Vec<f64>,
}

impl SpectrumPlan {
    /// Plan a transform over `window_size` real samples. The size must be a
    /// power of two of at least 2.
    pub fn new(window_size: usize) -> Result<Self, PlaybackError> {
        if window_size < 2 || !window_size.is_power_of_two() {
            return Err(PlaybackError::TransformAllocation { size: window_size });
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(window_size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            buffer: vec![Complex::default(); window_size],
            scratch,
            magnitudes: vec![0.0; window_size / 2],
        })
    }

    pub fn window_size(&self) -> usize {
        self.buffer.len()
    }

    /// Magnitudes of the first `window_size / 2` bins. Input shorter than the
    /// window is zero-padded; longer input is truncated.
    pub fn execute(&mut self, input: &[f64]) -> &[f64] {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = Complex::new(input.get(i).copied().unwrap_or(0.0), 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (mag, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = bin.norm();
        }
        &self.magnitudes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(matches!(
            SpectrumPlan::new(0),
            Err(PlaybackError::TransformAllocation { size: 0 })
        ));
        assert!(SpectrumPlan::new(1000).is_err());
        assert!(SpectrumPlan::new(1024).is_ok());
    }

    #[test]
    fn test_returns_half_window_bins() {
        let mut plan = SpectrumPlan::new(256).unwrap();
        assert_eq!(plan.window_size(), 256);
        assert_eq!(plan.execute(&[0.0; 256]).len(), 128);
    }

    #[test]
    fn test_silence_has_no_energy() {
        let mut plan = SpectrumPlan::new(64).unwrap();
        assert!(plan.execute(&[]).iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let size = 512;
        let bin = 20;
        let input: Vec<f64> = (0..size)
            .map(|i| (2.0 * PI * bin as f64 * i as f64 / size as f64).sin())
            .collect();

        let mut plan = SpectrumPlan::new(size).unwrap();
        let mags = plan.execute(&input);

        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
    }
}
