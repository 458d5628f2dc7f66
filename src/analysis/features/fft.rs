// FFT module - Short-time Fourier transform
//
// This module computes the power spectrogram shared by the chroma, mel and
// MFCC descriptors. Frames are centered (the signal is zero-padded by half a
// frame on each side) and tapered with a periodic Hann window.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::temporal::{frame_count, pad_center, PadMode};

/// STFT processor that computes power spectra from a whole waveform
///
/// The FFT plan is built once; each call allocates its own buffers so a
/// shared processor can serve concurrent requests.
pub struct StftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    hop_length: usize,
    /// Hann window for FFT (pre-computed)
    window: Vec<f32>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size (2048 for the trained feature layout)
    /// * `hop_length` - Samples between frame starts
    pub fn new(fft_size: usize, hop_length: usize) -> Self {
        // Periodic Hann: the window of an (N + 1)-point symmetric Hann with the last point dropped
        let window = (0..fft_size)
            .map(|i| {
                0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / fft_size as f32).cos())
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft,
            fft_size,
            hop_length,
            window,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of positive-frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Compute the power spectrogram `|X|^2`
    ///
    /// # Returns
    /// One power spectrum per frame, each of length `fft_size / 2 + 1`
    pub fn power_spectrogram(&self, audio: &[f32]) -> Vec<Vec<f32>> {
        let padded = pad_center(audio, self.fft_size / 2, PadMode::Constant);
        let n_frames = frame_count(padded.len(), self.fft_size, self.hop_length);

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.fft_size];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut frames = Vec::with_capacity(n_frames);

        for frame_idx in 0..n_frames {
            let start = frame_idx * self.hop_length;
            let frame = &padded[start..start + self.fft_size];

            for ((slot, &sample), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(sample * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            frames.push(buffer[..self.n_bins()].iter().map(|c| c.norm_sqr()).collect());
        }

        frames
    }

    /// Center frequency of each positive bin in Hz
    #[cfg(test)]
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f32> {
        let bin_width = sample_rate as f32 / self.fft_size as f32;
        (0..self.n_bins()).map(|i| i as f32 * bin_width).collect()
    }
}
