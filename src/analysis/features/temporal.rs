// Temporal module - Time-domain feature extraction
//
// This module computes frame-wise zero-crossing rate and RMS energy directly
// from the waveform, plus the centered framing helpers the STFT shares.
// Frames use the same frame length and hop as the STFT so every descriptor
// averages over the same number of frames.

/// Amplitudes at or below this magnitude count as zero when looking for
/// sign changes
const ZERO_CROSSING_THRESHOLD: f32 = 1e-10;

/// Padding applied before centered framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Pad with zeros
    Constant,
    /// Repeat the first/last sample
    Edge,
}

/// Pad `audio` by `pad` samples on both sides.
pub fn pad_center(audio: &[f32], pad: usize, mode: PadMode) -> Vec<f32> {
    let (left, right) = match (mode, audio.first(), audio.last()) {
        (PadMode::Edge, Some(&first), Some(&last)) => (first, last),
        _ => (0.0, 0.0),
    };

    let mut padded = Vec::with_capacity(audio.len() + 2 * pad);
    padded.extend(std::iter::repeat(left).take(pad));
    padded.extend_from_slice(audio);
    padded.extend(std::iter::repeat(right).take(pad));
    padded
}

/// Number of full frames that fit in `len` samples.
pub fn frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if len < frame_length {
        0
    } else {
        1 + (len - frame_length) / hop_length
    }
}

/// Frame-wise time-domain descriptors
pub struct TemporalFeatures {
    frame_length: usize,
    hop_length: usize,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    ///
    /// # Arguments
    /// * `frame_length` - Samples per analysis frame
    /// * `hop_length` - Samples between frame starts
    pub fn new(frame_length: usize, hop_length: usize) -> Self {
        Self {
            frame_length,
            hop_length,
        }
    }

    /// Compute per-frame zero-crossing rate
    ///
    /// A crossing is a change of sign bit between consecutive samples, with
    /// near-zero samples treated as positive. Each frame's rate is
    /// `crossings / frame_length`. Frames are centered with edge padding.
    ///
    /// # Returns
    /// Zero-crossing rate per frame (each 0.0 to 1.0)
    pub fn zero_crossing_rate(&self, audio: &[f32]) -> Vec<f32> {
        let padded = pad_center(audio, self.frame_length / 2, PadMode::Edge);
        let n_frames = frame_count(padded.len(), self.frame_length, self.hop_length);

        (0..n_frames)
            .map(|frame_idx| {
                let start = frame_idx * self.hop_length;
                let frame = &padded[start..start + self.frame_length];
                let crossings = frame
                    .windows(2)
                    .filter(|pair| is_negative(pair[0]) != is_negative(pair[1]))
                    .count();
                crossings as f32 / self.frame_length as f32
            })
            .collect()
    }

    /// Compute per-frame root-mean-square energy
    ///
    /// Formula: RMS = sqrt((1 / N) × Σ x[n]²), frames centered with zero padding.
    pub fn rms(&self, audio: &[f32]) -> Vec<f32> {
        let padded = pad_center(audio, self.frame_length / 2, PadMode::Constant);
        let n_frames = frame_count(padded.len(), self.frame_length, self.hop_length);

        (0..n_frames)
            .map(|frame_idx| {
                let start = frame_idx * self.hop_length;
                let frame = &padded[start..start + self.frame_length];
                let energy: f64 = frame.iter().map(|&x| (x as f64) * (x as f64)).sum();
                (energy / self.frame_length as f64).sqrt() as f32
            })
            .collect()
    }
}

fn is_negative(sample: f32) -> bool {
    sample.abs() > ZERO_CROSSING_THRESHOLD && sample < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signals::sine_wave;

    #[test]
    fn test_pad_center_modes() {
        assert_eq!(
            pad_center(&[1.0, 2.0], 2, PadMode::Constant),
            vec![0.0, 0.0, 1.0, 2.0, 0.0, 0.0]
        );
        assert_eq!(
            pad_center(&[1.0, 2.0], 2, PadMode::Edge),
            vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]
        );
        assert_eq!(pad_center(&[], 1, PadMode::Edge), vec![0.0, 0.0]);
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(10, 4, 2), 4);
        assert_eq!(frame_count(3, 4, 2), 0);
        assert_eq!(frame_count(4, 4, 2), 1);
    }

    #[test]
    fn test_zcr_of_alternating_signal() {
        let temporal = TemporalFeatures::new(8, 4);
        let signal: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let zcr = temporal.zero_crossing_rate(&signal);
        // Interior frames flip sign on every step: 7 crossings in 8 samples
        assert!((zcr[4] - 7.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zcr_tracks_frequency() {
        let sample_rate = 44_100;
        let temporal = TemporalFeatures::new(2048, 512);
        let low = temporal.zero_crossing_rate(&sine_wave(sample_rate, 200.0, 44_100, 0.5));
        let high = temporal.zero_crossing_rate(&sine_wave(sample_rate, 5000.0, 44_100, 0.5));

        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        // Two crossings per period
        let expected_high = 2.0 * 5000.0 / sample_rate as f32;
        assert!(mean(&low) < 0.02, "Expected low ZCR, got {}", mean(&low));
        assert!(
            (mean(&high) - expected_high).abs() < 0.02,
            "Expected ZCR near {}, got {}",
            expected_high,
            mean(&high)
        );
    }

    #[test]
    fn test_zcr_and_rms_of_silence() {
        let temporal = TemporalFeatures::new(2048, 512);
        let silence = vec![0.0; 88_200];
        assert!(temporal.zero_crossing_rate(&silence).iter().all(|&z| z == 0.0));
        assert!(temporal.rms(&silence).iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_rms_of_constant_signal() {
        let temporal = TemporalFeatures::new(16, 4);
        let rms = temporal.rms(&[0.5; 64]);
        // Interior frames see only the constant
        assert!((rms[8] - 0.5).abs() < 1e-6);
        // Edge frames include zero padding
        assert!(rms[0] < 0.5);
    }

    #[test]
    fn test_frame_counts_match_between_descriptors() {
        let temporal = TemporalFeatures::new(2048, 512);
        let signal = sine_wave(44_100, 440.0, 30_000, 0.3);
        assert_eq!(
            temporal.zero_crossing_rate(&signal).len(),
            temporal.rms(&signal).len()
        );
    }
}
