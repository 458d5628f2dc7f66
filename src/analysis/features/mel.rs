// Mel module - Mel filterbank and dB conversion
//
// Triangular filters on the Slaney mel scale (linear below 1 kHz, logarithmic
// above), each scaled to unit area so band energies are comparable across the
// spectrum. The filterbank is built once per extractor.

/// Power floor used before taking logarithms
const AMIN: f32 = 1e-10;

/// Slaney mel scale: linear region slope (Hz per mel)
const F_SP: f64 = 200.0 / 3.0;
/// Start of the logarithmic region (Hz)
const MIN_LOG_HZ: f64 = 1000.0;

fn log_step() -> f64 {
    (6.4f64).ln() / 27.0
}

/// Convert frequency to the Slaney mel scale
pub fn hz_to_mel(hz: f64) -> f64 {
    let min_log_mel = MIN_LOG_HZ / F_SP;
    if hz >= MIN_LOG_HZ {
        min_log_mel + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert a Slaney mel value back to frequency
pub fn mel_to_hz(mel: f64) -> f64 {
    let min_log_mel = MIN_LOG_HZ / F_SP;
    if mel >= min_log_mel {
        MIN_LOG_HZ * (log_step() * (mel - min_log_mel)).exp()
    } else {
        F_SP * mel
    }
}

/// Mel filterbank matrix (`n_mels` rows × `n_bins` columns)
pub struct MelFilterbank {
    filters: Vec<Vec<f32>>,
}

impl MelFilterbank {
    /// Build the filterbank
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT size the spectra were computed with
    /// * `n_mels` - Number of mel bands
    /// * `fmin` / `fmax` - Frequency range covered by the bands
    pub fn new(sample_rate: u32, fft_size: usize, n_mels: usize, fmin: f32, fmax: f32) -> Self {
        let n_bins = fft_size / 2 + 1;
        let nyquist = sample_rate as f64 / 2.0;
        let fft_freqs: Vec<f64> = (0..n_bins)
            .map(|i| nyquist * i as f64 / (n_bins - 1).max(1) as f64)
            .collect();

        // n_mels + 2 points equally spaced in mel, converted back to Hz
        let mel_min = hz_to_mel(fmin as f64);
        let mel_max = hz_to_mel(fmax as f64);
        let hz_points: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (left, center, right) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
                let enorm = 2.0 / (right - left);
                fft_freqs
                    .iter()
                    .map(|&f| {
                        let lower = (f - left) / (center - left);
                        let upper = (right - f) / (right - center);
                        (lower.min(upper).max(0.0) * enorm) as f32
                    })
                    .collect()
            })
            .collect();

        Self { filters }
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Project one power spectrum onto the mel bands
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| filter.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }

    #[cfg(test)]
    pub fn filters(&self) -> &[Vec<f32>] {
        &self.filters
    }
}

/// Convert a power spectrogram to decibels in place.
///
/// Values are floored at `AMIN`, referenced to 1.0, and clipped to at most
/// `top_db` below the loudest value in the whole spectrogram.
pub fn power_to_db(frames: &mut [Vec<f32>], top_db: f32) {
    let mut max_db = f32::NEG_INFINITY;
    for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = 10.0 * value.max(AMIN).log10();
        max_db = max_db.max(*value);
    }

    let floor = max_db - top_db;
    for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = value.max(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 200.0, 999.0, 1000.0, 4000.0, 22050.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 1e-6, "{} -> {}", hz, back);
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_filterbank_shape_and_coverage() {
        let bank = MelFilterbank::new(44_100, 2048, 128, 0.0, 22_050.0);
        assert_eq!(bank.n_mels(), 128);
        assert!(bank.filters().iter().all(|f| f.len() == 1025));
        // Every band has some positive weight
        for (m, filter) in bank.filters().iter().enumerate() {
            assert!(filter.iter().any(|&w| w > 0.0), "band {} is empty", m);
            assert!(filter.iter().all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn test_filter_peaks_increase_with_band() {
        let bank = MelFilterbank::new(44_100, 2048, 40, 0.0, 22_050.0);
        let peaks: Vec<usize> = bank
            .filters()
            .iter()
            .map(|f| {
                f.iter()
                    .enumerate()
                    .fold((0, 0.0f32), |best, (i, &w)| if w > best.1 { (i, w) } else { best })
                    .0
            })
            .collect();
        assert!(peaks.windows(2).all(|p| p[0] <= p[1]));
    }

    #[test]
    fn test_power_to_db_clips_to_top_db() {
        let mut frames = vec![vec![1.0, 1e-3, 0.0], vec![100.0, 1e-12, 10.0]];
        power_to_db(&mut frames, 80.0);
        assert!((frames[1][0] - 20.0).abs() < 1e-4);
        assert!((frames[0][0] - 0.0).abs() < 1e-4);
        assert!((frames[0][1] + 30.0).abs() < 1e-3);
        // Clipped at 20 - 80 = -60 dB
        assert!((frames[0][2] + 60.0).abs() < 1e-4);
        assert!((frames[1][1] + 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_power_to_db_of_silence_is_finite() {
        let mut frames = vec![vec![0.0; 4]; 3];
        power_to_db(&mut frames, 80.0);
        assert!(frames.iter().flatten().all(|v| v.is_finite()));
        assert!(frames.iter().flatten().all(|&v| (v + 100.0).abs() < 1e-4));
    }
}
