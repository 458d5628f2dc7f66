// Chroma module - Pitch class profile from the power spectrogram
//
// Each FFT bin is assigned to the 12 pitch classes through Gaussian bumps
// centred on its fractional pitch class, with a broad Gaussian weighting
// across octaves centred on octave 5 (roughly 500 Hz). The chromagram of a
// frame is then scaled so its strongest pitch class is 1.0.
//
// References:
// - Ellis, D. (2007). Chroma feature analysis and synthesis

/// Centre octave of the octave weighting
const CENTER_OCTAVE: f64 = 5.0;
/// Width (in octaves) of the octave weighting
const OCTAVE_WIDTH: f64 = 2.0;
/// Frames whose strongest chroma bin is below this are left unscaled
const NORM_THRESHOLD: f32 = f32::MIN_POSITIVE;

/// Chroma filterbank matrix (`n_chroma` rows × `n_bins` columns)
pub struct ChromaFilterbank {
    filters: Vec<Vec<f32>>,
}

impl ChromaFilterbank {
    /// Build the filterbank
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT size the spectra were computed with
    /// * `n_chroma` - Number of pitch classes (12 for semitones)
    /// * `tuning` - Reference offset from A440 in fractions of a chroma bin
    pub fn new(sample_rate: u32, fft_size: usize, n_chroma: usize, tuning: f32) -> Self {
        let n_chroma_f = n_chroma as f64;
        let a440 = 440.0 * 2f64.powf(tuning as f64 / n_chroma_f);

        // Fractional chroma position of every non-DC bin; the DC bin gets a
        // position 1.5 octaves below bin 1
        let mut freq_bins: Vec<f64> = (1..fft_size)
            .map(|i| {
                let freq = sample_rate as f64 * i as f64 / fft_size as f64;
                n_chroma_f * (freq / (a440 / 16.0)).log2()
            })
            .collect();
        freq_bins.insert(0, freq_bins[0] - 1.5 * n_chroma_f);

        let bin_widths: Vec<f64> = freq_bins
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).max(1.0))
            .chain(std::iter::once(1.0))
            .collect();

        let half = (n_chroma_f / 2.0).round();
        let mut weights: Vec<Vec<f64>> = (0..n_chroma)
            .map(|c| {
                freq_bins
                    .iter()
                    .zip(&bin_widths)
                    .map(|(&position, &width)| {
                        let d = (position - c as f64 + half + 10.0 * n_chroma_f)
                            .rem_euclid(n_chroma_f)
                            - half;
                        (-0.5 * (2.0 * d / width).powi(2)).exp()
                    })
                    .collect()
            })
            .collect();

        // Unit L2 norm per FFT bin across chroma
        for bin in 0..fft_size {
            let norm = weights.iter().map(|row| row[bin] * row[bin]).sum::<f64>().sqrt();
            if norm > 0.0 {
                weights.iter_mut().for_each(|row| row[bin] /= norm);
            }
        }

        // Octave weighting
        for (bin, &position) in freq_bins.iter().enumerate() {
            let octave = position / n_chroma_f;
            let gain = (-0.5 * ((octave - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
            weights.iter_mut().for_each(|row| row[bin] *= gain);
        }

        // Rotate so row 0 is C instead of A
        let shift = 3 * (n_chroma / 12);
        weights.rotate_left(shift % n_chroma.max(1));

        let n_bins = fft_size / 2 + 1;
        let filters = weights
            .into_iter()
            .map(|row| row[..n_bins].iter().map(|&w| w as f32).collect())
            .collect();

        Self { filters }
    }

    pub fn n_chroma(&self) -> usize {
        self.filters.len()
    }

    /// Chroma of one power spectrum, scaled so the maximum is 1.0
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        let mut chroma: Vec<f32> = self
            .filters
            .iter()
            .map(|filter| filter.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect();

        let peak = chroma.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
        if peak >= NORM_THRESHOLD {
            chroma.iter_mut().for_each(|v| *v /= peak);
        }
        chroma
    }
}
