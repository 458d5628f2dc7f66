// Tuning module - Per-clip reference tuning estimate for the chroma filterbank
//
// Spectral peaks between 150 Hz and 4 kHz are located per frame with
// parabolic interpolation; only peaks at or above the median peak magnitude
// are kept. Each peak's deviation from the equal-tempered grid (A440) is
// histogrammed at 0.01-bin resolution and the most common deviation wins.
//
// References:
// - Smith, J.O. Spectral Audio Signal Processing: Quadratic interpolation of
//   spectral peaks

/// Lowest peak frequency considered (Hz)
const PEAK_FMIN: f64 = 150.0;
/// Peak frequencies must be below this (Hz)
const PEAK_FMAX: f64 = 4000.0;
/// Peaks below this fraction of the frame maximum are ignored
const PEAK_THRESHOLD: f64 = 0.1;
/// Histogram bin width in fractions of a chroma bin
const RESOLUTION: f64 = 0.01;
/// Frequency of A0, the reference of the pitch grid
const A0_HZ: f64 = 440.0 / 16.0;

/// Interpolated spectral peak
#[derive(Debug, Clone, Copy, PartialEq)]
struct Peak {
    frequency: f64,
    magnitude: f64,
}

/// Estimate the tuning offset of a spectrogram in fractions of a chroma bin
///
/// # Arguments
/// * `spectrogram` - Frames of `n_fft / 2 + 1` bins (power or magnitude)
/// * `sample_rate` - Audio sample rate in Hz
/// * `n_chroma` - Bins per octave of the pitch grid
///
/// # Returns
/// Offset in `[-0.5, 0.5)`; 0.0 when the spectrogram has no usable peaks
pub fn estimate_tuning(spectrogram: &[Vec<f32>], sample_rate: u32, n_chroma: usize) -> f32 {
    let Some(n_bins) = spectrogram.first().map(Vec::len) else {
        return 0.0;
    };
    let n_fft = 2 * n_bins.saturating_sub(1);
    if n_fft == 0 || n_chroma == 0 {
        return 0.0;
    }
    let bin_hz = sample_rate as f64 / n_fft as f64;

    let peaks: Vec<Peak> = spectrogram
        .iter()
        .flat_map(|frame| frame_peaks(frame, bin_hz))
        .filter(|peak| peak.frequency > 0.0)
        .collect();
    if peaks.is_empty() {
        return 0.0;
    }

    let threshold = median(peaks.iter().map(|p| p.magnitude).collect());
    let frequencies: Vec<f64> = peaks
        .iter()
        .filter(|p| p.magnitude >= threshold)
        .map(|p| p.frequency)
        .collect();

    pitch_tuning(&frequencies, n_chroma)
}

/// Local maxima of one frame above the frame threshold
fn frame_peaks(frame: &[f32], bin_hz: f64) -> Vec<Peak> {
    let spectrum: Vec<f64> = frame.iter().map(|&v| (v as f64).abs()).collect();
    let n = spectrum.len();
    let reference = PEAK_THRESHOLD * spectrum.iter().cloned().fold(0.0, f64::max);
    let gated: Vec<f64> = spectrum
        .iter()
        .map(|&v| if v > reference { v } else { 0.0 })
        .collect();

    let mut peaks = Vec::new();
    for k in 0..n {
        let frequency = k as f64 * bin_hz;
        if !(PEAK_FMIN..PEAK_FMAX).contains(&frequency) {
            continue;
        }
        let prev = if k > 0 { gated[k - 1] } else { gated[k] };
        let next = if k + 1 < n { gated[k + 1] } else { gated[k] };
        if !(gated[k] > prev && gated[k] >= next) {
            continue;
        }

        // Parabola through the neighbouring bins; vertex offset in bins
        let (shift, slope) = if k > 0 && k + 1 < n {
            let curvature = spectrum[k + 1] + spectrum[k - 1] - 2.0 * spectrum[k];
            let slope = (spectrum[k + 1] - spectrum[k - 1]) / 2.0;
            let shift = if slope.abs() >= curvature.abs() {
                0.0
            } else {
                -slope / curvature
            };
            (shift, slope)
        } else {
            (0.0, 0.0)
        };

        peaks.push(Peak {
            frequency: (k as f64 + shift) * bin_hz,
            magnitude: spectrum[k] + 0.5 * slope * shift,
        });
    }
    peaks
}

/// Most common deviation of `frequencies` from the equal-tempered grid
fn pitch_tuning(frequencies: &[f64], n_chroma: usize) -> f32 {
    if frequencies.is_empty() {
        return 0.0;
    }
    let n_hist = (1.0 / RESOLUTION).round() as usize;
    let mut counts = vec![0usize; n_hist];
    for &frequency in frequencies {
        let mut residual = (n_chroma as f64 * (frequency / A0_HZ).log2()).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }
        let idx = (((residual + 0.5) / RESOLUTION) as usize).min(n_hist - 1);
        counts[idx] += 1;
    }

    // First bin wins ties
    let best = counts
        .iter()
        .enumerate()
        .fold((0, 0usize), |best, (i, &c)| if c > best.1 { (i, c) } else { best })
        .0;
    (-0.5 + best as f64 * RESOLUTION) as f32
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        0.5 * (values[mid - 1] + values[mid])
    }
}
