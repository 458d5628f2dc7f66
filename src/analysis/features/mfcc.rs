// MFCC module - Cepstral coefficients from log-mel frames
//
// Applies an orthonormal type-II DCT across the mel bands of each dB-scaled
// frame and keeps the first `n_mfcc` coefficients.

/// Truncated orthonormal DCT-II basis (`n_mfcc` rows × `n_mels` columns)
pub struct DctBasis {
    rows: Vec<Vec<f32>>,
}

impl DctBasis {
    pub fn new(n_mfcc: usize, n_mels: usize) -> Self {
        let n = n_mels as f64;
        let rows = (0..n_mfcc)
            .map(|k| {
                let scale = if k == 0 {
                    (1.0 / n).sqrt()
                } else {
                    (2.0 / n).sqrt()
                };
                (0..n_mels)
                    .map(|m| {
                        let angle =
                            std::f64::consts::PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n);
                        (scale * angle.cos()) as f32
                    })
                    .collect()
            })
            .collect();

        Self { rows }
    }

    pub fn n_mfcc(&self) -> usize {
        self.rows.len()
    }

    /// Coefficients of one log-mel frame
    pub fn apply(&self, log_mel: &[f32]) -> Vec<f32> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(log_mel).map(|(b, x)| b * x).sum())
            .collect()
    }
}
