// FeatureExtractor - DSP feature extraction for speech emotion classification
//
// This module turns a whole waveform into one fixed-length vector by
// computing five frame-wise descriptors and averaging each across frames.
//
// Module organization:
// - types: FeatureLayout and FeatureVector
// - fft: STFT power spectrogram
// - temporal: Zero-crossing rate, RMS energy and centered framing
// - mel: Slaney mel filterbank and dB conversion
// - mfcc: Orthonormal DCT for cepstral coefficients
// - chroma: Pitch class filterbank
// - tuning: Per-clip tuning estimate for the chroma filterbank
// - mod.rs: Coordinator (FeatureExtractor)
//
// Features extracted, in vector order:
// 1. Zero-crossing rate (1)
// 2. Chroma STFT (n_chroma, 12)
// 3. MFCC (n_mfcc, 40)
// 4. RMS energy (1)
// 5. Mel spectrogram (n_mels, 128)
//
// References:
// - Davis, S. & Mermelstein, P. (1980). Comparison of parametric representations
//   for monosyllabic word recognition
// - McFee, B. et al. (2015). librosa: Audio and music signal analysis in Python

mod chroma;
mod fft;
mod mel;
mod mfcc;
mod temporal;
mod tuning;
mod types;

pub use types::{FeatureLayout, FeatureVector};

use chroma::ChromaFilterbank;
use fft::StftProcessor;
use mel::{power_to_db, MelFilterbank};
use mfcc::DctBasis;
use temporal::TemporalFeatures;
use tuning::estimate_tuning;

use crate::audio::Waveform;
use crate::config::FeatureConfig;
use crate::error::{ArtifactError, PipelineError};

/// FeatureExtractor coordinates the DSP feature extraction pipeline
///
/// The mel filterbank, DCT basis and FFT plan are built once at
/// construction. The chroma filterbank is fixed too when the configuration
/// pins a tuning; otherwise it is rebuilt per clip from that clip's estimated
/// tuning. Each call to [`FeatureExtractor::extract`] works on its own
/// buffers, so one extractor can be shared across threads.
pub struct FeatureExtractor {
    sample_rate: u32,
    layout: FeatureLayout,
    top_db: f32,
    stft: StftProcessor,
    temporal: TemporalFeatures,
    mel_filterbank: MelFilterbank,
    /// Present only for a configured tuning
    chroma_filterbank: Option<ChromaFilterbank>,
    dct: DctBasis,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Arguments
    /// * `sample_rate` - Rate of the waveforms that will be passed in (Hz)
    /// * `config` - Framing and band parameters
    ///
    /// # Errors
    /// `InvalidParameters` if the framing parameters are unusable or a
    /// filterbank disagrees with the feature layout
    pub fn new(sample_rate: u32, config: &FeatureConfig) -> Result<Self, ArtifactError> {
        config
            .validate(sample_rate)
            .map_err(|reason| ArtifactError::InvalidParameters { reason })?;

        let fmax = config.fmax_or_nyquist(sample_rate);

        let extractor = Self {
            sample_rate,
            layout: FeatureLayout::from_config(config),
            top_db: config.top_db,
            stft: StftProcessor::new(config.n_fft, config.hop_length),
            temporal: TemporalFeatures::new(config.n_fft, config.hop_length),
            mel_filterbank: MelFilterbank::new(
                sample_rate,
                config.n_fft,
                config.n_mels,
                config.fmin,
                fmax,
            ),
            chroma_filterbank: config
                .tuning
                .map(|t| ChromaFilterbank::new(sample_rate, config.n_fft, config.n_chroma, t)),
            dct: DctBasis::new(config.n_mfcc, config.n_mels),
        };
        extractor.check_layout(config.n_fft)?;
        Ok(extractor)
    }

    /// Every stage must produce exactly the widths the layout reserves
    fn check_layout(&self, n_fft: usize) -> Result<(), ArtifactError> {
        let mut checks = vec![
            ("STFT frame length", n_fft, self.stft.fft_size()),
            ("mel bands", self.layout.n_mels, self.mel_filterbank.n_mels()),
            ("MFCC coefficients", self.layout.n_mfcc, self.dct.n_mfcc()),
        ];
        if let Some(bank) = &self.chroma_filterbank {
            checks.push(("chroma bins", self.layout.n_chroma, bank.n_chroma()));
        }

        for (what, expected, found) in checks {
            if expected != found {
                return Err(ArtifactError::InvalidParameters {
                    reason: format!("{} is {} but the layout expects {}", what, found, expected),
                });
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    /// Fixed output length of [`FeatureExtractor::extract`]
    pub fn output_len(&self) -> usize {
        self.layout.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Extract the feature vector of a waveform
    ///
    /// # Errors
    /// `FeatureExtraction` if the waveform is empty, at the wrong rate, or
    /// produces any NaN/infinite feature value
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureVector, PipelineError> {
        if waveform.sample_rate() != self.sample_rate {
            return Err(PipelineError::FeatureExtraction {
                reason: format!(
                    "waveform is {} Hz but extractor expects {} Hz",
                    waveform.sample_rate(),
                    self.sample_rate
                ),
            });
        }
        self.extract_samples(waveform.samples())
    }

    /// Extract the feature vector of raw samples at the extractor's rate
    pub fn extract_samples(&self, audio: &[f32]) -> Result<FeatureVector, PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::FeatureExtraction {
                reason: "waveform has no samples".to_string(),
            });
        }
        if let Some(idx) = audio.iter().position(|s| !s.is_finite()) {
            return Err(PipelineError::FeatureExtraction {
                reason: format!("sample {} is not finite", idx),
            });
        }

        // Extract time-domain features
        let zcr = mean(&self.temporal.zero_crossing_rate(audio));
        let rms = mean(&self.temporal.rms(audio));

        // Extract frequency-domain features
        let power = self.stft.power_spectrogram(audio);

        let estimated;
        let chroma_filterbank = match &self.chroma_filterbank {
            Some(bank) => bank,
            None => {
                let tuning = estimate_tuning(&power, self.sample_rate, self.layout.n_chroma);
                log::debug!("[FeatureExtractor] estimated tuning {:+.2}", tuning);
                estimated = ChromaFilterbank::new(
                    self.sample_rate,
                    self.stft.fft_size(),
                    self.layout.n_chroma,
                    tuning,
                );
                &estimated
            }
        };
        let chroma_frames: Vec<Vec<f32>> = power
            .iter()
            .map(|frame| chroma_filterbank.apply(frame))
            .collect();
        let mut mel_frames: Vec<Vec<f32>> = power
            .iter()
            .map(|frame| self.mel_filterbank.apply(frame))
            .collect();
        let mel = mean_frames(&mel_frames, self.layout.n_mels);

        power_to_db(&mut mel_frames, self.top_db);
        let mfcc_frames: Vec<Vec<f32>> = mel_frames
            .iter()
            .map(|frame| self.dct.apply(frame))
            .collect();

        let chroma = mean_frames(&chroma_frames, self.layout.n_chroma);
        let mfcc = mean_frames(&mfcc_frames, self.layout.n_mfcc);

        let features = FeatureVector::from_parts(self.layout, zcr, &chroma, &mfcc, rms, &mel);

        if let Some(idx) = features.first_non_finite() {
            return Err(PipelineError::FeatureExtraction {
                reason: format!("feature {} is not finite", idx),
            });
        }

        log::debug!(
            "[FeatureExtractor] {} frames, zcr={:.4}, rms={:.6}",
            power.len(),
            zcr,
            rms
        );

        Ok(features)
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

/// Column means of a frames × width matrix
fn mean_frames(frames: &[Vec<f32>], width: usize) -> Vec<f32> {
    let mut sums = vec![0.0f64; width];
    for frame in frames {
        for (acc, &v) in sums.iter_mut().zip(frame) {
            *acc += v as f64;
        }
    }
    let count = frames.len().max(1) as f64;
    sums.into_iter().map(|s| (s / count) as f32).collect()
}
