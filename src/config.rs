//! Configuration management for the inference pipeline
//!
//! This module provides runtime configuration loading from JSON files. The
//! feature framing constants live here because they must match whatever
//! produced the trained artifacts: a different hop or band count changes the
//! feature layout (caught at startup) or silently shifts the feature values
//! (not caught at all), so they are pinned in one place.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub artifacts: ArtifactPaths,
}

/// Waveform loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Rate every decoded waveform is resampled to (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

/// Feature extraction framing and band parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// FFT size and analysis frame length in samples
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    /// Hop between successive frames in samples
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    /// Number of mel bands
    #[serde(default = "default_n_mels")]
    pub n_mels: usize,
    /// Number of cepstral coefficients kept
    #[serde(default = "default_n_mfcc")]
    pub n_mfcc: usize,
    /// Number of chroma bins (pitch classes)
    #[serde(default = "default_n_chroma")]
    pub n_chroma: usize,
    /// Lowest mel filter edge (Hz)
    #[serde(default)]
    pub fmin: f32,
    /// Highest mel filter edge (Hz); Nyquist when absent
    #[serde(default)]
    pub fmax: Option<f32>,
    /// Dynamic range kept when converting mel power to dB
    #[serde(default = "default_top_db")]
    pub top_db: f32,
    /// Chroma reference tuning offset in fractions of a chroma bin; estimated
    /// from each clip's spectrogram when absent
    #[serde(default)]
    pub tuning: Option<f32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_fft: default_n_fft(),
            hop_length: default_hop_length(),
            n_mels: default_n_mels(),
            n_mfcc: default_n_mfcc(),
            n_chroma: default_n_chroma(),
            fmin: 0.0,
            fmax: None,
            top_db: default_top_db(),
            tuning: None,
        }
    }
}

impl FeatureConfig {
    /// Check the framing parameters are usable at the given sample rate
    pub fn validate(&self, sample_rate: u32) -> Result<(), String> {
        if self.n_fft < 2 {
            return Err(format!("n_fft must be at least 2 (got {})", self.n_fft));
        }
        if self.hop_length == 0 {
            return Err("hop_length must be > 0".to_string());
        }
        if self.n_mels == 0 || self.n_chroma == 0 || self.n_mfcc == 0 {
            return Err("n_mels, n_mfcc and n_chroma must all be > 0".to_string());
        }
        if self.n_mfcc > self.n_mels {
            return Err(format!(
                "n_mfcc ({}) cannot exceed n_mels ({})",
                self.n_mfcc, self.n_mels
            ));
        }
        let fmax = self.fmax_or_nyquist(sample_rate);
        if self.fmin < 0.0 || fmax <= self.fmin {
            return Err(format!(
                "mel range [{}, {}] Hz is empty",
                self.fmin, fmax
            ));
        }
        if !(self.top_db > 0.0) {
            return Err(format!("top_db must be positive (got {})", self.top_db));
        }
        if let Some(tuning) = self.tuning {
            if !(-0.5..0.5).contains(&tuning) {
                return Err(format!("tuning must be in [-0.5, 0.5) (got {})", tuning));
            }
        }
        Ok(())
    }

    /// Upper mel edge, defaulting to the Nyquist frequency
    pub fn fmax_or_nyquist(&self, sample_rate: u32) -> f32 {
        self.fmax.unwrap_or(sample_rate as f32 / 2.0)
    }
}

/// Locations of the trained artifacts loaded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub labels: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/model.onnx"),
            scaler: PathBuf::from("assets/scaler.json"),
            labels: PathBuf::from("assets/labels.json"),
        }
    }
}

impl ArtifactPaths {
    /// Resolve relative artifact paths against a base directory
    pub fn relative_to(&self, base: &Path) -> Self {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            model: resolve(&self.model),
            scaler: resolve(&self.scaler),
            labels: resolve(&self.labels),
        }
    }
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_n_fft() -> usize {
    2048
}

fn default_hop_length() -> usize {
    512
}

fn default_n_mels() -> usize {
    128
}

fn default_n_mfcc() -> usize {
    40
}

fn default_n_chroma() -> usize {
    12
}

fn default_top_db() -> f32 {
    80.0
}

impl PipelineConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// its JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/pipeline_config.json")
    }
}
