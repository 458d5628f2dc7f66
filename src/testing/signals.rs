//! Deterministic PCM generators and a WAV writer.
//!
//! Used by unit tests, the integration suites and the CLI `synth-wav`
//! command, so every generator is reproducible from its arguments alone.

use std::f32::consts::PI;
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seed used when a caller does not pick one.
pub const DEFAULT_NOISE_SEED: u64 = 0x5A5A_FFF0;

/// Supported synthetic waveform patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPattern {
    Sine,
    Square,
    WhiteNoise,
    Silence,
}

impl SignalPattern {
    /// Render `n_samples` of this pattern.
    ///
    /// `frequency_hz` is ignored by noise and silence.
    pub fn render(
        self,
        sample_rate: u32,
        frequency_hz: f32,
        n_samples: usize,
        amplitude: f32,
    ) -> Vec<f32> {
        match self {
            SignalPattern::Sine => sine_wave(sample_rate, frequency_hz, n_samples, amplitude),
            SignalPattern::Square => square_wave(sample_rate, frequency_hz, n_samples, amplitude),
            SignalPattern::WhiteNoise => white_noise(n_samples, amplitude, DEFAULT_NOISE_SEED),
            SignalPattern::Silence => silence(n_samples),
        }
    }
}

/// Sine tone starting at phase zero.
pub fn sine_wave(sample_rate: u32, frequency_hz: f32, n_samples: usize, amplitude: f32) -> Vec<f32> {
    (0..n_samples)
        .map(|i| {
            let phase = (i as f64 * frequency_hz as f64 / sample_rate as f64).fract();
            amplitude * (2.0 * PI * phase as f32).sin()
        })
        .collect()
}

/// Square wave starting on the positive half-cycle.
pub fn square_wave(
    sample_rate: u32,
    frequency_hz: f32,
    n_samples: usize,
    amplitude: f32,
) -> Vec<f32> {
    (0..n_samples)
        .map(|i| {
            let phase = (i as f64 * frequency_hz as f64 / sample_rate as f64).fract();
            if phase < 0.5 {
                amplitude
            } else {
                -amplitude
            }
        })
        .collect()
}

/// Uniform white noise in `[-amplitude, amplitude)` from a seeded generator.
pub fn white_noise(n_samples: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    if amplitude <= 0.0 {
        return silence(n_samples);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

pub fn silence(n_samples: usize) -> Vec<f32> {
    vec![0.0; n_samples]
}

/// Write mono 32-bit float PCM.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

/// Write mono 16-bit integer PCM, clamping to full scale.
pub fn write_wav_i16<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}
