// Decoder module - WAV container decoding
//
// Reads integer or float PCM from a WAV stream, scales it to [-1.0, 1.0]
// and averages all channels down to mono.

use std::io::Read;

use crate::error::AudioError;

/// Mono samples at the file's native sample rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decode a WAV stream into mono f32 samples.
pub fn decode_wav<R: Read>(reader: R) -> Result<DecodedAudio, AudioError> {
    let mut reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat {
            details: "WAV header declares zero channels".to_string(),
        });
    }
    if spec.sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate {
            rate: spec.sample_rate,
        });
    }

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => match spec.bits_per_sample {
            32 => reader
                .samples::<f32>()
                .map(|sample| sample.map_err(AudioError::from))
                .collect::<Result<Vec<f32>, _>>()?,
            bits => {
                return Err(AudioError::UnsupportedFormat {
                    details: format!("{}-bit float samples", bits),
                })
            }
        },
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 | 16 | 24 | 32 => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / scale)
                            .map_err(AudioError::from)
                    })
                    .collect::<Result<Vec<f32>, _>>()?
            }
            bits => {
                return Err(AudioError::UnsupportedFormat {
                    details: format!("{}-bit integer samples", bits),
                })
            }
        },
    };

    let samples = if spec.channels == 1 {
        interleaved
    } else {
        let channels = spec.channels as usize;
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
