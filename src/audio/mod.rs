// Waveform loading - WAV decoding and resampling to the pipeline rate
//
// Module organization:
// - decoder: hound-based WAV reader with mono down-mix
// - resampler: FFT resampling to the configured sample rate
// - mod.rs: Waveform type and the loader entry points

mod decoder;
mod resampler;

pub use decoder::{decode_wav, DecodedAudio};
pub use resampler::resample;

use std::fs::{File, Metadata};
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::AudioError;

/// Sample rate the trained artifacts were fit at.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Mono PCM samples at a fixed sample rate.
///
/// Produced once per request by the loader and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode a WAV file into a mono waveform at `target_rate`.
///
/// The file handle is owned by the reader inside this call and is closed on
/// every return path, including decode failures.
pub fn load_waveform<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Waveform, AudioError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| AudioError::Unreadable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let metadata_len = file_len(path, file.metadata())?;
    if metadata_len == 0 {
        return Err(AudioError::Empty);
    }
    log::debug!(
        "[Loader] Decoding {} ({} bytes)",
        path.display(),
        metadata_len
    );
    load_waveform_from_reader(BufReader::new(file), target_rate)
}

/// Byte length of an opened file; a failed stat is unreadable, not empty
fn file_len(path: &Path, metadata: io::Result<Metadata>) -> Result<u64, AudioError> {
    metadata
        .map(|m| m.len())
        .map_err(|err| AudioError::Unreadable {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
}

/// Decode WAV bytes from any reader into a mono waveform at `target_rate`.
pub fn load_waveform_from_reader<R: Read>(
    reader: R,
    target_rate: u32,
) -> Result<Waveform, AudioError> {
    if target_rate == 0 {
        return Err(AudioError::InvalidSampleRate { rate: target_rate });
    }

    let decoded = decode_wav(reader)?;
    if decoded.samples.is_empty() {
        return Err(AudioError::Empty);
    }

    let samples = if decoded.sample_rate == target_rate {
        decoded.samples
    } else {
        log::debug!(
            "[Loader] Resampling {} Hz -> {} Hz",
            decoded.sample_rate,
            target_rate
        );
        resample(&decoded.samples, decoded.sample_rate, target_rate)?
    };

    Ok(Waveform::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signals::{sine_wave, write_wav};
    use std::io::Cursor;

    #[test]
    fn test_load_waveform_at_native_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, &sine_wave(44_100, 440.0, 44_100, 0.5), 44_100).unwrap();

        let waveform = load_waveform(&path, 44_100).unwrap();
        assert_eq!(waveform.sample_rate(), 44_100);
        assert_eq!(waveform.len(), 44_100);
        assert!((waveform.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_waveform_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone_22k.wav");
        write_wav(&path, &sine_wave(22_050, 440.0, 22_050, 0.5), 22_050).unwrap();

        let waveform = load_waveform(&path, 44_100).unwrap();
        assert_eq!(waveform.sample_rate(), 44_100);
        assert_eq!(waveform.len(), 44_100);
    }

    #[test]
    fn test_zero_byte_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(load_waveform(&path, 44_100), Err(AudioError::Empty));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = load_waveform("/no/such/clip.wav", 44_100).unwrap_err();
        assert!(matches!(err, AudioError::Unreadable { .. }));
    }

    #[test]
    fn test_failed_stat_is_unreadable_not_empty() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "stat denied");
        let err = file_len(Path::new("clip.wav"), Err(denied)).unwrap_err();
        assert_eq!(
            err,
            AudioError::Unreadable {
                path: "clip.wav".to_string(),
                reason: "stat denied".to_string(),
            }
        );
    }

    #[test]
    fn test_file_len_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bytes.bin");
        std::fs::write(&path, [0u8; 44]).unwrap();
        let file = File::open(&path).unwrap();
        assert_eq!(file_len(&path, file.metadata()), Ok(44));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = load_waveform_from_reader(Cursor::new(b"not a wav file at all"), 44_100)
            .unwrap_err();
        assert!(matches!(
            err,
            AudioError::UnsupportedFormat { .. } | AudioError::Decode { .. }
        ));
    }

    #[test]
    fn test_zero_target_rate_rejected() {
        let err = load_waveform_from_reader(Cursor::new(Vec::new()), 0).unwrap_err();
        assert_eq!(err, AudioError::InvalidSampleRate { rate: 0 });
    }
}
