// Resampler module - one-shot sample rate conversion
//
// Converts a whole decoded clip to the pipeline rate with rubato's FFT
// resampler. The resampler's output delay is trimmed so sample 0 of the
// output lines up with sample 0 of the input.

use rubato::{FftFixedIn, Resampler};

use crate::error::AudioError;

/// Input chunk size fed to the resampler
const CHUNK_FRAMES: usize = 1024;

/// Resample `samples` from `from_rate` to `to_rate`.
///
/// The output holds exactly `ceil(len * to_rate / from_rate)` samples.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 {
        return Err(AudioError::InvalidSampleRate { rate: from_rate });
    }
    if to_rate == 0 {
        return Err(AudioError::InvalidSampleRate { rate: to_rate });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_FRAMES,
        2, // sub_chunks for quality
        1,
    )
    .map_err(|err| AudioError::Resample {
        reason: err.to_string(),
    })?;

    let expected =
        ((samples.len() as u64 * to_rate as u64 + from_rate as u64 - 1) / from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);

    let mut position = 0;
    while samples.len() - position >= resampler.input_frames_next() {
        let frames = resampler.input_frames_next();
        let chunk = resampler
            .process(&[&samples[position..position + frames]], None)
            .map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);
        position += frames;
    }

    if position < samples.len() {
        let chunk = resampler
            .process_partial(Some(&[&samples[position..]]), None)
            .map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);
    }

    // Flush the tail still held inside the resampler
    let mut flushes = 0;
    while output.len() < expected + delay && flushes < 8 {
        let chunk = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(resample_error)?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
        flushes += 1;
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);
    Ok(output)
}

fn resample_error(err: rubato::ResampleError) -> AudioError {
    AudioError::Resample {
        reason: err.to_string(),
    }
}
