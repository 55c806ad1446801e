//! Sample-rate conversion for mono PCM
//!
//! Two flavours: band-limited sinc resampling through rubato, and naive
//! decimation that keeps every Nth sample with no anti-aliasing.

use anyhow::{bail, Context, Result};
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use tracing::debug;

/// Resample mono samples with rubato `SincFixedIn`
///
/// Returns the input unchanged when the rates already match.
pub fn resample_mono(samples: Vec<f32>, source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples);
    }
    if source_rate == 0 {
        bail!("Source sample rate is zero");
    }

    let num_frames = samples.len();

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let resample_ratio = target_rate as f64 / source_rate as f64;

    // One chunk holds the whole input; zero-fed partial chunks flush the tail
    let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 2.0, params, num_frames, 1)
        .context("Failed to create rubato resampler")?;

    let delay = resampler.output_delay();
    let expected = (num_frames as f64 * resample_ratio).round() as usize;

    let input_channels = vec![samples];
    let mut output = resampler
        .process(&input_channels, None)
        .context("Rubato resampling failed")?
        .pop()
        .unwrap_or_default();

    while output.len() < delay + expected {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .context("Rubato flush failed")?
            .pop()
            .unwrap_or_default();
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);

    debug!(
        "Resampled {} frames ({} Hz) → {} frames ({} Hz)",
        num_frames,
        source_rate,
        output.len(),
        target_rate
    );

    Ok(output)
}

/// Decimation step for a source/target rate pair: `floor(source / target)`
///
/// Fails when the source rate is below the target, since decimation cannot
/// raise the rate.
pub fn decimation_step(source_rate: u32, target_rate: u32) -> Result<usize> {
    if target_rate == 0 {
        bail!("Target sample rate is zero");
    }
    let step = (source_rate / target_rate) as usize;
    if step == 0 {
        bail!(
            "Cannot decimate {} Hz down to {} Hz: source rate is below target",
            source_rate,
            target_rate
        );
    }
    Ok(step)
}

/// Keep every `step`-th sample, starting with the first
pub fn decimate(samples: &[f32], step: usize) -> Vec<f32> {
    samples.iter().step_by(step.max(1)).copied().collect()
}
