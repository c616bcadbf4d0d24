//! Offline bounce — renders the engine to a 16-bit stereo PCM WAV file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::AudioEngine;
use crate::error::StepwaveError;

/// Write mono samples as a canonical 44-byte-header RIFF/WAVE file, with
/// the mono signal duplicated onto both channels.
pub fn write_wav<W: Write>(
    writer: &mut W,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), StepwaveError> {
    const CHANNELS: u16 = 2;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (samples.len() * block_align as usize) as u32;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_len).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?; // PCM
    writer.write_all(&CHANNELS.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    for &sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        let bytes = clamped.to_le_bytes();
        writer.write_all(&bytes)?; // left
        writer.write_all(&bytes)?; // right
    }

    Ok(())
}

/// Render `seconds` of the engine's output and write it to `path`.
pub fn bounce_to_wav(
    engine: &mut AudioEngine,
    seconds: f64,
    path: &Path,
) -> Result<(), StepwaveError> {
    let samples = engine.render_seconds(seconds);
    let mut writer = BufWriter::new(File::create(path)?);
    write_wav(&mut writer, &samples, engine.sample_rate() as u32)?;
    writer.flush()?;
    log::info!("bounced {seconds:.1}s to {}", path.display());
    Ok(())
}
