//! WAV encoding for rendered previews.

use std::io::Write;

/// Output gain applied to the synthesizer's [-1, 1] signal.
pub const DEFAULT_GAIN: f32 = 0.3;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Write mono samples as 16-bit PCM. Samples are scaled by `gain` and
/// clipped to the 16-bit range.
pub fn write_wav(
    w: &mut impl Write,
    samples: &[f32],
    sample_rate: u32,
    gain: f32,
) -> std::io::Result<()> {
    let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
    let data_size = samples.len() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, sample_rate, block_align)?;
    write_data_chunk(w, samples, data_size, gain)
}

pub fn samples_to_wav(samples: &[f32], sample_rate: u32, gain: f32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + samples.len() * 2);
    // Vec<u8> writes cannot fail
    let _ = write_wav(&mut buf, samples, sample_rate, gain);
    buf
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write, sample_rate: u32, block_align: u16) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&NUM_CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())
}

fn write_data_chunk(
    w: &mut impl Write,
    samples: &[f32],
    data_size: u32,
    gain: f32,
) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for &sample in samples {
        w.write_all(&to_pcm16(sample * gain).to_le_bytes())?;
    }
    Ok(())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
