//! Imported per-frame sample tables.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::IrError;
use crate::frame::{Waveform, VOLUME_MAX, WAVEFORM_LEN};

/// Per-frame playback data for a `WaveType::Sample` instrument.
///
/// Entry `n` of each table describes frame `n`. The tables come from an
/// external import step and are already quantized to chip values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleTable {
    /// Waveform for each frame
    pub waveforms: Vec<Waveform>,
    /// Volume for each frame (0-15)
    pub volumes: Vec<u8>,
    /// Frequency for each frame, relative to `base_note`
    pub frequencies: Vec<f64>,
    /// First frame of the loop (0 = no loop)
    pub repeat_from: u32,
    /// Number of frames in the loop
    pub repeat_length: u32,
    /// Note the sample was recorded at
    pub base_note: u8,
}

impl SampleTable {
    /// Number of recorded frames.
    pub fn frame_count(&self) -> usize {
        self.volumes.len()
    }

    /// Returns true if no frames were imported.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
            || self.waveforms.len() < self.volumes.len()
            || self.frequencies.len() < self.volumes.len()
    }

    /// Returns true if playback wraps back into the table after the last frame.
    pub fn is_looped(&self) -> bool {
        self.repeat_from > 0
            && self.repeat_length > 0
            && !self.is_empty()
            && (self.repeat_from as usize + self.repeat_length as usize) <= self.frame_count()
    }

    /// Table index played at `frame`, or `None` once a one-shot sample has ended.
    pub fn index_at(&self, frame: u32) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let count = self.frame_count();
        let frame = frame as usize;
        if frame < count {
            Some(frame)
        } else if self.is_looped() {
            let within = (frame - count) % self.repeat_length as usize;
            Some(self.repeat_from as usize + within)
        } else {
            None
        }
    }

    /// Frequency of `base_note` (A-4 = note 33 in sample terms).
    pub fn base_frequency(&self) -> f64 {
        440.0 * libm::pow(2.0, (self.base_note as f64 - 33.0) / 12.0)
    }

    /// Check that the tables agree and the loop stays inside them.
    pub fn validate(&self) -> Result<(), IrError> {
        let count = self.volumes.len();
        if self.waveforms.len() != count || self.frequencies.len() != count {
            return Err(IrError::SampleTable("table lengths differ"));
        }
        if let Some(&v) = self.volumes.iter().find(|&&v| v > VOLUME_MAX) {
            return Err(IrError::InvalidParameter {
                param: "sampleVolume",
                value: v as f64,
                min: 0.0,
                max: VOLUME_MAX as f64,
            });
        }
        for waveform in &self.waveforms {
            if let Some(&v) = waveform.iter().find(|&&v| v > VOLUME_MAX) {
                return Err(IrError::WaveformValue(v));
            }
        }
        if self.frequencies.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(IrError::SampleTable("frequency must be finite and non-negative"));
        }
        if self.repeat_from > 0 {
            if self.repeat_length == 0 {
                return Err(IrError::SampleTable("loop has zero length"));
            }
            if self.repeat_from as usize + self.repeat_length as usize > count {
                return Err(IrError::SampleTable("loop extends past the last frame"));
            }
        }
        Ok(())
    }
}

/// Decode a 32-letter `A`..`P` string into a waveform.
pub fn waveform_from_letters(letters: &str) -> Result<Waveform, IrError> {
    let count = letters.chars().count();
    if count != WAVEFORM_LEN {
        return Err(IrError::WaveformLength(count));
    }
    let mut waveform = [0; WAVEFORM_LEN];
    for (slot, ch) in waveform.iter_mut().zip(letters.chars()) {
        if !('A'..='P').contains(&ch) {
            return Err(IrError::InvalidWaveformLetter(ch));
        }
        *slot = ch as u8 - b'A';
    }
    Ok(waveform)
}

/// Encode a waveform as 32 letters, `A` = 0 through `P` = 15.
pub fn waveform_to_letters(waveform: &Waveform) -> String {
    waveform.iter().map(|&v| (b'A' + v.min(VOLUME_MAX)) as char).collect()
}
