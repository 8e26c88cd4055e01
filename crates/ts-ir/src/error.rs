//! Validation errors for IR types.

use thiserror::Error;

/// Error raised when IR data fails validation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IrError {
    /// A numeric parameter is out of range or not integral
    #[error("invalid {param}: {value} (expected {min}..={max})")]
    InvalidParameter {
        param: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Wave type code outside 1-5
    #[error("invalid wave type code {0}")]
    InvalidWaveType(u8),
    /// Instrument slot outside 1-15
    #[error("invalid instrument slot {0}")]
    InvalidSlot(u8),
    /// Pattern index outside 0-63
    #[error("invalid pattern {0}")]
    InvalidPattern(u8),
    /// Cell address or contents out of range
    #[error("invalid cell at row {row}, channel {channel}: {reason}")]
    InvalidCell {
        row: u16,
        channel: u8,
        reason: &'static str,
    },
    /// Position list index or value out of range
    #[error("invalid position {index}: {value}")]
    InvalidPosition { index: u16, value: u16 },
    /// Waveform letter outside A-P
    #[error("invalid waveform letter {0:?}")]
    InvalidWaveformLetter(char),
    /// Waveform with the wrong number of entries
    #[error("waveform has {0} entries, expected 32")]
    WaveformLength(usize),
    /// Waveform entry above 15
    #[error("waveform value {0} exceeds 15")]
    WaveformValue(u8),
    /// Inconsistent sample table
    #[error("invalid sample table: {0}")]
    SampleTable(&'static str),
    /// Unparseable note name or note number out of range
    #[error("invalid note {0}")]
    InvalidNote(u16),
}
