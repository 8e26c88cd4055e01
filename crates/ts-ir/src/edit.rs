//! Edit commands for mutating song data during playback.

use arrayvec::ArrayString;

use crate::instrument::{InstrumentParam, WaveType};
use crate::pattern::Cell;
use crate::sample::SampleTable;

/// An edit command that mutates song data.
///
/// Edits are validated when applied, so a rejected edit leaves the song
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    /// Set one numeric parameter of an instrument.
    SetParam {
        slot: u8,
        param: InstrumentParam,
        value: f64,
    },
    /// Switch an instrument's wave generator.
    SetWaveType { slot: u8, wave_type: WaveType },
    /// Rename an instrument.
    SetName { slot: u8, name: ArrayString<32> },
    /// Replace an instrument's imported sample table.
    SetSample { slot: u8, sample: SampleTable },
    /// Set a single cell in a pattern.
    SetCell {
        pattern: u8,
        row: u16,
        channel: u8,
        cell: Cell,
    },
    /// Point a position list entry at a pattern.
    SetPosition { index: u16, pattern: u8 },
    /// Set frames per row.
    SetSpeed(u8),
    /// Set the number of positions played.
    SetLength(u16),
}

impl Edit {
    /// Instrument slot touched by this edit, if any.
    pub fn slot(&self) -> Option<u8> {
        match self {
            Edit::SetParam { slot, .. }
            | Edit::SetWaveType { slot, .. }
            | Edit::SetName { slot, .. }
            | Edit::SetSample { slot, .. } => Some(*slot),
            _ => None,
        }
    }
}
