//! Song structure and sequencing types.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::edit::Edit;
use crate::error::IrError;
use crate::frame::CHANNEL_COUNT;
use crate::instrument::Instrument;
use crate::pattern::{Pattern, PATTERN_ROWS};

/// Instrument slots, numbered 1-15.
pub const INSTRUMENT_COUNT: usize = 15;

/// Patterns, numbered 0-63.
pub const PATTERN_COUNT: usize = 64;

/// Entries in the position list.
pub const POSITION_COUNT: usize = 256;

/// Longest row duration in frames.
const MAX_SPEED: u8 = 31;

/// A complete song.
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    /// Song title
    pub title: ArrayString<32>,
    /// Instruments; `instruments[0]` is slot 1
    pub instruments: Vec<Instrument>,
    /// Patterns, indexed by pattern number
    pub patterns: Vec<Pattern>,
    /// Pattern number for each position
    pub positions: Vec<u8>,
    /// Frames per row (1-31)
    pub speed: u8,
    /// Number of positions played before looping (1-256)
    pub length: u16,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: ArrayString::new(),
            instruments: alloc::vec![Instrument::default(); INSTRUMENT_COUNT],
            patterns: alloc::vec![Pattern::new(); PATTERN_COUNT],
            positions: alloc::vec![0; POSITION_COUNT],
            speed: 6,
            length: 1,
        }
    }
}

impl Song {
    /// Create a new empty song.
    pub fn new(title: &str) -> Self {
        let mut song = Self::default();
        for ch in title.chars() {
            if song.title.try_push(ch).is_err() {
                break;
            }
        }
        song
    }

    /// Instrument in a 1-based slot.
    pub fn instrument(&self, slot: u8) -> Result<&Instrument, IrError> {
        slot.checked_sub(1)
            .and_then(|i| self.instruments.get(i as usize))
            .ok_or(IrError::InvalidSlot(slot))
    }

    /// Mutable instrument in a 1-based slot.
    pub fn instrument_mut(&mut self, slot: u8) -> Result<&mut Instrument, IrError> {
        slot.checked_sub(1)
            .and_then(|i| self.instruments.get_mut(i as usize))
            .ok_or(IrError::InvalidSlot(slot))
    }

    pub fn pattern(&self, index: u8) -> Result<&Pattern, IrError> {
        self.patterns.get(index as usize).ok_or(IrError::InvalidPattern(index))
    }

    pub fn pattern_mut(&mut self, index: u8) -> Result<&mut Pattern, IrError> {
        self.patterns.get_mut(index as usize).ok_or(IrError::InvalidPattern(index))
    }

    /// The played part of the position list.
    pub fn active_positions(&self) -> &[u8] {
        let end = (self.length as usize).clamp(1, POSITION_COUNT).min(self.positions.len());
        &self.positions[..end]
    }

    /// Length of one pass through the song in frames.
    pub fn total_frames(&self) -> u64 {
        self.active_positions().len() as u64 * PATTERN_ROWS as u64 * self.speed as u64
    }

    /// Check sizes, ranges and every instrument and pattern.
    pub fn validate(&self) -> Result<(), IrError> {
        if self.instruments.len() != INSTRUMENT_COUNT {
            return Err(IrError::InvalidSlot(self.instruments.len() as u8));
        }
        if self.patterns.len() != PATTERN_COUNT {
            return Err(IrError::InvalidPattern(self.patterns.len().min(255) as u8));
        }
        check_speed(self.speed)?;
        check_length(self.length)?;
        if self.positions.len() != POSITION_COUNT {
            return Err(IrError::InvalidPosition {
                index: self.positions.len() as u16,
                value: 0,
            });
        }
        for (index, &pattern) in self.positions.iter().enumerate() {
            check_position(index as u16, pattern)?;
        }
        for instrument in &self.instruments {
            instrument.validate()?;
        }
        for pattern in &self.patterns {
            pattern.validate()?;
        }
        Ok(())
    }

    /// Apply an edit by value. A sample table is moved into its slot
    /// rather than cloned, so draining queued edits does not allocate.
    pub fn apply_owned_edit(&mut self, edit: Edit) -> Result<(), IrError> {
        match edit {
            Edit::SetSample { slot, sample } => {
                sample.validate()?;
                self.instrument_mut(slot)?.sample = sample;
                Ok(())
            }
            edit => self.apply_edit(&edit),
        }
    }

    /// Apply an edit, leaving the song untouched if it is rejected.
    pub fn apply_edit(&mut self, edit: &Edit) -> Result<(), IrError> {
        match edit {
            Edit::SetParam { slot, param, value } => {
                self.instrument_mut(*slot)?.set(*param, *value)?;
            }
            Edit::SetWaveType { slot, wave_type } => {
                self.instrument_mut(*slot)?.wave_type = *wave_type;
            }
            Edit::SetName { slot, name } => {
                self.instrument_mut(*slot)?.name = *name;
            }
            Edit::SetSample { slot, sample } => {
                sample.validate()?;
                self.instrument_mut(*slot)?.sample = sample.clone();
            }
            Edit::SetCell { pattern, row, channel, cell } => {
                if *row >= PATTERN_ROWS || *channel as usize >= CHANNEL_COUNT {
                    return Err(IrError::InvalidCell {
                        row: *row,
                        channel: *channel,
                        reason: "outside the pattern",
                    });
                }
                cell.validate(*row, *channel)?;
                *self.pattern_mut(*pattern)?.cell_mut(*row, *channel) = *cell;
            }
            Edit::SetPosition { index, pattern } => {
                if *index as usize >= self.positions.len() {
                    return Err(IrError::InvalidPosition { index: *index, value: *pattern as u16 });
                }
                check_position(*index, *pattern)?;
                self.positions[*index as usize] = *pattern;
            }
            Edit::SetSpeed(speed) => {
                check_speed(*speed)?;
                self.speed = *speed;
            }
            Edit::SetLength(length) => {
                check_length(*length)?;
                self.length = *length;
            }
        }
        Ok(())
    }
}

fn check_speed(speed: u8) -> Result<(), IrError> {
    if (1..=MAX_SPEED).contains(&speed) {
        Ok(())
    } else {
        Err(IrError::InvalidParameter {
            param: "speed",
            value: speed as f64,
            min: 1.0,
            max: MAX_SPEED as f64,
        })
    }
}

fn check_length(length: u16) -> Result<(), IrError> {
    if (1..=POSITION_COUNT as u16).contains(&length) {
        Ok(())
    } else {
        Err(IrError::InvalidParameter {
            param: "length",
            value: length as f64,
            min: 1.0,
            max: POSITION_COUNT as f64,
        })
    }
}

fn check_position(index: u16, pattern: u8) -> Result<(), IrError> {
    if (pattern as usize) < PATTERN_COUNT {
        Ok(())
    } else {
        Err(IrError::InvalidPosition { index, value: pattern as u16 })
    }
}
