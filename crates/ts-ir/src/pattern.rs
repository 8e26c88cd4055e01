//! Pattern and cell types for song sequences.

use alloc::vec::Vec;

use crate::error::IrError;
use crate::frame::CHANNEL_COUNT;
use crate::note::MAX_NOTE;
use crate::song::INSTRUMENT_COUNT;

/// Rows in every pattern.
pub const PATTERN_ROWS: u16 = 64;

/// A single cell in a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Note number (0 = none, 1-96)
    pub note: u8,
    /// Instrument slot (0 = keep the channel's instrument, 1-15)
    pub instrument: u8,
}

impl Cell {
    /// Create an empty cell.
    pub const fn empty() -> Self {
        Self { note: 0, instrument: 0 }
    }

    /// Returns true if the cell neither plays nor selects anything.
    pub fn is_empty(&self) -> bool {
        self.note == 0 && self.instrument == 0
    }

    pub(crate) fn validate(&self, row: u16, channel: u8) -> Result<(), IrError> {
        if self.note > MAX_NOTE {
            return Err(IrError::InvalidCell { row, channel, reason: "note out of range" });
        }
        if self.instrument as usize > INSTRUMENT_COUNT {
            return Err(IrError::InvalidCell { row, channel, reason: "instrument out of range" });
        }
        Ok(())
    }
}

/// A pattern of 64 rows across the four channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    /// Pattern data, stored row-major: data[row * channels + channel]
    pub data: Vec<Cell>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern {
    /// Create a new pattern with empty cells.
    pub fn new() -> Self {
        Self {
            data: alloc::vec![Cell::empty(); PATTERN_ROWS as usize * CHANNEL_COUNT],
        }
    }

    /// Get a reference to a cell.
    pub fn cell(&self, row: u16, channel: u8) -> &Cell {
        debug_assert!(row < PATTERN_ROWS);
        debug_assert!((channel as usize) < CHANNEL_COUNT);
        &self.data[row as usize * CHANNEL_COUNT + channel as usize]
    }

    /// Get a mutable reference to a cell.
    pub fn cell_mut(&mut self, row: u16, channel: u8) -> &mut Cell {
        debug_assert!(row < PATTERN_ROWS);
        debug_assert!((channel as usize) < CHANNEL_COUNT);
        &mut self.data[row as usize * CHANNEL_COUNT + channel as usize]
    }

    /// Iterate over all cells in a row.
    pub fn row(&self, row: u16) -> &[Cell] {
        let start = row as usize * CHANNEL_COUNT;
        &self.data[start..start + CHANNEL_COUNT]
    }

    /// Iterate over the cells of one channel, top to bottom.
    pub fn channel(&self, channel: u8) -> impl Iterator<Item = &Cell> + '_ {
        self.data.iter().skip(channel as usize).step_by(CHANNEL_COUNT)
    }

    /// Returns true if no cell plays or selects anything.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(Cell::is_empty)
    }

    /// Check the grid size and every cell.
    pub fn validate(&self) -> Result<(), IrError> {
        if self.data.len() != PATTERN_ROWS as usize * CHANNEL_COUNT {
            return Err(IrError::InvalidCell { row: 0, channel: 0, reason: "pattern has wrong size" });
        }
        for (i, cell) in self.data.iter().enumerate() {
            cell.validate((i / CHANNEL_COUNT) as u16, (i % CHANNEL_COUNT) as u8)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_cell_access() {
        let mut pattern = Pattern::new();
        pattern.cell_mut(10, 2).note = 49;

        assert_eq!(pattern.cell(10, 2).note, 49);
        assert_eq!(pattern.cell(10, 1).note, 0);
        assert_eq!(pattern.row(10)[2].note, 49);
    }

    #[test]
    fn channel_walks_one_column() {
        let mut pattern = Pattern::new();
        pattern.cell_mut(0, 3).instrument = 1;
        pattern.cell_mut(63, 3).instrument = 2;
        let column: Vec<u8> = pattern.channel(3).map(|c| c.instrument).collect();
        assert_eq!(column.len(), PATTERN_ROWS as usize);
        assert_eq!(column[0], 1);
        assert_eq!(column[63], 2);
        assert!(pattern.channel(2).all(Cell::is_empty));
    }

    #[test]
    fn validate_flags_bad_cell() {
        let mut pattern = Pattern::new();
        assert!(pattern.is_empty());
        pattern.cell_mut(5, 1).instrument = 16;
        assert_eq!(
            pattern.validate(),
            Err(IrError::InvalidCell { row: 5, channel: 1, reason: "instrument out of range" })
        );
    }
}
