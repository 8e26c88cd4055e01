//! Song usage analysis: which patterns and instruments a song actually plays.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use crate::pattern::Cell;
use crate::song::Song;

/// Patterns and instruments reachable from the played positions, with the
/// compact 1-based numbering used on export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongUsage {
    /// Used pattern numbers in order of first appearance
    pub patterns: Vec<u8>,
    /// Used instrument slots, ascending
    pub instruments: Vec<u8>,
    /// Lowest and highest note played
    pub note_range: Option<(u8, u8)>,
    /// Number of note cells in used patterns
    pub total_notes: usize,
    pattern_map: BTreeMap<u8, u8>,
    instrument_map: BTreeMap<u8, u8>,
}

impl SongUsage {
    /// Scan the played positions of a song.
    pub fn scan(song: &Song) -> Self {
        let mut usage = SongUsage::default();

        for &pattern in song.active_positions() {
            if !usage.pattern_map.contains_key(&pattern) {
                usage.patterns.push(pattern);
                usage.pattern_map.insert(pattern, usage.patterns.len() as u8);
            }
        }

        let mut slots = BTreeSet::new();
        for &index in &usage.patterns {
            let Some(pattern) = song.patterns.get(index as usize) else {
                continue;
            };
            for cell in &pattern.data {
                if cell.instrument > 0 {
                    slots.insert(cell.instrument);
                }
                if cell.note > 0 {
                    usage.total_notes += 1;
                    usage.note_range = Some(match usage.note_range {
                        Some((lo, hi)) => (lo.min(cell.note), hi.max(cell.note)),
                        None => (cell.note, cell.note),
                    });
                }
            }
        }

        usage.instruments = slots.into_iter().collect();
        for (i, &slot) in usage.instruments.iter().enumerate() {
            usage.instrument_map.insert(slot, i as u8 + 1);
        }
        usage
    }

    /// Export number (1-based) of a pattern.
    pub fn pattern_index(&self, pattern: u8) -> Option<u8> {
        self.pattern_map.get(&pattern).copied()
    }

    /// Export number (1-based) of an instrument slot.
    pub fn instrument_index(&self, slot: u8) -> Option<u8> {
        self.instrument_map.get(&slot).copied()
    }

    /// The played positions, renumbered.
    pub fn remap_positions(&self, song: &Song) -> Vec<u8> {
        song.active_positions()
            .iter()
            .filter_map(|&p| self.pattern_index(p))
            .collect()
    }

    /// A cell with its instrument renumbered. Instrument 0 stays 0.
    pub fn remap_cell(&self, cell: Cell) -> Cell {
        Cell {
            note: cell.note,
            instrument: self.instrument_index(cell.instrument).unwrap_or(0),
        }
    }
}

impl fmt::Display for SongUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Notes:    {} total", self.total_notes)?;
        if let Some((lo, hi)) = self.note_range {
            writeln!(f, "Range:    {} - {}", lo, hi)?;
        }
        writeln!(f, "Patterns: {} used {:?}", self.patterns.len(), self.patterns)?;
        writeln!(f, "Instruments: {} used {:?}", self.instruments.len(), self.instruments)
    }
}
