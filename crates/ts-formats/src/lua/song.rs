//! Song export: compacted instrument, pattern and position tables plus
//! the player routine.

use std::fmt::{self, Write};

use ts_ir::{Pattern, Song, SongUsage, CHANNEL_COUNT};

use super::instrument::InstrumentCode;
use super::player::PLAYER_CODE;
use crate::EmitError;

/// A song compiled for export. Only patterns reachable from the played
/// positions and instruments used in those patterns are kept, renumbered
/// from 1.
#[derive(Clone, Debug, PartialEq)]
pub struct SongCode {
    /// Compiled instruments in export order
    pub instruments: Vec<InstrumentCode>,
    /// Used patterns in export order, with cell instruments renumbered
    pub patterns: Vec<Pattern>,
    /// Played positions, renumbered
    pub positions: Vec<u8>,
    /// Frames per row
    pub speed: u8,
}

impl SongCode {
    pub fn compile(song: &Song) -> Result<Self, EmitError> {
        song.validate()?;
        let usage = SongUsage::scan(song);

        let instruments = usage
            .instruments
            .iter()
            .map(|&slot| InstrumentCode::compile(song.instrument(slot)?))
            .collect::<Result<Vec<_>, _>>()?;

        let mut patterns = Vec::with_capacity(usage.patterns.len());
        for &index in &usage.patterns {
            let mut pattern = song.pattern(index)?.clone();
            for cell in &mut pattern.data {
                *cell = usage.remap_cell(*cell);
            }
            patterns.push(pattern);
        }

        Ok(Self {
            instruments,
            patterns,
            positions: usage.remap_positions(song),
            speed: song.speed,
        })
    }

    /// The complete Lua program.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn write_pattern(out: &mut impl Write, pattern: &Pattern) -> fmt::Result {
    out.write_char('{')?;
    for channel in 0..CHANNEL_COUNT as u8 {
        if channel > 0 {
            out.write_char(',')?;
        }
        out.write_char('{')?;
        for (row, cell) in pattern.channel(channel).enumerate() {
            if row > 0 {
                out.write_char(',')?;
            }
            write!(out, "{{{},{}}}", cell.note, cell.instrument)?;
        }
        out.write_char('}')?;
    }
    out.write_char('}')
}

impl fmt::Display for SongCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "instruments={{")?;
        for (i, instrument) in self.instruments.iter().enumerate() {
            let separator = if i + 1 < self.instruments.len() { "," } else { "" };
            writeln!(f, "{instrument}{separator}")?;
        }
        writeln!(f, "}}")?;

        writeln!(f, "patterns={{")?;
        for (i, pattern) in self.patterns.iter().enumerate() {
            write_pattern(f, pattern)?;
            writeln!(f, "{}", if i + 1 < self.patterns.len() { "," } else { "" })?;
        }
        writeln!(f, "}}")?;

        let positions: Vec<String> = self.positions.iter().map(|p| p.to_string()).collect();
        writeln!(f, "positions={{{}}}", positions.join(","))?;
        writeln!(f, "song_speed={}", self.speed)?;
        writeln!(f)?;
        f.write_str(PLAYER_CODE)
    }
}

/// Compile a song straight to a Lua program.
pub fn emit_song(song: &Song) -> Result<String, EmitError> {
    let code = SongCode::compile(song)?;
    tracing::debug!(
        instruments = code.instruments.len(),
        patterns = code.patterns.len(),
        positions = code.positions.len(),
        "compiled song"
    );
    Ok(code.render())
}
