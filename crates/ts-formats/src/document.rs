//! JSON instrument and song documents.
//!
//! Field names are camelCase. Every field is optional and falls back to
//! the default instrument or song; everything read is validated before it
//! is returned.

use std::collections::BTreeMap;

use serde::Deserialize;
use ts_ir::{
    parse_note, waveform_from_letters, Cell, Instrument, InstrumentParam, IrError, SampleTable,
    Song, WaveType, Waveform, CHANNEL_COUNT, HARMONIC_COUNT, PATTERN_ROWS, POSITION_COUNT,
};

use crate::FormatError;

/// Wave type given by name (`"square"`) or numeric code (`1`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WaveTypeDoc {
    Code(u8),
    Name(String),
}

impl WaveTypeDoc {
    fn resolve(&self) -> Result<WaveType, FormatError> {
        match self {
            WaveTypeDoc::Code(code) => Ok(WaveType::try_from(*code)?),
            WaveTypeDoc::Name(name) => WaveType::ALL
                .into_iter()
                .find(|w| w.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| FormatError::UnknownWaveType(name.clone())),
        }
    }
}

/// Waveform given as 32 letters `A`..`P` or 32 numbers 0-15.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WaveformDoc {
    Letters(String),
    Values(Vec<u8>),
}

impl WaveformDoc {
    fn resolve(&self) -> Result<Waveform, IrError> {
        match self {
            WaveformDoc::Letters(letters) => waveform_from_letters(letters),
            WaveformDoc::Values(values) => {
                let waveform: Waveform = values
                    .as_slice()
                    .try_into()
                    .map_err(|_| IrError::WaveformLength(values.len()))?;
                match waveform.iter().find(|&&v| v > 15) {
                    Some(&v) => Err(IrError::WaveformValue(v)),
                    None => Ok(waveform),
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SampleDoc {
    pub waveforms: Vec<WaveformDoc>,
    pub volumes: Vec<u8>,
    pub frequencies: Vec<f64>,
    pub repeat_from: u32,
    pub repeat_length: u32,
    pub base_note: Option<u8>,
}

impl SampleDoc {
    fn resolve(&self) -> Result<SampleTable, FormatError> {
        let waveforms = self
            .waveforms
            .iter()
            .map(WaveformDoc::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let table = SampleTable {
            waveforms,
            volumes: self.volumes.clone(),
            frequencies: self.frequencies.clone(),
            repeat_from: self.repeat_from,
            repeat_length: self.repeat_length,
            base_note: self.base_note.unwrap_or(33),
        };
        table.validate()?;
        Ok(table)
    }
}

/// An instrument document. Numeric fields are taken as JSON numbers and
/// checked against the parameter ranges, so `2.5` for `transpose` is an
/// error rather than a silent truncation.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InstrumentDoc {
    pub name: Option<String>,
    pub wave_type: Option<WaveTypeDoc>,
    pub transpose: Option<f64>,
    pub slide_step: Option<f64>,
    pub initial_volume: Option<f64>,
    pub decay_to: Option<f64>,
    pub decay_speed: Option<f64>,
    pub phase_min: Option<f64>,
    pub phase_max: Option<f64>,
    pub phase_period: Option<f64>,
    pub vibrato_depth: Option<f64>,
    pub vibrato_period: Option<f64>,
    pub harmonics: Option<Vec<f64>>,
    pub sample: Option<SampleDoc>,
}

impl InstrumentDoc {
    /// Build a validated instrument.
    pub fn resolve(&self) -> Result<Instrument, FormatError> {
        let mut inst = Instrument::new(self.name.as_deref().unwrap_or(""));
        if let Some(wave_type) = &self.wave_type {
            inst.wave_type = wave_type.resolve()?;
        }

        let scalars = [
            (InstrumentParam::Transpose, self.transpose),
            (InstrumentParam::SlideStep, self.slide_step),
            (InstrumentParam::InitialVolume, self.initial_volume),
            (InstrumentParam::DecayTo, self.decay_to),
            (InstrumentParam::DecaySpeed, self.decay_speed),
            (InstrumentParam::PhaseMin, self.phase_min),
            (InstrumentParam::PhaseMax, self.phase_max),
            (InstrumentParam::PhasePeriod, self.phase_period),
            (InstrumentParam::VibratoDepth, self.vibrato_depth),
            (InstrumentParam::VibratoPeriod, self.vibrato_period),
        ];
        for (param, value) in scalars {
            if let Some(value) = value {
                inst.set(param, value)?;
            }
        }

        if let Some(harmonics) = &self.harmonics {
            if harmonics.len() > HARMONIC_COUNT {
                return Err(FormatError::Document(format!(
                    "{} harmonics given, at most {HARMONIC_COUNT} allowed",
                    harmonics.len()
                )));
            }
            inst.harmonics = [0.0; HARMONIC_COUNT];
            for (h, &weight) in harmonics.iter().enumerate() {
                inst.set(InstrumentParam::Harmonic(h as u8), weight)?;
            }
        }

        if let Some(sample) = &self.sample {
            inst.sample = sample.resolve()?;
        }

        inst.validate()?;
        Ok(inst)
    }
}

/// Note given as a number (0 = none) or a tracker name (`"C-4"`, `"---"`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NoteDoc {
    Number(u8),
    Name(String),
}

impl NoteDoc {
    fn resolve(&self) -> Result<u8, FormatError> {
        match self {
            NoteDoc::Number(n) => Ok(*n),
            NoteDoc::Name(name) if name.is_empty() || name == "---" => Ok(0),
            NoteDoc::Name(name) => {
                parse_note(name).ok_or_else(|| FormatError::UnknownNote(name.clone()))
            }
        }
    }
}

/// A pattern cell: `[note, instrument]`, `[note]` or `null`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CellDoc {
    Full(NoteDoc, u8),
    Note((NoteDoc,)),
    Empty(()),
}

impl CellDoc {
    fn resolve(&self) -> Result<Cell, FormatError> {
        Ok(match self {
            CellDoc::Full(note, instrument) => Cell { note: note.resolve()?, instrument: *instrument },
            CellDoc::Note((note,)) => Cell { note: note.resolve()?, instrument: 0 },
            CellDoc::Empty(()) => Cell::empty(),
        })
    }
}

/// A song document. `instruments` is keyed by slot (1-15) and `patterns`
/// by pattern number (0-63); each pattern is a list of rows, each row a
/// list of up to four cells.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SongDoc {
    pub title: Option<String>,
    pub instruments: BTreeMap<u8, InstrumentDoc>,
    pub patterns: BTreeMap<u8, Vec<Vec<CellDoc>>>,
    pub positions: Vec<u8>,
    pub speed: Option<u8>,
    pub length: Option<u16>,
}

impl SongDoc {
    /// Build a validated song. A missing `length` plays every listed position.
    pub fn resolve(&self) -> Result<Song, FormatError> {
        let mut song = Song::new(self.title.as_deref().unwrap_or(""));

        for (&slot, doc) in &self.instruments {
            *song.instrument_mut(slot)? = doc.resolve()?;
        }

        for (&index, rows) in &self.patterns {
            if rows.len() > PATTERN_ROWS as usize {
                return Err(FormatError::Document(format!(
                    "pattern {index} has {} rows, at most {PATTERN_ROWS} allowed",
                    rows.len()
                )));
            }
            let pattern = song.pattern_mut(index)?;
            for (row, cells) in rows.iter().enumerate() {
                if cells.len() > CHANNEL_COUNT {
                    return Err(FormatError::Document(format!(
                        "pattern {index} row {row} has {} cells, at most {CHANNEL_COUNT} allowed",
                        cells.len()
                    )));
                }
                for (channel, cell) in cells.iter().enumerate() {
                    *pattern.cell_mut(row as u16, channel as u8) = cell.resolve()?;
                }
            }
        }

        if self.positions.len() > POSITION_COUNT {
            return Err(FormatError::Document(format!(
                "{} positions given, at most {POSITION_COUNT} allowed",
                self.positions.len()
            )));
        }
        song.positions[..self.positions.len()].copy_from_slice(&self.positions);

        if let Some(speed) = self.speed {
            song.speed = speed;
        }
        song.length = match self.length {
            Some(length) => length,
            None => self.positions.len().max(1) as u16,
        };

        song.validate()?;
        Ok(song)
    }
}

/// Parse and validate an instrument document.
pub fn instrument_from_json(json: &str) -> Result<Instrument, FormatError> {
    let doc: InstrumentDoc = serde_json::from_str(json)?;
    doc.resolve()
}

/// Parse and validate a song document.
pub fn song_from_json(json: &str) -> Result<Song, FormatError> {
    let doc: SongDoc = serde_json::from_str(json)?;
    let song = doc.resolve()?;
    tracing::debug!(
        title = %song.title,
        instruments = doc.instruments.len(),
        patterns = doc.patterns.len(),
        "loaded song document"
    );
    Ok(song)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_ir::WAVEFORM_LEN;

    #[test]
    fn empty_document_is_default_instrument() {
        assert_eq!(instrument_from_json("{}").unwrap(), Instrument::default());
    }

    #[test]
    fn full_instrument_document() {
        let inst = instrument_from_json(
            r#"{
                "name": "pad",
                "waveType": "triangle",
                "transpose": -12,
                "slideStep": 4,
                "initialVolume": 12,
                "decayTo": 3,
                "decaySpeed": 2,
                "phaseMin": 8,
                "phaseMax": 24,
                "phasePeriod": 60,
                "vibratoDepth": 3,
                "vibratoPeriod": 10,
                "harmonics": [1, 0.5]
            }"#,
        )
        .unwrap();
        assert_eq!(inst.name.as_str(), "pad");
        assert_eq!(inst.wave_type, WaveType::Triangle);
        assert_eq!(inst.transpose, -12);
        assert_eq!(inst.slide_step, 4);
        assert_eq!(inst.initial_volume, 12);
        assert_eq!(inst.decay_to, 3);
        assert_eq!(inst.phase_period, 60);
        assert_eq!(inst.vibrato_period, 10);
        assert_eq!(inst.harmonics, [1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn wave_type_by_code_or_name() {
        assert_eq!(instrument_from_json(r#"{"waveType": 4}"#).unwrap().wave_type, WaveType::Noise);
        assert_eq!(instrument_from_json(r#"{"waveType": "Sine"}"#).unwrap().wave_type, WaveType::Sine);
        assert!(matches!(
            instrument_from_json(r#"{"waveType": "saw"}"#),
            Err(FormatError::UnknownWaveType(name)) if name == "saw"
        ));
        assert!(matches!(
            instrument_from_json(r#"{"waveType": 0}"#),
            Err(FormatError::Invalid(IrError::InvalidWaveType(0)))
        ));
    }

    #[test]
    fn out_of_range_and_fractional_values_are_rejected() {
        assert!(matches!(
            instrument_from_json(r#"{"decayTo": 16}"#),
            Err(FormatError::Invalid(IrError::InvalidParameter { param: "decayTo", .. }))
        ));
        assert!(matches!(
            instrument_from_json(r#"{"transpose": 2.5}"#),
            Err(FormatError::Invalid(IrError::InvalidParameter { param: "transpose", .. }))
        ));
        assert!(matches!(
            instrument_from_json(r#"{"harmonics": [1,0,0,0,0,0,0,0,0]}"#),
            Err(FormatError::Document(_))
        ));
        assert!(matches!(
            instrument_from_json(r#"{"volume": 3}"#),
            Err(FormatError::Json(_))
        ));
    }

    #[test]
    fn sample_waveforms_as_letters_or_numbers() {
        let inst = instrument_from_json(
            r#"{
                "waveType": 5,
                "sample": {
                    "waveforms": ["PPPPPPPPPPPPPPPPAAAAAAAAAAAAAAAA", [1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1]],
                    "volumes": [15, 10],
                    "frequencies": [440, 441.5],
                    "repeatFrom": 1,
                    "repeatLength": 1,
                    "baseNote": 27
                }
            }"#,
        )
        .unwrap();
        assert_eq!(inst.sample.waveforms[0][0], 15);
        assert_eq!(inst.sample.waveforms[1], [1; WAVEFORM_LEN]);
        assert!(inst.sample.is_looped());
        assert_eq!(inst.sample.base_note, 27);
    }

    #[test]
    fn bad_sample_tables_are_rejected() {
        assert!(matches!(
            instrument_from_json(r#"{"sample": {"waveforms": ["ABC"], "volumes": [1], "frequencies": [1]}}"#),
            Err(FormatError::Invalid(IrError::WaveformLength(3)))
        ));
        assert!(matches!(
            instrument_from_json(r#"{"sample": {"volumes": [1], "frequencies": [1]}}"#),
            Err(FormatError::Invalid(IrError::SampleTable(_)))
        ));
    }

    #[test]
    fn song_document() {
        let song = song_from_json(
            r#"{
                "title": "tune",
                "instruments": {"2": {"waveType": "sine"}},
                "patterns": {
                    "3": [
                        [["C-4", 2], null, [37], ["---", 0]],
                        [],
                        [null, [46, 2]]
                    ]
                },
                "positions": [3, 0, 3],
                "speed": 4
            }"#,
        )
        .unwrap();
        assert_eq!(song.title.as_str(), "tune");
        assert_eq!(song.instrument(2).unwrap().wave_type, WaveType::Sine);
        assert_eq!(*song.patterns[3].cell(0, 0), Cell { note: parse_note("C-4").unwrap(), instrument: 2 });
        assert_eq!(*song.patterns[3].cell(0, 2), Cell { note: 37, instrument: 0 });
        assert_eq!(*song.patterns[3].cell(2, 1), Cell { note: 46, instrument: 2 });
        assert_eq!(song.active_positions(), &[3, 0, 3]);
        assert_eq!(song.speed, 4);
    }

    #[test]
    fn song_document_errors() {
        assert!(matches!(
            song_from_json(r#"{"instruments": {"16": {}}}"#),
            Err(FormatError::Invalid(IrError::InvalidSlot(16)))
        ));
        assert!(matches!(
            song_from_json(r#"{"patterns": {"0": [[["H-4", 1]]]}}"#),
            Err(FormatError::UnknownNote(_))
        ));
        assert!(matches!(
            song_from_json(r#"{"patterns": {"0": [[null, null, null, null, null]]}}"#),
            Err(FormatError::Document(_))
        ));
        assert!(matches!(
            song_from_json(r#"{"positions": [64]}"#),
            Err(FormatError::Invalid(IrError::InvalidPosition { index: 0, value: 64 }))
        ));
        assert!(matches!(
            song_from_json(r#"{"speed": 0}"#),
            Err(FormatError::Invalid(IrError::InvalidParameter { param: "speed", .. }))
        ));
    }
}
