//! Core IR types for the ticsynth chiptune engine.
//!
//! This crate defines the instrument model, the per-frame data it
//! produces, and the song structure that sequences instruments. The
//! synthesizer consumes `FrameData`, and the code emitter compiles
//! `Instrument` parameters.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod analysis;
mod edit;
mod error;
mod eval;
mod frame;
mod instrument;
mod note;
mod pattern;
mod sample;
pub mod shaper;
pub mod song;

pub use analysis::SongUsage;
pub use edit::Edit;
pub use error::IrError;
pub use eval::{round_half_up, transpose_factor, FrameEvaluator};
pub use frame::{
    is_noise_waveform, ChannelFrames, FrameData, Waveform, CHANNEL_COUNT, FRAME_RATE,
    FREQUENCY_MAX, FREQUENCY_MIN, SILENT_WAVEFORM, VOLUME_MAX, WAVEFORM_LEN,
};
pub use instrument::{Instrument, InstrumentParam, WaveType, HARMONIC_COUNT};
pub use note::{note_frequency, note_name, parse_note, MAX_NOTE, NOTE_NAMES};
pub use pattern::{Cell, Pattern, PATTERN_ROWS};
pub use sample::{waveform_from_letters, waveform_to_letters, SampleTable};
pub use song::{Song, INSTRUMENT_COUNT, PATTERN_COUNT, POSITION_COUNT};
