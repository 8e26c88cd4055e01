//! Export and document formats for the ticsynth chiptune engine.
//!
//! Compiles instruments and songs to Lua for the console runtime, reads
//! instrument and song documents from JSON, and writes rendered audio
//! as WAV.

pub mod document;
pub mod lua;
mod wav_format;

use thiserror::Error;
use ts_ir::IrError;

pub use document::{instrument_from_json, song_from_json};
pub use lua::{emit_instrument, emit_song, InstrumentCode, SongCode, PLAYER_CODE};
pub use wav_format::{samples_to_wav, write_wav, DEFAULT_GAIN};

/// Error type for code emission.
#[derive(Debug, Error, PartialEq)]
pub enum EmitError {
    /// Raw wave type code outside 1-5
    #[error("unknown wave type code {0}")]
    InvalidWaveType(u8),
    /// Instrument or song failed validation
    #[error(transparent)]
    Invalid(IrError),
}

impl From<IrError> for EmitError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::InvalidWaveType(code) => EmitError::InvalidWaveType(code),
            other => EmitError::Invalid(other),
        }
    }
}

/// Error type for reading documents.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed JSON or wrong field types
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed document with out-of-range values
    #[error(transparent)]
    Invalid(#[from] IrError),
    /// Wave type name not recognised
    #[error("unknown wave type {0:?}")]
    UnknownWaveType(String),
    /// Note name not recognised
    #[error("unknown note {0:?}")]
    UnknownNote(String),
    /// Structural problem, e.g. too many rows
    #[error("invalid document: {0}")]
    Document(String),
    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
