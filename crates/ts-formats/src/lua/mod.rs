//! Lua code generation for the console runtime.

mod instrument;
mod player;
mod song;

pub use instrument::{
    emit_instrument, HarmonicTerm, InstrumentCode, Modifier, SampleCode, WaveBody,
};
pub use player::PLAYER_CODE;
pub use song::{emit_song, SongCode};
