//! Playback engine for the ticsynth chiptune engine.
//!
//! Turns per-frame channel parameters into audio-rate samples the way the
//! sound chip does, and provides the frame sources that drive it: a single
//! instrument preview and a song sequencer.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod player;
mod preview;
mod source;
mod synth;

pub use channel::{ChannelState, NOISE_ELEMENT_STRETCH};
pub use player::{PlayerChannel, SongFrames, SongPlayer};
pub use preview::NotePreview;
pub use source::FrameSource;
pub use synth::{FrameSynthesizer, DEFAULT_NOISE_SEED};
