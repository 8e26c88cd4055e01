//! Per-frame synthesis parameters.

/// Number of entries in a waveform table.
pub const WAVEFORM_LEN: usize = 32;

/// Number of sound chip channels.
pub const CHANNEL_COUNT: usize = 4;

/// Frames (ticks) per second.
pub const FRAME_RATE: u32 = 60;

/// Lowest frequency the chip can represent (Hz).
pub const FREQUENCY_MIN: f64 = 1.0;

/// Highest frequency the chip can represent (12-bit register).
pub const FREQUENCY_MAX: f64 = 4095.0;

/// Highest channel volume (4-bit register).
pub const VOLUME_MAX: u8 = 15;

/// A 32-step table of 4-bit amplitudes.
pub type Waveform = [u8; WAVEFORM_LEN];

/// One tick's worth of frame data for every channel. `None` = silent.
pub type ChannelFrames = [Option<FrameData>; CHANNEL_COUNT];

/// Half-high, half-low square table. Used as the initial channel waveform
/// and for the silent frame returned once a sample has ended.
pub const SILENT_WAVEFORM: Waveform = [
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Chip-visible parameters for one channel during one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameData {
    /// Frequency in Hz, integer-valued and within [1, 4095]
    pub frequency: f32,
    /// Volume, integer-valued and within [0, 15]
    pub volume: f32,
    /// Waveform table; all zeros selects the noise generator
    pub waveform: Waveform,
}

impl FrameData {
    /// The frame produced once a one-shot sample has finished.
    pub const fn silent() -> Self {
        Self {
            frequency: 440.0,
            volume: 0.0,
            waveform: SILENT_WAVEFORM,
        }
    }

    /// Returns true if the waveform is the all-zero noise sentinel.
    pub fn is_noise(&self) -> bool {
        is_noise_waveform(&self.waveform)
    }
}

/// Returns true if every entry of the table is zero.
pub fn is_noise_waveform(waveform: &Waveform) -> bool {
    waveform.iter().all(|&v| v == 0)
}
