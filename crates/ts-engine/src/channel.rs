//! Per-channel synthesis state.

use rand::Rng;
use ts_ir::{is_noise_waveform, FrameData, Waveform, SILENT_WAVEFORM, WAVEFORM_LEN};

/// Noise levels are picked half as often as waveform steps at the same
/// frequency. Empirical, matched against the chip by ear.
pub const NOISE_ELEMENT_STRETCH: f64 = 2.0;

/// Mixing state for a single chip channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelState {
    /// Waveform adopted from the last frame
    pub waveform: Waveform,
    /// Current volume (0-15)
    pub volume: f32,
    /// Is the waveform the all-zero noise sentinel?
    pub is_noise: bool,
    /// Output samples per waveform step
    pub samples_per_waveform_element: f64,
    /// Countdown to the next waveform step
    pub samples_to_next_waveform_element: f64,
    /// Next waveform entry to read (0-31)
    pub waveform_ptr: usize,
    /// Level currently held (0-15)
    pub level: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelState {
    /// A silent channel holding the half-high square.
    pub const fn new() -> Self {
        Self {
            waveform: SILENT_WAVEFORM,
            volume: 0.0,
            is_noise: false,
            samples_per_waveform_element: 0.0,
            samples_to_next_waveform_element: 0.0,
            waveform_ptr: 0,
            level: 0,
        }
    }

    /// Adopt a frame's parameters. `None` mutes the channel and keeps the
    /// waveform so the scope still shows the last shape.
    pub fn load(&mut self, frame: Option<&FrameData>, sample_rate: f64) {
        let Some(frame) = frame else {
            self.volume = 0.0;
            return;
        };
        self.waveform = frame.waveform;
        self.is_noise = is_noise_waveform(&frame.waveform);
        self.volume = frame.volume;
        let frequency = libm::floor(frame.frequency as f64).max(1.0);
        self.samples_per_waveform_element = sample_rate / frequency / WAVEFORM_LEN as f64;
        if self.is_noise {
            self.samples_per_waveform_element *= NOISE_ELEMENT_STRETCH;
        }
    }

    /// Advance by one output sample and return the channel's contribution.
    ///
    /// At most one waveform element is consumed per sample, so tones above
    /// `sample_rate / 32` Hz step through the table at the sample rate.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> f32 {
        if self.samples_to_next_waveform_element <= 0.0 {
            self.level = if self.is_noise {
                if rng.gen_bool(0.5) { 15 } else { 0 }
            } else {
                self.waveform[self.waveform_ptr]
            };
            self.waveform_ptr = (self.waveform_ptr + 1) % WAVEFORM_LEN;
            self.samples_to_next_waveform_element += self.samples_per_waveform_element;
        }
        self.samples_to_next_waveform_element -= 1.0;
        self.output()
    }

    /// Current contribution to the mix, in [-1, 1].
    pub fn output(&self) -> f32 {
        (self.level as f32 - 7.5) / 7.5 * (self.volume / 15.0)
    }
}
