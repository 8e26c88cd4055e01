//! Frame evaluation: instrument parameters to chip-visible frame data.

use core::f64::consts::PI;

use crate::frame::{FrameData, FREQUENCY_MAX, FREQUENCY_MIN, WAVEFORM_LEN};
use crate::instrument::{Instrument, WaveType};
use crate::shaper;

/// Round to nearest with halves going up, the rounding the chip code uses
/// (`(x+0.5)//1`).
pub fn round_half_up(x: f64) -> f64 {
    libm::floor(x + 0.5)
}

/// Frequency multiplier for a transpose in semitones.
pub fn transpose_factor(transpose: i8) -> f64 {
    libm::pow(2.0, transpose as f64 / 12.0)
}

fn chip_frequency(frequency: f64) -> f32 {
    round_half_up(frequency).clamp(FREQUENCY_MIN, FREQUENCY_MAX) as f32
}

impl Instrument {
    /// Frame data at `frame` ticks after note-on, for a note at `base_frequency` Hz.
    pub fn frame_at(&self, frame: u32, base_frequency: f64) -> FrameData {
        if self.wave_type == WaveType::Sample {
            return self.sample_frame_at(frame, base_frequency);
        }

        let waveform = shaper::shape(self.wave_type, self.phase_at(frame), &self.harmonics)
            .unwrap_or([0; WAVEFORM_LEN]);

        FrameData {
            frequency: chip_frequency(self.frequency_at(frame, base_frequency)),
            volume: round_half_up(self.volume_at(frame)) as f32,
            waveform,
        }
    }

    /// A value that evaluates this instrument at a fixed base frequency.
    pub fn evaluator(&self, base_frequency: f64) -> FrameEvaluator<'_> {
        FrameEvaluator { instrument: self, base_frequency }
    }

    /// Carrier frequency after transpose.
    pub fn carrier_frequency(&self, base_frequency: f64) -> f64 {
        base_frequency * transpose_factor(self.transpose)
    }

    /// Phase split point at `frame`. A zero period freezes the phase at its
    /// starting value, `phase_min`.
    pub fn phase_at(&self, frame: u32) -> f64 {
        let min = self.phase_min as f64;
        let max = self.phase_max as f64;
        if self.phase_period == 0 {
            return min;
        }
        let centre = (min + max) / 2.0;
        let amplitude = (max - min) / 2.0;
        centre - amplitude * libm::cos(frame as f64 * 2.0 * PI / self.phase_period as f64)
    }

    /// Unrounded frequency at `frame` (carrier, vibrato and slide).
    pub fn frequency_at(&self, frame: u32, base_frequency: f64) -> f64 {
        let t = frame as f64;
        let vibrato = if self.vibrato_period == 0 {
            0.0
        } else {
            self.vibrato_depth as f64 * libm::sin(t * 2.0 * PI / self.vibrato_period as f64)
        };
        self.carrier_frequency(base_frequency) + vibrato + t * (self.slide_step as f64 / 16.0)
    }

    /// Unrounded volume at `frame`. The decay heads from `initial_volume`
    /// towards `decay_to` in whichever direction that is.
    pub fn volume_at(&self, frame: u32) -> f64 {
        let from = self.initial_volume as f64;
        let to = self.decay_to as f64;
        let delta = frame as f64 * (self.decay_speed as f64 / 16.0);
        if from >= to {
            (from - delta).max(to)
        } else {
            (from + delta).min(to)
        }
    }

    fn sample_frame_at(&self, frame: u32, base_frequency: f64) -> FrameData {
        let table = &self.sample;
        let Some(index) = table.index_at(frame) else {
            return FrameData::silent();
        };
        let frequency = table.frequencies[index] * base_frequency / table.base_frequency();
        FrameData {
            frequency: chip_frequency(frequency),
            volume: table.volumes[index] as f32,
            waveform: table.waveforms[index],
        }
    }
}

/// An instrument bound to a note frequency, evaluated frame by frame.
///
/// Borrows the live instrument, so edits are always visible to the next
/// evaluation.
#[derive(Clone, Copy, Debug)]
pub struct FrameEvaluator<'a> {
    instrument: &'a Instrument,
    base_frequency: f64,
}

impl FrameEvaluator<'_> {
    pub fn evaluate(&self, frame: u32) -> FrameData {
        self.instrument.frame_at(frame, self.base_frequency)
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SILENT_WAVEFORM;
    use crate::sample::SampleTable;
    use alloc::vec;
    use alloc::vec::Vec;

    fn shaped_types() -> [WaveType; 4] {
        [WaveType::Square, WaveType::Triangle, WaveType::Sine, WaveType::Noise]
    }

    #[test]
    fn waveform_stays_in_range_for_every_frame() {
        let mut inst = Instrument::default();
        inst.harmonics = [1.0, 0.7, 0.5, 0.3, 1.0, 0.2, 0.9, 0.4];
        inst.phase_min = 0;
        inst.phase_max = 32;
        inst.phase_period = 7;
        for wave_type in shaped_types() {
            inst.wave_type = wave_type;
            for frame in 0..200 {
                let data = inst.frame_at(frame, 440.0);
                assert!(data.waveform.iter().all(|&v| v <= 15), "{:?} frame {}", wave_type, frame);
            }
        }
    }

    #[test]
    fn frequency_is_integral_and_clamped() {
        let mut inst = Instrument::default();
        inst.vibrato_depth = 256;
        inst.vibrato_period = 5;
        inst.slide_step = -256;
        for frame in 0..400 {
            let f = inst.frame_at(frame, 261.63).frequency;
            assert!((1.0..=4095.0).contains(&f), "frame {} frequency {}", frame, f);
            assert_eq!(f, f.trunc());
        }
        inst.slide_step = 256;
        inst.transpose = 24;
        let f = inst.frame_at(1000, 3000.0).frequency;
        assert_eq!(f, 4095.0);
    }

    #[test]
    fn square_at_frame_zero_bisects() {
        let inst = Instrument::default();
        let data = inst.frame_at(0, 440.0);
        let expected: Vec<u8> = [vec![15; 16], vec![0; 16]].concat();
        assert_eq!(data.waveform.to_vec(), expected);
        assert_eq!(data.frequency, 440.0);
        assert_eq!(data.volume, 15.0);
    }

    #[test]
    fn decay_is_one_step_per_frame() {
        let inst = Instrument::default();
        let mut previous = f32::MAX;
        for frame in 0..40u32 {
            let volume = inst.frame_at(frame, 440.0).volume;
            assert_eq!(volume, 15u32.saturating_sub(frame) as f32);
            assert!(volume <= previous);
            previous = volume;
        }
    }

    #[test]
    fn decay_rises_when_target_is_louder() {
        let mut inst = Instrument::default();
        inst.initial_volume = 2;
        inst.decay_to = 12;
        inst.decay_speed = 32;
        assert_eq!(inst.frame_at(0, 440.0).volume, 2.0);
        assert_eq!(inst.frame_at(3, 440.0).volume, 8.0);
        assert_eq!(inst.frame_at(10, 440.0).volume, 12.0);
    }

    #[test]
    fn zero_decay_speed_holds_initial_volume() {
        let mut inst = Instrument::default();
        inst.decay_speed = 0;
        inst.initial_volume = 9;
        assert_eq!(inst.frame_at(100, 440.0).volume, 9.0);
    }

    #[test]
    fn triangle_without_decay_is_symmetric_ramp() {
        let mut inst = Instrument::default();
        inst.wave_type = WaveType::Triangle;
        inst.decay_speed = 0;
        let data = inst.frame_at(10, 440.0);
        assert_eq!(data.volume, 15.0);
        for i in 1..16 {
            assert_eq!(data.waveform[16 - i], data.waveform[16 + i], "index {}", i);
        }
        for i in 0..16 {
            assert!(data.waveform[i] <= data.waveform[i + 1]);
        }
        assert_eq!(data.waveform[16], 15);
    }

    #[test]
    fn transpose_octave_doubles_frequency() {
        let mut inst = Instrument::default();
        inst.transpose = 12;
        assert_eq!(inst.frame_at(0, 220.0).frequency, 440.0);
        inst.transpose = -12;
        assert_eq!(inst.frame_at(0, 220.0).frequency, 110.0);
    }

    #[test]
    fn slide_moves_one_hz_per_frame_at_sixteen() {
        let mut inst = Instrument::default();
        inst.slide_step = 16;
        assert_eq!(inst.frame_at(30, 440.0).frequency, 470.0);
    }

    #[test]
    fn vibrato_peaks_at_quarter_period() {
        let mut inst = Instrument::default();
        inst.vibrato_depth = 10;
        inst.vibrato_period = 16;
        assert_eq!(inst.frame_at(4, 440.0).frequency, 450.0);
        assert_eq!(inst.frame_at(12, 440.0).frequency, 430.0);
    }

    #[test]
    fn phase_oscillates_between_min_and_max() {
        let mut inst = Instrument::default();
        inst.phase_min = 4;
        inst.phase_max = 28;
        inst.phase_period = 20;
        assert_eq!(inst.phase_at(0), 4.0);
        assert_eq!(inst.phase_at(10), 28.0);
        inst.phase_period = 0;
        assert_eq!(inst.phase_at(10), 4.0);
    }

    #[test]
    fn noise_has_zero_waveform_but_keeps_envelope() {
        let mut inst = Instrument::default();
        inst.wave_type = WaveType::Noise;
        let data = inst.frame_at(5, 440.0);
        assert!(data.is_noise());
        assert_eq!(data.volume, 10.0);
    }

    fn sample_instrument(frames: usize, repeat_from: u32, repeat_length: u32) -> Instrument {
        let mut inst = Instrument::default();
        inst.wave_type = WaveType::Sample;
        inst.sample = SampleTable {
            waveforms: (0..frames).map(|n| [(n % 15 + 1) as u8; WAVEFORM_LEN]).collect(),
            volumes: (0..frames).map(|n| (15 - n % 16) as u8).collect(),
            frequencies: (0..frames).map(|n| 100.0 + n as f64).collect(),
            repeat_from,
            repeat_length,
            base_note: 33,
        };
        inst
    }

    #[test]
    fn sample_plays_table_then_loops() {
        let inst = sample_instrument(20, 8, 5);
        let n = 20;
        for k in 0..30 {
            assert_eq!(inst.frame_at(n + 5 + k, 440.0), inst.frame_at(n + k, 440.0));
        }
        assert_eq!(inst.frame_at(20, 440.0), inst.frame_at(8, 440.0));
    }

    #[test]
    fn sample_frequency_scales_with_note() {
        let inst = sample_instrument(4, 0, 0);
        assert_eq!(inst.frame_at(0, 440.0).frequency, 100.0);
        assert_eq!(inst.frame_at(0, 880.0).frequency, 200.0);
        assert_eq!(inst.frame_at(2, 440.0).volume, 13.0);
    }

    #[test]
    fn one_shot_sample_ends_in_silence() {
        let inst = sample_instrument(4, 0, 0);
        let data = inst.frame_at(4, 440.0);
        assert_eq!(data, FrameData::silent());
        assert_eq!(data.waveform, SILENT_WAVEFORM);
    }

    #[test]
    fn empty_sample_is_silent() {
        let mut inst = Instrument::default();
        inst.wave_type = WaveType::Sample;
        assert_eq!(inst.frame_at(0, 440.0), FrameData::silent());
        inst.sample.repeat_from = 3;
        inst.sample.repeat_length = 2;
        assert_eq!(inst.frame_at(7, 440.0), FrameData::silent());
    }

    #[test]
    fn evaluator_sees_live_instrument() {
        let mut inst = Instrument::default();
        assert_eq!(inst.evaluator(440.0).evaluate(0).volume, 15.0);
        inst.initial_volume = 7;
        let eval = inst.evaluator(440.0);
        assert_eq!(eval.evaluate(0).volume, 7.0);
        assert_eq!(eval.base_frequency(), 440.0);
    }
}
