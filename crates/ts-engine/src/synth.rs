//! Sample-rate rendering of frame data.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use ts_ir::{ChannelFrames, CHANNEL_COUNT, FRAME_RATE};

use crate::channel::ChannelState;
use crate::source::FrameSource;

/// Noise seed used by [`FrameSynthesizer::new`].
pub const DEFAULT_NOISE_SEED: u64 = 0x7469_6338;

/// Renders four chip channels to mono `f32` samples.
///
/// Each frame boundary pulls one tick of data from the frame source; in
/// between, every channel steps through its waveform at the rate implied
/// by its frequency. The output is the unclipped sum of the channels.
pub struct FrameSynthesizer {
    sample_rate: u32,
    samples_per_frame: f64,
    samples_to_next_frame: f64,
    frame_number: u32,
    channels: [ChannelState; CHANNEL_COUNT],
    last_frame: ChannelFrames,
    rng: Pcg32,
}

impl FrameSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_seed(sample_rate, DEFAULT_NOISE_SEED)
    }

    /// Create a synthesizer whose noise channel is driven by `seed`.
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate,
            samples_per_frame: sample_rate as f64 / FRAME_RATE as f64,
            samples_to_next_frame: 0.0,
            frame_number: 0,
            channels: core::array::from_fn(|_| ChannelState::new()),
            last_frame: [None; CHANNEL_COUNT],
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Fill `out` with samples, pulling frames from `source` as needed.
    ///
    /// Without a source every channel is muted at the next frame boundary.
    /// Never allocates.
    pub fn generate(&mut self, out: &mut [f32], source: Option<&mut dyn FrameSource>) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.fill(out, source));
        #[cfg(not(feature = "alloc_check"))]
        self.fill(out, source);
    }

    fn fill(&mut self, out: &mut [f32], mut source: Option<&mut dyn FrameSource>) {
        let sample_rate = self.sample_rate as f64;
        for sample in out.iter_mut() {
            if self.samples_to_next_frame <= 0.0 {
                match source.as_deref_mut() {
                    Some(source) => {
                        let frame = source.next_frame(self.frame_number);
                        self.frame_number = self.frame_number.wrapping_add(1);
                        for (channel, data) in self.channels.iter_mut().zip(frame.iter()) {
                            channel.load(data.as_ref(), sample_rate);
                        }
                        self.last_frame = frame;
                    }
                    None => {
                        for channel in &mut self.channels {
                            channel.load(None, sample_rate);
                        }
                        self.last_frame = [None; CHANNEL_COUNT];
                    }
                }
                self.samples_to_next_frame += self.samples_per_frame;
            }

            let mut mix = 0.0;
            for channel in &mut self.channels {
                mix += channel.step(&mut self.rng);
            }
            *sample = mix;
            self.samples_to_next_frame -= 1.0;
        }
    }

    /// Start frame numbering again from 0, for a new note or song start.
    pub fn restart(&mut self) {
        self.frame_number = 0;
        self.samples_to_next_frame = 0.0;
    }

    /// Return every channel to silence and restart.
    pub fn reset(&mut self) {
        self.restart();
        self.channels = core::array::from_fn(|_| ChannelState::new());
        self.last_frame = [None; CHANNEL_COUNT];
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples_per_frame(&self) -> f64 {
        self.samples_per_frame
    }

    /// Frames pulled since the last restart.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelState> {
        self.channels.get(index)
    }

    /// The frame data most recently pulled (the scope feed).
    pub fn last_frame(&self) -> &ChannelFrames {
        &self.last_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_ir::{FrameData, SILENT_WAVEFORM, WAVEFORM_LEN};

    fn tone(frequency: f32, volume: f32) -> FrameData {
        FrameData { frequency, volume, waveform: SILENT_WAVEFORM }
    }

    #[test]
    fn silent_without_source() {
        let mut synth = FrameSynthesizer::new(44100);
        let mut out = [1.0f32; 2048];
        synth.generate(&mut out, None);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(synth.frame_number(), 0);
    }

    #[test]
    fn source_pulled_once_per_frame_regardless_of_buffer_size() {
        let mut synth = FrameSynthesizer::new(6000);
        let mut calls = 0u32;
        let mut frames_seen = [0u32; 8];
        let mut source = |frame: u32| {
            frames_seen[calls as usize] = frame;
            calls += 1;
            [Some(tone(440.0, 15.0)), None, None, None]
        };
        // 100 samples per frame; 700 samples in ragged buffers = 7 frames
        let mut out = [0.0f32; 700];
        let (a, rest) = out.split_at_mut(33);
        let (b, c) = rest.split_at_mut(250);
        synth.generate(a, Some(&mut source));
        synth.generate(b, Some(&mut source));
        synth.generate(c, Some(&mut source));
        assert_eq!(calls, 7);
        assert_eq!(&frames_seen[..7], &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(synth.frame_number(), 7);
    }

    #[test]
    fn square_tone_alternates_full_scale() {
        // 32 samples per cycle: 16 high, 16 low
        let mut synth = FrameSynthesizer::new(32 * 100);
        let mut source = |_: u32| [Some(tone(100.0, 15.0)), None, None, None];
        let mut out = [0.0f32; 64];
        synth.generate(&mut out, Some(&mut source));
        assert!(out[..16].iter().all(|&s| s == 1.0));
        assert!(out[16..32].iter().all(|&s| s == -1.0));
        assert!(out[32..48].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn channels_sum_unclipped() {
        let mut synth = FrameSynthesizer::new(3200);
        let mut source = |_: u32| [Some(tone(100.0, 15.0)); CHANNEL_COUNT];
        let mut out = [0.0f32; 4];
        synth.generate(&mut out, Some(&mut source));
        assert_eq!(out[0], 4.0);
    }

    #[test]
    fn noise_is_deterministic_per_seed() {
        let noise = FrameData { frequency: 2000.0, volume: 15.0, waveform: [0; WAVEFORM_LEN] };
        let render = |seed| {
            let mut synth = FrameSynthesizer::with_seed(44100, seed);
            let mut source = |_: u32| [None, None, None, Some(noise)];
            let mut out = [0.0f32; 1024];
            synth.generate(&mut out, Some(&mut source));
            out
        };
        assert_eq!(render(1), render(1));
        assert_ne!(render(1), render(2));
    }

    #[test]
    fn restart_and_reset() {
        let mut synth = FrameSynthesizer::new(6000);
        let mut source = |_: u32| [Some(tone(440.0, 10.0)), None, None, None];
        let mut out = [0.0f32; 250];
        synth.generate(&mut out, Some(&mut source));
        assert_eq!(synth.frame_number(), 3);
        assert_eq!(synth.last_frame()[0], Some(tone(440.0, 10.0)));
        assert_eq!(synth.channel(0).map(|c| c.volume), Some(10.0));

        synth.restart();
        assert_eq!(synth.frame_number(), 0);
        assert_eq!(synth.channel(0).map(|c| c.volume), Some(10.0));

        synth.reset();
        assert_eq!(synth.channel(0), Some(&ChannelState::new()));
        assert_eq!(synth.last_frame(), &[None; CHANNEL_COUNT]);
        assert!(synth.channel(4).is_none());
    }

    #[test]
    fn exact_buffer_length_written() {
        let mut synth = FrameSynthesizer::new(44100);
        let mut out = [f32::NAN; 17];
        synth.generate(&mut out, None);
        assert!(out.iter().all(|s| !s.is_nan()));
    }
}
