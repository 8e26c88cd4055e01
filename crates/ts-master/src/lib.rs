//! Headless controller for the ticsynth chiptune engine.
//!
//! Owns a song, plays instrument previews or the whole song on an audio
//! thread, forwards edits to that thread while it runs, and renders or
//! exports offline. Shared by the CLI and any editor front end.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use thiserror::Error;
use ts_audio::{AudioOutput, CpalOutput};
use ts_engine::{FrameSynthesizer, NotePreview, SongPlayer};

// Re-export common types so callers don't need ts-ir/ts-formats directly.
pub use ts_audio::AudioError;
pub use ts_formats::{EmitError, FormatError, DEFAULT_GAIN};
pub use ts_ir::{Edit, Instrument, IrError, Song};

/// Samples rendered per block on the audio thread.
const BLOCK_SIZE: usize = 512;

/// Edits that can wait between two audio blocks.
const EDIT_QUEUE_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum MasterError {
    #[error(transparent)]
    Invalid(#[from] IrError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Offline render parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub sample_rate: u32,
    /// Output gain applied when writing WAV
    pub gain: f32,
    /// Render length
    pub seconds: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { sample_rate: 44100, gain: DEFAULT_GAIN, seconds: 2.0 }
    }
}

impl RenderSettings {
    /// Number of samples covering `seconds`.
    pub fn sample_count(&self) -> usize {
        (self.seconds.max(0.0) * self.sample_rate as f64).round() as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PlayMode {
    Instrument { slot: u8, frequency: f64 },
    Song,
}

/// Headless controller: owns a song and manages playback.
pub struct Controller {
    song: Song,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    current_frame: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    edits: HeapProd<Edit>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_song(Song::new("Untitled"))
    }

    pub fn with_song(song: Song) -> Self {
        Self { song, playback: None }
    }

    // --- Song management ---

    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Replace the song, stopping any playback.
    pub fn load_song(&mut self, song: Song) -> Result<(), MasterError> {
        song.validate()?;
        self.stop();
        self.song = song;
        Ok(())
    }

    /// Put an instrument into a slot, stopping any playback.
    pub fn load_instrument(&mut self, slot: u8, instrument: Instrument) -> Result<(), MasterError> {
        instrument.validate()?;
        self.stop();
        *self.song.instrument_mut(slot)? = instrument;
        Ok(())
    }

    /// Apply an edit to the song and, while playing, to the audio thread's copy.
    ///
    /// Rejected edits leave both untouched.
    pub fn apply_edit(&mut self, edit: Edit) -> Result<(), MasterError> {
        if let Err(err) = self.song.apply_edit(&edit) {
            tracing::warn!(%err, ?edit, "rejected edit");
            return Err(err.into());
        }
        if let Some(pb) = self.playback.as_mut() {
            if let Err(edit) = pb.edits.try_push(edit) {
                tracing::warn!(?edit, "edit queue full, audio thread keeps the old value");
            }
        }
        Ok(())
    }

    // --- Real-time playback ---

    /// Preview one instrument at `frequency` Hz until stopped.
    pub fn play_instrument(&mut self, slot: u8, frequency: f64) -> Result<(), MasterError> {
        self.song.instrument(slot)?.validate()?;
        self.start(PlayMode::Instrument { slot, frequency });
        Ok(())
    }

    /// Play the song from the first position, looping until stopped.
    pub fn play_song(&mut self) -> Result<(), MasterError> {
        self.song.validate()?;
        self.start(PlayMode::Song);
        Ok(())
    }

    fn start(&mut self, mode: PlayMode) {
        self.stop();

        let song = self.song.clone();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let current_frame = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (edits, edit_consumer) = HeapRb::<Edit>::new(EDIT_QUEUE_LEN).split();

        let stop = stop_signal.clone();
        let frame = current_frame.clone();
        let done = finished.clone();

        tracing::debug!(?mode, "starting playback");
        let thread = std::thread::spawn(move || {
            audio_thread(song, mode, edit_consumer, stop, frame, done);
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            current_frame,
            finished,
            edits,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                if handle.join().is_err() {
                    tracing::error!("audio thread panicked");
                }
            }
            tracing::debug!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    /// Frames played since playback started.
    pub fn current_frame(&self) -> Option<u64> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        Some(pb.current_frame.load(Ordering::Relaxed))
    }

    // --- Offline rendering ---

    /// Render one instrument note.
    pub fn render_instrument(
        &self,
        slot: u8,
        frequency: f64,
        settings: &RenderSettings,
    ) -> Result<Vec<f32>, MasterError> {
        let instrument = self.song.instrument(slot)?;
        instrument.validate()?;

        let mut synth = FrameSynthesizer::new(settings.sample_rate);
        let mut preview = NotePreview::new(instrument, frequency);
        let mut samples = vec![0.0; settings.sample_count()];
        synth.generate(&mut samples, Some(&mut preview));
        Ok(samples)
    }

    /// Render the song from its first position.
    pub fn render_song(&self, settings: &RenderSettings) -> Result<Vec<f32>, MasterError> {
        self.song.validate()?;

        let mut synth = FrameSynthesizer::new(settings.sample_rate);
        let mut player = SongPlayer::new();
        let mut samples = vec![0.0; settings.sample_count()];
        synth.generate(&mut samples, Some(&mut player.frames(&self.song)));
        Ok(samples)
    }

    pub fn render_to_wav(&self, samples: &[f32], settings: &RenderSettings) -> Vec<u8> {
        ts_formats::samples_to_wav(samples, settings.sample_rate, settings.gain)
    }

    // --- Export ---

    /// The song as a complete Lua program.
    pub fn export_lua(&self) -> Result<String, MasterError> {
        Ok(ts_formats::emit_song(&self.song)?)
    }

    /// One instrument as a Lua function.
    pub fn export_instrument_lua(&self, slot: u8) -> Result<String, MasterError> {
        Ok(ts_formats::emit_instrument(self.song.instrument(slot)?)?)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn audio_thread(
    mut song: Song,
    mode: PlayMode,
    mut edits: HeapCons<Edit>,
    stop_signal: Arc<AtomicBool>,
    current_frame: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
) {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(%err, "no audio output");
            finished.store(true, Ordering::Relaxed);
            return;
        }
    };
    if let Err(err) = output.build_stream(consumer).and_then(|()| output.start()) {
        tracing::error!(%err, "failed to start audio stream");
        finished.store(true, Ordering::Relaxed);
        return;
    }

    let mut synth = FrameSynthesizer::new(output.sample_rate());
    let mut player = SongPlayer::new();
    let mut block = vec![0.0f32; BLOCK_SIZE];

    while !stop_signal.load(Ordering::Relaxed) {
        while let Some(edit) = edits.try_pop() {
            if let Err(err) = song.apply_owned_edit(edit) {
                tracing::warn!(%err, "audio thread rejected edit");
            }
        }

        match mode {
            PlayMode::Instrument { slot, frequency } => {
                let Ok(instrument) = song.instrument(slot) else {
                    break;
                };
                let mut preview = NotePreview::new(instrument, frequency);
                synth.generate(&mut block, Some(&mut preview));
            }
            PlayMode::Song => {
                synth.generate(&mut block, Some(&mut player.frames(&song)));
            }
        }
        output.write_spin(&block);
        current_frame.store(synth.frame_number() as u64, Ordering::Relaxed);
    }

    block.fill(0.0);
    output.write_spin(&block);
    if let Err(err) = output.stop() {
        tracing::warn!(%err, "failed to pause audio stream");
    }
    finished.store(true, Ordering::Relaxed);
    tracing::debug!(frames = synth.frame_number(), "audio thread finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_ir::{Cell, InstrumentParam, WaveType};

    fn short(seconds: f64) -> RenderSettings {
        RenderSettings { sample_rate: 6000, seconds, ..RenderSettings::default() }
    }

    #[test]
    fn default_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.sample_rate, 44100);
        assert_eq!(settings.gain, 0.3);
        assert_eq!(settings.sample_count(), 88200);
    }

    #[test]
    fn instrument_render_has_requested_length_and_decays() {
        let controller = Controller::new();
        let samples = controller.render_instrument(1, 440.0, &short(0.5)).unwrap();
        assert_eq!(samples.len(), 3000);
        // default decay reaches silence after 15 frames (1500 samples at 6 kHz)
        assert!(samples[..1500].iter().any(|&s| s != 0.0));
        assert!(samples[1600..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn empty_song_renders_silence() {
        let controller = Controller::new();
        let samples = controller.render_song(&short(1.0)).unwrap();
        assert_eq!(samples.len(), 6000);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn song_render_starts_notes() {
        let mut song = Song::new("one note");
        song.instrument_mut(1).unwrap().decay_speed = 0;
        *song.patterns[0].cell_mut(0, 0) = Cell { note: 58, instrument: 1 };
        let controller = Controller::with_song(song);
        let samples = controller.render_song(&short(0.25)).unwrap();
        assert!(samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn edits_apply_and_reject() {
        let mut controller = Controller::new();
        controller
            .apply_edit(Edit::SetWaveType { slot: 2, wave_type: WaveType::Noise })
            .unwrap();
        assert_eq!(controller.song().instrument(2).unwrap().wave_type, WaveType::Noise);

        let rejected = controller.apply_edit(Edit::SetParam {
            slot: 2,
            param: InstrumentParam::DecayTo,
            value: 99.0,
        });
        assert!(matches!(rejected, Err(MasterError::Invalid(IrError::InvalidParameter { .. }))));
        assert_eq!(controller.song().instrument(2).unwrap().decay_to, 0);
    }

    #[test]
    fn invalid_slots_are_errors() {
        let controller = Controller::new();
        assert!(matches!(
            controller.render_instrument(0, 440.0, &short(0.1)),
            Err(MasterError::Invalid(IrError::InvalidSlot(0)))
        ));
        assert!(matches!(
            controller.export_instrument_lua(16),
            Err(MasterError::Invalid(IrError::InvalidSlot(16)))
        ));
    }

    #[test]
    fn exports_and_wav() {
        let controller = Controller::new();
        let lua = controller.export_lua().unwrap();
        assert!(lua.contains("song_speed=6"));
        assert!(controller.export_instrument_lua(1).unwrap().starts_with("function (c,v,f,t)"));

        let settings = short(0.1);
        let samples = controller.render_instrument(1, 440.0, &settings).unwrap();
        let wav = controller.render_to_wav(&samples, &settings);
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn idle_controller_is_not_playing() {
        let mut controller = Controller::new();
        assert!(!controller.is_playing());
        assert_eq!(controller.current_frame(), None);
        controller.stop();
    }
}
