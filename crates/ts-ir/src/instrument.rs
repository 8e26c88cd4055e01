//! Instrument parameters and their validation.

use arrayvec::ArrayString;

use crate::error::IrError;
use crate::sample::SampleTable;

/// Number of harmonic weights per instrument.
pub const HARMONIC_COUNT: usize = 8;

/// Waveform generator selected by an instrument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveType {
    /// Pulse wave with duty cycle set by the phase
    #[default]
    Square,
    /// Asymmetric triangle with its peak at the phase
    Triangle,
    /// Sine (phase is ignored)
    Sine,
    /// Chip noise generator
    Noise,
    /// Per-frame table imported from a recording
    Sample,
}

impl WaveType {
    pub const ALL: [WaveType; 5] = [
        WaveType::Square,
        WaveType::Triangle,
        WaveType::Sine,
        WaveType::Noise,
        WaveType::Sample,
    ];

    /// Numeric code used by instrument documents (1-5).
    pub const fn code(self) -> u8 {
        match self {
            WaveType::Square => 1,
            WaveType::Triangle => 2,
            WaveType::Sine => 3,
            WaveType::Noise => 4,
            WaveType::Sample => 5,
        }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            WaveType::Square => "Square",
            WaveType::Triangle => "Triangle",
            WaveType::Sine => "Sine",
            WaveType::Noise => "Noise",
            WaveType::Sample => "Sample",
        }
    }

    /// Returns true if the phase parameters shape this wave.
    pub const fn uses_phase(self) -> bool {
        matches!(self, WaveType::Square | WaveType::Triangle)
    }

    /// Returns true if the harmonic weights shape this wave.
    pub const fn uses_harmonics(self) -> bool {
        matches!(self, WaveType::Square | WaveType::Triangle | WaveType::Sine)
    }
}

impl TryFrom<u8> for WaveType {
    type Error = IrError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(WaveType::Square),
            2 => Ok(WaveType::Triangle),
            3 => Ok(WaveType::Sine),
            4 => Ok(WaveType::Noise),
            5 => Ok(WaveType::Sample),
            _ => Err(IrError::InvalidWaveType(code)),
        }
    }
}

/// An instrument definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Instrument {
    /// Instrument name
    pub name: ArrayString<32>,
    /// Active waveform generator
    pub wave_type: WaveType,
    /// Pitch offset in semitones (-24 to 24)
    pub transpose: i8,
    /// Pitch drift per frame in 1/16 Hz (-256 to 256)
    pub slide_step: i16,
    /// Volume at frame 0 (0-15)
    pub initial_volume: u8,
    /// Volume the decay settles at (0-15)
    pub decay_to: u8,
    /// Volume change per frame in 1/16 units (0-256)
    pub decay_speed: u16,
    /// Lowest phase split point (0-32)
    pub phase_min: u8,
    /// Highest phase split point (0-32)
    pub phase_max: u8,
    /// Frames per phase oscillation (0-256)
    pub phase_period: u16,
    /// Vibrato amplitude in Hz (0-256)
    pub vibrato_depth: u16,
    /// Frames per vibrato cycle (0-256)
    pub vibrato_period: u16,
    /// Harmonic weights (0-1), index 0 = fundamental
    pub harmonics: [f64; HARMONIC_COUNT],
    /// Imported per-frame data for `WaveType::Sample`
    pub sample: SampleTable,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            name: ArrayString::new(),
            wave_type: WaveType::Square,
            transpose: 0,
            slide_step: 0,
            initial_volume: 15,
            decay_to: 0,
            decay_speed: 16,
            phase_min: 16,
            phase_max: 16,
            phase_period: 16,
            vibrato_depth: 0,
            vibrato_period: 16,
            harmonics: [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            sample: SampleTable::default(),
        }
    }
}

impl Instrument {
    /// Create a new instrument with default settings.
    pub fn new(name: &str) -> Self {
        let mut inst = Self::default();
        inst.set_name(name);
        inst
    }

    /// Replace the name, truncating to 32 bytes on a char boundary.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for ch in name.chars() {
            if self.name.try_push(ch).is_err() {
                break;
            }
        }
    }

    /// Current value of a numeric parameter.
    pub fn get(&self, param: InstrumentParam) -> f64 {
        match param {
            InstrumentParam::Transpose => self.transpose as f64,
            InstrumentParam::SlideStep => self.slide_step as f64,
            InstrumentParam::InitialVolume => self.initial_volume as f64,
            InstrumentParam::DecayTo => self.decay_to as f64,
            InstrumentParam::DecaySpeed => self.decay_speed as f64,
            InstrumentParam::PhaseMin => self.phase_min as f64,
            InstrumentParam::PhaseMax => self.phase_max as f64,
            InstrumentParam::PhasePeriod => self.phase_period as f64,
            InstrumentParam::VibratoDepth => self.vibrato_depth as f64,
            InstrumentParam::VibratoPeriod => self.vibrato_period as f64,
            InstrumentParam::Harmonic(h) => {
                self.harmonics.get(h as usize).copied().unwrap_or(0.0)
            }
        }
    }

    /// Set a numeric parameter, rejecting out-of-range or non-integral values.
    pub fn set(&mut self, param: InstrumentParam, value: f64) -> Result<(), IrError> {
        param.check(value)?;
        match param {
            InstrumentParam::Transpose => self.transpose = value as i8,
            InstrumentParam::SlideStep => self.slide_step = value as i16,
            InstrumentParam::InitialVolume => self.initial_volume = value as u8,
            InstrumentParam::DecayTo => self.decay_to = value as u8,
            InstrumentParam::DecaySpeed => self.decay_speed = value as u16,
            InstrumentParam::PhaseMin => self.phase_min = value as u8,
            InstrumentParam::PhaseMax => self.phase_max = value as u8,
            InstrumentParam::PhasePeriod => self.phase_period = value as u16,
            InstrumentParam::VibratoDepth => self.vibrato_depth = value as u16,
            InstrumentParam::VibratoPeriod => self.vibrato_period = value as u16,
            InstrumentParam::Harmonic(h) => self.harmonics[h as usize] = value,
        }
        Ok(())
    }

    /// Check every parameter and the sample table.
    pub fn validate(&self) -> Result<(), IrError> {
        for param in InstrumentParam::all() {
            param.check(self.get(param))?;
        }
        self.sample.validate()
    }
}

/// A numeric instrument parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrumentParam {
    Transpose,
    SlideStep,
    InitialVolume,
    DecayTo,
    DecaySpeed,
    PhaseMin,
    PhaseMax,
    PhasePeriod,
    VibratoDepth,
    VibratoPeriod,
    /// Harmonic weight, 0 = fundamental
    Harmonic(u8),
}

impl InstrumentParam {
    const SCALARS: [InstrumentParam; 10] = [
        InstrumentParam::Transpose,
        InstrumentParam::SlideStep,
        InstrumentParam::InitialVolume,
        InstrumentParam::DecayTo,
        InstrumentParam::DecaySpeed,
        InstrumentParam::PhaseMin,
        InstrumentParam::PhaseMax,
        InstrumentParam::PhasePeriod,
        InstrumentParam::VibratoDepth,
        InstrumentParam::VibratoPeriod,
    ];

    /// Every parameter, scalars first, then the harmonics in order.
    pub fn all() -> impl Iterator<Item = InstrumentParam> {
        Self::SCALARS
            .into_iter()
            .chain((0..HARMONIC_COUNT as u8).map(InstrumentParam::Harmonic))
    }

    /// Parameter name as used in instrument documents.
    pub const fn name(self) -> &'static str {
        match self {
            InstrumentParam::Transpose => "transpose",
            InstrumentParam::SlideStep => "slideStep",
            InstrumentParam::InitialVolume => "initialVolume",
            InstrumentParam::DecayTo => "decayTo",
            InstrumentParam::DecaySpeed => "decaySpeed",
            InstrumentParam::PhaseMin => "phaseMin",
            InstrumentParam::PhaseMax => "phaseMax",
            InstrumentParam::PhasePeriod => "phasePeriod",
            InstrumentParam::VibratoDepth => "vibratoDepth",
            InstrumentParam::VibratoPeriod => "vibratoPeriod",
            InstrumentParam::Harmonic(_) => "harmonic",
        }
    }

    /// Inclusive legal range.
    pub const fn range(self) -> (f64, f64) {
        match self {
            InstrumentParam::Transpose => (-24.0, 24.0),
            InstrumentParam::SlideStep => (-256.0, 256.0),
            InstrumentParam::InitialVolume | InstrumentParam::DecayTo => (0.0, 15.0),
            InstrumentParam::PhaseMin | InstrumentParam::PhaseMax => (0.0, 32.0),
            InstrumentParam::DecaySpeed
            | InstrumentParam::PhasePeriod
            | InstrumentParam::VibratoDepth
            | InstrumentParam::VibratoPeriod => (0.0, 256.0),
            InstrumentParam::Harmonic(_) => (0.0, 1.0),
        }
    }

    /// Returns true if only whole numbers are accepted.
    pub const fn is_integer(self) -> bool {
        !matches!(self, InstrumentParam::Harmonic(_))
    }

    fn check(self, value: f64) -> Result<(), IrError> {
        let (min, max) = self.range();
        let in_range = value >= min && value <= max;
        let integral = !self.is_integer() || libm::trunc(value) == value;
        let index_ok = match self {
            InstrumentParam::Harmonic(h) => (h as usize) < HARMONIC_COUNT,
            _ => true,
        };
        if in_range && integral && index_ok {
            Ok(())
        } else {
            Err(IrError::InvalidParameter { param: self.name(), value, min, max })
        }
    }
}
