//! Instrument compilation to a Lua register-writing function.
//!
//! The function has the signature `(c,v,f,t)`: channel, volume, note
//! frequency and frames since note-on. It writes the channel's frequency,
//! volume and waveform registers and must agree with
//! `Instrument::frame_at` on every chip-visible value.

use std::fmt::{self, Write};

use ts_ir::{
    transpose_factor, waveform_to_letters, Instrument, WaveType, HARMONIC_COUNT, SILENT_WAVEFORM,
};

use crate::EmitError;

/// A statement run before the register writes.
#[derive(Clone, Debug, PartialEq)]
pub enum Modifier {
    /// `f=f*factor`
    Transpose { factor: f64 },
    /// Sinusoidal pitch wobble in Hz
    Vibrato { depth: u16, period: u16 },
    /// Linear pitch drift in Hz per frame
    Slide { step: f64 },
    /// Round the frequency and clamp it to the 12-bit register
    ClampFrequency,
    /// Volume envelope from `from` towards `to`, `rate` units per frame
    Decay { from: u8, to: u8, rate: f64 },
    /// Constant volume below full scale
    ScaleVolume { volume: u8 },
    /// Phase oscillating around `centre`
    Phase { centre: f64, amplitude: f64, period: u16 },
    /// Phase held at one value
    FixedPhase { phase: u8 },
}

/// One weighted harmonic of the base wave function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicTerm {
    pub wave_type: WaveType,
    /// Harmonic index, 0 = fundamental
    pub harmonic: usize,
    pub weight: f64,
}

/// Per-frame sample tables and the loop decision made at compile time.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleCode {
    pub waveforms: Vec<String>,
    pub volumes: Vec<u8>,
    pub frequencies: Vec<f64>,
    pub base_frequency: f64,
    /// `(repeat_from, repeat_length)` when playback loops
    pub looped: Option<(u32, u32)>,
}

/// Statements inside the `for i=0,31` loop.
#[derive(Clone, Debug, PartialEq)]
pub enum WaveBody {
    /// Every entry set to one level
    Constant(u8),
    /// All zeros, selecting the noise generator
    Noise,
    /// Sum of harmonic terms
    Harmonics { terms: Vec<HarmonicTerm>, clamp: bool },
    /// Table lookup from the sample
    Sample(SampleCode),
}

/// A compiled instrument: the statement plan behind the Lua text.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentCode {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub wave: WaveBody,
}

impl InstrumentCode {
    /// Build the minimal statement plan for an instrument.
    pub fn compile(instrument: &Instrument) -> Result<Self, EmitError> {
        instrument.validate()?;
        let name = instrument.name.replace(['\r', '\n'], "");

        if instrument.wave_type == WaveType::Sample {
            return Ok(Self {
                name,
                modifiers: Vec::new(),
                wave: WaveBody::Sample(compile_sample(instrument)),
            });
        }

        let mut modifiers = frequency_modifiers(instrument);
        modifiers.extend(volume_modifier(instrument));

        let wave = match instrument.wave_type {
            WaveType::Noise => WaveBody::Noise,
            wave_type => {
                if wave_type.uses_phase() {
                    modifiers.push(phase_modifier(instrument));
                }
                harmonic_body(wave_type, &instrument.harmonics)
            }
        };

        Ok(Self { name, modifiers, wave })
    }

    /// Lua source for the instrument function.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn frequency_modifiers(instrument: &Instrument) -> Vec<Modifier> {
    let mut modifiers = Vec::new();
    if instrument.transpose != 0 {
        modifiers.push(Modifier::Transpose {
            factor: transpose_factor(instrument.transpose),
        });
    }
    if instrument.vibrato_depth > 0 && instrument.vibrato_period > 0 {
        modifiers.push(Modifier::Vibrato {
            depth: instrument.vibrato_depth,
            period: instrument.vibrato_period,
        });
    }
    if instrument.slide_step != 0 {
        modifiers.push(Modifier::Slide { step: instrument.slide_step as f64 / 16.0 });
    }
    if !modifiers.is_empty() {
        modifiers.push(Modifier::ClampFrequency);
    }
    modifiers
}

fn volume_modifier(instrument: &Instrument) -> Option<Modifier> {
    if instrument.decay_speed > 0 && instrument.initial_volume != instrument.decay_to {
        Some(Modifier::Decay {
            from: instrument.initial_volume,
            to: instrument.decay_to,
            rate: instrument.decay_speed as f64 / 16.0,
        })
    } else if instrument.initial_volume != 15 {
        Some(Modifier::ScaleVolume { volume: instrument.initial_volume })
    } else {
        None
    }
}

fn phase_modifier(instrument: &Instrument) -> Modifier {
    if instrument.phase_min != instrument.phase_max && instrument.phase_period > 0 {
        let min = instrument.phase_min as f64;
        let max = instrument.phase_max as f64;
        Modifier::Phase {
            centre: (min + max) / 2.0,
            amplitude: (max - min) / 2.0,
            period: instrument.phase_period,
        }
    } else {
        Modifier::FixedPhase { phase: instrument.phase_min }
    }
}

fn harmonic_body(wave_type: WaveType, harmonics: &[f64; HARMONIC_COUNT]) -> WaveBody {
    let terms: Vec<HarmonicTerm> = harmonics
        .iter()
        .enumerate()
        .filter(|&(_, &weight)| weight != 0.0)
        .map(|(harmonic, &weight)| HarmonicTerm { wave_type, harmonic, weight })
        .collect();

    match terms.len() {
        0 => WaveBody::Constant(8),
        1 => {
            let clamp = terms[0].weight != 1.0;
            WaveBody::Harmonics { terms, clamp }
        }
        _ => WaveBody::Harmonics { terms, clamp: true },
    }
}

fn compile_sample(instrument: &Instrument) -> SampleCode {
    let table = &instrument.sample;
    SampleCode {
        waveforms: table.waveforms.iter().map(waveform_to_letters).collect(),
        volumes: table.volumes.clone(),
        frequencies: table.frequencies.clone(),
        base_frequency: table.base_frequency(),
        looped: table
            .is_looped()
            .then_some((table.repeat_from, table.repeat_length)),
    }
}

impl HarmonicTerm {
    fn index_expr(&self) -> String {
        if self.harmonic == 0 {
            "i".to_string()
        } else {
            format!("(i*{}%32)", self.harmonic + 1)
        }
    }

    /// The bipolar base function at this harmonic's index.
    fn wave_expr(&self) -> String {
        let i = self.index_expr();
        match self.wave_type {
            WaveType::Square => format!("{i}<p and 7.5 or -7.5"),
            WaveType::Triangle => format!("15*({i}<p and {i}/p or (32-{i})/(32-p))-7.5"),
            _ => format!("7.5*math.sin(math.pi*{i}/16)"),
        }
    }
}

impl fmt::Display for HarmonicTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weight == 1.0 {
            write!(f, "{}", self.wave_expr())
        } else {
            write!(f, "{}*({})", self.weight, self.wave_expr())
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Transpose { factor } => write!(f, "  f=f*{factor}"),
            Modifier::Vibrato { depth, period } => {
                write!(f, "  f=f+{depth}*math.sin(t*2*math.pi/{period})")
            }
            Modifier::Slide { step } => write!(f, "  f=f+t*{step}"),
            Modifier::ClampFrequency => write!(f, "  f=math.min(math.max(1,(f+0.5)//1),4095)"),
            Modifier::Decay { from, to, rate } => {
                if from >= to {
                    write!(f, "  v=(math.max({to},{from}-t*{rate})*v/15+0.5)//1")
                } else {
                    write!(f, "  v=(math.min({to},{from}+t*{rate})*v/15+0.5)//1")
                }
            }
            Modifier::ScaleVolume { volume } => write!(f, "  v=({volume}*v/15+0.5)//1"),
            Modifier::Phase { centre, amplitude, period } => {
                let sign = if *amplitude < 0.0 { '+' } else { '-' };
                write!(
                    f,
                    "  local p={centre}{sign}{}*math.cos(t*2*math.pi/{period})",
                    amplitude.abs()
                )
            }
            Modifier::FixedPhase { phase } => write!(f, "  local p={phase}"),
        }
    }
}

impl SampleCode {
    fn write_setup(&self, out: &mut impl Write) -> fmt::Result {
        let waves: Vec<String> = self.waveforms.iter().map(|w| format!("\"{w}\"")).collect();
        writeln!(out, "  local waves={{{}}}", waves.join(","))?;
        writeln!(out, "  local vols={{{}}}", join(&self.volumes))?;
        writeln!(out, "  local freqs={{{}}}", join(&self.frequencies))?;

        let count = self.volumes.len();
        let volume = "v=(vols[t+1]*v/15+0.5)//1";
        let frequency = format!(
            "f=math.min(math.max(1,(freqs[t+1]*f/{}+0.5)//1),4095)",
            self.base_frequency
        );
        match self.looped {
            Some((from, length)) => {
                writeln!(out, "  if (t>={count}) then")?;
                writeln!(out, "    t=(t-{count})%{length}+{from}")?;
                writeln!(out, "  end")?;
                writeln!(out, "  local w=waves[t+1]")?;
                writeln!(out, "  {volume}")?;
                writeln!(out, "  {frequency}")
            }
            None => {
                writeln!(out, "  local w=\"{}\"", waveform_to_letters(&SILENT_WAVEFORM))?;
                writeln!(out, "  if (t<{count}) then")?;
                writeln!(out, "    w=waves[t+1]")?;
                writeln!(out, "    {volume}")?;
                writeln!(out, "    {frequency}")?;
                writeln!(out, "  else")?;
                writeln!(out, "    v=0")?;
                writeln!(out, "    f=440")?;
                writeln!(out, "  end")
            }
        }
    }
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

impl WaveBody {
    fn write_loop(&self, out: &mut impl Write) -> fmt::Result {
        const POKE: &str = "    poke4(a*2+4+i,";
        match self {
            WaveBody::Constant(level) => writeln!(out, "{POKE}{level})"),
            WaveBody::Noise => writeln!(out, "{POKE}0)"),
            WaveBody::Sample(_) => writeln!(out, "{POKE}w:byte(i+1)-65)"),
            WaveBody::Harmonics { terms, clamp } => {
                let level = if let [term] = terms.as_slice() {
                    format!("(7.5+({term})+0.5)//1")
                } else {
                    writeln!(out, "    local r=0")?;
                    for term in terms {
                        writeln!(out, "    r=r+({term})")?;
                    }
                    "(7.5+r+0.5)//1".to_string()
                };
                if *clamp {
                    writeln!(out, "{POKE}math.min(15,math.max(0,{level})))")
                } else {
                    writeln!(out, "{POKE}{level})")
                }
            }
        }
    }
}

impl fmt::Display for InstrumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function (c,v,f,t)")?;
        if !self.name.is_empty() {
            writeln!(f, "  -- {}", self.name)?;
        }
        writeln!(f, "  local a=0xff9c+c*18")?;
        for modifier in &self.modifiers {
            writeln!(f, "{modifier}")?;
        }
        if let WaveBody::Sample(sample) = &self.wave {
            sample.write_setup(f)?;
        }
        writeln!(f, "  poke(a,f&255)")?;
        writeln!(f, "  poke(a+1,(v<<4)+(f>>8))")?;
        writeln!(f, "  for i=0,31 do")?;
        self.wave.write_loop(f)?;
        writeln!(f, "  end")?;
        write!(f, "end")
    }
}

/// Compile an instrument straight to Lua source.
pub fn emit_instrument(instrument: &Instrument) -> Result<String, EmitError> {
    let code = InstrumentCode::compile(instrument)?;
    tracing::debug!(
        name = %code.name,
        modifiers = code.modifiers.len(),
        "compiled instrument"
    );
    Ok(code.render())
}
