//! ticsynth CLI: Lua export, frame inspection, WAV render and playback.
//!
//! Usage:
//!   ts-cli emit pad.json
//!   ts-cli export song.json -o song.lua
//!   ts-cli render pad.json --wav pad.wav --note C-4
//!   ts-cli play-song song.json

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ts_ir::{note_frequency, parse_note, waveform_to_letters, SongUsage, FRAME_RATE};
use ts_master::{Controller, Instrument, RenderSettings, Song};

/// Slot the CLI loads a standalone instrument document into.
const PREVIEW_SLOT: u8 = 1;

#[derive(Parser)]
#[command(name = "ts-cli")]
#[command(about = "Chiptune instrument and song tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an instrument document as a Lua function
    Emit {
        /// Instrument JSON document
        input: PathBuf,
    },

    /// Export a song document as a complete Lua program
    Export {
        /// Song JSON document
        input: PathBuf,

        /// Output .lua file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the frames an instrument produces
    Inspect {
        /// Instrument JSON document
        input: PathBuf,

        #[command(flatten)]
        pitch: Pitch,

        /// Number of frames to print
        #[arg(long, default_value_t = 32)]
        frames: u32,
    },

    /// Render one instrument note to WAV
    Render {
        /// Instrument JSON document
        input: PathBuf,

        /// Output .wav file
        #[arg(long)]
        wav: PathBuf,

        #[command(flatten)]
        pitch: Pitch,

        /// Length in seconds
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,

        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
    },

    /// Render a song to WAV
    RenderSong {
        /// Song JSON document
        input: PathBuf,

        /// Output .wav file
        #[arg(long)]
        wav: PathBuf,

        /// Length in seconds (default: one pass through the positions)
        #[arg(long)]
        seconds: Option<f64>,
    },

    /// Play one instrument note on the default output device
    Play {
        /// Instrument JSON document
        input: PathBuf,

        #[command(flatten)]
        pitch: Pitch,

        /// Length in seconds
        #[arg(long, default_value_t = 2.0)]
        seconds: f64,
    },

    /// Play a song on the default output device
    PlaySong {
        /// Song JSON document
        input: PathBuf,

        /// Length in seconds (default: one pass through the positions)
        #[arg(long)]
        seconds: Option<f64>,
    },
}

#[derive(Args)]
struct Pitch {
    /// Note name, e.g. A-5 (440 Hz)
    #[arg(long, conflicts_with = "freq")]
    note: Option<String>,

    /// Frequency in Hz
    #[arg(long)]
    freq: Option<f64>,
}

impl Pitch {
    fn frequency(&self) -> Result<f64> {
        match (&self.note, self.freq) {
            (Some(name), _) => match parse_note(name) {
                Some(note) => Ok(note_frequency(note)),
                None => bail!("unknown note {name:?}"),
            },
            (None, Some(freq)) if freq > 0.0 && freq.is_finite() => Ok(freq),
            (None, Some(freq)) => bail!("frequency must be positive, got {freq}"),
            (None, None) => Ok(440.0),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Emit { input } => {
            let ctrl = instrument_controller(&input)?;
            println!("{}", ctrl.export_instrument_lua(PREVIEW_SLOT)?);
        }
        Commands::Export { input, output } => {
            let ctrl = song_controller(&input)?;
            let lua = ctrl.export_lua()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, lua)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Wrote {}", path.display());
                }
                None => print!("{lua}"),
            }
        }
        Commands::Inspect { input, pitch, frames } => {
            let instrument = read_instrument(&input)?;
            inspect(&instrument, pitch.frequency()?, frames);
        }
        Commands::Render { input, wav, pitch, seconds, sample_rate } => {
            let ctrl = instrument_controller(&input)?;
            let settings = RenderSettings { sample_rate, seconds, ..RenderSettings::default() };
            let samples = ctrl.render_instrument(PREVIEW_SLOT, pitch.frequency()?, &settings)?;
            write_wav_file(&ctrl, &samples, &settings, &wav)?;
        }
        Commands::RenderSong { input, wav, seconds } => {
            let ctrl = song_controller(&input)?;
            print!("{}", SongUsage::scan(ctrl.song()));
            let settings = RenderSettings {
                seconds: seconds.unwrap_or_else(|| song_seconds(ctrl.song())),
                ..RenderSettings::default()
            };
            let samples = ctrl.render_song(&settings)?;
            write_wav_file(&ctrl, &samples, &settings, &wav)?;
        }
        Commands::Play { input, pitch, seconds } => {
            let mut ctrl = instrument_controller(&input)?;
            ctrl.play_instrument(PREVIEW_SLOT, pitch.frequency()?)?;
            wait_for(&mut ctrl, seconds);
        }
        Commands::PlaySong { input, seconds } => {
            let mut ctrl = song_controller(&input)?;
            print!("{}", SongUsage::scan(ctrl.song()));
            let seconds = seconds.unwrap_or_else(|| song_seconds(ctrl.song()));
            ctrl.play_song()?;
            wait_for(&mut ctrl, seconds);
        }
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_instrument(path: &Path) -> Result<Instrument> {
    ts_formats::instrument_from_json(&read_document(path)?)
        .with_context(|| format!("invalid instrument document {}", path.display()))
}

fn instrument_controller(path: &Path) -> Result<Controller> {
    let mut ctrl = Controller::new();
    ctrl.load_instrument(PREVIEW_SLOT, read_instrument(path)?)?;
    Ok(ctrl)
}

fn song_controller(path: &Path) -> Result<Controller> {
    let song = ts_formats::song_from_json(&read_document(path)?)
        .with_context(|| format!("invalid song document {}", path.display()))?;
    tracing::info!(title = %song.title, length = song.length, speed = song.speed, "loaded song");
    Ok(Controller::with_song(song))
}

fn song_seconds(song: &Song) -> f64 {
    song.total_frames() as f64 / FRAME_RATE as f64
}

fn inspect(instrument: &Instrument, frequency: f64, frames: u32) {
    println!("{:>5}  {:>6}  {:>3}  waveform", "frame", "freq", "vol");
    for frame in 0..frames {
        let data = instrument.frame_at(frame, frequency);
        let waveform = if data.is_noise() {
            "(noise)".to_string()
        } else {
            waveform_to_letters(&data.waveform)
        };
        println!("{:>5}  {:>6}  {:>3}  {}", frame, data.frequency, data.volume, waveform);
    }
}

fn write_wav_file(
    ctrl: &Controller,
    samples: &[f32],
    settings: &RenderSettings,
    path: &Path,
) -> Result<()> {
    let wav = ctrl.render_to_wav(samples, settings);
    std::fs::write(path, wav).with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "Wrote {} ({:.2}s at {} Hz)",
        path.display(),
        samples.len() as f64 / settings.sample_rate as f64,
        settings.sample_rate
    );
    Ok(())
}

fn wait_for(ctrl: &mut Controller, seconds: f64) {
    println!("Playing...");
    let deadline = std::time::Instant::now() + Duration::from_secs_f64(seconds.clamp(0.0, 86_400.0));
    while ctrl.is_playing() && std::time::Instant::now() < deadline {
        if let Some(frame) = ctrl.current_frame() {
            print!("\rFrame: {frame:>6}");
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    ctrl.stop();
    println!("\rDone.          ");
}
