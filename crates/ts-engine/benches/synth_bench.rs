use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ts_engine::{FrameSynthesizer, NotePreview, SongPlayer};
use ts_ir::{Cell, Instrument, Song, WaveType};

fn preview_block(c: &mut Criterion) {
    let mut inst = Instrument::default();
    inst.wave_type = WaveType::Triangle;
    inst.harmonics = [1.0, 0.5, 0.25, 0.0, 0.1, 0.0, 0.0, 0.3];
    inst.phase_min = 4;
    inst.phase_max = 28;
    inst.decay_speed = 0;

    let mut synth = FrameSynthesizer::new(44100);
    let mut out = vec![0.0f32; 1024];
    c.bench_function("preview 1024 samples", |b| {
        b.iter(|| {
            let mut preview = NotePreview::new(&inst, 440.0);
            synth.generate(black_box(&mut out), Some(&mut preview));
        })
    });
}

fn song_block(c: &mut Criterion) {
    let mut song = Song::default();
    for channel in 0..4u8 {
        song.instrument_mut(channel + 1).unwrap().wave_type = WaveType::ALL[channel as usize];
        for row in (0..64).step_by(4) {
            *song.patterns[0].cell_mut(row, channel) = Cell {
                note: 30 + (row % 24) as u8,
                instrument: channel + 1,
            };
        }
    }

    let mut synth = FrameSynthesizer::new(44100);
    let mut player = SongPlayer::new();
    let mut out = vec![0.0f32; 1024];
    c.bench_function("song 1024 samples", |b| {
        b.iter(|| {
            synth.generate(black_box(&mut out), Some(&mut player.frames(&song)));
        })
    });
}

criterion_group!(benches, preview_block, song_block);
criterion_main!(benches);
