//! Song documents exported as Lua programs.

use ts_formats::{song_from_json, PLAYER_CODE};
use ts_master::{Controller, RenderSettings};

const SONG: &str = r#"{
    "title": "demo",
    "instruments": {
        "3": {"name": "bass", "waveType": "square", "decaySpeed": 0},
        "7": {"name": "hat", "waveType": "noise", "decaySpeed": 32},
        "12": {"name": "unused", "waveType": "sine"}
    },
    "patterns": {
        "0": [[["C-3", 3], null, null, ["C-6", 7]]],
        "5": [[], [], [null, ["E-4", 3]]],
        "9": [[null, null, [49]]],
        "20": [[["A-5", 12]]]
    },
    "positions": [0, 5, 9, 5, 0],
    "speed": 4
}"#;

fn table<'a>(lua: &'a str, name: &str) -> Vec<&'a str> {
    let start = lua.find(&format!("{name}={{\n")).unwrap();
    lua[start..]
        .lines()
        .skip(1)
        .take_while(|line| *line != "}")
        .collect()
}

#[test]
fn export_compacts_song() {
    let ctrl = Controller::with_song(song_from_json(SONG).unwrap());
    let lua = ctrl.export_lua().unwrap();

    let functions: Vec<&str> = lua.matches("function (c,v,f,t)").collect();
    assert_eq!(functions.len(), 2);
    let bass = lua.find("  -- bass\n").unwrap();
    let hat = lua.find("  -- hat\n").unwrap();
    assert!(bass < hat);
    assert!(!lua.contains("-- unused"));

    assert_eq!(table(&lua, "patterns").len(), 3);
    assert!(lua.contains("\npositions={1,2,3,2,1}\nsong_speed=4\n\n"));
    assert!(lua.ends_with(PLAYER_CODE));
}

#[test]
fn exported_cells_use_new_numbers() {
    let lua = Controller::with_song(song_from_json(SONG).unwrap()).export_lua().unwrap();
    let patterns = table(&lua, "patterns");

    // C-3 = 25, C-6 = 61, E-4 = 41
    assert!(patterns[0].starts_with("{{{25,1},{0,0},"));
    assert!(patterns[0].contains("}},{{0,0},"));
    assert!(patterns[0].contains("{{61,2},{0,0},"));
    assert!(patterns[1].contains("{{0,0},{0,0},{41,1},{0,0},"));
    assert!(patterns[2].contains("{{49,0},"));
    for line in &patterns {
        assert!(!line.contains(",3}") && !line.contains(",7}") && !line.contains(",12}"));
    }
}

#[test]
fn player_snippet_is_shared() {
    let one = Controller::with_song(song_from_json(r#"{"positions": [1]}"#).unwrap())
        .export_lua()
        .unwrap();
    let two = Controller::with_song(song_from_json(SONG).unwrap()).export_lua().unwrap();
    let tail = |lua: &str| lua[lua.find("note_freqs={}").unwrap()..].to_string();
    assert_eq!(tail(&one), tail(&two));
    assert_eq!(tail(&one), PLAYER_CODE);
}

#[test]
fn song_renders_for_one_pass() {
    let ctrl = Controller::with_song(song_from_json(SONG).unwrap());
    let song = ctrl.song();
    assert_eq!(song.total_frames(), 5 * 64 * 4);

    let settings = RenderSettings {
        sample_rate: 6000,
        seconds: song.total_frames() as f64 / 60.0,
        ..RenderSettings::default()
    };
    let samples = ctrl.render_song(&settings).unwrap();
    assert_eq!(samples.len(), 128_000);
    assert!(samples[..100].iter().any(|&s| s != 0.0));
}
