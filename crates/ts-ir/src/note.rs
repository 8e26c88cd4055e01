//! Note numbers, names and frequencies.
//!
//! Note 1 is `C-1` and note 96 is `B-8`; note 58 (`A-5`) is 440 Hz.

use arrayvec::ArrayString;

/// Semitone names within an octave.
pub const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Number of octaves on the note table.
const OCTAVE_COUNT: u8 = 8;

/// Highest note number (`B-8`).
pub const MAX_NOTE: u8 = OCTAVE_COUNT * 12;

/// Frequency of note `n` in Hz (equal temperament, note 58 = 440 Hz).
pub fn note_frequency(note: u8) -> f64 {
    440.0 * libm::pow(2.0, (note as f64 - 58.0) / 12.0)
}

/// Tracker name of a note, e.g. `C-4` or `F#2`. `None` for 0 and values
/// past `MAX_NOTE`.
pub fn note_name(note: u8) -> Option<ArrayString<3>> {
    if note == 0 || note > MAX_NOTE {
        return None;
    }
    let index = note as usize + 11;
    let octave = index / 12;
    let semitone = NOTE_NAMES[index % 12];
    let mut name = ArrayString::new();
    name.push_str(semitone);
    if semitone.len() == 1 {
        name.push('-');
    }
    name.push(char::from(b'0' + octave as u8));
    Some(name)
}

/// Parse a tracker note name (`C-4`, `c#4`). The inverse of [`note_name`].
pub fn parse_note(name: &str) -> Option<u8> {
    let bytes = name.as_bytes();
    if bytes.len() != 3 {
        return None;
    }
    let letter = bytes[0].to_ascii_uppercase() as char;
    let sharp = match bytes[1] {
        b'-' => false,
        b'#' => true,
        _ => return None,
    };
    let octave = match bytes[2] {
        b @ b'1'..=b'8' => b - b'0',
        _ => return None,
    };
    let semitone = NOTE_NAMES.iter().position(|n| {
        let n = n.as_bytes();
        n[0] as char == letter && (n.len() == 2) == sharp
    })?;
    Some(octave * 12 + semitone as u8 - 11)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a5_is_440() {
        assert_eq!(note_frequency(58), 440.0);
        assert_eq!(note_frequency(46), 220.0);
    }

    #[test]
    fn names_cover_the_table() {
        assert_eq!(note_name(1).unwrap().as_str(), "C-1");
        assert_eq!(note_name(2).unwrap().as_str(), "C#1");
        assert_eq!(note_name(58).unwrap().as_str(), "A-5");
        assert_eq!(note_name(MAX_NOTE).unwrap().as_str(), "B-8");
        assert_eq!(note_name(0), None);
        assert_eq!(note_name(97), None);
    }

    #[test]
    fn parse_inverts_name() {
        for note in 1..=MAX_NOTE {
            let name = note_name(note).unwrap();
            assert_eq!(parse_note(&name), Some(note), "{}", name);
        }
        assert_eq!(parse_note("c#4"), parse_note("C#4"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_note("H-4"), None);
        assert_eq!(parse_note("E#4"), None);
        assert_eq!(parse_note("C-9"), None);
        assert_eq!(parse_note("C4"), None);
    }
}
