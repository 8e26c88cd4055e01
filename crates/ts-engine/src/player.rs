//! Frame-accurate song sequencing.
//!
//! Mirrors the player routine shipped with exported songs, so a preview
//! in the host and the exported program step through rows, positions and
//! instrument frames identically.

use ts_ir::{
    note_frequency, round_half_up, ChannelFrames, Song, CHANNEL_COUNT, PATTERN_ROWS,
};

use crate::source::FrameSource;

/// Sequencing state for one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerChannel {
    /// Instrument slot (0 = none yet)
    pub instrument: u8,
    /// Frames since the last note
    pub frame: u32,
    /// Frequency of the last note, rounded to whole Hz
    pub frequency: f64,
}

impl Default for PlayerChannel {
    fn default() -> Self {
        Self { instrument: 0, frame: 0, frequency: 440.0 }
    }
}

/// Walks a song's position list row by row, one frame per tick.
#[derive(Clone, Debug, Default)]
pub struct SongPlayer {
    row_frame: u8,
    row: u16,
    position: u16,
    pattern: Option<u8>,
    channels: [PlayerChannel; CHANNEL_COUNT],
}

impl SongPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the first position with every channel silent.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Bind to a song as a frame source.
    pub fn frames<'a>(&'a mut self, song: &'a Song) -> SongFrames<'a> {
        SongFrames { player: self, song }
    }

    /// Current position list index.
    pub fn position(&self) -> u16 {
        self.position
    }

    /// Next row to be read.
    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn channel(&self, index: usize) -> Option<&PlayerChannel> {
        self.channels.get(index)
    }

    /// Advance one frame and return each channel's frame data.
    pub fn tick(&mut self, song: &Song) -> ChannelFrames {
        if self.row_frame == 0 {
            self.read_row(song);
        }
        self.row_frame = (self.row_frame + 1) % song.speed.max(1);

        let mut frames = [None; CHANNEL_COUNT];
        for (channel, out) in self.channels.iter_mut().zip(frames.iter_mut()) {
            if channel.instrument == 0 {
                continue;
            }
            if let Ok(instrument) = song.instrument(channel.instrument) {
                *out = Some(instrument.frame_at(channel.frame, channel.frequency));
            }
            channel.frame = channel.frame.saturating_add(1);
        }
        frames
    }

    fn fetch_position(&mut self, song: &Song) {
        let positions = song.active_positions();
        self.pattern = positions.get(self.position as usize).copied();
        self.row = 0;
    }

    fn read_row(&mut self, song: &Song) {
        if self.pattern.is_none() {
            self.fetch_position(song);
        }
        if let Some(pattern) = self.pattern.and_then(|p| song.patterns.get(p as usize)) {
            for (channel, cell) in self.channels.iter_mut().zip(pattern.row(self.row)) {
                if cell.note == 0 {
                    continue;
                }
                if cell.instrument != 0 {
                    channel.instrument = cell.instrument;
                }
                channel.frame = 0;
                channel.frequency = round_half_up(note_frequency(cell.note));
            }
        }

        self.row += 1;
        if self.row == PATTERN_ROWS {
            let count = song.active_positions().len().max(1) as u16;
            self.position = (self.position + 1) % count;
            self.fetch_position(song);
        }
    }
}

/// A [`SongPlayer`] bound to the song it plays.
pub struct SongFrames<'a> {
    player: &'a mut SongPlayer,
    song: &'a Song,
}

impl FrameSource for SongFrames<'_> {
    fn next_frame(&mut self, _frame: u32) -> ChannelFrames {
        self.player.tick(self.song)
    }
}
