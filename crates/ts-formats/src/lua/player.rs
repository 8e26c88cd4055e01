//! The fixed player routine appended to every exported song.
//!
//! Expects the globals `instruments`, `patterns`, `positions` and
//! `song_speed`. Note frequencies are rounded to whole Hz so that
//! instruments without frequency modifiers still write integral registers.

pub const PLAYER_CODE: &str = r#"note_freqs={}
for n=1,107 do
 note_freqs[n]=(440*2^((n-58)/12)+0.5)//1
end

chan_states={}
for i=0,3 do
 chan_states[i]={inst=0,iframe=0,nfreq=440}
end

row_frame=0
row_num=0
position_num=0
pattern_num=0

function fetch_position()
 pattern_num=positions[position_num+1]
 row_num=0
end

fetch_position()

function read_row()
 for c=0,3 do
  note=patterns[pattern_num][c+1][row_num+1]
  note_num=note[1]
  if note_num~=0 then
   chan=chan_states[c]
   inst=note[2]
   if inst~=0 then
    chan.inst=inst
   end
   chan.iframe=0
   chan.nfreq=note_freqs[note_num]
  end
 end
 row_num=row_num+1
 if row_num==64 then
  position_num=(position_num+1)%(#positions)
  fetch_position()
 end
end

function music_frame()
 if row_frame==0 then
  read_row()
 end
 row_frame=(row_frame+1)%song_speed
 for c=0,3 do
  chan=chan_states[c]
  if chan.inst~=0 then
   instruments[chan.inst](c,15,chan.nfreq,chan.iframe)
   chan.iframe=chan.iframe+1
  end
 end
end

function TIC()
 cls()
 music_frame()
end
"#;
