// MIDI file rendering of a performance.
//
// Offline sound output: takes the notes a `CollectingOutput` gathered (each
// with its absolute start time in ms) and writes a Standard MIDI File,
// Format 1. Track 0 carries the tempo; every part gets its own track and
// channel, with a General MIDI program chosen from its instrument style.
//
// Times convert at a constant tempo, ms -> ticks at 480 ticks per quarter.
// Overlapping notes of the same pitch are written as-is; players treat each
// note-off as ending the oldest sounding instance.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{GrooveError, Result};
use crate::instrument::InstrumentStyle;
use crate::output::PlayedNote;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// One track's worth of notes.
#[derive(Debug, Clone, Copy)]
pub struct MidiPart<'a> {
    pub name: &'a str,
    pub instrument: InstrumentStyle,
    pub notes: &'a [PlayedNote],
}

/// General MIDI program for an instrument style.
pub fn gm_program(instrument: InstrumentStyle) -> u8 {
    match instrument {
        InstrumentStyle::Piano => 0,
        InstrumentStyle::Rhodes => 4,
        InstrumentStyle::Guitar => 25,
        InstrumentStyle::Strings => 48,
        InstrumentStyle::Pad => 89,
        InstrumentStyle::Organ => 16,
    }
}

/// Render `parts` and write them to `path`.
pub fn write_midi(parts: &[MidiPart<'_>], tempo_bpm: f64, path: &Path) -> Result<()> {
    let smf = parts_to_smf(parts, tempo_bpm);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .and_then(|()| std::fs::write(path, &buf))
        .map_err(|source| GrooveError::MidiWrite {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("wrote {} bytes of MIDI to {}", buf.len(), path.display());
    Ok(())
}

fn ms_to_ticks(ms: f64, tempo_bpm: f64) -> u32 {
    (ms.max(0.0) * tempo_bpm * TICKS_PER_QUARTER as f64 / 60_000.0).round() as u32
}

/// Convert parts to an in-memory SMF.
fn parts_to_smf<'a>(parts: &[MidiPart<'a>], tempo_bpm: f64) -> Smf<'a> {
    let tempo_bpm = if tempo_bpm.is_finite() && tempo_bpm > 0.0 { tempo_bpm } else { 120.0 };
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let tempo_microseconds = (60_000_000.0 / tempo_bpm).round() as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds.min(0xff_ffff)))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    for (pi, part) in parts.iter().enumerate() {
        // Skip the percussion channel.
        let channel = u4::new(match pi % 15 {
            c if c >= 9 => c as u8 + 1,
            c => c as u8,
        });
        let mut track: Track<'a> = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(part.name.as_bytes())),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange {
                        program: u7::new(gm_program(part.instrument)),
                    },
                },
            },
        ];

        // (tick, is_on, pitch, velocity); offs sort before ons at the same
        // tick so a repeated pitch re-strikes cleanly.
        let mut events: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(part.notes.len() * 2);
        for note in part.notes {
            let start = ms_to_ticks(note.at_ms, tempo_bpm);
            let end = ms_to_ticks(note.at_ms + note.event.duration_ms, tempo_bpm).max(start + 1);
            let pitch = note.event.pitch.min(127);
            events.push((start, true, pitch, note.event.velocity.clamp(1, 127)));
            events.push((end, false, pitch, 0));
        }
        events.sort_by_key(|&(tick, on, pitch, _)| (tick, on, pitch));

        let mut last_tick = 0;
        for (tick, on, pitch, velocity) in events {
            let message = if on {
                MidiMessage::NoteOn {
                    key: u7::new(pitch),
                    vel: u7::new(velocity),
                }
            } else {
                MidiMessage::NoteOff {
                    key: u7::new(pitch),
                    vel: u7::new(0),
                }
            };
            track.push(TrackEvent {
                delta: u28::new(tick - last_tick),
                kind: TrackEventKind::Midi { channel, message },
            });
            last_tick = tick;
        }

        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
    }

    smf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NoteEvent;

    fn played(at_ms: f64, pitch: u8, duration_ms: f64) -> PlayedNote {
        PlayedNote {
            at_ms,
            event: NoteEvent {
                pitch,
                velocity: 90,
                duration_ms,
                scheduled_offset_ms: 0.0,
            },
        }
    }

    fn note_ons(track: &Track<'_>) -> Vec<(u32, u8)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for ev in track {
            tick += ev.delta.as_int();
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } = ev.kind
            {
                out.push((tick, key.as_int()));
            }
        }
        out
    }

    #[test]
    fn test_parts_to_smf_layout() {
        let chords = [played(0.0, 60, 500.0), played(0.0, 64, 500.0)];
        let melody = [played(250.0, 72, 250.0)];
        let parts = [
            MidiPart { name: "Chords", instrument: InstrumentStyle::Piano, notes: &chords },
            MidiPart { name: "Melody", instrument: InstrumentStyle::Strings, notes: &melody },
        ];
        let smf = parts_to_smf(&parts, 120.0);
        // 1 tempo track + 2 parts
        assert_eq!(smf.tracks.len(), 3);
        assert_eq!(note_ons(&smf.tracks[1]), vec![(0, 60), (0, 64)]);
        // 250 ms at 120 BPM is an eighth note.
        assert_eq!(note_ons(&smf.tracks[2]), vec![(240, 72)]);
    }

    #[test]
    fn test_written_file_parses_back() {
        let notes: Vec<PlayedNote> = (0..8).map(|i| played(i as f64 * 125.0, 60 + i as u8, 100.0)).collect();
        let parts = [MidiPart { name: "Piano", instrument: InstrumentStyle::Piano, notes: &notes }];
        let path = std::env::temp_dir().join(format!("groove_midi_test_{}.mid", std::process::id()));
        write_midi(&parts, 96.0, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(note_ons(&smf.tracks[1]).len(), 8);
    }

    #[test]
    fn test_ms_to_ticks() {
        assert_eq!(ms_to_ticks(500.0, 120.0), 480);
        assert_eq!(ms_to_ticks(-20.0, 120.0), 0);
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let err = write_midi(&[], 120.0, Path::new("/nonexistent/dir/out.mid")).unwrap_err();
        assert!(matches!(err, GrooveError::MidiWrite { .. }));
    }
}
