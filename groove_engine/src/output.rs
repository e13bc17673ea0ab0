// Note events and the sound-output boundary.
//
// The engine never talks to a synthesizer or a MIDI port. Everything it
// plays leaves through the `SoundOutput` trait as a `NoteEvent` plus the
// absolute time (ms since the performance started) it is due. Adapters on
// the far side decide what a note means: `CollectingOutput` keeps them in
// memory for tests and offline rendering (midi.rs).

use serde::{Deserialize, Serialize};

/// A single note handed to the sound output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch, 0-127.
    pub pitch: u8,
    /// 30-127 once humanized; never silent.
    pub velocity: u8,
    pub duration_ms: f64,
    /// Signed humanization offset relative to the grid time. Negative
    /// offsets are kept here but played on the grid.
    pub scheduled_offset_ms: f64,
}

pub trait SoundOutput {
    /// Play `event` at `at_ms` (performance time, milliseconds).
    fn play(&mut self, at_ms: f64, event: NoteEvent);
}

/// A note as it was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayedNote {
    pub at_ms: f64,
    pub event: NoteEvent,
}

/// Records every note in delivery order.
#[derive(Debug, Clone, Default)]
pub struct CollectingOutput {
    pub notes: Vec<PlayedNote>,
}

impl CollectingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl SoundOutput for CollectingOutput {
    fn play(&mut self, at_ms: f64, event: NoteEvent) {
        self.notes.push(PlayedNote { at_ms, event });
    }
}
