// Modal harmonization tables.
//
// Each of the seven diatonic modes harmonizes its degrees with a fixed set of
// seventh-chord qualities (stacked thirds within the mode). `quality_for`
// is a pure lookup into those tables; "major" and "minor" are accepted as
// names for Ionian and Aeolian, and any other unknown name falls back to
// Ionian with a warning (see `controls::NamedControl`).
//
// Locrian degree 7 is half-diminished (min7b5), the same quality as its
// degree 1.
//
// Used by harmony.rs to turn a selected degree into a chord.

use crate::chord::ChordQuality;
use crate::controls::NamedControl;
use serde::{Deserialize, Serialize};

const MAJ7: ChordQuality = ChordQuality::Major7;
const MIN7: ChordQuality = ChordQuality::Minor7;
const DOM7: ChordQuality = ChordQuality::Dominant7;
const HALFDIM: ChordQuality = ChordQuality::Minor7Flat5;

/// The seven diatonic modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Mode {
    /// Major: 1 2 3 4 5 6 7
    Ionian,
    /// Minor with raised 6th
    Dorian,
    /// Minor with lowered 2nd
    Phrygian,
    /// Major with raised 4th
    Lydian,
    /// Major with lowered 7th
    Mixolydian,
    /// Natural minor
    Aeolian,
    /// Diminished 5th above the final
    Locrian,
}

impl Mode {
    /// Semitone intervals from the final to each scale degree 1-7.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    /// Seventh-chord quality on each degree 1-7.
    pub fn harmonization(self) -> [ChordQuality; 7] {
        match self {
            Mode::Ionian => [MAJ7, MIN7, MIN7, MAJ7, DOM7, MIN7, HALFDIM],
            Mode::Dorian => [MIN7, MIN7, MAJ7, DOM7, MIN7, HALFDIM, MAJ7],
            Mode::Phrygian => [MIN7, MAJ7, DOM7, MIN7, HALFDIM, MAJ7, MIN7],
            Mode::Lydian => [MAJ7, DOM7, MIN7, HALFDIM, MAJ7, MIN7, MIN7],
            Mode::Mixolydian => [DOM7, MIN7, HALFDIM, MAJ7, MIN7, MIN7, MAJ7],
            Mode::Aeolian => [MIN7, HALFDIM, MAJ7, MIN7, MIN7, MAJ7, DOM7],
            Mode::Locrian => [HALFDIM, MAJ7, MIN7, MIN7, MAJ7, DOM7, HALFDIM],
        }
    }
}

impl NamedControl for Mode {
    const ALL: &'static [Self] = &[
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];
    const FALLBACK: Self = Mode::Ionian;
    const KIND: &'static str = "mode";

    fn name(self) -> &'static str {
        match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Mode::Ionian => &["major"],
            Mode::Aeolian => &["minor"],
            _ => &[],
        }
    }
}

impl From<String> for Mode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Chord quality for a 1-based degree in `mode`.
///
/// Degrees above 7 (pools larger than seven notes) wrap around the table;
/// degree 0 is read as degree 1.
pub fn quality_for(degree: u8, mode: Mode) -> ChordQuality {
    let index = (degree.max(1) as usize - 1) % 7;
    mode.harmonization()[index]
}
