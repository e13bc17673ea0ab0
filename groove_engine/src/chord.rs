// Chord qualities and abstract chords.
//
// `ChordQuality` is the closed set of qualities the engine understands, each
// with its chord-tone intervals above the root. A `Chord` is a root pitch,
// a quality, and a raw voicing (absolute MIDI pitches, root first). The raw
// voicing is what the voicing engine (voicing.rs) reshapes for an
// instrument; it either comes from a harmonic-context update's hint or is
// stacked from `intervals()`.

use crate::error::{GrooveError, Result};
use crate::pool::pitch_class_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major7,
    Minor7,
    Dominant7,
    Minor7Flat5,
    Diminished7,
    Major9,
    Minor9,
    Dominant9,
    Eleventh,
    Thirteenth,
    Dominant7Flat9,
    Dominant7Sharp9,
    Dominant7Sharp11,
    Altered,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 20] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::Dominant7,
        ChordQuality::Minor7Flat5,
        ChordQuality::Diminished7,
        ChordQuality::Major9,
        ChordQuality::Minor9,
        ChordQuality::Dominant9,
        ChordQuality::Eleventh,
        ChordQuality::Thirteenth,
        ChordQuality::Dominant7Flat9,
        ChordQuality::Dominant7Sharp9,
        ChordQuality::Dominant7Sharp11,
        ChordQuality::Altered,
    ];

    /// Semitones above the root for each chord tone, root (0) first.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Minor7Flat5 => &[0, 3, 6, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::Major9 => &[0, 4, 7, 11, 14],
            ChordQuality::Minor9 => &[0, 3, 7, 10, 14],
            ChordQuality::Dominant9 => &[0, 4, 7, 10, 14],
            ChordQuality::Eleventh => &[0, 4, 7, 10, 14, 17],
            ChordQuality::Thirteenth => &[0, 4, 7, 10, 14, 21],
            ChordQuality::Dominant7Flat9 => &[0, 4, 7, 10, 13],
            ChordQuality::Dominant7Sharp9 => &[0, 4, 7, 10, 15],
            ChordQuality::Dominant7Sharp11 => &[0, 4, 7, 10, 18],
            // Root, third, sharp five, flat seven, flat nine.
            ChordQuality::Altered => &[0, 4, 8, 10, 13],
        }
    }

    /// Canonical chord-symbol suffix.
    pub fn symbol(self) -> &'static str {
        match self {
            ChordQuality::Major => "maj",
            ChordQuality::Minor => "min",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "min7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7Flat5 => "min7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Major9 => "maj9",
            ChordQuality::Minor9 => "min9",
            ChordQuality::Dominant9 => "9",
            ChordQuality::Eleventh => "11",
            ChordQuality::Thirteenth => "13",
            ChordQuality::Dominant7Flat9 => "7b9",
            ChordQuality::Dominant7Sharp9 => "7#9",
            ChordQuality::Dominant7Sharp11 => "7#11",
            ChordQuality::Altered => "7alt",
        }
    }

    /// Alternate spellings accepted by `FromStr`.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            ChordQuality::Major => &["", "major", "M"],
            ChordQuality::Minor => &["m", "minor", "-"],
            ChordQuality::Diminished => &["°", "o"],
            ChordQuality::Augmented => &["+"],
            ChordQuality::Major7 => &["M7", "Δ", "Δ7", "major7"],
            ChordQuality::Minor7 => &["m7", "-7", "minor7"],
            ChordQuality::Dominant7 => &["dom7", "dominant7"],
            ChordQuality::Minor7Flat5 => &["m7b5", "ø", "ø7", "half-diminished"],
            ChordQuality::Diminished7 => &["°7", "o7"],
            ChordQuality::Major9 => &["M9"],
            ChordQuality::Minor9 => &["m9", "-9"],
            ChordQuality::Dominant9 => &["dom9"],
            ChordQuality::Eleventh => &["dom11"],
            ChordQuality::Thirteenth => &["dom13"],
            ChordQuality::Altered => &["alt"],
            _ => &[],
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ChordQuality {
    type Err = GrooveError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ChordQuality::ALL
            .iter()
            .copied()
            .find(|q| q.symbol() == s || q.aliases().contains(&s))
            .ok_or_else(|| GrooveError::UnknownChordQuality(s.to_string()))
    }
}

/// Render a chord symbol such as "Amaj7" or "B♭min7".
pub fn chord_symbol(root_pc: u8, quality: ChordQuality, prefer_flats: bool) -> String {
    format!("{}{}", pitch_class_name(root_pc, prefer_flats), quality.symbol())
}

/// An abstract chord before instrument voicing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    /// MIDI pitch of the root.
    pub root: u8,
    pub quality: ChordQuality,
    /// Raw voicing, absolute pitches. May be empty, in which case the
    /// voicing engine substitutes a major triad on the root.
    pub voicing: Vec<u8>,
}

impl Chord {
    /// Stack the quality's intervals on `root`. Tones above 127 are dropped.
    pub fn new(root: u8, quality: ChordQuality) -> Self {
        let voicing = quality
            .intervals()
            .iter()
            .map(|&iv| root as u16 + iv as u16)
            .filter(|&p| p <= 127)
            .map(|p| p as u8)
            .collect();
        Chord { root, quality, voicing }
    }

    /// Use an explicit voicing hint instead of the stacked intervals.
    pub fn with_voicing(root: u8, quality: ChordQuality, voicing: Vec<u8>) -> Self {
        Chord { root, quality, voicing }
    }

    pub fn root_pitch_class(&self) -> u8 {
        self.root % 12
    }

    /// Pitch classes of the chord tones (from the quality, not the voicing).
    pub fn tone_pitch_classes(&self) -> Vec<u8> {
        self.quality
            .intervals()
            .iter()
            .map(|&iv| (self.root_pitch_class() + iv) % 12)
            .collect()
    }

    pub fn symbol(&self, prefer_flats: bool) -> String {
        chord_symbol(self.root_pitch_class(), self.quality, prefer_flats)
    }
}
