// Chord voicing for an instrument.
//
// Turns an abstract chord (root + raw voicing) into absolute pitches an
// instrument can play, in three passes:
//
// 1. Note-count reduction. When the instrument wants fewer notes than the
//    raw voicing has, keep raw positions 0, 1 and 3 (root, third, seventh)
//    where present. The rule is fixed: on five-note chords it drops the
//    fifth and everything above the seventh.
// 2. Spread, on every note but the first (the root):
//    - close:  fold into [root, root + 12]
//    - sparse: raise by octaves until at least a fifth above the root
//    - wide:   raise the i-th upper note by i octaves
// 3. Range. Fold each note by octaves into [min_note, max_note], clamping
//    to the nearer bound when the range is too narrow to hold it.
//
// A chord without a raw voicing is voiced as a major triad on its root.
//
// See also: `instrument.rs` for the profiles, `performer.rs` which re-voices
// on every chord update.

use crate::chord::Chord;
use crate::controls::Spread;
use crate::instrument::InstrumentStyleProfile;

/// Raw positions kept by the note-count reduction.
const REDUCED_POSITIONS: [usize; 3] = [0, 1, 3];

/// Voice `chord` for `profile`. Output order follows the raw voicing.
pub fn voice(chord: &Chord, profile: &InstrumentStyleProfile) -> Vec<u8> {
    let raw: Vec<i32> = if chord.voicing.is_empty() {
        let root = chord.root as i32;
        vec![root, root + 4, root + 7]
    } else {
        chord.voicing.iter().map(|&p| p as i32).collect()
    };

    let reduced = reduce(&raw, profile.voicing_note_count);
    let spread = apply_spread(&reduced, profile.voicing_spread);
    spread
        .into_iter()
        .map(|n| fold_into_range(n, profile.min_note as i32, profile.max_note as i32) as u8)
        .collect()
}

/// Keep positions {0, 1, 3} when `count` is smaller than the voicing.
pub fn reduce(notes: &[i32], count: usize) -> Vec<i32> {
    if count >= notes.len() {
        return notes.to_vec();
    }
    REDUCED_POSITIONS
        .iter()
        .filter_map(|&i| notes.get(i).copied())
        .collect()
}

/// Respace every note after the first relative to it.
pub fn apply_spread(notes: &[i32], spread: Spread) -> Vec<i32> {
    let Some(&root) = notes.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(notes.len());
    out.push(root);
    for (i, &note) in notes.iter().enumerate().skip(1) {
        let mut n = note;
        match spread {
            Spread::Close => {
                while n > root + 12 {
                    n -= 12;
                }
                while n < root {
                    n += 12;
                }
            }
            Spread::Sparse => {
                while n < root + 7 {
                    n += 12;
                }
            }
            Spread::Wide => n += i as i32 * 12,
        }
        out.push(n);
    }
    out
}

/// Octave-fold `note` into `[low, high]`; clamp if no octave fits.
pub fn fold_into_range(note: i32, low: i32, high: i32) -> i32 {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let mut n = note;
    while n > high {
        n -= 12;
    }
    while n < low {
        n += 12;
    }
    if n > high {
        // Range narrower than an octave and no octave of the note lands in
        // it: take whichever bound is closer.
        let below = n - 12;
        if low - below < n - high { low } else { high }
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordQuality;
    use crate::instrument::InstrumentStyle;
    use crate::controls::NamedControl;

    fn profile(count: usize, spread: Spread, min: u8, max: u8) -> InstrumentStyleProfile {
        InstrumentStyleProfile {
            voicing_note_count: count,
            voicing_spread: spread,
            min_note: min,
            max_note: max,
            base_velocity: 90,
            sustain_ms: 400.0,
        }
    }

    #[test]
    fn test_reduction_keeps_root_third_seventh() {
        let chord = Chord::with_voicing(60, ChordQuality::Major7, vec![60, 64, 67, 71]);
        assert_eq!(voice(&chord, &profile(3, Spread::Close, 48, 84)), vec![60, 64, 71]);
    }

    #[test]
    fn test_reduction_drops_fifth_of_ninth_chord() {
        assert_eq!(reduce(&[60, 64, 67, 70, 74], 4), vec![60, 64, 70]);
        assert_eq!(reduce(&[60, 64], 1), vec![60, 64]);
        assert_eq!(reduce(&[60, 64, 67], 3), vec![60, 64, 67]);
    }

    #[test]
    fn test_wide_spread() {
        assert_eq!(apply_spread(&[60, 64, 67], Spread::Wide), vec![60, 76, 91]);
    }

    #[test]
    fn test_close_spread_folds_into_octave() {
        assert_eq!(apply_spread(&[60, 76, 91, 50], Spread::Close), vec![60, 64, 67, 62]);
        assert_eq!(apply_spread(&[60, 72], Spread::Close), vec![60, 72]);
    }

    #[test]
    fn test_sparse_spread_opens_voicing() {
        assert_eq!(apply_spread(&[60, 64, 67, 71], Spread::Sparse), vec![60, 76, 67, 71]);
        assert!(apply_spread(&[], Spread::Sparse).is_empty());
    }

    #[test]
    fn test_empty_voicing_is_major_triad() {
        let chord = Chord::with_voicing(62, ChordQuality::Minor7, Vec::new());
        assert_eq!(voice(&chord, &profile(4, Spread::Close, 48, 84)), vec![62, 66, 69]);
    }

    #[test]
    fn test_output_always_in_range() {
        for &style in InstrumentStyle::ALL {
            let p = style.profile();
            for root in 24..=100u8 {
                for q in ChordQuality::ALL {
                    let voiced = voice(&Chord::new(root, q), &p);
                    assert!(
                        voiced.iter().all(|&n| (p.min_note..=p.max_note).contains(&n)),
                        "{style:?} {root} {q}: {voiced:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_narrow_range_clamps_to_nearer_bound() {
        assert_eq!(fold_into_range(66, 60, 63), 63);
        assert_eq!(fold_into_range(70, 60, 63), 60);
        assert_eq!(fold_into_range(85, 60, 63), 61);
        assert_eq!(fold_into_range(50, 48, 84), 50);
        assert_eq!(fold_into_range(100, 48, 84), 76);
    }
}
