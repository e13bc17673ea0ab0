// Pitch-class pools and scale-degree arithmetic.
//
// A pool is the set of pitch classes available to harmony and melody,
// identified by a key-signature label: "0" (no accidentals), "1♯".."7♯",
// "1♭".."7♭" (ASCII "3#" / "3b" are accepted too). Each label maps to the
// major-scale collection of that signature, so "3♯" is {C♯ D E F♯ G♯ A B}.
//
// Scale degrees are relative to a tonic that must belong to the pool: sort the
// pool's pitch classes by ascending interval above the tonic and number them
// from 1. A pool need not have seven members, so degrees run 1..=len.
//
// A tonic outside its pool is a hard error (`GrooveError::TonicNotInPool`);
// `scale_degree` reports the same situation as degree 0 for callers that
// only want a lookup.
//
// See also: `harmony.rs` (walks degrees), `melody.rs` (draws pool notes),
// `mode.rs` (modal chord qualities per degree).

use crate::error::{GrooveError, Result};
use serde::{Deserialize, Serialize};

/// Semitone offsets of the major scale, used to build the signature pools.
const MAJOR_STEPS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Every label `Pool::from_key` understands, in circle-of-fifths order.
pub const POOL_KEYS: [&str; 15] = [
    "7♭", "6♭", "5♭", "4♭", "3♭", "2♭", "1♭", "0", "1♯", "2♯", "3♯", "4♯", "5♯", "6♯", "7♯",
];

const SHARP_NAMES: [&str; 12] = ["C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B"];
const FLAT_NAMES: [&str; 12] = ["C", "D♭", "D", "E♭", "E", "F", "G♭", "G", "A♭", "A", "B♭", "B"];

/// Semitones from `tonic` up to `pc`, in 0..12.
pub fn interval_from(tonic: u8, pc: u8) -> u8 {
    (pc % 12 + 12 - tonic % 12) % 12
}

/// Note name for a pitch class.
pub fn pitch_class_name(pc: u8, prefer_flats: bool) -> &'static str {
    if prefer_flats {
        FLAT_NAMES[(pc % 12) as usize]
    } else {
        SHARP_NAMES[(pc % 12) as usize]
    }
}

/// An ordered set of unique pitch classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Ascending, unique, each < 12. Never empty.
    pitch_classes: Vec<u8>,
    /// Spell note names with flats (flat-side signatures).
    prefers_flats: bool,
}

impl Pool {
    /// Build a pool from arbitrary pitch classes. Order is normalized to
    /// ascending; duplicates, values >= 12, and an empty set are rejected.
    pub fn new(pitch_classes: &[u8]) -> Result<Self> {
        if pitch_classes.is_empty() {
            return Err(GrooveError::InvalidPool("pool is empty".into()));
        }
        if let Some(&bad) = pitch_classes.iter().find(|&&pc| pc >= 12) {
            return Err(GrooveError::InvalidPitchClass(bad));
        }
        let mut sorted = pitch_classes.to_vec();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(GrooveError::InvalidPool(format!(
                "duplicate pitch classes in {pitch_classes:?}"
            )));
        }
        Ok(Pool {
            pitch_classes: sorted,
            prefers_flats: false,
        })
    }

    /// Look up a pool by key-signature label.
    pub fn from_key(label: &str) -> Result<Self> {
        let (sharps, flats) = parse_signature(label).ok_or_else(|| GrooveError::UnknownPool(label.to_string()))?;
        // Each sharp moves the major tonic up a fifth, each flat up a fourth.
        let tonic = ((sharps * 7 + flats * 5) % 12) as u8;
        let pcs: Vec<u8> = MAJOR_STEPS.iter().map(|&s| (tonic + s) % 12).collect();
        let mut pool = Pool::new(&pcs)?;
        pool.prefers_flats = flats > 0;
        Ok(pool)
    }

    pub fn pitch_classes(&self) -> &[u8] {
        &self.pitch_classes
    }

    pub fn len(&self) -> usize {
        self.pitch_classes.len()
    }

    /// Always false; kept for the `len`/`is_empty` pair.
    pub fn is_empty(&self) -> bool {
        self.pitch_classes.is_empty()
    }

    pub fn prefers_flats(&self) -> bool {
        self.prefers_flats
    }

    pub fn contains(&self, pc: u8) -> bool {
        self.pitch_classes.contains(&(pc % 12))
    }

    /// Fail with `TonicNotInPool` unless `tonic` belongs to this pool.
    pub fn check_tonic(&self, tonic: u8) -> Result<()> {
        if tonic < 12 && self.contains(tonic) {
            Ok(())
        } else {
            Err(GrooveError::TonicNotInPool {
                tonic,
                pool: self.pitch_classes.clone(),
            })
        }
    }

    /// Pool pitch classes ordered by ascending interval above `tonic`;
    /// index `i` holds degree `i + 1`.
    pub fn degrees_from(&self, tonic: u8) -> Result<Vec<u8>> {
        self.check_tonic(tonic)?;
        let mut ordered = self.pitch_classes.clone();
        ordered.sort_by_key(|&pc| interval_from(tonic, pc));
        Ok(ordered)
    }

    /// 1-based degree of `pc` relative to `tonic`, or 0 when either the
    /// tonic or `pc` is not in the pool.
    pub fn scale_degree(&self, tonic: u8, pc: u8) -> u8 {
        match self.degrees_from(tonic) {
            Ok(ordered) => ordered
                .iter()
                .position(|&p| p == pc % 12)
                .map_or(0, |i| i as u8 + 1),
            Err(_) => 0,
        }
    }

    /// Pitch class at a 1-based degree. Degrees past the pool size wrap.
    pub fn pitch_class_of(&self, tonic: u8, degree: u8) -> Option<u8> {
        if degree == 0 {
            return None;
        }
        let ordered = self.degrees_from(tonic).ok()?;
        Some(ordered[(degree as usize - 1) % ordered.len()])
    }

    /// Every MIDI note in `[low, high]` whose pitch class is in the pool.
    pub fn notes_in_range(&self, low: u8, high: u8) -> Vec<u8> {
        (low..=high.min(127)).filter(|&n| self.contains(n)).collect()
    }
}

impl Default for Pool {
    /// The "0" pool: C major's pitch classes.
    fn default() -> Self {
        Pool {
            pitch_classes: MAJOR_STEPS.to_vec(),
            prefers_flats: false,
        }
    }
}

/// Parse "0", "3♯", "3#", "2♭", "2b" into (sharps, flats).
fn parse_signature(label: &str) -> Option<(u32, u32)> {
    let label = label.trim();
    if label == "0" {
        return Some((0, 0));
    }
    let mut chars = label.chars();
    let accidental = chars.next_back()?;
    let count: u32 = chars.as_str().parse().ok()?;
    if !(1..=7).contains(&count) {
        return None;
    }
    match accidental {
        '♯' | '#' => Some((count, 0)),
        '♭' | 'b' => Some((0, count)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u8 = 9;
    const B: u8 = 11;
    const C_SHARP: u8 = 1;

    #[test]
    fn test_three_sharps_pool() {
        let pool = Pool::from_key("3♯").unwrap();
        // C♯ D E F♯ G♯ A B
        assert_eq!(pool.pitch_classes(), &[1, 2, 4, 6, 8, 9, 11]);
        assert!(!pool.prefers_flats());
        assert_eq!(Pool::from_key("3#").unwrap(), pool);
    }

    #[test]
    fn test_flat_pools() {
        let pool = Pool::from_key("2♭").unwrap();
        // B♭ major: C D E♭ F G A B♭
        assert_eq!(pool.pitch_classes(), &[0, 2, 3, 5, 7, 9, 10]);
        assert!(pool.prefers_flats());
        assert_eq!(Pool::from_key("2b").unwrap().pitch_classes(), pool.pitch_classes());
    }

    #[test]
    fn test_every_listed_key_resolves() {
        for key in POOL_KEYS {
            let pool = Pool::from_key(key).unwrap();
            assert_eq!(pool.len(), 7, "pool {key} should have seven members");
        }
    }

    #[test]
    fn test_unknown_keys_rejected() {
        for bad in ["", "8♯", "0♯", "x", "3", "♯"] {
            assert!(
                matches!(Pool::from_key(bad), Err(GrooveError::UnknownPool(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_scale_degrees_from_a() {
        let pool = Pool::from_key("3♯").unwrap();
        assert_eq!(pool.scale_degree(A, A), 1);
        assert_eq!(pool.scale_degree(A, B), 2);
        assert_eq!(pool.scale_degree(A, C_SHARP), 3);
        assert_eq!(pool.scale_degree(A, 0), 0, "C natural is not in 3♯");
        assert_eq!(pool.pitch_class_of(A, 5), Some(4)); // E
        assert_eq!(pool.pitch_class_of(A, 8), Some(A));
    }

    #[test]
    fn test_tonic_outside_pool_is_an_error() {
        let pool = Pool::from_key("3♯").unwrap();
        assert!(matches!(
            pool.degrees_from(0),
            Err(GrooveError::TonicNotInPool { tonic: 0, .. })
        ));
        assert_eq!(pool.scale_degree(0, A), 0);
        assert_eq!(pool.pitch_class_of(0, 1), None);
    }

    #[test]
    fn test_custom_pool_validation() {
        let pool = Pool::new(&[7, 0, 4]).unwrap();
        assert_eq!(pool.pitch_classes(), &[0, 4, 7]);
        assert_eq!(pool.degrees_from(7).unwrap(), vec![7, 0, 4]);
        assert!(Pool::new(&[]).is_err());
        assert!(Pool::new(&[0, 0]).is_err());
        assert!(matches!(Pool::new(&[12]), Err(GrooveError::InvalidPitchClass(12))));
    }

    #[test]
    fn test_default_is_natural_pool() {
        assert_eq!(Pool::default(), Pool::from_key("0").unwrap());
    }

    #[test]
    fn test_notes_in_range() {
        let pool = Pool::from_key("0").unwrap();
        assert_eq!(pool.notes_in_range(60, 67), vec![60, 62, 64, 65, 67]);
    }

    #[test]
    fn test_names() {
        assert_eq!(pitch_class_name(1, false), "C♯");
        assert_eq!(pitch_class_name(1, true), "D♭");
        assert_eq!(interval_from(9, 1), 4);
    }
}
