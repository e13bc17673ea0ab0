// Melodic note selection.
//
// The next melody note is a weighted draw over the available scale notes.
// Each candidate's weight starts from the size of the leap it would make
// from the current note (steps of one or two semitones are favoured, octave
// leaps are rare, unlisted intervals get 0.01) and is then shaped by:
//
// - chord tones: x2.0 when the candidate's pitch class is in the chord
// - mood: tense x1.5 on leaps of 5+ semitones, relaxed x1.5 on steps of 2 or less
// - direction: a bias above 0.5 multiplies upward candidates by
//   1 + (bias - 0.5) * 2, a bias below 0.5 does the same for downward ones
//
// An empty candidate list returns the current note unchanged.
//
// `MelodyLine` keeps the running note between harmonic changes and turns
// each draw into a `NoteEvent`.

use crate::chord::Chord;
use crate::controls::Mood;
use crate::output::NoteEvent;
use crate::pool::Pool;
use groove_prng::GrooveRng;
use serde::{Deserialize, Serialize};

/// Weight of a leap of `semitones` (absolute).
pub fn interval_weight(semitones: u8) -> f64 {
    match semitones {
        0 => 0.10,
        1 => 0.30,
        2 => 0.30,
        3 => 0.18,
        4 => 0.15,
        5 => 0.10,
        7 => 0.08,
        12 => 0.04,
        _ => 0.01,
    }
}

/// Draw the note that follows `current` from `scale_notes`.
pub fn select_next_note(
    current: u8,
    scale_notes: &[u8],
    chord_tones: &[u8],
    bias: f64,
    mood: Mood,
    rng: &mut GrooveRng,
) -> u8 {
    if scale_notes.is_empty() {
        return current;
    }
    let bias = if bias.is_nan() { 0.5 } else { bias.clamp(0.0, 1.0) };
    let weights: Vec<f64> = scale_notes
        .iter()
        .map(|&candidate| {
            let interval = candidate.abs_diff(current);
            let mut w = interval_weight(interval);
            if chord_tones.iter().any(|&t| t % 12 == candidate % 12) {
                w *= 2.0;
            }
            match mood {
                Mood::Tense if interval >= 5 => w *= 1.5,
                Mood::Relaxed if interval <= 2 => w *= 1.5,
                _ => {}
            }
            if bias > 0.5 && candidate > current {
                w *= 1.0 + (bias - 0.5) * 2.0;
            } else if bias < 0.5 && candidate < current {
                w *= 1.0 + (0.5 - bias) * 2.0;
            }
            w
        })
        .collect();
    rng.weighted_index(&weights)
        .map_or(current, |i| scale_notes[i])
}

/// A single melodic voice stepping through a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyLine {
    pub current: u8,
    pub low: u8,
    pub high: u8,
    /// 0 leans downward, 1 upward, 0.5 neutral.
    pub bias: f64,
    pub mood: Mood,
    pub velocity: u8,
}

impl MelodyLine {
    pub fn new(start: u8, low: u8, high: u8) -> Self {
        let (low, high) = (low.min(high).min(127), high.max(low).min(127));
        MelodyLine {
            current: start.clamp(low, high),
            low,
            high,
            bias: 0.5,
            mood: Mood::Default,
            velocity: 80,
        }
    }

    /// Draw the next note from the pool's notes in range, favouring tones of
    /// `chord`, and hold it for `span_ms`.
    pub fn advance(&mut self, pool: &Pool, chord: &Chord, span_ms: f64, rng: &mut GrooveRng) -> NoteEvent {
        let candidates = pool.notes_in_range(self.low, self.high);
        let chord_tones = chord.tone_pitch_classes();
        self.current = select_next_note(self.current, &candidates, &chord_tones, self.bias, self.mood, rng);
        log::trace!("melody -> {}", self.current);
        NoteEvent {
            pitch: self.current,
            velocity: self.velocity.clamp(30, 127),
            duration_ms: span_ms.max(0.0),
            scheduled_offset_ms: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordQuality;

    const C_MAJOR_OCTAVE: [u8; 8] = [60, 62, 64, 65, 67, 69, 71, 72];

    #[test]
    fn test_empty_scale_returns_current() {
        let mut rng = GrooveRng::new(1);
        assert_eq!(select_next_note(61, &[], &[0, 4, 7], 0.9, Mood::Tense, &mut rng), 61);
    }

    #[test]
    fn test_result_is_a_scale_note() {
        let mut rng = GrooveRng::new(2);
        for _ in 0..500 {
            let n = select_next_note(64, &C_MAJOR_OCTAVE, &[0, 4, 7], 0.5, Mood::Default, &mut rng);
            assert!(C_MAJOR_OCTAVE.contains(&n));
        }
    }

    #[test]
    fn test_steps_beat_leaps() {
        let mut rng = GrooveRng::new(3);
        let trials = 5000;
        let mut small = 0;
        for _ in 0..trials {
            let n = select_next_note(64, &C_MAJOR_OCTAVE, &[], 0.5, Mood::Default, &mut rng);
            if n.abs_diff(64) <= 2 {
                small += 1;
            }
        }
        // Weights for 62, 64, 65 vs the rest: (0.3 + 0.1 + 0.3) / 1.22.
        let freq = small as f64 / trials as f64;
        assert!(freq > 0.5, "steps chosen only {:.1}% of the time", freq * 100.0);
    }

    #[test]
    fn test_upward_bias() {
        let mut rng = GrooveRng::new(4);
        let mut up = 0;
        let mut down = 0;
        for _ in 0..4000 {
            let n = select_next_note(66, &[64, 68], &[], 1.0, Mood::Default, &mut rng);
            if n > 66 {
                up += 1;
            } else {
                down += 1;
            }
        }
        // 68 weighs 0.30 * 2.0 against 64 at 0.30.
        assert!(up > down * 3 / 2, "bias 1.0 should favour upward motion: {up} up vs {down} down");
    }

    #[test]
    fn test_chord_tones_favoured() {
        let mut rng = GrooveRng::new(5);
        let mut chord_hits = 0;
        let trials = 4000;
        for _ in 0..trials {
            // 62 and 58 are both a whole step away; only 62 (D) is in the chord.
            let n = select_next_note(60, &[58, 62], &[2, 5, 9], 0.5, Mood::Default, &mut rng);
            if n == 62 {
                chord_hits += 1;
            }
        }
        let freq = chord_hits as f64 / trials as f64;
        assert!(freq > 0.6, "chord tone chosen {:.1}% of the time, expected ~67%", freq * 100.0);
    }

    #[test]
    fn test_tense_mood_leaps_more() {
        let leaps = |mood| {
            let mut rng = GrooveRng::new(6);
            (0..4000)
                .filter(|_| select_next_note(60, &C_MAJOR_OCTAVE, &[], 0.5, mood, &mut rng).abs_diff(60) >= 5)
                .count()
        };
        assert!(leaps(Mood::Tense) > leaps(Mood::Relaxed));
    }

    #[test]
    fn test_melody_line_stays_in_range() {
        let pool = Pool::from_key("3♯").unwrap();
        let chord = Chord::new(57, ChordQuality::Major7);
        let mut line = MelodyLine::new(69, 64, 81);
        line.bias = 0.9;
        let mut rng = GrooveRng::new(7);
        for _ in 0..300 {
            let ev = line.advance(&pool, &chord, 500.0, &mut rng);
            assert!((64..=81).contains(&ev.pitch));
            assert!(pool.contains(ev.pitch));
            assert_eq!(ev.duration_ms, 500.0);
        }
    }

    #[test]
    fn test_new_caps_range_to_midi() {
        let line = MelodyLine::new(60, 200, 210);
        assert_eq!((line.low, line.high, line.current), (127, 127, 127));

        let swapped = MelodyLine::new(90, 84, 67);
        assert_eq!((swapped.low, swapped.high, swapped.current), (67, 84, 84));
    }
}
