// Instrument styles and their voicing/humanization profiles.
//
// An instrument style is a closed set of presets. Each resolves to two
// static profiles: how its chords are voiced (note count, spread, playable
// range, base velocity, sustain) and how loosely it is played (velocity and
// timing humanization ranges, noise frequency). Slow-moving noise frequencies
// give the drifting feel of pads and strings; faster ones give the busier
// jitter of a plucked guitar.
//
// Unknown names fall back to Piano with a warning (see `controls.rs`).

use crate::controls::{NamedControl, Spread};
use crate::humanize::HumanizationProfile;
use serde::{Deserialize, Serialize};

/// How an instrument voices and sustains chords.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentStyleProfile {
    pub voicing_note_count: usize,
    pub voicing_spread: Spread,
    pub min_note: u8,
    pub max_note: u8,
    /// Velocity of a full-strength step, before humanization.
    pub base_velocity: u8,
    pub sustain_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum InstrumentStyle {
    Piano,
    Rhodes,
    Guitar,
    Strings,
    Pad,
    Organ,
}

impl InstrumentStyle {
    pub fn profile(self) -> InstrumentStyleProfile {
        let (voicing_note_count, voicing_spread, min_note, max_note, base_velocity, sustain_ms) = match self {
            InstrumentStyle::Piano => (4, Spread::Close, 48, 84, 90, 400.0),
            InstrumentStyle::Rhodes => (4, Spread::Sparse, 45, 81, 80, 600.0),
            InstrumentStyle::Guitar => (3, Spread::Close, 40, 76, 85, 250.0),
            InstrumentStyle::Strings => (4, Spread::Wide, 36, 96, 70, 1200.0),
            InstrumentStyle::Pad => (3, Spread::Wide, 36, 96, 60, 2000.0),
            InstrumentStyle::Organ => (4, Spread::Close, 43, 79, 95, 800.0),
        };
        InstrumentStyleProfile {
            voicing_note_count,
            voicing_spread,
            min_note,
            max_note,
            base_velocity,
            sustain_ms,
        }
    }

    pub fn humanization(self) -> HumanizationProfile {
        let (velocity_range, timing_range_ms, noise_frequency) = match self {
            InstrumentStyle::Piano => (12.0, 15.0, 0.15),
            InstrumentStyle::Rhodes => (10.0, 18.0, 0.12),
            InstrumentStyle::Guitar => (14.0, 20.0, 0.2),
            InstrumentStyle::Strings => (8.0, 25.0, 0.08),
            InstrumentStyle::Pad => (6.0, 30.0, 0.05),
            // Organ keys have no touch sensitivity to speak of.
            InstrumentStyle::Organ => (4.0, 8.0, 0.1),
        };
        HumanizationProfile {
            velocity_range,
            timing_range_ms,
            noise_frequency,
        }
    }
}

impl NamedControl for InstrumentStyle {
    const ALL: &'static [Self] = &[
        InstrumentStyle::Piano,
        InstrumentStyle::Rhodes,
        InstrumentStyle::Guitar,
        InstrumentStyle::Strings,
        InstrumentStyle::Pad,
        InstrumentStyle::Organ,
    ];
    const FALLBACK: Self = InstrumentStyle::Piano;
    const KIND: &'static str = "instrument style";

    fn name(self) -> &'static str {
        match self {
            InstrumentStyle::Piano => "piano",
            InstrumentStyle::Rhodes => "rhodes",
            InstrumentStyle::Guitar => "guitar",
            InstrumentStyle::Strings => "strings",
            InstrumentStyle::Pad => "pad",
            InstrumentStyle::Organ => "organ",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            InstrumentStyle::Rhodes => &["epiano", "electric piano"],
            InstrumentStyle::Strings => &["string ensemble"],
            _ => &[],
        }
    }
}

impl From<String> for InstrumentStyle {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_playable() {
        for &style in InstrumentStyle::ALL {
            let p = style.profile();
            assert!(p.min_note + 12 <= p.max_note, "{style:?} range narrower than an octave");
            assert!(p.voicing_note_count >= 3);
            assert!(p.base_velocity <= 127);
            assert!(p.sustain_ms > 0.0);

            let h = style.humanization();
            assert!(h.velocity_range > 0.0 && h.timing_range_ms > 0.0 && h.noise_frequency > 0.0);
        }
    }

    #[test]
    fn test_piano_profile() {
        let p = InstrumentStyle::Piano.profile();
        assert_eq!((p.min_note, p.max_note), (48, 84));
        assert_eq!(p.voicing_spread, Spread::Close);
        assert_eq!(p.voicing_note_count, 4);
    }

    #[test]
    fn test_unknown_instrument_is_piano() {
        assert_eq!(InstrumentStyle::from_name("theremin"), InstrumentStyle::Piano);
        assert_eq!(InstrumentStyle::from_name("Electric Piano"), InstrumentStyle::Rhodes);
    }

    #[test]
    fn test_deserialize_from_name() {
        let s: InstrumentStyle = serde_json::from_str("\"PAD\"").unwrap();
        assert_eq!(s, InstrumentStyle::Pad);
        let s: InstrumentStyle = serde_json::from_str("\"kazoo\"").unwrap();
        assert_eq!(s, InstrumentStyle::Piano);
    }
}
