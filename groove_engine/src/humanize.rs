// Noise-driven timing and velocity humanization.
//
// Each performance step gets a timing offset (ms, signed) and a velocity
// offset, both read from the performer's `NoiseEngine` at the current noise
// time:
//
//     timing   = noise(t,        f)       * timing_range_ms * intensity * mood_t * (0.5 on beats)
//     velocity = noise(t + 1000, f * 1.3) * velocity_range  * intensity * mood_v * (0.7 on beats)
//
// The velocity curve is read 1000 units away and at a different frequency,
// so the two offsets are uncorrelated. Steps on the beat (every fourth
// sixteenth) are held tighter than the off-beats.
//
// Noise time is owned by the performer and passed in; the humanizer itself
// holds no clock. Disabling humanization bypasses the noise entirely and
// returns exactly 0.0.
//
// **Critical constraint: determinism.** Same noise seed, same noise time,
// same settings -> bit-identical offsets.

use crate::controls::Mood;
use crate::noise::NoiseEngine;
use serde::{Deserialize, Serialize};

/// Offset into the noise line for the velocity curve.
const VELOCITY_NOISE_OFFSET: f64 = 1000.0;
/// Velocity curve frequency relative to the timing curve.
const VELOCITY_FREQUENCY_RATIO: f64 = 1.3;
const DOWNBEAT_TIMING_FACTOR: f64 = 0.5;
const DOWNBEAT_VELOCITY_FACTOR: f64 = 0.7;

/// Per-instrument humanization ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanizationProfile {
    /// Peak velocity deviation at full intensity.
    pub velocity_range: f64,
    /// Peak timing deviation in milliseconds at full intensity.
    pub timing_range_ms: f64,
    pub noise_frequency: f64,
}

impl Mood {
    /// Scale on timing deviation.
    pub fn timing_multiplier(self) -> f64 {
        match self {
            Mood::Tense => 0.6,
            Mood::Relaxed => 1.4,
            Mood::Sparse => 1.2,
            Mood::Dense => 0.8,
            Mood::Default => 1.0,
        }
    }

    /// Scale on velocity deviation.
    pub fn velocity_multiplier(self) -> f64 {
        match self {
            Mood::Tense => 1.3,
            Mood::Relaxed => 0.7,
            Mood::Sparse => 0.9,
            Mood::Dense => 1.2,
            Mood::Default => 1.0,
        }
    }
}

fn is_downbeat(step: usize) -> bool {
    step % 4 == 0
}

/// Timing/velocity perturbation for one performer.
#[derive(Debug, Clone)]
pub struct Humanizer {
    noise: NoiseEngine,
    profile: HumanizationProfile,
    pub intensity: f64,
    pub mood: Mood,
    pub enabled: bool,
}

impl Humanizer {
    pub fn new(noise: NoiseEngine, profile: HumanizationProfile) -> Self {
        Humanizer {
            noise,
            profile,
            intensity: 0.5,
            mood: Mood::Default,
            enabled: true,
        }
    }

    pub fn profile(&self) -> HumanizationProfile {
        self.profile
    }

    pub fn set_profile(&mut self, profile: HumanizationProfile) {
        self.profile = profile;
    }

    /// Clamped to [0, 1]; NaN counts as 0.
    pub fn set_intensity(&mut self, intensity: f64) {
        self.intensity = if intensity.is_nan() { 0.0 } else { intensity.clamp(0.0, 1.0) };
    }

    /// Signed timing offset in milliseconds for the step at `step` (its
    /// position within the bar).
    pub fn timing_offset_ms(&self, noise_time: f64, step: usize) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let downbeat = if is_downbeat(step) { DOWNBEAT_TIMING_FACTOR } else { 1.0 };
        self.noise.sample(noise_time, self.profile.noise_frequency, 1.0)
            * self.profile.timing_range_ms
            * self.intensity
            * self.mood.timing_multiplier()
            * downbeat
    }

    /// Signed velocity offset for the step at `step`.
    pub fn velocity_offset(&self, noise_time: f64, step: usize) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let downbeat = if is_downbeat(step) { DOWNBEAT_VELOCITY_FACTOR } else { 1.0 };
        self.noise.sample(
            noise_time + VELOCITY_NOISE_OFFSET,
            self.profile.noise_frequency * VELOCITY_FREQUENCY_RATIO,
            1.0,
        ) * self.profile.velocity_range
            * self.intensity
            * self.mood.velocity_multiplier()
            * downbeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentStyle;

    fn piano() -> Humanizer {
        let mut h = Humanizer::new(NoiseEngine::new(5), InstrumentStyle::Piano.humanization());
        h.set_intensity(1.0);
        h
    }

    #[test]
    fn test_offsets_follow_noise_formula() {
        let profile = InstrumentStyle::Rhodes.humanization();
        let mut h = Humanizer::new(NoiseEngine::new(77), profile);
        h.set_intensity(0.8);
        h.mood = Mood::Tense;
        let reference = NoiseEngine::new(77);
        let f = profile.noise_frequency;

        let mut nonzero = 0;
        for i in 0..40 {
            let t = i as f64 * 1.37 + 0.21;
            for (step, timing_factor, velocity_factor) in [(0, 0.5, 0.7), (3, 1.0, 1.0)] {
                let timing = reference.sample(t, f, 1.0) * profile.timing_range_ms * 0.8 * 0.6 * timing_factor;
                let velocity =
                    reference.sample(t + 1000.0, f * 1.3, 1.0) * profile.velocity_range * 0.8 * 1.3 * velocity_factor;
                assert!((h.timing_offset_ms(t, step) - timing).abs() < 1e-9, "timing at t={t} step {step}");
                assert!((h.velocity_offset(t, step) - velocity).abs() < 1e-9, "velocity at t={t} step {step}");
                if timing != 0.0 && velocity != 0.0 {
                    nonzero += 1;
                }
            }
        }
        assert!(nonzero > 40, "offsets should mostly be nonzero, got {nonzero}");
    }

    #[test]
    fn test_disabled_is_exactly_zero() {
        let mut h = piano();
        h.enabled = false;
        for i in 0..64 {
            let t = i as f64 + 0.37;
            assert_eq!(h.timing_offset_ms(t, i), 0.0);
            assert_eq!(h.velocity_offset(t, i), 0.0);
        }
    }

    #[test]
    fn test_offsets_are_bounded_by_profile() {
        let h = piano();
        let p = h.profile();
        for &mood in &[Mood::Tense, Mood::Relaxed, Mood::Default] {
            let mut h = h.clone();
            h.mood = mood;
            for i in 0..2000 {
                let t = i as f64 * 0.731;
                let timing_bound = p.timing_range_ms * mood.timing_multiplier();
                let velocity_bound = p.velocity_range * mood.velocity_multiplier();
                assert!(h.timing_offset_ms(t, i).abs() <= timing_bound);
                assert!(h.velocity_offset(t, i).abs() <= velocity_bound);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let a = piano();
        let b = piano();
        for i in 0..500 {
            let t = i as f64 * 1.1;
            assert_eq!(a.timing_offset_ms(t, i).to_bits(), b.timing_offset_ms(t, i).to_bits());
            assert_eq!(a.velocity_offset(t, i).to_bits(), b.velocity_offset(t, i).to_bits());
        }
    }

    #[test]
    fn test_downbeats_are_tighter() {
        // Same noise time, only the step position differs.
        let h = piano();
        for i in 0..200 {
            let t = i as f64 * 0.5 + 0.25;
            let on = h.timing_offset_ms(t, 0);
            let off = h.timing_offset_ms(t, 1);
            assert!((on - off * DOWNBEAT_TIMING_FACTOR).abs() < 1e-9);
            let on = h.velocity_offset(t, 4);
            let off = h.velocity_offset(t, 5);
            assert!((on - off * DOWNBEAT_VELOCITY_FACTOR).abs() < 1e-9);
        }
    }

    #[test]
    fn test_intensity_scales_linearly() {
        let full = piano();
        let mut half = piano();
        half.set_intensity(0.5);
        let t = 3.3;
        assert!((half.timing_offset_ms(t, 1) - full.timing_offset_ms(t, 1) * 0.5).abs() < 1e-12);
        half.set_intensity(4.0);
        assert_eq!(half.intensity, 1.0);
    }

    #[test]
    fn test_mood_multipliers() {
        assert_eq!(Mood::Default.timing_multiplier(), 1.0);
        assert_eq!(Mood::Default.velocity_multiplier(), 1.0);
        assert!(Mood::Tense.timing_multiplier() < 1.0);
        assert!(Mood::Tense.velocity_multiplier() > 1.0);
        assert!(Mood::Relaxed.timing_multiplier() > 1.0);
    }

    #[test]
    fn test_offsets_vary_over_time() {
        let h = piano();
        let distinct = (0..32)
            .map(|i| h.timing_offset_ms(i as f64 + 0.5, 1).to_bits())
            .collect::<std::collections::BTreeSet<_>>();
        assert!(distinct.len() > 16, "humanization should not be constant");
    }
}
