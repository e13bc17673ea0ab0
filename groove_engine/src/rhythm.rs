// Density-layered rhythm pattern synthesis.
//
// Every approach (arpeggio, block, comping) is authored as a one-bar, 16-step
// (sixteenth-note) 4/4 pattern: a base layer that always plays, plus density
// layers with ascending thresholds. A layer whose threshold is at or below the
// requested density contributes each of its flagged steps with probability
//
//     min(1, (density - threshold) / (next_threshold - threshold))
//
// where `next_threshold` is the following layer's threshold, or 1.0 for the
// last one. So a layer fades in across the density band up to the next
// layer and is fully present once density reaches that next threshold. An
// activated step takes `max(existing, layer)` velocity, or the layer velocity
// outright when the step had none.
//
// Other meters reuse the 4/4 bar: shorter bars truncate it (2/4 -> 8 steps,
// 3/4 and 6/8 -> 12), longer bars wrap around to its start (5/4 = 16 + the
// first 4 steps).
//
// Monotonic activation: the generator draws exactly one uniform value per
// (layer, flagged step), in a fixed order and from a fixed seed, whatever the
// density. A step is on iff its layer is unlocked and its draw is below the
// layer probability. The probability only grows with density, so a step
// active at density d stays active at every d' > d.
//
// See also: `performer.rs`, which owns the current pattern and replaces it
// wholesale between ticks.

use crate::controls::{Approach, NamedControl};
use crate::error::{GrooveError, Result};
use groove_prng::GrooveRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Steps in an authored (4/4) bar.
pub const AUTHORED_STEPS: usize = 16;

/// Longest bar accepted by `TimeSignature::parse` (four bars of 4/4).
const MAX_STEPS_PER_BAR: usize = 64;

// ---------------------------------------------------------------------------
// Time signatures
// ---------------------------------------------------------------------------

/// A meter such as 4/4 or 6/8. Only `parse` builds one, so every value has
/// a supported note value and a bar of 1 to 64 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    beats: u8,
    note_value: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { beats: 4, note_value: 4 };

    pub fn beats(self) -> u8 {
        self.beats
    }

    pub fn note_value(self) -> u8 {
        self.note_value
    }

    /// Sixteenth-note steps per bar: 16 for 4/4, 8 for 2/4, 12 for 3/4 and
    /// 6/8, 20 for 5/4.
    pub fn steps_per_bar(self) -> usize {
        self.beats as usize * 16 / self.note_value as usize
    }

    /// Parse "B/N". The note value must be 1, 2, 4, 8 or 16 and the bar
    /// must come to between 1 and 64 sixteenth steps.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || GrooveError::InvalidTimeSignature(text.to_string());
        let (beats, note_value) = text.trim().split_once('/').ok_or_else(invalid)?;
        let beats: u8 = beats.trim().parse().map_err(|_| invalid())?;
        let note_value: u8 = note_value.trim().parse().map_err(|_| invalid())?;
        if beats == 0 || ![1, 2, 4, 8, 16].contains(&note_value) {
            return Err(invalid());
        }
        let ts = TimeSignature { beats, note_value };
        if ts.steps_per_bar() == 0 || ts.steps_per_bar() > MAX_STEPS_PER_BAR {
            return Err(invalid());
        }
        Ok(ts)
    }

    /// Parse, or warn and use 4/4.
    pub fn parse_or_common(text: &str) -> Self {
        TimeSignature::parse(text).unwrap_or_else(|e| {
            log::warn!("{e}; using 4/4");
            TimeSignature::COMMON
        })
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.note_value)
    }
}

impl FromStr for TimeSignature {
    type Err = GrooveError;

    fn from_str(s: &str) -> Result<Self> {
        TimeSignature::parse(s)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = GrooveError;

    fn try_from(s: String) -> Result<Self> {
        TimeSignature::parse(&s)
    }
}

impl From<TimeSignature> for String {
    fn from(ts: TimeSignature) -> String {
        ts.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pattern tables
// ---------------------------------------------------------------------------

/// One optional layer of an approach's pattern.
#[derive(Debug, Clone, Copy)]
pub struct DensityLayer {
    /// Density at which the layer starts fading in, in (0, 1].
    pub threshold: f64,
    /// Flagged steps with the velocity each contributes.
    pub steps: &'static [(usize, u8)],
}

/// The authored material for one approach.
#[derive(Debug, Clone, Copy)]
pub struct ApproachPatterns {
    /// Always-active steps with their velocities.
    pub base: &'static [(usize, u8)],
    /// Ascending by threshold.
    pub layers: &'static [DensityLayer],
}

static ARPEGGIO: ApproachPatterns = ApproachPatterns {
    base: &[(0, 100), (4, 82), (8, 92), (12, 82)],
    layers: &[
        DensityLayer { threshold: 0.2, steps: &[(2, 72), (6, 70), (10, 72), (14, 70)] },
        DensityLayer { threshold: 0.5, steps: &[(1, 60), (5, 58), (9, 60), (13, 58)] },
        DensityLayer { threshold: 0.75, steps: &[(3, 55), (7, 54), (11, 55), (15, 54)] },
    ],
};

static BLOCK: ApproachPatterns = ApproachPatterns {
    base: &[(0, 105), (8, 95)],
    layers: &[
        DensityLayer { threshold: 0.2, steps: &[(4, 80), (12, 80)] },
        DensityLayer { threshold: 0.45, steps: &[(6, 70), (14, 72)] },
        DensityLayer { threshold: 0.7, steps: &[(2, 64), (10, 66)] },
        DensityLayer { threshold: 0.9, steps: &[(3, 55), (11, 55), (15, 58)] },
    ],
};

static COMPING: ApproachPatterns = ApproachPatterns {
    base: &[(0, 96), (6, 84)],
    layers: &[
        DensityLayer { threshold: 0.15, steps: &[(10, 80)] },
        DensityLayer { threshold: 0.35, steps: &[(3, 70), (12, 74)] },
        DensityLayer { threshold: 0.6, steps: &[(8, 66), (14, 68)] },
        DensityLayer { threshold: 0.8, steps: &[(5, 56), (13, 58), (15, 54)] },
    ],
};

impl Approach {
    pub fn patterns(self) -> &'static ApproachPatterns {
        match self {
            Approach::Arpeggio => &ARPEGGIO,
            Approach::Block => &BLOCK,
            Approach::Comping => &COMPING,
        }
    }
}

/// Probability that a layer's flagged step is on at `density`.
pub fn activation_probability(density: f64, threshold: f64, next_threshold: f64) -> f64 {
    if density < threshold {
        return 0.0;
    }
    let span = next_threshold - threshold;
    if span <= 0.0 {
        return 1.0;
    }
    ((density - threshold) / span).min(1.0)
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub active: bool,
    /// MIDI-style 0-127; 0 on inactive steps.
    pub velocity: u8,
}

/// One bar of steps. Its length always equals the bar's `steps_per_bar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmPattern {
    steps: Vec<Step>,
}

impl RhythmPattern {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, wrapping past the end of the bar.
    pub fn step(&self, index: usize) -> Step {
        if self.steps.is_empty() {
            return Step::default();
        }
        self.steps[index % self.steps.len()]
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|s| s.active).count()
    }

    /// Compact "x..x" view for logs.
    pub fn to_grid_string(&self) -> String {
        self.steps.iter().map(|s| if s.active { 'x' } else { '.' }).collect()
    }
}

/// Builds rhythm patterns from the authored tables. Holds only its seed, so
/// regenerating at a new density reuses the same per-step draws.
#[derive(Debug, Clone)]
pub struct RhythmGenerator {
    seed: u64,
}

impl RhythmGenerator {
    pub fn new(seed: u64) -> Self {
        RhythmGenerator { seed }
    }

    /// Generate one bar for `approach` at `density` (clamped to [0, 1]).
    pub fn generate(&self, approach: Approach, density: f64, time_signature: TimeSignature) -> RhythmPattern {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let table = approach.patterns();
        let mut rng = GrooveRng::new(self.seed);

        let mut bar = [Step::default(); AUTHORED_STEPS];
        for &(i, velocity) in table.base {
            bar[i] = Step { active: true, velocity };
        }

        for (li, layer) in table.layers.iter().enumerate() {
            let next = table.layers.get(li + 1).map_or(1.0, |l| l.threshold);
            let p = activation_probability(density, layer.threshold, next);
            for &(i, velocity) in layer.steps {
                // Drawn for every flagged step regardless of density.
                let roll = rng.next_f64();
                if layer.threshold <= density && roll < p {
                    let step = &mut bar[i];
                    step.velocity = if step.velocity == 0 {
                        velocity
                    } else {
                        step.velocity.max(velocity)
                    };
                    step.active = true;
                }
            }
        }

        let pattern = RhythmPattern {
            steps: adapt_to_meter(&bar, time_signature.steps_per_bar()),
        };
        log::debug!(
            "rhythm {} d={density:.2} {time_signature}: {}",
            approach.name(),
            pattern.to_grid_string()
        );
        pattern
    }
}

/// Truncate or wrap an authored bar to `steps` steps.
fn adapt_to_meter(bar: &[Step; AUTHORED_STEPS], steps: usize) -> Vec<Step> {
    (0..steps).map(|i| bar[i % AUTHORED_STEPS]).collect()
}
