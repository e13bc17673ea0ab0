// Harmonic progression: weighted scale-degree transitions.
//
// The next chord is chosen as a scale degree. From the current degree, each
// candidate degree present in the pool gets
//
//     weight = BASE_WEIGHTS[current][candidate] * style_modifier(current, candidate)
//
// floored at `MIN_WEIGHT` (0.01) when the product is not positive, and one
// cumulative-weight draw picks the winner. Degrees are numbered by ascending
// interval from the reference tonic (pool.rs), so the walk works for any pool
// size; degree pairs outside the 7x7 table only ever get the floor weight.
//
// The base table encodes tonal function: the dominant resolves home (5 -> 1
// at 0.85), the tonic moves to the dominant or subdominant (1 -> 5 at 0.45,
// 1 -> 4 at 0.25), the pre-dominants lean on 5, and so on. Styles multiply
// individual cells; any pair a style does not mention keeps multiplier 1.0.
// Style overlays leave the dominant's pull home intact enough that 5 -> 1
// stays above 70% in every style.
//
// A reference tonic outside the pool is a hard error: `select_next` returns
// `Err(TonicNotInPool)` and nothing is drawn.
//
// `Progression` is the stateful driver the outside scheduler calls once per
// harmonic change: select a degree, resolve its quality through the modal
// tables (mode.rs), and build a `Chord`.

use crate::chord::{Chord, chord_symbol};
use crate::controls::{NamedControl, Style};
use crate::error::Result;
use crate::mode::{Mode, quality_for};
use crate::pool::Pool;
use groove_prng::{GrooveRng, MIN_WEIGHT};

/// Relative transition weights, `BASE_WEIGHTS[from - 1][to - 1]`.
pub const BASE_WEIGHTS: [[f64; 7]; 7] = [
    //  1     2     3     4     5     6     7
    [0.05, 0.10, 0.05, 0.25, 0.45, 0.10, 0.02], // I
    [0.05, 0.02, 0.03, 0.10, 0.65, 0.05, 0.10], // ii
    [0.05, 0.05, 0.02, 0.25, 0.08, 0.50, 0.05], // iii
    [0.30, 0.15, 0.03, 0.02, 0.40, 0.05, 0.05], // IV
    [0.85, 0.01, 0.01, 0.03, 0.02, 0.08, 0.01], // V
    [0.05, 0.35, 0.05, 0.35, 0.15, 0.02, 0.03], // vi
    [0.80, 0.02, 0.08, 0.02, 0.03, 0.04, 0.01], // vii
];

/// (from, to, multiplier) overlays per style.
fn style_modifiers(style: Style) -> &'static [(u8, u8, f64)] {
    match style {
        Style::Classical => &[],
        Style::Pop => &[(1, 6, 1.8), (6, 4, 1.6), (4, 1, 1.4), (4, 5, 1.2), (1, 4, 1.3)],
        Style::Jazz => &[
            (2, 5, 1.8),
            (6, 2, 1.8),
            (1, 6, 1.5),
            (3, 6, 1.4),
            (4, 7, 1.5),
            (7, 3, 2.0),
            (1, 2, 1.6),
        ],
        Style::Blues => &[(1, 4, 2.0), (4, 1, 1.8), (5, 4, 2.0), (4, 5, 0.8), (1, 5, 0.8)],
        Style::Folk => &[(1, 4, 1.5), (4, 1, 1.5), (1, 5, 1.3), (2, 5, 0.8), (3, 6, 0.8), (5, 6, 0.5)],
        Style::Modal => &[
            (1, 2, 2.5),
            (2, 1, 2.5),
            (1, 7, 3.0),
            (5, 1, 0.8),
            (1, 5, 0.6),
            (4, 1, 1.3),
            (1, 4, 1.2),
        ],
        Style::Rock => &[(1, 4, 1.6), (4, 5, 1.3), (5, 4, 1.5), (1, 7, 2.5), (7, 4, 3.0), (4, 1, 1.4)],
    }
}

/// Multiplier a style applies to `from -> to`; 1.0 when unspecified.
pub fn style_multiplier(style: Style, from: u8, to: u8) -> f64 {
    style_modifiers(style)
        .iter()
        .find(|&&(f, t, _)| f == from && t == to)
        .map_or(1.0, |&(_, _, m)| m)
}

/// Base weight for `from -> to`, 0.0 outside the 7x7 table.
pub fn base_weight(from: u8, to: u8) -> f64 {
    if (1..=7).contains(&from) && (1..=7).contains(&to) {
        BASE_WEIGHTS[from as usize - 1][to as usize - 1]
    } else {
        0.0
    }
}

/// Weight actually used in the draw, never below `MIN_WEIGHT`.
pub fn effective_weight(from: u8, to: u8, style: Style) -> f64 {
    let w = base_weight(from, to) * style_multiplier(style, from, to);
    if w > 0.0 { w } else { MIN_WEIGHT }
}

/// Result of one harmonic move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarmonicStep {
    /// 1-based degree relative to the reference tonic.
    pub degree: u8,
    /// Pitch class sitting on that degree: the root of the next chord.
    pub root_pitch_class: u8,
}

/// Draw the degree that follows `current_degree`.
pub fn select_next(
    current_degree: u8,
    tonic: u8,
    pool: &Pool,
    style: Style,
    rng: &mut GrooveRng,
) -> Result<HarmonicStep> {
    let ordered = pool.degrees_from(tonic)?;
    let weights: Vec<f64> = (1..=ordered.len() as u8)
        .map(|to| effective_weight(current_degree, to, style))
        .collect();
    let index = rng.weighted_index(&weights).unwrap_or(0);
    Ok(HarmonicStep {
        degree: index as u8 + 1,
        root_pitch_class: ordered[index],
    })
}

/// MIDI note of C in the octave chord roots are placed in.
const ROOT_OCTAVE: u8 = 48;

/// Stateful chord-to-chord driver over a pool and tonic.
#[derive(Debug, Clone)]
pub struct Progression {
    pool: Pool,
    tonic: u8,
    style: Style,
    mode: Mode,
    degree: u8,
    current: Chord,
}

impl Progression {
    /// Start on the tonic. Fails when `tonic` is not in `pool`.
    pub fn new(pool: Pool, tonic: u8, style: Style, mode: Mode) -> Result<Self> {
        pool.check_tonic(tonic)?;
        let current = Chord::new(ROOT_OCTAVE + tonic, quality_for(1, mode));
        Ok(Progression {
            pool,
            tonic,
            style,
            mode,
            degree: 1,
            current,
        })
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn current(&self) -> &Chord {
        &self.current
    }

    /// Move to the next chord.
    pub fn advance(&mut self, rng: &mut GrooveRng) -> Result<Chord> {
        let step = select_next(self.degree, self.tonic, &self.pool, self.style, rng)?;
        let quality = quality_for(step.degree, self.mode);
        self.degree = step.degree;
        self.current = Chord::new(ROOT_OCTAVE + step.root_pitch_class, quality);
        log::debug!(
            "{} progression: degree {} -> {}",
            self.style.name(),
            step.degree,
            self.symbol()
        );
        Ok(self.current.clone())
    }

    /// Symbol of the current chord, spelled for the pool's signature.
    pub fn symbol(&self) -> String {
        chord_symbol(
            self.current.root_pitch_class(),
            self.current.quality,
            self.pool.prefers_flats(),
        )
    }
}
