// Groove Engine
//
// A real-time generative accompaniment engine. Driven by an external clock
// and a handful of live controls (density, mood, style, humanization
// intensity, instrument, approach), it generates rhythm patterns, chord
// progressions, melodic lines, instrument voicings, and noise-based timing
// and velocity humanization, and emits the result as note events.
//
// Architecture:
// - noise.rs: 1-D smoothed gradient noise, seeded, read-only after construction
// - pool.rs: Key-signature pitch-class pools and scale-degree arithmetic
// - chord.rs: Chord qualities, chord symbols, abstract chords
// - mode.rs: Modal harmonization tables (ionian through locrian)
// - controls.rs: Closed control enums (approach, mood, style, spread) with
//   forgiving name lookup
// - rhythm.rs: Density-layered rhythm patterns and time signatures
// - harmony.rs: Weighted scale-degree progression with style overlays
// - melody.rs: Weighted melodic note selection
// - instrument.rs: Instrument styles and their profiles
// - voicing.rs: Note-count reduction, spread, range folding
// - humanize.rs: Timing/velocity offsets from the noise engine
// - output.rs: Note events and the sound-output trait
// - schedule.rs: Deferred note emission queue
// - performer.rs: Tick-driven performer tying the above together
// - config.rs: JSON-loadable engine configuration
// - midi.rs: Standard MIDI File rendering of collected notes
// - error.rs: Error type
//
// The engine is deterministic given a seed: every random draw goes through
// `groove_prng::GrooveRng`.

pub mod chord;
pub mod config;
pub mod controls;
pub mod error;
pub mod harmony;
pub mod humanize;
pub mod instrument;
pub mod melody;
pub mod midi;
pub mod mode;
pub mod noise;
pub mod output;
pub mod performer;
pub mod pool;
pub mod rhythm;
pub mod schedule;
pub mod voicing;

pub use controls::NamedControl;
pub use error::{GrooveError, Result};
