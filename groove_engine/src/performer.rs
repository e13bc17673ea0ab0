// The tick-driven performer.
//
// A `Performer` is one instrument's worth of accompaniment. It owns
// everything it reads on the hot path: the rhythm generator and current
// pattern, the current chord and its voicing, a humanizer with its own noise
// engine, the noise-time scalar, and the deferred-note scheduler. Nothing is
// shared between performers, so there is no locking.
//
// The external clock calls `on_tick` for every tick. Steps are sixteenth
// notes, `ticks_per_quarter / 4` ticks long. At each step boundary the
// performer:
//
// 1. applies a pending pattern regeneration, if any,
// 2. reads the pattern step for this position in the bar,
// 3. on an active step, turns the current voicing into notes according to
//    the approach and hands them to the scheduler with their humanized
//    timing and velocity,
// 4. advances noise time by one.
//
// Every tick then drains the notes that have come due into the output.
//
// Approaches:
// - block:    the whole voicing at once
// - arpeggio: one voicing note per active step, cycling upward through the
//             voicing sorted by pitch
// - comping:  the whole voicing, note i delayed by i * comping_spread_ms
//
// Changing density, approach, or time signature only marks the pattern
// stale. The replacement is generated at the start of the next step, so a
// step in progress always completes against the pattern it started with.
// Chord updates, by contrast, re-voice immediately: the next active step
// plays the new chord.
//
// See also: `schedule.rs` (deferred notes), `rhythm.rs`, `voicing.rs`,
// `humanize.rs`.
//
// **Critical constraint: determinism.** Given the same config and the same
// sequence of ticks and updates, the emitted notes are identical.

use crate::chord::{Chord, ChordQuality};
use crate::config::EngineConfig;
use crate::controls::{Approach, Mood, NamedControl};
use crate::error::Result;
use crate::humanize::Humanizer;
use crate::instrument::{InstrumentStyle, InstrumentStyleProfile};
use crate::noise::{DEFAULT_NOISE_SEED, NoiseEngine};
use crate::output::{NoteEvent, SoundOutput};
use crate::pool::Pool;
use crate::rhythm::{RhythmGenerator, RhythmPattern, TimeSignature};
use crate::schedule::NoteScheduler;
use crate::voicing::voice;
use serde::{Deserialize, Serialize};

/// Sixteenth-note steps per quarter note.
const STEPS_PER_QUARTER: u32 = 4;
const MIN_VELOCITY: f64 = 30.0;
const MAX_VELOCITY: f64 = 127.0;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One pulse from the external clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockTick {
    pub tick_index: u64,
    pub ticks_per_quarter: u32,
    pub tempo_bpm: f64,
}

impl ClockTick {
    pub fn ticks_per_step(&self) -> u64 {
        (self.ticks_per_quarter / STEPS_PER_QUARTER).max(1) as u64
    }

    pub fn ms_per_tick(&self) -> f64 {
        60_000.0 / (self.tempo_bpm * self.ticks_per_quarter.max(1) as f64)
    }

    pub fn ms_per_step(&self) -> f64 {
        60_000.0 * self.ticks_per_step() as f64 / (self.tempo_bpm * self.ticks_per_quarter.max(1) as f64)
    }

    /// Tempo is finite and positive.
    pub fn has_valid_tempo(&self) -> bool {
        self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0
    }

    /// Step index if this tick starts a step.
    pub fn step_index(&self) -> Option<u64> {
        let tps = self.ticks_per_step();
        (self.tick_index % tps == 0).then_some(self.tick_index / tps)
    }
}

/// A new chord from the harmonic scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordUpdate {
    pub root: u8,
    pub quality: ChordQuality,
    /// Raw voicing; empty means "voice it as a triad on the root".
    pub voicing_hint: Vec<u8>,
}

impl From<&Chord> for ChordUpdate {
    fn from(chord: &Chord) -> Self {
        ChordUpdate {
            root: chord.root,
            quality: chord.quality,
            voicing_hint: chord.voicing.clone(),
        }
    }
}

/// The key the harmonic scheduler is working in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmonicContext {
    pub pool_key: String,
    pub tonic_pitch_class: u8,
}

// ---------------------------------------------------------------------------
// Performer
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Performer {
    approach: Approach,
    density: f64,
    time_signature: TimeSignature,
    instrument: InstrumentStyle,
    profile: InstrumentStyleProfile,
    comping_spread_ms: f64,

    generator: RhythmGenerator,
    pattern: RhythmPattern,
    pattern_stale: bool,

    pool: Pool,
    tonic: u8,
    chord: Option<Chord>,
    voicing: Vec<u8>,
    /// The voicing in ascending pitch order.
    arpeggio: Vec<u8>,
    arpeggio_index: usize,

    humanizer: Humanizer,
    noise_time: f64,

    scheduler: NoteScheduler,
    now_ms: f64,
    last_tick: Option<u64>,
}

impl Performer {
    /// A performer with default controls for `instrument`, in C major.
    pub fn new(seed: u64, instrument: InstrumentStyle) -> Self {
        let config = EngineConfig {
            seed,
            instrument,
            ..EngineConfig::default()
        };
        Self::build(&config, Pool::default(), 0)
    }

    /// Build from a config. Fails when the config's tonic is not in its pool.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let pool = config.pool()?;
        pool.check_tonic(config.tonic_pitch_class)?;
        Ok(Self::build(config, pool, config.tonic_pitch_class))
    }

    fn build(config: &EngineConfig, pool: Pool, tonic: u8) -> Self {
        let generator = RhythmGenerator::new(config.seed);
        let pattern = generator.generate(config.approach, config.density, config.time_signature);
        let noise = NoiseEngine::new(config.seed ^ DEFAULT_NOISE_SEED);
        let profile = config.instrument.profile();

        let mut humanizer = Humanizer::new(noise, config.instrument.humanization());
        humanizer.set_intensity(config.humanization_intensity);
        humanizer.mood = config.mood;
        humanizer.enabled = config.humanization_enabled;

        Performer {
            approach: config.approach,
            density: config.density,
            time_signature: config.time_signature,
            instrument: config.instrument,
            profile,
            comping_spread_ms: config.comping_spread_ms.max(0.0),
            generator,
            pattern,
            pattern_stale: false,
            pool,
            tonic,
            chord: None,
            voicing: Vec::new(),
            arpeggio: Vec::new(),
            arpeggio_index: 0,
            humanizer,
            noise_time: 0.0,
            scheduler: NoteScheduler::new(),
            now_ms: 0.0,
            last_tick: None,
        }
    }

    // -- Controls -----------------------------------------------------------

    pub fn set_density(&mut self, density: f64) {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        if density != self.density {
            self.density = density;
            self.pattern_stale = true;
        }
    }

    pub fn set_approach(&mut self, approach: Approach) {
        if approach != self.approach {
            self.approach = approach;
            self.arpeggio_index = 0;
            self.pattern_stale = true;
        }
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        if time_signature != self.time_signature {
            self.time_signature = time_signature;
            self.pattern_stale = true;
        }
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.humanizer.mood = mood;
    }

    pub fn set_humanization_intensity(&mut self, intensity: f64) {
        self.humanizer.set_intensity(intensity);
    }

    pub fn set_humanization_enabled(&mut self, enabled: bool) {
        self.humanizer.enabled = enabled;
    }

    pub fn set_comping_spread_ms(&mut self, spread_ms: f64) {
        if spread_ms.is_finite() {
            self.comping_spread_ms = spread_ms.max(0.0);
        }
    }

    /// Switch instrument. The current chord is re-voiced for it.
    pub fn set_instrument(&mut self, instrument: InstrumentStyle) {
        self.instrument = instrument;
        self.profile = instrument.profile();
        self.humanizer.set_profile(instrument.humanization());
        self.revoice();
    }

    /// Replace the current chord and re-voice immediately.
    pub fn set_chord(&mut self, update: ChordUpdate) {
        let chord = Chord::with_voicing(update.root, update.quality, update.voicing_hint);
        self.chord = Some(chord);
        self.revoice();
    }

    /// Change key. On error nothing changes.
    pub fn set_harmonic_context(&mut self, context: &HarmonicContext) -> Result<()> {
        let pool = Pool::from_key(&context.pool_key)?;
        pool.check_tonic(context.tonic_pitch_class)?;
        self.pool = pool;
        self.tonic = context.tonic_pitch_class;
        Ok(())
    }

    fn revoice(&mut self) {
        if let Some(chord) = &self.chord {
            self.voicing = voice(chord, &self.profile);
            self.arpeggio = self.voicing.clone();
            self.arpeggio.sort_unstable();
            self.arpeggio_index = 0;
            log::debug!(
                "{} voicing {}: {:?}",
                self.instrument.name(),
                chord.symbol(self.pool.prefers_flats()),
                self.voicing
            );
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn pattern(&self) -> &RhythmPattern {
        &self.pattern
    }

    pub fn voicing(&self) -> &[u8] {
        &self.voicing
    }

    pub fn chord(&self) -> Option<&Chord> {
        self.chord.as_ref()
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    pub fn noise_time(&self) -> f64 {
        self.noise_time
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Notes scheduled but not yet played.
    pub fn pending_notes(&self) -> usize {
        self.scheduler.len()
    }

    // -- Clock --------------------------------------------------------------

    /// Advance to `tick`, perform its step if it starts one, and play every
    /// note that has come due.
    ///
    /// A tick with a tempo that is not finite and positive does not move the
    /// clock: `now_ms` stays put and arpeggio notes take the full sustain.
    pub fn on_tick(&mut self, tick: ClockTick, output: &mut dyn SoundOutput) {
        let tempo_ok = tick.has_valid_tempo();
        if !tempo_ok {
            log::warn!(
                "tick {} has tempo {} BPM; holding clock at {:.1}ms",
                tick.tick_index,
                tick.tempo_bpm,
                self.now_ms
            );
        }
        match self.last_tick {
            Some(last) if tempo_ok => {
                let elapsed = tick.tick_index.saturating_sub(last);
                self.now_ms += elapsed as f64 * tick.ms_per_tick();
            }
            Some(_) => {}
            None => self.now_ms = 0.0,
        }
        self.last_tick = Some(tick.tick_index);

        if let Some(step) = tick.step_index() {
            let ms_per_step = if tempo_ok { tick.ms_per_step() } else { f64::INFINITY };
            self.perform_step(step, ms_per_step);
        }
        self.scheduler.drain_due(self.now_ms, output);
    }

    /// Play whatever is still scheduled, e.g. at the end of a performance.
    pub fn flush(&mut self, output: &mut dyn SoundOutput) {
        self.scheduler.flush(output);
    }

    fn perform_step(&mut self, step: u64, ms_per_step: f64) {
        if self.pattern_stale {
            self.pattern = self.generator.generate(self.approach, self.density, self.time_signature);
            self.pattern_stale = false;
        }

        let position = (step % self.pattern.len().max(1) as u64) as usize;
        let current = self.pattern.step(position);
        if current.active && !self.voicing.is_empty() {
            let timing = self.humanizer.timing_offset_ms(self.noise_time, position);
            let velocity_offset = self.humanizer.velocity_offset(self.noise_time, position);
            let velocity = (current.velocity as f64 * self.profile.base_velocity as f64 / 100.0 + velocity_offset)
                .round()
                .clamp(MIN_VELOCITY, MAX_VELOCITY) as u8;
            let start = self.now_ms + timing.max(0.0);
            let event = |pitch, duration_ms| NoteEvent {
                pitch,
                velocity,
                duration_ms,
                scheduled_offset_ms: timing,
            };

            match self.approach {
                Approach::Block => {
                    for &pitch in &self.voicing {
                        self.scheduler.schedule(start, event(pitch, self.profile.sustain_ms));
                    }
                }
                Approach::Arpeggio => {
                    let pitch = self.arpeggio[self.arpeggio_index % self.arpeggio.len()];
                    self.arpeggio_index = (self.arpeggio_index + 1) % self.arpeggio.len();
                    let duration = self.profile.sustain_ms.min(ms_per_step);
                    self.scheduler.schedule(start, event(pitch, duration));
                }
                Approach::Comping => {
                    for (i, &pitch) in self.voicing.iter().enumerate() {
                        let due = start + self.comping_spread_ms * i as f64;
                        self.scheduler.schedule(due, event(pitch, self.profile.sustain_ms));
                    }
                }
            }
            log::trace!(
                "step {position}: {} x{} vel {velocity} offset {timing:.1}ms",
                self.approach.name(),
                self.voicing.len()
            );
        }
        self.noise_time += 1.0;
    }
}
