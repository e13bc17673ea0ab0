// Data-driven engine configuration.
//
// Every live control parameter lives in `EngineConfig`, loaded from JSON or
// built from defaults and then overridden by CLI flags. Missing fields take
// their defaults (`#[serde(default)]`), so a config file only needs the
// values it changes.
//
// Names are forgiving the same way the controls are: an unknown mood, style,
// mode, approach or instrument logs a warning and falls back instead of
// rejecting the whole file, and an unparseable time signature becomes 4/4.
// Structural problems (unreadable file, malformed JSON) are errors.
//
// `validate` clamps the unit-interval controls into [0, 1], repairs
// nonsensical tempo/resolution values, and checks that the tonic belongs to
// the pool. It is the only place that can reject a syntactically valid
// config.
//
// See also: `performer.rs` (`Performer::from_config`), `main.rs`.
//
// **Critical constraint: determinism.** `seed` is the single source of every
// random draw in a performance. Same config, same output.

use crate::controls::{Approach, Mood, Style};
use crate::error::{GrooveError, Result};
use crate::instrument::InstrumentStyle;
use crate::mode::Mode;
use crate::pool::Pool;
use crate::rhythm::TimeSignature;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: u64,
    /// How many optional rhythmic subdivisions play, 0-1.
    pub density: f64,
    pub humanization_intensity: f64,
    pub humanization_enabled: bool,
    pub mood: Mood,
    pub style: Style,
    pub mode: Mode,
    pub approach: Approach,
    pub instrument: InstrumentStyle,
    #[serde(deserialize_with = "lenient_time_signature")]
    pub time_signature: TimeSignature,
    /// Key-signature label, e.g. "0", "3♯", "2b".
    pub pool_key: String,
    pub tonic_pitch_class: u8,
    pub tempo_bpm: f64,
    pub ticks_per_quarter: u32,
    /// Bars to render (CLI only).
    pub bars: u32,
    /// Melodic direction: 0 leans down, 1 leans up.
    pub melody_bias: f64,
    /// Delay between successive notes of a comping strum.
    pub comping_spread_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed: 0x6772_6f6f_7665,
            density: 0.5,
            humanization_intensity: 0.5,
            humanization_enabled: true,
            mood: Mood::Default,
            style: Style::Classical,
            mode: Mode::Ionian,
            approach: Approach::Comping,
            instrument: InstrumentStyle::Piano,
            time_signature: TimeSignature::COMMON,
            pool_key: "0".into(),
            tonic_pitch_class: 0,
            tempo_bpm: 96.0,
            ticks_per_quarter: 480,
            bars: 8,
            melody_bias: 0.5,
            comping_spread_ms: 12.0,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GrooveError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&text).map_err(|source| GrooveError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// The pool named by `pool_key`.
    pub fn pool(&self) -> Result<Pool> {
        Pool::from_key(&self.pool_key)
    }

    /// Clamp and repair values in place; fail if the harmonic context is
    /// unusable.
    pub fn validate(&mut self) -> Result<()> {
        self.density = unit(self.density, "density");
        self.humanization_intensity = unit(self.humanization_intensity, "humanization_intensity");
        self.melody_bias = unit(self.melody_bias, "melody_bias");

        let defaults = EngineConfig::default();
        if !(self.tempo_bpm.is_finite() && self.tempo_bpm > 0.0) {
            log::warn!("tempo {} is not playable, using {}", self.tempo_bpm, defaults.tempo_bpm);
            self.tempo_bpm = defaults.tempo_bpm;
        }
        if self.ticks_per_quarter == 0 {
            log::warn!("ticks_per_quarter must be positive, using {}", defaults.ticks_per_quarter);
            self.ticks_per_quarter = defaults.ticks_per_quarter;
        }
        if !(self.comping_spread_ms.is_finite() && self.comping_spread_ms >= 0.0) {
            self.comping_spread_ms = defaults.comping_spread_ms;
        }
        self.bars = self.bars.max(1);

        self.pool()?.check_tonic(self.tonic_pitch_class)
    }
}

/// Clamp to [0, 1], warning when the value had to change.
fn unit(value: f64, field: &str) -> f64 {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if clamped != value {
        log::warn!("{field} {value} outside [0, 1], using {clamped}");
    }
    clamped
}

fn lenient_time_signature<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<TimeSignature, D::Error> {
    let text = String::deserialize(deserializer)?;
    Ok(TimeSignature::parse_or_common(&text))
}
