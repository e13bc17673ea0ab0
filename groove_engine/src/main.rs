// Groove Engine CLI entry point.
//
// Renders a generated accompaniment to a MIDI file. The CLI plays the parts
// the engine treats as external: it is the clock (ticks for the requested
// number of bars) and the harmonic scheduler (a new chord and melody note at
// every bar line). Output goes through a collecting sound output and is
// written with midi.rs.
//
// Usage:
//   cargo run -p groove_engine -- [--output out.mid] [--config groove.json]
//     [--bars N] [--seed N] [--density D] [--approach A] [--style S]
//     [--mode M] [--mood M] [--instrument I] [--time-signature B/N]
//     [--pool KEY] [--tonic PC] [--tempo BPM] [--intensity I]
//     [--no-humanize] [-v]
//
// Flags override values from the config file. Unknown names fall back to
// defaults with a warning.

use clap::Parser;
use groove_engine::config::EngineConfig;
use groove_engine::controls::{Approach, Mood, Style};
use groove_engine::harmony::Progression;
use groove_engine::instrument::InstrumentStyle;
use groove_engine::melody::MelodyLine;
use groove_engine::midi::{MidiPart, write_midi};
use groove_engine::mode::Mode;
use groove_engine::output::{CollectingOutput, PlayedNote};
use groove_engine::performer::{ChordUpdate, ClockTick, Performer};
use groove_engine::rhythm::TimeSignature;
use groove_engine::{NamedControl, Result};
use groove_prng::GrooveRng;
use std::path::PathBuf;
use std::process::ExitCode;

/// Salt separating the harmony stream from the rhythm seed.
const HARMONY_SALT: u64 = 0x6861_726d;
const MELODY_SALT: u64 = 0x6d65_6c6f;

#[derive(Parser, Debug)]
#[command(name = "groove", version, about = "Generate a humanized accompaniment and write it to MIDI")]
struct Cli {
    /// Output MIDI file.
    #[arg(short, long, default_value = "groove.mid")]
    output: PathBuf,

    /// JSON engine config; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    bars: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Rhythmic density, 0-1.
    #[arg(long)]
    density: Option<f64>,

    /// arpeggio, block, comping
    #[arg(long)]
    approach: Option<String>,

    /// classical, pop, jazz, blues, folk, modal, rock
    #[arg(long)]
    style: Option<String>,

    /// ionian..locrian, or major/minor
    #[arg(long)]
    mode: Option<String>,

    /// tense, relaxed, sparse, dense, default
    #[arg(long)]
    mood: Option<String>,

    /// piano, rhodes, guitar, strings, pad, organ
    #[arg(long)]
    instrument: Option<String>,

    /// e.g. 4/4, 3/4, 6/8, 5/4
    #[arg(long)]
    time_signature: Option<String>,

    /// Key signature label: 0, 1♯..7♯, 1♭..7♭ (or 3#, 2b)
    #[arg(long)]
    pool: Option<String>,

    /// Tonic pitch class, 0-11 (must be in the pool).
    #[arg(long)]
    tonic: Option<u8>,

    #[arg(long)]
    tempo: Option<f64>,

    /// Humanization intensity, 0-1.
    #[arg(long)]
    intensity: Option<f64>,

    #[arg(long)]
    no_humanize: bool,

    /// Log chord changes and pattern regeneration.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Config file (or defaults) with flags applied on top.
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(bars) = self.bars {
            config.bars = bars;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(density) = self.density {
            config.density = density;
        }
        if let Some(name) = &self.approach {
            config.approach = Approach::from_name(name);
        }
        if let Some(name) = &self.style {
            config.style = Style::from_name(name);
        }
        if let Some(name) = &self.mode {
            config.mode = Mode::from_name(name);
        }
        if let Some(name) = &self.mood {
            config.mood = Mood::from_name(name);
        }
        if let Some(name) = &self.instrument {
            config.instrument = InstrumentStyle::from_name(name);
        }
        if let Some(text) = &self.time_signature {
            config.time_signature = TimeSignature::parse_or_common(text);
        }
        if let Some(pool) = &self.pool {
            config.pool_key = pool.clone();
        }
        if let Some(tonic) = self.tonic {
            config.tonic_pitch_class = tonic;
        }
        if let Some(tempo) = self.tempo {
            config.tempo_bpm = tempo;
        }
        if let Some(intensity) = self.intensity {
            config.humanization_intensity = intensity;
        }
        if self.no_humanize {
            config.humanization_enabled = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// What one rendering produced.
struct Rendering {
    accompaniment: Vec<PlayedNote>,
    melody: Vec<PlayedNote>,
    symbols: Vec<String>,
}

/// Drive a performer, a progression, and a melody line for `config.bars`.
fn render(config: &EngineConfig) -> Result<Rendering> {
    let pool = config.pool()?;
    let mut progression = Progression::new(pool.clone(), config.tonic_pitch_class, config.style, config.mode)?;
    let mut performer = Performer::from_config(config)?;
    let mut melody = MelodyLine::new(72, 67, 84);
    melody.bias = config.melody_bias;
    melody.mood = config.mood;

    let mut harmony_rng = GrooveRng::new(config.seed).fork(HARMONY_SALT);
    let mut melody_rng = GrooveRng::new(config.seed).fork(MELODY_SALT);

    let steps_per_bar = config.time_signature.steps_per_bar() as u64;
    let first = ClockTick {
        tick_index: 0,
        ticks_per_quarter: config.ticks_per_quarter,
        tempo_bpm: config.tempo_bpm,
    };
    let ticks_per_bar = steps_per_bar * first.ticks_per_step();
    let bar_ms = steps_per_bar as f64 * first.ms_per_step();

    let mut output = CollectingOutput::new();
    let mut melody_notes = Vec::new();
    let mut symbols = Vec::new();

    for bar in 0..config.bars as u64 {
        // The tonic chord opens; every later bar moves on.
        let chord = if bar == 0 {
            progression.current().clone()
        } else {
            progression.advance(&mut harmony_rng)?
        };
        symbols.push(progression.symbol());
        performer.set_chord(ChordUpdate::from(&chord));

        let note = melody.advance(&pool, &chord, bar_ms, &mut melody_rng);
        melody_notes.push(PlayedNote {
            at_ms: bar as f64 * bar_ms,
            event: note,
        });

        for t in 0..ticks_per_bar {
            let tick = ClockTick {
                tick_index: bar * ticks_per_bar + t,
                ..first
            };
            performer.on_tick(tick, &mut output);
        }
    }
    performer.flush(&mut output);

    Ok(Rendering {
        accompaniment: output.notes,
        melody: melody_notes,
        symbols,
    })
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.engine_config()?;
    log::info!(
        "{} bars of {} {} in {} ({}), {} BPM, seed {}",
        config.bars,
        config.instrument.name(),
        config.approach.name(),
        config.style.name(),
        config.mode.name(),
        config.tempo_bpm,
        config.seed
    );

    let rendering = render(&config)?;
    log::info!("progression: {}", rendering.symbols.join(" | "));
    log::info!(
        "{} accompaniment notes, {} melody notes",
        rendering.accompaniment.len(),
        rendering.melody.len()
    );

    let parts = [
        MidiPart {
            name: config.instrument.name(),
            instrument: config.instrument,
            notes: &rendering.accompaniment,
        },
        MidiPart {
            name: "melody",
            instrument: InstrumentStyle::Strings,
            notes: &rendering.melody,
        },
    ];
    write_midi(&parts, config.tempo_bpm, &cli.output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
