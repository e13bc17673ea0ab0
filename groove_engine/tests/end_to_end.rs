// End-to-end checks of the generation layer through the public API: a
// key-signature pool and tonic, degree numbering, modal chord symbols,
// progression statistics, voicing, and noise determinism.

use groove_engine::chord::{Chord, ChordQuality, chord_symbol};
use groove_engine::controls::{Approach, Spread, Style};
use groove_engine::harmony::{Progression, select_next};
use groove_engine::instrument::InstrumentStyleProfile;
use groove_engine::mode::{Mode, quality_for};
use groove_engine::noise::NoiseEngine;
use groove_engine::pool::Pool;
use groove_engine::rhythm::{RhythmGenerator, TimeSignature};
use groove_engine::voicing::{apply_spread, voice};
use groove_engine::{GrooveError, NamedControl};
use groove_prng::GrooveRng;

const A: u8 = 9;
const B: u8 = 11;
const C_SHARP: u8 = 1;

#[test]
fn three_sharps_in_a() {
    let pool = Pool::from_key("3♯").unwrap();
    assert_eq!(pool.pitch_classes(), &[1, 2, 4, 6, 8, 9, 11]);
    assert_eq!(pool.scale_degree(A, A), 1);
    assert_eq!(pool.scale_degree(A, B), 2);
    assert_eq!(pool.scale_degree(A, C_SHARP), 3);

    let degree_one = quality_for(pool.scale_degree(A, A), Mode::from_name("major"));
    let symbol = chord_symbol(A, degree_one, pool.prefers_flats());
    assert_eq!(symbol, "Amaj7");
    assert_ne!(symbol, "Amin7");

    let progression = Progression::new(pool, A, Style::Pop, Mode::Ionian).unwrap();
    assert_eq!(progression.symbol(), "Amaj7");
}

#[test]
fn modal_quality_lookups() {
    assert_eq!(quality_for(1, Mode::from_name("major")).to_string(), "maj7");
    assert_eq!(quality_for(5, Mode::from_name("major")).to_string(), "7");
    assert_eq!(quality_for(2, Mode::from_name("major")).to_string(), "min7");
    assert_eq!(quality_for(1, Mode::from_name("minor")).to_string(), "min7");
    assert_eq!(quality_for(7, Mode::from_name("locrian")).to_string(), "min7b5");
}

#[test]
fn dominant_goes_home_for_every_style() {
    let pool = Pool::from_key("3♯").unwrap();
    for &style in Style::ALL {
        let mut rng = GrooveRng::new(style as u64 + 100);
        let home = (0..1000)
            .filter(|_| select_next(5, A, &pool, style, &mut rng).unwrap().degree == 1)
            .count();
        assert!(home >= 700, "{}: only {home}/1000 resolutions to I", style.name());
    }
}

#[test]
fn tonic_outside_pool_is_reported_not_guessed() {
    let pool = Pool::from_key("3♯").unwrap();
    let mut rng = GrooveRng::new(1);
    let result = select_next(1, 0, &pool, Style::Classical, &mut rng);
    assert!(matches!(result, Err(GrooveError::TonicNotInPool { .. })));
    assert_eq!(pool.scale_degree(0, A), 0);
}

#[test]
fn voicing_reduces_to_root_third_seventh() {
    let chord = Chord::with_voicing(60, ChordQuality::Major7, vec![60, 64, 67, 71]);
    let profile = InstrumentStyleProfile {
        voicing_note_count: 3,
        voicing_spread: Spread::Close,
        min_note: 48,
        max_note: 84,
        base_velocity: 90,
        sustain_ms: 400.0,
    };
    assert_eq!(voice(&chord, &profile), vec![60, 64, 71]);
    assert_eq!(apply_spread(&[60, 64, 67], Spread::Wide), vec![60, 76, 91]);
}

#[test]
fn noise_is_deterministic_and_bounded() {
    let a = NoiseEngine::new(1234);
    let b = NoiseEngine::new(1234);
    let mut rng = GrooveRng::new(99);
    for _ in 0..10_000 {
        let x = rng.next_f64() * 500.0 - 250.0;
        let va = a.sample(x, 0.37, 3.0);
        assert_eq!(va.to_bits(), b.sample(x, 0.37, 3.0).to_bits());
        assert!((-3.0..=3.0).contains(&va));
    }
}

#[test]
fn rhythm_is_sixteen_steps_and_monotonic() {
    let generator = RhythmGenerator::new(2718);
    for &approach in Approach::ALL {
        let mut previous = generator.generate(approach, 0.0, TimeSignature::COMMON);
        for i in 1..=20 {
            let d = i as f64 / 20.0;
            let pattern = generator.generate(approach, d, TimeSignature::COMMON);
            assert_eq!(pattern.len(), 16);
            for (before, now) in previous.steps().iter().zip(pattern.steps()) {
                assert!(!before.active || now.active, "{} lost a step at {d}", approach.name());
            }
            previous = pattern;
        }
    }
    // Unknown approach names still generate.
    let fallback = generator.generate(Approach::from_name("shuffle"), 0.5, TimeSignature::COMMON);
    assert_eq!(fallback, generator.generate(Approach::Comping, 0.5, TimeSignature::COMMON));
}

#[test]
fn progression_walk_stays_diatonic() {
    let pool = Pool::from_key("2♭").unwrap();
    let tonic = 10; // B♭
    let mut progression = Progression::new(pool.clone(), tonic, Style::Jazz, Mode::Ionian).unwrap();
    let mut rng = GrooveRng::new(8);
    for _ in 0..64 {
        let chord: Chord = progression.advance(&mut rng).unwrap();
        assert!(pool.contains(chord.root_pitch_class()));
        assert_eq!(chord.quality, quality_for(progression.degree(), Mode::Ionian));
        assert!(!progression.symbol().contains('♯'), "flat keys spell with flats");
    }
}
