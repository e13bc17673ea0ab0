// Error type for the groove engine.
//
// Only genuine failures become `Err`: a tonic outside its pool (degree
// arithmetic is undefined), malformed harmonic or time-signature input, and
// I/O around config files and MIDI rendering. Unknown control names are not
// errors; they log a warning and fall back (see `controls.rs`). Empty note
// inputs are no-ops.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrooveError {
    /// The reference tonic is not a member of the pool it is supposed to
    /// anchor. No degree is guessed.
    #[error("tonic pitch class {tonic} is not a member of pool {pool:?}")]
    TonicNotInPool { tonic: u8, pool: Vec<u8> },

    #[error("unknown pool key `{0}`")]
    UnknownPool(String),

    #[error("invalid pool: {0}")]
    InvalidPool(String),

    #[error("invalid time signature `{0}` (expected B/N, e.g. 3/4)")]
    InvalidTimeSignature(String),

    #[error("unknown chord quality `{0}`")]
    UnknownChordQuality(String),

    #[error("pitch class {0} is outside 0..12")]
    InvalidPitchClass(u8),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write MIDI to {path}: {source}")]
    MidiWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GrooveError>;
