// Closed enumerations for the engine's live control parameters.
//
// Controls arrive from outside as strings (config files, CLI flags, a UI).
// They are converted exactly once, at the boundary, into these enums; the
// generators only ever match on enums, so a new variant is a compile error
// everywhere it matters.
//
// Conversion never fails. An unrecognized name logs a warning and resolves to
// the control's documented fallback:
// - `Approach`  -> Comping
// - `Mood`      -> Default
// - `Style`     -> Classical (base harmonic weights, no modifiers)
// - `Spread`    -> Close
//
// `Mode` (mode.rs) and `InstrumentStyle` (instrument.rs) implement the same
// `NamedControl` trait.

use serde::{Deserialize, Serialize};

/// A control value that can be looked up by (case-insensitive) name.
pub trait NamedControl: Sized + Copy + PartialEq + 'static {
    /// Every variant, in display order.
    const ALL: &'static [Self];
    /// Used when a name is not recognized.
    const FALLBACK: Self;
    /// Human-readable kind for log lines ("approach", "mood", ...).
    const KIND: &'static str;

    /// Canonical lowercase name.
    fn name(self) -> &'static str;

    /// Extra accepted spellings besides `name()`.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    /// Exact lookup, `None` when the name is unknown.
    fn parse_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name() == wanted || v.aliases().contains(&wanted.as_str()))
    }

    /// Lookup with fallback. Never fails; logs when it substitutes.
    fn from_name(name: &str) -> Self {
        Self::parse_name(name).unwrap_or_else(|| {
            log::warn!(
                "unknown {} `{}`, falling back to `{}`",
                Self::KIND,
                name,
                Self::FALLBACK.name()
            );
            Self::FALLBACK
        })
    }
}

/// How a chord is laid out in time over the rhythm pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Approach {
    /// One voicing note per active step, cycling upward in pitch order.
    Arpeggio,
    /// The whole voicing struck together.
    Block,
    /// The whole voicing with a slight strum between notes.
    Comping,
}

impl NamedControl for Approach {
    const ALL: &'static [Self] = &[Approach::Arpeggio, Approach::Block, Approach::Comping];
    const FALLBACK: Self = Approach::Comping;
    const KIND: &'static str = "approach";

    fn name(self) -> &'static str {
        match self {
            Approach::Arpeggio => "arpeggio",
            Approach::Block => "block",
            Approach::Comping => "comping",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Approach::Arpeggio => &["arp"],
            Approach::Block => &["chords", "pad"],
            Approach::Comping => &["comp"],
        }
    }
}

/// Performance mood. Shapes melodic leaps and humanization depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Mood {
    Tense,
    Relaxed,
    Sparse,
    Dense,
    Default,
}

impl NamedControl for Mood {
    const ALL: &'static [Self] = &[Mood::Tense, Mood::Relaxed, Mood::Sparse, Mood::Dense, Mood::Default];
    const FALLBACK: Self = Mood::Default;
    const KIND: &'static str = "mood";

    fn name(self) -> &'static str {
        match self {
            Mood::Tense => "tense",
            Mood::Relaxed => "relaxed",
            Mood::Sparse => "sparse",
            Mood::Dense => "dense",
            Mood::Default => "default",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Mood::Default => &["neutral", "normal"],
            _ => &[],
        }
    }
}

/// Harmonic style: selects the modifier overlay on the base transition weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Style {
    /// Base functional weights only.
    Classical,
    Pop,
    Jazz,
    Blues,
    Folk,
    Modal,
    Rock,
}

impl NamedControl for Style {
    const ALL: &'static [Self] = &[
        Style::Classical,
        Style::Pop,
        Style::Jazz,
        Style::Blues,
        Style::Folk,
        Style::Modal,
        Style::Rock,
    ];
    const FALLBACK: Self = Style::Classical;
    const KIND: &'static str = "style";

    fn name(self) -> &'static str {
        match self {
            Style::Classical => "classical",
            Style::Pop => "pop",
            Style::Jazz => "jazz",
            Style::Blues => "blues",
            Style::Folk => "folk",
            Style::Modal => "modal",
            Style::Rock => "rock",
        }
    }
}

/// Interval spacing applied to the non-root notes of a voicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Spread {
    /// Everything within an octave above the root.
    Close,
    /// Every upper note at least a fifth above the root.
    Sparse,
    /// The i-th upper note raised by i octaves.
    Wide,
}

impl NamedControl for Spread {
    const ALL: &'static [Self] = &[Spread::Close, Spread::Sparse, Spread::Wide];
    const FALLBACK: Self = Spread::Close;
    const KIND: &'static str = "voicing spread";

    fn name(self) -> &'static str {
        match self {
            Spread::Close => "close",
            Spread::Sparse => "sparse",
            Spread::Wide => "wide",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Spread::Sparse => &["open"],
            _ => &[],
        }
    }
}

impl From<String> for Approach {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<String> for Mood {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<String> for Style {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<String> for Spread {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}
