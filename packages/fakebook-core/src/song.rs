//! # Chart Data Model
//!
//! Typed records for everything that flows through the pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! Song
//!   ├── title, artist, key, tempo
//!   ├── time_signature: TimeSignature
//!   └── Vec<Section>
//!         ├── label, kind: SectionKind
//!         └── Vec<Measure>
//!               ├── order
//!               ├── time_signature
//!               └── beat_chords: Vec<String>   (one slot per numerator beat)
//! ```
//!
//! ## Beat Slot Markers
//! A beat slot holds a display chord symbol or one of three markers:
//! - `""` - unfilled; only exists while a measure is being built
//! - `"-"` - same chord as the previous beat
//! - `"%"` - no chord (rest)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Same chord as the previous beat.
pub const SAME_AS_PREVIOUS: &str = "-";

/// No chord sounding on this beat.
pub const NO_CHORD: &str = "%";

/// Unfilled slot. Never survives measure building.
pub const UNFILLED: &str = "";

/// True for slot values that are not chord symbols.
pub fn is_placeholder(slot: &str) -> bool {
    slot == UNFILLED || slot == SAME_AS_PREVIOUS || slot == NO_CHORD
}

/// A chord interval reported by the analysis service.
///
/// `chord` uses the service notation (`root:quality[ext]`) or `"N"` for no chord.
/// Events are not guaranteed to arrive in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub chord: String,
    pub start: f64,
    pub end: f64,
}

impl ChordEvent {
    pub fn new(chord: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            chord: chord.into(),
            start,
            end,
        }
    }

    /// True for the service's no-chord label (or an empty label).
    pub fn is_no_chord(&self) -> bool {
        let trimmed = self.chord.trim();
        trimmed.is_empty() || trimmed == "N"
    }
}

/// Beat tracking output for one recording.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatSet {
    pub beats: Vec<f64>,
    pub downbeats: Vec<f64>,
    pub bpm: f64,
    pub declared_time_signature: Option<String>,
}

/// Musical meter. The numerator is also the number of display slots per measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TimeSignature {
    pub const fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Display slots per measure. Compound meters count every eighth: 6/8 has 6 slots.
    pub fn beats_per_measure(&self) -> usize {
        self.numerator.max(1) as usize
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// One bar of the chart. Built by the measure builder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub order: usize,
    pub time_signature: TimeSignature,
    pub beat_chords: Vec<String>,
}

impl Measure {
    /// Chord symbols spelled out in this measure, skipping markers.
    pub fn chords(&self) -> impl Iterator<Item = &str> {
        self.beat_chords
            .iter()
            .map(String::as_str)
            .filter(|slot| !is_placeholder(slot))
    }
}

/// Section type as shown in the chart editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Intro,
    #[default]
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Solo,
    Outro,
}

/// Labelling for a group of measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMeta {
    pub label: String,
    pub kind: SectionKind,
}

impl Default for SectionMeta {
    fn default() -> Self {
        Self {
            label: "A".to_string(),
            kind: SectionKind::Verse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub kind: SectionKind,
    pub measures: Vec<Measure>,
}

/// A complete chart ready for the chart store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub key: String,
    pub tempo: u16,
    pub time_signature: TimeSignature,
    pub sections: Vec<Section>,
}

impl Song {
    pub fn measures(&self) -> impl Iterator<Item = &Measure> {
        self.sections.iter().flat_map(|section| section.measures.iter())
    }
}
