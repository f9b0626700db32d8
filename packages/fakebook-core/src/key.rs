//! # Key Detection
//!
//! Picks the key whose diatonic chords best explain a chord progression.
//!
//! ## Scoring
//! Every chord of the progression that belongs to a key's diatonic set adds:
//! - `3.0` for the tonic (I / i)
//! - `2.5` for the dominant (V / v)
//! - `2.0` for the subdominant (IV / iv)
//! - `1.0` for any other degree
//!
//! A tonic chord that opens or closes the progression earns another `2.0`.
//!
//! This is an additive matching heuristic, not a probabilistic model.
//!
//! ## Tie-Break
//! Keys are scored in a fixed order and the first maximum wins: the 12 major keys
//! around the circle of fifths (C G D A E B F# Db Ab Eb Bb F), then the 12 minor
//! keys in the same order (Am Em Bm F#m C#m G#m Ebm Bbm Fm Cm Gm Dm). A progression
//! that fits a major key and its relative minor equally well is therefore major.

use serde::Serialize;

use crate::chord::{canonicalize, pitch_class, BaseQuality, CanonicalChord};
use crate::song::ChordEvent;

const TONIC_WEIGHT: f64 = 3.0;
const DOMINANT_WEIGHT: f64 = 2.5;
const SUBDOMINANT_WEIGHT: f64 = 2.0;
const OTHER_WEIGHT: f64 = 1.0;
const TONIC_FRAME_BONUS: f64 = 2.0;

/// Key used when nothing in the progression points anywhere.
pub const DEFAULT_KEY: &str = "C";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

/// One of the 24 keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub name: &'static str,
    pub tonic: u8,
    pub mode: Mode,
    /// Position on the circle of fifths: positive = sharps, negative = flats
    pub fifths: i8,
}

/// Degrees I..vii: semitones above the tonic and triad quality.
const MAJOR_SCALE: [(u8, BaseQuality); 7] = [
    (0, BaseQuality::Maj),
    (2, BaseQuality::Min),
    (4, BaseQuality::Min),
    (5, BaseQuality::Maj),
    (7, BaseQuality::Maj),
    (9, BaseQuality::Min),
    (11, BaseQuality::Dim),
];

/// Natural minor degrees i..VII.
const MINOR_SCALE: [(u8, BaseQuality); 7] = [
    (0, BaseQuality::Min),
    (2, BaseQuality::Dim),
    (3, BaseQuality::Maj),
    (5, BaseQuality::Min),
    (7, BaseQuality::Min),
    (8, BaseQuality::Maj),
    (10, BaseQuality::Maj),
];

const fn key(name: &'static str, tonic: u8, mode: Mode, fifths: i8) -> Key {
    Key {
        name,
        tonic,
        mode,
        fifths,
    }
}

/// All keys in tie-break order.
pub const KEYS: [Key; 24] = [
    key("C", 0, Mode::Major, 0),
    key("G", 7, Mode::Major, 1),
    key("D", 2, Mode::Major, 2),
    key("A", 9, Mode::Major, 3),
    key("E", 4, Mode::Major, 4),
    key("B", 11, Mode::Major, 5),
    key("F#", 6, Mode::Major, 6),
    key("Db", 1, Mode::Major, -5),
    key("Ab", 8, Mode::Major, -4),
    key("Eb", 3, Mode::Major, -3),
    key("Bb", 10, Mode::Major, -2),
    key("F", 5, Mode::Major, -1),
    key("Am", 9, Mode::Minor, 0),
    key("Em", 4, Mode::Minor, 1),
    key("Bm", 11, Mode::Minor, 2),
    key("F#m", 6, Mode::Minor, 3),
    key("C#m", 1, Mode::Minor, 4),
    key("G#m", 8, Mode::Minor, 5),
    key("Ebm", 3, Mode::Minor, -6),
    key("Bbm", 10, Mode::Minor, -5),
    key("Fm", 5, Mode::Minor, -4),
    key("Cm", 0, Mode::Minor, -3),
    key("Gm", 7, Mode::Minor, -2),
    key("Dm", 2, Mode::Minor, -1),
];

impl Key {
    /// Look up a key by name. Accepts any enharmonic spelling of the tonic
    /// (`"A#"` finds Bb) and `m` or `min` for minor.
    ///
    /// # Examples
    /// ```
    /// use fakebook_core::key::{Key, Mode};
    ///
    /// assert_eq!(Key::from_name("Bb").unwrap().name, "Bb");
    /// assert_eq!(Key::from_name("D#m").unwrap().name, "Ebm");
    /// assert_eq!(Key::from_name("Amin").unwrap().mode, Mode::Minor);
    /// assert!(Key::from_name("H").is_none());
    /// ```
    pub fn from_name(name: &str) -> Option<Key> {
        let trimmed = name.trim();
        let (tonic, mode) = match trimmed
            .strip_suffix("min")
            .or_else(|| trimmed.strip_suffix('m'))
        {
            Some(tonic) => (tonic, Mode::Minor),
            None => (trimmed, Mode::Major),
        };
        let tonic = pitch_class(tonic)?;
        Self::from_tonic(tonic, mode)
    }

    pub fn from_tonic(tonic: u8, mode: Mode) -> Option<Key> {
        KEYS.iter()
            .find(|k| k.tonic == tonic % 12 && k.mode == mode)
            .copied()
    }

    /// Flat keys spell accidentals as flats.
    pub fn prefers_flats(&self) -> bool {
        self.fifths < 0
    }

    /// The seven diatonic triads as (pitch class, quality), degree I first.
    pub fn diatonic_chords(&self) -> [(u8, BaseQuality); 7] {
        let scale = match self.mode {
            Mode::Major => MAJOR_SCALE,
            Mode::Minor => MINOR_SCALE,
        };
        scale.map(|(interval, quality)| ((self.tonic + interval) % 12, quality))
    }

    /// Zero-based scale degree of a chord, if it is diatonic to this key.
    pub fn degree_of(&self, chord: &CanonicalChord) -> Option<usize> {
        self.diatonic_chords()
            .iter()
            .position(|&(pc, quality)| pc == chord.pitch_class && quality == chord.quality)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyScore {
    pub key: &'static str,
    pub score: f64,
}

/// Score one key against a canonical progression.
pub fn score_key(key: &Key, progression: &[CanonicalChord]) -> f64 {
    let last = progression.len().saturating_sub(1);
    progression
        .iter()
        .enumerate()
        .filter_map(|(i, chord)| key.degree_of(chord).map(|degree| (i, degree)))
        .map(|(i, degree)| {
            let weight = match degree {
                0 => TONIC_WEIGHT,
                4 => DOMINANT_WEIGHT,
                3 => SUBDOMINANT_WEIGHT,
                _ => OTHER_WEIGHT,
            };
            if degree == 0 && (i == 0 || i == last) {
                weight + TONIC_FRAME_BONUS
            } else {
                weight
            }
        })
        .sum()
}

/// Scores for all 24 keys, in tie-break order.
///
/// Events are scored in onset order whatever order they arrive in.
pub fn rank_keys(chords: &[ChordEvent]) -> Vec<KeyScore> {
    let mut events: Vec<&ChordEvent> = chords
        .iter()
        .filter(|event| !event.is_no_chord())
        .collect();
    events.sort_by(|a, b| a.start.total_cmp(&b.start));

    let progression: Vec<CanonicalChord> = events
        .iter()
        .filter_map(|event| canonicalize(&event.chord))
        .collect();

    KEYS.iter()
        .map(|key| KeyScore {
            key: key.name,
            score: score_key(key, &progression),
        })
        .collect()
}

/// Best-scoring key, or `None` when no key scores above zero.
pub fn best_key(chords: &[ChordEvent]) -> Option<KeyScore> {
    let mut best: Option<KeyScore> = None;
    for candidate in rank_keys(chords) {
        if candidate.score > best.as_ref().map_or(0.0, |b| b.score) {
            best = Some(candidate);
        }
    }
    best
}

/// Detect the key of a progression. Falls back to `"C"`.
///
/// # Examples
/// ```
/// use fakebook_core::{detect_key, ChordEvent};
///
/// let progression = vec![
///     ChordEvent::new("C:maj", 0.0, 2.0),
///     ChordEvent::new("F:maj", 2.0, 4.0),
///     ChordEvent::new("G:maj", 4.0, 6.0),
///     ChordEvent::new("C:maj", 6.0, 8.0),
/// ];
/// assert_eq!(detect_key(&progression), "C");
/// assert_eq!(detect_key(&[]), "C");
/// ```
pub fn detect_key(chords: &[ChordEvent]) -> String {
    best_key(chords)
        .map(|best| best.key)
        .unwrap_or(DEFAULT_KEY)
        .to_string()
}
