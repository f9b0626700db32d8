//! # Chord Symbols
//!
//! Converts the analysis service's chord notation into chart notation and
//! into the canonical `root:quality` form used for key scoring.
//!
//! ## Service Notation
//! `root:quality[ext]`, for example `C:maj`, `A:min7`, `Bb:dim`, `G:7`.
//! `N` means no chord.
//!
//! ## Chart Notation
//! | Service    | Chart   |
//! |------------|---------|
//! | `C:maj`    | `C`     |
//! | `C:maj7`   | `C7`    |
//! | `C#:min7`  | `C#m7`  |
//! | `Bb:dim`   | `Bb°`   |
//! | `F:aug`    | `F+`    |
//! | `G:7`      | `G7`    |
//! | `N`        | `""`    |
//!
//! Symbols without a `:` are taken to be chart notation already and pass through.

use serde::Serialize;
use std::fmt;

/// Convert a service chord label to chart notation.
///
/// Never fails: anything it does not recognise is concatenated as `root + quality`.
///
/// # Examples
/// ```
/// use fakebook_core::chord::normalize;
///
/// assert_eq!(normalize("N"), "");
/// assert_eq!(normalize("C#:min7"), "C#m7");
/// assert_eq!(normalize("F:maj"), "F");
/// assert_eq!(normalize("Bb:dim"), "Bb°");
/// assert_eq!(normalize("Am7"), "Am7");
/// ```
pub fn normalize(api_chord: &str) -> String {
    let chord = api_chord.trim();
    if chord == "N" {
        return String::new();
    }

    let Some((root, quality)) = chord.split_once(':') else {
        return chord.to_string();
    };

    if let Some(rest) = quality.strip_prefix("min") {
        format!("{}m{}", root, rest)
    } else if let Some(rest) = quality.strip_prefix("maj") {
        format!("{}{}", root, rest)
    } else if let Some(rest) = quality.strip_prefix("dim") {
        format!("{}°{}", root, rest)
    } else if let Some(rest) = quality.strip_prefix("aug") {
        format!("{}+{}", root, rest)
    } else {
        format!("{}{}", root, quality)
    }
}

/// Triad family of a chord, the only part key scoring cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseQuality {
    Maj,
    Min,
    Dim,
    Aug,
}

impl BaseQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseQuality::Maj => "maj",
            BaseQuality::Min => "min",
            BaseQuality::Dim => "dim",
            BaseQuality::Aug => "aug",
        }
    }

    fn from_service_quality(quality: &str) -> Self {
        if quality.starts_with("min") {
            BaseQuality::Min
        } else if quality.starts_with("dim") {
            BaseQuality::Dim
        } else if quality.starts_with("aug") {
            BaseQuality::Aug
        } else {
            // maj, 7, 9, sus4, hdim7 and anything else unprefixed
            BaseQuality::Maj
        }
    }

    fn from_chart_suffix(suffix: &str) -> Self {
        if suffix.starts_with("maj") {
            BaseQuality::Maj
        } else if suffix.starts_with("min") || suffix.starts_with('m') || suffix.starts_with('-') {
            BaseQuality::Min
        } else if suffix.starts_with("dim") || suffix.starts_with('°') || suffix.starts_with('ø') {
            BaseQuality::Dim
        } else if suffix.starts_with("aug") || suffix.starts_with('+') {
            BaseQuality::Aug
        } else {
            BaseQuality::Maj
        }
    }
}

/// `root:baseQuality`, e.g. `C:maj` or `F#:min`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalChord {
    pub root: String,
    pub pitch_class: u8,
    pub quality: BaseQuality,
}

impl fmt::Display for CanonicalChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.root, self.quality.as_str())
    }
}

/// Reduce a service label (or a chart symbol) to its canonical form.
///
/// Returns `None` for `N` and for labels whose root is not a note name.
pub fn canonicalize(chord: &str) -> Option<CanonicalChord> {
    let chord = chord.trim();
    if chord.is_empty() || chord == "N" {
        return None;
    }

    match chord.split_once(':') {
        Some((root, quality)) => {
            let (root, rest) = split_root(root)?;
            if !rest.is_empty() {
                return None;
            }
            Some(CanonicalChord {
                root: root.to_string(),
                pitch_class: pitch_class(root)?,
                quality: BaseQuality::from_service_quality(quality),
            })
        }
        None => {
            let parsed = parse_symbol(chord)?;
            Some(CanonicalChord {
                root: parsed.root.to_string(),
                pitch_class: parsed.pitch_class,
                quality: BaseQuality::from_chart_suffix(parsed.suffix),
            })
        }
    }
}

/// Pitch class (0 = C) of a note name such as `C`, `F#` or `Bb`.
pub fn pitch_class(note: &str) -> Option<u8> {
    let mut chars = note.chars();
    let base: i8 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut offset: i8 = 0;
    for c in chars {
        match c {
            '#' | '♯' => offset += 1,
            'b' | '♭' => offset -= 1,
            _ => return None,
        }
    }
    Some((base + offset).rem_euclid(12) as u8)
}

/// Split a leading note name (letter plus one accidental) from the rest.
fn split_root(symbol: &str) -> Option<(&str, &str)> {
    let mut chars = symbol.char_indices();
    let (_, letter) = chars.next()?;
    if !('A'..='G').contains(&letter) {
        return None;
    }
    let split = match chars.next() {
        Some((idx, c)) if c == '#' || c == 'b' || c == '♯' || c == '♭' => idx + c.len_utf8(),
        Some((idx, _)) => idx,
        None => symbol.len(),
    };
    Some(symbol.split_at(split))
}

/// A chart chord symbol split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChord<'a> {
    pub root: &'a str,
    pub pitch_class: u8,
    /// Everything between the root and the bass note: `m7`, `maj9`, `°`, `sus4`
    pub suffix: &'a str,
    /// Slash bass note, if any
    pub bass: Option<&'a str>,
}

/// Parse a chart chord symbol such as `C`, `F#m7`, `Bb°` or `G7/B`.
///
/// Returns `None` when the symbol does not start with a note name.
///
/// # Examples
/// ```
/// use fakebook_core::chord::parse_symbol;
///
/// let chord = parse_symbol("F#m7/C#").unwrap();
/// assert_eq!(chord.root, "F#");
/// assert_eq!(chord.pitch_class, 6);
/// assert_eq!(chord.suffix, "m7");
/// assert_eq!(chord.bass, Some("C#"));
/// ```
pub fn parse_symbol(symbol: &str) -> Option<ParsedChord<'_>> {
    let (root, rest) = split_root(symbol.trim())?;
    let root_pc = pitch_class(root)?;

    // A slash only introduces a bass note when a note name follows it ("6/9" stays a suffix)
    let (suffix, bass) = match rest.rsplit_once('/') {
        Some((suffix, bass)) if pitch_class(bass).is_some() => (suffix, Some(bass)),
        _ => (rest, None),
    };

    Some(ParsedChord {
        root,
        pitch_class: root_pc,
        suffix,
        bass,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("N"), "");
        assert_eq!(normalize("C#:min7"), "C#m7");
        assert_eq!(normalize("F:maj"), "F");
        assert_eq!(normalize("Bb:dim"), "Bb°");
        assert_eq!(normalize("Bb:dim7"), "Bb°7");
        assert_eq!(normalize("E:aug"), "E+");
        assert_eq!(normalize("G:7"), "G7");
        assert_eq!(normalize("D:sus4"), "Dsus4");
        assert_eq!(normalize("A:min"), "Am");
    }

    #[test]
    fn test_normalize_drops_maj_prefix() {
        assert_eq!(normalize("C:maj7"), "C7");
        assert_eq!(normalize("Eb:maj9"), "Eb9");
        assert_eq!(normalize("C:maj/3"), "C/3");
    }

    #[test]
    fn test_normalize_passes_chart_notation_through() {
        assert_eq!(normalize("Am7"), "Am7");
        assert_eq!(normalize("G/B"), "G/B");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_pure() {
        for label in ["C:maj", "N", "weird:stuff", "F#:hdim7"] {
            assert_eq!(normalize(label), normalize(label));
        }
        assert_eq!(normalize("weird:stuff"), "weirdstuff");
    }

    #[test]
    fn test_canonicalize_service_labels() {
        assert_eq!(canonicalize("C:maj").unwrap().to_string(), "C:maj");
        assert_eq!(canonicalize("A:min7").unwrap().to_string(), "A:min");
        assert_eq!(canonicalize("G:7").unwrap().to_string(), "G:maj");
        assert_eq!(canonicalize("B:dim").unwrap().to_string(), "B:dim");
        assert_eq!(canonicalize("B:dim7").unwrap().quality, BaseQuality::Dim);
        // Only a leading dim counts as diminished
        assert_eq!(canonicalize("B:hdim7").unwrap().quality, BaseQuality::Maj);
        assert_eq!(canonicalize("Ab:aug").unwrap().quality, BaseQuality::Aug);
        assert!(canonicalize("N").is_none());
        assert!(canonicalize("X:maj").is_none());
    }

    #[test]
    fn test_canonicalize_chart_symbols() {
        let am = canonicalize("Am7").unwrap();
        assert_eq!(am.pitch_class, 9);
        assert_eq!(am.quality, BaseQuality::Min);
        assert_eq!(canonicalize("Cmaj7").unwrap().quality, BaseQuality::Maj);
        assert_eq!(canonicalize("F#°").unwrap().quality, BaseQuality::Dim);
    }

    #[test]
    fn test_pitch_class() {
        assert_eq!(pitch_class("C"), Some(0));
        assert_eq!(pitch_class("C#"), Some(1));
        assert_eq!(pitch_class("Db"), Some(1));
        assert_eq!(pitch_class("Cb"), Some(11));
        assert_eq!(pitch_class("B#"), Some(0));
        assert_eq!(pitch_class("H"), None);
        assert_eq!(pitch_class("Cm"), None);
    }

    #[test]
    fn test_parse_symbol() {
        let chord = parse_symbol("Bbmaj7").unwrap();
        assert_eq!(chord.root, "Bb");
        assert_eq!(chord.suffix, "maj7");
        assert_eq!(chord.bass, None);

        let six_nine = parse_symbol("C6/9").unwrap();
        assert_eq!(six_nine.suffix, "6/9");
        assert_eq!(six_nine.bass, None);

        let slash = parse_symbol("D/F#").unwrap();
        assert_eq!(slash.suffix, "");
        assert_eq!(slash.bass, Some("F#"));

        assert!(parse_symbol("%").is_none());
        assert!(parse_symbol("-").is_none());
    }
}
