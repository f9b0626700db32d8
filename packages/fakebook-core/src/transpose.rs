//! # Chord Chart Transposition
//!
//! Shifts every chord symbol in a song by a number of semitones, respelling roots
//! and slash basses with sharps or flats to suit the destination key.
//!
//! Placeholders (`-`, `%`, empty) and symbols that do not start with a note name
//! pass through untouched.

use crate::chord::{parse_symbol, pitch_class};
use crate::key::Key;
use crate::song::{is_placeholder, Measure, Section, Song};

/// Written pitch offset for a transposing instrument's chart ("Bb", "Eb", "F", "C").
/// Bb parts are written a whole step above concert pitch, Eb parts a major sixth above
/// and F parts a fifth above.
fn instrument_interval(instrument_key: &str) -> Option<i8> {
    match instrument_key.trim() {
        "C" => Some(0),
        "Bb" => Some(2),
        "Eb" => Some(9),
        "F" => Some(7),
        _ => None,
    }
}

/// Spell a pitch class.
fn spell(pitch_class: u8, prefer_flats: bool) -> &'static str {
    // 0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B
    const SHARPS: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    const FLATS: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];
    let names = if prefer_flats { &FLATS } else { &SHARPS };
    names[usize::from(pitch_class % 12)]
}

fn shift(pitch_class: u8, semitones: i8) -> u8 {
    (i16::from(pitch_class) + i16::from(semitones)).rem_euclid(12) as u8
}

/// Transpose a single chart chord symbol.
///
/// # Examples
/// ```
/// use fakebook_core::transpose::transpose_chord;
///
/// assert_eq!(transpose_chord("C", 2, false), "D");
/// assert_eq!(transpose_chord("F#m7/C#", 1, false), "Gm7/D");
/// assert_eq!(transpose_chord("A", 1, true), "Bb");
/// assert_eq!(transpose_chord("%", 5, false), "%");
/// ```
pub fn transpose_chord(symbol: &str, semitones: i8, prefer_flats: bool) -> String {
    if is_placeholder(symbol) {
        return symbol.to_string();
    }
    let Some(parsed) = parse_symbol(symbol) else {
        return symbol.to_string();
    };

    let root = spell(shift(parsed.pitch_class, semitones), prefer_flats);
    match parsed.bass.and_then(pitch_class) {
        Some(bass) => format!(
            "{}{}/{}",
            root,
            parsed.suffix,
            spell(shift(bass, semitones), prefer_flats)
        ),
        None => format!("{}{}", root, parsed.suffix),
    }
}

/// Transpose a key name, keeping its mode. `None` for unknown keys.
pub fn transpose_key_name(key: &str, semitones: i8) -> Option<&'static str> {
    let key = Key::from_name(key)?;
    Key::from_tonic(shift(key.tonic, semitones), key.mode).map(|k| k.name)
}

/// Transpose a whole song by `semitones`.
///
/// The song key moves with the chords and decides the accidental spelling.
/// A song whose key is not recognized keeps its key text and is spelled with sharps.
pub fn transpose_song(song: &Song, semitones: i8) -> Song {
    if semitones.rem_euclid(12) == 0 {
        return song.clone();
    }

    let target = transpose_key_name(&song.key, semitones);
    let prefer_flats = target
        .and_then(Key::from_name)
        .map(|k| k.prefers_flats())
        .unwrap_or(false);

    let sections = song
        .sections
        .iter()
        .map(|section| Section {
            label: section.label.clone(),
            kind: section.kind,
            measures: section
                .measures
                .iter()
                .map(|measure| Measure {
                    order: measure.order,
                    time_signature: measure.time_signature,
                    beat_chords: measure
                        .beat_chords
                        .iter()
                        .map(|slot| transpose_chord(slot, semitones, prefer_flats))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Song {
        key: target.map(str::to_string).unwrap_or_else(|| song.key.clone()),
        sections,
        ..song.clone()
    }
}

/// Transpose a song so its tonic lands on `target_key`'s tonic.
///
/// Returns `None` if either key is unknown. The song keeps its own mode.
pub fn transpose_song_to_key(song: &Song, target_key: &str) -> Option<Song> {
    let from = Key::from_name(&song.key)?;
    let to = Key::from_name(target_key)?;
    let semitones = (i16::from(to.tonic) - i16::from(from.tonic)).rem_euclid(12) as i8;
    Some(transpose_song(song, semitones))
}

/// Rewrite a concert-pitch song for a transposing instrument ("Bb", "Eb", "F").
pub fn transpose_for_instrument(song: &Song, instrument_key: &str) -> Option<Song> {
    let semitones = instrument_interval(instrument_key)?;
    Some(transpose_song(song, semitones))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{SectionKind, TimeSignature};

    fn song(key: &str, slots: &[&str]) -> Song {
        Song {
            title: "Test".to_string(),
            artist: "Unknown".to_string(),
            key: key.to_string(),
            tempo: 120,
            time_signature: TimeSignature::default(),
            sections: vec![Section {
                label: "A".to_string(),
                kind: SectionKind::Verse,
                measures: vec![Measure {
                    order: 0,
                    time_signature: TimeSignature::default(),
                    beat_chords: slots.iter().map(|s| s.to_string()).collect(),
                }],
            }],
        }
    }

    fn slots(song: &Song) -> Vec<String> {
        song.measures().flat_map(|m| m.beat_chords.clone()).collect()
    }

    #[test]
    fn test_transpose_chord_keeps_suffix() {
        assert_eq!(transpose_chord("Cmaj7", 7, false), "Gmaj7");
        assert_eq!(transpose_chord("Bb°7", 2, false), "C°7");
        assert_eq!(transpose_chord("E+", -1, true), "Eb+");
        assert_eq!(transpose_chord("C6/9", 2, false), "D6/9");
    }

    #[test]
    fn test_transpose_chord_wraps() {
        assert_eq!(transpose_chord("B", 1, false), "C");
        assert_eq!(transpose_chord("C", -1, false), "B");
        assert_eq!(transpose_chord("C", -13, true), "B");
    }

    #[test]
    fn test_unparseable_symbol_untouched() {
        assert_eq!(transpose_chord("N.C.", 3, false), "N.C.");
        assert_eq!(transpose_chord("-", 3, false), "-");
        assert_eq!(transpose_chord("", 3, false), "");
    }

    #[test]
    fn test_transpose_key_name() {
        assert_eq!(transpose_key_name("C", 2), Some("D"));
        assert_eq!(transpose_key_name("Am", 3), Some("Cm"));
        assert_eq!(transpose_key_name("F", 1), Some("F#"));
        assert_eq!(transpose_key_name("nope", 1), None);
    }

    #[test]
    fn test_transpose_song_to_flat_key() {
        let original = song("C", &["C", "-", "G7", "%"]);
        let moved = transpose_song_to_key(&original, "Eb").unwrap();
        assert_eq!(moved.key, "Eb");
        assert_eq!(slots(&moved), vec!["Eb", "-", "Bb7", "%"]);
        assert_eq!(moved.title, original.title);
    }

    #[test]
    fn test_transpose_song_to_sharp_key() {
        let original = song("F", &["F", "Bb", "C7", "F"]);
        let moved = transpose_song(&original, 1);
        assert_eq!(moved.key, "F#");
        assert_eq!(slots(&moved), vec!["F#", "B", "C#7", "F#"]);
    }

    #[test]
    fn test_transpose_zero_is_identity() {
        let original = song("G", &["G", "D/F#", "Em", "C"]);
        assert_eq!(transpose_song(&original, 12), original);
    }

    #[test]
    fn test_unknown_key() {
        let original = song("??", &["C", "-", "-", "-"]);
        assert!(transpose_song_to_key(&original, "D").is_none());
        let moved = transpose_song(&original, 2);
        assert_eq!(moved.key, "??");
        assert_eq!(slots(&moved), vec!["D", "-", "-", "-"]);
    }

    #[test]
    fn test_instrument_parts() {
        let concert = song("Bb", &["Bb", "Eb", "F7", "Bb"]);
        let trumpet = transpose_for_instrument(&concert, "Bb").unwrap();
        assert_eq!(trumpet.key, "C");
        assert_eq!(slots(&trumpet), vec!["C", "F", "G7", "C"]);

        let alto = transpose_for_instrument(&concert, "Eb").unwrap();
        assert_eq!(alto.key, "G");

        assert!(transpose_for_instrument(&concert, "D").is_none());
        assert_eq!(transpose_for_instrument(&concert, "C").unwrap(), concert);
    }
}
