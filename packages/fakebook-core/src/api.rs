//! # Public API
//!
//! Entry points that run the whole pipeline over the two analysis payloads.
//!
//! ## Pipeline
//! 1. Validate payloads ([`ChordPayload::events`], [`BeatPayload::beat_set`])
//! 2. Estimate the meter from beats and downbeats
//! 3. Detect the key from the chord progression
//! 4. Quantize chords onto measures
//! 5. Wrap the measures in a single section
//!
//! ## Typical Usage
//!
//! ```rust
//! use fakebook_core::{import_song, BeatPayload, ChordPayload};
//!
//! let chords = ChordPayload::from_json(
//!     r#"{"success": true, "chords": [
//!         {"chord": "C:maj", "start": 0.0, "end": 2.0},
//!         {"chord": "G:maj", "start": 2.0, "end": 4.0}
//!     ]}"#,
//! )?;
//! let beats = BeatPayload::from_json(
//!     r#"{"success": true, "beats": [0, 1, 2, 3], "downbeats": [0.0, 4.0], "bpm": 119.6}"#,
//! )?;
//!
//! let import = import_song(&chords, &beats, "my_song-live.mp3")?;
//! assert_eq!(import.song.title, "my song live");
//! assert_eq!(import.song.tempo, 120);
//! assert_eq!(import.song.sections[0].measures[0].beat_chords, vec!["C", "-", "G", "-"]);
//! # Ok::<(), fakebook_core::ChartError>(())
//! ```

use serde::Serialize;
use std::path::Path;

use crate::assemble::assemble_section;
use crate::error::{ChartError, InputWarning};
use crate::key::{best_key, DEFAULT_KEY};
use crate::measures::build_measures;
use crate::payload::{BeatPayload, ChordPayload};
use crate::song::{BeatSet, ChordEvent, SectionMeta, Song};
use crate::time_signature::estimate_time_signature;

/// Artist recorded for imported audio.
pub const DEFAULT_ARTIST: &str = "Unknown";

/// Title used when a filename yields nothing.
pub const UNTITLED: &str = "Untitled";

/// A freshly imported song and the fallbacks applied while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongImport {
    pub song: Song,
    #[serde(skip)]
    pub warnings: Vec<InputWarning>,
}

/// Build a song from the raw analysis payloads.
///
/// Fails on `success: false`, empty chords, missing downbeats or missing bpm.
/// Every other irregularity becomes a warning on the result.
pub fn import_song(
    chords: &ChordPayload,
    beats: &BeatPayload,
    source_name: &str,
) -> Result<SongImport, ChartError> {
    let events = chords.events()?;
    let beat_set = beats.beat_set()?;
    Ok(build_song(events, &beat_set, source_name))
}

/// Same as [`import_song()`], starting from JSON text.
pub fn import_song_json(
    chords_json: &str,
    beats_json: &str,
    source_name: &str,
) -> Result<SongImport, ChartError> {
    let chords = ChordPayload::from_json(chords_json)?;
    let beats = BeatPayload::from_json(beats_json)?;
    import_song(&chords, &beats, source_name)
}

/// Build a song from already validated inputs.
pub fn build_song(events: &[ChordEvent], beat_set: &BeatSet, source_name: &str) -> SongImport {
    let meter = estimate_time_signature(
        &beat_set.beats,
        &beat_set.downbeats,
        beat_set.declared_time_signature.as_deref(),
    );
    let mut warnings = meter.warnings;

    let key = match best_key(events) {
        Some(best) => best.key.to_string(),
        None => {
            tracing::warn!("No key scored above zero, defaulting to {}", DEFAULT_KEY);
            warnings.push(InputWarning::NoKeyEvidence);
            DEFAULT_KEY.to_string()
        }
    };

    let measures = build_measures(events, &beat_set.downbeats, meter.time_signature);
    let title = title_from_filename(source_name);

    tracing::info!(
        title = %title,
        key = %key,
        time_signature = %meter.time_signature,
        measures = measures.len(),
        warnings = warnings.len(),
        "Imported song"
    );

    SongImport {
        song: Song {
            title,
            artist: DEFAULT_ARTIST.to_string(),
            key,
            tempo: round_tempo(beat_set.bpm),
            time_signature: meter.time_signature,
            sections: vec![assemble_section(measures, SectionMeta::default())],
        },
        warnings,
    }
}

fn round_tempo(bpm: f64) -> u16 {
    bpm.round().clamp(0.0, f64::from(u16::MAX)) as u16
}

/// Song title from a source filename: directory and extension stripped,
/// `_` and `-` turned into spaces.
///
/// # Examples
/// ```
/// use fakebook_core::title_from_filename;
///
/// assert_eq!(title_from_filename("uploads/autumn_leaves-take2.wav"), "autumn leaves take2");
/// assert_eq!(title_from_filename(".mp3"), "Untitled");
/// ```
pub fn title_from_filename(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("");
    // A bare extension such as ".mp3" is a stem to Path, not an extension
    let stem = if stem.starts_with('.') && !stem[1..].contains('.') {
        ""
    } else {
        stem
    };

    let title = stem.replace(['_', '-'], " ");
    let title = title.trim();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::TimeSignature;

    fn beat_set(bpm: f64) -> BeatSet {
        BeatSet {
            beats: (0..16).map(|i| i as f64 * 0.5).collect(),
            downbeats: vec![0.0, 2.0, 4.0, 6.0],
            bpm,
            declared_time_signature: None,
        }
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("my_song.mp3"), "my song");
        assert_eq!(title_from_filename("Blue-Bossa.flac"), "Blue Bossa");
        assert_eq!(title_from_filename("/tmp/x/So What.m4a"), "So What");
        assert_eq!(title_from_filename("no_extension"), "no extension");
        assert_eq!(title_from_filename(""), "Untitled");
        assert_eq!(title_from_filename("___.wav"), "Untitled");
    }

    #[test]
    fn test_round_tempo() {
        assert_eq!(round_tempo(119.5), 120);
        assert_eq!(round_tempo(87.2), 87);
        assert_eq!(round_tempo(1.0e9), u16::MAX);
    }

    #[test]
    fn test_build_song_metadata() {
        let events = vec![
            ChordEvent::new("C:maj", 0.0, 2.0),
            ChordEvent::new("F:maj", 2.0, 4.0),
            ChordEvent::new("G:maj", 4.0, 6.0),
            ChordEvent::new("C:maj", 6.0, 8.0),
        ];
        let import = build_song(&events, &beat_set(120.4), "test_song.mp3");

        assert!(import.warnings.is_empty());
        assert_eq!(import.song.title, "test song");
        assert_eq!(import.song.artist, "Unknown");
        assert_eq!(import.song.key, "C");
        assert_eq!(import.song.tempo, 120);
        assert_eq!(import.song.time_signature, TimeSignature::new(4, 4));
        assert_eq!(import.song.sections.len(), 1);
        assert_eq!(import.song.sections[0].label, "A");
        assert_eq!(import.song.measures().count(), 4);
    }

    #[test]
    fn test_no_key_evidence_warns() {
        let events = vec![ChordEvent::new("N", 0.0, 8.0)];
        let import = build_song(&events, &beat_set(90.0), "silence.wav");
        assert_eq!(import.song.key, "C");
        assert!(import.warnings.contains(&InputWarning::NoKeyEvidence));
    }

    #[test]
    fn test_import_song_propagates_service_failure() {
        let chords = ChordPayload {
            success: false,
            chords: None,
            error: Some("busy".to_string()),
        };
        let beats = BeatPayload::from_json(r#"{"success": true, "downbeats": [0], "bpm": 90}"#)
            .unwrap();
        assert!(matches!(
            import_song(&chords, &beats, "x.mp3"),
            Err(ChartError::Service { status: None, .. })
        ));
    }
}
