//! # Measure Builder
//!
//! Quantizes irregular chord intervals onto a regular measure/beat grid.
//!
//! ## Pipeline (per measure)
//! ```text
//! segment ──> assign beats ──> forward-fill ──> compact
//!                                                  │
//!                         (all measures) ──> pad to 4
//! ```
//!
//! ### Segmentation
//! Consecutive downbeats bound one measure each. A chord that starts before the
//! first downbeat adds an intro measure `[0, first)`. A chord that starts at or
//! after the last downbeat adds a trailing measure one average measure long.
//!
//! ### Beat Assignment
//! The measure is split into `numerator` equal slots. Each overlapping chord is
//! snapped to the nearest slot (clamped into the measure) and the changes are
//! swept in order; when two changes land on the same slot the later one wins.
//! A chord whose onset rounds onto the next downbeat is left to the next measure,
//! unless this is the last measure, where it takes the final slot.
//!
//! ### Forward-Fill
//! Empty slots repeat the slot before them. An empty first slot borrows the last
//! chord spelled out in the previous measure, or `%` if there is none.
//!
//! ### Compaction
//! A chord equal to the chord on the previous beat is written as `-`.
//! A `%` breaks the run, so `C % C` stays as written.
//!
//! The grid is lossy by nature: onsets are snapped, and only one chord per
//! beat survives.

use crate::chord::normalize;
use crate::song::{is_placeholder, ChordEvent, Measure, TimeSignature, NO_CHORD, SAME_AS_PREVIOUS};
use crate::time_signature::{sorted_finite, BEAT_TOLERANCE_SECS};

/// Charts always show at least this many measures.
pub const MIN_MEASURES: usize = 4;

/// Trailing measure length when downbeats give no spacing to average.
const FALLBACK_MEASURE_SECS: f64 = 2.0;

/// `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureWindow {
    pub start: f64,
    pub end: f64,
}

impl MeasureWindow {
    fn overlaps(&self, event: &ChordEvent) -> bool {
        // Zero-length events count when they sit inside the window
        event.start < self.end && (event.end > self.start || event.start >= self.start)
    }
}

/// A chord onset snapped to a beat slot.
#[derive(Debug, Clone)]
struct BeatChange {
    beat: usize,
    start: f64,
    end: f64,
    symbol: String,
}

/// Build the measure grid for a recording.
///
/// Always returns at least [`MIN_MEASURES`] measures, each with exactly
/// `time_signature.numerator` beat slots.
///
/// # Examples
/// ```
/// use fakebook_core::{build_measures, ChordEvent, TimeSignature};
///
/// let chords = vec![
///     ChordEvent::new("C:maj", 0.0, 2.0),
///     ChordEvent::new("G:maj", 2.0, 4.0),
/// ];
/// let measures = build_measures(&chords, &[0.0, 4.0], TimeSignature::new(4, 4));
///
/// assert_eq!(measures.len(), 4);
/// assert_eq!(measures[0].beat_chords, vec!["C", "-", "G", "-"]);
/// ```
pub fn build_measures(
    chords: &[ChordEvent],
    downbeats: &[f64],
    time_signature: TimeSignature,
) -> Vec<Measure> {
    let slots = time_signature.beats_per_measure();

    let mut events: Vec<&ChordEvent> = chords
        .iter()
        .filter(|event| event.start.is_finite() && event.end.is_finite())
        .collect();
    events.sort_by(|a, b| a.start.total_cmp(&b.start));

    let windows = segment(&events, &sorted_finite(downbeats));
    tracing::debug!(
        chords = events.len(),
        windows = windows.len(),
        %time_signature,
        "Building measures"
    );

    let mut measures = Vec::with_capacity(windows.len().max(MIN_MEASURES));
    let mut previous_chord: Option<String> = None;
    let mut last_known: Option<String> = None;

    for (order, window) in windows.iter().enumerate() {
        let has_next = order + 1 < windows.len();
        let mut beat_chords = assign_beats(&events, window, slots, has_next);
        forward_fill(&mut beat_chords, previous_chord.as_deref());

        previous_chord = last_chord(&beat_chords);
        if previous_chord.is_some() {
            last_known = previous_chord.clone();
        }

        compact(&mut beat_chords);
        measures.push(Measure {
            order,
            time_signature,
            beat_chords,
        });
    }

    pad(&mut measures, last_known.as_deref(), time_signature);
    measures
}

/// Measure windows from downbeats, plus synthesized intro and trailing measures.
pub fn segment(events: &[&ChordEvent], downbeats: &[f64]) -> Vec<MeasureWindow> {
    let (Some(&first), Some(&last)) = (downbeats.first(), downbeats.last()) else {
        return Vec::new();
    };

    let mut windows = Vec::with_capacity(downbeats.len() + 1);

    if first > 0.0 && events.iter().any(|e| e.start < first - BEAT_TOLERANCE_SECS) {
        windows.push(MeasureWindow {
            start: 0.0,
            end: first,
        });
    }

    windows.extend(downbeats.windows(2).map(|pair| MeasureWindow {
        start: pair[0],
        end: pair[1],
    }));

    if events.iter().any(|e| e.start >= last - BEAT_TOLERANCE_SECS) {
        windows.push(MeasureWindow {
            start: last,
            end: last + average_measure_secs(events, downbeats),
        });
    }

    windows
}

fn average_measure_secs(events: &[&ChordEvent], downbeats: &[f64]) -> f64 {
    if downbeats.len() >= 2 {
        return (downbeats[downbeats.len() - 1] - downbeats[0]) / (downbeats.len() - 1) as f64;
    }
    // One downbeat: stretch to the end of the last chord
    let last = downbeats.last().copied().unwrap_or(0.0);
    let tail = events.iter().map(|e| e.end).fold(last, f64::max) - last;
    if tail > BEAT_TOLERANCE_SECS {
        tail
    } else {
        FALLBACK_MEASURE_SECS
    }
}

/// Chart symbol written into a slot for a chord event.
fn slot_symbol(event: &ChordEvent) -> String {
    if event.is_no_chord() {
        return NO_CHORD.to_string();
    }
    let symbol = normalize(&event.chord);
    if symbol.is_empty() {
        NO_CHORD.to_string()
    } else {
        symbol
    }
}

/// Snap chord onsets to beat slots and sweep them into the measure.
/// Slots with no active chord are left as `""`.
///
/// An onset that rounds onto the next downbeat is handed to the next window when
/// there is one; in the last window it is clamped onto the final slot.
fn assign_beats(
    events: &[&ChordEvent],
    window: &MeasureWindow,
    slots: usize,
    has_next: bool,
) -> Vec<String> {
    let mut beat_chords = vec![String::new(); slots];
    let beat_duration = (window.end - window.start) / slots as f64;
    if beat_duration <= 0.0 {
        return beat_chords;
    }

    let mut changes: Vec<BeatChange> = events
        .iter()
        .filter(|event| window.overlaps(event))
        .filter_map(|event| {
            let position = ((event.start - window.start) / beat_duration).round();
            if has_next && position >= slots as f64 && event.end > window.end {
                return None;
            }
            Some(BeatChange {
                beat: position.clamp(0.0, (slots - 1) as f64) as usize,
                start: event.start,
                end: event.end.max(event.start),
                symbol: slot_symbol(event),
            })
        })
        .collect();
    // Stable: equal slots keep onset order, so the later onset overwrites
    changes.sort_by(|a, b| a.beat.cmp(&b.beat).then(a.start.total_cmp(&b.start)));

    let mut pending = changes.iter().peekable();
    let mut current: Option<&BeatChange> = None;

    for (beat, slot) in beat_chords.iter_mut().enumerate() {
        let beat_time = window.start + beat as f64 * beat_duration;

        let mut changed_here = false;
        while let Some(change) = pending.next_if(|change| change.beat <= beat) {
            current = Some(change);
            changed_here = true;
        }

        if let Some(change) = current {
            if changed_here || change.end > beat_time {
                *slot = change.symbol.clone();
            }
        }
    }

    beat_chords
}

/// Fill `""` slots from the slot before; the first slot borrows `carried`.
fn forward_fill(beat_chords: &mut [String], carried: Option<&str>) {
    for i in 0..beat_chords.len() {
        if !beat_chords[i].is_empty() {
            continue;
        }
        beat_chords[i] = if i == 0 {
            carried.unwrap_or(NO_CHORD).to_string()
        } else {
            beat_chords[i - 1].clone()
        };
    }
}

/// Last chord spelled out in a filled measure.
fn last_chord(beat_chords: &[String]) -> Option<String> {
    beat_chords
        .iter()
        .rev()
        .find(|slot| !is_placeholder(slot))
        .cloned()
}

/// Replace repeats of the previous beat's chord with `-`.
fn compact(beat_chords: &mut [String]) {
    let mut previous: Option<String> = None;
    for slot in beat_chords.iter_mut() {
        if is_placeholder(slot) {
            if slot.as_str() != SAME_AS_PREVIOUS {
                previous = None;
            }
            continue;
        }
        if previous.as_deref() == Some(slot.as_str()) {
            *slot = SAME_AS_PREVIOUS.to_string();
        } else {
            previous = Some(slot.clone());
        }
    }
}

/// Append measures holding the last known chord until there are `MIN_MEASURES`.
fn pad(measures: &mut Vec<Measure>, last_known: Option<&str>, time_signature: TimeSignature) {
    let slots = time_signature.beats_per_measure();
    while measures.len() < MIN_MEASURES {
        let mut beat_chords = vec![last_known.unwrap_or(NO_CHORD).to_string(); slots];
        compact(&mut beat_chords);
        measures.push(Measure {
            order: measures.len(),
            time_signature,
            beat_chords,
        });
    }
}
