//! # Time Signature Inference
//!
//! Derives a meter from beat and downbeat timestamps.
//!
//! This is best-effort signal detection, not exact meter recovery. Beat trackers
//! miss beats and double downbeats; the goal is a slot count that makes the chart
//! readable.
//!
//! ## Algorithm
//! 1. Need at least 4 beats and 2 downbeats, otherwise fall back to the declared
//!    signature (or 4/4)
//! 2. Mean inter-beat interval over the sorted beats
//! 3. Per downbeat interval: count the beats inside it (50 ms tolerance) and
//!    compare with `round(duration / mean beat)`; trust the count unless the two
//!    disagree by more than one beat
//! 4. Take the mode of the per-measure counts. Confidence = mode frequency / measures
//! 5. Below 0.5 confidence, use `mean measure duration / mean beat` instead
//! 6. Map the beat count to a canonical signature (6, 9, 12 become x/8)
//!
//! ## Declared Signatures
//! The service may declare a signature as `"3/4"`, `"3"`, `"[6, 8]"` or a bare
//! integer. It is only used when the beat data is too thin for inference.

use std::collections::BTreeMap;

use crate::error::InputWarning;
use crate::song::TimeSignature;

/// Beats this close to a measure boundary belong to the following measure.
pub const BEAT_TOLERANCE_SECS: f64 = 0.05;

const MIN_BEATS: usize = 4;
const MIN_DOWNBEATS: usize = 2;
const MIN_CONFIDENCE: f64 = 0.5;

const VALID_DENOMINATORS: [u8; 6] = [1, 2, 4, 8, 16, 32];

/// Signatures the chart editor can display.
const SUPPORTED: [(u8, u8); 15] = [
    (2, 2),
    (3, 2),
    (4, 2),
    (2, 4),
    (3, 4),
    (4, 4),
    (5, 4),
    (6, 4),
    (7, 4),
    (3, 8),
    (5, 8),
    (6, 8),
    (7, 8),
    (9, 8),
    (12, 8),
];

impl TimeSignature {
    /// True if the chart editor has a layout for this signature.
    pub fn is_supported(&self) -> bool {
        SUPPORTED.contains(&(self.numerator, self.denominator))
    }

    /// Parse a declared signature: `"N/D"`, `"N"` (quarter-note beats) or `"[N, D]"`.
    ///
    /// Returns `None` for unparsable text, a numerator outside 1–16, a denominator
    /// that is not a power of two up to 32, or a combination the chart cannot show.
    ///
    /// # Examples
    /// ```
    /// use fakebook_core::TimeSignature;
    ///
    /// assert_eq!(TimeSignature::from_declared("3/4"), Some(TimeSignature::new(3, 4)));
    /// assert_eq!(TimeSignature::from_declared("[6, 8]"), Some(TimeSignature::new(6, 8)));
    /// assert_eq!(TimeSignature::from_declared("5"), Some(TimeSignature::new(5, 4)));
    /// assert_eq!(TimeSignature::from_declared("4/3"), None);
    /// ```
    pub fn from_declared(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);

        let (numerator, denominator) = match inner.split_once(&['/', ','][..]) {
            Some((n, d)) => (n.trim().parse::<u8>().ok()?, d.trim().parse::<u8>().ok()?),
            None => (inner.parse::<u8>().ok()?, 4),
        };

        if !(1..=16).contains(&numerator) || !VALID_DENOMINATORS.contains(&denominator) {
            return None;
        }

        let signature = Self::new(numerator, denominator);
        signature.is_supported().then_some(signature)
    }
}

/// Where an estimated signature came from.
#[derive(Debug, Clone, PartialEq)]
pub enum MeterSource {
    /// Derived from beat timing
    Inferred {
        beats_per_measure: usize,
        confidence: f64,
    },
    /// The service's declared signature
    Declared,
    /// Nothing usable, 4/4 assumed
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterEstimate {
    pub time_signature: TimeSignature,
    pub source: MeterSource,
    pub warnings: Vec<InputWarning>,
}

/// Infer the meter of a recording.
///
/// # Examples
/// ```
/// use fakebook_core::{infer_time_signature, TimeSignature};
///
/// assert_eq!(infer_time_signature(&[], &[], None), TimeSignature::new(4, 4));
/// assert_eq!(infer_time_signature(&[], &[], Some("3/4")), TimeSignature::new(3, 4));
/// ```
pub fn infer_time_signature(beats: &[f64], downbeats: &[f64], declared: Option<&str>) -> TimeSignature {
    estimate_time_signature(beats, downbeats, declared).time_signature
}

/// Infer the meter and report how it was obtained.
pub fn estimate_time_signature(
    beats: &[f64],
    downbeats: &[f64],
    declared: Option<&str>,
) -> MeterEstimate {
    let beats = sorted_finite(beats);
    let downbeats = sorted_finite(downbeats);

    if beats.len() < MIN_BEATS || downbeats.len() < MIN_DOWNBEATS {
        let insufficient = InputWarning::InsufficientBeatData {
            beats: beats.len(),
            downbeats: downbeats.len(),
        };
        return fall_back(declared, insufficient);
    }

    // Sorted and deduplicated, so this is strictly positive
    let avg_beat = (beats[beats.len() - 1] - beats[0]) / (beats.len() - 1) as f64;

    let counts: Vec<usize> = downbeats
        .windows(2)
        .filter_map(|pair| beats_in_measure(&beats, pair[0], pair[1], avg_beat))
        .collect();

    let Some((mode_count, frequency)) = mode(&counts) else {
        let insufficient = InputWarning::InsufficientBeatData {
            beats: beats.len(),
            downbeats: downbeats.len(),
        };
        return fall_back(declared, insufficient);
    };

    let confidence = frequency as f64 / counts.len() as f64;
    let beats_per_measure = if confidence < MIN_CONFIDENCE {
        let avg_measure =
            (downbeats[downbeats.len() - 1] - downbeats[0]) / (downbeats.len() - 1) as f64;
        ((avg_measure / avg_beat).round() as usize).max(1)
    } else {
        mode_count
    };

    let time_signature = signature_for_beat_count(beats_per_measure);
    tracing::debug!(
        beats_per_measure,
        confidence,
        measures = counts.len(),
        %time_signature,
        "Inferred time signature"
    );

    MeterEstimate {
        time_signature,
        source: MeterSource::Inferred {
            beats_per_measure,
            confidence,
        },
        warnings: Vec::new(),
    }
}

/// Canonical signature for a number of beats per measure.
///
/// Eight beats is read as a doubled 4/4; ten and eleven are folded into 6/8.
pub fn signature_for_beat_count(count: usize) -> TimeSignature {
    match count {
        1 | 2 => TimeSignature::new(2, 4),
        3 => TimeSignature::new(3, 4),
        4 | 8 => TimeSignature::new(4, 4),
        5 => TimeSignature::new(5, 4),
        6 | 10 | 11 => TimeSignature::new(6, 8),
        7 => TimeSignature::new(7, 8),
        9 => TimeSignature::new(9, 8),
        12 => TimeSignature::new(12, 8),
        _ => TimeSignature::default(),
    }
}

fn fall_back(declared: Option<&str>, reason: InputWarning) -> MeterEstimate {
    tracing::warn!(%reason, "Falling back from time signature inference");
    let mut warnings = vec![reason];

    match declared.map(|d| (d, TimeSignature::from_declared(d))) {
        Some((_, Some(time_signature))) => MeterEstimate {
            time_signature,
            source: MeterSource::Declared,
            warnings,
        },
        Some((raw, None)) => {
            let invalid = InputWarning::InvalidTimeSignature(raw.to_string());
            tracing::warn!(%invalid, "Ignoring declared time signature");
            warnings.push(invalid);
            MeterEstimate {
                time_signature: TimeSignature::default(),
                source: MeterSource::Default,
                warnings,
            }
        }
        None => MeterEstimate {
            time_signature: TimeSignature::default(),
            source: MeterSource::Default,
            warnings,
        },
    }
}

/// Beats in `[start, end)`, reconciled against the duration-based expectation.
fn beats_in_measure(beats: &[f64], start: f64, end: f64, avg_beat: f64) -> Option<usize> {
    if end <= start {
        return None;
    }
    let counted = beats
        .iter()
        .filter(|&&b| b >= start - BEAT_TOLERANCE_SECS && b < end - BEAT_TOLERANCE_SECS)
        .count();
    let expected = ((end - start) / avg_beat).round() as usize;

    let count = if counted > 0 && counted.abs_diff(expected) <= 1 {
        counted
    } else {
        expected
    };
    (count > 0).then_some(count)
}

/// Most frequent value and its frequency. Ties go to the smaller value.
fn mode(values: &[usize]) -> Option<(usize, usize)> {
    let mut frequencies: BTreeMap<usize, usize> = BTreeMap::new();
    for &value in values {
        *frequencies.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(usize, usize)> = None;
    for (value, frequency) in frequencies {
        if best.map_or(true, |(_, f)| frequency > f) {
            best = Some((value, frequency));
        }
    }
    best
}

pub(crate) fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted
}
