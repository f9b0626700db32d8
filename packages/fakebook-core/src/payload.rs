//! # Analysis Service Payloads
//!
//! Typed views of the two JSON documents returned by the audio-analysis service.
//!
//! ## Chord Payload
//! ```json
//! {"success": true, "chords": [{"chord": "C:maj", "start": 0.0, "end": 2.1}]}
//! ```
//!
//! ## Beat Payload
//! ```json
//! {"success": true, "beats": [0.5, 1.0], "downbeats": [0.5], "bpm": 120.2, "time_signature": "4/4"}
//! ```
//! `time_signature` is optional and may be a string, an integer or a `[num, den]` pair.

use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::song::{BeatSet, ChordEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordPayload {
    pub success: bool,
    #[serde(default)]
    pub chords: Option<Vec<ChordEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatPayload {
    pub success: bool,
    #[serde(default)]
    pub beats: Option<Vec<f64>>,
    #[serde(default)]
    pub downbeats: Option<Vec<f64>>,
    #[serde(default)]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<DeclaredTimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A time signature as the service declares it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclaredTimeSignature {
    Text(String),
    Beats(i64),
    Pair([i64; 2]),
    /// Any other JSON shape; kept so it can be reported instead of failing the payload
    Other(serde_json::Value),
}

impl DeclaredTimeSignature {
    /// Text form accepted by [`TimeSignature::from_declared`](crate::TimeSignature::from_declared).
    pub fn to_text(&self) -> String {
        match self {
            DeclaredTimeSignature::Text(text) => text.clone(),
            DeclaredTimeSignature::Beats(beats) => beats.to_string(),
            DeclaredTimeSignature::Pair([numerator, denominator]) => {
                format!("{}/{}", numerator, denominator)
            }
            DeclaredTimeSignature::Other(value) => value.to_string(),
        }
    }
}

fn parse_json<'a, T: Deserialize<'a>>(what: &str, json: &'a str) -> Result<T, ChartError> {
    serde_json::from_str(json)
        .map_err(|e| ChartError::MalformedPayload(format!("{} payload is not valid JSON: {}", what, e)))
}

impl ChordPayload {
    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        parse_json("chord", json)
    }

    /// The chord events, or the reason they cannot be used.
    pub fn events(&self) -> Result<&[ChordEvent], ChartError> {
        if !self.success {
            return Err(ChartError::Service {
                status: None,
                message: self
                    .error
                    .clone()
                    .unwrap_or_else(|| "chord recognition failed".to_string()),
            });
        }
        match self.chords.as_deref() {
            Some(chords) if !chords.is_empty() => Ok(chords),
            _ => Err(ChartError::MalformedPayload(
                "chord payload has no chords".to_string(),
            )),
        }
    }
}

impl BeatPayload {
    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        parse_json("beat", json)
    }

    /// Validated beat data. Missing `beats` is tolerated (inference falls back);
    /// missing downbeats or bpm is not.
    pub fn beat_set(&self) -> Result<BeatSet, ChartError> {
        if !self.success {
            return Err(ChartError::Service {
                status: None,
                message: self
                    .error
                    .clone()
                    .unwrap_or_else(|| "beat detection failed".to_string()),
            });
        }

        let downbeats = match self.downbeats.as_deref() {
            Some(downbeats) if !downbeats.is_empty() => downbeats.to_vec(),
            _ => {
                return Err(ChartError::MalformedPayload(
                    "beat payload has no downbeats".to_string(),
                ))
            }
        };

        let bpm = match self.bpm {
            Some(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
            Some(bpm) => {
                return Err(ChartError::MalformedPayload(format!(
                    "beat payload has an unusable bpm: {}",
                    bpm
                )))
            }
            None => {
                return Err(ChartError::MalformedPayload(
                    "beat payload has no bpm".to_string(),
                ))
            }
        };

        Ok(BeatSet {
            beats: self.beats.clone().unwrap_or_default(),
            downbeats,
            bpm,
            declared_time_signature: self.time_signature.as_ref().map(|ts| ts.to_text()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chord_payload() {
        let payload = ChordPayload::from_json(
            r#"{"success": true, "chords": [{"chord": "A:min", "start": 0, "end": 1.5}]}"#,
        )
        .unwrap();
        let events = payload.events().unwrap();
        assert_eq!(events, &[ChordEvent::new("A:min", 0.0, 1.5)]);
    }

    #[test]
    fn test_chord_payload_failure_is_service_error() {
        let payload =
            ChordPayload::from_json(r#"{"success": false, "error": "model not loaded"}"#).unwrap();
        match payload.events() {
            Err(ChartError::Service { status, message }) => {
                assert_eq!(status, None);
                assert_eq!(message, "model not loaded");
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_chords_is_malformed() {
        let payload = ChordPayload::from_json(r#"{"success": true, "chords": []}"#).unwrap();
        assert!(matches!(payload.events(), Err(ChartError::MalformedPayload(_))));

        let payload = ChordPayload::from_json(r#"{"success": true}"#).unwrap();
        assert!(matches!(payload.events(), Err(ChartError::MalformedPayload(_))));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            ChordPayload::from_json("{not json"),
            Err(ChartError::MalformedPayload(_))
        ));
        assert!(matches!(
            BeatPayload::from_json(r#"{"beats": []}"#),
            Err(ChartError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_declared_time_signature_shapes() {
        let text = BeatPayload::from_json(
            r#"{"success": true, "downbeats": [0], "bpm": 100, "time_signature": "3/4"}"#,
        )
        .unwrap();
        assert_eq!(text.beat_set().unwrap().declared_time_signature.as_deref(), Some("3/4"));

        let int = BeatPayload::from_json(
            r#"{"success": true, "downbeats": [0], "bpm": 100, "time_signature": 3}"#,
        )
        .unwrap();
        assert_eq!(int.beat_set().unwrap().declared_time_signature.as_deref(), Some("3"));

        let pair = BeatPayload::from_json(
            r#"{"success": true, "downbeats": [0], "bpm": 100, "time_signature": [6, 8]}"#,
        )
        .unwrap();
        assert_eq!(pair.beat_set().unwrap().declared_time_signature.as_deref(), Some("6/8"));

        let odd = BeatPayload::from_json(
            r#"{"success": true, "downbeats": [0], "bpm": 100, "time_signature": {"n": 4}}"#,
        )
        .unwrap();
        assert_eq!(
            odd.time_signature,
            Some(DeclaredTimeSignature::Other(serde_json::json!({"n": 4})))
        );
    }

    #[test]
    fn test_beat_set_requires_downbeats_and_bpm() {
        let no_downbeats =
            BeatPayload::from_json(r#"{"success": true, "beats": [0, 1], "bpm": 90}"#).unwrap();
        assert!(matches!(
            no_downbeats.beat_set(),
            Err(ChartError::MalformedPayload(m)) if m.contains("downbeats")
        ));

        let no_bpm = BeatPayload::from_json(r#"{"success": true, "downbeats": [0, 2]}"#).unwrap();
        assert!(matches!(
            no_bpm.beat_set(),
            Err(ChartError::MalformedPayload(m)) if m.contains("bpm")
        ));

        let zero_bpm =
            BeatPayload::from_json(r#"{"success": true, "downbeats": [0, 2], "bpm": 0}"#).unwrap();
        assert!(zero_bpm.beat_set().is_err());
    }

    #[test]
    fn test_missing_beats_is_tolerated() {
        let payload =
            BeatPayload::from_json(r#"{"success": true, "downbeats": [0, 2], "bpm": 120}"#).unwrap();
        let beat_set = payload.beat_set().unwrap();
        assert!(beat_set.beats.is_empty());
        assert_eq!(beat_set.bpm, 120.0);
    }
}
