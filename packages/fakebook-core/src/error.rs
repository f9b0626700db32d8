//! # Error Types
//!
//! This module defines the error and warning types for the chord chart pipeline.
//!
//! Errors are terminal: the import stops and no partial song is returned.
//! Warnings are soft: a documented fallback is applied and processing continues.
//!
//! ## Error Types
//! - `Service` - The analysis service answered with a non-2xx status or `success: false`
//! - `MalformedPayload` - Missing/empty chords or downbeats, missing bpm, unparsable JSON
//! - `Timeout` - A service request exceeded the configured timeout
//! - `Network` - Transport failure before any HTTP status was received
//! - `Io` - The audio file could not be read
//!
//! ## Usage
//! ```rust
//! use fakebook_core::{import_song, BeatPayload, ChartError, ChordPayload};
//!
//! let chords = ChordPayload::from_json(r#"{"success": true, "chords": []}"#).unwrap();
//! let beats = BeatPayload::from_json(r#"{"success": true, "beats": [], "downbeats": [0.0], "bpm": 90}"#).unwrap();
//!
//! match import_song(&chords, &beats, "song.mp3") {
//!     Ok(import) => println!("{}", import.song.title),
//!     Err(ChartError::MalformedPayload(message)) => eprintln!("Bad payload: {}", message),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// The analysis service rejected the request.
    ///
    /// `status` is `None` when the HTTP exchange succeeded but the payload
    /// carried `success: false`.
    ///
    /// # Example
    /// ```
    /// # use fakebook_core::ChartError;
    /// let err = ChartError::Service {
    ///     status: Some(502),
    ///     message: "bad gateway".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Analysis service error (HTTP 502): bad gateway");
    /// ```
    #[error("Analysis service error{}: {message}", status_suffix(.status))]
    Service {
        status: Option<u16>,
        message: String,
    },

    /// The payload cannot be turned into a chart.
    ///
    /// # Example
    /// ```
    /// # use fakebook_core::ChartError;
    /// let err = ChartError::MalformedPayload("chord payload has no chords".to_string());
    /// assert_eq!(err.to_string(), "Malformed analysis payload: chord payload has no chords");
    /// ```
    #[error("Malformed analysis payload: {0}")]
    MalformedPayload(String),

    /// A service request ran past the configured timeout.
    #[error("Analysis service timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

/// Non-fatal input problems. Each one names the fallback that was applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputWarning {
    #[error("Unusable time signature '{0}', using 4/4")]
    InvalidTimeSignature(String),

    #[error("Not enough beat data to infer a meter ({beats} beats, {downbeats} downbeats)")]
    InsufficientBeatData { beats: usize, downbeats: usize },

    #[error("No diatonic evidence for any key, using C")]
    NoKeyEvidence,
}
