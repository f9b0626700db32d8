pub mod client;
pub mod config;
pub mod error;

pub use client::AnalysisClient;
pub use config::ServiceConfig;
pub use error::*;

use fakebook_core::{import_song, ChartError, SongImport};
use std::path::Path;

/// Analyze an audio file with the service and build a song from the results.
/// The song title comes from the audio filename.
pub async fn import_audio(config: &ServiceConfig, path: &Path) -> Result<SongImport, ChartError> {
    let client = AnalysisClient::new(config.clone())?;
    let (chords, beats) = client.analyze(path).await?;
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    import_song(&chords, &beats, &source_name)
}
