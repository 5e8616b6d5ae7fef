use serde::{Deserialize, Serialize};

use crate::app::AcquisitionError;

/// Lyrics and metadata for one resolved song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricResult {
    pub lyrics: String,
    pub song_title: String,
    pub artist: String,
    pub source_url: String,
}

impl LyricResult {
    /// Assemble a result, failing if any field is blank.
    ///
    /// A partially filled result is an extraction failure, never a success.
    pub fn complete(
        lyrics: impl Into<String>,
        song_title: impl Into<String>,
        artist: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Result<Self, AcquisitionError> {
        let result = Self {
            lyrics: lyrics.into(),
            song_title: song_title.into(),
            artist: artist.into(),
            source_url: source_url.into(),
        };
        result.ensure_complete()?;
        Ok(result)
    }

    /// Names of the fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("lyrics", &self.lyrics),
            ("songTitle", &self.song_title),
            ("artist", &self.artist),
            ("sourceUrl", &self.source_url),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn ensure_complete(&self) -> Result<(), AcquisitionError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AcquisitionError::extraction(format!(
                "Incomplete result, missing: {}",
                missing.join(", ")
            )))
        }
    }
}
