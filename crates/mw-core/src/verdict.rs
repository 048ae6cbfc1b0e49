use std::fmt;

use serde::{Deserialize, Serialize};

/// Verdict global d'un fichier audio.
///
/// # Example
/// ```
/// use mw_core::verdict::Label;
/// assert_eq!(Label::Silent.text(), "no sound detected");
/// assert!(Label::NoData.is_degenerate());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Label {
    /// Tous les chunks sont sous le seuil de silence.
    Silent,
    /// Au moins un chunk dépasse le seuil (ou le niveau varie, selon la politique).
    Modulating,
    /// Son présent mais sans variation de niveau.
    ConstantNonSilent,
    /// Aucun chunk analysé (durée max nulle ou fichier vide).
    NoData,
}

impl Label {
    /// Human-readable text used in report lines.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Silent => "no sound detected",
            Self::Modulating => "audio modulating correctly",
            Self::ConstantNonSilent => "constant sound without modulation",
            Self::NoData => "no audio analyzed",
        }
    }

    /// `true` for the no-chunks outcome.
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        matches!(self, Self::NoData)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Résultat immuable de la classification d'un fichier.
///
/// `chunk_count == silent_chunks + loud_chunks` toujours.
///
/// # Example
/// ```
/// use mw_core::verdict::{ClassificationResult, Label};
/// let r = ClassificationResult {
///     file_name: "mic1.wav".into(),
///     label: Label::Silent,
///     chunk_count: 3,
///     silent_chunks: 3,
///     loud_chunks: 0,
///     analyzed_ms: 3000,
/// };
/// assert_eq!(r.to_string(), "mic1.wav: no sound detected");
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClassificationResult {
    /// File name (no directory) of the analyzed recording.
    pub file_name: String,
    /// Verdict.
    pub label: Label,
    /// Number of chunks analyzed.
    pub chunk_count: usize,
    /// Chunks below the silence threshold.
    pub silent_chunks: usize,
    /// Chunks at or above the silence threshold.
    pub loud_chunks: usize,
    /// Duration actually analyzed, after truncation, in milliseconds.
    pub analyzed_ms: u64,
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_line_uses_label_text() {
        let r = ClassificationResult {
            file_name: "a.mp3".into(),
            label: Label::Modulating,
            chunk_count: 60,
            silent_chunks: 10,
            loud_chunks: 50,
            analyzed_ms: 60_000,
        };
        assert_eq!(r.to_string(), "a.mp3: audio modulating correctly");
    }

    #[test]
    fn only_no_data_is_degenerate() {
        assert!(!Label::Silent.is_degenerate());
        assert!(!Label::Modulating.is_degenerate());
        assert!(!Label::ConstantNonSilent.is_degenerate());
        assert!(Label::NoData.is_degenerate());
    }
}
