//! Classifieur de modulation : silence, modulation ou son constant.
//!
//! 1. Tronque le signal aux `max_duration_ms` premières millisecondes.
//! 2. Découpe en chunks de `chunk_duration_ms` (dernier chunk partiel conservé).
//! 3. RMS de chaque chunk → dBFS (`-inf` si RMS nul).
//! 4. Chunk muet ssi dBFS < `silence_threshold_db`.
//! 5. Agrège selon [`AggregationPolicy`].

use std::path::Path;

use mw_core::config::{AggregationPolicy, AnalysisConfig, LEVEL_FLOOR_DB};
use mw_core::verdict::{ClassificationResult, Label};

use crate::decode::decode_file_limited;
use crate::error::AudioError;
use crate::signal::AudioSignal;

/// Niveau et décision d'un chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkLevel {
    /// Position du chunk dans le fichier.
    pub index: usize,
    /// Niveau RMS en dBFS, `-inf` pour un chunk muet.
    pub dbfs: f64,
    /// Durée du chunk en millisecondes.
    pub duration_ms: f64,
    /// `true` si le chunk est sous le seuil de silence.
    pub silent: bool,
}

/// Calcule le niveau de chaque chunk analysé.
///
/// # Errors
/// Returns `AudioError::InvalidParameter` if `config` is invalid.
///
/// # Example
/// ```
/// use mw_audio::classifier::chunk_levels;
/// use mw_audio::signal::AudioSignal;
/// use mw_core::config::AnalysisConfig;
///
/// let signal = AudioSignal::from_pcm16(&[0i16; 16_000], 8000, 1).unwrap();
/// let levels = chunk_levels(&signal, &AnalysisConfig::default()).unwrap();
/// assert_eq!(levels.len(), 2);
/// assert!(levels.iter().all(|l| l.silent));
/// ```
pub fn chunk_levels(
    signal: &AudioSignal,
    config: &AnalysisConfig,
) -> Result<Vec<ChunkLevel>, AudioError> {
    config.validate()?;
    let threshold = f64::from(config.silence_threshold_db);
    let full_scale = signal.full_scale();
    let rate = signal.sample_rate();

    let levels = signal
        .chunks(config.chunk_duration_ms, config.max_duration_ms)?
        .map(|chunk| {
            let dbfs = chunk.dbfs(full_scale);
            ChunkLevel {
                index: chunk.index,
                dbfs,
                duration_ms: chunk.duration_ms(rate),
                silent: dbfs < threshold,
            }
        })
        .collect();
    Ok(levels)
}

/// Classify a decoded signal as silent, modulating or constant.
///
/// Pure function: no I/O, no logging beyond `trace`.
///
/// # Errors
/// Returns `AudioError::InvalidParameter` when `chunk_duration_ms` is zero
/// or another analysis parameter is invalid.
///
/// # Example
/// ```
/// use mw_audio::classifier::classify;
/// use mw_audio::signal::AudioSignal;
/// use mw_core::config::AnalysisConfig;
/// use mw_core::verdict::Label;
///
/// // 3 s de silence à 8 kHz
/// let signal = AudioSignal::from_pcm16(&[0i16; 24_000], 8000, 1).unwrap();
/// let result = classify("mic.wav", &signal, &AnalysisConfig::default()).unwrap();
/// assert_eq!(result.label, Label::Silent);
/// assert_eq!(result.chunk_count, 3);
/// ```
pub fn classify(
    file_name: &str,
    signal: &AudioSignal,
    config: &AnalysisConfig,
) -> Result<ClassificationResult, AudioError> {
    let levels = chunk_levels(signal, config)?;
    let silent_chunks = levels.iter().filter(|l| l.silent).count();
    let loud_chunks = levels.len() - silent_chunks;
    let label = aggregate(config, &levels, silent_chunks, loud_chunks);

    log::trace!(
        "{file_name}: {} chunks ({silent_chunks} muets, {loud_chunks} actifs) → {label:?}",
        levels.len()
    );

    Ok(ClassificationResult {
        file_name: file_name.to_string(),
        label,
        chunk_count: levels.len(),
        silent_chunks,
        loud_chunks,
        analyzed_ms: signal.truncated_ms(config.max_duration_ms),
    })
}

/// Décode puis classifie un fichier. Seule la durée analysée est décodée.
///
/// # Errors
/// Propagates `AudioError::Io` / `AudioError::DecodeError` from decoding
/// and `AudioError::InvalidParameter` from classification.
///
/// # Example
/// ```no_run
/// use mw_audio::classifier::classify_file;
/// use mw_core::config::AnalysisConfig;
/// let result = classify_file("Dia 19-10-26/mic1.mp3".as_ref(), &AnalysisConfig::default()).unwrap();
/// println!("{result}");
/// ```
pub fn classify_file(path: &Path, config: &AnalysisConfig) -> Result<ClassificationResult, AudioError> {
    config.validate()?;
    let signal = decode_file_limited(path, Some(config.max_duration_ms))?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    classify(&file_name, &signal, config)
}

fn aggregate(
    config: &AnalysisConfig,
    levels: &[ChunkLevel],
    silent_chunks: usize,
    loud_chunks: usize,
) -> Label {
    let n = levels.len();
    if n == 0 {
        return Label::NoData;
    }
    if silent_chunks == n {
        return Label::Silent;
    }
    match config.policy {
        AggregationPolicy::AnyLoudChunk => {
            if loud_chunks > 0 {
                Label::Modulating
            } else {
                // Inatteignable : silent + loud == n. Conservé comme troisième état.
                Label::ConstantNonSilent
            }
        }
        AggregationPolicy::LevelVariance => {
            if level_spread(levels) < f64::from(config.min_spread_db) {
                Label::ConstantNonSilent
            } else {
                Label::Modulating
            }
        }
    }
}

/// Population standard deviation of chunk levels, floored at `LEVEL_FLOOR_DB`.
///
/// # Example
/// ```
/// use mw_audio::classifier::{ChunkLevel, level_spread};
/// let flat = [-20.0, -20.0].map(|dbfs| ChunkLevel { index: 0, dbfs, duration_ms: 1000.0, silent: false });
/// assert!(level_spread(&flat).abs() < 1e-12);
/// ```
#[must_use]
pub fn level_spread(levels: &[ChunkLevel]) -> f64 {
    if levels.is_empty() {
        return 0.0;
    }
    let floor = f64::from(LEVEL_FLOOR_DB);
    let n = levels.len() as f64;
    let mean = levels.iter().map(|l| l.dbfs.max(floor)).sum::<f64>() / n;
    let var = levels
        .iter()
        .map(|l| {
            let d = l.dbfs.max(floor) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var.sqrt()
}
