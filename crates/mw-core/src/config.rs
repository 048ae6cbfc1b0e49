use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schedule::DailySchedule;

/// Plancher dBFS utilisé pour les chunks muets dans le calcul d'écart.
///
/// Correspond à la dynamique d'un signal 16 bits.
pub const LEVEL_FLOOR_DB: f32 = -96.0;

/// Paramètres du classifieur de modulation.
///
/// # Example
/// ```
/// use mw_core::config::{AggregationPolicy, AnalysisConfig};
/// let config = AnalysisConfig::default();
/// assert_eq!(config.chunk_duration_ms, 1000);
/// assert_eq!(config.max_duration_ms, 60_000);
/// assert_eq!(config.policy, AggregationPolicy::AnyLoudChunk);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Durée d'un chunk en millisecondes. Doit être > 0.
    pub chunk_duration_ms: u32,
    /// Seuil de silence en dBFS. Un chunk strictement sous ce niveau est muet.
    pub silence_threshold_db: f32,
    /// Durée maximale analysée par fichier. 0 = rien n'est analysé.
    pub max_duration_ms: u64,
    /// Règle d'agrégation des chunks en verdict.
    pub policy: AggregationPolicy,
    /// Écart-type minimal (dB) des niveaux par chunk pour `LevelVariance`.
    pub min_spread_db: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_duration_ms: 1000,
            silence_threshold_db: -50.0,
            max_duration_ms: 60_000,
            policy: AggregationPolicy::AnyLoudChunk,
            min_spread_db: 3.0,
        }
    }
}

impl AnalysisConfig {
    /// Check every classifier parameter.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidParameter` on a zero chunk duration,
    /// a non-finite threshold or a negative / non-finite spread.
    ///
    /// # Example
    /// ```
    /// use mw_core::config::AnalysisConfig;
    /// let mut config = AnalysisConfig::default();
    /// assert!(config.validate().is_ok());
    /// config.chunk_duration_ms = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.chunk_duration_ms == 0 {
            return Err(CoreError::InvalidParameter {
                name: "chunk_duration_ms",
                reason: "doit être > 0".into(),
            });
        }
        if !self.silence_threshold_db.is_finite() {
            return Err(CoreError::InvalidParameter {
                name: "silence_threshold_db",
                reason: format!("valeur non finie ({})", self.silence_threshold_db),
            });
        }
        if !self.min_spread_db.is_finite() || self.min_spread_db < 0.0 {
            return Err(CoreError::InvalidParameter {
                name: "min_spread_db",
                reason: format!("doit être fini et >= 0 ({})", self.min_spread_db),
            });
        }
        Ok(())
    }
}

/// Aggregation rule turning per-chunk decisions into a file verdict.
///
/// # Example
/// ```
/// use mw_core::config::AggregationPolicy;
/// assert!(matches!(AggregationPolicy::default(), AggregationPolicy::AnyLoudChunk));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum AggregationPolicy {
    /// Un seul chunk au-dessus du seuil suffit pour `Modulating`.
    #[default]
    AnyLoudChunk,
    /// Compare l'écart-type des niveaux dBFS à `min_spread_db` pour
    /// distinguer une vraie modulation d'un ton constant.
    LevelVariance,
}

/// Emplacement des enregistrements datés.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FolderConfig {
    /// Dossier contenant les dossiers journaliers.
    pub base_dir: PathBuf,
    /// Format chrono du nom de dossier journalier.
    pub name_format: String,
    /// Extensions reconnues, sans le point, comparées sans casse.
    pub extensions: Vec<String>,
    /// Descendre dans les sous-dossiers.
    pub recursive: bool,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            name_format: "Dia %d-%m-%y".to_string(),
            extensions: vec!["mp3".into(), "wav".into(), "ogg".into()],
            recursive: false,
        }
    }
}

impl FolderConfig {
    /// `true` if `path` has one of the configured extensions.
    ///
    /// # Example
    /// ```
    /// use mw_core::config::FolderConfig;
    /// use std::path::Path;
    /// let folder = FolderConfig::default();
    /// assert!(folder.accepts(Path::new("rec/MIC1.WAV")));
    /// assert!(!folder.accepts(Path::new("rec/notes.txt")));
    /// ```
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
    }
}

/// Horaires de déclenchement quotidiens.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Heures locales au format `HH:MM`.
    pub times: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            times: vec!["07:00".into(), "12:00".into(), "18:00".into()],
        }
    }
}

/// Batch execution limits.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Worker threads. 0 = rayon default.
    pub threads: usize,
    /// Wall-clock budget for one run, in seconds.
    pub budget_secs: Option<u64>,
}

/// Configuration complète du moniteur, hot-rechargeable.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use mw_core::config::MonitorConfig;
/// let config = MonitorConfig::default();
/// assert_eq!(config.schedule.times.len(), 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MonitorConfig {
    pub analysis: AnalysisConfig,
    pub folder: FolderConfig,
    pub schedule: ScheduleConfig,
    pub batch: BatchConfig,
}

impl MonitorConfig {
    /// Validate the whole configuration.
    ///
    /// Called at startup and after every hot reload.
    ///
    /// # Errors
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.analysis.validate()?;
        if self.folder.extensions.is_empty() {
            return Err(CoreError::InvalidParameter {
                name: "extensions",
                reason: "au moins une extension requise".into(),
            });
        }
        if self.folder.name_format.trim().is_empty() {
            return Err(CoreError::InvalidParameter {
                name: "name_format",
                reason: "format vide".into(),
            });
        }
        // Un spécificateur inconnu ferait paniquer `Display` au formatage.
        if StrftimeItems::new(&self.folder.name_format).any(|item| matches!(item, Item::Error)) {
            return Err(CoreError::InvalidParameter {
                name: "name_format",
                reason: format!("format chrono invalide ({})", self.folder.name_format),
            });
        }
        DailySchedule::parse(&self.schedule.times)?;
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    analysis: Option<AnalysisSection>,
    folder: Option<FolderSection>,
    schedule: Option<ScheduleSection>,
    batch: Option<BatchSection>,
}

/// Analysis section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct AnalysisSection {
    chunk_duration_ms: Option<u32>,
    silence_threshold_db: Option<f32>,
    max_duration_ms: Option<u64>,
    policy: Option<AggregationPolicy>,
    min_spread_db: Option<f32>,
}

#[derive(Deserialize)]
struct FolderSection {
    base_dir: Option<PathBuf>,
    name_format: Option<String>,
    extensions: Option<Vec<String>>,
    recursive: Option<bool>,
}

#[derive(Deserialize)]
struct ScheduleSection {
    times: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct BatchSection {
    threads: Option<usize>,
    budget_secs: Option<u64>,
}

/// Parse un contenu TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the TOML is malformed or a value is invalid.
///
/// # Example
/// ```
/// use mw_core::config::parse_config;
/// let config = parse_config("[analysis]\nsilence_threshold_db = -40.0\n").unwrap();
/// assert!((config.analysis.silence_threshold_db + 40.0).abs() < f32::EPSILON);
/// assert_eq!(config.analysis.chunk_duration_ms, 1000);
/// ```
pub fn parse_config(content: &str) -> Result<MonitorConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = MonitorConfig::default();

    if let Some(a) = file.analysis {
        if let Some(v) = a.chunk_duration_ms {
            config.analysis.chunk_duration_ms = v;
        }
        if let Some(v) = a.silence_threshold_db {
            config.analysis.silence_threshold_db = v;
        }
        if let Some(v) = a.max_duration_ms {
            config.analysis.max_duration_ms = v;
        }
        if let Some(v) = a.policy {
            config.analysis.policy = v;
        }
        if let Some(v) = a.min_spread_db {
            config.analysis.min_spread_db = v;
        }
    }

    if let Some(f) = file.folder {
        if let Some(v) = f.base_dir {
            config.folder.base_dir = v;
        }
        if let Some(v) = f.name_format {
            config.folder.name_format = v;
        }
        if let Some(v) = f.extensions {
            config.folder.extensions = v
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect();
        }
        if let Some(v) = f.recursive {
            config.folder.recursive = v;
        }
    }

    if let Some(s) = file.schedule {
        if let Some(v) = s.times {
            config.schedule.times = v;
        }
    }

    if let Some(b) = file.batch {
        if let Some(v) = b.threads {
            config.batch.threads = v;
        }
        if b.budget_secs.is_some() {
            config.batch.budget_secs = b.budget_secs;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
/// ```no_run
/// use mw_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<MonitorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide dans {}", path.display()))
}
